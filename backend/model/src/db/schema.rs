diesel::table! {
	user (id) {
		id -> BigInt,
		/// Unique login name.
		///
		/// Usernames are immutable after registration.
		username -> VarChar,
		email -> VarChar,
		/// Argon2id hash in PHC string format.
		password_hash -> VarChar,
		is_admin -> Bool,
		is_active -> Bool,
		/// Pending password-reset token.
		///
		/// Null when no reset is in flight. Cleared on redemption.
		reset_token -> Nullable<VarChar>,
		reset_expires_at -> Nullable<Timestamp>,
		created_at -> Timestamp,
	}
}

diesel::table! {
	post (id) {
		id -> BigInt,
		author -> BigInt,
		title -> VarChar,
		/// URL-friendly identifier derived from the title.
		slug -> VarChar,
		content -> Text,
		/// Comma-separated tag list.
		tags -> VarChar,
		state -> Int2,
		created_at -> Timestamp,
		updated_at -> Timestamp,
	}
}

diesel::table! {
	comment (id) {
		id -> BigInt,
		post -> BigInt,
		author -> BigInt,
		content -> Text,
		state -> Int2,
		created_at -> Timestamp,
	}
}

diesel::table! {
	/// Server-side login sessions.
	///
	/// The token doubles as the primary key; it is 32 random bytes,
	/// hex-encoded.
	session (token) {
		token -> VarChar,
		user -> BigInt,
		created_at -> Timestamp,
		expires_at -> Timestamp,
	}
}

diesel::joinable!(post -> user (author));
diesel::joinable!(comment -> post (post));
diesel::joinable!(comment -> user (author));
diesel::joinable!(session -> user (user));

diesel::allow_tables_to_appear_in_same_query!(user, post, comment, session);
