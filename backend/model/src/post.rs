/// Reference to a post record.
pub type PostRef = i64;

/// Derives a URL slug from a post title.
///
/// The title is lowercased; alphanumeric characters and underscores are
/// kept, runs of whitespace and dashes collapse into a single dash, and
/// all other punctuation is dropped. The result never starts or ends
/// with a dash.
pub fn slugify(title: &str) -> String {
	let mut slug = String::with_capacity(title.len());
	let mut dash_pending = false;
	for ch in title.chars() {
		if ch.is_alphanumeric() || ch == '_' {
			if dash_pending && !slug.is_empty() {
				slug.push('-');
			}
			dash_pending = false;
			slug.extend(ch.to_lowercase());
		} else if ch.is_whitespace() || ch == '-' {
			dash_pending = true;
		}
	}
	slug
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_slugify() {
		assert_eq!(slugify("Hello World!"), "hello-world");
		assert_eq!(slugify("Ten  Tips -- for Rust"), "ten-tips-for-rust");
		assert_eq!(slugify("snake_case title"), "snake_case-title");
		assert_eq!(slugify("  padded  "), "padded");
		assert_eq!(slugify("C'est déjà l'été"), "cest-déjà-lété");
	}

	#[test]
	fn test_slugify_degenerate() {
		assert_eq!(slugify(""), "");
		assert_eq!(slugify("!!!"), "");
		assert_eq!(slugify("---"), "");
	}
}
