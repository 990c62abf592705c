//! Markup escaping helpers.

/// Escapes text content: `&`, `<` and `>`.
#[must_use]
pub fn escape_html(text: &str) -> String {
	let mut escaped = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			c => escaped.push(c),
		}
	}
	escaped
}

/// Escapes a double-quoted attribute value: `&` and `"`.
#[must_use]
pub fn escape_attr(value: &str) -> String {
	let mut escaped = String::with_capacity(value.len());
	for c in value.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'"' => escaped.push_str("&quot;"),
			c => escaped.push(c),
		}
	}
	escaped
}

/// `fontSize` → `font-size`.
#[must_use]
pub fn dasherize(name: &str) -> String {
	let mut dashed = String::with_capacity(name.len() + 4);
	let mut previous_lower = false;
	for c in name.chars() {
		if c.is_ascii_uppercase() {
			if previous_lower {
				dashed.push('-');
			}
			dashed.push(c.to_ascii_lowercase());
			previous_lower = false;
		} else {
			dashed.push(c);
			previous_lower = true;
		}
	}
	dashed
}
