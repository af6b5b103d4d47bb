//! Best-effort cleaning of free-text player names.
//!
//! A small whitelist of inline tags survives (with most attributes dropped),
//! everything else that looks like markup is escaped, and control characters
//! are removed. Cleaning never fails and is idempotent.

const ALLOWED_TAGS: &[&str] = &[
	"a",
	"abbr",
	"acronym",
	"b",
	"blockquote",
	"code",
	"em",
	"i",
	"li",
	"ol",
	"strong",
	"ul",
];

const ALLOWED_PROTOCOLS: &[&str] = &["http", "https", "mailto"];

fn allowed_attribute(tag: &str, attr: &str) -> bool {
	matches!(
		(tag, attr),
		("a", "href") | ("a", "title") | ("abbr", "title") | ("acronym", "title")
	)
}

pub fn clean(input: &str) -> String {
	let text: String = input
		.chars()
		.filter(|&c| !c.is_control() || matches!(c, '\t' | '\n'))
		.collect();

	let mut out = String::with_capacity(text.len());
	let mut rest = text.as_str();

	while let Some(c) = rest.chars().next() {
		match c {
			'<' => match Tag::parse(rest) {
				Some((tag, len)) if tag.is_allowed() => {
					tag.write_to(&mut out);
					rest = &rest[len..];
					continue;
				}
				_ => out.push_str("&lt;"),
			},
			'>' => out.push_str("&gt;"),
			'&' => match entity_len(rest) {
				Some(len) => {
					out.push_str(&rest[..len]);
					rest = &rest[len..];
					continue;
				}
				None => out.push_str("&amp;"),
			},
			c => out.push(c),
		}
		rest = &rest[c.len_utf8()..];
	}

	out
}

/// Length of the character reference at the start of `s`, if it is well formed.
fn entity_len(s: &str) -> Option<usize> {
	let b = s.as_bytes();
	let mut i = 1;

	let body_start;
	match *b.get(i)? {
		b'#' => {
			i += 1;
			let hex = matches!(b.get(i), Some(b'x' | b'X'));
			if hex {
				i += 1;
			}
			body_start = i;
			while i < b.len()
				&& (b[i].is_ascii_digit() || (hex && b[i].is_ascii_hexdigit()))
			{
				i += 1;
			}
		}
		c if c.is_ascii_alphabetic() => {
			body_start = i;
			while i < b.len() && b[i].is_ascii_alphanumeric() {
				i += 1;
			}
		}
		_ => return None,
	}

	if i == body_start || i - body_start > 32 || b.get(i) != Some(&b';') {
		return None;
	}

	Some(i + 1)
}

fn escape_attribute(value: &str, out: &mut String) {
	let mut rest = value;
	while let Some(c) = rest.chars().next() {
		match c {
			'"' => out.push_str("&quot;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'&' => match entity_len(rest) {
				Some(len) => {
					out.push_str(&rest[..len]);
					rest = &rest[len..];
					continue;
				}
				None => out.push_str("&amp;"),
			},
			c => out.push(c),
		}
		rest = &rest[c.len_utf8()..];
	}
}

/// Character a named reference stands for, for the names that can spell out
/// or delimit a URL scheme.
fn named_reference(name: &str) -> Option<char> {
	let c = match name {
		"colon" => ':',
		"Tab" => '\t',
		"NewLine" => '\n',
		"sol" => '/',
		"quest" => '?',
		"num" => '#',
		"amp" | "AMP" => '&',
		"lt" | "LT" => '<',
		"gt" | "GT" => '>',
		"quot" | "QUOT" => '"',
		"apos" => '\'',
		"period" => '.',
		"nbsp" => '\u{a0}',
		_ => return None,
	};
	Some(c)
}

/// Decodes character references the way a browser would before resolving a
/// URL. Returns the decoded text and the decoded offset of the first
/// reference it could not resolve.
fn decode_references(value: &str) -> (String, Option<usize>) {
	let mut decoded = String::with_capacity(value.len());
	let mut unresolved = None;
	let mut rest = value;

	while let Some(c) = rest.chars().next() {
		if c == '&' {
			if let Some(len) = entity_len(rest) {
				let body = &rest[1..len - 1];
				let resolved = match body.strip_prefix('#') {
					Some(num) => {
						let code = match num.strip_prefix(|c: char| c == 'x' || c == 'X') {
							Some(hex) => u32::from_str_radix(hex, 16).ok(),
							None => num.parse::<u32>().ok(),
						};
						code.and_then(char::from_u32)
					}
					None => named_reference(body),
				};

				match resolved {
					Some(c) => decoded.push(c),
					None => {
						if unresolved.is_none() {
							unresolved = Some(decoded.len());
						}
						decoded.push_str(&rest[..len]);
					}
				}
				rest = &rest[len..];
				continue;
			}
		}
		decoded.push(c);
		rest = &rest[c.len_utf8()..];
	}

	(decoded, unresolved)
}

fn safe_href(value: &str) -> bool {
	let (decoded, unresolved) = decode_references(value);

	// URL parsers drop tabs and newlines anywhere and leading controls or spaces.
	let url: String = decoded
		.chars()
		.filter(|&c| !matches!(c, '\t' | '\n' | '\r'))
		.collect();
	let url = url.trim_start_matches(|c: char| c <= ' ');

	let scheme_end = url.find(|c: char| matches!(c, ':' | '/' | '?' | '#'));
	let path_start = decoded
		.find(|c: char| matches!(c, '/' | '?' | '#'))
		.unwrap_or(decoded.len());

	// A reference we cannot decode might hide part of a scheme.
	if unresolved.is_some_and(|at| at < path_start) {
		return false;
	}

	match scheme_end {
		Some(end) if url[end..].starts_with(':') => {
			let scheme = url[..end].to_ascii_lowercase();
			ALLOWED_PROTOCOLS.contains(&scheme.as_str())
		}
		_ => true,
	}
}

struct Tag<'a> {
	name: String,
	closing: bool,
	attrs: Vec<(String, &'a str)>,
}

impl<'a> Tag<'a> {
	/// Parses a tag at the start of `s` (which begins with `<`), returning it
	/// together with the number of bytes it spans.
	fn parse(s: &'a str) -> Option<(Self, usize)> {
		let b = s.as_bytes();
		let mut i = 1;

		let closing = b.get(i) == Some(&b'/');
		if closing {
			i += 1;
		}

		let name_start = i;
		while i < b.len() && b[i].is_ascii_alphanumeric() {
			i += 1;
		}
		if i == name_start || !b[name_start].is_ascii_alphabetic() {
			return None;
		}

		let mut tag = Tag {
			name: s[name_start..i].to_ascii_lowercase(),
			closing,
			attrs: Vec::new(),
		};

		loop {
			while i < b.len() && b[i].is_ascii_whitespace() {
				i += 1;
			}

			match *b.get(i)? {
				b'>' => return Some((tag, i + 1)),
				b'/' if b.get(i + 1) == Some(&b'>') => return Some((tag, i + 2)),
				_ => {}
			}

			let attr_start = i;
			while i < b.len()
				&& !b[i].is_ascii_whitespace()
				&& !matches!(b[i], b'=' | b'>' | b'/' | b'"' | b'\'' | b'<')
			{
				i += 1;
			}
			if i == attr_start {
				return None;
			}
			let attr = s[attr_start..i].to_ascii_lowercase();

			while i < b.len() && b[i].is_ascii_whitespace() {
				i += 1;
			}

			let mut value = "";
			if b.get(i) == Some(&b'=') {
				i += 1;
				while i < b.len() && b[i].is_ascii_whitespace() {
					i += 1;
				}

				match *b.get(i)? {
					quote @ (b'"' | b'\'') => {
						let value_start = i + 1;
						let len = s[value_start..].find(quote as char)?;
						value = &s[value_start..value_start + len];
						i = value_start + len + 1;
					}
					_ => {
						let value_start = i;
						while i < b.len()
							&& !b[i].is_ascii_whitespace()
							&& !matches!(b[i], b'>' | b'<' | b'"' | b'\'')
						{
							i += 1;
						}
						value = &s[value_start..i];
					}
				}
			}

			tag.attrs.push((attr, value));
		}
	}

	fn is_allowed(&self) -> bool {
		ALLOWED_TAGS.contains(&self.name.as_str())
	}

	fn write_to(&self, out: &mut String) {
		out.push('<');
		if self.closing {
			out.push('/');
			out.push_str(&self.name);
			out.push('>');
			return;
		}

		out.push_str(&self.name);
		for (attr, value) in &self.attrs {
			if !allowed_attribute(&self.name, attr) {
				continue;
			}
			if attr == "href" && !safe_href(value) {
				continue;
			}

			out.push(' ');
			out.push_str(attr);
			out.push_str("=\"");
			escape_attribute(value, out);
			out.push('"');
		}
		out.push('>');
	}
}
