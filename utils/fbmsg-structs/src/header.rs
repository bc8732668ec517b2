//! Read messages from C headers.
//!
//! Two layouts are understood:
//! - The message files of Firebird 4 and later (`firebird/impl/msg/*.h`), which
//!   are lists of `FB_IMPL_MSG`, `FB_IMPL_MSG_SYMBOL` and
//!   `FB_IMPL_MSG_NO_SYMBOL` invocations. `all.h` only consists of
//!   `#include`s of the facility files.
//! - The generated `msgs.h` of older versions, a table of
//!   `{335544321, "text"},` rows with already packed codes.
//!
//! No preprocessor runs, macros are recognized by name. Comments and other
//! directives than `#include "…"` are skipped.
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::*;

/// Bound for recursive includes.
const MAX_INCLUDE_DEPTH: usize = 32;

static MACRO: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"\bFB_IMPL_MSG(_SYMBOL|_NO_SYMBOL)?\s*\(").unwrap());
static PACKED_ROW: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\{\s*-?\d+\s*,\s*""#).unwrap());
static INCLUDE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^\s*#\s*include\s*"([^"]+)""#).unwrap());

/// Something found in a header, in the order of the file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Item {
	Include(String),
	Message(MessageDefinition),
}

/// Reads header files and follows their includes.
#[derive(Clone, Debug, Default)]
pub struct HeaderReader {
	include_dirs: Vec<PathBuf>,
}

impl HeaderReader {
	pub fn new() -> Self { Default::default() }

	/// Search includes also in this directory.
	///
	/// Includes are first searched next to the including file, then in the
	/// directories in the order they were added.
	pub fn include_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
		self.include_dirs.push(dir.into());
		self
	}

	pub fn read(&self, path: &Path) -> Result<Vec<MessageDefinition>> {
		let mut res = Vec::new();
		self.read_into(path, 0, &mut res)?;
		Ok(res)
	}

	fn read_into(&self, path: &Path, depth: usize, res: &mut Vec<MessageDefinition>) -> Result<()> {
		if depth > MAX_INCLUDE_DEPTH {
			return Err(Error::IncludeDepth(path.to_path_buf()));
		}
		let src = fs::read_to_string(path)
			.map_err(|source| Error::Read { path: path.to_path_buf(), source })?;
		for item in parse(&src, path)? {
			match item {
				Item::Include(name) => {
					let included = self.resolve(&name, path)?;
					self.read_into(&included, depth + 1, res)?;
				}
				Item::Message(m) => res.push(m),
			}
		}
		Ok(())
	}

	fn resolve(&self, name: &str, from: &Path) -> Result<PathBuf> {
		from.parent()
			.into_iter()
			.chain(self.include_dirs.iter().map(PathBuf::as_path))
			.map(|dir| dir.join(name))
			.find(|p| p.is_file())
			.ok_or_else(|| Error::Include { name: name.to_string(), from: from.to_path_buf() })
	}
}

/// Parse the content of one header.
///
/// `path` is only used for error messages.
pub fn parse(src: &str, path: &Path) -> Result<Vec<Item>> {
	let code = strip_comments(src);
	let mut items = Vec::new();

	// Directives, blanked out so that `#define FB_IMPL_MSG(…)` is not taken
	// for a message.
	let mut body = String::with_capacity(code.len());
	let mut continued = false;
	for line in code.split_inclusive('\n') {
		let directive = continued || line.trim_start().starts_with('#');
		if directive {
			if let Some(cap) = INCLUDE.captures(line) {
				items.push((body.len(), Item::Include(cap[1].to_string())));
			}
			continued = line.trim_end().ends_with('\\');
			body.extend(line.chars().map(|c| if c == '\n' { '\n' } else { ' ' }));
		} else {
			body.push_str(line);
		}
	}

	let err = |pos: usize, msg: String| Error::Syntax {
		path: path.to_path_buf(),
		line: line_of(&body, pos),
		msg,
	};

	// Matches are searched outside of literals, arguments are taken from the body
	let scan = blank_literals(&body);
	for whole in MACRO.find_iter(&scan) {
		let name = whole.as_str();
		let kind = if name.contains("_NO_SYMBOL") {
			DefinitionKind::NoSymbol
		} else if name.contains("_SYMBOL") {
			DefinitionKind::Symbol
		} else {
			DefinitionKind::Status
		};
		let args = split_args(&body[whole.end()..], ')')
			.map_err(|e| err(whole.start(), e))?;
		let def = definition(kind, &args).map_err(|e| err(whole.start(), e))?;
		items.push((whole.start(), Item::Message(def)));
	}

	for m in PACKED_ROW.find_iter(&scan) {
		let args = split_args(&body[m.start() + 1..], '}').map_err(|e| err(m.start(), e))?;
		let def = packed_row(&args).map_err(|e| err(m.start(), e))?;
		items.push((m.start(), Item::Message(def)));
	}

	items.sort_by_key(|(pos, _)| *pos);
	Ok(items.into_iter().map(|(_, i)| i).collect())
}

fn line_of(s: &str, pos: usize) -> usize { s[..pos].matches('\n').count() + 1 }

fn definition(kind: DefinitionKind, args: &[&str]) -> std::result::Result<MessageDefinition, String> {
	let expected = match kind {
		DefinitionKind::Status => 7,
		DefinitionKind::Symbol => 4,
		_ => 3,
	};
	if args.len() != expected {
		return Err(format!("Expected {} arguments but got {}", expected, args.len()));
	}

	let facility = args[0].parse::<Facility>().map_err(|e| e.to_string())?;
	let number = parse_int(args[1])?;
	let symbol = match kind {
		DefinitionKind::Status | DefinitionKind::Symbol => {
			if !is_identifier(args[2]) {
				return Err(format!("Invalid symbol {:?}", args[2]));
			}
			Some(args[2].to_string())
		}
		_ => None,
	};
	if kind == DefinitionKind::Status {
		// SQLCODE, SQLSTATE class and subclass are not part of the table
		parse_int(args[3])?;
		unquote(args[4])?;
		unquote(args[5])?;
	}
	let text = unquote(args[expected - 1])?;

	Ok(MessageDefinition { facility, number, symbol, kind, text })
}

fn packed_row(args: &[&str]) -> std::result::Result<MessageDefinition, String> {
	if args.len() != 2 {
		return Err(format!("Expected a code and a message but got {} values", args.len()));
	}
	let number = parse_int(args[0])?;
	Ok(MessageDefinition {
		facility: Facility(facility_of(number as i32)),
		number,
		symbol: None,
		kind: DefinitionKind::Packed,
		text: unquote(args[1])?,
	})
}

fn is_identifier(s: &str) -> bool {
	let mut chars = s.chars();
	matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
		&& chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Parse a C integer literal, decimal or hexadecimal, with an optional sign
/// and suffix.
fn parse_int(s: &str) -> std::result::Result<i64, String> {
	let invalid = || format!("Invalid number {:?}", s);
	let (neg, digits) = match s.strip_prefix('-') {
		Some(rest) => (true, rest.trim_start()),
		None => (false, s),
	};
	let digits = digits.trim_end_matches(|c| matches!(c, 'u' | 'U' | 'l' | 'L'));
	let num = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
		i64::from_str_radix(hex, 16)
	} else {
		digits.parse()
	}
	.map_err(|_| invalid())?;
	Ok(if neg { -num } else { num })
}

/// Split the arguments of an invocation, starting behind the opening bracket
/// and ending at the matching `close`.
///
/// Commas inside strings or nested brackets do not split.
fn split_args(s: &str, close: char) -> std::result::Result<Vec<&str>, String> {
	let mut args = Vec::new();
	let mut depth = 0usize;
	let mut start = 0;
	let mut chars = s.char_indices();
	while let Some((i, c)) = chars.next() {
		match c {
			'"' | '\'' => skip_literal(&mut chars, c)?,
			'(' | '{' | '[' => depth += 1,
			')' | '}' | ']' if depth > 0 => depth -= 1,
			',' if depth == 0 => {
				args.push(s[start..i].trim());
				start = i + 1;
			}
			c if c == close => {
				let last = s[start..i].trim();
				if !last.is_empty() || !args.is_empty() {
					args.push(last);
				}
				return Ok(args);
			}
			_ => {}
		}
	}
	Err(format!("Missing closing {:?}", close))
}

/// Advance behind the end of a string or character literal.
fn skip_literal<I: Iterator<Item = (usize, char)>>(
	chars: &mut I, quote: char,
) -> std::result::Result<(), String> {
	while let Some((_, c)) = chars.next() {
		if c == '\\' {
			chars.next();
		} else if c == quote {
			return Ok(());
		} else if c == '\n' {
			break;
		}
	}
	Err("Unterminated literal".to_string())
}

/// Decode one or more adjacent C string literals into their content.
pub fn unquote(s: &str) -> std::result::Result<String, String> {
	let mut bytes = Vec::new();
	let mut rest = s.trim();
	if !rest.starts_with('"') {
		return Err(format!("Expected a string but got {:?}", s));
	}
	while let Some(r) = rest.strip_prefix('"') {
		let mut chars = r.char_indices().peekable();
		let end = loop {
			let (i, c) = chars.next().ok_or_else(|| "Unterminated string".to_string())?;
			match c {
				'"' => break i + 1,
				'\\' => {
					let (_, e) = chars.next().ok_or_else(|| "Unterminated string".to_string())?;
					match e {
						'n' => bytes.push(b'\n'),
						't' => bytes.push(b'\t'),
						'r' => bytes.push(b'\r'),
						'a' => bytes.push(0x07),
						'b' => bytes.push(0x08),
						'f' => bytes.push(0x0c),
						'v' => bytes.push(0x0b),
						'\\' | '"' | '\'' | '?' => bytes.push(e as u8),
						'x' => {
							let mut val = 0u32;
							let mut count = 0;
							while let Some(d) = chars.peek().and_then(|(_, d)| d.to_digit(16)) {
								val = val * 16 + d;
								if val > 0xFF {
									return Err("\\x escape out of range".to_string());
								}
								count += 1;
								chars.next();
							}
							if count == 0 {
								return Err("Missing digits in \\x escape".to_string());
							}
							bytes.push(val as u8);
						}
						'0'..='7' => {
							let mut val = e.to_digit(8).unwrap_or_default();
							for _ in 0..2 {
								match chars.peek().and_then(|(_, d)| d.to_digit(8)) {
									Some(d) => {
										val = val * 8 + d;
										chars.next();
									}
									None => break,
								}
							}
							bytes.push(val as u8);
						}
						e => return Err(format!("Unknown escape sequence \\{}", e)),
					}
				}
				'\n' => return Err("Unterminated string".to_string()),
				c => {
					let mut buf = [0; 4];
					bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
				}
			}
		};
		rest = r[end..].trim_start();
	}
	if !rest.is_empty() {
		return Err(format!("Unexpected {:?} after string", rest));
	}
	Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Replace the content of string and character literals by spaces, keeping
/// the quotes and the byte offsets.
fn blank_literals(src: &str) -> String {
	let mut res = String::with_capacity(src.len());
	let mut chars = src.chars();
	let blank = |res: &mut String, c: char| {
		if c == '\n' {
			res.push('\n');
		} else {
			res.extend(std::iter::repeat(' ').take(c.len_utf8()));
		}
	};
	while let Some(c) = chars.next() {
		res.push(c);
		if c != '"' && c != '\'' {
			continue;
		}
		while let Some(l) = chars.next() {
			if l == c || l == '\n' {
				res.push(l);
				break;
			}
			blank(&mut res, l);
			if l == '\\' {
				if let Some(e) = chars.next() {
					blank(&mut res, e);
				}
			}
		}
	}
	res
}

/// Replace comments by spaces, keeping newlines and literals.
fn strip_comments(src: &str) -> String {
	let mut res = String::with_capacity(src.len());
	let mut chars = src.chars().peekable();
	while let Some(c) = chars.next() {
		match c {
			'"' | '\'' => {
				res.push(c);
				while let Some(l) = chars.next() {
					res.push(l);
					if l == '\\' {
						if let Some(e) = chars.next() {
							res.push(e);
						}
					} else if l == c || l == '\n' {
						break;
					}
				}
			}
			'/' if chars.peek() == Some(&'/') => {
				res.push(' ');
				while let Some(&l) = chars.peek() {
					if l == '\n' {
						break;
					}
					res.push(' ');
					chars.next();
				}
			}
			'/' if chars.peek() == Some(&'*') => {
				chars.next();
				res.push_str("  ");
				let mut last = ' ';
				for l in chars.by_ref() {
					res.push(if l == '\n' { '\n' } else { ' ' });
					if last == '*' && l == '/' {
						break;
					}
					last = l;
				}
			}
			c => res.push(c),
		}
	}
	res
}

#[cfg(test)]
mod tests {
	use std::fs;

	use super::*;

	fn messages(src: &str) -> Vec<MessageDefinition> {
		parse(src, Path::new("test.h"))
			.unwrap()
			.into_iter()
			.filter_map(|i| match i {
				Item::Message(m) => Some(m),
				Item::Include(_) => None,
			})
			.collect()
	}

	#[test]
	fn status_message() {
		let msgs = messages(
			r#"FB_IMPL_MSG(JRD, 1, arith_except, -802, "22", "000", "arithmetic exception, numeric overflow, or string truncation")"#,
		);
		assert_eq!(msgs.len(), 1);
		assert_eq!(msgs[0].kind, DefinitionKind::Status);
		assert_eq!(msgs[0].symbol.as_deref(), Some("arith_except"));
		assert_eq!(msgs[0].code(), 335544321);
		assert_eq!(msgs[0].text, "arithmetic exception, numeric overflow, or string truncation");
	}

	#[test]
	fn all_kinds() {
		let msgs = messages(
			"FB_IMPL_MSG_NO_SYMBOL(GBAK, 0, \"could not open file\")\n\
			 FB_IMPL_MSG_SYMBOL(GBAK, 1, gbak_unknown_switch, \"found unknown switch\")\n\
			 FB_IMPL_MSG(GBAK, 2, gbak_page_size_missing, -901, \"00\", \"000\", \"page size parameter missing\")\n",
		);
		let kinds: Vec<_> = msgs.iter().map(|m| m.kind).collect();
		assert_eq!(kinds, [DefinitionKind::NoSymbol, DefinitionKind::Symbol, DefinitionKind::Status]);
		assert_eq!(msgs[0].symbol, None);
		assert_eq!(msgs[1].code(), 336330753);
	}

	#[test]
	fn escapes_and_concatenation() {
		let msgs = messages(
			"FB_IMPL_MSG(JRD, 14, convert_error, -413, \"22\", \"018\", \"conversion error \"\n\
			 \t\"from string \\\"@1\\\"\")",
		);
		assert_eq!(msgs[0].text, "conversion error from string \"@1\"");
		assert_eq!(unquote(r#""a\tb\x41\101\n""#).unwrap(), "a\tbAA\n");
	}

	#[test]
	fn comments_and_defines() {
		let msgs = messages(
			"#define FB_IMPL_MSG(facility, number, symbol, sqlCode, sqlClass, sqlSubClass, text) \\\n\
			 \tFB_IMPL_MSG_NO_SYMBOL(facility, number, text)\n\
			 // FB_IMPL_MSG_NO_SYMBOL(JRD, 1, \"commented\")\n\
			 /* FB_IMPL_MSG_NO_SYMBOL(JRD, 2, \"commented\") */\n\
			 FB_IMPL_MSG_NO_SYMBOL(JRD, 3, \"not // a comment\")\n",
		);
		assert_eq!(msgs.len(), 1);
		assert_eq!(msgs[0].number, 3);
		assert_eq!(msgs[0].text, "not // a comment");
	}

	#[test]
	fn macro_names_in_text() {
		let msgs = messages(
			"FB_IMPL_MSG_NO_SYMBOL(JRD, 5, \"use FB_IMPL_MSG(x) here\")\n\
			 FB_IMPL_MSG_SYMBOL(JRD, 6, sym, \"{1, \\\"quoted\\\"} and FB_IMPL_MSG_SYMBOL(\")\n",
		);
		assert_eq!(msgs.len(), 2);
		assert_eq!(msgs[0].number, 5);
		assert_eq!(msgs[0].text, "use FB_IMPL_MSG(x) here");
		assert_eq!(msgs[1].text, "{1, \"quoted\"} and FB_IMPL_MSG_SYMBOL(");
	}

	#[test]
	fn hex_escape_range() {
		assert_eq!(unquote(r#""\xff""#).unwrap(), "\u{FFFD}");
		assert!(unquote(r#""\x100""#).is_err());
		assert!(unquote(r#""\x123456789""#).is_err());
		let src = "FB_IMPL_MSG_NO_SYMBOL(JRD, 1, \"\\x123456789\")\n";
		assert!(matches!(parse(src, Path::new("a.h")), Err(Error::Syntax { line: 1, .. })));
	}

	#[test]
	fn packed_rows() {
		let msgs = messages(
			"static const struct {\n\
			 \tSLONG code_number;\n\
			 \tconst SCHAR *code_text;\n\
			 } messages[] = {\n\
			 \t{335544321, \"arithmetic exception, numeric overflow, or string truncation\"},\t\t/* arith_except */\n\
			 \t{336330753, \"found unknown switch\"},\n\
			 \t{0, NULL}\n\
			 };\n",
		);
		assert_eq!(msgs.len(), 2);
		assert_eq!(msgs[0].kind, DefinitionKind::Packed);
		assert_eq!(msgs[0].code(), 335544321);
		assert_eq!(msgs[1].facility, Facility::GBAK);
	}

	#[test]
	fn syntax_error_line() {
		let src = "\n\nFB_IMPL_MSG(JRD, 1, arith_except, \"missing\")\n";
		match parse(src, Path::new("jrd.h")) {
			Err(Error::Syntax { line, path, .. }) => {
				assert_eq!(line, 3);
				assert_eq!(path, Path::new("jrd.h"));
			}
			r => panic!("Expected syntax error, got {:?}", r),
		}
	}

	#[test]
	fn unterminated() {
		assert!(parse("FB_IMPL_MSG_NO_SYMBOL(JRD, 1, \"text", Path::new("a.h")).is_err());
		assert!(parse("FB_IMPL_MSG_NO_SYMBOL(JRD, 1, \"text\"", Path::new("a.h")).is_err());
	}

	#[test]
	fn numbers() {
		assert_eq!(parse_int("-802").unwrap(), -802);
		assert_eq!(parse_int("0x1F").unwrap(), 31);
		assert_eq!(parse_int("335544321L").unwrap(), 335544321);
		assert!(parse_int("abc").is_err());
	}

	#[test]
	fn follow_includes() {
		let dir = tempfile::tempdir().unwrap();
		let root = dir.path().join("include");
		let msg = root.join("firebird/impl/msg");
		fs::create_dir_all(&msg).unwrap();
		fs::write(
			msg.join("all.h"),
			"#include \"firebird/impl/msg/jrd.h\"\n#include \"gbak.h\"\n#include <stdint.h>\n",
		)
		.unwrap();
		fs::write(
			msg.join("jrd.h"),
			"FB_IMPL_MSG(JRD, 1, arith_except, -802, \"22\", \"000\", \"arithmetic exception\")\n",
		)
		.unwrap();
		fs::write(
			msg.join("gbak.h"),
			"FB_IMPL_MSG(GBAK, 1, gbak_unknown_switch, -901, \"00\", \"000\", \"found unknown switch\")\n",
		)
		.unwrap();

		let msgs = HeaderReader::new().include_dir(&root).read(&msg.join("all.h")).unwrap();
		let codes: Vec<_> = msgs.iter().map(|m| m.code()).collect();
		assert_eq!(codes, [335544321, 336330753]);

		// Without the include directory, the first include cannot be found
		match HeaderReader::new().read(&msg.join("all.h")) {
			Err(Error::Include { name, .. }) => assert_eq!(name, "firebird/impl/msg/jrd.h"),
			r => panic!("Expected include error, got {:?}", r),
		}
	}

	#[test]
	fn recursive_include() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("self.h");
		fs::write(&path, "#include \"self.h\"\n").unwrap();
		assert!(matches!(HeaderReader::new().read(&path), Err(Error::IncludeDepth(_))));
	}

	#[test]
	fn missing_file() {
		let dir = tempfile::tempdir().unwrap();
		assert!(matches!(
			HeaderReader::new().read(&dir.path().join("nope.h")),
			Err(Error::Read { .. })
		));
	}
}
