//! Go source literals.
use std::fmt;

/// A message as interpreted go string literal, terminated by a `\n`.
///
/// The newline is not added a second time if the message already ends with
/// one.
#[derive(Clone, Copy, Debug)]
pub struct GoMessage<'a>(pub &'a str);

impl fmt::Display for GoMessage<'_> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str("\"")?;
		for c in self.0.chars() {
			match c {
				'"' => f.write_str("\\\"")?,
				'\\' => f.write_str("\\\\")?,
				'\n' => f.write_str("\\n")?,
				'\r' => f.write_str("\\r")?,
				'\t' => f.write_str("\\t")?,
				c if c.is_control() => write!(f, "\\u{:04x}", c as u32)?,
				c => write!(f, "{}", c)?,
			}
		}
		if !self.0.ends_with('\n') {
			f.write_str("\\n")?;
		}
		f.write_str("\"")
	}
}
