use std::path::PathBuf;

use thiserror::Error;

pub mod facility;
pub mod header;
pub mod isc;
pub mod messages;

pub use crate::facility::Facility;
pub use crate::isc::{encode, facility_of, number_of};

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
	#[error("Failed to parse declarations: {0}")]
	Csv(#[from] csv::Error),
	#[error("Cannot find {name:?} included from {}", .from.display())]
	Include { name: String, from: PathBuf },
	#[error("Includes nested too deep in {}", .0.display())]
	IncludeDepth(PathBuf),
	#[error("Failed to read {}: {source}", .path.display())]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("{}:{line}: {msg}", .path.display())]
	Syntax { path: PathBuf, line: usize, msg: String },
	#[error("Unknown facility {0:?}")]
	UnknownFacility(String),
}

/// How a message was declared.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DefinitionKind {
	/// `FB_IMPL_MSG`, a status vector error with SQLCODE and SQLSTATE.
	Status,
	/// `FB_IMPL_MSG_SYMBOL`, a message with a symbol but no SQL mapping.
	Symbol,
	/// `FB_IMPL_MSG_NO_SYMBOL`, a tool message without a symbol.
	NoSymbol,
	/// A row of the old `msgs.h` table, the code is already packed.
	Packed,
}

/// One declared message before it is turned into a table entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MessageDefinition {
	pub facility: Facility,
	/// The number inside the facility, or the full code for
	/// [`DefinitionKind::Packed`].
	pub number: i64,
	pub symbol: Option<String>,
	pub kind: DefinitionKind,
	/// The message with escapes resolved. Placeholders like `@1` are kept as
	/// they are.
	pub text: String,
}

impl MessageDefinition {
	pub fn new<S: Into<String>>(facility: Facility, number: i64, text: S) -> Self {
		Self {
			facility,
			number,
			symbol: None,
			kind: DefinitionKind::Status,
			text: text.into(),
		}
	}

	/// The packed status code of this message.
	pub fn code(&self) -> i32 {
		match self.kind {
			DefinitionKind::Packed => self.number as i32,
			_ => isc::encode(self.facility.number(), self.number),
		}
	}

	/// If this message ends up in the status vector of a client.
	#[inline]
	pub fn is_status(&self) -> bool {
		matches!(self.kind, DefinitionKind::Status | DefinitionKind::Packed)
	}

	pub fn to_record(&self) -> MessageRecord { MessageRecord::new(self.code(), self.text.clone()) }
}

/// An entry of the generated table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MessageRecord {
	pub code: i32,
	pub text: String,
}

impl MessageRecord {
	#[inline]
	pub fn new<S: Into<String>>(code: i32, text: S) -> Self { Self { code, text: text.into() } }
}
