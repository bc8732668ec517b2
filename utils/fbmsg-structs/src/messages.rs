use std::fs::File;
use std::io::Read;
use std::ops::Deref;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::*;

pub const DATA_STR: &str =
	include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/declarations/Messages.csv"));

/// The bundled message catalogue.
pub static DATA: Lazy<Messages> =
	Lazy::new(|| Messages::from_csv(DATA_STR.as_bytes()).expect("Invalid bundled declarations"));

#[derive(Clone, Debug, Default)]
pub struct Messages(pub Vec<MessageDefinition>);

/// One line of a csv declarations file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Row {
	facility: String,
	number: i64,
	symbol: Option<String>,
	text: String,
}

impl Messages {
	/// Read declarations with the columns `facility,number,symbol,text`.
	///
	/// The facility can be a name or a number, the symbol may be empty.
	pub fn from_csv<R: Read>(read: R) -> Result<Self> {
		let mut table = csv::Reader::from_reader(read);
		let mut res = Vec::new();
		for row in table.deserialize() {
			let row: Row = row?;
			res.push(MessageDefinition {
				facility: row.facility.parse()?,
				number: row.number,
				symbol: row.symbol.filter(|s| !s.is_empty()),
				kind: DefinitionKind::Status,
				text: row.text,
			});
		}
		Ok(Messages(res))
	}

	pub fn from_file(path: &Path) -> Result<Self> {
		let file = File::open(path)
			.map_err(|source| Error::Read { path: path.to_path_buf(), source })?;
		Self::from_csv(file)
	}
}

impl Deref for Messages {
	type Target = Vec<MessageDefinition>;
	fn deref(&self) -> &Self::Target { &self.0 }
}
