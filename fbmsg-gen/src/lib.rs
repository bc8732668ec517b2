//! Generate the error message table of the firebirdsql go driver.
//!
//! Message declarations are read from the Firebird headers, a csv file or the
//! bundled catalogue, turned into packed status codes and written as the
//! `errmsgs` map of `errmsgs.go`.
//!
//! ```no_run
//! # use fbmsg_gen::{GenerateOptions, Input};
//! let count = GenerateOptions::new()
//! 	.include_dir("firebird/src/include")
//! 	.input(Input::Header("firebird/src/include/firebird/impl/msg/all.h".into()))
//! 	.generate("errmsgs.go")?;
//! # Ok::<(), fbmsg_gen::Error>(())
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use fbmsg_structs::header::HeaderReader;
use fbmsg_structs::messages::{self, Messages};
use fbmsg_structs::{MessageDefinition, MessageRecord};
use itertools::Itertools;
use slog::{debug, info, o, warn, Logger};
use thiserror::Error;

pub mod emit;
pub mod go;

pub use crate::emit::{emit, ErrMsgs};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
	#[error("Failed to load message declarations: {0}")]
	Declarations(#[from] fbmsg_structs::Error),
	#[error("Failed to write {}: {source}", .path.display())]
	OutputWrite {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

/// The layout of a declarations file.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Format {
	/// `facility,number,symbol,text` rows.
	Csv,
	/// A Firebird message header or the old `msgs.h`.
	Header,
}

impl Format {
	/// `.csv` files are csv, everything else is read as header.
	pub fn guess(path: &Path) -> Self {
		if path.extension().map_or(false, |e| e.eq_ignore_ascii_case("csv")) {
			Format::Csv
		} else {
			Format::Header
		}
	}
}

impl FromStr for Format {
	type Err = String;
	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"csv" => Ok(Format::Csv),
			"header" => Ok(Format::Header),
			_ => Err(format!("Unknown format {:?}, expected csv or header", s)),
		}
	}
}

impl fmt::Display for Format {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(match self {
			Format::Csv => "csv",
			Format::Header => "header",
		})
	}
}

/// A source of message declarations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Input {
	/// The catalogue bundled with `fbmsg-structs`.
	Bundled,
	Csv(PathBuf),
	Header(PathBuf),
}

impl Input {
	/// Use the given format or guess it from the file extension.
	pub fn from_path<P: Into<PathBuf>>(path: P, format: Option<Format>) -> Self {
		let path = path.into();
		match format.unwrap_or_else(|| Format::guess(&path)) {
			Format::Csv => Input::Csv(path),
			Format::Header => Input::Header(path),
		}
	}
}

/// Configuration of a generator run.
///
/// # Example
/// ```no_run
/// # use fbmsg_gen::GenerateOptions;
/// let table = GenerateOptions::new().package("fb").table()?;
/// assert_eq!(table.package, "fb");
/// # Ok::<(), fbmsg_gen::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct GenerateOptions {
	inputs: Vec<Input>,
	include_dirs: Vec<PathBuf>,
	all_definitions: bool,
	package: String,
	map_name: String,
	logger: Logger,
}

impl Default for GenerateOptions {
	fn default() -> Self { Self::new() }
}

impl GenerateOptions {
	pub fn new() -> Self {
		Self {
			inputs: Vec::new(),
			include_dirs: Vec::new(),
			all_definitions: false,
			package: emit::DEFAULT_PACKAGE.to_string(),
			map_name: emit::DEFAULT_MAP_NAME.to_string(),
			logger: Logger::root(slog::Discard, o!()),
		}
	}

	/// Read declarations from this input. Inputs are read in the order they
	/// are added.
	///
	/// # Default
	/// Without any input, the bundled catalogue is used.
	#[inline]
	pub fn input(mut self, input: Input) -> Self {
		self.inputs.push(input);
		self
	}

	/// Search `#include`s of headers in this directory, like `-I` of a C
	/// compiler.
	#[inline]
	pub fn include_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
		self.include_dirs.push(dir.into());
		self
	}

	/// Also put messages into the table that are declared without an SQL
	/// mapping (`FB_IMPL_MSG_SYMBOL` and `FB_IMPL_MSG_NO_SYMBOL`).
	///
	/// # Default
	/// Only status vector errors are written.
	#[inline]
	pub fn all_definitions(mut self, all: bool) -> Self {
		self.all_definitions = all;
		self
	}

	/// # Default
	/// `firebirdsql`
	#[inline]
	pub fn package<S: Into<String>>(mut self, package: S) -> Self {
		self.package = package.into();
		self
	}

	/// The name of the generated map variable.
	///
	/// # Default
	/// `errmsgs`
	#[inline]
	pub fn map_name<S: Into<String>>(mut self, map_name: S) -> Self {
		self.map_name = map_name.into();
		self
	}

	/// # Default
	/// Log messages are discarded.
	#[inline]
	pub fn logger(mut self, logger: Logger) -> Self {
		self.logger = logger;
		self
	}

	/// Read all declarations of all inputs, in order.
	pub fn load(&self) -> Result<Vec<MessageDefinition>> {
		if self.inputs.is_empty() {
			debug!(self.logger, "No input given, using bundled declarations");
			return Ok(messages::DATA.to_vec());
		}

		let reader =
			self.include_dirs.iter().cloned().fold(HeaderReader::new(), HeaderReader::include_dir);
		let mut res = Vec::new();
		for input in &self.inputs {
			let defs = match input {
				Input::Bundled => messages::DATA.to_vec(),
				Input::Csv(path) => Messages::from_file(path)?.0,
				Input::Header(path) => reader.read(path)?,
			};
			debug!(self.logger, "Loaded declarations"; "input" => ?input, "count" => defs.len());
			res.extend(defs);
		}
		Ok(res)
	}

	/// Turn the declarations into table entries.
	pub fn records(&self) -> Result<Vec<MessageRecord>> {
		let defs = self.load()?;
		let records = defs
			.iter()
			.filter(|d| self.all_definitions || d.is_status())
			.map(MessageDefinition::to_record)
			.collect::<Vec<_>>();
		debug!(self.logger, "Selected messages"; "count" => records.len(),
			"skipped" => defs.len() - records.len());

		// A go map literal does not compile with duplicate keys, but the
		// entries are kept so the problem is visible in the output.
		for code in records.iter().map(|r| r.code).duplicates() {
			warn!(self.logger, "Duplicate message code"; "code" => code);
		}
		Ok(records)
	}

	pub fn table(&self) -> Result<ErrMsgs> {
		Ok(ErrMsgs {
			package: self.package.clone(),
			map_name: self.map_name.clone(),
			records: self.records()?,
		})
	}

	/// Write the table to `output` and return the number of entries.
	pub fn generate<P: AsRef<Path>>(&self, output: P) -> Result<usize> {
		let output = output.as_ref();
		let table = self.table()?;
		table.write_file(output)?;
		info!(self.logger, "Wrote error messages"; "path" => %output.display(),
			"count" => table.records.len());
		Ok(table.records.len())
	}
}
