//! Writing of the generated go file.
use std::io::{self, BufWriter, Write};
use std::path::Path;

use fbmsg_structs::MessageRecord;
use t4rust_derive::Template;

use crate::go::GoMessage;
use crate::{Error, Result};

/// Header of the generated file, it has to stay as it is.
pub const LICENSE: &str = r#"/****************************************************************************
The contents of this file are subject to the Interbase Public
License Version 1.0 (the "License"); you may not use this file
except in compliance with the License. You may obtain a copy
of the License at http://www.Inprise.com/IPL.html

Software distributed under the License is distributed on an
"AS IS" basis, WITHOUT WARRANTY OF ANY KIND, either express
or implied. See the License for the specific language governing
rights and limitations under the License.

*****************************************************************************/
"#;

pub const DEFAULT_PACKAGE: &str = "firebirdsql";
pub const DEFAULT_MAP_NAME: &str = "errmsgs";

/// The content of the generated file.
///
/// Entries are written in the order of `records`, duplicate codes are kept.
#[derive(Template)]
#[TemplatePath = "src/ErrMsgs.tt"]
#[derive(Clone, Debug)]
pub struct ErrMsgs {
	pub package: String,
	pub map_name: String,
	pub records: Vec<MessageRecord>,
}

impl ErrMsgs {
	pub fn new(records: Vec<MessageRecord>) -> Self {
		Self {
			package: DEFAULT_PACKAGE.to_string(),
			map_name: DEFAULT_MAP_NAME.to_string(),
			records,
		}
	}

	pub fn write_to<W: Write>(&self, out: W) -> io::Result<()> {
		let mut out = BufWriter::new(out);
		write!(out, "{}", self)?;
		out.flush()
	}

	/// Replace the file at `path` with this table.
	///
	/// The content is written to a temporary file next to `path` first and
	/// renamed when it is complete. On failure, `path` is left untouched.
	pub fn write_file(&self, path: &Path) -> Result<()> {
		let to_err = |source: io::Error| Error::OutputWrite { path: path.to_path_buf(), source };
		let dir = match path.parent() {
			Some(dir) if !dir.as_os_str().is_empty() => dir,
			_ => Path::new("."),
		};

		let mut file = tempfile::Builder::new()
			.prefix(".errmsgs")
			.suffix(".tmp")
			.tempfile_in(dir)
			.map_err(to_err)?;
		self.write_to(file.as_file_mut()).map_err(to_err)?;
		file.as_file().sync_all().map_err(to_err)?;
		#[cfg(unix)]
		{
			use std::fs;
			use std::os::unix::fs::PermissionsExt;

			fs::set_permissions(file.path(), fs::Permissions::from_mode(0o644)).map_err(to_err)?;
		}
		file.persist(path).map_err(|e| to_err(e.error))?;
		Ok(())
	}
}

/// Write the table for `records` with the default package and map name.
pub fn emit<W: Write>(records: &[MessageRecord], out: W) -> io::Result<()> {
	ErrMsgs::new(records.to_vec()).write_to(out)
}
