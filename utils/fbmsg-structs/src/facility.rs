use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Prefix of the facility macros in `firebird/impl/msg_helper.h`.
const MACRO_PREFIX: &str = "FB_IMPL_MSG_FACILITY_";

/// Facilities of the Firebird message catalogue, as named in the headers.
const NAMES: &[(&str, u32)] = &[
	("JRD", 0),
	("QLI", 1),
	("GFIX", 3),
	("GPRE", 4),
	("DSQL", 7),
	("DYN", 8),
	("INSTALL", 10),
	("TEST", 11),
	("GBAK", 12),
	("SQLERR", 13),
	("SQLWARN", 14),
	("JRD_BUGCHK", 15),
	("ISQL", 17),
	("GSEC", 18),
	("GJRN", 19),
	("GSTAT", 21),
	("FBSVCMGR", 22),
	("UTL", 23),
	("NBACKUP", 24),
	("FBTRACEMGR", 25),
];

/// The subsystem a message belongs to.
///
/// The number is kept as it was declared, it gets truncated to 5 bits only
/// when a status code is packed.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Facility(pub u32);

impl Facility {
	pub const JRD: Facility = Facility(0);
	pub const GBAK: Facility = Facility(12);

	#[inline]
	pub fn number(self) -> u32 { self.0 }

	/// The name used in the message headers, if this is a known facility.
	pub fn name(self) -> Option<&'static str> {
		NAMES.iter().find(|(_, n)| *n == self.0).map(|(name, _)| *name)
	}

	pub fn from_name(name: &str) -> Option<Self> {
		let name = name.strip_prefix(MACRO_PREFIX).unwrap_or(name);
		NAMES
			.iter()
			.find(|(n, _)| n.eq_ignore_ascii_case(name))
			.map(|(_, num)| Facility(*num))
	}
}

impl FromStr for Facility {
	type Err = Error;

	/// Accepts a facility name (`JRD`, `FB_IMPL_MSG_FACILITY_GBAK`) or a
	/// plain number.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let s = s.trim();
		if let Some(f) = Self::from_name(s) {
			return Ok(f);
		}
		s.parse().map(Facility).map_err(|_| Error::UnknownFacility(s.to_string()))
	}
}

impl fmt::Display for Facility {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self.name() {
			Some(name) => f.write_str(name),
			None => write!(f, "{}", self.0),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parse_names() {
		assert_eq!("JRD".parse::<Facility>().unwrap(), Facility::JRD);
		assert_eq!("gbak".parse::<Facility>().unwrap(), Facility::GBAK);
		assert_eq!("FB_IMPL_MSG_FACILITY_DSQL".parse::<Facility>().unwrap(), Facility(7));
		assert_eq!(" 21 ".parse::<Facility>().unwrap(), Facility(21));
	}

	#[test]
	fn unknown_name() {
		match "NOPE".parse::<Facility>() {
			Err(Error::UnknownFacility(name)) => assert_eq!(name, "NOPE"),
			r => panic!("Expected unknown facility, got {:?}", r),
		}
	}

	#[test]
	fn display() {
		assert_eq!(Facility::GBAK.to_string(), "GBAK");
		assert_eq!(Facility(40).to_string(), "40");
	}
}
