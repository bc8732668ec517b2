//! Packing of ISC status codes.
//!
//! A status code as seen by a Firebird client is built from the facility of
//! the message and its number inside that facility:
//!
//! ```text
//!  31     28 27 26 25   21 20      16 15 14 13            0
//! +---------+-----+-------+----------+-----+---------------+
//! | 0 0 0 1 | 0 1 |   0   | facility |  0  |    number     |
//! +---------+-----+-------+----------+-----+---------------+
//! ```

/// Class bits that are set in every packed status code.
pub const ISC_MASK: u32 = 0x1400_0000;
pub const FACILITY_MASK: u32 = 0x1F;
pub const CODE_MASK: u32 = 0x3FFF;
const FACILITY_SHIFT: u32 = 16;

/// Pack a facility and a message number into a status code.
///
/// Values that do not fit are truncated to 5 bits for the facility and to
/// 14 bits for the number, they are never rejected.
pub fn encode(facility: u32, raw_code: i64) -> i32 {
	let facility = (facility & FACILITY_MASK) << FACILITY_SHIFT;
	let code = (raw_code & i64::from(CODE_MASK)) as u32;
	(facility | code | ISC_MASK) as i32
}

/// The (masked) facility of a packed status code.
#[inline]
pub fn facility_of(code: i32) -> u32 { ((code as u32) >> FACILITY_SHIFT) & FACILITY_MASK }

/// The (masked) message number of a packed status code.
#[inline]
pub fn number_of(code: i32) -> u32 { code as u32 & CODE_MASK }
