//! Wire formats for `time` values. Timestamps go out in UTC as `YYYY-MM-DDTHH:MM:SS.mmmZ`, the
//! shape browser clients produce with `Date.toISOString()`.

pub mod date;
pub mod option;

use serde::Serializer;
use time::{
	OffsetDateTime, UtcOffset, format_description::BorrowedFormatItem, macros::format_description,
};

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
	format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z");

pub fn serialize<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	let formatted = format(*value).map_err(serde::ser::Error::custom)?;

	serializer.serialize_str(&formatted)
}

pub(crate) fn format(value: OffsetDateTime) -> Result<String, time::error::Format> {
	value.to_offset(UtcOffset::UTC).format(TIMESTAMP_FORMAT)
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;

	use super::*;

	#[test]
	fn timestamps_are_shifted_to_utc_with_milliseconds() {
		let formatted =
			format(datetime!(2025-03-04 05:06:07.089_456 +02:00)).expect("Failed to format.");

		assert_eq!(formatted, "2025-03-04T03:06:07.089Z");
	}

	#[test]
	fn whole_seconds_keep_a_zero_fraction() {
		let formatted = format(datetime!(2024-12-31 23:59:59 UTC)).expect("Failed to format.");

		assert_eq!(formatted, "2024-12-31T23:59:59.000Z");
	}
}
