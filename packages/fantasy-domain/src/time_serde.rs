pub mod option;

use serde::{Deserialize, Deserializer, Serializer};
use time::{
	Date, OffsetDateTime, PrimitiveDateTime, format_description::well_known::Rfc3339,
	macros::format_description,
};

pub fn serialize<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	let formatted = value.format(&Rfc3339).map_err(serde::ser::Error::custom)?;

	serializer.serialize_str(&formatted)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = String::deserialize(deserializer)?;

	parse_timestamp(&raw)
		.ok_or_else(|| serde::de::Error::custom(format!("Unrecognized timestamp {raw:?}.")))
}

/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS` (read as UTC), or a bare `YYYY-MM-DD`
/// (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
	let raw = raw.trim();

	if raw.is_empty() {
		return None;
	}
	if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
		return Some(value);
	}
	if let Ok(value) = PrimitiveDateTime::parse(
		raw,
		format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
	) {
		return Some(value.assume_utc());
	}

	Date::parse(raw, format_description!("[year]-[month]-[day]"))
		.ok()
		.map(|date| date.midnight().assume_utc())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_supported_timestamp_shapes() {
		let full = parse_timestamp("2024-01-02T03:04:05.000Z").expect("RFC 3339 must parse.");
		let naive = parse_timestamp("2024-01-02T03:04:05").expect("Naive timestamp must parse.");
		let date = parse_timestamp("2024-01-02").expect("Bare date must parse.");

		assert_eq!(full.unix_timestamp(), naive.unix_timestamp());
		assert_eq!(date.hour(), 0);
		assert!(date < full);
		assert!(parse_timestamp("yesterday").is_none());
		assert!(parse_timestamp("   ").is_none());
	}
}
