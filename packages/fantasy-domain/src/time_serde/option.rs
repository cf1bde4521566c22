use serde::{Deserialize as _, Deserializer, Serializer};
use serde_json::Value;
use time::OffsetDateTime;

pub fn serialize<S>(value: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	match value {
		Some(value) => crate::time_serde::serialize(value, serializer),
		None => serializer.serialize_none(),
	}
}

/// Lenient: anything that is not a recognizable timestamp string becomes `None`.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = Option::<Value>::deserialize(deserializer)?;

	Ok(raw.as_ref().and_then(Value::as_str).and_then(crate::time_serde::parse_timestamp))
}
