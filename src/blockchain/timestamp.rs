//! Fixed-precision UTC timestamps.
//!
//! Blocks and transfer records carry a `DateTime<Utc>` truncated to
//! microseconds. The text form below is both the hashing form and the
//! serialized form, so a value read back from storage hashes to the same bytes.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serializer, de};

pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Current time at hashing precision.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub fn format(ts: &DateTime<Utc>) -> String {
    ts.format(FORMAT).to_string()
}

/// Parse the canonical text. Anything that would not format back to the same
/// string is rejected.
pub fn parse(text: &str) -> Result<DateTime<Utc>, String> {
    let ts = DateTime::parse_from_rfc3339(text)
        .map_err(|e| format!("bad timestamp '{text}': {e}"))?
        .with_timezone(&Utc);
    if format(&ts) != text {
        return Err(format!(
            "timestamp '{text}' is not in canonical form ({FORMAT})"
        ));
    }
    Ok(ts)
}

pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format(ts))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse(&text).map_err(de::Error::custom)
}
