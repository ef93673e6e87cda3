//! Deserialization helpers for provider payloads.
//!
//! The provider frequently sends `""` for fields it has no value for. These
//! helpers fold blank strings into `None` so that "omitted" and "empty" end
//! up as the same explicit absence.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

/// Trimmed string, `None` when missing, null or blank.
pub fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        let trimmed = s.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }))
}

/// `YYYY-MM-DD` date, `None` when missing, null or blank.
pub fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match blank_as_none(deserializer)? {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Trim a caller-supplied string, mapping blank to `None`.
pub fn trimmed(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let t = s.trim();
        (!t.is_empty()).then(|| t.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "blank_as_none")]
        text: Option<String>,
        #[serde(default, deserialize_with = "optional_date")]
        date: Option<NaiveDate>,
    }

    #[test]
    fn blank_and_missing_become_none() {
        let p: Probe = serde_json::from_str(r#"{"text": "  ", "date": ""}"#).unwrap();
        assert!(p.text.is_none());
        assert!(p.date.is_none());

        let p: Probe = serde_json::from_str("{}").unwrap();
        assert!(p.text.is_none());
        assert!(p.date.is_none());

        let p: Probe = serde_json::from_str(r#"{"text": null, "date": null}"#).unwrap();
        assert!(p.text.is_none());
        assert!(p.date.is_none());
    }

    #[test]
    fn values_are_trimmed_and_parsed() {
        let p: Probe =
            serde_json::from_str(r#"{"text": " PIX ", "date": "2025-03-10"}"#).unwrap();
        assert_eq!(p.text.as_deref(), Some("PIX"));
        assert_eq!(p.date, NaiveDate::from_ymd_opt(2025, 3, 10));
    }

    #[test]
    fn malformed_date_is_rejected() {
        let res: Result<Probe, _> = serde_json::from_str(r#"{"date": "10/03/2025"}"#);
        assert!(res.is_err());
    }
}
