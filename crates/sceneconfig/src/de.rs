//! Serde helpers for fields whose TOML form is friendlier than their Rust type.

use std::time::Duration;

use serde::de::{Deserializer, Error as _};
use serde::{Deserialize, Serializer};

use crate::AntialiasSetting;

/// Durations are written as seconds (`0.25`, `2`) or humantime text (`"16ms"`).
#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Seconds(f64),
    Text(String),
}

impl RawDuration {
    fn into_duration(self) -> Result<Duration, String> {
        match self {
            RawDuration::Seconds(secs) if secs.is_sign_negative() => {
                Err(format!("duration must be non-negative, got {secs}"))
            }
            RawDuration::Seconds(secs) => Duration::try_from_secs_f64(secs)
                .map_err(|_| format!("duration of {secs} seconds is out of range")),
            RawDuration::Text(text) => humantime::parse_duration(text.trim())
                .map_err(|err| format!("invalid duration '{text}': {err}")),
        }
    }
}

pub(crate) fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    RawDuration::deserialize(deserializer)?
        .into_duration()
        .map_err(D::Error::custom)
}

pub(crate) fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<RawDuration>::deserialize(deserializer)?
        .map(RawDuration::into_duration)
        .transpose()
        .map_err(D::Error::custom)
}

pub(crate) fn serialize_duration<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&humantime::format_duration(*value))
}

pub(crate) fn serialize_duration_opt<S>(
    value: &Option<Duration>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(duration) => serialize_duration(duration, serializer),
        None => serializer.serialize_none(),
    }
}

/// Antialias accepts a keyword or a bare sample count.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawAntialias {
    Samples(u32),
    Keyword(String),
}

pub(crate) fn deserialize_antialias_opt<'de, D>(
    deserializer: D,
) -> Result<Option<AntialiasSetting>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<RawAntialias>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let parsed = match raw {
        RawAntialias::Samples(count) => parse_antialias(&count.to_string()),
        RawAntialias::Keyword(word) => parse_antialias(&word),
    };
    parsed.map(Some).map_err(D::Error::custom)
}

pub(crate) fn serialize_antialias_opt<S>(
    value: &Option<AntialiasSetting>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(setting) => serializer.collect_str(setting),
        None => serializer.serialize_none(),
    }
}

/// Parses `auto`, `off` or a sample count of 2, 4, 8 or 16.
pub fn parse_antialias(raw: &str) -> Result<AntialiasSetting, String> {
    let word = raw.trim().to_ascii_lowercase();
    let setting = match word.as_str() {
        "auto" | "max" => AntialiasSetting::Auto,
        "off" | "none" | "0" | "1" => AntialiasSetting::Off,
        "2" => AntialiasSetting::Samples2,
        "4" => AntialiasSetting::Samples4,
        "8" => AntialiasSetting::Samples8,
        "16" => AntialiasSetting::Samples16,
        _ => return Err(format!("invalid antialias setting '{raw}', expected auto, off, 2, 4, 8 or 16")),
    };
    Ok(setting)
}
