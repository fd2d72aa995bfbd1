use std::time::Duration;

use serde::{Deserialize, Deserializer};

/// Deserialize an optional human readable duration such as "30s" or "1m30s".
pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;

    s.map(|s| humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom))
        .transpose()
}
