use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entity_id::EntityId;

/// One recorded (weight, reps, timestamp) entry of an exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Set {
    pub id: EntityId,
    pub weight: f64,
    pub reps: u32,
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
}

impl Set {
    /// Creates a set stamped with the current time.
    ///
    /// The timestamp is truncated to milliseconds, the precision it is
    /// stored with.
    pub fn new(weight: f64, reps: u32) -> Self {
        Self {
            id: EntityId::new(),
            weight,
            reps,
            timestamp: Utc::now().trunc_subsecs(3),
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp.trunc_subsecs(3);
        self
    }

    /// Weight moved by this set (weight × reps).
    pub fn volume(&self) -> f64 {
        self.weight * f64::from(self.reps)
    }
}

impl fmt::Display for Set {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} x {} ({})",
            self.weight,
            self.reps,
            self.timestamp.format("%Y-%m-%d %H:%M")
        )
    }
}

/// ISO-8601 timestamps with millisecond precision and a `Z` suffix.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
