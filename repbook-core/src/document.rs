//! The workouts document.
//!
//! A user's whole collection is one JSON document. On the wire (both
//! directions of `/api/workouts`) it travels inside an envelope:
//!
//! ```text
//! { "workouts": [ { "id": "...", "name": "Legs", "exercises": [ ... ] } ] }
//! ```
//!
//! In the key-value store the value is the bare array.
//!
//! Lenient decoding works entry by entry: a workout, exercise or set that
//! cannot be read is skipped (or a bad field defaulted) with a warning, and
//! the rest of the collection survives. Only a document that is not JSON,
//! or not an array of workouts at all, decodes to an empty collection.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entity_id::EntityId;
use crate::models::{Exercise, Set, Workout};

/// Wire envelope for the workouts resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkoutsDocument {
    #[serde(default)]
    pub workouts: Vec<Workout>,
}

/// Borrowed envelope used when sending, to avoid cloning the collection.
#[derive(Debug, Serialize)]
pub struct WorkoutsDocumentRef<'a> {
    pub workouts: &'a [Workout],
}

/// Serializes a collection as the stored array form.
pub fn encode(workouts: &[Workout]) -> Result<String, serde_json::Error> {
    serde_json::to_string(workouts)
}

/// Parses the stored array form strictly.
pub fn decode(raw: &str) -> Result<Vec<Workout>, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Parses the stored array form, keeping every entry that can be read.
pub fn decode_lenient(raw: &str) -> Vec<Workout> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => workouts_from_values(items),
        Ok(_) => {
            tracing::warn!("Ignoring workouts document that is not an array");
            Vec::new()
        }
        Err(e) => {
            tracing::warn!("Ignoring malformed workouts document: {}", e);
            Vec::new()
        }
    }
}

/// Parses an envelope, keeping every entry that can be read.
pub fn decode_envelope_lenient(raw: &str) -> Vec<Workout> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(mut doc)) => match doc.remove("workouts") {
            Some(Value::Array(items)) => workouts_from_values(items),
            None | Some(Value::Null) => Vec::new(),
            Some(_) => {
                tracing::warn!("Ignoring workouts response whose workouts is not an array");
                Vec::new()
            }
        },
        Ok(_) => {
            tracing::warn!("Ignoring workouts response that is not an object");
            Vec::new()
        }
        Err(e) => {
            tracing::warn!("Ignoring malformed workouts response: {}", e);
            Vec::new()
        }
    }
}

fn workouts_from_values(items: Vec<Value>) -> Vec<Workout> {
    items.into_iter().filter_map(workout_from_value).collect()
}

fn workout_from_value(value: Value) -> Option<Workout> {
    let Value::Object(mut fields) = value else {
        tracing::warn!("Skipping workout entry that is not an object");
        return None;
    };

    Some(Workout {
        id: id_field(&fields, "workout"),
        name: name_field(&fields),
        exercises: list_field(&mut fields, "exercises")
            .into_iter()
            .filter_map(exercise_from_value)
            .collect(),
    })
}

fn exercise_from_value(value: Value) -> Option<Exercise> {
    let Value::Object(mut fields) = value else {
        tracing::warn!("Skipping exercise entry that is not an object");
        return None;
    };

    Some(Exercise {
        id: id_field(&fields, "exercise"),
        name: name_field(&fields),
        sets: list_field(&mut fields, "sets")
            .into_iter()
            .filter_map(set_from_value)
            .collect(),
    })
}

/// A set needs a numeric weight and a whole, non-negative rep count. A
/// missing or unreadable timestamp falls back to the current time.
fn set_from_value(value: Value) -> Option<Set> {
    let Value::Object(fields) = value else {
        tracing::warn!("Skipping set entry that is not an object");
        return None;
    };

    let Some(weight) = fields.get("weight").and_then(Value::as_f64) else {
        tracing::warn!("Skipping set without a numeric weight");
        return None;
    };
    let Some(reps) = fields.get("reps").and_then(reps_from_value) else {
        tracing::warn!("Skipping set without a valid rep count");
        return None;
    };

    let id = id_field(&fields, "set");
    let timestamp = fields
        .get("timestamp")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| {
            tracing::warn!(set_id = %id, "Set has no valid timestamp, using the current time");
            Utc::now()
        });

    Some(Set {
        id,
        weight,
        reps,
        timestamp: timestamp.trunc_subsecs(3),
    })
}

fn reps_from_value(value: &Value) -> Option<u32> {
    match value.as_u64() {
        Some(n) => u32::try_from(n).ok(),
        None => value
            .as_f64()
            .filter(|n| n.fract() == 0.0 && *n >= 0.0 && *n <= f64::from(u32::MAX))
            .map(|n| n as u32),
    }
}

/// Reads an id written as a string or a number; anything else gets a fresh
/// id so the entry is still addressable.
fn id_field(fields: &Map<String, Value>, kind: &str) -> EntityId {
    let parsed = match fields.get("id") {
        Some(Value::String(s)) => EntityId::parse(s).ok(),
        Some(Value::Number(n)) => EntityId::parse(&n.to_string()).ok(),
        _ => None,
    };
    parsed.unwrap_or_else(|| {
        tracing::warn!("{} has no valid id, assigning a new one", kind);
        EntityId::new()
    })
}

fn name_field(fields: &Map<String, Value>) -> String {
    fields
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}

fn list_field(fields: &mut Map<String, Value>, key: &str) -> Vec<Value> {
    match fields.remove(key) {
        Some(Value::Array(items)) => items,
        None | Some(Value::Null) => Vec::new(),
        Some(_) => {
            tracing::warn!("Ignoring {} that is not a list", key);
            Vec::new()
        }
    }
}
