//! Resolving user-typed identifiers to workouts, exercises and sets.
//!
//! Workouts and exercises are matched by exact id, then by case-insensitive
//! name, then by unique id prefix (the short ids shown in listings). Sets
//! have no name: they are matched by 1-based position, exact id or unique id
//! prefix.

use repbook_core::{EntityId, Exercise, Set, Workout};

/// Shortest id prefix accepted as an identifier.
const MIN_PREFIX: usize = 4;

#[derive(Debug, PartialEq)]
pub enum LookupError {
    NotFound { kind: &'static str, ident: String },
    Ambiguous { kind: &'static str, ident: String },
    Position { position: usize, len: usize },
}

impl std::fmt::Display for LookupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupError::NotFound { kind, ident } => write!(f, "{} not found: {}", kind, ident),
            LookupError::Ambiguous { kind, ident } => {
                write!(f, "'{}' matches more than one {}; use its id", ident, kind.to_lowercase())
            }
            LookupError::Position { position, len } => {
                write!(f, "Position {} is out of range (1-{})", position, len)
            }
        }
    }
}

impl std::error::Error for LookupError {}

pub trait Named {
    const KIND: &'static str;
    fn id(&self) -> &EntityId;
    fn name(&self) -> &str;
}

impl Named for Workout {
    const KIND: &'static str = "Workout";
    fn id(&self) -> &EntityId {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Exercise {
    const KIND: &'static str = "Exercise";
    fn id(&self) -> &EntityId {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
}

/// Finds an item by id or name. Returns its index and the item.
pub fn find<'a, T: Named>(items: &'a [T], ident: &str) -> Result<(usize, &'a T), LookupError> {
    let ident = ident.trim();

    if let Some(found) = items.iter().enumerate().find(|(_, item)| item.id() == ident) {
        return Ok(found);
    }

    let lowered = ident.to_lowercase();
    let by_name: Vec<_> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.name().to_lowercase() == lowered)
        .collect();
    match by_name.as_slice() {
        [one] => return Ok(*one),
        [] => {}
        _ => {
            return Err(LookupError::Ambiguous {
                kind: T::KIND,
                ident: ident.to_string(),
            })
        }
    }

    match match_prefix(items.iter().map(Named::id), ident) {
        PrefixMatch::One(index) => Ok((index, &items[index])),
        PrefixMatch::Many => Err(LookupError::Ambiguous {
            kind: T::KIND,
            ident: ident.to_string(),
        }),
        PrefixMatch::None => Err(LookupError::NotFound {
            kind: T::KIND,
            ident: ident.to_string(),
        }),
    }
}

/// Finds a set by 1-based position or id.
pub fn find_set<'a>(sets: &'a [Set], ident: &str) -> Result<(usize, &'a Set), LookupError> {
    let ident = ident.trim();

    if let Ok(position) = ident.parse::<usize>() {
        let index = position_to_index(position, sets.len())?;
        return Ok((index, &sets[index]));
    }

    if let Some(found) = sets.iter().enumerate().find(|(_, set)| set.id == ident) {
        return Ok(found);
    }

    match match_prefix(sets.iter().map(|s| &s.id), ident) {
        PrefixMatch::One(index) => Ok((index, &sets[index])),
        PrefixMatch::Many => Err(LookupError::Ambiguous {
            kind: "Set",
            ident: ident.to_string(),
        }),
        PrefixMatch::None => Err(LookupError::NotFound {
            kind: "Set",
            ident: ident.to_string(),
        }),
    }
}

/// Converts a 1-based position into an index into a list of `len` items.
pub fn position_to_index(position: usize, len: usize) -> Result<usize, LookupError> {
    if position == 0 || position > len {
        return Err(LookupError::Position { position, len });
    }
    Ok(position - 1)
}

enum PrefixMatch {
    None,
    One(usize),
    Many,
}

fn match_prefix<'a>(ids: impl Iterator<Item = &'a EntityId>, prefix: &str) -> PrefixMatch {
    if prefix.chars().count() < MIN_PREFIX {
        return PrefixMatch::None;
    }

    let mut matches = ids
        .enumerate()
        .filter(|(_, id)| id.as_str().starts_with(prefix))
        .map(|(index, _)| index);

    match (matches.next(), matches.next()) {
        (None, _) => PrefixMatch::None,
        (Some(index), None) => PrefixMatch::One(index),
        (Some(_), Some(_)) => PrefixMatch::Many,
    }
}
