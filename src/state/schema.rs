//! Stored shape of the application state and the migration from older or
//! hand-edited documents.
//!
//! The stored document looks like
//! `{ schemaVersion, players, history, nextContext, nextRatio, autoBase, ui? }`.
//! Documents written before `schemaVersion` existed are treated as version 0
//! and go through the same migration.

use std::collections::HashSet;

use rand::Rng;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{LineCallerError, Result};
use crate::roster::{Gender, Player, PlayerId, Position, Preference, Roster};
use crate::rotation::{
    auto_ratio, Context, History, HistoryEntry, RatioLabel, RatioSelection, RotationState,
};

pub const SCHEMA_VERSION: u32 = 1;

/// Current stored schema
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub schema_version: u32,
    pub players: Roster,
    pub history: History,
    #[serde(flatten)]
    pub rotation: RotationState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ui: Option<Value>,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            players: Roster::default(),
            history: History::default(),
            rotation: RotationState::default(),
            ui: None,
        }
    }
}

fn malformed(message: impl Into<String>) -> LineCallerError {
    LineCallerError::MalformedImport(message.into())
}

/// Reads an optional string field, parsing it with `parse` and falling back
/// to `default` when the field is absent or null
fn string_field<T>(
    obj: &Map<String, Value>,
    key: &str,
    default: T,
    parse: impl Fn(&str) -> Option<T>,
    what: &str,
) -> Result<T> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::String(s)) => {
            parse(s).ok_or_else(|| malformed(format!("{}: unknown value '{}'", what, s)))
        }
        Some(other) => Err(malformed(format!("{}: expected a string, got {}", what, other))),
    }
}

/// Like `string_field`, but a blank or unrecognised value also falls back
/// to `default` instead of rejecting the document
fn lenient_field<T>(
    obj: &Map<String, Value>,
    key: &str,
    default: T,
    parse: impl Fn(&str) -> Option<T>,
    what: &str,
) -> T {
    match obj.get(key) {
        None | Some(Value::Null) => default,
        Some(Value::String(s)) if s.trim().is_empty() => default,
        Some(Value::String(s)) => parse(s.trim()).unwrap_or_else(|| {
            debug!(field = what, value = %s, "unknown value, using default");
            default
        }),
        Some(other) => {
            debug!(field = what, value = %other, "expected a string, using default");
            default
        }
    }
}

/// Whole, non-negative counts; `3`, `3.0` and `"3"` all read as 3
fn count_value(value: &Value) -> Option<u32> {
    let n = match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64))?,
        Value::String(s) => s.trim().parse::<u64>().ok()?,
        _ => return None,
    };
    Some(u32::try_from(n).unwrap_or(u32::MAX))
}

/// Ids may have been stored as numbers by other tools
fn id_value(value: &Value) -> Option<PlayerId> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(PlayerId::new(s.trim())),
        Value::Number(n) => Some(PlayerId::new(n.to_string())),
        _ => None,
    }
}

fn migrate_player<R: Rng + ?Sized>(
    index: usize,
    value: &Value,
    seen: &mut HashSet<PlayerId>,
    rng: &mut R,
) -> Result<Player> {
    let what = |field: &str| format!("players[{}].{}", index, field);
    let obj = value
        .as_object()
        .ok_or_else(|| malformed(format!("players[{}] is not an object", index)))?;

    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| malformed(format!("{} is required", what("name"))))?;

    let gender = match obj.get("gender").and_then(Value::as_str) {
        Some(g) => Gender::parse(g)
            .ok_or_else(|| malformed(format!("{}: unknown value '{}'", what("gender"), g)))?,
        None => return Err(malformed(format!("{} is required", what("gender")))),
    };
    let position = lenient_field(obj, "position", Position::Both, Position::parse, &what("position"));
    let pref = lenient_field(obj, "pref", Preference::Either, Preference::parse, &what("pref"));
    let available = obj.get("available").and_then(Value::as_bool).unwrap_or(true);
    let points_played = match obj.get("pointsPlayed") {
        None | Some(Value::Null) => 0,
        Some(raw) => count_value(raw).unwrap_or_else(|| {
            debug!(field = %what("pointsPlayed"), value = %raw, "not a whole count, using 0");
            0
        }),
    };

    let id = match obj.get("id").and_then(id_value) {
        Some(id) => id,
        None => loop {
            let id = PlayerId::generate(rng);
            if !seen.contains(&id) {
                break id;
            }
        },
    };
    if !seen.insert(id.clone()) {
        return Err(malformed(format!("duplicate player id '{}'", id)));
    }

    Ok(Player {
        id,
        name: name.to_string(),
        gender,
        position,
        pref,
        available,
        points_played,
    })
}

fn migrate_history_entry(index: usize, value: &Value, auto_base: RatioLabel) -> Result<HistoryEntry> {
    let obj = value
        .as_object()
        .ok_or_else(|| malformed(format!("history[{}] is not an object", index)))?;

    let line = match obj.get("line") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(ids)) => ids.iter().filter_map(id_value).collect(),
        Some(_) => return Err(malformed(format!("history[{}].line must be a list", index))),
    };
    let context = string_field(
        obj,
        "context",
        Context::Offense,
        |s| s.parse().ok(),
        &format!("history[{}].context", index),
    )?;
    // Older documents may hold "auto" here; the label it stood for is recomputed.
    let ratio = match obj.get("ratio").and_then(Value::as_str) {
        None | Some("auto") => auto_ratio(index, auto_base),
        Some(label) => label.parse::<RatioLabel>().map_err(malformed)?,
    };

    Ok(HistoryEntry {
        timestamp: obj.get("timestamp").and_then(Value::as_i64).unwrap_or(0),
        line,
        context,
        ratio,
    })
}

/// Maps any stored or imported document onto the current schema.
///
/// Rejects documents that are not objects, whose `players` is not a list,
/// or that carry a newer schema version. Every missing field gets its
/// default, as does a blank or unknown player `position` or `pref`.
/// Unknown fields are dropped, except `ui` which is kept as is.
pub fn migrate<R: Rng + ?Sized>(value: &Value, rng: &mut R) -> Result<PersistedState> {
    let obj = value
        .as_object()
        .ok_or_else(|| malformed("expected a JSON object"))?;

    let version = match obj.get("schemaVersion") {
        None | Some(Value::Null) => 0,
        Some(v) => v
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| malformed("schemaVersion must be a non-negative integer"))?,
    };
    if version > SCHEMA_VERSION {
        return Err(LineCallerError::UnsupportedSchemaVersion(version));
    }

    let raw_players = obj
        .get("players")
        .and_then(Value::as_array)
        .ok_or_else(|| malformed("players must be a list"))?;
    let mut seen = HashSet::new();
    let players = raw_players
        .iter()
        .enumerate()
        .map(|(i, p)| migrate_player(i, p, &mut seen, &mut *rng))
        .collect::<Result<Vec<_>>>()?;

    let auto_base = string_field(
        obj,
        "autoBase",
        RatioLabel::default(),
        |s| s.parse().ok(),
        "autoBase",
    )?;
    let rotation = RotationState {
        next_context: string_field(obj, "nextContext", Context::default(), |s| s.parse().ok(), "nextContext")?,
        next_ratio_selection: string_field(
            obj,
            "nextRatio",
            RatioSelection::default(),
            |s| s.parse().ok(),
            "nextRatio",
        )?,
        auto_base,
    };

    let history = match obj.get("history") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(entries)) => entries
            .iter()
            .enumerate()
            .map(|(i, e)| migrate_history_entry(i, e, auto_base))
            .collect::<Result<Vec<_>>>()?,
        Some(_) => return Err(malformed("history must be a list")),
    };

    let ui = obj.get("ui").filter(|v| v.is_object()).cloned();

    Ok(PersistedState {
        schema_version: SCHEMA_VERSION,
        players: Roster::new(players),
        history: History::new(history),
        rotation,
        ui,
    })
}
