#![deny(warnings)]

//! Persistence layer: JSON save files with a versioned envelope.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fund_core::{GameSnapshot, SNAPSHOT_SCHEMA_VERSION};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

/// Name used when sanitizing leaves nothing behind.
pub const DEFAULT_SAVE_NAME: &str = "savegame";

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("save file i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("save file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("save schema {0} is newer than this build supports")]
    UnsupportedSchema(u32),
}

/// On-disk wrapper around a snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SaveEnvelope {
    pub schema_version: u32,
    pub saved_at: DateTime<Utc>,
    pub state: GameSnapshot,
}

/// A decoded save, upgraded to the current schema.
#[derive(Clone, Debug)]
pub struct LoadedSave {
    /// Schema the file was written with; 0 for bare legacy state.
    pub schema_version: u32,
    pub saved_at: Option<DateTime<Utc>>,
    pub state: GameSnapshot,
}

/// Keep ASCII alphanumerics, `_` and `-`.
pub fn sanitize_name(name: &str) -> String {
    let clean: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if clean.is_empty() {
        DEFAULT_SAVE_NAME.to_string()
    } else {
        clean
    }
}

pub fn save_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.json", sanitize_name(name)))
}

/// Write `state` to `{dir}/{name}.json`, creating `dir` if needed.
pub fn save(dir: &Path, name: &str, state: &GameSnapshot) -> Result<PathBuf, PersistenceError> {
    fs::create_dir_all(dir)?;
    let path = save_path(dir, name);
    let envelope = SaveEnvelope {
        schema_version: SNAPSHOT_SCHEMA_VERSION,
        saved_at: Utc::now(),
        state: state.clone(),
    };
    fs::write(&path, serde_json::to_string_pretty(&envelope)?)?;
    info!(path = %path.display(), week = state.week, year = state.year, "game saved");
    Ok(path)
}

/// Load a save by name. `Ok(None)` when no such file exists.
pub fn load(dir: &Path, name: &str) -> Result<Option<GameSnapshot>, PersistenceError> {
    let path = save_path(dir, name);
    if !path.exists() {
        debug!(path = %path.display(), "no save file");
        return Ok(None);
    }
    Ok(Some(load_path(&path)?.state))
}

/// Decode any supported save file and upgrade it to the current schema.
pub fn load_path(path: &Path) -> Result<LoadedSave, PersistenceError> {
    let raw: Value = serde_json::from_str(&fs::read_to_string(path)?)?;
    let loaded = decode(raw)?;
    info!(
        path = %path.display(),
        schema = loaded.schema_version,
        week = loaded.state.week,
        year = loaded.state.year,
        "save loaded"
    );
    Ok(loaded)
}

/// Split a document into envelope metadata and state, then migrate the
/// state to the current layout.
pub fn decode(raw: Value) -> Result<LoadedSave, PersistenceError> {
    let (schema_version, saved_at, mut state) = match raw {
        Value::Object(mut map) if map.contains_key("schema_version") && map.contains_key("state") => {
            let version = map
                .get("schema_version")
                .and_then(Value::as_u64)
                .map(|v| u32::try_from(v).unwrap_or(u32::MAX))
                .unwrap_or(0);
            let saved_at = map
                .remove("saved_at")
                .and_then(|v| serde_json::from_value(v).ok());
            let state = map.remove("state").unwrap_or(Value::Null);
            (version, saved_at, state)
        }
        bare => (0, None, bare),
    };
    if schema_version > SNAPSHOT_SCHEMA_VERSION {
        return Err(PersistenceError::UnsupportedSchema(schema_version));
    }
    migrate_state(schema_version, &mut state);
    Ok(LoadedSave {
        schema_version,
        saved_at,
        state: serde_json::from_value(state)?,
    })
}

/// Fill fields that older layouts did not carry. Anything still missing
/// takes the type's default during deserialization.
fn migrate_state(from: u32, state: &mut Value) {
    if from < 1 {
        if let Some(player) = state.get_mut("player").and_then(Value::as_object_mut) {
            if !player.contains_key("starting_aum") {
                if let Some(aum) = player.get("aum").cloned() {
                    debug!("defaulting player.starting_aum to saved aum");
                    player.insert("starting_aum".into(), aum);
                }
            }
        }
        tag_bare_effects(state);
    }
}

/// Unversioned saves store argument-free choice effects as bare strings
/// (`"restart"`); the current layout tags them as `{"type": "restart"}`.
fn tag_bare_effects(state: &mut Value) {
    let Some(events) = state.get_mut("events_queue").and_then(Value::as_array_mut) else {
        return;
    };
    let choices = events
        .iter_mut()
        .filter_map(|e| e.get_mut("choices").and_then(Value::as_array_mut))
        .flatten();
    for choice in choices {
        if let Some(effect) = choice.get_mut("effect") {
            if let Value::String(tag) = effect {
                let tag = std::mem::take(tag);
                debug!(%tag, "tagging bare event effect");
                *effect = serde_json::json!({ "type": tag });
            }
        }
    }
}

/// Rewrite a save file at the current schema. Returns the schema it had.
pub fn migrate_file(path: &Path) -> Result<u32, PersistenceError> {
    let loaded = load_path(path)?;
    let envelope = SaveEnvelope {
        schema_version: SNAPSHOT_SCHEMA_VERSION,
        saved_at: loaded.saved_at.unwrap_or_else(Utc::now),
        state: loaded.state,
    };
    fs::write(path, serde_json::to_string_pretty(&envelope)?)?;
    info!(
        path = %path.display(),
        from = loaded.schema_version,
        to = SNAPSHOT_SCHEMA_VERSION,
        "save migrated"
    );
    Ok(loaded.schema_version)
}

/// Save names in `dir`, sorted. A missing directory has no saves.
pub fn list_saves(dir: &Path) -> Result<Vec<String>, PersistenceError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut names = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            names.push(stem.to_string());
        }
    }
    names.sort();
    Ok(names)
}
