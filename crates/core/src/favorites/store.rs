use std::collections::HashSet;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::{parse_game_id, EntityRef, Game, GameId};

use super::storage::KeyValueStore;

/// Slot holding the JSON array of favorite game ids.
pub const FAVORITES_KEY: &str = "favorite_games_ids";

/// Which related names a favorites query also searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOptions {
    /// Match against genre names.
    pub include_genres: bool,
    /// Match against tag names.
    pub include_tags: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            include_genres: true,
            include_tags: true,
        }
    }
}

/// Persisted set of favorite game ids.
///
/// The store never reports errors: unreadable or malformed data reads as an
/// empty set and failed writes are logged and dropped. Ids are re-read from
/// the backend on every call.
pub struct FavoritesStore<S> {
    storage: S,
    write_lock: Mutex<()>,
}

impl<S: KeyValueStore> FavoritesStore<S> {
    /// Wrap a key-value backend.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            write_lock: Mutex::new(()),
        }
    }

    /// Backend the ids are persisted to.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Favorite ids, most recently added first.
    pub fn list_favorite_ids(&self) -> Vec<GameId> {
        match self.storage.get(FAVORITES_KEY) {
            Ok(Some(raw)) => parse_ids(&raw),
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(%err, "failed to read favorites; treating as empty");
                Vec::new()
            }
        }
    }

    /// Whether `id` is a favorite.
    pub fn is_favorite(&self, id: GameId) -> bool {
        self.list_favorite_ids().contains(&id)
    }

    /// Favorite ids as a set, for callers checking many games.
    pub fn favorite_set(&self) -> HashSet<GameId> {
        self.list_favorite_ids().into_iter().collect()
    }

    /// Remove `id` if present, otherwise prepend it. Returns the updated ids.
    ///
    /// Toggles through the same store are serialized, so concurrent callers
    /// never overwrite each other's changes.
    pub fn toggle_favorite(&self, id: GameId) -> Vec<GameId> {
        let _guard = self.write_lock.lock();
        let mut ids = self.list_favorite_ids();
        if ids.contains(&id) {
            ids.retain(|existing| *existing != id);
            debug!(id, "favorite removed");
        } else {
            ids.insert(0, id);
            debug!(id, "favorite added");
        }
        self.persist(&ids);
        ids
    }

    /// Drop every favorite.
    pub fn clear(&self) {
        let _guard = self.write_lock.lock();
        self.persist(&[]);
    }

    /// Favorites among `games`, in input order, optionally narrowed by a
    /// case-insensitive substring of the name, genre names or tag names.
    pub fn filter_favorites<'a>(
        &self,
        games: &'a [Game],
        query: &str,
        options: FilterOptions,
    ) -> Vec<&'a Game> {
        let favorites = self.favorite_set();
        let needle = query.trim().to_lowercase();

        games
            .iter()
            .filter(|game| favorites.contains(&game.id))
            .filter(|game| needle.is_empty() || game_matches(game, &needle, options))
            .collect()
    }

    fn persist(&self, ids: &[GameId]) {
        let serialized = match serde_json::to_string(ids) {
            Ok(serialized) => serialized,
            Err(err) => {
                warn!(%err, "failed to serialize favorites");
                return;
            }
        };
        if let Err(err) = self.storage.set(FAVORITES_KEY, &serialized) {
            warn!(%err, "failed to persist favorites");
        }
    }
}

fn game_matches(game: &Game, needle: &str, options: FilterOptions) -> bool {
    let any_named = |refs: &[EntityRef]| {
        refs.iter()
            .any(|entity| entity.name.to_lowercase().contains(needle))
    };

    game.name.to_lowercase().contains(needle)
        || (options.include_genres && any_named(game.genres.as_slice()))
        || (options.include_tags && any_named(game.tags.as_slice()))
}

fn parse_ids(raw: &str) -> Vec<GameId> {
    let values = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(values)) => values,
        Ok(Value::Null) => return Vec::new(),
        Ok(other) => {
            warn!(kind = value_kind(&other), "favorites slot is not an array; ignoring");
            return Vec::new();
        }
        Err(err) => {
            warn!(%err, "favorites slot is not valid JSON; ignoring");
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    values
        .iter()
        .filter_map(coerce_id)
        .filter(|id| seen.insert(*id))
        .collect()
}

fn coerce_id(value: &Value) -> Option<GameId> {
    match value {
        Value::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.fract() == 0.0 && *float >= 0.0 && *float < u64::MAX as f64)
                .map(|float| float as GameId)
        }),
        Value::String(text) => parse_game_id(text),
        _ => None,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
