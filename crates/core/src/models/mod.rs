//! Shared domain models.
//!
//! Every type here is a read-only view of an upstream JSON object. Fields
//! other than the identifier fall back to their defaults when missing or
//! `null`, and unknown fields are ignored.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

mod markup;

pub use markup::strip_markup;

/// Numeric identifier of a game.
pub type GameId = u64;

/// Placeholder shown for absent values.
pub const MISSING: &str = "—";

/// A game as returned by the list and detail endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    /// Upstream identifier.
    pub id: GameId,
    /// Display name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// URL slug.
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
    /// Release date as sent upstream (`YYYY-MM-DD`).
    #[serde(default)]
    pub released: Option<String>,
    /// Average user rating.
    #[serde(default)]
    pub rating: Option<f64>,
    /// Hero image URL.
    #[serde(default)]
    pub background_image: Option<String>,
    /// Genres the game belongs to.
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<EntityRef>,
    /// User tags.
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<EntityRef>,
    /// Platforms, wrapped the way upstream nests them.
    #[serde(default, deserialize_with = "null_as_default")]
    pub platforms: Vec<PlatformWrapper>,
    /// Publishers (only present on the detail endpoint).
    #[serde(default, deserialize_with = "null_as_default")]
    pub publishers: Vec<PublisherRef>,
    /// Description, may contain HTML.
    #[serde(default)]
    pub description: Option<String>,
    /// Plain-text description when upstream provides one.
    #[serde(default)]
    pub description_raw: Option<String>,
    /// Metacritic score.
    #[serde(default)]
    pub metacritic: Option<u32>,
}

impl Game {
    /// Rating rendered with two decimals.
    pub fn rating_label(&self) -> String {
        match self.rating {
            Some(rating) => format!("{rating:.2}"),
            None => MISSING.to_string(),
        }
    }

    /// Release date when upstream sent a well-formed calendar date.
    pub fn released_date(&self) -> Option<NaiveDate> {
        self.released
            .as_deref()
            .and_then(|value| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok())
    }

    /// Release label, falling back to the raw upstream value.
    pub fn released_label(&self) -> String {
        match (self.released_date(), self.released.as_deref()) {
            (Some(date), _) => date.format("%d %b %Y").to_string(),
            (None, Some(raw)) if !raw.trim().is_empty() => raw.to_string(),
            _ => MISSING.to_string(),
        }
    }

    /// Platform names joined with commas.
    pub fn platform_names(&self) -> String {
        let names: Vec<&str> = self
            .platforms
            .iter()
            .map(|wrapper| wrapper.platform.name.as_str())
            .filter(|name| !name.is_empty())
            .collect();
        if names.is_empty() {
            MISSING.to_string()
        } else {
            names.join(", ")
        }
    }

    /// Plain-text description, preferring the raw variant.
    pub fn plain_description(&self) -> Option<String> {
        if let Some(raw) = self.description_raw.as_deref() {
            if !raw.trim().is_empty() {
                return Some(raw.trim().to_string());
            }
        }
        self.description
            .as_deref()
            .map(strip_markup)
            .filter(|text| !text.is_empty())
    }
}

/// Minimal `{id, name, slug}` link embedded in a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    /// Upstream identifier.
    pub id: u64,
    /// Display name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Slug used by the filtered listings.
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
}

/// Upstream wraps each platform in an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformWrapper {
    /// The wrapped platform.
    pub platform: EntityRef,
}

/// Publisher link embedded in a game detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublisherRef {
    /// Upstream identifier.
    pub id: u64,
    /// Display name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// Screenshot attached to a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screenshot {
    /// Upstream identifier.
    pub id: u64,
    /// Full-size image URL.
    #[serde(default, deserialize_with = "null_as_default")]
    pub image: String,
}

/// A game publisher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publisher {
    /// Upstream identifier.
    pub id: u64,
    /// Display name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// URL slug.
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
    /// Background image URL.
    #[serde(default)]
    pub image_background: Option<String>,
    /// Description, may contain HTML.
    #[serde(default)]
    pub description: Option<String>,
    /// Number of games credited to the publisher.
    #[serde(default, deserialize_with = "null_as_default")]
    pub games_count: u64,
}

impl Publisher {
    /// Plain-text description with markup removed.
    pub fn plain_description(&self) -> Option<String> {
        self.description
            .as_deref()
            .map(strip_markup)
            .filter(|text| !text.is_empty())
    }
}

/// A genre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    /// Upstream identifier.
    pub id: u64,
    /// Display name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Slug used by `games_by_genre`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
    /// Background image URL.
    #[serde(default)]
    pub image_background: Option<String>,
    /// Description, may contain HTML.
    #[serde(default)]
    pub description: Option<String>,
    /// Number of games in the genre.
    #[serde(default, deserialize_with = "null_as_default")]
    pub games_count: u64,
}

impl Genre {
    /// Plain-text description with markup removed.
    pub fn plain_description(&self) -> Option<String> {
        self.description
            .as_deref()
            .map(strip_markup)
            .filter(|text| !text.is_empty())
    }
}

/// Envelope shared by every list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    /// Total number of matches upstream.
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: u64,
    /// URL of the next page, present iff one exists.
    #[serde(default)]
    pub next: Option<String>,
    /// URL of the previous page.
    #[serde(default)]
    pub previous: Option<String>,
    /// Entities on this page.
    #[serde(default = "Vec::new", deserialize_with = "null_as_default")]
    pub results: Vec<T>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            count: 0,
            next: None,
            previous: None,
            results: Vec::new(),
        }
    }
}

impl<T> Page<T> {
    /// Whether upstream signalled a further page that is worth fetching.
    pub fn has_next(&self) -> bool {
        self.next.as_deref().is_some_and(|next| !next.is_empty()) && !self.results.is_empty()
    }
}

/// Parse an identifier typed by the user or taken from a link.
pub fn parse_game_id(input: &str) -> Option<GameId> {
    static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d+)\s*$").expect("invalid id regex"));
    DIGITS
        .captures(input)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn game_tolerates_nulls_and_unknown_fields() {
        let game: Game = serde_json::from_value(json!({
            "id": 3498,
            "name": "Grand Theft Auto V",
            "released": "2013-09-17",
            "rating": 4.47,
            "background_image": null,
            "genres": [{"id": 4, "name": "Action", "slug": "action"}],
            "tags": null,
            "platforms": [
                {"platform": {"id": 4, "name": "PC", "slug": "pc"}, "released_at": "2013-09-17"},
                {"platform": {"id": 187, "name": "PlayStation 5", "slug": "playstation5"}}
            ],
            "esrb_rating": {"id": 4, "name": "Mature"}
        }))
        .expect("game should deserialize");

        assert_eq!(game.id, 3498);
        assert!(game.tags.is_empty());
        assert_eq!(game.genres[0].slug, "action");
        assert_eq!(game.rating_label(), "4.47");
        assert_eq!(game.released_date(), NaiveDate::from_ymd_opt(2013, 9, 17));
        assert_eq!(game.released_label(), "17 Sep 2013");
        assert_eq!(game.platform_names(), "PC, PlayStation 5");
        assert_eq!(game.metacritic, None);
    }

    #[test]
    fn placeholders_for_missing_values() {
        let game: Game = serde_json::from_value(json!({"id": 1})).unwrap();
        assert_eq!(game.name, "");
        assert_eq!(game.rating_label(), MISSING);
        assert_eq!(game.released_label(), MISSING);
        assert_eq!(game.platform_names(), MISSING);
        assert_eq!(game.plain_description(), None);
    }

    #[test]
    fn description_prefers_raw_variant() {
        let game: Game = serde_json::from_value(json!({
            "id": 1,
            "description": "<p>Rich</p>",
            "description_raw": "Plain"
        }))
        .unwrap();
        assert_eq!(game.plain_description().as_deref(), Some("Plain"));

        let game: Game =
            serde_json::from_value(json!({"id": 1, "description": "<p>Rich</p>"})).unwrap();
        assert_eq!(game.plain_description().as_deref(), Some("Rich"));
    }

    #[test]
    fn page_has_next_requires_token_and_results() {
        let page: Page<Game> = serde_json::from_value(json!({
            "count": 41,
            "next": "https://api.rawg.io/api/games?page=2",
            "results": [{"id": 1, "name": "A"}]
        }))
        .unwrap();
        assert!(page.has_next());

        let empty: Page<Game> = serde_json::from_value(json!({
            "count": 41,
            "next": "https://api.rawg.io/api/games?page=3",
            "results": []
        }))
        .unwrap();
        assert!(!empty.has_next());

        let last: Page<Game> =
            serde_json::from_value(json!({"count": 1, "next": null, "results": [{"id": 1}]}))
                .unwrap();
        assert!(!last.has_next());
    }

    #[test]
    fn null_counts_default_to_zero() {
        let publisher: Publisher =
            serde_json::from_value(json!({"id": 1, "name": "X", "games_count": null})).unwrap();
        assert_eq!(publisher.games_count, 0);

        let genre: Genre = serde_json::from_value(json!({"id": 4, "games_count": null})).unwrap();
        assert_eq!(genre.games_count, 0);

        let page: Page<Game> =
            serde_json::from_value(json!({"count": null, "results": []})).unwrap();
        assert_eq!(page.count, 0);
        assert!(page.results.is_empty());

        let shot: Screenshot =
            serde_json::from_value(json!({"id": 1827221, "image": null})).unwrap();
        assert_eq!((shot.id, shot.image.as_str()), (1827221, ""));
    }

    #[test]
    fn parses_numeric_ids_only() {
        assert_eq!(parse_game_id(" 42 "), Some(42));
        assert_eq!(parse_game_id("zelda"), None);
        assert_eq!(parse_game_id("-3"), None);
    }
}
