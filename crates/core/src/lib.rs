#![warn(clippy::all, missing_docs)]

//! Core domain logic for GameScope.
//!
//! This crate hosts the data models, configuration handling, the client for
//! the upstream game metadata API, pagination helpers and the locally
//! persisted favorites store used by the terminal UI.

pub mod api;
pub mod config;
pub mod error;
pub mod favorites;
pub mod models;
pub mod paging;

pub use api::CatalogClient;
pub use config::AppConfig;
pub use error::{CatalogError, StorageError};
pub use favorites::{FavoritesStore, FileStore, FilterOptions, KeyValueStore, MemoryStore};
pub use models::{EntityRef, Game, GameId, Genre, Page, Publisher, Screenshot};
pub use paging::{Listing, PageRequest, RequestGeneration, Ticket};
