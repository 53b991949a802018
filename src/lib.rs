#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]
//! Unicode character catalog, search and favorites for a character keyboard.
//!
//! The `Catalog` type is a read-only index over a reference dataset: groups
//! (usually Unicode blocks), characters with their canonical names, and name
//! aliases. It is built once from a `Dataset` and then shared between threads
//! as `Arc<Catalog>`. A `CatalogHandle` owns the one-time load, which may run
//! in the background; until it finishes the catalog reads as "not loaded",
//! and a failed load reads as "loaded and empty".
//!
//! The `Codepoint` type is a validated codepoint in `0..=0x10FFFF`. Surrogate
//! codepoints are valid keys but have no text, so conversions to text and to
//! UTF-16 report them as errors instead of producing replacement characters.
//!
//! The `FavoritesStore` type is a durable, ordered set of codepoints. Adding
//! is an atomic insert-if-absent: concurrent adds of the same codepoint
//! succeed exactly once, and the others see `Error::AlreadyFavorite`.
//!
//! The `SearchSession` type runs name and alias searches where only the most
//! recently issued query may publish results.
//!
//! # Name resolution
//!
//! A character's display name is its canonical name if that is non-empty,
//! otherwise its first alias, otherwise `UNNAMED_PLACEHOLDER`.
//! Control characters carry no canonical name, so they are shown by alias.
//!
//! # Search
//!
//! Queries and names are NFKC-normalized and lowercased before a substring
//! match. A character matches if its canonical name or any alias contains the
//! query. Results are unique, ordered by codepoint and capped by a limit
//! (`DEFAULT_SEARCH_LIMIT` unless configured). The empty query matches nothing.

pub(crate) mod utf16;

pub(crate) mod codepoint_ty;

pub(crate) mod error;

pub(crate) mod model;

pub(crate) mod dataset;

pub mod ucd;

pub(crate) mod catalog;

pub(crate) mod catalog_handle;

pub(crate) mod search;

pub(crate) mod favorites;

pub(crate) mod input;

pub(crate) mod config;

pub use utf16::{
    decode_utf16_units, hex_to_scalar, scalar_to_text, scalar_to_utf16, surrogate_pair, CodeUnits,
};

pub use codepoint_ty::Codepoint;

pub use error::{Error, Result};

pub use model::{Favorite, NamedCharacter, UnicodeCharacter, UnicodeCharacterAlias, UnicodeGroup};

pub use dataset::{Dataset, DatasetSource};

pub use catalog::{Catalog, DEFAULT_SEARCH_LIMIT, UNNAMED_PLACEHOLDER};

pub use catalog_handle::{CatalogHandle, CatalogState};

pub use search::{SearchSession, SearchSnapshot, SearchTicket};

pub use favorites::FavoritesStore;

pub use input::{rows, InputCore, Intent, Reaction, KEYS_PER_ROW};

pub use config::Config;
