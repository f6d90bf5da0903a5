//! # Stargazer Geo Core
//!
//! Pure analytics for a repository's stargazer history: turning free-text
//! profile locations into countries, tallying them, and bucketing star
//! events over time.
//!
//! This crate performs no network or filesystem I/O. Callers deserialize the
//! reference datasets and the cached star records, then hand them over.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`reference`] | Country metadata and the longest-first alias list |
//! | [`normalize`] | Location string cleanup |
//! | [`matcher`] | Country disambiguation (voting + tie-breaks) |
//! | [`aggregate`] | Per-country counts and percentages |
//! | [`temporal`] | Monthly, daily and weekday star trends |
//! | [`models`] | Shared data types |
//! | [`error`] | Error types |

pub mod aggregate;
pub mod error;
pub mod matcher;
pub mod models;
pub mod normalize;
pub mod reference;
pub mod temporal;

pub use error::{GeoError, Result};
pub use models::{CountryStats, MatchReason, MatchResult, StarEvent};
pub use reference::ReferenceData;
