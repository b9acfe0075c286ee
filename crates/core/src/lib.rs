//! Core types and pure logic for KeenDreams
//!
//! This crate contains the dream schema and every heuristic that does not
//! touch storage: validation, quality scoring, source categorization,
//! keyword search scoring, Markdown rendering and location analysis.

mod category;
mod constants;
mod dream;
mod env_config;
mod error;
mod location;
mod markdown;
mod quality;
mod search;
mod validation;

pub use category::*;
pub use constants::*;
pub use dream::*;
pub use env_config::*;
pub use error::*;
pub use location::*;
pub use markdown::*;
pub use quality::*;
pub use search::*;
pub use validation::*;
