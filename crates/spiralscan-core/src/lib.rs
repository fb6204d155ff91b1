//! Spiralscan Core - Foundation crate for the spiral scanner.
//!
//! This crate provides shared types, error handling and configuration
//! management that the scanner and the command-line shell depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared newtypes (`Coordinate`, `CellId`, `SpeciesId`, `Timestamp`)
//! - [`watch`] - The species watch list and the species-name lookup
//!
//! # Example
//!
//! ```rust
//! use spiralscan_core::{AppConfig, SpeciesId, WatchList};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! config.validate()?;
//!
//! let watch_list = WatchList::from(config.watch.species.clone());
//! assert!(watch_list.contains(SpeciesId(143)));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;
pub mod watch;

// Re-export commonly used types
pub use config::{
    AccountConfig, AppConfig, AuthService, OriginConfig, ScanningConfig, SpeciesEntry, WatchConfig,
};
pub use error::{ConfigError, ConfigResult, Result, SpiralscanError};
pub use types::{CellId, Coordinate, SpeciesId, Timestamp};
pub use watch::{SpeciesNames, WatchList};
