//! Command-line front end for structural XML comparison.
//!
//! - [`config`]: TOML comparison settings and the strategies built from them
//! - [`inspect`]: tree dump with node positions
//! - [`report`]: colored terminal rendering of differences

pub mod config;
pub mod inspect;
pub mod report;
