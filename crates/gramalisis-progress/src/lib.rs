//! Usage-gated progression.
//!
//! A user's position is a pure function of how many entries they have saved,
//! measured against an ordered [`Catalog`] of stages. Nothing in this crate
//! performs I/O apart from [`Catalog::load`].

pub mod catalog;
pub mod engine;
pub mod memory;
pub mod path;

pub use catalog::{Catalog, CatalogError, CatalogKind, Stage};
pub use engine::{Progress, ProgressReport, StageStatus};
