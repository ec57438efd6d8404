//! Workspace cleaning.
//!
//! Derived artifacts are deleted per scope so re-runs start clean without
//! ever touching raw inputs by accident.

mod cleaner;

pub use cleaner::{CleanReport, CleanScope, Cleaner, ParseScopeError};
