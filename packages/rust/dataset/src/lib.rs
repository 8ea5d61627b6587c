//! Dataset loading and the selection filter.
//!
//! This crate provides:
//! - [`workbook`] — reads a spreadsheet into [`SheetGrid`]s
//! - [`tables`] — the lifecycle, differentiator, tone, and tactic tables
//! - [`adapters`] — the grid and normalized tactic sheet layouts
//! - [`Catalog`] — option lists per questionnaire step and tactic lookup

pub mod adapters;
pub mod catalog;
pub mod tables;
pub mod workbook;

pub use adapters::{GridTacticAdapter, NormalizedTacticAdapter, TacticAdapter, adapter_for};
pub use catalog::{Catalog, load_cached};
pub use tables::{DifferentiatorTable, LifecycleTable, TacticTable, ToneTable};
pub use workbook::{SheetGrid, Workbook};
