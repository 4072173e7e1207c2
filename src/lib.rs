//! Teams Inventory Core Library
//!
//! This library walks the Microsoft Graph hierarchy of joined teams, their
//! channels and channel contents, and flattens what it finds (OneNote
//! notebooks with their sections, Planner task-list tabs, or the buckets,
//! tasks and checklist items of Planner plans) into records ready to be
//! written as a single JSON document.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`identifier`] - Plan id and notebook id recovery from tab metadata
//! - [`graph`] - Authenticated Graph client behind the [`GraphSource`] seam
//! - [`pacing`] - Pause policy between teams
//! - [`walker`] - Team / channel traversal producing records
//! - [`record`] - Output record types
//! - [`output`] - Document writing and teams file loading

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod graph;
pub mod identifier;
pub mod output;
pub mod pacing;
pub mod record;
pub mod walker;

mod user_agent;

// Re-export commonly used types
pub use graph::{GraphClient, GraphError, GraphSource};
pub use output::{OutputError, TeamsFileError, load_teams_file, write_document};
pub use pacing::Pacer;
pub use record::{
    NotebookRecord, NotebookSource, OutputRecord, PlanTaskRecord, PlannerRecord, PlannerReference,
};
pub use walker::{ExtractionMode, WalkError, WalkOptions, WalkReport, WalkSummary, Walker};
