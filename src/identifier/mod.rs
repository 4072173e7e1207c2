//! Identifier recovery from tab metadata.
//!
//! Channel tabs carry the identifiers we care about in inconsistent places:
//! a configuration `entityId`, a content URL, or a web URL that may itself
//! wrap another (percent-encoded) link. The functions here dig those
//! identifiers out without ever failing; a miss is an empty or absent result.
//!
//! - [`planner`] - Planner plan ids and task-list tab classification
//! - [`onenote`] - OneNote tab detection and notebook id recovery
//!
//! # Example
//!
//! ```
//! use teams_inventory_core::identifier::{classify_tab, clean_plan_id, extract_plan_id_from_url};
//!
//! assert_eq!(
//!     extract_plan_id_from_url(Some("https://tasks.office.com/abc?planId=PLAN456")),
//!     "PLAN456"
//! );
//! assert_eq!(clean_plan_id(Some("tt.AbC-123_xyz")).as_deref(), Some("tt.AbC-123_xyz"));
//! assert!(classify_tab("Tasks", None, None));
//! ```

pub mod onenote;
pub mod planner;

pub use onenote::{
    ONENOTE_APP_ID, is_onenote_tab, notebook_id_from_tab, notebook_id_from_url,
    notebook_name_from_tab,
};
pub use planner::{
    PLAN_ID_PREFIX, classify_tab, clean_plan_id, extract_plan_id_from_url, resolve_plan_id,
};

use regex::Regex;

/// Compiles a regex at static init; panics on invalid pattern.
pub(crate) fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// Returns the trimmed value when present and non-empty.
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
