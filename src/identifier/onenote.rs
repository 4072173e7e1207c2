//! OneNote tab detection and notebook id recovery.

use std::sync::LazyLock;

use regex::Regex;

use super::{compile_static_regex, non_empty};

/// Teams app id of the OneNote tab app.
pub const ONENOTE_APP_ID: &str = "0d820ecd-def2-4297-adad-78056cde7c78";

/// Suffix Teams appends to OneNote tab names.
const ONENOTE_TAB_SUFFIX: &str = " (OneNote)";

static NOTEBOOK_SEGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?i)notebooks/([^/?&#]+)"));

/// Returns true when any of the tab's properties point at OneNote.
#[must_use]
pub fn is_onenote_tab(
    display_name: &str,
    teams_app_id: Option<&str>,
    content_url: Option<&str>,
    web_url: Option<&str>,
) -> bool {
    if display_name.contains("OneNote") {
        return true;
    }
    if teams_app_id == Some(ONENOTE_APP_ID) {
        return true;
    }
    [content_url, web_url]
        .into_iter()
        .flatten()
        .any(|url| url.to_lowercase().contains("onenote"))
}

/// Returns the path segment following `notebooks/` in a URL or entity path.
#[must_use]
pub fn notebook_id_from_url(url: Option<&str>) -> Option<String> {
    let url = non_empty(url)?;
    NOTEBOOK_SEGMENT_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Recovers the notebook id a OneNote tab points at.
///
/// The configuration entity id is used when it refers to a notebook, reduced
/// to its `notebooks/<id>` segment when it is a composite path. Otherwise the
/// content URL and then the web URL are searched for a `notebooks/<id>`
/// segment.
#[must_use]
pub fn notebook_id_from_tab(
    entity_id: Option<&str>,
    content_url: Option<&str>,
    web_url: Option<&str>,
) -> Option<String> {
    if let Some(entity_id) = non_empty(entity_id)
        && entity_id.to_lowercase().contains("notebook")
    {
        return notebook_id_from_url(Some(entity_id)).or_else(|| Some(entity_id.to_string()));
    }

    notebook_id_from_url(content_url).or_else(|| notebook_id_from_url(web_url))
}

/// Derives a notebook name from a OneNote tab name.
#[must_use]
pub fn notebook_name_from_tab(tab_name: &str) -> String {
    tab_name.replace(ONENOTE_TAB_SUFFIX, "").trim().to_string()
}
