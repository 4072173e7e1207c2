//! Planner plan id extraction and task-list tab classification.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;
use url::Url;

use super::{compile_static_regex, non_empty};

/// Scheme prefix carried by task-list identifiers.
pub const PLAN_ID_PREFIX: &str = "tt.";

/// Query key under which Teams wraps the real tab link.
const WEB_URL_KEY: &str = "webUrl";

static PLAN_VIEWS_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"/PlanViews/([^?&]+)"));

static PLAN_ID_PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"planId=([^&]+)"));

static PREFIXED_PLAN_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"tt\.[A-Za-z0-9_-]+"));

/// Recovers a plan id from a (possibly wrapped and percent-encoded) tab URL.
///
/// The URL is decoded once. When its query carries a `webUrl` parameter, that
/// inner link is searched instead of the outer one. A `/PlanViews/<id>` path
/// segment wins over a `planId=<id>` parameter.
///
/// Returns an empty string when nothing is found; never panics.
///
/// # Examples
///
/// ```
/// use teams_inventory_core::identifier::extract_plan_id_from_url;
///
/// let wrapped = "https://x/?webUrl=https%3A%2F%2Ftasks.office.com%2Fabc%2FHome%2FPlanViews%2FPLAN123%3Fx%3D1";
/// assert_eq!(extract_plan_id_from_url(Some(wrapped)), "PLAN123");
/// assert_eq!(extract_plan_id_from_url(None), "");
/// ```
#[must_use]
pub fn extract_plan_id_from_url(url: Option<&str>) -> String {
    let Some(url) = non_empty(url) else {
        return String::new();
    };

    let decoded = urlencoding::decode(url).unwrap_or(Cow::Borrowed(url));
    let inner = Url::parse(&decoded).ok().and_then(|parsed| {
        parsed
            .query_pairs()
            .find(|(key, _)| key == WEB_URL_KEY)
            .map(|(_, value)| value.into_owned())
    });
    let real_link = inner.as_deref().unwrap_or(&decoded);
    trace!(link = %real_link, "searching tab link for plan id");

    PLAN_VIEWS_RE
        .captures(real_link)
        .or_else(|| PLAN_ID_PARAM_RE.captures(real_link))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Keeps only identifiers already in the `tt.` task-list scheme.
///
/// Returns the first `tt.<token>` found (token made of letters, digits, `-`
/// and `_`), or `None` for anything else.
#[must_use]
pub fn clean_plan_id(raw_id: Option<&str>) -> Option<String> {
    let raw_id = non_empty(raw_id)?;
    PREFIXED_PLAN_ID_RE
        .find(raw_id)
        .map(|m| m.as_str().to_string())
}

/// Decides whether a tab is a task-list tab.
///
/// A `tt.` plan id settles it outright; otherwise the tab name (`planner`,
/// `tasks`, case-insensitive) and then the URL (`tasks.office.com`) are
/// checked.
#[must_use]
pub fn classify_tab(tab_name: &str, plan_id: Option<&str>, tab_url: Option<&str>) -> bool {
    if plan_id.is_some_and(|id| id.starts_with(PLAN_ID_PREFIX)) {
        return true;
    }

    let name = tab_name.to_lowercase();
    if name.contains("planner") || name.contains("tasks") {
        return true;
    }

    tab_url.is_some_and(|url| url.contains("tasks.office.com"))
}

/// Picks the plan id for a tab from all available sources.
///
/// URL extraction is tried over `urls` in order and the first hit wins. The
/// configuration entity id is only consulted, through [`clean_plan_id`], when
/// no URL yields anything.
#[must_use]
pub fn resolve_plan_id(entity_id: Option<&str>, urls: &[Option<&str>]) -> Option<String> {
    urls.iter()
        .map(|url| extract_plan_id_from_url(*url))
        .find(|id| !id.is_empty())
        .or_else(|| clean_plan_id(entity_id))
}
