//! User-Agent string sent with every Graph request.

/// Default User-Agent for Graph requests (identifies the tool and version).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("teams-inventory/{version} (graph-reporting-tool)")
}
