//! Authenticated Graph client.
//!
//! [`GraphClient`] issues one GET per operation with the bearer credential
//! and returns the parsed `value` items. Any non-200 response is mapped to a
//! [`GraphError`] variant; nothing is retried. Notebook lookups walk a fixed
//! list of alternative endpoints (group, site, personal) before giving up.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, ClientBuilder, Proxy, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use super::GraphSource;
use super::error::GraphError;
use super::model::{
    Channel, GraphCollection, Notebook, PlannerBucket, PlannerTask, PlannerTaskDetails, Section,
    Site, SiteNotebooks, Tab, Team,
};
use crate::pacing::parse_retry_after;
use crate::user_agent;

/// Graph v1.0 endpoint.
pub const DEFAULT_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Default HTTP connect timeout (10 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default HTTP read timeout (30 seconds).
pub const READ_TIMEOUT_SECS: u64 = 30;

const JSON_MEDIA_TYPE: &str = "application/json";

/// Graph API client carrying the bearer credential.
///
/// Created once per run and reused for every request, taking advantage of
/// connection pooling.
///
/// # Example
///
/// ```no_run
/// use teams_inventory_core::graph::{GraphClient, GraphSource, DEFAULT_BASE_URL};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = GraphClient::new("eyJ0eXAi...", DEFAULT_BASE_URL)?;
/// for team in client.list_teams().await? {
///     println!("{} {}", team.id, team.name());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct GraphClient {
    client: Client,
    base_url: String,
    token: String,
}

impl fmt::Debug for GraphClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphClient")
            .field("base_url", &self.base_url)
            .field("token", &"[redacted]")
            .finish_non_exhaustive()
    }
}

impl GraphClient {
    /// Creates a client with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidUrl`] for an unparseable base URL and
    /// [`GraphError::ClientBuild`] when the HTTP client cannot be built.
    pub fn new(token: impl Into<String>, base_url: &str) -> Result<Self, GraphError> {
        Self::with_timeouts(token, base_url, CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a client with explicit timeout values.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    #[instrument(level = "debug", skip(token))]
    pub fn with_timeouts(
        token: impl Into<String>,
        base_url: &str,
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, GraphError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|_| GraphError::invalid_url(base_url.clone()))?;

        let client = build_client(connect_timeout_secs, read_timeout_secs)?;
        Ok(Self {
            client,
            base_url,
            token: token.into(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Issues one authenticated GET and decodes the 200 body.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GraphError> {
        let url = self.endpoint(path);
        Url::parse(&url).map_err(|_| GraphError::invalid_url(url.clone()))?;
        debug!(url = %url, "GET");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, JSON_MEDIA_TYPE)
            .header(ACCEPT, JSON_MEDIA_TYPE)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GraphError::timeout(&url)
                } else {
                    GraphError::network(&url, e)
                }
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(match status {
                StatusCode::UNAUTHORIZED => GraphError::unauthorized(&url),
                StatusCode::TOO_MANY_REQUESTS => {
                    let retry_after = response
                        .headers()
                        .get(RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(parse_retry_after);
                    GraphError::throttled(&url, retry_after)
                }
                other => GraphError::http_status(&url, other.as_u16()),
            });
        }

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                GraphError::timeout(&url)
            } else {
                GraphError::network(&url, e)
            }
        })?;
        serde_json::from_slice(&body).map_err(|e| GraphError::decode(&url, e))
    }

    async fn get_collection<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, GraphError> {
        let collection: GraphCollection<T> = self.get_json(path).await?;
        Ok(collection.value)
    }

    /// Tries each path in order and returns the first 200 body.
    ///
    /// A rejected credential ends the lookup at once. When every path fails,
    /// the first failure is returned.
    async fn first_answer<T: DeserializeOwned>(&self, paths: &[String]) -> Result<T, GraphError> {
        let mut first_error = None;
        for path in paths {
            match self.get_json(path).await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_auth() => return Err(error),
                Err(error) => {
                    debug!(error = %error, "endpoint failed, trying next");
                    first_error.get_or_insert(error);
                }
            }
        }
        Err(first_error.unwrap_or_else(|| GraphError::invalid_url(self.base_url.clone())))
    }
}

#[async_trait]
impl GraphSource for GraphClient {
    #[instrument(skip(self))]
    async fn list_teams(&self) -> Result<Vec<Team>, GraphError> {
        let teams: Vec<Team> = self.get_collection("/me/joinedTeams").await?;
        debug!(count = teams.len(), "listed teams");
        Ok(teams)
    }

    #[instrument(skip(self))]
    async fn list_channels(&self, team_id: &str) -> Result<Vec<Channel>, GraphError> {
        self.get_collection(&format!("/teams/{team_id}/channels"))
            .await
    }

    #[instrument(skip(self))]
    async fn list_tabs(&self, team_id: &str, channel_id: &str) -> Result<Vec<Tab>, GraphError> {
        self.get_collection(&format!(
            "/teams/{team_id}/channels/{channel_id}/tabs?$expand=teamsApp"
        ))
        .await
    }

    #[instrument(skip(self))]
    async fn list_notebooks(
        &self,
        team_id: &str,
        channel_id: &str,
    ) -> Result<Vec<Notebook>, GraphError> {
        // Channel notebooks live in the team's group; the channel only scopes logging.
        debug!(channel_id, "listing group notebooks");
        self.get_collection(&format!("/groups/{team_id}/onenote/notebooks"))
            .await
    }

    #[instrument(skip(self))]
    async fn list_fallback_notebooks(&self, team_id: &str) -> Result<SiteNotebooks, GraphError> {
        let site: Site = self
            .get_json(&format!("/groups/{team_id}/sites/root"))
            .await?;
        debug!(
            site_id = %site.id,
            site_name = site.display_name.as_deref().unwrap_or_default(),
            site_url = ?site.web_url,
            "found team site"
        );
        let notebooks = self
            .get_collection(&format!("/sites/{}/onenote/notebooks", site.id))
            .await?;
        Ok(SiteNotebooks { site, notebooks })
    }

    #[instrument(skip(self))]
    async fn get_notebook(
        &self,
        team_id: &str,
        site_id: Option<&str>,
        notebook_id: &str,
    ) -> Result<Notebook, GraphError> {
        let suffix = format!("/onenote/notebooks/{notebook_id}");
        let mut paths = vec![format!("/groups/{team_id}{suffix}")];
        if let Some(site_id) = site_id {
            paths.push(format!("/sites/{site_id}{suffix}"));
        }
        paths.push(format!("/me{suffix}"));
        self.first_answer(&paths).await
    }

    #[instrument(skip(self))]
    async fn list_sections(
        &self,
        team_id: &str,
        site_id: Option<&str>,
        notebook_id: &str,
    ) -> Result<Vec<Section>, GraphError> {
        let suffix = format!("/onenote/notebooks/{notebook_id}/sections");
        let mut paths = vec![format!("/groups/{team_id}{suffix}")];
        if let Some(site_id) = site_id {
            paths.push(format!("/sites/{site_id}{suffix}"));
        }
        paths.push(format!("/me{suffix}"));
        let filter = format!("parentNotebook/id eq '{}'", notebook_id.replace('\'', "''"));
        paths.push(format!(
            "/me/onenote/sections?$filter={}",
            urlencoding::encode(&filter)
        ));

        let sections: GraphCollection<Section> = self.first_answer(&paths).await?;
        Ok(sections.value)
    }

    #[instrument(skip(self))]
    async fn list_plan_buckets(&self, plan_id: &str) -> Result<Vec<PlannerBucket>, GraphError> {
        self.get_collection(&format!("/planner/plans/{plan_id}/buckets"))
            .await
    }

    #[instrument(skip(self))]
    async fn list_plan_tasks(&self, plan_id: &str) -> Result<Vec<PlannerTask>, GraphError> {
        self.get_collection(&format!("/planner/plans/{plan_id}/tasks"))
            .await
    }

    #[instrument(skip(self))]
    async fn get_task_details(&self, task_id: &str) -> Result<PlannerTaskDetails, GraphError> {
        self.get_json(&format!("/planner/tasks/{task_id}/details"))
            .await
    }
}

enum BuildClientFailure {
    Panic,
    Build(reqwest::Error),
}

fn build_client(connect_timeout_secs: u64, read_timeout_secs: u64) -> Result<Client, GraphError> {
    match try_build_client(connect_timeout_secs, read_timeout_secs, false) {
        Ok(client) => Ok(client),
        Err(BuildClientFailure::Panic) => {
            // Some restricted sandbox environments panic when querying system
            // proxy settings; retry with env-proxy support only.
            warn!(
                "HTTP client builder panicked while loading system proxy settings; retrying with env-proxy fallback"
            );
            match try_build_client(connect_timeout_secs, read_timeout_secs, true) {
                Ok(client) => Ok(client),
                Err(BuildClientFailure::Panic) => Err(GraphError::client_build(
                    "HTTP client construction panicked while applying env-proxy fallback",
                )),
                Err(BuildClientFailure::Build(error)) => {
                    Err(GraphError::client_build(error.to_string()))
                }
            }
        }
        Err(BuildClientFailure::Build(error)) => Err(GraphError::client_build(error.to_string())),
    }
}

fn try_build_client(
    connect_timeout_secs: u64,
    read_timeout_secs: u64,
    disable_system_proxy_lookup: bool,
) -> Result<Client, BuildClientFailure> {
    catch_unwind(AssertUnwindSafe(move || {
        let mut builder = base_builder(connect_timeout_secs, read_timeout_secs);
        if disable_system_proxy_lookup {
            builder = apply_env_proxy_fallback(builder.no_proxy());
        }
        builder.build().map_err(BuildClientFailure::Build)
    }))
    .map_err(|_| BuildClientFailure::Panic)?
}

fn base_builder(connect_timeout_secs: u64, read_timeout_secs: u64) -> ClientBuilder {
    Client::builder()
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .timeout(Duration::from_secs(read_timeout_secs))
        .user_agent(user_agent::default_user_agent())
        .gzip(true)
}

fn apply_env_proxy_fallback(mut builder: ClientBuilder) -> ClientBuilder {
    if let Some(proxy) = env_proxy_for_scheme("https")
        && let Ok(resolved) = Proxy::https(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    if let Some(proxy) = env_proxy_for_scheme("http")
        && let Ok(resolved) = Proxy::http(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    builder
}

fn env_proxy_for_scheme(scheme: &str) -> Option<String> {
    let names: &[&str] = match scheme {
        "https" => &["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"],
        "http" => &["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"],
        _ => return None,
    };
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}
