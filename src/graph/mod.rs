//! Microsoft Graph access.
//!
//! The walker talks to Graph only through the [`GraphSource`] trait so tests
//! can substitute canned responses. [`GraphClient`] is the HTTP
//! implementation used by the binary.
//!
//! # Required permissions
//!
//! The bearer credential needs `Team.ReadBasic.All`, `Channel.ReadBasic.All`,
//! `TeamsTab.Read.All`, `Notes.Read.All`, `Sites.Read.All`,
//! `Group.Read.All` and, for task export, `Tasks.Read`. Missing permissions
//! surface as HTTP 403 on the affected resources.

mod client;
mod error;
pub mod model;

use async_trait::async_trait;

pub use client::{CONNECT_TIMEOUT_SECS, DEFAULT_BASE_URL, GraphClient, READ_TIMEOUT_SECS};
pub use error::GraphError;
pub use model::{
    Channel, ChecklistItem, Notebook, PlannerBucket, PlannerTask, PlannerTaskDetails, Section,
    Site, SiteNotebooks, Tab, Team,
};

/// Read-only view of the Graph resources the walker visits.
///
/// Every operation returns the first page of items or a [`GraphError`];
/// implementations do not retry.
#[async_trait]
pub trait GraphSource: Send + Sync {
    /// Teams the caller has joined.
    async fn list_teams(&self) -> Result<Vec<Team>, GraphError>;

    /// Channels of a team.
    async fn list_channels(&self, team_id: &str) -> Result<Vec<Channel>, GraphError>;

    /// Tabs pinned to a channel, with the Teams app expanded.
    async fn list_tabs(&self, team_id: &str, channel_id: &str) -> Result<Vec<Tab>, GraphError>;

    /// Notebooks of the team's group.
    async fn list_notebooks(
        &self,
        team_id: &str,
        channel_id: &str,
    ) -> Result<Vec<Notebook>, GraphError>;

    /// Notebooks of the team's SharePoint root site, with that site.
    async fn list_fallback_notebooks(&self, team_id: &str) -> Result<SiteNotebooks, GraphError>;

    /// A single notebook by id.
    ///
    /// `site_id` is the team site when it is known; it adds the site
    /// endpoint to the lookup.
    async fn get_notebook(
        &self,
        team_id: &str,
        site_id: Option<&str>,
        notebook_id: &str,
    ) -> Result<Notebook, GraphError>;

    /// Sections of a notebook.
    ///
    /// `site_id` is the team site when it is known; it adds the site
    /// endpoint to the lookup.
    async fn list_sections(
        &self,
        team_id: &str,
        site_id: Option<&str>,
        notebook_id: &str,
    ) -> Result<Vec<Section>, GraphError>;

    /// Buckets of a Planner plan.
    async fn list_plan_buckets(&self, plan_id: &str) -> Result<Vec<PlannerBucket>, GraphError>;

    /// Tasks of a Planner plan.
    async fn list_plan_tasks(&self, plan_id: &str) -> Result<Vec<PlannerTask>, GraphError>;

    /// Details (checklist) of a Planner task.
    async fn get_task_details(&self, task_id: &str) -> Result<PlannerTaskDetails, GraphError>;
}
