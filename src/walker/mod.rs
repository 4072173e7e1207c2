//! Hierarchical walk over teams, channels and their contents.
//!
//! The [`Walker`] visits teams one at a time, pausing between them, and
//! returns the flattened records in traversal order. Requests are awaited in
//! sequence on the calling task.
//!
//! Failures are absorbed per resource: a team whose channels cannot be listed
//! is skipped, a channel whose tabs cannot be listed contributes nothing. The
//! only failure that stops a run is a rejected credential, since every later
//! request would fail the same way.
//!
//! Task export works on Planner plans instead of channels. The plans are
//! either given up front or collected from the task-list tabs of a team
//! walk; each plan counts as one unit of work for pacing.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use teams_inventory_core::graph::{GraphClient, DEFAULT_BASE_URL};
//! use teams_inventory_core::pacing::Pacer;
//! use teams_inventory_core::walker::{ExtractionMode, WalkOptions, Walker};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GraphClient::new("eyJ0eXAi...", DEFAULT_BASE_URL)?;
//! let pacer = Pacer::new(Duration::from_secs(1));
//! let walker = Walker::new(&client, &pacer, WalkOptions::default());
//! let report = walker.walk(ExtractionMode::Planner, None).await?;
//! println!("{} records", report.records.len());
//! # Ok(())
//! # }
//! ```

mod matcher;
mod notebook;
mod planner;
mod tasks;

use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::graph::{GraphError, GraphSource, Team};
use crate::pacing::Pacer;
use crate::record::OutputRecord;

pub use matcher::match_notebook_to_channel;
pub use planner::planner_reference;

/// What a run extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    /// OneNote notebooks and their sections.
    Notebooks,
    /// Planner task-list tabs.
    Planner,
    /// Buckets, tasks and checklist items of Planner plans.
    Tasks,
}

impl ExtractionMode {
    /// Output file used when none is configured.
    #[must_use]
    pub fn default_output(self) -> &'static str {
        match self {
            Self::Notebooks => "teams_notebooks_data.json",
            Self::Planner => "teams_planner_tabs.json",
            Self::Tasks => "planner_tasks.json",
        }
    }
}

impl std::fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Notebooks => write!(f, "notebooks"),
            Self::Planner => write!(f, "planner"),
            Self::Tasks => write!(f, "tasks"),
        }
    }
}

/// Run-level walk settings.
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Team ids to restrict the run to; empty means every team.
    pub team_filter: Vec<String>,
    /// Keep going after a rejected credential instead of aborting.
    pub continue_on_auth_error: bool,
    /// Plans to export in task mode; empty means collect them from tabs.
    pub plan_ids: Vec<String>,
}

/// Counters describing a finished walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    pub teams_visited: usize,
    pub teams_skipped: usize,
    pub channels_visited: usize,
    pub requests_failed: usize,
    /// Notebooks whose sections could not be listed by any endpoint.
    pub sections_failed: usize,
    pub plans_visited: usize,
    pub plans_skipped: usize,
    /// Tasks whose checklist could not be read.
    pub task_details_failed: usize,
    pub pauses: u64,
}

/// Records produced by a walk plus its counters.
#[derive(Debug, Clone, Default)]
pub struct WalkReport {
    pub records: Vec<OutputRecord>,
    pub summary: WalkSummary,
}

/// Errors that stop a walk.
#[derive(Debug, Error)]
pub enum WalkError {
    /// The credential was rejected and the run is not configured to continue.
    #[error("run aborted: credential rejected during {stage}")]
    Unauthorized {
        /// The request that was rejected.
        stage: &'static str,
        #[source]
        source: GraphError,
    },
}

/// Drives one extraction run over a [`GraphSource`].
pub struct Walker<'a> {
    source: &'a dyn GraphSource,
    pacer: &'a Pacer,
    options: WalkOptions,
}

impl<'a> Walker<'a> {
    /// Creates a walker over `source`, pausing with `pacer` between teams.
    #[must_use]
    pub fn new(source: &'a dyn GraphSource, pacer: &'a Pacer, options: WalkOptions) -> Self {
        Self {
            source,
            pacer,
            options,
        }
    }

    /// Walks every team and returns the records for `mode`.
    ///
    /// `preloaded_teams` replaces the team listing request when given. In
    /// [`ExtractionMode::Tasks`] with plan ids configured, no team is
    /// visited at all.
    ///
    /// # Errors
    ///
    /// Returns [`WalkError::Unauthorized`] when a request is rejected with
    /// HTTP 401 and `continue_on_auth_error` is off.
    #[instrument(skip_all, fields(mode = %mode))]
    pub async fn walk(
        &self,
        mode: ExtractionMode,
        preloaded_teams: Option<Vec<Team>>,
    ) -> Result<WalkReport, WalkError> {
        let mut report = WalkReport::default();
        let pauses_before = self.pacer.pauses();
        let mut started = false;

        if mode == ExtractionMode::Tasks && !self.options.plan_ids.is_empty() {
            info!(plans = self.options.plan_ids.len(), "exporting configured plans");
            self.export_plans(&self.options.plan_ids, &mut started, &mut report)
                .await?;
        } else {
            let plan_ids = self
                .walk_teams(mode, preloaded_teams, &mut started, &mut report)
                .await?;
            if mode == ExtractionMode::Tasks {
                info!(plans = plan_ids.len(), "exporting plans found in tabs");
                self.export_plans(&plan_ids, &mut started, &mut report)
                    .await?;
            }
        }

        report.summary.pauses = self.pacer.pauses() - pauses_before;
        info!(
            records = report.records.len(),
            teams_visited = report.summary.teams_visited,
            teams_skipped = report.summary.teams_skipped,
            plans_visited = report.summary.plans_visited,
            "walk finished"
        );
        Ok(report)
    }

    /// Visits every team; returns the plan ids seen in task mode.
    async fn walk_teams(
        &self,
        mode: ExtractionMode,
        preloaded_teams: Option<Vec<Team>>,
        started: &mut bool,
        report: &mut WalkReport,
    ) -> Result<Vec<String>, WalkError> {
        let teams = match preloaded_teams {
            Some(teams) => teams,
            None => self
                .absorb(
                    "list_teams",
                    self.source.list_teams().await,
                    &mut report.summary,
                )?
                .unwrap_or_default(),
        };
        let teams = self.apply_team_filter(teams);
        info!(teams = teams.len(), "starting walk");

        let mut seen_notebooks: HashSet<String> = HashSet::new();
        let mut plan_ids: Vec<String> = Vec::new();

        for (index, team) in teams.iter().enumerate() {
            self.pace(started).await;
            info!(
                team_id = %team.id,
                team_name = team.name(),
                position = index + 1,
                total = teams.len(),
                "processing team"
            );

            let Some(channels) = self.absorb(
                "list_channels",
                self.source.list_channels(&team.id).await,
                &mut report.summary,
            )?
            else {
                report.summary.teams_skipped += 1;
                continue;
            };
            report.summary.teams_visited += 1;

            match mode {
                ExtractionMode::Planner => {
                    self.planner_team(team, &channels, report).await?;
                }
                ExtractionMode::Notebooks => {
                    self.notebook_team(team, &channels, &mut seen_notebooks, report)
                        .await?;
                }
                ExtractionMode::Tasks => {
                    for plan_id in self.team_plan_ids(team, &channels, report).await? {
                        if !plan_ids.contains(&plan_id) {
                            plan_ids.push(plan_id);
                        }
                    }
                }
            }
        }
        Ok(plan_ids)
    }

    /// Pauses before every unit of work except the first of the run.
    async fn pace(&self, started: &mut bool) {
        if *started {
            self.pacer.pause().await;
        }
        *started = true;
    }

    fn apply_team_filter(&self, teams: Vec<Team>) -> Vec<Team> {
        if self.options.team_filter.is_empty() {
            return teams;
        }
        let total = teams.len();
        let kept: Vec<Team> = teams
            .into_iter()
            .filter(|team| self.options.team_filter.iter().any(|id| *id == team.id))
            .collect();
        debug!(kept = kept.len(), total, "applied team filter");
        kept
    }

    /// Turns a request outcome into "found" or "nothing here".
    ///
    /// A rejected credential stops the walk unless the run continues on auth
    /// errors. Throttling feeds the server delay into the pacer.
    fn absorb<T>(
        &self,
        stage: &'static str,
        result: Result<T, GraphError>,
        summary: &mut WalkSummary,
    ) -> Result<Option<T>, WalkError> {
        let error = match result {
            Ok(value) => return Ok(Some(value)),
            Err(error) => error,
        };
        summary.requests_failed += 1;

        if error.is_auth() && !self.options.continue_on_auth_error {
            return Err(WalkError::Unauthorized {
                stage,
                source: error,
            });
        }
        if let Some(delay) = error.retry_after() {
            self.pacer.record_retry_after(delay);
        }
        warn!(stage, error = %error, "request failed, skipping");
        Ok(None)
    }
}
