//! Flattened output records.
//!
//! Each record is self-contained: it repeats the team and channel (or plan
//! and bucket) it belongs to so the output can be loaded straight into a
//! table. Records serialize with a `kind` tag and snake_case field names.

use serde::{Deserialize, Serialize};

use crate::graph::{
    Channel, Notebook, PlannerBucket, PlannerTask, PlannerTaskDetails, Section, Team,
};

/// Checklist column of a task that has no checklist items.
pub const NO_CHECKLIST: &str = "(no checklist)";

/// One line of the output document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputRecord {
    Notebook(NotebookRecord),
    Planner(PlannerRecord),
    PlanTask(PlanTaskRecord),
}

/// Where a notebook was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotebookSource {
    /// The team group's notebook listing.
    GroupApi,
    /// The team's SharePoint root site listing.
    SiteApi,
    /// A OneNote tab's configuration.
    TabConfiguration,
}

/// One (team, channel, notebook, section) combination.
///
/// A notebook without sections is represented by a single record whose
/// section fields are `None`. Notebooks of a team without channels carry no
/// channel fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotebookRecord {
    pub team_id: String,
    pub team_name: String,
    pub channel_id: Option<String>,
    pub channel_name: Option<String>,
    pub notebook_id: String,
    pub notebook_name: String,
    pub source: NotebookSource,
    /// Name of the tab the notebook was found through.
    pub tab_name: Option<String>,
    pub section_id: Option<String>,
    pub section_name: Option<String>,
    pub section_url: Option<String>,
}

impl NotebookRecord {
    /// Expands a notebook into one record per section.
    #[must_use]
    pub fn expand(
        team: &Team,
        channel: Option<&Channel>,
        notebook: &Notebook,
        source: NotebookSource,
        tab_name: Option<&str>,
        sections: &[Section],
    ) -> Vec<Self> {
        let base = Self {
            team_id: team.id.clone(),
            team_name: team.name().to_string(),
            channel_id: channel.map(|c| c.id.clone()),
            channel_name: channel.map(|c| c.name().to_string()),
            notebook_id: notebook.id.clone(),
            notebook_name: notebook.name().to_string(),
            source,
            tab_name: tab_name.map(str::to_string),
            section_id: None,
            section_name: None,
            section_url: None,
        };

        if sections.is_empty() {
            return vec![base];
        }

        sections
            .iter()
            .map(|section| Self {
                section_id: Some(section.id.clone()),
                section_name: Some(section.name().to_string()),
                section_url: section.web_url().map(str::to_string),
                ..base.clone()
            })
            .collect()
    }
}

/// A task-list tab found in a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerReference {
    pub tab_name: String,
    pub plan_id: Option<String>,
    pub source_url: Option<String>,
}

/// All task-list tabs of one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerRecord {
    pub team_id: String,
    pub team_name: String,
    pub channel_id: String,
    pub channel_name: String,
    pub planner_tabs: Vec<PlannerReference>,
}

impl PlannerRecord {
    /// Builds the record for a channel, or `None` when it has no task-list tabs.
    #[must_use]
    pub fn for_channel(
        team: &Team,
        channel: &Channel,
        planner_tabs: Vec<PlannerReference>,
    ) -> Option<Self> {
        if planner_tabs.is_empty() {
            return None;
        }
        Some(Self {
            team_id: team.id.clone(),
            team_name: team.name().to_string(),
            channel_id: channel.id.clone(),
            channel_name: channel.name().to_string(),
            planner_tabs,
        })
    }
}

/// One (bucket, task, checklist item) row of a Planner plan.
///
/// A task without checklist items is one row whose `checklist_item` is
/// [`NO_CHECKLIST`] and whose `completed` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanTaskRecord {
    pub plan_id: String,
    pub bucket_id: String,
    pub bucket_name: String,
    pub task_id: String,
    pub task_title: String,
    pub checklist_item: String,
    pub completed: Option<bool>,
}

impl PlanTaskRecord {
    /// Expands a task into one row per checklist item.
    #[must_use]
    pub fn expand(
        plan_id: &str,
        bucket: &PlannerBucket,
        task: &PlannerTask,
        details: &PlannerTaskDetails,
    ) -> Vec<Self> {
        let base = Self {
            plan_id: plan_id.to_string(),
            bucket_id: bucket.id.clone(),
            bucket_name: bucket.name().to_string(),
            task_id: task.id.clone(),
            task_title: task.title().to_string(),
            checklist_item: NO_CHECKLIST.to_string(),
            completed: None,
        };

        let items = details.ordered_checklist();
        if items.is_empty() {
            return vec![base];
        }

        items
            .into_iter()
            .map(|item| Self {
                checklist_item: item.title().to_string(),
                completed: Some(item.is_checked),
                ..base.clone()
            })
            .collect()
    }
}
