//! Planner mode: one record per channel with task-list tabs.
//!
//! The same tab scan feeds task export when no plan ids are configured.

use tracing::{debug, instrument};

use super::{WalkError, WalkReport, Walker};
use crate::graph::{Channel, Tab, Team};
use crate::identifier::{classify_tab, resolve_plan_id};
use crate::record::{OutputRecord, PlannerRecord, PlannerReference};

/// Builds the planner reference for a tab, or `None` when it is not a
/// task-list tab.
#[must_use]
pub fn planner_reference(tab: &Tab) -> Option<PlannerReference> {
    let web_url = tab.web_url.as_deref();
    let plan_id = resolve_plan_id(
        tab.entity_id(),
        &[web_url, tab.content_url(), tab.website_url()],
    );

    let is_task_list = [web_url, tab.content_url()]
        .into_iter()
        .any(|url| classify_tab(tab.name(), plan_id.as_deref(), url));
    if !is_task_list {
        return None;
    }

    Some(PlannerReference {
        tab_name: tab.name().to_string(),
        plan_id,
        source_url: web_url.or(tab.content_url()).map(str::to_string),
    })
}

impl Walker<'_> {
    #[instrument(skip_all, fields(team_id = %team.id))]
    pub(super) async fn planner_team(
        &self,
        team: &Team,
        channels: &[Channel],
        report: &mut WalkReport,
    ) -> Result<(), WalkError> {
        for channel in channels {
            let planner_tabs = self.channel_planner_tabs(team, channel, report).await?;
            if let Some(record) = PlannerRecord::for_channel(team, channel, planner_tabs) {
                report.records.push(OutputRecord::Planner(record));
            }
        }
        Ok(())
    }

    /// Plan ids resolved from the team's task-list tabs, in channel order.
    #[instrument(skip_all, fields(team_id = %team.id))]
    pub(super) async fn team_plan_ids(
        &self,
        team: &Team,
        channels: &[Channel],
        report: &mut WalkReport,
    ) -> Result<Vec<String>, WalkError> {
        let mut plan_ids = Vec::new();
        for channel in channels {
            let planner_tabs = self.channel_planner_tabs(team, channel, report).await?;
            for reference in planner_tabs {
                match reference.plan_id {
                    Some(plan_id) => plan_ids.push(plan_id),
                    None => debug!(tab = %reference.tab_name, "task-list tab without plan id"),
                }
            }
        }
        Ok(plan_ids)
    }

    async fn channel_planner_tabs(
        &self,
        team: &Team,
        channel: &Channel,
        report: &mut WalkReport,
    ) -> Result<Vec<PlannerReference>, WalkError> {
        report.summary.channels_visited += 1;
        let Some(tabs) = self.absorb(
            "list_tabs",
            self.source.list_tabs(&team.id, &channel.id).await,
            &mut report.summary,
        )?
        else {
            return Ok(Vec::new());
        };

        let planner_tabs: Vec<PlannerReference> =
            tabs.iter().filter_map(planner_reference).collect();
        debug!(
            channel = channel.name(),
            tabs = tabs.len(),
            planner_tabs = planner_tabs.len(),
            "scanned channel tabs"
        );
        Ok(planner_tabs)
    }
}
