//! Task export: one record per checklist item of every task in a plan.
//!
//! Buckets are visited in listing order and each bucket's tasks in task
//! listing order. Tasks whose bucket is not among the plan's buckets are
//! left out, as are buckets without tasks.

use std::collections::HashMap;

use tracing::{debug, instrument, warn};

use super::{WalkError, WalkReport, Walker};
use crate::graph::{PlannerTask, PlannerTaskDetails};
use crate::record::{OutputRecord, PlanTaskRecord};

impl Walker<'_> {
    /// Exports every plan in `plan_ids`, pacing before each one.
    pub(super) async fn export_plans(
        &self,
        plan_ids: &[String],
        started: &mut bool,
        report: &mut WalkReport,
    ) -> Result<(), WalkError> {
        for plan_id in plan_ids {
            self.pace(started).await;
            self.export_plan(plan_id, report).await?;
        }
        Ok(())
    }

    #[instrument(skip(self, report))]
    async fn export_plan(&self, plan_id: &str, report: &mut WalkReport) -> Result<(), WalkError> {
        let Some(buckets) = self.absorb(
            "list_plan_buckets",
            self.source.list_plan_buckets(plan_id).await,
            &mut report.summary,
        )?
        else {
            report.summary.plans_skipped += 1;
            return Ok(());
        };
        let Some(tasks) = self.absorb(
            "list_plan_tasks",
            self.source.list_plan_tasks(plan_id).await,
            &mut report.summary,
        )?
        else {
            report.summary.plans_skipped += 1;
            return Ok(());
        };
        report.summary.plans_visited += 1;
        debug!(
            buckets = buckets.len(),
            tasks = tasks.len(),
            "listed plan contents"
        );

        let mut by_bucket: HashMap<&str, Vec<&PlannerTask>> = HashMap::new();
        for task in &tasks {
            match task.bucket_id.as_deref() {
                Some(bucket_id) => by_bucket.entry(bucket_id).or_default().push(task),
                None => debug!(task_id = %task.id, "task without bucket"),
            }
        }

        for bucket in &buckets {
            let Some(bucket_tasks) = by_bucket.get(bucket.id.as_str()) else {
                continue;
            };
            for task in bucket_tasks {
                let details = match self.absorb(
                    "get_task_details",
                    self.source.get_task_details(&task.id).await,
                    &mut report.summary,
                )? {
                    Some(details) => details,
                    None => {
                        warn!(task_id = %task.id, "checklist unavailable, exporting task without it");
                        report.summary.task_details_failed += 1;
                        PlannerTaskDetails::default()
                    }
                };
                report.records.extend(
                    PlanTaskRecord::expand(plan_id, bucket, task, &details)
                        .into_iter()
                        .map(OutputRecord::PlanTask),
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::graph::model::TabConfiguration;
    use crate::graph::{ChecklistItem, PlannerBucket, Tab};
    use crate::pacing::Pacer;
    use crate::record::NO_CHECKLIST;
    use crate::walker::tests::{FakeGraph, channel, team};
    use crate::walker::{ExtractionMode, WalkOptions};

    fn bucket(id: &str, name: &str) -> PlannerBucket {
        PlannerBucket {
            id: id.to_string(),
            name: Some(name.to_string()),
        }
    }

    fn task(id: &str, title: &str, bucket_id: &str) -> PlannerTask {
        PlannerTask {
            id: id.to_string(),
            title: Some(title.to_string()),
            bucket_id: Some(bucket_id.to_string()),
        }
    }

    fn checklist(items: &[(&str, &str, bool)]) -> PlannerTaskDetails {
        PlannerTaskDetails {
            checklist: items
                .iter()
                .map(|(hint, title, checked)| {
                    (
                        format!("item-{hint}"),
                        ChecklistItem {
                            title: Some((*title).to_string()),
                            is_checked: *checked,
                            order_hint: Some((*hint).to_string()),
                        },
                    )
                })
                .collect(),
        }
    }

    fn plan_options(plan_ids: &[&str]) -> WalkOptions {
        WalkOptions {
            plan_ids: plan_ids.iter().map(|id| (*id).to_string()).collect(),
            ..WalkOptions::default()
        }
    }

    fn task_records(report: &WalkReport) -> Vec<&PlanTaskRecord> {
        report
            .records
            .iter()
            .filter_map(|r| match r {
                OutputRecord::PlanTask(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    fn plan_fake() -> FakeGraph {
        let mut fake = FakeGraph::default();
        fake.buckets.insert(
            "plan1".to_string(),
            Ok(vec![bucket("b1", "To do"), bucket("b2", "Done"), bucket("b3", "Empty")]),
        );
        fake.plan_tasks.insert(
            "plan1".to_string(),
            vec![
                task("k1", "Renew licences", "b2"),
                task("k2", "Order laptops", "b1"),
                task("k3", "Stray", "gone"),
            ],
        );
        fake.task_details.insert(
            "k1".to_string(),
            checklist(&[("1", "Get quote", true), ("2", "Sign", false)]),
        );
        fake.task_details
            .insert("k2".to_string(), PlannerTaskDetails::default());
        fake
    }

    #[tokio::test]
    async fn test_plan_rows_follow_bucket_order_with_no_checklist_marker() {
        let fake = plan_fake();
        let pacer = Pacer::new(Duration::ZERO);
        let walker = Walker::new(&fake, &pacer, plan_options(&["plan1"]));

        let report = walker.walk(ExtractionMode::Tasks, None).await.unwrap();
        let rows = task_records(&report);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].bucket_name, "To do");
        assert_eq!(rows[0].task_title, "Order laptops");
        assert_eq!(rows[0].checklist_item, NO_CHECKLIST);
        assert_eq!(rows[0].completed, None);
        assert_eq!(rows[1].bucket_name, "Done");
        assert_eq!(rows[1].checklist_item, "Get quote");
        assert_eq!(rows[1].completed, Some(true));
        assert_eq!(rows[2].checklist_item, "Sign");
        assert_eq!(rows[2].completed, Some(false));
        assert!(rows.iter().all(|r| r.task_id != "k3"));

        assert_eq!(report.summary.plans_visited, 1);
        assert_eq!(report.summary.teams_visited, 0);
        assert!(
            !fake.calls().iter().any(|c| c == "list_teams"),
            "configured plans must not trigger a team walk"
        );
    }

    #[tokio::test]
    async fn test_missing_task_details_are_counted_and_marked() {
        let mut fake = plan_fake();
        fake.task_details.remove("k2");
        let pacer = Pacer::new(Duration::ZERO);
        let walker = Walker::new(&fake, &pacer, plan_options(&["plan1"]));

        let report = walker.walk(ExtractionMode::Tasks, None).await.unwrap();
        let rows = task_records(&report);

        assert_eq!(rows[0].task_id, "k2");
        assert_eq!(rows[0].checklist_item, NO_CHECKLIST);
        assert_eq!(report.summary.task_details_failed, 1);
        assert_eq!(report.summary.requests_failed, 1);
    }

    #[tokio::test]
    async fn test_unreadable_plan_is_skipped_and_plans_are_paced() {
        let mut fake = plan_fake();
        fake.buckets.insert("locked".to_string(), Err(403));
        let pacer = Pacer::new(Duration::ZERO);
        let walker = Walker::new(&fake, &pacer, plan_options(&["locked", "plan1"]));

        let report = walker.walk(ExtractionMode::Tasks, None).await.unwrap();

        assert_eq!(report.summary.plans_skipped, 1);
        assert_eq!(report.summary.plans_visited, 1);
        assert_eq!(report.summary.pauses, 1);
        assert_eq!(task_records(&report).len(), 3);
        assert!(
            !fake.calls().contains(&"list_plan_tasks locked".to_string()),
            "tasks of an unreadable plan are not requested"
        );
    }

    #[tokio::test]
    async fn test_plans_collected_from_task_tabs_when_none_configured() {
        let mut fake = plan_fake();
        fake.teams = Some(Ok(vec![team("t1", "Ops")]));
        fake.channels.insert(
            "t1".to_string(),
            Ok(vec![channel("c1", "General"), channel("c2", "Finance")]),
        );
        let plan_tab = |id: &str| Tab {
            id: format!("tab-{id}"),
            display_name: Some("Board".to_string()),
            web_url: None,
            configuration: Some(TabConfiguration {
                entity_id: None,
                content_url: Some(format!(
                    "https://tasks.office.com/contoso/Home/PlanViews/{id}?Type=PlanLink"
                )),
                website_url: None,
            }),
            teams_app: None,
            teams_app_id: None,
        };
        fake.tabs.insert(
            ("t1".to_string(), "c1".to_string()),
            vec![plan_tab("plan1")],
        );
        fake.tabs.insert(
            ("t1".to_string(), "c2".to_string()),
            vec![plan_tab("plan1")],
        );
        let pacer = Pacer::new(Duration::ZERO);
        let walker = Walker::new(&fake, &pacer, WalkOptions::default());

        let report = walker.walk(ExtractionMode::Tasks, None).await.unwrap();

        assert_eq!(task_records(&report).len(), 3);
        assert_eq!(report.summary.plans_visited, 1);
        // one team then one plan
        assert_eq!(report.summary.pauses, 1);
        assert_eq!(
            fake.calls()
                .iter()
                .filter(|c| c.starts_with("list_plan_buckets"))
                .count(),
            1
        );
    }
}
