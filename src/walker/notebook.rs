//! Notebook mode: one record per notebook section.
//!
//! Notebooks reach a team two ways. The group (or, failing that, the team
//! site) lists the team's notebooks without channel information; those are
//! attributed to a channel by name. OneNote tabs point at a notebook from a
//! specific channel. A notebook id is reported once per run, whichever way
//! it was found first.
//!
//! Notebooks found through the team site keep the site id so their sections
//! (and tab notebooks of the same team) can be looked up there as well. A
//! team without channels still reports its notebooks, with no channel.

use std::collections::HashSet;

use tracing::{debug, instrument, warn};

use super::matcher::match_notebook_to_channel;
use super::{WalkError, WalkReport, Walker};
use crate::graph::{Channel, Notebook, Tab, Team};
use crate::identifier::{is_onenote_tab, notebook_id_from_tab, notebook_name_from_tab};
use crate::record::{NotebookRecord, NotebookSource, OutputRecord};

/// A notebook waiting for its sections to be listed.
struct Discovered {
    notebook: Notebook,
    source: NotebookSource,
    tab_name: Option<String>,
}

/// The team-level notebook listing.
struct TeamNotebooks {
    notebooks: Vec<Notebook>,
    source: NotebookSource,
    /// Team site the notebooks came from, when the site listing was used.
    site_id: Option<String>,
}

impl Walker<'_> {
    #[instrument(skip_all, fields(team_id = %team.id))]
    pub(super) async fn notebook_team(
        &self,
        team: &Team,
        channels: &[Channel],
        seen: &mut HashSet<String>,
        report: &mut WalkReport,
    ) -> Result<(), WalkError> {
        let listed = self.team_notebooks(team, channels.first(), report).await?;
        let site_id = listed.site_id.as_deref();

        let mut attributed: Vec<Vec<Discovered>> = channels.iter().map(|_| Vec::new()).collect();
        let mut unattributed = Vec::new();
        for notebook in listed.notebooks {
            if !seen.insert(notebook.id.clone()) {
                continue;
            }
            let item = Discovered {
                notebook,
                source: listed.source,
                tab_name: None,
            };
            match match_notebook_to_channel(item.notebook.name(), channels, team.name()) {
                Some(index) => attributed[index].push(item),
                None => unattributed.push(item),
            }
        }

        if !unattributed.is_empty() {
            debug!(
                notebooks = unattributed.len(),
                "team has no channels, exporting notebooks without one"
            );
        }
        for item in unattributed {
            self.expand_notebook(team, None, site_id, item, report)
                .await?;
        }

        for (channel, mut discovered) in channels.iter().zip(attributed) {
            report.summary.channels_visited += 1;
            discovered.extend(
                self.tab_notebooks(team, channel, site_id, seen, report)
                    .await?,
            );
            for item in discovered {
                self.expand_notebook(team, Some(channel), site_id, item, report)
                    .await?;
            }
        }
        Ok(())
    }

    /// Lists the notebook's sections and emits its records.
    async fn expand_notebook(
        &self,
        team: &Team,
        channel: Option<&Channel>,
        site_id: Option<&str>,
        item: Discovered,
        report: &mut WalkReport,
    ) -> Result<(), WalkError> {
        let listed = self.absorb(
            "list_sections",
            self.source
                .list_sections(&team.id, site_id, &item.notebook.id)
                .await,
            &mut report.summary,
        )?;
        let sections = listed.unwrap_or_else(|| {
            warn!(
                notebook_id = %item.notebook.id,
                notebook = item.notebook.name(),
                "sections unavailable, exporting notebook without them"
            );
            report.summary.sections_failed += 1;
            Vec::new()
        });
        debug!(
            notebook = item.notebook.name(),
            channel = channel.map(Channel::name),
            sections = sections.len(),
            "expanding notebook"
        );
        report.records.extend(
            NotebookRecord::expand(
                team,
                channel,
                &item.notebook,
                item.source,
                item.tab_name.as_deref(),
                &sections,
            )
            .into_iter()
            .map(OutputRecord::Notebook),
        );
        Ok(())
    }

    /// Group notebooks, or the team site's when the group yields none.
    async fn team_notebooks(
        &self,
        team: &Team,
        first_channel: Option<&Channel>,
        report: &mut WalkReport,
    ) -> Result<TeamNotebooks, WalkError> {
        let channel_id = first_channel.map_or("", |channel| channel.id.as_str());
        let primary = self.absorb(
            "list_notebooks",
            self.source.list_notebooks(&team.id, channel_id).await,
            &mut report.summary,
        )?;
        if let Some(notebooks) = primary
            && !notebooks.is_empty()
        {
            return Ok(TeamNotebooks {
                notebooks,
                source: NotebookSource::GroupApi,
                site_id: None,
            });
        }

        debug!("no group notebooks, trying team site");
        let fallback = self.absorb(
            "list_fallback_notebooks",
            self.source.list_fallback_notebooks(&team.id).await,
            &mut report.summary,
        )?;
        Ok(match fallback {
            Some(listed) => TeamNotebooks {
                notebooks: listed.notebooks,
                source: NotebookSource::SiteApi,
                site_id: Some(listed.site.id),
            },
            None => TeamNotebooks {
                notebooks: Vec::new(),
                source: NotebookSource::SiteApi,
                site_id: None,
            },
        })
    }

    /// Notebooks referenced by the channel's OneNote tabs.
    async fn tab_notebooks(
        &self,
        team: &Team,
        channel: &Channel,
        site_id: Option<&str>,
        seen: &mut HashSet<String>,
        report: &mut WalkReport,
    ) -> Result<Vec<Discovered>, WalkError> {
        let Some(tabs) = self.absorb(
            "list_tabs",
            self.source.list_tabs(&team.id, &channel.id).await,
            &mut report.summary,
        )?
        else {
            return Ok(Vec::new());
        };

        let mut found = Vec::new();
        for tab in tabs.iter().filter(|tab| is_onenote(tab)) {
            let Some(notebook_id) =
                notebook_id_from_tab(tab.entity_id(), tab.content_url(), tab.web_url.as_deref())
            else {
                debug!(tab = tab.name(), "OneNote tab without notebook id");
                continue;
            };
            if !seen.insert(notebook_id.clone()) {
                continue;
            }

            let notebook = self
                .absorb(
                    "get_notebook",
                    self.source
                        .get_notebook(&team.id, site_id, &notebook_id)
                        .await,
                    &mut report.summary,
                )?
                .unwrap_or_else(|| Notebook {
                    id: notebook_id,
                    display_name: Some(notebook_name_from_tab(tab.name())),
                });
            found.push(Discovered {
                notebook,
                source: NotebookSource::TabConfiguration,
                tab_name: Some(tab.name().to_string()),
            });
        }
        Ok(found)
    }
}

fn is_onenote(tab: &Tab) -> bool {
    is_onenote_tab(
        tab.name(),
        tab.app_id(),
        tab.content_url(),
        tab.web_url.as_deref(),
    )
}
