//! Graph API payload types.
//!
//! Only the fields the extraction needs are modelled; everything else in a
//! response is ignored. Optional fields tolerate both absence and `null`.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// A Graph collection response (`{ "value": [...] }`).
///
/// `@odata.nextLink` is ignored; only the first page is read.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphCollection<T> {
    /// Items of the first page; empty when the key is missing.
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

/// A team the caller has joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Team {
    /// Display name, or an empty string when the API omitted it.
    #[must_use]
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or_default()
    }
}

/// A channel inside a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Channel {
    /// Display name, or an empty string when the API omitted it.
    #[must_use]
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or_default()
    }
}

/// A tab pinned to a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
    #[serde(default)]
    pub configuration: Option<TabConfiguration>,
    /// Present when the request expands `teamsApp`.
    #[serde(default)]
    pub teams_app: Option<TeamsApp>,
    /// Older payloads carry the app id inline.
    #[serde(default)]
    pub teams_app_id: Option<String>,
}

impl Tab {
    #[must_use]
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or_default()
    }

    /// Id of the Teams app behind the tab, from whichever field carries it.
    #[must_use]
    pub fn app_id(&self) -> Option<&str> {
        self.teams_app
            .as_ref()
            .map(|app| app.id.as_str())
            .or(self.teams_app_id.as_deref())
    }

    #[must_use]
    pub fn entity_id(&self) -> Option<&str> {
        self.configuration.as_ref()?.entity_id.as_deref()
    }

    #[must_use]
    pub fn content_url(&self) -> Option<&str> {
        self.configuration.as_ref()?.content_url.as_deref()
    }

    #[must_use]
    pub fn website_url(&self) -> Option<&str> {
        self.configuration.as_ref()?.website_url.as_deref()
    }
}

/// The app-specific configuration block of a tab.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabConfiguration {
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub content_url: Option<String>,
    #[serde(default)]
    pub website_url: Option<String>,
}

/// The Teams app definition behind a tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamsApp {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// A OneNote notebook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notebook {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Notebook {
    #[must_use]
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or_default()
    }
}

/// A section inside a notebook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub links: Option<SectionLinks>,
}

impl Section {
    #[must_use]
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or_default()
    }

    /// Browser link to the section, when the API returned one.
    #[must_use]
    pub fn web_url(&self) -> Option<&str> {
        self.links
            .as_ref()?
            .one_note_web_url
            .as_ref()
            .map(|link| link.href.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionLinks {
    #[serde(default)]
    pub one_note_web_url: Option<ExternalLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalLink {
    pub href: String,
}

/// The SharePoint root site of a team's group.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
}

/// Notebooks listed from a team site, together with the site they live in.
///
/// The site id is needed again to reach the notebooks' sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteNotebooks {
    pub site: Site,
    pub notebooks: Vec<Notebook>,
}

/// A bucket (column) of a Planner plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerBucket {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl PlannerBucket {
    /// Bucket name, or an empty string when the API omitted it.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

/// A task of a Planner plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerTask {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub bucket_id: Option<String>,
}

impl PlannerTask {
    /// Task title, or an empty string when the API omitted it.
    #[must_use]
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }
}

/// Details of a Planner task; only the checklist is read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerTaskDetails {
    /// Checklist items keyed by item id.
    #[serde(default, deserialize_with = "null_as_default")]
    pub checklist: BTreeMap<String, ChecklistItem>,
}

impl PlannerTaskDetails {
    /// Checklist items in display order: by order hint, then by item id.
    #[must_use]
    pub fn ordered_checklist(&self) -> Vec<&ChecklistItem> {
        let mut items: Vec<(&String, &ChecklistItem)> = self.checklist.iter().collect();
        items.sort_by(|(a_id, a), (b_id, b)| {
            a.order_hint
                .as_deref()
                .unwrap_or_default()
                .cmp(b.order_hint.as_deref().unwrap_or_default())
                .then_with(|| a_id.cmp(b_id))
        });
        items.into_iter().map(|(_, item)| item).collect()
    }
}

/// One checklist entry of a task.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub is_checked: bool,
    #[serde(default)]
    pub order_hint: Option<String>,
}

impl ChecklistItem {
    /// Item title, or an empty string when the API omitted it.
    #[must_use]
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
