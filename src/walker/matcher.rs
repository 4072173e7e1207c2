//! Attribution of team notebooks to channels.
//!
//! Group and site notebook listings do not say which channel a notebook
//! belongs to, so it is inferred from the notebook name. Strategies are tried
//! from most to least specific; the first hit wins.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::graph::Channel;

/// Prefixes Teams and users commonly put in front of a notebook name.
/// Applied in order; several may be stripped.
const NOTEBOOK_NAME_PREFIXES: &[&str] = &[
    "bloc de notas de ",
    "notas_ ",
    "notas de ",
    "notebook ",
    "notes - ",
    "notes_ ",
    "bloc de notes de ",
    "cuaderno de ",
    "onenote - ",
];

const GENERAL_CHANNEL: &str = "general";

/// Shared tokens longer than this score a bonus point.
const LONG_TOKEN_LEN: usize = 3;

/// Returns the index in `channels` of the channel a notebook belongs to.
///
/// `None` only when `channels` is empty.
#[must_use]
pub fn match_notebook_to_channel(
    notebook_name: &str,
    channels: &[Channel],
    team_name: &str,
) -> Option<usize> {
    if channels.is_empty() {
        return None;
    }

    let cleaned = strip_prefixes(&notebook_name.to_lowercase());
    let team_lower = team_name.to_lowercase();
    trace!(notebook_name, cleaned = %cleaned, "matching notebook to channel");

    let general = channels
        .iter()
        .position(|c| c.name().to_lowercase() == GENERAL_CHANNEL);

    if (cleaned == team_lower || without_spaces(&cleaned) == without_spaces(&team_lower))
        && let Some(index) = general
    {
        debug!(notebook_name, "notebook named after team, using General channel");
        return Some(index);
    }

    let named: Vec<(usize, String)> = channels
        .iter()
        .enumerate()
        .map(|(i, c)| (i, c.name().to_lowercase()))
        .filter(|(_, name)| !name.is_empty())
        .collect();

    if let Some((index, _)) = named.iter().find(|(_, name)| *name == cleaned) {
        debug!(notebook_name, channel = channels[*index].name(), "exact channel match");
        return Some(*index);
    }

    if let Some((index, _)) = named
        .iter()
        .find(|(_, name)| cleaned.contains(name.as_str()) || name.contains(cleaned.as_str()))
    {
        debug!(notebook_name, channel = channels[*index].name(), "containment match");
        return Some(*index);
    }

    if let Some(index) = best_token_match(&cleaned, &named) {
        debug!(notebook_name, channel = channels[index].name(), "token match");
        return Some(index);
    }

    if let Some((index, _)) = named
        .iter()
        .find(|(_, name)| initials_match(&cleaned, name))
    {
        debug!(notebook_name, channel = channels[*index].name(), "initials match");
        return Some(*index);
    }

    if let Some(index) = general {
        debug!(notebook_name, "no specific match, using General channel");
        return Some(index);
    }

    debug!(notebook_name, "no match, using first channel");
    Some(0)
}

fn strip_prefixes(name: &str) -> String {
    let mut cleaned = name;
    for prefix in NOTEBOOK_NAME_PREFIXES {
        if let Some(rest) = cleaned.strip_prefix(prefix) {
            cleaned = rest;
        }
    }
    cleaned.to_string()
}

fn without_spaces(value: &str) -> String {
    value.chars().filter(|c| *c != ' ').collect()
}

/// Highest shared-token score wins; the earliest channel wins ties.
fn best_token_match(cleaned: &str, named: &[(usize, String)]) -> Option<usize> {
    let notebook_tokens: HashSet<&str> = cleaned.split_whitespace().collect();
    let mut best: Option<(usize, usize)> = None;

    for (index, name) in named {
        let channel_tokens: HashSet<&str> = name.split_whitespace().collect();
        let score: usize = channel_tokens
            .intersection(&notebook_tokens)
            .map(|token| if token.chars().count() > LONG_TOKEN_LEN { 2 } else { 1 })
            .sum();
        if score > best.map_or(0, |(_, s)| s) {
            best = Some((*index, score));
        }
    }

    best.map(|(index, _)| index)
}

fn initials_match(cleaned: &str, channel_name: &str) -> bool {
    let initials: String = channel_name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .collect();
    if initials.chars().count() > 1 && cleaned.contains(initials.as_str()) {
        return true;
    }
    matches!(
        (cleaned.chars().next(), channel_name.chars().next()),
        (Some(a), Some(b)) if a == b
    )
}
