//! Transition detection between a stored snapshot and a fresh record.

use std::collections::BTreeMap;

use relayarr_core::types::{MediaRecord, Transition};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// What a stored snapshot remembers, read tolerantly: rows written by older
/// versions may lack any of these fields, and an absent field counts as
/// "not previously set / not previously available".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreviousState {
    pub status: Option<String>,
    pub seasons: Option<BTreeMap<u32, PreviousSeason>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreviousSeason {
    pub available: Option<bool>,
    pub episodes: Option<BTreeMap<u32, PreviousEpisode>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreviousEpisode {
    pub available: Option<bool>,
}

impl PreviousState {
    pub fn from_value(value: &Value) -> Self {
        if value.is_null() {
            return Self::default();
        }
        serde_json::from_value(value.clone()).unwrap_or_else(|e| {
            warn!(error = %e, "stored state has an unexpected shape, diffing against nothing");
            Self::default()
        })
    }

    fn season(&self, number: u32) -> Option<&PreviousSeason> {
        self.seasons.as_ref()?.get(&number)
    }
}

impl PreviousSeason {
    fn was_available(&self) -> bool {
        self.available.unwrap_or(false)
    }

    fn episode_was_available(&self, number: u32) -> bool {
        self.episodes
            .as_ref()
            .and_then(|eps| eps.get(&number))
            .and_then(|ep| ep.available)
            .unwrap_or(false)
    }
}

/// Transitions from `previous` to `current`, in emission order: status first,
/// then seasons ascending, episodes ascending within a season.
///
/// A season that just became available is reported once and its episodes are
/// not reported individually.
pub fn transitions(previous: &PreviousState, current: &MediaRecord) -> Vec<Transition> {
    let mut out = Vec::new();

    if previous.status.as_deref() != Some(current.status.as_str()) {
        out.push(Transition::StatusChanged {
            status: current.status,
        });
    }

    let Some(seasons) = current.seasons() else {
        return out;
    };

    for (&number, season) in seasons {
        let before = previous.season(number);

        if season.available {
            if !before.is_some_and(PreviousSeason::was_available) {
                out.push(Transition::SeasonAvailable { season: number });
            }
            continue;
        }

        for (&episode, state) in &season.episodes {
            let was = before.is_some_and(|s| s.episode_was_available(episode));
            if state.available && !was {
                out.push(Transition::EpisodeAvailable {
                    season: number,
                    episode,
                });
            }
        }
    }

    out
}
