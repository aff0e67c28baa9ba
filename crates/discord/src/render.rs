use relayarr_core::types::{MediaRecord, MediaStatus, Requester, Transition};

use crate::platform::{Embed, EmbedField, EmbedFooter, EmbedImage, MessagePayload};

const TITLE_LIMIT: usize = 256;
const DESCRIPTION_LIMIT: usize = 4096;
const FIELD_VALUE_LIMIT: usize = 1024;
const THREAD_NAME_LIMIT: usize = 100;

pub fn status_color(status: MediaStatus) -> u32 {
    match status {
        MediaStatus::Available => 0x2ecc71,
        MediaStatus::Blacklisted => 0xe74c3c,
        MediaStatus::Pending => 0xe67e22,
        MediaStatus::Processing => 0x3498db,
        MediaStatus::Unknown => 0x95a5a6,
    }
}

/// `<@id>` when the requester has a chat id, their display name otherwise.
pub fn mention(requester: &Requester) -> String {
    match &requester.chat_id {
        Some(id) => format!("<@{id}>"),
        None => requester.display_name.clone(),
    }
}

fn status_text(record: &MediaRecord) -> String {
    match record.status {
        MediaStatus::Processing => format!(
            "Processing — {:.0}%",
            record.download_progress * 100.0
        ),
        status => status.to_string(),
    }
}

/// The long-lived message representing one item.
pub fn main_message(record: &MediaRecord) -> MessagePayload {
    let requests = record
        .requesters
        .iter()
        .map(mention)
        .collect::<Vec<_>>()
        .join(" ");

    let fields = if requests.is_empty() {
        Vec::new()
    } else {
        vec![EmbedField {
            name: "\u{200b}".to_string(),
            value: truncate(&format!("*Requested by* {requests}"), FIELD_VALUE_LIMIT),
            inline: true,
        }]
    };

    MessagePayload {
        embeds: vec![Embed {
            title: truncate(&record.title, TITLE_LIMIT),
            url: non_empty(&record.link),
            description: non_empty(&record.overview).map(|d| truncate(&d, DESCRIPTION_LIMIT)),
            color: status_color(record.status),
            thumbnail: non_empty(&record.image_url).map(|url| EmbedImage { url }),
            fields,
            footer: Some(EmbedFooter {
                text: status_text(record),
            }),
        }],
    }
}

/// A thread update announcing one transition.
pub fn transition_message(transition: &Transition) -> MessagePayload {
    let (status, text) = match *transition {
        Transition::StatusChanged { status } => (status, format!("Status → {status}")),
        Transition::SeasonAvailable { season } => {
            (MediaStatus::Available, format!("Season {season} → Available"))
        }
        Transition::EpisodeAvailable { season, episode } => (
            MediaStatus::Available,
            format!("Episode S{season}E{episode} → Available"),
        ),
    };

    MessagePayload {
        embeds: vec![Embed {
            title: text,
            url: None,
            description: None,
            color: status_color(status),
            thumbnail: None,
            fields: Vec::new(),
            footer: None,
        }],
    }
}

pub fn thread_name(record: &MediaRecord) -> String {
    truncate(&record.title, THREAD_NAME_LIMIT)
}

fn non_empty(s: &str) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Cut to at most `max` characters, marking the cut with an ellipsis.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
