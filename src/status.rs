//! Delivery status model: classification of raw store statuses and the
//! checkmark glyph shown next to the local user's own messages.

use serde::{Deserialize, Serialize};

/// Delivery lifecycle of a message, totally ordered.
///
/// The store is the sole authority; a status observed by the client is
/// monotonically non-decreasing over time, so `Ord` here mirrors the
/// lifecycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Sent,
    Delivered,
    Read,
}

impl StatusKind {
    /// Classify the store's raw status column.  Absent or unrecognized
    /// values count as sent.
    pub fn classify(raw: Option<&str>) -> Self {
        match raw {
            Some("delivered") => StatusKind::Delivered,
            Some("read") => StatusKind::Read,
            _ => StatusKind::Sent,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusKind::Sent => "sent",
            StatusKind::Delivered => "delivered",
            StatusKind::Read => "read",
        }
    }
}

/// Style-agnostic checkmark kind.  The accent colour for `DoubleAccent` is
/// a theme-supplied parameter the renderer threads through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlyphKind {
    None,
    SingleGray,
    DoubleGray,
    DoubleAccent,
}

/// Glyph for a message's status.  Only the local sender's own messages carry
/// a glyph; incoming messages never do.
pub fn glyph_for(status: StatusKind, is_self_sender: bool) -> GlyphKind {
    if !is_self_sender {
        return GlyphKind::None;
    }
    match status {
        StatusKind::Sent => GlyphKind::SingleGray,
        StatusKind::Delivered => GlyphKind::DoubleGray,
        StatusKind::Read => GlyphKind::DoubleAccent,
    }
}
