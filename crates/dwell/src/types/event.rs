/*! Event types for session and element visibility changes. */

use super::{ElementId, SessionId, Visibility};
use serde::Serialize;
use ts_rs::TS;

/// Where a tracked element is in its current visibility episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Phase {
  /// Not in the viewport (or never evaluated).
  Unseen,
  /// In the viewport, waiting for the dwell time, no timer pending.
  Appeared,
  /// In the viewport with a dwell timer pending.
  Armed,
  /// Delivered to the callback; stays here until the element leaves.
  Notified,
}

/// Summary of one tracking session.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct SessionInfo {
  pub session_id: SessionId,
  pub delay: u32,
  pub visibility: Visibility,
  /// Number of elements in the live set.
  pub elements: usize,
  /// Elements currently in the `Notified` phase.
  pub notified: usize,
  pub has_callback: bool,
}

/// Events emitted when tracking state changes.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(tag = "event", content = "data")]
#[ts(export)]
pub enum Event {
  // Session lifecycle
  #[serde(rename = "session:created")]
  SessionCreated { session: SessionInfo },
  #[serde(rename = "session:refreshed")]
  SessionRefreshed {
    session_id: SessionId,
    added: Vec<ElementId>,
    removed: Vec<ElementId>,
  },
  #[serde(rename = "session:removed")]
  SessionRemoved { session_id: SessionId },

  // Element transitions (from poll ticks)
  #[serde(rename = "element:appeared")]
  ElementAppeared {
    session_id: SessionId,
    element_id: ElementId,
  },
  #[serde(rename = "element:left")]
  ElementLeft {
    session_id: SessionId,
    element_id: ElementId,
    /// True if the element had already been delivered this episode.
    was_notified: bool,
  },

  // Batch confirmation, one per poll tick that confirmed anything
  #[serde(rename = "elements:visible")]
  ElementsVisible {
    session_id: SessionId,
    element_ids: Vec<ElementId>,
  },
}
