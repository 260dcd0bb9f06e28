/*! Per-session tracking options. */

use super::Visibility;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use ts_rs::TS;

/// Default dwell time before an element counts as visible.
pub const DEFAULT_DELAY_MS: u32 = 1000;

/// Options for one tracking session.
///
/// Deserializes from the camelCase shape hosts already pass around
/// (`{ "delay": 500, "completelyVisible": true }`); missing fields fall back to
/// the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct TrackOptions {
  /// How long (ms) an element must stay visible before the callback sees it.
  pub delay: u32,
  /// Require the whole element inside the viewport instead of any part.
  pub completely_visible: bool,
}

impl Default for TrackOptions {
  fn default() -> Self {
    Self {
      delay: DEFAULT_DELAY_MS,
      completely_visible: false,
    }
  }
}

impl TrackOptions {
  pub const fn delay_ms(mut self, ms: u32) -> Self {
    self.delay = ms;
    self
  }

  pub const fn completely_visible(mut self, completely_visible: bool) -> Self {
    self.completely_visible = completely_visible;
    self
  }

  pub const fn dwell(&self) -> Duration {
    Duration::from_millis(self.delay as u64)
  }

  pub const fn visibility(&self) -> Visibility {
    Visibility::from_completely_visible(self.completely_visible)
  }
}
