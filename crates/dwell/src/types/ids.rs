/*! Branded ID types for sessions, tracked elements and timers. */

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use ts_rs::TS;

/// Tracking session identifier.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  TS,
  Display,
  From,
  Into,
)]
#[ts(export)]
pub struct SessionId(pub u32);

/// Global counter for `SessionId` generation. Starts at 1 (0 could be confused with "null").
static SESSION_COUNTER: AtomicU32 = AtomicU32::new(1);

impl SessionId {
  /// Generate a new unique `SessionId`.
  pub fn new() -> Self {
    Self(SESSION_COUNTER.fetch_add(1, Ordering::Relaxed))
  }
}

impl Default for SessionId {
  fn default() -> Self {
    Self::new()
  }
}

/// Identifier of one element within one session.
///
/// The same platform element tracked by two sessions gets two ids.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, Display, From, Into,
)]
#[ts(export)]
pub struct ElementId(pub u32);

static ELEMENT_COUNTER: AtomicU32 = AtomicU32::new(1);

impl ElementId {
  /// Generate a new unique `ElementId`.
  pub fn new() -> Self {
    Self(ELEMENT_COUNTER.fetch_add(1, Ordering::Relaxed))
  }
}

impl Default for ElementId {
  fn default() -> Self {
    Self::new()
  }
}

/// Handle to a scheduled dwell timer, issued by the tracker when it arms one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Into)]
pub struct TimerId(pub u64);

static TIMER_COUNTER: AtomicU64 = AtomicU64::new(1);

impl TimerId {
  /// Generate a new unique `TimerId`.
  pub fn new() -> Self {
    Self(TIMER_COUNTER.fetch_add(1, Ordering::Relaxed))
  }
}

impl Default for TimerId {
  fn default() -> Self {
    Self::new()
  }
}
