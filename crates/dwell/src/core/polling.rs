/*!
Poll ticks.

Every host trigger (load, resize, scroll, refresh) funnels into one
poll-all-sessions pass. Dwell timers re-validate by polling their session
again instead of trusting that the element is still in view.
*/

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};
use ts_rs::TS;

use super::{Shared, Tracker};
use crate::platform::{Platform, TimerTask};
use crate::types::{ElementId, SessionId, TimerId, TrackerError, TrackerResult};

/// Host signals that cause every session to be re-evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Trigger {
  /// The document finished loading.
  Load,
  /// The viewport was resized.
  Resize,
  /// The viewport was scrolled.
  Scroll,
  /// Element sets were refreshed.
  Refresh,
}

impl<P: Platform> Tracker<P> {
  /// Poll every session once, in creation order.
  ///
  /// Callback panics propagate; sessions after the panicking one are not
  /// polled in this pass.
  pub fn handle_trigger(&self, trigger: Trigger) {
    let ids = self.sessions();
    log::trace!("{trigger:?}: polling {} sessions", ids.len());
    for id in ids {
      self.poll_session(id);
    }
  }

  /// Poll one session.
  pub fn poll(&self, id: SessionId) -> TrackerResult<()> {
    if !self.read(|r| r.contains(id)) {
      return Err(TrackerError::SessionNotFound(id));
    }
    self.poll_session(id);
    Ok(())
  }

  /// Poll under the lock, deliver after releasing it.
  pub(crate) fn poll_session(&self, id: SessionId) {
    let weak = Arc::downgrade(&self.shared);
    let make_task = move |session_id, element_id, timer| {
      dwell_task(Weak::clone(&weak), session_id, element_id, timer)
    };

    let delivery = self.write(|r| r.poll_session(id, self.platform(), &make_task));
    if let Some(delivery) = delivery {
      delivery.deliver();
    }
  }

  fn on_dwell_timer(&self, session_id: SessionId, element_id: ElementId, timer: TimerId) {
    log::trace!("[session {session_id}] dwell timer fired for element {element_id}");
    self.write(|r| r.timer_fired(session_id, element_id, timer));
    self.poll_session(session_id);
  }
}

/// Timer task holding only a weak reference, so pending timers never keep a
/// dropped tracker alive.
fn dwell_task<P: Platform>(
  shared: Weak<Shared<P>>,
  session_id: SessionId,
  element_id: ElementId,
  timer: TimerId,
) -> TimerTask {
  Box::new(move || {
    if let Some(shared) = shared.upgrade() {
      Tracker { shared }.on_dwell_timer(session_id, element_id, timer);
    }
  })
}
