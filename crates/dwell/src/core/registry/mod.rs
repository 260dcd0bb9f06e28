/*!
Registry - the single owner of all tracking sessions.

All fields are private. Mutations go through methods that keep per-element
records, timers and events consistent:
- Removed elements always have their timers canceled
- Events are always emitted
- Confirmed batches are always drained after a poll

## Module Structure

- `mod.rs` - Registry struct, event emission, session lifecycle
- `session.rs` - Session state and the per-tick poll
- `records.rs` - per-element visibility state machine
*/

mod records;
mod session;

use async_broadcast::Sender;
use std::collections::BTreeMap;

use super::notify::Delivery;
use super::subscriptions::{Callback, Targets};
use crate::platform::{Platform, TimerTask};
use crate::types::{ElementId, Event, Phase, SessionId, SessionInfo, TimerId, TrackOptions};
use session::Session;

/// Builds the task a dwell timer runs when it fires.
pub(crate) type TaskFactory<'a> = dyn Fn(SessionId, ElementId, TimerId) -> TimerTask + 'a;

/// Broadcasts events, never blocking.
pub(crate) struct Emitter {
  events_tx: Sender<Event>,
}

impl Emitter {
  pub(crate) fn emit(&self, event: Event) {
    if let Err(e) = self.events_tx.try_broadcast(event) {
      if e.is_full() {
        log::error!(
          "Event channel overflow - events are being dropped. \
           Consider increasing the event capacity or processing events faster."
        );
      }
    }
  }
}

pub(crate) struct Registry<P: Platform> {
  emitter: Emitter,
  sessions: BTreeMap<SessionId, Session<P>>,
}

impl<P: Platform> Registry<P> {
  pub(crate) fn new(events_tx: Sender<Event>) -> Self {
    Self {
      emitter: Emitter { events_tx },
      sessions: BTreeMap::new(),
    }
  }

  /// Register a session. Resolves its initial elements but does not poll.
  pub(crate) fn create_session(
    &mut self,
    targets: Targets<P>,
    options: TrackOptions,
    callback: Option<Callback<P::Handle>>,
    platform: &P,
  ) -> SessionId {
    let session = Session::new(targets, options, callback, platform);
    let id = session.id;
    self.emitter.emit(Event::SessionCreated {
      session: session.info(),
    });
    self.sessions.insert(id, session);
    id
  }

  /// Remove a session and cancel its pending timers.
  pub(crate) fn remove_session(&mut self, id: SessionId, platform: &P) -> bool {
    let Some(mut session) = self.sessions.remove(&id) else {
      return false;
    };
    session.cancel_timers(platform);
    self.emitter.emit(Event::SessionRemoved { session_id: id });
    true
  }

  /// Session IDs in creation order.
  pub(crate) fn session_ids(&self) -> Vec<SessionId> {
    self.sessions.keys().copied().collect()
  }

  pub(crate) fn contains(&self, id: SessionId) -> bool {
    self.sessions.contains_key(&id)
  }

  pub(crate) fn session_info(&self, id: SessionId) -> Option<SessionInfo> {
    self.sessions.get(&id).map(Session::info)
  }

  pub(crate) fn phase(&self, id: SessionId, handle: &P::Handle) -> Option<Phase> {
    self.sessions.get(&id)?.phase(handle)
  }

  pub(crate) fn element_id(&self, id: SessionId, handle: &P::Handle) -> Option<ElementId> {
    self.sessions.get(&id)?.element_id(handle)
  }

  pub(crate) fn element(&self, id: SessionId, element_id: ElementId) -> Option<P::Handle> {
    self.sessions.get(&id)?.handle(element_id).cloned()
  }

  pub(crate) fn elements(&self, id: SessionId) -> Option<Vec<P::Handle>> {
    self.sessions.get(&id).map(|s| s.elements().to_vec())
  }

  /// Ask every session to re-resolve its elements on its next poll.
  pub(crate) fn mark_all_for_refresh(&mut self) {
    for session in self.sessions.values_mut() {
      session.request_refresh();
    }
  }

  /// Run one poll tick for a session. Returns the batch to deliver, if any.
  pub(crate) fn poll_session(
    &mut self,
    id: SessionId,
    platform: &P,
    make_task: &TaskFactory<'_>,
  ) -> Option<Delivery<P::Handle>> {
    let session = self.sessions.get_mut(&id)?;
    session.poll(platform, &self.emitter, make_task)
  }

  /// A dwell timer fired; forget it so a re-validating poll can re-arm if needed.
  pub(crate) fn timer_fired(&mut self, id: SessionId, element_id: ElementId, timer: TimerId) {
    if let Some(session) = self.sessions.get_mut(&id) {
      session.timer_fired(element_id, timer);
    }
  }
}
