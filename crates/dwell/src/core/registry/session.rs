/*!
Session state and the per-tick poll.

A session owns its live element set and one `ElementRecord` per element,
keyed by handle. Elements that drop out of the set on refresh lose their
record (and any pending timer) with it.
*/

use std::collections::{HashMap, HashSet};

use super::records::{ElementRecord, Step};
use super::{Emitter, TaskFactory};
use crate::core::notify::Delivery;
use crate::core::subscriptions::{Callback, Targets};
use crate::platform::Platform;
use crate::types::{ElementId, Event, Phase, SessionId, SessionInfo, TimerId, TrackOptions};

pub(crate) struct Session<P: Platform> {
  pub(crate) id: SessionId,
  targets: Targets<P>,
  options: TrackOptions,
  callback: Option<Callback<P::Handle>>,
  pending_refresh: bool,

  /// Live element set in resolution order.
  elements: Vec<P::Handle>,
  records: HashMap<P::Handle, ElementRecord>,
  handles_by_id: HashMap<ElementId, P::Handle>,

  /// Elements confirmed during the current tick. Drained by `take_delivery`.
  confirmed: Vec<P::Handle>,
}

impl<P: Platform> Session<P> {
  pub(crate) fn new(
    targets: Targets<P>,
    options: TrackOptions,
    callback: Option<Callback<P::Handle>>,
    platform: &P,
  ) -> Self {
    let initial = match &targets {
      Targets::Selector(selector) => platform.resolve(selector),
      Targets::Elements(elements) => elements.clone(),
    };

    let mut session = Self {
      id: SessionId::new(),
      targets,
      options,
      callback,
      pending_refresh: false,
      elements: Vec::new(),
      records: HashMap::new(),
      handles_by_id: HashMap::new(),
      confirmed: Vec::new(),
    };
    session.set_elements(initial, platform);
    session
  }

  pub(crate) fn info(&self) -> SessionInfo {
    SessionInfo {
      session_id: self.id,
      delay: self.options.delay,
      visibility: self.options.visibility(),
      elements: self.elements.len(),
      notified: self
        .records
        .values()
        .filter(|r| r.phase() == Phase::Notified)
        .count(),
      has_callback: self.callback.is_some(),
    }
  }

  pub(crate) fn elements(&self) -> &[P::Handle] {
    &self.elements
  }

  pub(crate) fn phase(&self, handle: &P::Handle) -> Option<Phase> {
    self.records.get(handle).map(ElementRecord::phase)
  }

  pub(crate) fn element_id(&self, handle: &P::Handle) -> Option<ElementId> {
    self.records.get(handle).map(|r| r.id)
  }

  pub(crate) fn handle(&self, id: ElementId) -> Option<&P::Handle> {
    self.handles_by_id.get(&id)
  }

  pub(crate) fn request_refresh(&mut self) {
    self.pending_refresh = true;
  }

  /// Run the state machine for every element, then drain the confirmed batch.
  pub(crate) fn poll(
    &mut self,
    platform: &P,
    emitter: &Emitter,
    make_task: &TaskFactory<'_>,
  ) -> Option<Delivery<P::Handle>> {
    if self.pending_refresh {
      self.pending_refresh = false;
      self.reresolve(platform, emitter);
    }

    let viewport = platform.fetch_viewport();
    let now = platform.now();
    let dwell = self.options.dwell();
    let visibility = self.options.visibility();

    for handle in &self.elements {
      let Some(record) = self.records.get_mut(handle) else {
        continue;
      };
      let in_viewport = platform
        .fetch_bounds(handle)
        .is_in_viewport(viewport, visibility);

      match record.step(in_viewport, now, dwell) {
        Step::Idle => {}

        Step::Arm { delay, appeared } => {
          if appeared {
            log::trace!("[session {}] {handle:?} appeared", self.id);
            emitter.emit(Event::ElementAppeared {
              session_id: self.id,
              element_id: record.id,
            });
          }
          let timer = TimerId::new();
          platform.schedule(timer, delay, make_task(self.id, record.id, timer));
          record.set_timer(timer);
        }

        Step::Confirmed { cancel } => {
          if let Some(timer) = cancel {
            platform.cancel(timer);
          }
          log::trace!("[session {}] {handle:?} confirmed visible", self.id);
          self.confirmed.push(handle.clone());
        }

        Step::Left {
          cancel,
          was_notified,
        } => {
          if let Some(timer) = cancel {
            platform.cancel(timer);
          }
          log::trace!("[session {}] {handle:?} left viewport", self.id);
          emitter.emit(Event::ElementLeft {
            session_id: self.id,
            element_id: record.id,
            was_notified,
          });
        }
      }
    }

    self.take_delivery(emitter)
  }

  /// Forget a fired timer so the next poll can re-arm if the dwell is not over.
  pub(crate) fn timer_fired(&mut self, element_id: ElementId, timer: TimerId) {
    let Some(handle) = self.handles_by_id.get(&element_id) else {
      return;
    };
    if let Some(record) = self.records.get_mut(handle) {
      record.timer_fired(timer);
    }
  }

  /// Cancel every pending timer. Used when the session is removed.
  pub(crate) fn cancel_timers(&mut self, platform: &P) {
    for record in self.records.values_mut() {
      if let Some(timer) = record.take_timer() {
        platform.cancel(timer);
      }
    }
  }

  fn take_delivery(&mut self, emitter: &Emitter) -> Option<Delivery<P::Handle>> {
    if self.confirmed.is_empty() {
      return None;
    }

    let elements = std::mem::take(&mut self.confirmed);
    let element_ids = elements
      .iter()
      .filter_map(|h| self.records.get(h).map(|r| r.id))
      .collect();
    emitter.emit(Event::ElementsVisible {
      session_id: self.id,
      element_ids,
    });

    Some(Delivery::new(self.id, self.callback.clone(), elements))
  }

  /// Re-resolve a selector target. Fixed element lists stay as they are.
  fn reresolve(&mut self, platform: &P, emitter: &Emitter) {
    let Targets::Selector(selector) = &self.targets else {
      return;
    };
    let resolved = platform.resolve(selector);
    let (added, removed) = self.set_elements(resolved, platform);

    log::debug!(
      "[session {}] refreshed: {} elements (+{}, -{})",
      self.id,
      self.elements.len(),
      added.len(),
      removed.len()
    );
    emitter.emit(Event::SessionRefreshed {
      session_id: self.id,
      added,
      removed,
    });
  }

  /// Replace the live set. Kept elements keep their records; duplicates are dropped.
  fn set_elements(
    &mut self,
    mut handles: Vec<P::Handle>,
    platform: &P,
  ) -> (Vec<ElementId>, Vec<ElementId>) {
    let mut seen = HashSet::new();
    handles.retain(|h| seen.insert(h.clone()));

    // Removals follow the previous resolution order.
    let mut removed = Vec::new();
    for handle in &self.elements {
      if seen.contains(handle) {
        continue;
      }
      let Some(mut record) = self.records.remove(handle) else {
        continue;
      };
      if let Some(timer) = record.take_timer() {
        platform.cancel(timer);
      }
      self.handles_by_id.remove(&record.id);
      removed.push(record.id);
    }

    let mut added = Vec::new();
    for handle in &handles {
      if self.records.contains_key(handle) {
        continue;
      }
      let record = ElementRecord::new();
      added.push(record.id);
      self.handles_by_id.insert(record.id, handle.clone());
      self.records.insert(handle.clone(), record);
    }

    self.elements = handles;
    (added, removed)
  }
}
