/*!
Track/untrack/refresh entry points.
*/

use std::sync::Arc;

use super::registry::Registry;
use super::{Tracker, Trigger};
use crate::platform::Platform;
use crate::types::{SessionId, SessionInfo, TrackOptions, TrackerError, TrackerResult};

/// Consumer callback. Receives a non-empty batch of newly visible elements.
pub type Callback<H> = Arc<dyn Fn(&[H]) + Send + Sync + 'static>;

/// What a session tracks.
pub enum Targets<P: Platform> {
  /// Re-resolved through the platform on every refresh.
  Selector(P::Selector),
  /// A fixed set. Refresh leaves it unchanged.
  Elements(Vec<P::Handle>),
}

impl<P: Platform> Clone for Targets<P> {
  fn clone(&self) -> Self {
    match self {
      Self::Selector(s) => Self::Selector(s.clone()),
      Self::Elements(e) => Self::Elements(e.clone()),
    }
  }
}

impl<P: Platform> std::fmt::Debug for Targets<P> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Selector(s) => f.debug_tuple("Selector").field(s).finish(),
      Self::Elements(e) => f.debug_tuple("Elements").field(e).finish(),
    }
  }
}

/// Handle to a tracking session.
///
/// Dropping the handle does not stop tracking; call [`SessionHandle::untrack`].
pub struct SessionHandle<P: Platform> {
  id: SessionId,
  tracker: Tracker<P>,
}

impl<P: Platform> Clone for SessionHandle<P> {
  fn clone(&self) -> Self {
    Self {
      id: self.id,
      tracker: self.tracker.clone(),
    }
  }
}

impl<P: Platform> std::fmt::Debug for SessionHandle<P> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SessionHandle")
      .field("id", &self.id)
      .finish_non_exhaustive()
  }
}

impl<P: Platform> SessionHandle<P> {
  pub const fn id(&self) -> SessionId {
    self.id
  }

  /// Current summary, or `None` once untracked.
  pub fn info(&self) -> Option<SessionInfo> {
    self.tracker.session_info(self.id)
  }

  /// Poll just this session.
  pub fn poll(&self) -> TrackerResult<()> {
    self.tracker.poll(self.id)
  }

  /// Stop tracking and cancel pending timers.
  pub fn untrack(self) -> TrackerResult<()> {
    self.tracker.untrack(self.id)
  }
}

impl<P: Platform> Tracker<P> {
  /// Start tracking `targets`.
  ///
  /// The initial element set is resolved and polled immediately, so elements
  /// already in view start their dwell right away.
  pub fn track(
    &self,
    targets: Targets<P>,
    options: TrackOptions,
    callback: Option<Callback<P::Handle>>,
  ) -> SessionHandle<P> {
    if callback.is_none() {
      log::warn!("Tracking session without a callback; visible elements will not be delivered");
    }

    let id = self.write(|r| r.create_session(targets, options, callback, self.platform()));
    log::debug!(
      "[session {id}] tracking (delay {}ms, {:?})",
      options.delay,
      options.visibility()
    );

    self.poll_session(id);
    SessionHandle {
      id,
      tracker: self.clone(),
    }
  }

  /// Shorthand for tracking a selector with a plain closure.
  pub fn track_selector<F>(
    &self,
    selector: P::Selector,
    options: TrackOptions,
    callback: F,
  ) -> SessionHandle<P>
  where
    F: Fn(&[P::Handle]) + Send + Sync + 'static,
  {
    let callback: Callback<P::Handle> = Arc::new(callback);
    self.track(Targets::Selector(selector), options, Some(callback))
  }

  /// Re-resolve every session's elements and poll everything once.
  pub fn refresh(&self) {
    self.write(Registry::mark_all_for_refresh);
    self.handle_trigger(Trigger::Refresh);
  }

  /// Stop tracking a session and cancel its pending timers.
  pub fn untrack(&self, id: SessionId) -> TrackerResult<()> {
    let removed = self.write(|r| r.remove_session(id, self.platform()));
    if !removed {
      return Err(TrackerError::SessionNotFound(id));
    }
    log::debug!("[session {id}] untracked");
    Ok(())
  }
}
