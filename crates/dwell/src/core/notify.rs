/*!
Batch delivery to session callbacks.

A `Delivery` is drained from the registry under the lock and delivered after
the lock is released, so callbacks may call back into the tracker.
*/

use super::subscriptions::Callback;
use crate::types::SessionId;

/// Elements confirmed in one poll tick, ready for the session callback.
pub(crate) struct Delivery<H> {
  session_id: SessionId,
  callback: Option<Callback<H>>,
  elements: Vec<H>,
}

impl<H> Delivery<H> {
  pub(crate) const fn new(
    session_id: SessionId,
    callback: Option<Callback<H>>,
    elements: Vec<H>,
  ) -> Self {
    Self {
      session_id,
      callback,
      elements,
    }
  }

  /// Invoke the callback once with the whole batch.
  ///
  /// Panics from the callback are not caught.
  pub(crate) fn deliver(self) {
    if self.elements.is_empty() {
      return;
    }
    let Some(callback) = self.callback else {
      log::debug!(
        "[session {}] {} elements visible, no callback configured",
        self.session_id,
        self.elements.len()
      );
      return;
    };
    log::debug!(
      "[session {}] delivering {} visible elements",
      self.session_id,
      self.elements.len()
    );
    callback(&self.elements);
  }
}
