/*!
Read-only session inspection.
*/

use super::registry::Registry;
use super::Tracker;
use crate::platform::Platform;
use crate::types::{ElementId, Phase, SessionId, SessionInfo};

impl<P: Platform> Tracker<P> {
  /// Active session IDs in creation order.
  pub fn sessions(&self) -> Vec<SessionId> {
    self.read(Registry::session_ids)
  }

  pub fn session_info(&self, id: SessionId) -> Option<SessionInfo> {
    self.read(|r| r.session_info(id))
  }

  /// The session's live element set, in resolution order.
  pub fn elements(&self, id: SessionId) -> Option<Vec<P::Handle>> {
    self.read(|r| r.elements(id))
  }

  /// Where `handle` is in its visibility episode. `None` if the session does not track it.
  pub fn phase(&self, id: SessionId, handle: &P::Handle) -> Option<Phase> {
    self.read(|r| r.phase(id, handle))
  }

  /// The ID events use for `handle` within session `id`.
  pub fn element_id(&self, id: SessionId, handle: &P::Handle) -> Option<ElementId> {
    self.read(|r| r.element_id(id, handle))
  }

  /// Map an event's element ID back to its handle.
  pub fn element(&self, id: SessionId, element_id: ElementId) -> Option<P::Handle> {
    self.read(|r| r.element(id, element_id))
  }
}
