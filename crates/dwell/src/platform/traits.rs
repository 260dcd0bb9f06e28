/*!
Platform abstraction traits.

These traits define the contract between the tracker and the host that owns
the real elements, viewport and timers (a browser bridge, a native toolkit, or
the in-memory `ManualPlatform`). Core code only uses these traits.
*/

use std::fmt::Debug;
use std::hash::Hash;
use std::time::{Duration, Instant};

use crate::types::{Bounds, Size, TimerId};

/// Work to run when a timer fires.
pub type TimerTask = Box<dyn FnOnce() + Send + 'static>;

/// Element reference. Clone should be cheap; equality is element identity.
pub trait PlatformHandle: Clone + Send + Sync + Hash + Eq + Debug + 'static {}

impl<T> PlatformHandle for T where T: Clone + Send + Sync + Hash + Eq + Debug + 'static {}

/// Host capabilities the tracker relies on.
///
/// The tracker holds its registry lock across every call into the platform.
/// Implementations must not call back into the `Tracker` from any of these
/// methods, and `schedule` must never run its task before returning.
pub trait Platform: Send + Sync + 'static {
  /// Element handle type for this platform.
  type Handle: PlatformHandle;
  /// Opaque descriptor that resolves to the current live element set.
  type Selector: Clone + Send + Sync + Debug + 'static;

  /// Fetch the current viewport dimensions.
  fn fetch_viewport(&self) -> Size;

  /// Fetch an element's bounds relative to the viewport origin.
  fn fetch_bounds(&self, handle: &Self::Handle) -> Bounds;

  /// Resolve a selector to the elements it currently matches, in document order.
  fn resolve(&self, selector: &Self::Selector) -> Vec<Self::Handle>;

  /// Current monotonic time.
  fn now(&self) -> Instant;

  /// Run `task` once after `delay`. `timer` is the tracker-issued id later
  /// passed to `cancel`.
  fn schedule(&self, timer: TimerId, delay: Duration, task: TimerTask);

  /// Cancel a scheduled timer. Canceling a fired, unknown or already canceled
  /// timer is a no-op.
  fn cancel(&self, timer: TimerId);
}
