/*!
Core tracker instance - owns all sessions, the platform, and event broadcasting.

# Module Structure

- `mod.rs` - Tracker struct, construction, events
- `registry/` - Registry (sessions + per-element records) with event emission
- `polling.rs` - triggers, poll ticks, dwell timer callbacks
- `queries.rs` - read-only session inspection
- `subscriptions.rs` - track/untrack/refresh
- `notify.rs` - batch delivery to callbacks

# Example

```
use dwell::platform::{ManualElement, ManualPlatform};
use dwell::{Bounds, Size, TrackOptions, Tracker, Trigger};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

let platform = ManualPlatform::new(Size::new(1000.0, 800.0));
platform.set_bounds(ManualElement(1), Bounds::new(10.0, 10.0, 40.0, 40.0));
platform.set_matches(".card", vec![ManualElement(1)]);

let tracker = Tracker::new(platform);
let seen = Arc::new(AtomicUsize::new(0));
let counter = Arc::clone(&seen);
tracker.track_selector(".card".to_string(), TrackOptions::default().delay_ms(500), move |batch| {
  counter.fetch_add(batch.len(), Ordering::SeqCst);
});

tracker.platform().advance(Duration::from_millis(500));
tracker.handle_trigger(Trigger::Scroll);
assert_eq!(seen.load(Ordering::SeqCst), 1);
```
*/

mod notify;
mod polling;
mod queries;
mod registry;
mod subscriptions;

pub use polling::Trigger;
pub use subscriptions::{Callback, SessionHandle, Targets};

use async_broadcast::{InactiveReceiver, Receiver};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::platform::Platform;
use crate::types::Event;
use registry::Registry;

const DEFAULT_EVENT_CAPACITY: usize = 1000;

pub(crate) struct Shared<P: Platform> {
  platform: P,
  state: Mutex<Registry<P>>,
  events_keepalive: InactiveReceiver<Event>,
}

/// Visibility tracker - owns the platform, every session, and event broadcasting.
///
/// Clone is cheap (Arc bump). Sessions live until untracked or until the last
/// clone (and every pending timer) is dropped.
pub struct Tracker<P: Platform> {
  shared: Arc<Shared<P>>,
}

impl<P: Platform> Clone for Tracker<P> {
  fn clone(&self) -> Self {
    Self {
      shared: Arc::clone(&self.shared),
    }
  }
}

impl<P: Platform> std::fmt::Debug for Tracker<P> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Tracker").finish_non_exhaustive()
  }
}

/// Builder for configuring a Tracker.
///
/// # Example
///
/// ```
/// use dwell::platform::ManualPlatform;
/// use dwell::{Size, TrackerBuilder};
///
/// let tracker = TrackerBuilder::new()
///     .event_capacity(64)
///     .build(ManualPlatform::new(Size::new(800.0, 600.0)));
/// assert!(tracker.sessions().is_empty());
/// ```
#[derive(Debug, Clone, Copy)]
#[must_use = "Builder does nothing until .build() is called"]
pub struct TrackerBuilder {
  event_capacity: usize,
}

impl Default for TrackerBuilder {
  fn default() -> Self {
    Self {
      event_capacity: DEFAULT_EVENT_CAPACITY,
    }
  }
}

impl TrackerBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Capacity of the event channel. Oldest events are dropped when full. Default: 1000.
  pub const fn event_capacity(mut self, capacity: usize) -> Self {
    self.event_capacity = capacity;
    self
  }

  /// Build the tracker on top of `platform`.
  pub fn build<P: Platform>(self, platform: P) -> Tracker<P> {
    let (mut tx, rx) = async_broadcast::broadcast(self.event_capacity.max(1));
    tx.set_overflow(true); // Drop oldest messages when full

    Tracker {
      shared: Arc::new(Shared {
        platform,
        state: Mutex::new(Registry::new(tx)),
        events_keepalive: rx.deactivate(),
      }),
    }
  }
}

impl<P: Platform> Tracker<P> {
  /// Create a tracker with default options.
  pub fn new(platform: P) -> Self {
    TrackerBuilder::new().build(platform)
  }

  /// The platform this tracker polls.
  pub fn platform(&self) -> &P {
    &self.shared.platform
  }

  /// Subscribe to events from this tracker.
  pub fn subscribe(&self) -> Receiver<Event> {
    self.shared.events_keepalive.activate_cloned()
  }

  /// Read state. Never call consumer callbacks inside the closure.
  #[inline]
  pub(crate) fn read<R>(&self, f: impl FnOnce(&Registry<P>) -> R) -> R {
    f(&self.shared.state.lock())
  }

  /// Write state. Never call consumer callbacks inside the closure.
  #[inline]
  pub(crate) fn write<R>(&self, f: impl FnOnce(&mut Registry<P>) -> R) -> R {
    f(&mut self.shared.state.lock())
  }
}
