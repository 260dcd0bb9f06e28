/*!
In-memory platform with a manual clock.

Holds the viewport size, element bounds and selector matches as plain data,
and keeps timers in a queue that only fires when [`ManualPlatform::advance`]
moves the clock. Headless hosts and tests drive it directly:

```
use dwell::platform::{ManualElement, ManualPlatform};
use dwell::{Bounds, Size};
use std::time::Duration;

let platform = ManualPlatform::new(Size::new(1000.0, 800.0));
platform.set_bounds(ManualElement(1), Bounds::new(10.0, 10.0, 40.0, 40.0));
platform.set_matches(".card", vec![ManualElement(1)]);
platform.advance(Duration::from_millis(500));
assert_eq!(platform.elapsed(), Duration::from_millis(500));
```
*/

use derive_more::{Display, From, Into};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use super::{Platform, TimerTask};
use crate::types::{Bounds, Size, TimerId};

/// Element handle for [`ManualPlatform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Into)]
pub struct ManualElement(pub u32);

struct ManualState {
  viewport: Size,
  bounds: HashMap<ManualElement, Bounds>,
  matches: HashMap<String, Vec<ManualElement>>,
  origin: Instant,
  elapsed: Duration,
  /// Pending timers ordered by due time, then by scheduling order.
  timers: BTreeMap<(Duration, TimerId), TimerTask>,
  due_by_id: HashMap<TimerId, Duration>,
}

/// Deterministic [`Platform`] backed by in-memory state.
pub struct ManualPlatform {
  state: Mutex<ManualState>,
}

impl std::fmt::Debug for ManualPlatform {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let state = self.state.lock();
    f.debug_struct("ManualPlatform")
      .field("viewport", &state.viewport)
      .field("elapsed", &state.elapsed)
      .field("pending_timers", &state.timers.len())
      .finish_non_exhaustive()
  }
}

impl ManualPlatform {
  pub fn new(viewport: Size) -> Self {
    Self {
      state: Mutex::new(ManualState {
        viewport,
        bounds: HashMap::new(),
        matches: HashMap::new(),
        origin: Instant::now(),
        elapsed: Duration::ZERO,
        timers: BTreeMap::new(),
        due_by_id: HashMap::new(),
      }),
    }
  }

  pub fn set_viewport(&self, viewport: Size) {
    self.state.lock().viewport = viewport;
  }

  pub fn set_bounds(&self, element: ManualElement, bounds: Bounds) {
    self.state.lock().bounds.insert(element, bounds);
  }

  /// Forget an element's bounds. It then reports a zero rect, like a detached node.
  pub fn remove_bounds(&self, element: ManualElement) {
    self.state.lock().bounds.remove(&element);
  }

  /// Set the elements `selector` resolves to.
  pub fn set_matches(&self, selector: impl Into<String>, elements: Vec<ManualElement>) {
    self.state.lock().matches.insert(selector.into(), elements);
  }

  /// Scroll the document: every element moves by `(-dx, -dy)`.
  pub fn scroll_by(&self, dx: f64, dy: f64) {
    for bounds in self.state.lock().bounds.values_mut() {
      bounds.x -= dx;
      bounds.y -= dy;
    }
  }

  /// Time since construction on the manual clock.
  pub fn elapsed(&self) -> Duration {
    self.state.lock().elapsed
  }

  pub fn pending_timers(&self) -> usize {
    self.state.lock().timers.len()
  }

  /// Move the clock forward, firing due timers in order.
  ///
  /// Each timer runs with the clock set to its due time and without the
  /// platform lock held, so tasks may schedule or cancel further timers.
  /// Timers scheduled by a task that fall due within the window fire too.
  pub fn advance(&self, by: Duration) {
    let target = self.state.lock().elapsed + by;

    loop {
      let task = {
        let mut state = self.state.lock();
        let Some(&(due, id)) = state.timers.keys().next() else {
          break;
        };
        if due > target {
          break;
        }
        state.elapsed = state.elapsed.max(due);
        state.due_by_id.remove(&id);
        state.timers.remove(&(due, id))
      };

      if let Some(task) = task {
        task();
      }
    }

    let mut state = self.state.lock();
    state.elapsed = state.elapsed.max(target);
  }
}

impl Platform for ManualPlatform {
  type Handle = ManualElement;
  type Selector = String;

  fn fetch_viewport(&self) -> Size {
    self.state.lock().viewport
  }

  fn fetch_bounds(&self, handle: &ManualElement) -> Bounds {
    self
      .state
      .lock()
      .bounds
      .get(handle)
      .copied()
      .unwrap_or(Bounds::new(0.0, 0.0, 0.0, 0.0))
  }

  fn resolve(&self, selector: &String) -> Vec<ManualElement> {
    self
      .state
      .lock()
      .matches
      .get(selector)
      .cloned()
      .unwrap_or_default()
  }

  fn now(&self) -> Instant {
    let state = self.state.lock();
    state.origin + state.elapsed
  }

  fn schedule(&self, timer: TimerId, delay: Duration, task: TimerTask) {
    let mut state = self.state.lock();
    let due = state.elapsed + delay;
    state.timers.insert((due, timer), task);
    state.due_by_id.insert(timer, due);
  }

  fn cancel(&self, timer: TimerId) {
    let mut state = self.state.lock();
    if let Some(due) = state.due_by_id.remove(&timer) {
      state.timers.remove(&(due, timer));
    }
  }
}
