/*!
Per-element visibility records.

One record per (session, element). The record is a small state machine that
advances once per poll tick and tells the session which side effects to
perform (arm a timer, cancel one, confirm the element).

## Invariants

1. **One delivery per episode**: once `Notified`, an element is only watched
   for leaving the viewport.
2. **Exit resets**: leaving the viewport before confirmation drops the
   appearance time and hands back any pending timer for cancellation.
3. **One pending timer**: a timer is only requested while none is pending.
*/

use std::time::{Duration, Instant};

use crate::types::{ElementId, Phase, TimerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisibilityState {
  Unseen,
  Appeared {
    since: Instant,
    timer: Option<TimerId>,
  },
  Notified,
}

/// Side effect requested by one poll tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
  Idle,
  /// Schedule a dwell timer. `appeared` is true on the tick the element entered.
  Arm { delay: Duration, appeared: bool },
  /// Dwell satisfied; the element joins this tick's batch.
  Confirmed { cancel: Option<TimerId> },
  Left {
    cancel: Option<TimerId>,
    was_notified: bool,
  },
}

pub(crate) struct ElementRecord {
  pub(crate) id: ElementId,
  state: VisibilityState,
}

impl ElementRecord {
  pub(crate) fn new() -> Self {
    Self {
      id: ElementId::new(),
      state: VisibilityState::Unseen,
    }
  }

  pub(crate) const fn phase(&self) -> Phase {
    match self.state {
      VisibilityState::Unseen => Phase::Unseen,
      VisibilityState::Appeared { timer: None, .. } => Phase::Appeared,
      VisibilityState::Appeared { timer: Some(_), .. } => Phase::Armed,
      VisibilityState::Notified => Phase::Notified,
    }
  }

  /// Advance one poll tick.
  pub(crate) fn step(&mut self, in_viewport: bool, now: Instant, dwell: Duration) -> Step {
    match self.state {
      VisibilityState::Unseen => {
        if !in_viewport {
          return Step::Idle;
        }
        self.state = VisibilityState::Appeared {
          since: now,
          timer: None,
        };
        Step::Arm {
          delay: dwell,
          appeared: true,
        }
      }

      VisibilityState::Appeared { since, timer } => {
        if !in_viewport {
          self.state = VisibilityState::Unseen;
          return Step::Left {
            cancel: timer,
            was_notified: false,
          };
        }

        let elapsed = now.saturating_duration_since(since);
        if elapsed >= dwell {
          self.state = VisibilityState::Notified;
          return Step::Confirmed { cancel: timer };
        }

        // A timer that fired early leaves us waiting with nothing scheduled.
        if timer.is_none() {
          return Step::Arm {
            delay: dwell - elapsed,
            appeared: false,
          };
        }
        Step::Idle
      }

      VisibilityState::Notified => {
        if in_viewport {
          return Step::Idle;
        }
        self.state = VisibilityState::Unseen;
        Step::Left {
          cancel: None,
          was_notified: true,
        }
      }
    }
  }

  /// Record the timer scheduled for the current appearance.
  pub(crate) fn set_timer(&mut self, id: TimerId) {
    if let VisibilityState::Appeared { timer, .. } = &mut self.state {
      *timer = Some(id);
    }
  }

  /// Forget `fired` if it is the pending timer of the current appearance.
  ///
  /// Timers from an earlier episode are ignored, even when both episodes
  /// started at the same instant.
  pub(crate) fn timer_fired(&mut self, fired: TimerId) {
    if let VisibilityState::Appeared { timer, .. } = &mut self.state {
      if *timer == Some(fired) {
        *timer = None;
      }
    }
  }

  /// Take the pending timer, if any, so it can be canceled.
  pub(crate) fn take_timer(&mut self) -> Option<TimerId> {
    match &mut self.state {
      VisibilityState::Appeared { timer, .. } => timer.take(),
      VisibilityState::Unseen | VisibilityState::Notified => None,
    }
  }
}
