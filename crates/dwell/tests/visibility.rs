//! End-to-end visibility tracking against the in-memory platform.

use dwell::platform::{ManualElement, ManualPlatform, Platform};
use dwell::{
  Bounds, Callback, Event, Phase, Size, Targets, TimerId, TrackOptions, Tracker, TrackerError,
  Trigger,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Calls = Arc<Mutex<Vec<Vec<ManualElement>>>>;

const A: ManualElement = ManualElement(1);
const B: ManualElement = ManualElement(2);
const C: ManualElement = ManualElement(3);

fn ms(n: u64) -> Duration {
  Duration::from_millis(n)
}

fn inside() -> Bounds {
  Bounds::from_edges(10.0, 10.0, 50.0, 50.0)
}

fn below() -> Bounds {
  Bounds::new(10.0, 2000.0, 40.0, 40.0)
}

fn tracker() -> Tracker<ManualPlatform> {
  Tracker::new(ManualPlatform::new(Size::new(1000.0, 800.0)))
}

fn recorder() -> (Callback<ManualElement>, Calls) {
  let calls: Calls = Arc::new(Mutex::new(Vec::new()));
  let sink = Arc::clone(&calls);
  let callback: Callback<ManualElement> = Arc::new(move |batch: &[ManualElement]| {
    sink.lock().unwrap().push(batch.to_vec());
  });
  (callback, calls)
}

fn calls_of(calls: &Calls) -> Vec<Vec<ManualElement>> {
  calls.lock().unwrap().clone()
}

fn options(delay: u32) -> TrackOptions {
  TrackOptions::default().delay_ms(delay)
}

fn track_fixed(
  t: &Tracker<ManualPlatform>,
  elements: Vec<ManualElement>,
  options: TrackOptions,
) -> (dwell::SessionHandle<ManualPlatform>, Calls) {
  let (callback, calls) = recorder();
  let handle = t.track(Targets::Elements(elements), options, Some(callback));
  (handle, calls)
}

mod notification {
  use super::*;

  #[test]
  fn notifies_exactly_once_per_episode() {
    let t = tracker();
    t.platform().set_bounds(A, inside());
    let (_session, calls) = track_fixed(&t, vec![A], options(1000));

    for _ in 0..9 {
      t.platform().advance(ms(100));
      t.handle_trigger(Trigger::Scroll);
    }
    assert!(calls_of(&calls).is_empty(), "dwell not over at 900ms");

    t.platform().advance(ms(100));
    assert_eq!(calls_of(&calls), vec![vec![A]]);

    for _ in 0..20 {
      t.platform().advance(ms(250));
      t.handle_trigger(Trigger::Scroll);
      t.handle_trigger(Trigger::Resize);
    }
    assert_eq!(calls_of(&calls).len(), 1, "never delivered twice");
  }

  #[test]
  fn notifies_again_after_leaving_and_returning() {
    let t = tracker();
    t.platform().set_bounds(A, inside());
    let (session, calls) = track_fixed(&t, vec![A], options(500));

    t.platform().advance(ms(500));
    assert_eq!(calls_of(&calls).len(), 1);

    t.platform().set_bounds(A, below());
    t.handle_trigger(Trigger::Scroll);
    assert_eq!(t.phase(session.id(), &A), Some(Phase::Unseen));

    t.platform().set_bounds(A, inside());
    t.handle_trigger(Trigger::Scroll);
    assert_eq!(t.phase(session.id(), &A), Some(Phase::Armed));

    t.platform().advance(ms(500));
    assert_eq!(calls_of(&calls), vec![vec![A], vec![A]]);
  }

  #[test]
  fn leaving_before_dwell_cancels() {
    let t = tracker();
    t.platform().set_bounds(A, inside());
    let (_session, calls) = track_fixed(&t, vec![A], options(1000));
    assert_eq!(t.platform().pending_timers(), 1);

    t.platform().advance(ms(600));
    t.platform().set_bounds(A, below());
    t.handle_trigger(Trigger::Scroll);
    assert_eq!(t.platform().pending_timers(), 0, "timer canceled on exit");

    t.platform().advance(ms(5000));
    assert!(calls_of(&calls).is_empty());
  }

  #[test]
  fn returning_restarts_the_dwell() {
    let t = tracker();
    t.platform().set_bounds(A, inside());
    let (_session, calls) = track_fixed(&t, vec![A], options(1000));

    t.platform().advance(ms(600));
    t.platform().set_bounds(A, below());
    t.handle_trigger(Trigger::Scroll);
    t.platform().set_bounds(A, inside());
    t.handle_trigger(Trigger::Scroll);

    t.platform().advance(ms(999));
    assert!(calls_of(&calls).is_empty(), "time before the exit does not count");
    t.platform().advance(ms(1));
    assert_eq!(calls_of(&calls), vec![vec![A]]);
  }

  #[test]
  fn timer_revalidates_geometry() {
    let t = tracker();
    t.platform().set_bounds(A, inside());
    let (session, calls) = track_fixed(&t, vec![A], options(1000));

    // Scrolled away with no scroll event reaching the tracker.
    t.platform().advance(ms(400));
    t.platform().set_bounds(A, below());
    t.platform().advance(ms(600));

    assert!(calls_of(&calls).is_empty());
    assert_eq!(t.phase(session.id(), &A), Some(Phase::Unseen));
  }

  #[test]
  fn already_visible_elements_start_dwell_at_registration() {
    let t = tracker();
    t.platform().set_bounds(A, inside());
    t.platform().set_bounds(B, below());
    let (session, calls) = track_fixed(&t, vec![A, B], options(300));

    assert_eq!(t.phase(session.id(), &A), Some(Phase::Armed));
    assert_eq!(t.phase(session.id(), &B), Some(Phase::Unseen));

    t.platform().advance(ms(300));
    assert_eq!(calls_of(&calls), vec![vec![A]]);
  }

  #[test]
  fn zero_delay_notifies_on_next_tick() {
    let t = tracker();
    t.platform().set_bounds(A, inside());
    let (_session, calls) = track_fixed(&t, vec![A], options(0));
    assert!(calls_of(&calls).is_empty(), "never within the registering poll");

    t.platform().advance(Duration::ZERO);
    assert_eq!(calls_of(&calls), vec![vec![A]]);
  }

  #[test]
  fn confirmation_clears_pending_timer() {
    let t = tracker();
    t.platform().set_bounds(A, inside());
    let (session, calls) = track_fixed(&t, vec![A], options(1000));
    assert_eq!(t.platform().pending_timers(), 1);

    t.platform().advance(ms(999));
    t.handle_trigger(Trigger::Scroll);
    assert!(calls_of(&calls).is_empty());

    t.platform().advance(ms(1));
    t.handle_trigger(Trigger::Scroll);
    assert_eq!(calls_of(&calls), vec![vec![A]]);
    assert_eq!(t.phase(session.id(), &A), Some(Phase::Notified));
    assert_eq!(t.platform().pending_timers(), 0);
  }
}

mod geometry {
  use super::*;

  #[test]
  fn edge_touching_element_never_notifies() {
    let t = tracker();
    t.platform().set_bounds(A, Bounds::from_edges(-40.0, 10.0, 0.0, 50.0));
    let (session, calls) = track_fixed(&t, vec![A], options(100));

    for _ in 0..10 {
      t.platform().advance(ms(100));
      t.handle_trigger(Trigger::Scroll);
    }
    assert!(calls_of(&calls).is_empty());
    assert_eq!(t.phase(session.id(), &A), Some(Phase::Unseen));
    assert_eq!(t.platform().pending_timers(), 0);
  }

  #[test]
  fn completely_visible_requires_whole_element() {
    let t = tracker();
    t.platform()
      .set_bounds(A, Bounds::from_edges(10.0, 10.0, 50.0, 1001.0));
    t.platform().set_bounds(B, inside());
    let (_session, calls) = track_fixed(
      &t,
      vec![A, B],
      options(1000).completely_visible(true),
    );

    t.platform().advance(ms(1000));
    t.handle_trigger(Trigger::Scroll);
    t.platform().advance(ms(5000));
    t.handle_trigger(Trigger::Scroll);

    assert_eq!(calls_of(&calls), vec![vec![B]]);
  }

  #[test]
  fn any_part_accepts_partially_visible() {
    let t = tracker();
    t.platform()
      .set_bounds(A, Bounds::from_edges(10.0, 10.0, 50.0, 1001.0));
    let (_session, calls) = track_fixed(&t, vec![A], options(1000));

    t.platform().advance(ms(1000));
    assert_eq!(calls_of(&calls), vec![vec![A]]);
  }

  #[test]
  fn resize_can_bring_elements_into_view() {
    let t = tracker();
    t.platform().set_bounds(A, Bounds::new(10.0, 900.0, 40.0, 40.0));
    let (session, calls) = track_fixed(&t, vec![A], options(200));
    assert_eq!(t.phase(session.id(), &A), Some(Phase::Unseen));

    t.platform().set_viewport(Size::new(1000.0, 1200.0));
    t.handle_trigger(Trigger::Resize);
    t.platform().advance(ms(200));
    assert_eq!(calls_of(&calls), vec![vec![A]]);
  }
}

mod batching {
  use super::*;

  #[test]
  fn simultaneous_confirmations_share_one_call() {
    let t = tracker();
    for e in [A, B, C] {
      t.platform().set_bounds(e, inside());
    }
    let (_session, calls) = track_fixed(&t, vec![A, B, C], options(500));

    t.platform().advance(ms(500));
    assert_eq!(calls_of(&calls), vec![vec![A, B, C]]);
  }

  #[test]
  fn staggered_appearances_get_separate_batches() {
    let t = tracker();
    t.platform().set_bounds(A, inside());
    t.platform().set_bounds(B, below());
    let (_session, calls) = track_fixed(&t, vec![A, B], options(500));

    t.platform().advance(ms(200));
    t.platform().set_bounds(B, inside());
    t.handle_trigger(Trigger::Scroll);

    t.platform().advance(ms(300));
    assert_eq!(calls_of(&calls), vec![vec![A]]);
    t.platform().advance(ms(200));
    assert_eq!(calls_of(&calls), vec![vec![A], vec![B]]);
  }

  #[test]
  fn empty_element_set_never_calls_back() {
    let t = tracker();
    let (callback, calls) = recorder();
    let session = t.track(
      Targets::Selector(".nothing".to_string()),
      options(0),
      Some(callback),
    );
    t.platform().advance(ms(1000));
    t.handle_trigger(Trigger::Load);
    assert!(calls_of(&calls).is_empty());
    assert_eq!(session.info().unwrap().elements, 0);
  }
}

mod refresh {
  use super::*;

  #[test]
  fn picks_up_inserted_elements_with_their_own_dwell() {
    let t = tracker();
    t.platform().set_bounds(A, inside());
    t.platform().set_matches(".item", vec![A]);
    let (callback, calls) = recorder();
    let session = t.track(
      Targets::Selector(".item".to_string()),
      options(1000),
      Some(callback),
    );

    t.platform().advance(ms(1000));
    assert_eq!(calls_of(&calls), vec![vec![A]]);

    t.platform().set_bounds(B, inside());
    t.platform().set_matches(".item", vec![A, B]);
    assert_eq!(t.phase(session.id(), &B), None, "not tracked before refresh");

    t.refresh();
    assert_eq!(t.phase(session.id(), &B), Some(Phase::Armed));
    assert_eq!(t.phase(session.id(), &A), Some(Phase::Notified), "kept elements keep state");
    assert_eq!(calls_of(&calls).len(), 1, "no notification at refresh");

    t.platform().advance(ms(999));
    assert_eq!(calls_of(&calls).len(), 1);
    t.platform().advance(ms(1));
    assert_eq!(calls_of(&calls), vec![vec![A], vec![B]]);
  }

  #[test]
  fn removed_elements_drop_their_timers() {
    let t = tracker();
    t.platform().set_bounds(A, inside());
    t.platform().set_matches(".item", vec![A]);
    let (callback, calls) = recorder();
    let session = t.track(
      Targets::Selector(".item".to_string()),
      options(1000),
      Some(callback),
    );
    assert_eq!(t.platform().pending_timers(), 1);

    t.platform().set_matches(".item", vec![]);
    t.refresh();
    assert_eq!(t.platform().pending_timers(), 0);
    assert_eq!(t.elements(session.id()), Some(vec![]));

    t.platform().advance(ms(2000));
    assert!(calls_of(&calls).is_empty());
  }

  #[test]
  fn refresh_touches_every_session() {
    let t = tracker();
    t.platform().set_matches(".a", vec![]);
    t.platform().set_matches(".b", vec![]);
    let first = t.track(Targets::Selector(".a".to_string()), options(100), None);
    let second = t.track(Targets::Selector(".b".to_string()), options(100), None);

    t.platform().set_bounds(A, inside());
    t.platform().set_bounds(B, inside());
    t.platform().set_matches(".a", vec![A]);
    t.platform().set_matches(".b", vec![B]);
    t.refresh();

    assert_eq!(t.elements(first.id()), Some(vec![A]));
    assert_eq!(t.elements(second.id()), Some(vec![B]));
  }

  #[test]
  fn fixed_element_sets_survive_refresh() {
    let t = tracker();
    t.platform().set_bounds(A, inside());
    let (session, _calls) = track_fixed(&t, vec![A], options(1000));
    t.refresh();
    assert_eq!(t.elements(session.id()), Some(vec![A]));
    assert_eq!(t.phase(session.id(), &A), Some(Phase::Armed));
  }

  #[test]
  fn selector_only_re_resolves_on_refresh() {
    let t = tracker();
    t.platform().set_matches(".item", vec![A]);
    let session = t.track(Targets::Selector(".item".to_string()), options(100), None);

    t.platform().set_matches(".item", vec![A, B]);
    t.handle_trigger(Trigger::Scroll);
    assert_eq!(t.elements(session.id()), Some(vec![A]));
  }
}

mod cancellation {
  use super::*;

  #[test]
  fn repeated_exits_never_error_or_notify() {
    let t = tracker();
    t.platform().set_bounds(A, inside());
    let (session, calls) = track_fixed(&t, vec![A], options(1000));

    t.platform().set_bounds(A, below());
    for _ in 0..5 {
      t.handle_trigger(Trigger::Scroll);
      t.platform().advance(ms(300));
    }
    session.poll().unwrap();
    t.platform().cancel(TimerId(u64::MAX));

    t.platform().advance(ms(5000));
    assert!(calls_of(&calls).is_empty());
    assert_eq!(t.platform().pending_timers(), 0);
  }

  #[test]
  fn untrack_cancels_pending_timers() {
    let t = tracker();
    t.platform().set_bounds(A, inside());
    let (session, calls) = track_fixed(&t, vec![A], options(1000));
    let id = session.id();
    assert_eq!(t.platform().pending_timers(), 1);

    session.untrack().unwrap();
    assert_eq!(t.platform().pending_timers(), 0);
    assert!(t.sessions().is_empty());

    t.platform().advance(ms(2000));
    t.handle_trigger(Trigger::Scroll);
    assert!(calls_of(&calls).is_empty());

    assert!(matches!(t.untrack(id), Err(TrackerError::SessionNotFound(s)) if s == id));
    assert!(matches!(t.poll(id), Err(TrackerError::SessionNotFound(_))));
  }
}

mod sessions {
  use super::*;

  #[test]
  fn sessions_are_independent() {
    let t = tracker();
    t.platform().set_bounds(A, inside());
    let (fast, fast_calls) = track_fixed(&t, vec![A], options(500));
    let (slow, slow_calls) = track_fixed(&t, vec![A], options(1000));

    assert_ne!(t.element_id(fast.id(), &A), t.element_id(slow.id(), &A));

    t.platform().advance(ms(500));
    assert_eq!(calls_of(&fast_calls), vec![vec![A]]);
    assert!(calls_of(&slow_calls).is_empty());

    t.platform().advance(ms(500));
    assert_eq!(calls_of(&slow_calls), vec![vec![A]]);
    assert_eq!(t.sessions(), vec![fast.id(), slow.id()]);
  }

  #[test]
  fn missing_callback_still_tracks() {
    let t = tracker();
    t.platform().set_bounds(A, inside());
    let session = t.track(Targets::Elements(vec![A]), options(100), None);

    t.platform().advance(ms(100));
    assert_eq!(t.phase(session.id(), &A), Some(Phase::Notified));
    let info = session.info().unwrap();
    assert!(!info.has_callback);
    assert_eq!(info.notified, 1);
  }

  #[test]
  fn element_ids_round_trip() {
    let t = tracker();
    t.platform().set_bounds(A, inside());
    let (session, _calls) = track_fixed(&t, vec![A, B], options(100));
    let id = t.element_id(session.id(), &B).unwrap();
    assert_eq!(t.element(session.id(), id), Some(B));
  }

  #[test]
  fn duplicate_elements_are_tracked_once() {
    let t = tracker();
    t.platform().set_bounds(A, inside());
    let (session, calls) = track_fixed(&t, vec![A, A, A], options(100));
    assert_eq!(t.elements(session.id()), Some(vec![A]));

    t.platform().advance(ms(100));
    assert_eq!(calls_of(&calls), vec![vec![A]]);
  }
}

mod callbacks {
  use super::*;

  #[test]
  fn callbacks_can_reenter_the_tracker() {
    let t = tracker();
    t.platform().set_bounds(A, inside());
    let reentrant = t.clone();
    let (inner, calls) = recorder();
    let callback: Callback<ManualElement> = Arc::new(move |batch: &[ManualElement]| {
      inner(batch);
      reentrant.refresh();
      reentrant.handle_trigger(Trigger::Scroll);
    });
    let session = t.track(Targets::Elements(vec![A]), options(100), Some(callback));

    t.platform().advance(ms(100));
    assert_eq!(calls_of(&calls), vec![vec![A]]);
    assert_eq!(t.phase(session.id(), &A), Some(Phase::Notified));
  }

  #[test]
  #[should_panic(expected = "consumer bug")]
  fn callback_panics_reach_the_host() {
    let t = tracker();
    t.platform().set_bounds(A, inside());
    let callback: Callback<ManualElement> = Arc::new(|_: &[ManualElement]| panic!("consumer bug"));
    t.track(Targets::Elements(vec![A]), options(0), Some(callback));
    t.platform().advance(Duration::ZERO);
  }
}

mod events {
  use super::*;

  fn drain(rx: &mut async_broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
      events.push(event);
    }
    events
  }

  #[test]
  fn episode_emits_lifecycle_events() {
    let t = tracker();
    let mut rx = t.subscribe();
    t.platform().set_bounds(A, inside());
    let (session, _calls) = track_fixed(&t, vec![A], options(100));
    let element_id = t.element_id(session.id(), &A).unwrap();

    t.platform().advance(ms(100));
    t.platform().set_bounds(A, below());
    t.handle_trigger(Trigger::Scroll);
    session.untrack().unwrap();

    let events = drain(&mut rx);
    let session_id = created_session(&events);
    assert_eq!(
      events.into_iter().skip(1).collect::<Vec<_>>(),
      vec![
        Event::ElementAppeared {
          session_id,
          element_id
        },
        Event::ElementsVisible {
          session_id,
          element_ids: vec![element_id]
        },
        Event::ElementLeft {
          session_id,
          element_id,
          was_notified: true
        },
        Event::SessionRemoved { session_id },
      ]
    );
  }

  fn created_session(events: &[Event]) -> dwell::SessionId {
    match events.first() {
      Some(Event::SessionCreated { session }) => session.session_id,
      other => panic!("expected session:created first, got {other:?}"),
    }
  }

  #[test]
  fn refresh_reports_added_and_removed() {
    let t = tracker();
    t.platform().set_matches(".item", vec![A]);
    let session = t.track(Targets::Selector(".item".to_string()), options(100), None);
    let a_id = t.element_id(session.id(), &A).unwrap();
    let mut rx = t.subscribe();

    t.platform().set_matches(".item", vec![B]);
    t.refresh();
    let b_id = t.element_id(session.id(), &B).unwrap();

    assert_eq!(
      drain(&mut rx),
      vec![Event::SessionRefreshed {
        session_id: session.id(),
        added: vec![b_id],
        removed: vec![a_id],
      }]
    );
  }

  #[test]
  fn refresh_reports_removals_in_resolution_order() {
    let t = tracker();
    let items: Vec<ManualElement> = [7, 3, 12, 1, 9, 4, 20, 15].map(ManualElement).to_vec();
    t.platform().set_matches(".item", items.clone());
    let session = t.track(Targets::Selector(".item".to_string()), options(100), None);
    let ids: Vec<_> = items
      .iter()
      .map(|e| t.element_id(session.id(), e).unwrap())
      .collect();
    let mut rx = t.subscribe();

    t.platform().set_matches(".item", vec![ManualElement(12)]);
    t.refresh();

    let kept = ids[2];
    let expected: Vec<_> = ids.iter().copied().filter(|id| *id != kept).collect();
    assert_eq!(
      drain(&mut rx),
      vec![Event::SessionRefreshed {
        session_id: session.id(),
        added: vec![],
        removed: expected,
      }]
    );
  }
}
