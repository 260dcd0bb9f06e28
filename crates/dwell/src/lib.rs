/*!
Dwell - dwell-time visibility tracking

Tells you when elements have been in the viewport for a while, once per
visibility episode.

```ignore
use dwell::{TrackOptions, Tracker, Trigger};

// The platform supplies viewport size, element bounds, selector resolution and timers
let tracker = Tracker::new(platform);

// Deliver `.card` elements once any part has been visible for 500ms
let session = tracker.track_selector(".card".into(), TrackOptions::default().delay_ms(500), |cards| {
    for card in cards {
        // lazy-load, animate in, count an impression
    }
});

// Forward host events
tracker.handle_trigger(Trigger::Scroll);

// Elements were inserted or removed: re-resolve every selector
tracker.refresh();

// Stop tracking
session.untrack()?;
```
*/

mod core;
mod types;

pub mod platform;
pub mod rpc;

pub use types::*;

pub use crate::core::{Callback, SessionHandle, Targets, Tracker, TrackerBuilder, Trigger};
