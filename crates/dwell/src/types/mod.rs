/*! Core types for dwell tracking.

Regenerate TypeScript types: `cargo test` (ts-rs exports to `bindings/`)
*/

#![allow(missing_docs)]

mod error;
mod event;
mod geometry;
mod ids;
mod options;

pub use error::{TrackerError, TrackerResult};
pub use event::{Event, Phase, SessionInfo};
pub use geometry::{Bounds, Size, Visibility};
pub use ids::{ElementId, SessionId, TimerId};
pub use options::{TrackOptions, DEFAULT_DELAY_MS};
