/*!
Method-name dispatch for hosts that expose a single entry point.

Bridges that forward `tracker(method, args)`-style calls (for example from a
script binding) go through [`invoke`]; Rust callers use the typed methods on
[`Tracker`] directly.
*/

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::core::{Callback, SessionHandle, Targets, Tracker};
use crate::platform::Platform;
use crate::types::{TrackOptions, TrackerError, TrackerResult};

/// Known entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
  Init,
  Refresh,
}

impl std::str::FromStr for Method {
  type Err = TrackerError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "init" => Ok(Self::Init),
      "refresh" => Ok(Self::Refresh),
      other => Err(TrackerError::UnsupportedMethod(other.to_string())),
    }
  }
}

/// Outcome of [`invoke`].
#[derive(Debug)]
pub enum Invocation<P: Platform> {
  /// A new session was started.
  Tracking(SessionHandle<P>),
  /// Every session was refreshed.
  Refreshed,
  /// The method name was not recognized. Nothing happened.
  Unsupported(String),
}

/// Dispatch a call.
///
/// `method` may be a method name (`"init"`, `"refresh"`), an options object
/// (shorthand for init), or null (init with defaults). For `"init"`, `args`
/// holds the options object. Unknown names are logged and reported as
/// [`Invocation::Unsupported`] rather than failing.
pub fn invoke<P: Platform>(
  tracker: &Tracker<P>,
  targets: Targets<P>,
  method: &JsonValue,
  args: &JsonValue,
  callback: Option<Callback<P::Handle>>,
) -> TrackerResult<Invocation<P>> {
  let (method, options) = match method {
    JsonValue::String(name) => match name.parse::<Method>() {
      Ok(m) => (m, args),
      Err(e) => {
        log::warn!("[rpc] {e}");
        return Ok(Invocation::Unsupported(name.clone()));
      }
    },
    JsonValue::Object(_) | JsonValue::Null => (Method::Init, method),
    JsonValue::Bool(_) | JsonValue::Number(_) | JsonValue::Array(_) => {
      log::warn!("[rpc] Method not supported: {method}");
      return Ok(Invocation::Unsupported(method.to_string()));
    }
  };

  match method {
    Method::Init => {
      let options = parse_options(options)?;
      Ok(Invocation::Tracking(tracker.track(targets, options, callback)))
    }
    Method::Refresh => {
      tracker.refresh();
      Ok(Invocation::Refreshed)
    }
  }
}

fn parse_options(value: &JsonValue) -> TrackerResult<TrackOptions> {
  if value.is_null() {
    return Ok(TrackOptions::default());
  }
  Ok(TrackOptions::deserialize(value)?)
}
