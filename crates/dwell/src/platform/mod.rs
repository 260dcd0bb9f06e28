/*!
Host platform integration.

- `traits.rs` - `Platform` contract the tracker is generic over
- `manual.rs` - deterministic in-memory platform
- `thread.rs` - thread-backed timers for native hosts
*/

mod manual;
mod thread;
mod traits;

pub use manual::{ManualElement, ManualPlatform};
pub use thread::ThreadTimers;
pub use traits::{Platform, PlatformHandle, TimerTask};
