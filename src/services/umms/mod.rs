/// Bus adapter trait and service constants
pub mod bus;
/// Player method calls and their results
pub mod call;
/// D-Bus implementation of the bus adapter
pub mod dbus;
/// Error types
pub mod error;
/// Notification listener tasks
mod listener;
/// Audio and video output objects
pub mod outputs;
/// D-Bus proxy trait definitions
pub mod proxy;
/// Player session lifecycle
pub mod session;
/// Notifications and decoded events
pub mod signals;
/// Paths, handles, states and value types
pub mod types;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

#[cfg(test)]
mod tests;

pub use bus::*;
pub use call::*;
pub use dbus::{BusKind, DbusPlayerBus};
pub use error::*;
pub(crate) use listener::{EventListener, ListenerContext};
pub use outputs::*;
pub use proxy::*;
pub use session::*;
pub use signals::*;
pub use types::*;
