//! Interactive command-line client.
//!
//! Reads one command token per line, resolves it through a versioned
//! method table and drives the session manager. Notifications are printed
//! by a separate task so they never wait on user input.

mod dispatcher;
pub mod formatting;
mod printer;
mod registry;
mod types;

#[cfg(test)]
mod tests;

pub use dispatcher::{DispatchSettings, Dispatcher, DispatcherState};
pub use printer::EventPrinter;
pub use registry::MethodRegistry;
pub use types::{
    Action, ArgDefaults, ArgSpec, ArgType, ArgValue, ArgValues, Category, CliError, Command,
    MethodDescriptor, Shortcut,
};
