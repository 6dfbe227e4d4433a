//! Building blocks shared by services

/// Watchable value slot
pub mod property;

pub use property::Property;
