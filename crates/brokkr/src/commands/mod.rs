//! Command implementations

pub mod list;
pub mod probe;
pub mod runtime;
pub mod select;
pub mod store;
