//! Command implementations.

pub mod fetch;
pub mod run;
pub mod sync;
