//! Infrastructure configuration modules.

pub mod gateway;
pub mod logging;
pub mod settings;
