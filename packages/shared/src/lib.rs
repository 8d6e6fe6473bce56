//! Utilities shared between the Madoguchi binaries and tests.

pub mod logger;
pub mod time;
