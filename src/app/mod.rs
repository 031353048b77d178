//! Binary-side helpers: terminal setup and console output.

pub(crate) mod output;
pub(crate) mod terminal;
