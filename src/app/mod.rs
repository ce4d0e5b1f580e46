//! Binary-side wiring: CLI value sources, config merging, and engine inputs.

pub(crate) mod config_runtime;
