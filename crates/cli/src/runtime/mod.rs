//! Runtime module: boot (logging, config) and the per-file run.

pub mod boot;
pub mod run;
