// GachaSniff - core/mod.rs
//
// Core business logic layer.
// Dependencies: standard library, regex, serde/toml for rule definitions.
// Must NOT depend on: platform, app, or spawn processes.

pub mod devices;
pub mod matcher;
pub mod model;
pub mod rules;
pub mod selector;
