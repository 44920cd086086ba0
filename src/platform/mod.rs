// GachaSniff - platform/mod.rs
//
// Platform abstraction layer: config files, platform directories, and the
// external bridge process.
// Dependencies: core (for data types), directories, serde_json.
// Must NOT depend on: app.

pub mod bridge;
pub mod config;
