// GachaSniff - lib.rs
//
// Library entry point, exposing all modules for integration testing.
// The binary (`main.rs`) only wires the console, CLI, and config together.

pub mod app;
pub mod core;
pub mod platform;
pub mod util;
