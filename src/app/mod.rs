// GachaSniff - app/mod.rs
//
// Application layer: session orchestration and rule loading.
// Dependencies: core and platform layers.

pub mod rule_mgr;
pub mod session;
