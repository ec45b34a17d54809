// Test helpers shared by the integration tests.
//
// Usage:
//   #[path = "../helpers/mod.rs"]
//   mod helpers;
//   use helpers::*;

#![allow(dead_code)]


pub use test_data::*;
pub use test_state::*;
