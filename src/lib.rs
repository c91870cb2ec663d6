//! Library crate for cluequiz, exposing the session core to the binary and integration tests.

pub mod config;
pub mod dao;
pub mod error;
pub mod input;
pub mod services;
pub mod state;
