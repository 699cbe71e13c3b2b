// Library crate for integration tests.
// main.rs has its own mod declarations; this re-exports all modules.

pub mod backend;
pub mod config;
pub mod duration;
pub mod error;
pub mod model;
pub mod poller;
pub mod routes;
pub mod server;
pub mod settings;
pub mod state;
pub mod view;
