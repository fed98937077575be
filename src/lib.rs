// Public API for integration tests and potential library usage

pub mod content;
pub mod protocol;
pub mod state;
pub mod types;
pub mod watcher;
pub mod ws;
