pub mod action;
pub mod chain;
pub mod config;
pub mod describe;
pub mod editor;
pub mod error;
pub mod executor;
pub mod io;
pub mod notice;
pub mod paths;
pub mod plugins;
pub mod resolver;
pub mod session;
pub mod store;
pub mod types;

pub use error::{CueError, Result};
