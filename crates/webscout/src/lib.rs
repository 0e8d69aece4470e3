//! A terminal chat client for Claude that can browse and scrape the web
//! through tools served by an MCP server.
//!
//! The crate includes a CLI tool for using in the terminal. The pieces it is
//! built from are also available as a library.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod config;
pub mod report;
mod session;
pub mod tools;

pub use session::{Session, SessionBuilder, is_exit_command};

/// Re-exports of [`webscout_core`] crate.
pub mod core {
    pub use webscout_core::*;
}
