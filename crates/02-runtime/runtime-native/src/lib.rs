#![deny(missing_docs)]
//! Native session runtime: a driver and its triangulators on OS threads,
//! sharing one record store, plus the application-side [`Client`].

mod client;
mod config;
mod session;

pub use client::Client;
pub use config::SessionConfig;
pub use session::{Exit, Session};
