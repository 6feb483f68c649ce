//! m365ctl: a command line client for Microsoft 365 REST APIs.
//!
//! Commands live in [`cmd`], one module per service. Each command validates
//! its options, calls a service client from [`graph`] and renders the JSON
//! result through [`output`].

pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod graph;
pub mod output;
pub mod util;

pub use error::{M365Error, Result};
