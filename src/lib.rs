//! Library crate for usrdir-manager.
//!
//! This crate exposes the building blocks of the TUI:
//! - Domain types and the wire shapes of the users API (`model`)
//! - Mapping between the two record shapes (`mapper`)
//! - Form validation (`validate`)
//! - HTTP client for the users API (`remote`)
//! - Search, filter, sort and pagination (`query`)
//! - Dataset ownership and mutations (`store`)
//! - Worker thread that runs remote calls for the UI (`bridge`)
//! - Command line options and config lookup (`config`)
//! - Application state and update loop (`app`)
//! - UI rendering and widgets (`ui`)
//!
//! It is used by the `usrdir-manager` binary and by tests.
#![doc = include_str!("../README.md")]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod app;
pub mod bridge;
pub mod config;
pub mod error;
pub mod mapper;
pub mod model;
pub mod query;
pub mod remote;
pub mod store;
pub mod ui;
pub mod validate;

/// Error and result types shared across the crate.
pub use error::{Error, RemoteError, Result};
