//! Avatar loader - circular avatar view with a download progress ring.
//!
//! This crate downloads a remote image, shows it masked to a circle with a
//! progress ring swept during the download, and keeps a bounded in-memory
//! cache so repeated requests skip the network.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing the loader and its adapters.
pub mod infrastructure;
/// Presentation layer containing the avatar view and the terminal screen.
pub mod presentation;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "avatar-loader";
