//! Imagedrawer - metadata core of a media gallery drawer
//!
//! This library crate exposes the drawer logic for the CLI and for
//! integration testing.

pub mod client;
pub mod config;
pub mod context;
pub mod descriptor;
pub mod display;
pub mod error;
pub mod familiar;
pub mod filter;
pub mod gate;
pub mod loader;

pub use error::{DrawerError, Result};
