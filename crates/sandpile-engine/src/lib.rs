//! Sandpile engine crate.
//!
//! This crate owns the platform + GPU runtime pieces and the ping-pong sandpile
//! simulation that runs on top of them.

pub mod device;
pub mod window;
pub mod time;
pub mod core;

pub mod error;
pub mod logging;
pub mod render;
pub mod sandpile;
