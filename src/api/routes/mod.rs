//! API Routes
//!
//! Route handlers organized by functionality.

pub mod command;
pub mod devices;
pub mod health;
pub mod orders;
