//! Boba at Dawn library crate: re-exports all modules for integration testing.
//!
//! The binary crate (`main.rs`) is the headless game entry point.
//! This library crate exposes the same modules so that `tests/` integration
//! tests can import game types, systems, and resources without a window.

pub mod shared;
pub mod config;
pub mod grid;
pub mod time;
pub mod recipes;
pub mod brewing;
pub mod player;
pub mod npcs;
pub mod forest;
pub mod ritual;
pub mod save;
pub mod data;
