//! # Domain Models
//!
//! This crate contains pure domain types with a single dependency (`serde`).
//! Keep it lean: no I/O or heavy logic, just data and simple helpers.

pub mod blob;
pub mod config;
pub mod constants;

pub use blob::Blob;
