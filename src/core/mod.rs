//! Core modules for Carapace's grid and knowledge cascade.
//!
//! This is the whole of the crate: coordinate and cell codecs, sparse layer
//! storage with lazy hydration, and the cascading tile knowledge index.

pub mod cascade;
pub mod cell;
pub mod config;
pub mod coordinate;
pub mod error;
pub mod layer;
pub mod manager;
