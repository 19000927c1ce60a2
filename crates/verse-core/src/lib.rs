//! Verse Core - Foundational types for verse image generation
//!
//! This crate provides the core types that the other verse crates depend on:
//! - `OutputId` - Canonical file names of generated illustrations
//! - `ContentHash` - SHA-256 based content hashing
//! - Error types and Result alias

mod error;
mod hash;
mod id;

pub use error::{Result, VerseError};
pub use hash::ContentHash;
pub use id::OutputId;
