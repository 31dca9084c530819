//! # stacker-core
//!
//! Core types and parsing for recipe stacking.
//!
//! This crate defines the foundational types used across all other stacker crates:
//! - [`Recipe`]: recipe metadata, the projection of a markdown document
//! - [`Provenance`]: the source pair of a stacked recipe
//! - Error hierarchy ([`StackError`], [`Result`])
//! - Leading-line metadata parsing ([`markdown`])
//! - Layered configuration ([`StackConfig`], [`SyncConfig`])

pub mod config;
pub mod error;
pub mod id;
pub mod markdown;
pub mod recipe;

pub use config::{StackConfig, SyncConfig};
pub use error::{Result, StackError};
pub use id::generate_id;
pub use recipe::{Provenance, Recipe, STACKED_NAMESPACE, STACKED_TAG};
