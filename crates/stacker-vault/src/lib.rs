//! # stacker-vault
//!
//! File system side of recipe stacking.
//!
//! Markdown documents are the authoritative recipe content. This crate
//! owns how they are reached ([`RecipeFs`]), how the bundled set is copied
//! into writable storage on first run ([`AssetSeeder`]), and the fill-once
//! in-memory [`ContentCache`] shared by the store and the sync client.

pub mod bundle;
pub mod content;
pub mod fs;
pub mod seeder;

pub use bundle::{BundleFs, BundledAsset};
pub use content::ContentCache;
pub use fs::{LocalFs, RecipeFs};
pub use seeder::{AssetSeeder, SeedReport, SeedStatus};
