//! # stacker-sync
//!
//! Combines two recipes into one through a remote merge endpoint.
//!
//! - [`SyncClient`]: loads both documents, calls the endpoint, writes the
//!   merged document under `stacked/`, and saves its metadata
//! - [`MergeService`] / [`HttpMergeService`]: the endpoint call
//! - [`ApiKeyProvider`] / [`SecretStore`]: the API secret, provisioned from
//!   configuration when the secret store is empty

pub mod client;
pub mod merge;
pub mod secrets;

pub use client::SyncClient;
pub use merge::{HttpMergeService, MergeService};
pub use secrets::{ApiKeyProvider, FileSecretStore, MemorySecretStore, SecretStore};
