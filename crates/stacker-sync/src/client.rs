//! Combining two recipes into a new stacked recipe.

use std::sync::Arc;

use stacker_core::error::{Result, StackError};
use stacker_core::markdown::is_placeholder;
use stacker_core::Recipe;
use stacker_index::RecipeStore;
use stacker_vault::ContentCache;

use crate::merge::MergeService;
use crate::secrets::ApiKeyProvider;

/// Merges recipes through a [`MergeService`] and records the result in the
/// file system and the [`RecipeStore`].
pub struct SyncClient {
    store: Arc<RecipeStore>,
    content: Arc<ContentCache>,
    keys: ApiKeyProvider,
    merger: Arc<dyn MergeService>,
}

impl SyncClient {
    pub fn new(
        store: Arc<RecipeStore>,
        keys: ApiKeyProvider,
        merger: Arc<dyn MergeService>,
    ) -> Self {
        let content = store.content().clone();
        Self {
            store,
            content,
            keys,
            merger,
        }
    }

    /// Provision the API secret from configuration ahead of the first merge.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::Config`] if no secret is configured.
    pub fn initialize_api(&self) -> Result<()> {
        self.keys.provision().map(|_| ())
    }

    /// Combine `first` and `second` into a new stacked recipe.
    ///
    /// The merged document is written to the stacked namespace before its
    /// metadata is saved; if the process dies between the two, the file is
    /// left without a record. Nothing is saved when any earlier step fails.
    ///
    /// # Errors
    ///
    /// - [`StackError::NotFound`] if either source document is missing
    /// - [`StackError::Config`] if no API secret is stored or configured
    /// - [`StackError::Remote`] / [`StackError::Network`] if the merge call fails
    /// - [`StackError::Io`] / [`StackError::Index`] if persisting the result fails
    pub async fn combine(&self, first: &Recipe, second: &Recipe) -> Result<Recipe> {
        let first_content = self.load_source(first)?;
        let second_content = self.load_source(second)?;

        let api_key = self.keys.api_key()?;
        let merged = self
            .merger
            .merge(&api_key, &first_content, &second_content)
            .await?;

        let recipe = Recipe::stacked_from(self.store.generate_id(), first, second);
        self.content.fs().write(&recipe.file_reference, &merged)?;
        self.store.save(&recipe)?;

        tracing::info!(
            id = %recipe.id,
            first = %first.id,
            second = %second.id,
            "Combined recipes"
        );
        Ok(recipe)
    }

    fn load_source(&self, recipe: &Recipe) -> Result<String> {
        let content = self.content.get_content(&recipe.file_reference)?;
        if is_placeholder(&content) {
            return Err(StackError::NotFound(format!(
                "recipe '{}' has no document at '{}'",
                recipe.id, recipe.file_reference
            )));
        }
        Ok(content)
    }
}
