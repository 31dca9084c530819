//! # stacker-index
//!
//! SQLite recipe metadata store.
//!
//! Holds the queryable metadata for every known recipe and acts as a
//! read-through cache over the markdown documents:
//! - `recipes` table with JSON columns for titles, tags, and provenance
//! - first [`RecipeStore::list_all`] on an empty table scans the ordinary
//!   namespace, then the stacked one, and persists what it parses
//! - once the table is non-empty it is never re-scanned

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rusqlite::{params, Connection, OptionalExtension};

use stacker_core::error::{Result, StackError};
use stacker_core::markdown::{is_placeholder, parse_metadata};
use stacker_core::recipe::{Provenance, Recipe, STACKED_NAMESPACE};
use stacker_vault::fs::join_reference;
use stacker_vault::ContentCache;

fn index_err(e: rusqlite::Error) -> StackError {
    StackError::Index(e.to_string())
}

const SELECT_COLUMNS: &str = "SELECT id, titles, description, file_reference, tags, provenance
     FROM recipes";

/// The RecipeStore manages the SQLite metadata database.
pub struct RecipeStore {
    conn: Mutex<Connection>,
    content: Arc<ContentCache>,
    populated: AtomicBool,
}

impl RecipeStore {
    /// Open or create a store database at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::Index`] if the database cannot be opened.
    pub fn open(path: &Path, content: Arc<ContentCache>) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(index_err)?;
        Self::with_connection(conn, content)
    }

    /// Create an in-memory store (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns [`StackError::Index`] if schema creation fails.
    pub fn in_memory(content: Arc<ContentCache>) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(index_err)?;
        Self::with_connection(conn, content)
    }

    fn with_connection(conn: Connection, content: Arc<ContentCache>) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(conn),
            content,
            populated: AtomicBool::new(false),
        };
        store.create_schema()?;
        Ok(store)
    }

    fn create_schema(&self) -> Result<()> {
        self.conn()
            .execute_batch(
                "
            CREATE TABLE IF NOT EXISTS recipes (
                id TEXT PRIMARY KEY,
                titles TEXT NOT NULL,
                description TEXT,
                file_reference TEXT NOT NULL,
                tags TEXT,
                provenance TEXT
            );
            ",
            )
            .map_err(index_err)?;

        Ok(())
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The content cache this store populates from.
    pub fn content(&self) -> &Arc<ContentCache> {
        &self.content
    }

    /// Save a recipe, replacing any record with the same id in full.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::Parse`] if the record violates recipe
    /// invariants, or [`StackError::Index`] if the write fails.
    pub fn save(&self, recipe: &Recipe) -> Result<()> {
        recipe.validate()?;

        let titles = serde_json::to_string(&recipe.titles)?;
        let tags = recipe.tags.as_ref().map(serde_json::to_string).transpose()?;
        let provenance = recipe
            .provenance
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        self.conn()
            .execute(
                "INSERT OR REPLACE INTO recipes
                (id, titles, description, file_reference, tags, provenance)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    recipe.id,
                    titles,
                    recipe.description,
                    recipe.file_reference,
                    tags,
                    provenance,
                ],
            )
            .map_err(index_err)?;

        Ok(())
    }

    /// Fresh recipe identifier. Not checked against stored ids.
    pub fn generate_id(&self) -> String {
        stacker_core::generate_id()
    }

    /// All recipes, populating the store from the markdown documents when it
    /// is empty.
    ///
    /// Ids are file stems, so when two documents share a stem the first one
    /// scanned (ordinary before stacked) wins and the other is skipped.
    ///
    /// Population happens at most once per store: after the table holds any
    /// record, documents added or removed later are not picked up. Two
    /// callers racing on an empty store may both scan; the upserts make the
    /// second scan redundant rather than harmful.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::Index`] on database failures and
    /// [`StackError::Io`] if a namespace cannot be listed. Individual
    /// documents that fail to load or parse are skipped.
    pub fn list_all(&self) -> Result<Vec<Recipe>> {
        if self.populated.load(Ordering::Acquire) {
            return self.load_all();
        }

        let saved = self.load_all()?;
        if !saved.is_empty() {
            self.populated.store(true, Ordering::Release);
            return Ok(saved);
        }

        let scanned = self.populate()?;
        if !scanned.is_empty() {
            self.populated.store(true, Ordering::Release);
        }
        Ok(scanned)
    }

    /// Whether the store has been populated (or found non-empty).
    pub fn is_populated(&self) -> bool {
        self.populated.load(Ordering::Acquire)
    }

    fn populate(&self) -> Result<Vec<Recipe>> {
        let mut recipes = Vec::new();
        let mut seen = HashSet::new();
        for namespace in ["", STACKED_NAMESPACE] {
            for name in self.content.fs().list_markdown(namespace)? {
                let reference = join_reference(namespace, &name);
                let Some(recipe) = self.scan_document(&reference) else {
                    continue;
                };
                if !seen.insert(recipe.id.clone()) {
                    tracing::warn!(
                        reference = %reference,
                        id = %recipe.id,
                        "Recipe id already taken by an earlier document; skipping"
                    );
                    continue;
                }
                self.save(&recipe)?;
                recipes.push(recipe);
            }
        }

        tracing::info!(count = recipes.len(), "Populated recipe store from documents");
        Ok(recipes)
    }

    fn scan_document(&self, reference: &str) -> Option<Recipe> {
        let content = match self.content.get_content(reference) {
            Ok(content) if is_placeholder(&content) => {
                tracing::warn!(reference, "Recipe vanished during scan; skipping");
                return None;
            }
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(reference, error = %e, "Failed to load recipe; skipping");
                return None;
            }
        };

        match parse_metadata(&content, reference) {
            Ok(recipe) => Some(recipe),
            Err(e) => {
                tracing::warn!(reference, error = %e, "Failed to parse recipe; skipping");
                None
            }
        }
    }

    /// All stored recipes, without populating.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::Index`] if the query fails, or
    /// [`StackError::Serialization`] if a stored column is not valid JSON.
    pub fn load_all(&self) -> Result<Vec<Recipe>> {
        let rows = {
            let conn = self.conn();
            let mut stmt = conn
                .prepare(&format!("{SELECT_COLUMNS} ORDER BY rowid"))
                .map_err(index_err)?;
            let rows = stmt
                .query_map([], RecipeRow::from_row)
                .map_err(index_err)?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(index_err)?;
            rows
        };

        rows.into_iter().map(RecipeRow::into_recipe).collect()
    }

    /// Fetch one recipe by id.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::Index`] if the query fails.
    pub fn get(&self, id: &str) -> Result<Option<Recipe>> {
        let row = self
            .conn()
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id],
                RecipeRow::from_row,
            )
            .optional()
            .map_err(index_err)?;

        row.map(RecipeRow::into_recipe).transpose()
    }

    /// Get count of stored recipes.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::Index`] if the query fails.
    pub fn count(&self) -> Result<u64> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM recipes", [], |row| row.get(0))
            .map_err(index_err)?;
        Ok(count as u64)
    }
}

/// A recipe as stored, before its JSON columns are decoded.
struct RecipeRow {
    id: String,
    titles: String,
    description: Option<String>,
    file_reference: String,
    tags: Option<String>,
    provenance: Option<String>,
}

impl RecipeRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            titles: row.get(1)?,
            description: row.get(2)?,
            file_reference: row.get(3)?,
            tags: row.get(4)?,
            provenance: row.get(5)?,
        })
    }

    fn into_recipe(self) -> Result<Recipe> {
        let tags: Option<Vec<String>> = self
            .tags
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;
        let provenance: Option<Provenance> = self
            .provenance
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;

        Ok(Recipe {
            titles: serde_json::from_str(&self.titles)?,
            description: self.description.unwrap_or_default(),
            file_reference: self.file_reference,
            tags,
            provenance,
            id: self.id,
        })
    }
}
