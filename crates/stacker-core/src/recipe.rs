//! Recipe metadata, the sole domain entity.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StackError};

/// Tag carried by every recipe produced by merging two others.
pub const STACKED_TAG: &str = "stacked";

/// Sub-directory (relative to the documents root) holding stacked recipes.
pub const STACKED_NAMESPACE: &str = "stacked";

/// Extension of recipe documents.
pub const RECIPE_EXTENSION: &str = "md";

/// Metadata for one recipe. The full content lives in the markdown file
/// named by `file_reference`; this record is a projection of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    // === Identity ===
    pub id: String,

    // === Display ===
    pub titles: Vec<String>,
    #[serde(default)]
    pub description: String,

    // === Content location ===
    pub file_reference: String,

    // === Labels & lineage ===
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
}

/// The two source recipes a stacked recipe was merged from, in merge order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub first: String,
    pub second: String,
}

impl Recipe {
    /// An ordinary (non-stacked) recipe with a single title.
    pub fn single(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        file_reference: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            titles: vec![title.into()],
            description: description.into(),
            file_reference: file_reference.into(),
            tags: None,
            provenance: None,
        }
    }

    /// Metadata for the recipe produced by merging `first` and `second`.
    ///
    /// Titles are every title of `first` followed by every title of
    /// `second`; the description names only their primary titles.
    pub fn stacked_from(id: impl Into<String>, first: &Recipe, second: &Recipe) -> Self {
        let id = id.into();
        let description = format!(
            "A combination of {} and {}",
            first.primary_title(),
            second.primary_title()
        );
        Self {
            file_reference: stacked_reference(&id),
            description,
            titles: first.titles.iter().chain(&second.titles).cloned().collect(),
            tags: Some(vec![STACKED_TAG.to_string()]),
            provenance: Some(Provenance {
                first: first.id.clone(),
                second: second.id.clone(),
            }),
            id,
        }
    }

    /// The title shown for this recipe in lists.
    pub fn primary_title(&self) -> &str {
        self.titles.first().map(String::as_str).unwrap_or_default()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags
            .as_deref()
            .is_some_and(|tags| tags.iter().any(|t| t == tag))
    }

    pub fn is_stacked(&self) -> bool {
        self.has_tag(STACKED_TAG)
    }

    /// Check the record-level invariants before it is persisted.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::Parse`] if the id or titles are empty, or if a
    /// recipe with provenance lacks the stacked tag.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(StackError::Parse("recipe id must not be empty".to_string()));
        }
        if self.titles.is_empty() {
            return Err(StackError::Parse(format!(
                "recipe '{}' must have at least one title",
                self.id
            )));
        }
        if self.provenance.is_some() && !self.is_stacked() {
            return Err(StackError::Parse(format!(
                "recipe '{}' has provenance but no '{STACKED_TAG}' tag",
                self.id
            )));
        }
        Ok(())
    }
}

/// File reference for a stacked recipe with the given id.
pub fn stacked_reference(id: &str) -> String {
    format!("{STACKED_NAMESPACE}/{id}.{RECIPE_EXTENSION}")
}

/// Whether a file reference points into the stacked namespace.
pub fn is_stacked_reference(file_reference: &str) -> bool {
    file_reference
        .strip_prefix(STACKED_NAMESPACE)
        .is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stacked_from_joins_titles_in_merge_order() {
        let soup = Recipe::single("soup", "Tomato Soup", "Simple and warm", "soup.md");
        let bread = Recipe::single("bread", "Garlic Bread", "", "bread.md");

        let stacked = Recipe::stacked_from("abc", &soup, &bread);
        assert_eq!(stacked.titles, vec!["Tomato Soup", "Garlic Bread"]);
        assert_eq!(
            stacked.description,
            "A combination of Tomato Soup and Garlic Bread"
        );
        assert_eq!(stacked.file_reference, "stacked/abc.md");
        assert!(stacked.is_stacked());
        assert_eq!(
            stacked.provenance,
            Some(Provenance {
                first: "soup".to_string(),
                second: "bread".to_string(),
            })
        );
        stacked.validate().unwrap();
    }

    #[test]
    fn restacking_keeps_every_source_title() {
        let soup = Recipe::single("soup", "Tomato Soup", "", "soup.md");
        let bread = Recipe::single("bread", "Garlic Bread", "", "bread.md");
        let salad = Recipe::single("salad", "Salad", "", "salad.md");

        let lunch = Recipe::stacked_from("lunch", &soup, &bread);
        let feast = Recipe::stacked_from("feast", &lunch, &salad);
        assert_eq!(feast.titles.len(), lunch.titles.len() + salad.titles.len());
        assert_eq!(feast.titles, vec!["Tomato Soup", "Garlic Bread", "Salad"]);
        assert_eq!(feast.description, "A combination of Tomato Soup and Salad");
        feast.validate().unwrap();
    }

    #[test]
    fn validate_rejects_empty_titles() {
        let mut recipe = Recipe::single("soup", "Tomato Soup", "", "soup.md");
        recipe.titles.clear();
        assert!(recipe.validate().is_err());
    }

    #[test]
    fn validate_rejects_provenance_without_stacked_tag() {
        let mut recipe = Recipe::single("x", "X", "", "stacked/x.md");
        recipe.provenance = Some(Provenance {
            first: "a".to_string(),
            second: "b".to_string(),
        });
        assert!(recipe.validate().is_err());
    }

    #[test]
    fn recognizes_stacked_references() {
        assert!(is_stacked_reference("stacked/abc.md"));
        assert!(!is_stacked_reference("stacked.md"));
        assert!(!is_stacked_reference("soup.md"));
    }

    #[test]
    fn optional_fields_are_omitted_from_json() {
        let recipe = Recipe::single("soup", "Tomato Soup", "", "soup.md");
        let json = serde_json::to_value(&recipe).unwrap();
        assert!(json.get("tags").is_none());
        assert!(json.get("provenance").is_none());
    }
}
