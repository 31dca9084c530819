//! Recipe markdown parsing.
//!
//! Recipe documents carry their metadata in the leading lines rather than
//! in a frontmatter block:
//! ```markdown
//! # Tomato Soup
//! > Simple and warm
//! ---
//! ## Ingredients
//! ...
//! ```
//! The first `# ` line is the title, the first `> ` line is the
//! description, and the body shown to the user is whatever follows the
//! last `---` separator line.

use crate::error::{Result, StackError};
use crate::recipe::{is_stacked_reference, Recipe, RECIPE_EXTENSION, STACKED_TAG};

const TITLE_MARKER: &str = "# ";
const QUOTE_MARKER: &str = "> ";
const NOT_FOUND_LINE: &str = "> Recipe not found";

/// Body returned when a requested recipe document does not exist.
pub const MISSING_RECIPE_BODY: &str = "# Recipe not found";

/// Derive the recipe id from a file reference: the file name without its
/// directory or `.md` extension.
///
/// # Errors
///
/// Returns [`StackError::Parse`] if the reference has no usable file stem.
pub fn id_from_reference(file_reference: &str) -> Result<&str> {
    let name = file_reference.rsplit('/').next().unwrap_or(file_reference);
    let stem = name
        .strip_suffix(RECIPE_EXTENSION)
        .and_then(|s| s.strip_suffix('.'))
        .unwrap_or(name);

    if stem.trim().is_empty() {
        return Err(StackError::Parse(format!(
            "cannot derive a recipe id from '{file_reference}'"
        )));
    }
    Ok(stem)
}

/// First line starting with `marker`, with the marker removed.
fn first_marked_line<'a>(content: &'a str, marker: &str) -> Option<&'a str> {
    content
        .lines()
        .find_map(|line| line.strip_prefix(marker))
        .map(str::trim_end)
}

/// Parse a recipe document's leading metadata into a [`Recipe`].
///
/// The title defaults to the file stem when no title line exists. Documents
/// in the stacked namespace are tagged as stacked; their provenance is not
/// recorded in the file and stays unset.
///
/// # Errors
///
/// Returns [`StackError::Parse`] if no id can be derived from the reference.
pub fn parse_metadata(content: &str, file_reference: &str) -> Result<Recipe> {
    let id = id_from_reference(file_reference)?;

    let title = first_marked_line(content, TITLE_MARKER)
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(id);
    let description = first_marked_line(content, QUOTE_MARKER).unwrap_or_default();

    let mut recipe = Recipe::single(id, title, description, file_reference);
    if is_stacked_reference(file_reference) {
        recipe.tags = Some(vec![STACKED_TAG.to_string()]);
    }
    Ok(recipe)
}

fn is_separator(line: &str) -> bool {
    let line = line.trim_end_matches('\r');
    line.len() >= 3 && line.bytes().all(|b| b == b'-')
}

/// The displayable body of a recipe document: the last segment after a
/// `---` separator line, trimmed. Documents without a separator are
/// returned whole.
///
/// A separator needs a line on each side: dashes on the first line, or on a
/// final line with no trailing newline, are body text.
pub fn recipe_body(content: &str) -> &str {
    let mut start = 0;
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let first = offset == 0;
        offset += line.len();
        if let Some(text) = line.strip_suffix('\n') {
            if !first && is_separator(text) {
                start = offset;
            }
        }
    }
    content[start..].trim()
}

/// Placeholder document substituted for a missing recipe file.
pub fn not_found_placeholder(file_reference: &str) -> String {
    format!("{TITLE_MARKER}{file_reference}\n{NOT_FOUND_LINE}")
}

/// Whether `content` is the placeholder produced by [`not_found_placeholder`].
pub fn is_placeholder(content: &str) -> bool {
    let mut lines = content.lines();
    matches!(
        (lines.next(), lines.next(), lines.next()),
        (Some(title), Some(NOT_FOUND_LINE), None) if title.starts_with(TITLE_MARKER)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SOUP: &str = "# Tomato Soup\n> Simple and warm\n---\nBody text";

    #[test]
    fn parses_title_and_description() {
        let recipe = parse_metadata(SOUP, "soup.md").unwrap();
        assert_eq!(recipe.id, "soup");
        assert_eq!(recipe.titles, vec!["Tomato Soup"]);
        assert_eq!(recipe.description, "Simple and warm");
        assert_eq!(recipe.file_reference, "soup.md");
        assert_eq!(recipe.tags, None);
        assert_eq!(recipe.provenance, None);
    }

    #[test]
    fn title_defaults_to_file_stem() {
        let recipe = parse_metadata("Just some text\nno markers", "plain-notes.md").unwrap();
        assert_eq!(recipe.titles, vec!["plain-notes"]);
        assert_eq!(recipe.description, "");
    }

    #[test]
    fn uses_first_matching_lines_only() {
        let content = "intro\n# First\n> One\n# Second\n> Two\n";
        let recipe = parse_metadata(content, "multi.md").unwrap();
        assert_eq!(recipe.titles, vec!["First"]);
        assert_eq!(recipe.description, "One");
    }

    #[test]
    fn heading_levels_below_one_are_not_titles() {
        let recipe = parse_metadata("## Subheading\n>quote without space", "sub.md").unwrap();
        assert_eq!(recipe.titles, vec!["sub"]);
        assert_eq!(recipe.description, "");
    }

    #[test]
    fn stacked_documents_are_tagged() {
        let recipe = parse_metadata("# Soup Bread", "stacked/1234.md").unwrap();
        assert_eq!(recipe.id, "1234");
        assert!(recipe.is_stacked());
        assert_eq!(recipe.provenance, None);
    }

    #[test]
    fn rejects_reference_without_stem() {
        assert!(parse_metadata(SOUP, ".md").is_err());
        assert!(parse_metadata(SOUP, "stacked/").is_err());
    }

    #[test]
    fn strips_carriage_returns() {
        let recipe = parse_metadata("# Soup\r\n> Warm\r\n", "soup.md").unwrap();
        assert_eq!(recipe.titles, vec!["Soup"]);
        assert_eq!(recipe.description, "Warm");
    }

    #[test]
    fn body_takes_last_segment() {
        assert_eq!(recipe_body(SOUP), "Body text");
        let content = "# A\n---\nfirst\n-----\n\n  second part \n";
        assert_eq!(recipe_body(content), "second part");
    }

    #[test]
    fn dashes_at_document_edges_are_not_separators() {
        assert_eq!(recipe_body("# A\n---\nsteps\n---"), "steps\n---");
        assert_eq!(recipe_body("---\n# A\nsteps"), "---\n# A\nsteps");
        assert_eq!(recipe_body("---\n# A\n---\nsteps"), "steps");
    }

    #[test]
    fn body_without_separator_is_whole_document() {
        assert_eq!(recipe_body("# A\n> b\n\nsteps\n"), "# A\n> b\n\nsteps");
    }

    #[test]
    fn placeholder_is_detected() {
        let placeholder = not_found_placeholder("stacked/gone.md");
        assert!(is_placeholder(&placeholder));
        assert!(!is_placeholder(SOUP));
        assert!(!is_placeholder("# Real\n> Recipe not found\nand a body"));

        let recipe = parse_metadata(&placeholder, "stacked/gone.md").unwrap();
        assert_eq!(recipe.titles, vec!["stacked/gone.md"]);
    }

    proptest! {
        #[test]
        fn parsed_metadata_matches_marked_lines(
            title in "[A-Za-z][A-Za-z0-9 ]{0,30}",
            description in proptest::option::of("[A-Za-z0-9 ,.]{0,40}"),
            body in "[a-z \n]{0,80}",
        ) {
            let title = title.trim_end().to_string();
            let mut content = format!("# {title}\n");
            if let Some(d) = &description {
                content.push_str(&format!("> {d}\n"));
            }
            content.push_str("---\n");
            content.push_str(&body);

            let recipe = parse_metadata(&content, "generated.md").unwrap();
            prop_assert_eq!(recipe.titles, vec![title]);
            let expected = description.map(|d| d.trim_end().to_string()).unwrap_or_default();
            prop_assert_eq!(recipe.description, expected);
        }

        #[test]
        fn documents_without_title_use_stem(
            stem in "[a-z][a-z0-9-]{0,20}",
            body in "[a-z \n]{0,80}",
        ) {
            let reference = format!("{stem}.md");
            let recipe = parse_metadata(&body, &reference).unwrap();
            prop_assert_eq!(recipe.titles, vec![stem.clone()]);
            prop_assert_eq!(recipe.id, stem);
        }
    }
}
