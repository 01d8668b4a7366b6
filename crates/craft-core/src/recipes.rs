//! Recipe document loading and validation.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use craft_contracts::RecipeBook;
use thiserror::Error;
use tracing::{debug, warn};

use crate::method::method_item;

#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("failed to read recipes from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid recipe document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("name declared more than once in Items/Tools: {0}")]
    DuplicateName(String),

    #[error("recipe with an empty name")]
    EmptyRecipeName,
}

/// Read, parse, and validate a recipe document.
pub fn load_recipe_book(path: impl AsRef<Path>) -> Result<RecipeBook, RecipeError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| RecipeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let book = RecipeBook::from_json_str(&raw)?;
    validate(&book)?;
    debug!(
        path = %path.display(),
        items = book.items.len(),
        tools = book.tools.len(),
        recipes = book.recipes.len(),
        "recipe book loaded"
    );
    Ok(book)
}

/// Reject documents the compiler cannot handle deterministically.
///
/// Names outside the declared vocabulary are allowed; they read as zero until
/// something produces them.
pub fn validate(book: &RecipeBook) -> Result<(), RecipeError> {
    let mut declared = BTreeSet::new();
    for name in book.vocabulary() {
        if !declared.insert(name) {
            return Err(RecipeError::DuplicateName(name.to_string()));
        }
    }

    for (recipe, rule) in &book.recipes {
        if recipe.trim().is_empty() {
            return Err(RecipeError::EmptyRecipeName);
        }
        if rule.is_noop() {
            warn!(recipe = %recipe, "recipe has no requirements or effects");
        }
        for item in rule.referenced_items() {
            if !declared.contains(item) {
                debug!(recipe = %recipe, item, "recipe references undeclared name");
            }
        }
        let target = method_item(recipe, rule);
        if !rule.produces.is_empty() && !rule.produces.contains_key(&target) {
            debug!(recipe = %recipe, target = %target, "method target is not produced");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn duplicate_vocabulary_is_rejected() {
        let book = RecipeBook::from_json_str(r#"{"Items": ["wood"], "Tools": ["wood"]}"#)
            .expect("parses");
        assert!(matches!(
            validate(&book),
            Err(RecipeError::DuplicateName(name)) if name == "wood"
        ));
    }

    #[test]
    fn empty_recipe_name_is_rejected() {
        let book = RecipeBook::from_json_str(r#"{"Recipes": {" ": {}}}"#).expect("parses");
        assert!(matches!(validate(&book), Err(RecipeError::EmptyRecipeName)));
    }

    #[test]
    fn undeclared_names_are_allowed() {
        let book = RecipeBook::from_json_str(
            r#"{"Items": ["wood"], "Recipes": {"plank": {"Consumes": {"wood": 1}, "Produces": {"plank": 1}}}}"#,
        )
        .expect("parses");
        validate(&book).expect("undeclared plank is fine");
    }

    #[test]
    fn load_reports_missing_file() {
        let err = load_recipe_book("/definitely/not/here/crafting.json").expect_err("missing");
        assert!(matches!(err, RecipeError::Io { .. }));
        assert!(err.to_string().contains("crafting.json"));
    }

    #[test]
    fn load_reads_and_validates_file() {
        let path = std::env::temp_dir().join(format!(
            "craft-core-recipes-{}.json",
            std::process::id()
        ));
        {
            let mut file = fs::File::create(&path).expect("create temp file");
            file.write_all(
                br#"{"Items": ["wood"], "Recipes": {"punch for wood": {"Produces": {"wood": 1}, "Time": 4}}}"#,
            )
            .expect("write temp file");
        }
        let book = load_recipe_book(&path).expect("loads");
        fs::remove_file(&path).ok();
        assert_eq!(book.recipes.len(), 1);
    }

    #[test]
    fn load_reports_parse_errors() {
        let path = std::env::temp_dir().join(format!(
            "craft-core-broken-{}.json",
            std::process::id()
        ));
        fs::write(&path, "{ not json").expect("write temp file");
        let err = load_recipe_book(&path).expect_err("broken");
        fs::remove_file(&path).ok();
        assert!(matches!(err, RecipeError::Parse(_)));
    }
}
