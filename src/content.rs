//! Static content tables and random assignment
//!
//! The theme list and the category→keyword map are read-only data baked
//! into the binary. Category picks prefer categories nobody at the table
//! is currently playing with.

use rand::seq::IndexedRandom;
use std::collections::{BTreeMap, HashSet};

use crate::types::CategoryId;

const THEMES_JSON: &str = include_str!("../data/themes.json");
const CATEGORIES_JSON: &str = include_str!("../data/categories.json");

pub struct Content {
    themes: Vec<String>,
    /// BTreeMap so the candidate order is stable across runs
    categories: BTreeMap<CategoryId, Vec<String>>,
}

impl Content {
    /// Parse the bundled tables. Panics only on a broken build (the data
    /// files ship inside the binary).
    pub fn from_embedded() -> Self {
        let themes: Vec<String> =
            serde_json::from_str(THEMES_JSON).expect("bundled themes.json is valid");
        let categories: BTreeMap<CategoryId, Vec<String>> =
            serde_json::from_str(CATEGORIES_JSON).expect("bundled categories.json is valid");
        Self { themes, categories }
    }

    pub fn pick_theme(&self) -> String {
        let mut rng = rand::rng();
        self.themes.choose(&mut rng).cloned().unwrap_or_default()
    }

    /// Uniform pick over categories outside `excluding`. Falls back to the
    /// whole table when the exclusion covers every category, so collisions
    /// happen only when there is no alternative.
    pub fn pick_category(&self, excluding: &HashSet<CategoryId>) -> CategoryId {
        let mut rng = rand::rng();
        let available: Vec<&CategoryId> = self
            .categories
            .keys()
            .filter(|c| !excluding.contains(*c))
            .collect();
        let pool: Vec<&CategoryId> = if available.is_empty() {
            self.categories.keys().collect()
        } else {
            available
        };
        pool.choose(&mut rng)
            .map(|c| (*c).clone())
            .unwrap_or_default()
    }

    /// Full keyword list for a category (empty for an unknown category)
    pub fn keywords(&self, category: &str) -> Vec<String> {
        self.categories.get(category).cloned().unwrap_or_default()
    }

    /// Random sample without replacement, for partial keyword hints
    pub fn pick_keywords(&self, category: &str, count: usize) -> Vec<String> {
        let mut rng = rand::rng();
        self.categories
            .get(category)
            .map(|words| words.choose_multiple(&mut rng, count).cloned().collect())
            .unwrap_or_default()
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_are_non_empty() {
        let content = Content::from_embedded();
        assert!(!content.pick_theme().is_empty());
        assert!(content.category_count() >= 2);
    }

    #[test]
    fn test_pick_category_respects_exclusion() {
        let content = Content::from_embedded();
        let mut excluding = HashSet::new();
        excluding.insert(content.pick_category(&HashSet::new()));

        for _ in 0..100 {
            let picked = content.pick_category(&excluding);
            assert!(!excluding.contains(&picked));
        }
    }

    #[test]
    fn test_pick_category_falls_back_when_all_excluded() {
        let content = Content::from_embedded();
        let mut all = HashSet::new();
        while all.len() < content.category_count() {
            all.insert(content.pick_category(&HashSet::new()));
        }

        let picked = content.pick_category(&all);
        assert!(all.contains(&picked));
    }

    #[test]
    fn test_pick_keywords_samples_without_replacement() {
        let content = Content::from_embedded();
        let category = content.pick_category(&HashSet::new());
        let full = content.keywords(&category);
        assert!(!full.is_empty());

        let sample = content.pick_keywords(&category, 3.min(full.len()));
        assert_eq!(sample.len(), 3.min(full.len()));
        let unique: HashSet<_> = sample.iter().collect();
        assert_eq!(unique.len(), sample.len());
        for word in &sample {
            assert!(full.contains(word));
        }
    }

    #[test]
    fn test_unknown_category_has_no_keywords() {
        let content = Content::from_embedded();
        assert!(content.keywords("no-such-category").is_empty());
        assert!(content.pick_keywords("no-such-category", 3).is_empty());
    }
}
