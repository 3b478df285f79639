use crate::error::{EngineError, EngineResult};
use crate::predicate::SelectionPredicate;
use std::collections::BTreeMap;

/// A predicate the user pinned for reuse, detached from the live history of its table.
#[derive(Clone, Debug, PartialEq)]
pub struct ShelfEntry {
    pub predicate: SelectionPredicate,
    pub source_table: String,
}

/// Named, user-curated selection snapshots. Names are unique.
#[derive(Clone, Debug, Default)]
pub struct Shelf {
    entries: BTreeMap<String, ShelfEntry>,
}

impl Shelf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&ShelfEntry> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ShelfEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Pins a copy of `predicate` and returns the name it was stored under.
    pub fn pin(&mut self, predicate: SelectionPredicate, source_table: impl Into<String>) -> String {
        let source_table = source_table.into();
        let name = self.unique_name(&predicate.shelf_label(&source_table));
        log::debug!("pinning selection from {source_table} as {name}");
        self.entries.insert(
            name.clone(),
            ShelfEntry {
                predicate,
                source_table,
            },
        );
        name
    }

    pub fn rename(&mut self, old_name: &str, new_name: &str) -> EngineResult<()> {
        if old_name == new_name {
            return if self.contains(old_name) {
                Ok(())
            } else {
                Err(EngineError::UnknownShelfEntry(old_name.to_string()))
            };
        }
        if self.contains(new_name) {
            return Err(EngineError::DuplicateShelfEntry(new_name.to_string()));
        }
        let entry = self
            .entries
            .remove(old_name)
            .ok_or_else(|| EngineError::UnknownShelfEntry(old_name.to_string()))?;
        self.entries.insert(new_name.to_string(), entry);
        Ok(())
    }

    pub fn unpin(&mut self, name: &str) -> EngineResult<ShelfEntry> {
        self.entries
            .remove(name)
            .ok_or_else(|| EngineError::UnknownShelfEntry(name.to_string()))
    }

    /// `base` if free, otherwise `base_1`, `base_2`, ... (first free suffix).
    fn unique_name(&self, base: &str) -> String {
        if !self.contains(base) {
            return base.to_string();
        }
        let mut counter = 1usize;
        loop {
            let candidate = format!("{base}_{counter}");
            if !self.contains(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn repeated_collisions_get_increasing_suffixes() {
        let mut shelf = Shelf::new();
        let p = SelectionPredicate::range_1d("price", 1.0, 2.0);
        let names: Vec<String> = (0..4).map(|_| shelf.pin(p.clone(), "sales")).collect();
        assert_eq!(
            names,
            vec!["price_1_2", "price_1_2_1", "price_1_2_2", "price_1_2_3"]
        );
        assert_eq!(shelf.len(), 4);
    }

    #[test]
    fn rename_refuses_to_clobber() {
        let mut shelf = Shelf::new();
        let a = shelf.pin(SelectionPredicate::range_1d("a", 0.0, 1.0), "t");
        let b = shelf.pin(SelectionPredicate::range_1d("b", 0.0, 1.0), "t");
        assert!(matches!(
            shelf.rename(&a, &b),
            Err(EngineError::DuplicateShelfEntry(name)) if name == b
        ));
        shelf.rename(&a, "favourite").unwrap();
        assert!(shelf.contains("favourite"));
        assert!(!shelf.contains(&a));
        assert!(matches!(
            shelf.unpin(&a),
            Err(EngineError::UnknownShelfEntry(_))
        ));
    }
}
