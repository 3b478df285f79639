use crate::error::{EngineError, EngineResult};
use crate::predicate::SelectionPredicate;
use crate::shelf::Shelf;
use brushwork_table::{Table, TableError, TableResult};
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type DerivationFn = dyn Fn(&Table) -> TableResult<Table> + Send + Sync;

/// Recipe for re-materializing a table from another (source) table.
#[derive(Clone)]
pub struct Derivation {
    source: String,
    apply: Arc<DerivationFn>,
}

impl Derivation {
    pub fn new<F>(source: impl Into<String>, apply: F) -> Self
    where
        F: Fn(&Table) -> TableResult<Table> + Send + Sync + 'static,
    {
        Self {
            source: source.into(),
            apply: Arc::new(apply),
        }
    }

    /// Rows of `base` whose `key` appears in the (filtered) source table. Each base row appears
    /// at most once.
    pub fn selection_join(source: impl Into<String>, base: Table, key: impl Into<String>) -> Self {
        let key = key.into();
        Self::new(source, move |selected| {
            let column = selected
                .column(&key)
                .cloned()
                .ok_or_else(|| TableError::UnknownColumn { column: key.clone() })?;
            let keys = Table::from_rows(
                vec![column],
                selected.unique_values(&key)?.into_iter().map(|v| vec![v]),
            )?;
            base.inner_join(&keys, &key)
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn apply(&self, input: &Table) -> TableResult<Table> {
        (self.apply)(input)
    }
}

impl fmt::Debug for Derivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Derivation")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// A named table plus an optional recipe for rebuilding it.
#[derive(Clone, Debug)]
pub struct TableHandle {
    name: String,
    table: Arc<Table>,
    derivation: Option<Derivation>,
}

impl TableHandle {
    pub fn new(name: impl Into<String>, table: Table) -> Self {
        Self {
            name: name.into(),
            table: Arc::new(table),
            derivation: None,
        }
    }

    pub fn with_derivation(mut self, derivation: Derivation) -> Self {
        self.derivation = Some(derivation);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn derivation(&self) -> Option<&Derivation> {
        self.derivation.as_ref()
    }

    /// Rebuilds this table from `source` using its derivation, keeping name and derivation.
    /// Returns `None` for tables that were not derived.
    pub fn rematerialize(&self, source: &Table) -> Option<TableResult<TableHandle>> {
        let derivation = self.derivation.as_ref()?;
        Some(derivation.apply(source).map(|table| TableHandle {
            name: self.name.clone(),
            table: Arc::new(table),
            derivation: Some(derivation.clone()),
        }))
    }
}

/// Per-table state: the current handle and the ordered selection history.
#[derive(Clone, Debug)]
pub struct TableState {
    handle: TableHandle,
    created_at: DateTime<Local>,
    history: Vec<SelectionPredicate>,
}

impl TableState {
    fn new(handle: TableHandle) -> Self {
        Self {
            handle,
            created_at: Local::now(),
            history: Vec::new(),
        }
    }

    pub fn handle(&self) -> &TableHandle {
        &self.handle
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    /// Every predicate ever ticked on this table, oldest first. Never shrinks.
    pub fn history(&self) -> &[SelectionPredicate] {
        &self.history
    }

    pub fn current_selection(&self) -> Option<&SelectionPredicate> {
        self.history.last()
    }
}

/// State changes the protocol layer needs to mirror to the front-end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryEvent {
    Registered { name: String, is_base: bool },
    HandleReplaced { name: String },
    Removed { name: String },
}

/// Named tables, their selection histories, and the selection shelf.
#[derive(Debug, Default)]
pub struct Registry {
    tables: HashMap<String, TableState>,
    shelf: Shelf,
    events: Vec<RegistryEvent>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `handle` under its name with an empty history, discarding any previous entry.
    pub fn register_table(&mut self, handle: TableHandle, is_base: bool) -> EngineResult<&TableState> {
        let name = checked_name(handle.name())?;
        log::debug!("registering table {name} (base: {is_base})");
        self.tables.insert(name.clone(), TableState::new(handle));
        self.events.push(RegistryEvent::Registered {
            name: name.clone(),
            is_base,
        });
        self.get(&name)
            .ok_or_else(|| EngineError::UnknownTable(name.clone()))
    }

    /// Swaps the handle of an existing table, keeping its history. Unknown names are registered
    /// as derived tables.
    pub fn replace_handle(&mut self, handle: TableHandle) -> EngineResult<&TableState> {
        let name = checked_name(handle.name())?;
        match self.tables.get_mut(&name) {
            Some(state) => {
                log::debug!("replacing handle of {name}");
                state.handle = handle;
                self.events
                    .push(RegistryEvent::HandleReplaced { name: name.clone() });
            }
            None => {
                self.register_table(handle, false)?;
            }
        }
        self.get(&name)
            .ok_or_else(|| EngineError::UnknownTable(name.clone()))
    }

    pub fn append_predicate(
        &mut self,
        name: &str,
        predicate: SelectionPredicate,
    ) -> EngineResult<&TableState> {
        let state = self
            .tables
            .get_mut(name)
            .ok_or_else(|| EngineError::UnknownTable(name.to_string()))?;
        state.history.push(predicate);
        Ok(&*state)
    }

    pub fn get(&self, name: &str) -> Option<&TableState> {
        self.tables.get(name)
    }

    pub fn require(&self, name: &str) -> EngineResult<&TableState> {
        self.get(name)
            .ok_or_else(|| EngineError::UnknownTable(name.to_string()))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<TableState> {
        let removed = self.tables.remove(name)?;
        self.events.push(RegistryEvent::Removed {
            name: name.to_string(),
        });
        Some(removed)
    }

    /// Registered table names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn shelf(&self) -> &Shelf {
        &self.shelf
    }

    pub fn shelf_mut(&mut self) -> &mut Shelf {
        &mut self.shelf
    }

    /// Pins the current selection of `name` and returns the shelf name.
    pub fn pin_current(&mut self, name: &str) -> EngineResult<String> {
        let predicate = self
            .require(name)?
            .current_selection()
            .cloned()
            .ok_or_else(|| EngineError::User(format!("no selection on {name} yet")))?;
        Ok(self.shelf.pin(predicate, name))
    }

    /// Takes the events recorded since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<RegistryEvent> {
        std::mem::take(&mut self.events)
    }
}

fn checked_name(name: &str) -> EngineResult<String> {
    if name.trim().is_empty() {
        return Err(EngineError::User(
            "tables must be named to take part in selections".to_string(),
        ));
    }
    Ok(name.to_string())
}
