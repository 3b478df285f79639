use crate::error::{EngineError, EngineResult};
use crate::predicate::SelectionPredicate;
use crate::registry::{Registry, TableHandle};
use brushwork_table::Table;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Identifies one binding; returned by `bind` and consumed by `unbind`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(u64);

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Cooperative cancellation shared between the host and a running tick.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// What a callback sees while a tick is running.
pub struct TickContext<'a> {
    pub table: &'a str,
    pub predicate: &'a SelectionPredicate,
    /// Position of `predicate` in the table's history.
    pub history_index: usize,
    pub filtered: &'a Table,
    /// Registry as left by the callbacks that already ran in this tick.
    pub registry: &'a Registry,
    pub cancel: &'a CancellationToken,
}

/// How a callback wants the registry updated once it returns.
#[derive(Debug)]
pub enum TickOutput {
    Unchanged,
    /// Swap the handle of an existing table, keeping its history.
    Replace(TableHandle),
    /// Register a fresh derived table (empty history).
    Register(TableHandle),
}

pub type TickCallback = Box<dyn FnMut(&TickContext<'_>) -> anyhow::Result<TickOutput> + Send>;

struct Binding {
    id: BindingId,
    callback: TickCallback,
}

/// Result of one successful tick.
#[derive(Clone, Debug)]
pub struct TickReport {
    pub table: String,
    pub history_len: usize,
    pub filtered: Table,
    /// Bindings invoked, in invocation order.
    pub invoked: Vec<BindingId>,
    /// Tables registered or replaced by callbacks, in the order it happened.
    pub touched: Vec<String>,
}

/// Table name → callbacks, in registration order.
#[derive(Default)]
pub struct TickEngine {
    bindings: HashMap<String, Vec<Binding>>,
    next_id: u64,
}

impl fmt::Debug for TickEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<&str, usize> = self
            .bindings
            .iter()
            .map(|(name, list)| (name.as_str(), list.len()))
            .collect();
        f.debug_struct("TickEngine")
            .field("bindings", &counts)
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl TickEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a binding for `table`. The table does not need to exist yet.
    pub fn bind(&mut self, table: &str, callback: TickCallback) -> EngineResult<BindingId> {
        if table.trim().is_empty() {
            return Err(EngineError::User(
                "cannot bind to an unnamed table".to_string(),
            ));
        }
        let id = BindingId(self.next_id);
        self.next_id += 1;
        self.bindings
            .entry(table.to_string())
            .or_default()
            .push(Binding { id, callback });
        log::debug!("bound {id} to {table}");
        Ok(id)
    }

    /// Removes a binding. Returns `false` if it was not bound.
    pub fn unbind(&mut self, id: BindingId) -> bool {
        let Some((table, pos)) = self.bindings.iter().find_map(|(table, list)| {
            list.iter()
                .position(|b| b.id == id)
                .map(|pos| (table.clone(), pos))
        }) else {
            return false;
        };
        if let Some(list) = self.bindings.get_mut(&table) {
            list.remove(pos);
            if list.is_empty() {
                self.bindings.remove(&table);
            }
        }
        log::debug!("unbound {id} from {table}");
        true
    }

    /// Whether any binding targets `table`.
    pub fn is_bound(&self, table: &str) -> bool {
        self.bindings.contains_key(table)
    }

    pub fn binding_ids(&self, table: &str) -> Vec<BindingId> {
        self.bindings
            .get(table)
            .map(|list| list.iter().map(|b| b.id).collect())
            .unwrap_or_default()
    }

    /// Appends `predicate` to `table`'s history, evaluates it, and runs every binding on
    /// `table` in registration order.
    ///
    /// The first failing (or cancelled) callback aborts the tick. The history append and the
    /// registry updates made by earlier callbacks are kept.
    pub fn tick(
        &mut self,
        registry: &mut Registry,
        table: &str,
        predicate: SelectionPredicate,
        cancel: &CancellationToken,
    ) -> EngineResult<TickReport> {
        let source = registry.require(table)?.handle().table();
        predicate.check_columns(table, source)?;
        let filtered = crate::predicate::evaluate(source, &predicate)?;

        let history_len = registry.append_predicate(table, predicate.clone())?.history().len();
        let history_index = history_len - 1;

        let mut invoked = Vec::new();
        let mut touched = Vec::new();
        if let Some(bindings) = self.bindings.get_mut(table) {
            log::debug!("tick on {table}: {} binding(s)", bindings.len());
            for binding in bindings.iter_mut() {
                if cancel.is_cancelled() {
                    return Err(EngineError::Cancelled {
                        table: table.to_string(),
                    });
                }

                let output = {
                    let ctx = TickContext {
                        table,
                        predicate: &predicate,
                        history_index,
                        filtered: &filtered,
                        registry,
                        cancel,
                    };
                    (binding.callback)(&ctx)
                };
                invoked.push(binding.id);

                match output.map_err(|source| EngineError::Callback {
                    table: table.to_string(),
                    binding: binding.id,
                    source,
                })? {
                    TickOutput::Unchanged => {}
                    TickOutput::Replace(handle) => {
                        touched.push(handle.name().to_string());
                        registry.replace_handle(handle)?;
                    }
                    TickOutput::Register(handle) => {
                        touched.push(handle.name().to_string());
                        registry.register_table(handle, false)?;
                    }
                }
            }
        }

        Ok(TickReport {
            table: table.to_string(),
            history_len,
            filtered,
            invoked,
            touched,
        })
    }
}
