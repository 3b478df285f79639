use crate::error::{EngineError, EngineResult};
use crate::predicate::{evaluate, SelectionPredicate};
use crate::registry::{Derivation, Registry, RegistryEvent, TableHandle, TableState};
use crate::stream::{SelectionEvent, SelectionStream};
use crate::tick::{
    BindingId, CancellationToken, TickCallback, TickContext, TickEngine, TickOutput, TickReport,
};
use brushwork_table::Table;
use std::str::FromStr;
use tokio::sync::mpsc;

/// Shape of [`SelectionEngine::current_selection`]'s answer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SelectionMode {
    #[default]
    Predicate,
    Data,
}

impl FromStr for SelectionMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "predicate" => Ok(SelectionMode::Predicate),
            "data" => Ok(SelectionMode::Data),
            other => Err(EngineError::User(format!(
                "selection mode must be \"predicate\" or \"data\", got {other:?}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum CurrentSelection {
    Predicate(SelectionPredicate),
    Data(Table),
}

/// Registry plus tick dispatcher: the whole single-writer reactive store.
#[derive(Debug, Default)]
pub struct SelectionEngine {
    registry: Registry,
    ticks: TickEngine,
}

impl SelectionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Registers a base table and returns its handle.
    pub fn register_table(&mut self, name: &str, table: Table) -> EngineResult<TableHandle> {
        let state = self
            .registry
            .register_table(TableHandle::new(name, table), true)?;
        Ok(state.handle().clone())
    }

    /// Registers a derived table (visualized rather than profiled).
    pub fn register_derived(&mut self, handle: TableHandle) -> EngineResult<&TableState> {
        self.registry.register_table(handle, false)
    }

    pub fn replace_handle(&mut self, handle: TableHandle) -> EngineResult<&TableState> {
        self.registry.replace_handle(handle)
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.registry.exists(name)
    }

    pub fn table_state(&self, name: &str) -> EngineResult<&TableState> {
        self.registry.require(name)
    }

    pub fn bind<F>(&mut self, table: &str, callback: F) -> EngineResult<BindingId>
    where
        F: FnMut(&TickContext<'_>) -> anyhow::Result<TickOutput> + Send + 'static,
    {
        self.ticks.bind(table, Box::new(callback) as TickCallback)
    }

    /// Keeps `target` in sync with the filtered rows of `derivation.source()` on every tick.
    pub fn bind_derived(
        &mut self,
        target: &str,
        derivation: Derivation,
    ) -> EngineResult<BindingId> {
        let target = target.to_string();
        let source = derivation.source().to_string();
        self.bind(&source, move |ctx| {
            let table = derivation.apply(ctx.filtered)?;
            Ok(TickOutput::Replace(
                TableHandle::new(target.clone(), table).with_derivation(derivation.clone()),
            ))
        })
    }

    pub fn unbind(&mut self, id: BindingId) -> bool {
        self.ticks.unbind(id)
    }

    pub fn binding_ids(&self, table: &str) -> Vec<BindingId> {
        self.ticks.binding_ids(table)
    }

    pub fn tick(&mut self, table: &str, predicate: SelectionPredicate) -> EngineResult<TickReport> {
        self.tick_with(table, predicate, &CancellationToken::new())
    }

    pub fn tick_with(
        &mut self,
        table: &str,
        predicate: SelectionPredicate,
        cancel: &CancellationToken,
    ) -> EngineResult<TickReport> {
        self.ticks
            .tick(&mut self.registry, table, predicate, cancel)
    }

    /// Latest selection of `table`, or `None` if nothing was selected yet.
    pub fn current_selection(
        &self,
        table: &str,
        mode: SelectionMode,
    ) -> EngineResult<Option<CurrentSelection>> {
        let state = self.registry.require(table)?;
        let Some(predicate) = state.current_selection() else {
            return Ok(None);
        };
        Ok(Some(match mode {
            SelectionMode::Predicate => CurrentSelection::Predicate(predicate.clone()),
            SelectionMode::Data => {
                CurrentSelection::Data(evaluate(state.handle().table(), predicate)?)
            }
        }))
    }

    pub fn selection_at(&self, table: &str, index: usize) -> EngineResult<Option<&SelectionPredicate>> {
        Ok(self.registry.require(table)?.history().get(index))
    }

    /// Opens a stream over `table`'s selection history.
    pub fn selection_stream(&mut self, table: &str) -> EngineResult<SelectionStream> {
        let state = self.registry.require(table)?;
        let (sender, receiver) = mpsc::unbounded_channel();
        for (index, predicate) in state.history().iter().enumerate() {
            // The receiver is alive, so this cannot fail.
            let _ = sender.send(SelectionEvent {
                table: table.to_string(),
                index,
                predicate: predicate.clone(),
            });
        }

        let binding = self.bind(table, move |ctx| {
            let event = SelectionEvent {
                table: ctx.table.to_string(),
                index: ctx.history_index,
                predicate: ctx.predicate.clone(),
            };
            if sender.send(event).is_err() {
                log::debug!("selection stream on {} was dropped", ctx.table);
            }
            Ok(TickOutput::Unchanged)
        })?;
        Ok(SelectionStream::new(table.to_string(), binding, receiver))
    }

    pub fn drain_events(&mut self) -> Vec<RegistryEvent> {
        self.registry.drain_events()
    }
}
