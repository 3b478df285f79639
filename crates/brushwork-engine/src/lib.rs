//! Reactive selection engine.
//!
//! A brushed selection on a chart becomes a [`SelectionPredicate`]. Ticking a predicate against
//! a registered table appends it to that table's append-only history, evaluates it into a
//! filtered table, and fans the result out to every callback bound to the table in the order the
//! bindings were made. Callbacks may publish derived tables back into the [`Registry`], and later
//! callbacks in the same tick observe those updates.

#![forbid(unsafe_code)]

mod engine;
mod error;
mod predicate;
mod registry;
mod shelf;
mod stream;
mod tick;

pub use crate::engine::{CurrentSelection, SelectionEngine, SelectionMode};
pub use crate::error::{EngineError, EngineResult};
pub use crate::predicate::{describe, evaluate, Selection, SelectionPredicate};
pub use crate::registry::{Derivation, Registry, RegistryEvent, TableHandle, TableState};
pub use crate::shelf::{Shelf, ShelfEntry};
pub use crate::stream::{SelectionEvent, SelectionStream};
pub use crate::tick::{
    BindingId, CancellationToken, TickCallback, TickContext, TickEngine, TickOutput, TickReport,
};
