use crate::predicate::SelectionPredicate;
use crate::tick::BindingId;
use tokio::sync::mpsc::{error::TryRecvError, UnboundedReceiver};

/// One entry of a table's selection history.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionEvent {
    pub table: String,
    pub index: usize,
    pub predicate: SelectionPredicate,
}

/// Selection history of one table as a stream: first the history recorded before the stream
/// was opened, then one event per tick.
///
/// The stream is fed by an ordinary binding; pass [`SelectionStream::binding`] to `unbind` to
/// stop it.
#[derive(Debug)]
pub struct SelectionStream {
    table: String,
    binding: BindingId,
    receiver: UnboundedReceiver<SelectionEvent>,
}

impl SelectionStream {
    pub(crate) fn new(
        table: String,
        binding: BindingId,
        receiver: UnboundedReceiver<SelectionEvent>,
    ) -> Self {
        Self {
            table,
            binding,
            receiver,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn binding(&self) -> BindingId {
        self.binding
    }

    /// Waits for the next selection. Returns `None` once the binding is gone and every
    /// buffered event was read.
    pub async fn next(&mut self) -> Option<SelectionEvent> {
        self.receiver.recv().await
    }

    /// Next buffered selection, without waiting.
    pub fn try_next(&mut self) -> Option<SelectionEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}
