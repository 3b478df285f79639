use crate::tick::BindingId;
use brushwork_table::TableError;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("unknown table: {0}")]
    UnknownTable(String),

    #[error("unknown column {table}[{column}]")]
    UnknownColumn { table: String, column: String },

    #[error("unknown shelf selection: {0}")]
    UnknownShelfEntry(String),

    #[error("shelf selection already exists: {0}")]
    DuplicateShelfEntry(String),

    #[error("{0}")]
    User(String),

    #[error("callback {binding} on {table} failed: {source}")]
    Callback {
        table: String,
        binding: BindingId,
        #[source]
        source: anyhow::Error,
    },

    #[error("tick on {table} was cancelled")]
    Cancelled { table: String },

    #[error(transparent)]
    Table(#[from] TableError),
}
