use brushwork_engine::EngineError;
use brushwork_table::{ColumnType, TableError};

pub type BridgeResult<T> = Result<T, BridgeError>;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Command {0} not handled!")]
    UnhandledCommand(String),

    #[error("malformed message: {0}")]
    MalformedMessage(String),

    #[error("{0} not handled")]
    UnhandledEncoding(String),

    #[error("no chart encoding recorded for {0}")]
    MissingEncoding(String),

    #[error("invalid selection for {table}: {reason}")]
    InvalidSelection { table: String, reason: String },

    #[error("cannot build a distribution for {column} ({column_type} values)")]
    UnsupportedDistribution {
        column: String,
        column_type: ColumnType,
    },

    #[error("transport failed: {0}")]
    Transport(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
