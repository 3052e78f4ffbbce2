use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] redb::DatabaseError),
    #[error("transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),
    #[error("table error: {0}")]
    Table(#[from] redb::TableError),
    #[error("storage error: {0}")]
    Storage(#[from] redb::StorageError),
    #[error("commit error: {0}")]
    Commit(#[from] redb::CommitError),
    #[error("failed to set durability: {0}")]
    SetDurability(#[from] redb::SetDurabilityError),
    #[error("snappy error: {0}")]
    Snappy(#[from] snap::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed {kind} record: {reason}")]
    Malformed { kind: &'static str, reason: String },
    #[error("field not initialized")]
    FieldNotInitialized,
    #[error("no data directory available for {0}")]
    DataDirUnavailable(String),
}

impl StoreError {
    pub fn malformed(kind: &'static str, err: ssz::DecodeError) -> Self {
        StoreError::Malformed {
            kind,
            reason: format!("{err:?}"),
        }
    }
}
