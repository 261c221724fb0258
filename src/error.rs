use thiserror::Error;

/// Errors raised while computing a witness reconciliation.
///
/// These are fatal for the reconciliation run: no partial change-set is
/// produced and the matrix is left untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// The collation row references a token index that does not exist in the
    /// old witness.
    #[error(
        "collation row references token {token_index} at column {col}, but the old witness only \
         has {token_count} tokens"
    )]
    InvalidCollationRow {
        col: usize,
        token_index: usize,
        token_count: usize,
    },

    /// The same old-witness token occupies more than one cell of the row.
    #[error("collation row references token {token_index} in more than one column")]
    DuplicateRowReference { token_index: usize },

    /// The sequence differ returned a script that does not reconstruct the
    /// new witness from the old one.
    #[error("edit script does not reconstruct the new witness: {reason}")]
    InconsistentEditScript { reason: String },
}

/// Errors raised while applying a witness change-set to a `CollationMatrix`.
///
/// Application is all-or-nothing: any of these leaves the matrix unmodified.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatrixError {
    #[error("row {row} is out of range for a matrix with {rows} rows")]
    RowOutOfRange { row: usize, rows: usize },

    /// A change-set names a column the matrix does not have; the change-set
    /// is stale.
    #[error("column {col} is out of range for a matrix with {cols} columns")]
    ColumnOutOfRange { col: usize, cols: usize },

    #[error("row {row} has {len} columns, expected {expected}")]
    RaggedRow {
        row: usize,
        len: usize,
        expected: usize,
    },

    /// A cell references a token index beyond the end of its witness.
    #[error(
        "cell ({row}, {col}) references token {token_index}, but the witness only has \
         {token_count} tokens"
    )]
    CellTokenOutOfRange {
        row: usize,
        col: usize,
        token_index: usize,
        token_count: usize,
    },

    /// The same token occupies two cells of one row.
    #[error("token {token_index} appears in more than one cell of row {row}")]
    DuplicateTokenReference { row: usize, token_index: usize },

    /// A cell holds a token index the conversion array knows nothing about.
    #[error(
        "cell ({row}, {col}) references token {token_index}, outside the conversion array of \
         length {len}"
    )]
    ConversionOutOfRange {
        row: usize,
        col: usize,
        token_index: usize,
        len: usize,
    },

    /// A freshly inserted column was expected to be empty at seating time.
    #[error("column {col} is already occupied; cannot seat new token {token_index} there")]
    InsertionSlotOccupied { col: usize, token_index: usize },
}
