mod diff;
mod error;
mod matrix;
mod reconcile;
mod token;

pub use diff::{EditOp, MyersDiffer, SequenceDiffer, validate_edit_script};
pub use error::{MatrixError, ReconcileError};
pub use matrix::{
    CollationMatrix, ColumnGroup, ColumnGroupIndex, DeletionPolicy, Direction, EditOutcome,
    EmptyCellPolicy, MarkerTokenPolicy, MatrixEvent,
};
pub use reconcile::{
    CollationChange, NonCollationChange, TokenConversionArray, WitnessChangeSet,
    WitnessReconciler,
};
pub use token::{TokenType, Witness, WitnessToken};

#[cfg(feature = "serde")]
pub mod transport;
