mod apply;
mod collation_matrix;
mod column_groups;
mod event;
mod policy;

pub use collation_matrix::{CollationMatrix, Direction, EditOutcome};
pub use column_groups::{ColumnGroup, ColumnGroupIndex};
pub use event::MatrixEvent;
pub use policy::{DeletionPolicy, EmptyCellPolicy, MarkerTokenPolicy};
