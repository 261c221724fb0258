mod edit_script;
mod myers;

pub use edit_script::{EditOp, validate_edit_script};
pub use myers::MyersDiffer;

/// A sequence differ computes an edit script between two ordered sequences
/// under a caller-supplied equality predicate.
///
/// The script must be *valid* (replaying keeps and deletes against `old` and
/// keeps and inserts against `new` reconstructs `new` from `old`); it does
/// not have to be minimal, although minimal scripts produce fewer spurious
/// replace and insert-column changes downstream.
pub trait SequenceDiffer<T> {
    fn diff(&self, old: &[T], new: &[T], equals: &dyn Fn(&T, &T) -> bool) -> Vec<EditOp>;
}
