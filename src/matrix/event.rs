use super::collation_matrix::Direction;

/// A structural change notification.
///
/// The matrix records one event per completed operation into a drainable
/// queue; a rendering layer polls `CollationMatrix::take_events` after
/// dispatching commands and re-renders what the events name. No callback or
/// UI-toolkit coupling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatrixEvent {
    /// A single token moved into an adjacent empty cell.
    CellMoved { row: usize, from: usize, to: usize },

    /// A contiguous cell range shifted by `amount` columns.
    CellsPushed {
        row: usize,
        first: usize,
        last: usize,
        direction: Direction,
        amount: usize,
    },

    /// A new all-empty column appeared at `col`; later columns shifted up.
    ColumnInserted { col: usize },

    /// Column `col` disappeared; later columns shifted down.
    ColumnDeleted { col: usize },

    /// Column `col` was grouped with (or ungrouped from) its successor.
    GroupingChanged { col: usize, grouped: bool },

    /// A whole row was rewritten by a witness update.
    RowUpdated { row: usize },
}
