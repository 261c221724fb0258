use core::fmt::{self, Display};

use tracing::debug;

use super::{
    column_groups::{ColumnGroup, ColumnGroupIndex},
    event::MatrixEvent,
    policy::{DeletionPolicy, EmptyCellPolicy},
};
use crate::{
    error::MatrixError,
    token::{Witness, WitnessToken},
};

/// Direction of a cell move or push, in column order (`Left` towards column
/// zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

impl Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Left => write!(f, "left"),
            Direction::Right => write!(f, "right"),
        }
    }
}

/// Result of a structural edit whose preconditions are checked by the matrix
/// itself.
///
/// A rejected edit is a normal outcome, not an error: the UI offers an
/// action only when its precondition holds, but the core re-validates and
/// reports `NotApplicable` instead of corrupting state.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Applied,
    NotApplicable,
}

impl EditOutcome {
    pub fn is_applied(self) -> bool { self == EditOutcome::Applied }
}

/// The collation matrix: one row per witness, one column per aligned
/// position.
///
/// `cell(row, col)` is either a token index into the row's witness or empty
/// (`None`), meaning no token of that witness occupies the position. All
/// rows always have the same column count, and within a row every token
/// index appears in at most one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CollationMatrix {
    witnesses: Vec<Witness>,
    cells: Vec<Vec<Option<usize>>>,
    groups: ColumnGroupIndex,
    events: Vec<MatrixEvent>,
}

impl CollationMatrix {
    /// Builds a matrix from witnesses and their aligned rows.
    ///
    /// # Errors
    ///
    /// Rejects ragged rows, a row count different from the witness count,
    /// token references beyond a witness's length, and duplicate references
    /// within a row.
    pub fn from_witnesses(
        witnesses: Vec<Witness>,
        cells: Vec<Vec<Option<usize>>>,
    ) -> Result<Self, MatrixError> {
        if cells.len() != witnesses.len() {
            return Err(MatrixError::RowOutOfRange {
                row: cells.len(),
                rows: witnesses.len(),
            });
        }

        let column_count = cells.first().map(Vec::len).unwrap_or_default();
        let matrix = Self {
            witnesses,
            cells,
            groups: ColumnGroupIndex::new(column_count),
            events: Vec::new(),
        };
        matrix.verify_integrity()?;

        Ok(matrix)
    }

    #[must_use]
    pub fn row_count(&self) -> usize { self.cells.len() }

    #[must_use]
    pub fn column_count(&self) -> usize { self.cells.first().map(Vec::len).unwrap_or_default() }

    /// The token index at `(row, col)`, or `None` for an empty cell.
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> Option<usize> {
        self.cells.get(row).and_then(|cells| cells.get(col)).copied().flatten()
    }

    #[must_use]
    pub fn row(&self, row: usize) -> &[Option<usize>] { &self.cells[row] }

    #[must_use]
    pub fn witness(&self, row: usize) -> &Witness { &self.witnesses[row] }

    /// The token occupying `(row, col)`, if any.
    #[must_use]
    pub fn token_at(&self, row: usize, col: usize) -> Option<&WitnessToken> {
        self.cell(row, col)
            .and_then(|token_index| self.witnesses[row].token(token_index))
    }

    #[must_use]
    pub fn is_cell_empty(&self, row: usize, col: usize) -> bool { self.cell(row, col).is_none() }

    #[must_use]
    pub fn is_column_empty(&self, col: usize) -> bool {
        (0..self.row_count()).all(|row| self.is_cell_empty(row, col))
    }

    #[must_use]
    pub fn column_groups(&self) -> &ColumnGroupIndex { &self.groups }

    #[must_use]
    pub fn groups(&self) -> Vec<ColumnGroup> { self.groups.groups() }

    /// Drains the structural-change events recorded since the last call.
    pub fn take_events(&mut self) -> Vec<MatrixEvent> { std::mem::take(&mut self.events) }

    /// The adjacent column in `direction`, if it exists.
    fn neighbour(&self, col: usize, direction: Direction) -> Option<usize> {
        match direction {
            Direction::Left => col.checked_sub(1),
            Direction::Right => (col + 1 < self.column_count()).then_some(col + 1),
        }
    }

    /// Whether the token at `(row, col)` can move one position in
    /// `direction`: the cell is occupied and the adjacent cell is empty.
    #[must_use]
    pub fn can_move_cell(&self, row: usize, col: usize, direction: Direction) -> bool {
        if row >= self.row_count() || self.is_cell_empty(row, col) {
            return false;
        }
        self.neighbour(col, direction)
            .is_some_and(|target| self.is_cell_empty(row, target))
    }

    /// Moves the token at `(row, col)` one position in `direction`.
    ///
    /// A precondition violation is reported as `NotApplicable` and leaves
    /// the matrix unchanged.
    pub fn move_cell(&mut self, row: usize, col: usize, direction: Direction) -> EditOutcome {
        if !self.can_move_cell(row, col, direction) {
            return EditOutcome::NotApplicable;
        }
        let Some(target) = self.neighbour(col, direction) else {
            return EditOutcome::NotApplicable;
        };

        self.cells[row].swap(col, target);
        debug!(row, col, target, "cell moved");
        self.events.push(MatrixEvent::CellMoved {
            row,
            from: col,
            to: target,
        });

        EditOutcome::Applied
    }

    /// The nearest empty cell strictly beyond `col` in `direction`, if any.
    #[must_use]
    pub fn first_empty_cell(&self, row: usize, col: usize, direction: Direction) -> Option<usize> {
        if row >= self.row_count() {
            return None;
        }
        match direction {
            Direction::Left => (0..col).rev().find(|&c| self.is_cell_empty(row, c)),
            Direction::Right => {
                (col + 1..self.column_count()).find(|&c| self.is_cell_empty(row, c))
            }
        }
    }

    /// Shifts every cell in `[first, last]` of `row` by `amount` positions
    /// in `direction`, preserving their relative order. The cells vacated at
    /// the near edge become empty.
    ///
    /// Rejected (`NotApplicable`, matrix unchanged) when the destination
    /// range leaves the matrix or the shift would overwrite an occupied cell
    /// beyond the pushed range. The canonical use pushes the range between
    /// an anchor cell and the first empty cell beyond it, so nothing
    /// non-empty is ever overwritten.
    pub fn push_cells(
        &mut self,
        row: usize,
        first: usize,
        last: usize,
        direction: Direction,
        amount: usize,
    ) -> EditOutcome {
        let cols = self.column_count();
        if row >= self.row_count() || first > last || last >= cols || amount == 0 {
            return EditOutcome::NotApplicable;
        }

        // destination bounds and the cells beyond the range that get
        // overwritten, which must be empty
        match direction {
            Direction::Left => {
                if first < amount {
                    return EditOutcome::NotApplicable;
                }
                if (first - amount..first).any(|c| !self.is_cell_empty(row, c)) {
                    return EditOutcome::NotApplicable;
                }
            }
            Direction::Right => {
                if last + amount >= cols {
                    return EditOutcome::NotApplicable;
                }
                if (last + 1..=last + amount).any(|c| !self.is_cell_empty(row, c)) {
                    return EditOutcome::NotApplicable;
                }
            }
        }

        let moved: Vec<Option<usize>> = self.cells[row][first..=last].to_vec();
        match direction {
            Direction::Left => {
                self.cells[row][first - amount..=last - amount].copy_from_slice(&moved);
                for cell in &mut self.cells[row][last - amount + 1..=last] {
                    *cell = None;
                }
            }
            Direction::Right => {
                self.cells[row][first + amount..=last + amount].copy_from_slice(&moved);
                for cell in &mut self.cells[row][first..first + amount] {
                    *cell = None;
                }
            }
        }

        debug!(row, first, last, %direction, amount, "cells pushed");
        self.events.push(MatrixEvent::CellsPushed {
            row,
            first,
            last,
            direction,
            amount,
        });

        EditOutcome::Applied
    }

    /// Inserts a new all-empty column immediately after `after` (`None`
    /// inserts before the first column). Groups keep their membership; a
    /// column inserted inside a group extends it.
    pub fn insert_column_after(&mut self, after: Option<usize>) -> EditOutcome {
        if let Some(col) = after {
            if col >= self.column_count() {
                return EditOutcome::NotApplicable;
            }
        }
        let insert_at = after.map_or(0, |col| col + 1);

        for row in &mut self.cells {
            row.insert(insert_at, None);
        }
        self.groups.insert_column_after(after);

        debug!(col = insert_at, "column inserted");
        self.events.push(MatrixEvent::ColumnInserted { col: insert_at });

        EditOutcome::Applied
    }

    /// Whether `col` may be deleted under the default all-cells-empty
    /// policy.
    #[must_use]
    pub fn is_column_deletable(&self, col: usize) -> bool {
        col < self.column_count() && EmptyCellPolicy.is_column_deletable(self, col)
    }

    /// Deletes column `col` under the default policy. Rejection is the
    /// normal outcome for a non-empty column; callers check
    /// `is_column_deletable` before offering the action.
    pub fn delete_column(&mut self, col: usize) -> EditOutcome {
        self.delete_column_with(col, &EmptyCellPolicy)
    }

    /// Deletes column `col` if `policy` allows it.
    pub fn delete_column_with(&mut self, col: usize, policy: &dyn DeletionPolicy) -> EditOutcome {
        if col >= self.column_count() || !policy.is_column_deletable(self, col) {
            return EditOutcome::NotApplicable;
        }

        for row in &mut self.cells {
            row.remove(col);
        }
        self.groups.remove_column(col);

        debug!(col, "column deleted");
        self.events.push(MatrixEvent::ColumnDeleted { col });

        EditOutcome::Applied
    }

    /// Groups column `col` with `col + 1`. Always succeeds for
    /// `col < column_count - 1`.
    pub fn group_with_next(&mut self, col: usize) -> EditOutcome {
        if col + 1 >= self.column_count() {
            return EditOutcome::NotApplicable;
        }
        self.groups.group_with_next(col);
        self.events.push(MatrixEvent::GroupingChanged { col, grouped: true });
        EditOutcome::Applied
    }

    /// Removes the grouping between `col` and `col + 1`.
    pub fn ungroup_with_next(&mut self, col: usize) -> EditOutcome {
        if col + 1 >= self.column_count() {
            return EditOutcome::NotApplicable;
        }
        self.groups.ungroup_with_next(col);
        self.events.push(MatrixEvent::GroupingChanged {
            col,
            grouped: false,
        });
        EditOutcome::Applied
    }

    /// Checks the structural invariants: identical row lengths, every token
    /// reference in range, no token in two cells of one row.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn verify_integrity(&self) -> Result<(), MatrixError> {
        let expected = self.column_count();

        for (row, cells) in self.cells.iter().enumerate() {
            if cells.len() != expected {
                return Err(MatrixError::RaggedRow {
                    row,
                    len: cells.len(),
                    expected,
                });
            }

            let token_count = self.witnesses[row].len();
            let mut seen = vec![false; token_count];
            for (col, cell) in cells.iter().enumerate() {
                let Some(token_index) = *cell else { continue };
                if token_index >= token_count {
                    return Err(MatrixError::CellTokenOutOfRange {
                        row,
                        col,
                        token_index,
                        token_count,
                    });
                }
                if seen[token_index] {
                    return Err(MatrixError::DuplicateTokenReference { row, token_index });
                }
                seen[token_index] = true;
            }
        }

        Ok(())
    }

    pub(crate) fn set_cell(&mut self, row: usize, col: usize, value: Option<usize>) {
        self.cells[row][col] = value;
    }

    pub(crate) fn replace_witness(&mut self, row: usize, witness: Witness) {
        self.witnesses[row] = witness;
    }

    pub(crate) fn record_event(&mut self, event: MatrixEvent) { self.events.push(event); }

    /// Replaces the grouping wholesale, as when loading a stored matrix.
    /// `groups.len()` must equal the column count.
    pub(crate) fn set_groups(&mut self, groups: ColumnGroupIndex) { self.groups = groups; }
}
