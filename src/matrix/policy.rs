use super::collation_matrix::CollationMatrix;
use crate::token::TokenType;

/// Decides whether a column may be deleted.
///
/// Deleting a column must never silently discard alignment work, but what
/// counts as "nothing there" depends on the row type: a plain witness row is
/// empty only when the cell holds no token, while an edition row may treat
/// its designated empty-marker token as deletable content.
pub trait DeletionPolicy {
    fn is_column_deletable(&self, matrix: &CollationMatrix, col: usize) -> bool;
}

/// The default policy: a column is deletable only when every cell is empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyCellPolicy;

impl DeletionPolicy for EmptyCellPolicy {
    fn is_column_deletable(&self, matrix: &CollationMatrix, col: usize) -> bool {
        matrix.is_column_empty(col)
    }
}

/// Treats cells of one designated row as empty when they hold a token of
/// type `Empty` (the edition row's placeholder marker); all other rows must
/// be literally empty.
#[derive(Debug, Clone, Copy)]
pub struct MarkerTokenPolicy {
    pub marker_row: usize,
}

impl DeletionPolicy for MarkerTokenPolicy {
    fn is_column_deletable(&self, matrix: &CollationMatrix, col: usize) -> bool {
        (0..matrix.row_count()).all(|row| {
            match matrix.token_at(row, col) {
                None => true,
                Some(token) => row == self.marker_row && token.token_type == TokenType::Empty,
            }
        })
    }
}
