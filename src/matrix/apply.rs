use std::collections::BTreeSet;

use tracing::{debug, warn};

use super::{collation_matrix::CollationMatrix, event::MatrixEvent};
use crate::{
    error::MatrixError,
    reconcile::{CollationChange, WitnessChangeSet},
    token::Witness,
};

impl CollationMatrix {
    /// Applies a reconciliation change-set to its row, replacing the row's
    /// witness with `new_witness`.
    ///
    /// Collation changes are applied in emission order; every cell of the
    /// row not covered by a change is rewritten through the token conversion
    /// array. Column insertions add an empty cell to every other row, so all
    /// rows stay the same width.
    ///
    /// Application is transactional: on any error the matrix is left exactly
    /// as it was.
    ///
    /// # Errors
    ///
    /// Fails when the change-set does not fit this matrix (its row or a
    /// named column is out of range, a token index does not exist in
    /// `new_witness`, or a cell references a token outside the conversion
    /// array). These indicate a change-set computed against a different
    /// matrix state.
    pub fn apply_witness_update(
        &mut self,
        changes: &WitnessChangeSet,
        new_witness: Witness,
    ) -> Result<(), MatrixError> {
        let row = changes.row;
        if row >= self.row_count() {
            return Err(MatrixError::RowOutOfRange {
                row,
                rows: self.row_count(),
            });
        }

        debug!(
            row,
            ct_changes = changes.ct_changes.len(),
            new_token_count = new_witness.len(),
            "applying witness update"
        );

        let mut scratch = self.clone();
        let mut inserted = 0;
        let mut finalized = BTreeSet::new();

        // change columns are emitted left to right, so a stated column plus
        // the insertions processed so far is its current position
        for change in &changes.ct_changes {
            match change {
                CollationChange::InsertColumnAfter {
                    after_col,
                    token_index_in_new_witness,
                    ..
                } => {
                    let anchor = match *after_col {
                        None if inserted == 0 => None,
                        None => Some(inserted - 1),
                        Some(col) => Some(col + inserted),
                    };
                    if !scratch.insert_column_after(anchor).is_applied() {
                        return Err(MatrixError::ColumnOutOfRange {
                            col: anchor.unwrap_or_default(),
                            cols: scratch.column_count(),
                        });
                    }
                    let insert_at = anchor.map_or(0, |col| col + 1);
                    seatable(&new_witness, row, insert_at, *token_index_in_new_witness)?;
                    if !scratch.is_cell_empty(row, insert_at) {
                        return Err(MatrixError::InsertionSlotOccupied {
                            col: insert_at,
                            token_index: *token_index_in_new_witness,
                        });
                    }
                    scratch.set_cell(row, insert_at, Some(*token_index_in_new_witness));
                    finalized.insert(insert_at);
                    inserted += 1;
                }

                CollationChange::EmptyCell { col, .. } => {
                    let target = in_range(&scratch, col + inserted)?;
                    scratch.set_cell(row, target, None);
                    finalized.insert(target);
                }

                CollationChange::Replace { col, new_index, .. } => {
                    let target = in_range(&scratch, col + inserted)?;
                    seatable(&new_witness, row, target, *new_index)?;
                    scratch.set_cell(row, target, Some(*new_index));
                    finalized.insert(target);
                }
            }
        }

        // rewrite the untouched cells through the conversion array
        let conversion = &changes.token_conversion;
        for col in 0..scratch.column_count() {
            if finalized.contains(&col) {
                continue;
            }
            let Some(token_index) = scratch.cell(row, col) else {
                continue;
            };
            if token_index >= conversion.len() {
                return Err(MatrixError::ConversionOutOfRange {
                    row,
                    col,
                    token_index,
                    len: conversion.len(),
                });
            }
            let mapped = conversion.get(token_index);
            if mapped.is_none() {
                // a deletion the change-set did not cover explicitly
                warn!(row, col, token_index, "cell token removed without an empty-cell change");
            }
            scratch.set_cell(row, col, mapped);
        }

        scratch.replace_witness(row, new_witness);
        scratch.verify_integrity()?;
        scratch.record_event(MatrixEvent::RowUpdated { row });

        *self = scratch;
        debug!(row, columns = self.column_count(), "witness update applied");

        Ok(())
    }
}

fn in_range(matrix: &CollationMatrix, col: usize) -> Result<usize, MatrixError> {
    if col >= matrix.column_count() {
        return Err(MatrixError::ColumnOutOfRange {
            col,
            cols: matrix.column_count(),
        });
    }
    Ok(col)
}

fn seatable(
    new_witness: &Witness,
    row: usize,
    col: usize,
    token_index: usize,
) -> Result<(), MatrixError> {
    if token_index >= new_witness.len() {
        return Err(MatrixError::CellTokenOutOfRange {
            row,
            col,
            token_index,
            token_count: new_witness.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{
        error::MatrixError,
        matrix::{CollationMatrix, MatrixEvent},
        reconcile::{CollationChange, TokenConversionArray, WitnessChangeSet},
        token::{Witness, WitnessToken},
    };

    fn witness(words: &[&str]) -> Witness {
        Witness::new(words.iter().copied().map(WitnessToken::word).collect())
    }

    fn conversion(mappings: &[Option<usize>]) -> TokenConversionArray {
        let mut array = TokenConversionArray::new(mappings.len());
        for (old, mapped) in mappings.iter().enumerate() {
            match mapped {
                Some(new) => array.set_mapped(old, *new),
                None => array.set_removed(old),
            }
        }
        array
    }

    fn change_set(
        row: usize,
        ct_changes: Vec<CollationChange>,
        mappings: &[Option<usize>],
    ) -> WitnessChangeSet {
        WitnessChangeSet {
            row,
            token_conversion: conversion(mappings),
            ct_changes,
            non_ct_changes: vec![],
        }
    }

    /// ```not_rust
    /// the  cat
    /// the  cat
    /// ```
    fn two_row_matrix() -> CollationMatrix {
        CollationMatrix::from_witnesses(
            vec![witness(&["the", "cat"]), witness(&["the", "cat"])],
            vec![vec![Some(0), Some(1)], vec![Some(0), Some(1)]],
        )
        .unwrap()
    }

    #[test]
    fn test_insert_column_adds_empty_cells_to_other_rows() {
        let mut matrix = two_row_matrix();
        let changes = change_set(
            1,
            vec![CollationChange::InsertColumnAfter {
                after_col: Some(0),
                token_index_in_new_witness: 1,
                new_token: WitnessToken::word("big"),
                current_token: Some(WitnessToken::word("the")),
            }],
            &[Some(0), Some(2)],
        );

        matrix
            .apply_witness_update(&changes, witness(&["the", "big", "cat"]))
            .unwrap();

        assert_eq!(matrix.row(0), &[Some(0), None, Some(1)]);
        assert_eq!(matrix.row(1), &[Some(0), Some(1), Some(2)]);
        assert_eq!(matrix.witness(1).len(), 3);

        let events = matrix.take_events();
        assert!(events.contains(&MatrixEvent::ColumnInserted { col: 1 }));
        assert!(events.contains(&MatrixEvent::RowUpdated { row: 1 }));
    }

    #[test]
    fn test_insert_before_first_column() {
        let mut matrix = two_row_matrix();
        let changes = change_set(
            1,
            vec![CollationChange::InsertColumnAfter {
                after_col: None,
                token_index_in_new_witness: 0,
                new_token: WitnessToken::word("lo"),
                current_token: None,
            }],
            &[Some(1), Some(2)],
        );

        matrix
            .apply_witness_update(&changes, witness(&["lo", "the", "cat"]))
            .unwrap();

        assert_eq!(matrix.row(0), &[None, Some(0), Some(1)]);
        assert_eq!(matrix.row(1), &[Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn test_consecutive_insertions_shift_later_anchors() {
        let mut matrix = two_row_matrix();
        let changes = change_set(
            1,
            vec![
                CollationChange::InsertColumnAfter {
                    after_col: Some(0),
                    token_index_in_new_witness: 1,
                    new_token: WitnessToken::word("x"),
                    current_token: Some(WitnessToken::word("the")),
                },
                CollationChange::InsertColumnAfter {
                    after_col: Some(1),
                    token_index_in_new_witness: 3,
                    new_token: WitnessToken::word("y"),
                    current_token: Some(WitnessToken::word("cat")),
                },
            ],
            &[Some(0), Some(2)],
        );

        matrix
            .apply_witness_update(&changes, witness(&["the", "x", "cat", "y"]))
            .unwrap();

        assert_eq!(matrix.row(1), &[Some(0), Some(1), Some(2), Some(3)]);
        assert_eq!(matrix.row(0), &[Some(0), None, Some(1), None]);
    }

    #[test]
    fn test_empty_cell_and_conversion_rewrite() {
        let mut matrix = CollationMatrix::from_witnesses(
            vec![witness(&["cat", "dog"]), witness(&["cat", "dog"])],
            vec![vec![Some(0), Some(1)], vec![Some(0), Some(1)]],
        )
        .unwrap();
        let changes = change_set(
            1,
            vec![CollationChange::EmptyCell {
                col: 0,
                current_token: Some(WitnessToken::word("cat")),
            }],
            &[None, Some(0)],
        );

        matrix.apply_witness_update(&changes, witness(&["dog"])).unwrap();

        assert_eq!(matrix.row(1), &[None, Some(0)]);
        assert_eq!(matrix.row(0), &[Some(0), Some(1)]);
        assert_eq!(matrix.column_count(), 2);
    }

    #[test]
    fn test_replace_keeps_the_alignment_slot() {
        let mut matrix = CollationMatrix::from_witnesses(
            vec![witness(&["teh"])],
            vec![vec![Some(0)]],
        )
        .unwrap();
        let changes = change_set(
            0,
            vec![CollationChange::Replace {
                col: 0,
                old_index: 0,
                new_index: 0,
                current_token: WitnessToken::word("teh"),
                new_token: WitnessToken::word("the"),
            }],
            &[Some(0)],
        );

        matrix.apply_witness_update(&changes, witness(&["the"])).unwrap();

        assert_eq!(matrix.row(0), &[Some(0)]);
        assert_eq!(matrix.token_at(0, 0), Some(&WitnessToken::word("the")));
    }

    #[test]
    fn test_failed_apply_leaves_matrix_unchanged() {
        let mut matrix = two_row_matrix();
        let before = matrix.clone();
        let changes = change_set(
            1,
            vec![CollationChange::Replace {
                col: 9,
                old_index: 0,
                new_index: 0,
                current_token: WitnessToken::word("the"),
                new_token: WitnessToken::word("thy"),
            }],
            &[Some(0), Some(1)],
        );

        let result = matrix.apply_witness_update(&changes, witness(&["thy", "cat"]));

        assert_eq!(
            result.unwrap_err(),
            MatrixError::ColumnOutOfRange { col: 9, cols: 2 }
        );
        assert_eq!(matrix, before);
    }

    #[test]
    fn test_rejects_row_out_of_range() {
        let mut matrix = two_row_matrix();
        let changes = change_set(5, vec![], &[Some(0), Some(1)]);

        assert_eq!(
            matrix.apply_witness_update(&changes, witness(&["the", "cat"])),
            Err(MatrixError::RowOutOfRange { row: 5, rows: 2 })
        );
    }

    #[test]
    fn test_rejects_cell_outside_conversion_array() {
        let mut matrix = two_row_matrix();
        let before = matrix.clone();
        // conversion array too short for token 1
        let changes = change_set(1, vec![], &[Some(0)]);

        let result = matrix.apply_witness_update(&changes, witness(&["the"]));

        assert_eq!(
            result.unwrap_err(),
            MatrixError::ConversionOutOfRange {
                row: 1,
                col: 1,
                token_index: 1,
                len: 1
            }
        );
        assert_eq!(matrix, before);
    }

    #[test]
    fn test_rejects_seating_token_missing_from_new_witness() {
        let mut matrix = two_row_matrix();
        let changes = change_set(
            1,
            vec![CollationChange::InsertColumnAfter {
                after_col: Some(0),
                token_index_in_new_witness: 7,
                new_token: WitnessToken::word("big"),
                current_token: None,
            }],
            &[Some(0), Some(1)],
        );

        let result = matrix.apply_witness_update(&changes, witness(&["the", "cat"]));

        assert_eq!(
            result.unwrap_err(),
            MatrixError::CellTokenOutOfRange {
                row: 1,
                col: 1,
                token_index: 7,
                token_count: 2
            }
        );
    }
}
