mod change;
mod fsm;

use core::fmt::{self, Debug};

use tracing::debug;

pub use change::{CollationChange, NonCollationChange, TokenConversionArray, WitnessChangeSet};
use fsm::{ReconcilerFsm, classify};

use crate::{
    diff::{EditOp, MyersDiffer, SequenceDiffer, validate_edit_script},
    error::ReconcileError,
    token::{Witness, WitnessToken},
};

/// Computes the matrix-level changes needed to reconcile a witness row with
/// a re-edited version of its witness.
///
/// The reconciliation is a pure function of its inputs: it produces a
/// change-set (or an error) and touches nothing, so the caller can present
/// the result for review and discard it without consequence.
pub struct WitnessReconciler {
    differ: Box<dyn SequenceDiffer<WitnessToken>>,
}

impl Default for WitnessReconciler {
    fn default() -> Self { Self::new() }
}

impl Debug for WitnessReconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WitnessReconciler").finish_non_exhaustive()
    }
}

impl WitnessReconciler {
    /// A reconciler backed by the built-in Myers differ.
    #[must_use]
    pub fn new() -> Self {
        Self {
            differ: Box::new(MyersDiffer),
        }
    }

    /// A reconciler backed by a custom sequence differ. The differ must
    /// return valid edit scripts; each script is checked and an invalid one
    /// fails the run.
    #[must_use]
    pub fn with_differ(differ: Box<dyn SequenceDiffer<WitnessToken>>) -> Self { Self { differ } }

    /// Computes the change-set turning `ct_row` (the matrix row of
    /// `old_witness`) into a valid alignment of `new_witness`.
    ///
    /// `ct_row` holds, per column, the old-witness token index occupying it.
    /// The returned changes must be applied in emission order; the token
    /// conversion array covers every old token, so the caller can
    /// rewrite the remaining cells of the row through it.
    ///
    /// # Errors
    ///
    /// - `ReconcileError::InvalidCollationRow` / `DuplicateRowReference`
    ///   when `ct_row` does not describe a row over `old_witness`;
    /// - `ReconcileError::InconsistentEditScript` when the differ violates
    ///   its contract.
    pub fn changes_between_witnesses(
        &self,
        row: usize,
        ct_row: &[Option<usize>],
        old_witness: &Witness,
        new_witness: &Witness,
    ) -> Result<WitnessChangeSet, ReconcileError> {
        validate_row(ct_row, old_witness)?;

        let equals = |a: &WitnessToken, b: &WitnessToken| a.matches(b);
        let script = self
            .differ
            .diff(old_witness.tokens(), new_witness.tokens(), &equals);
        validate_edit_script(&script, old_witness.tokens(), new_witness.tokens(), equals)?;
        let script = deletions_first(script);

        debug!(row, script_len = script.len(), "reconciling witness row");

        let mut machine = ReconcilerFsm::new(old_witness.tokens(), new_witness.tokens());
        for op in script {
            machine.step(classify(op, ct_row, new_witness.tokens()));
        }
        let (token_conversion, ct_changes, non_ct_changes) = machine.finish();

        debug!(
            row,
            ct_changes = ct_changes.len(),
            non_ct_changes = non_ct_changes.len(),
            "reconciliation complete"
        );

        Ok(WitnessChangeSet {
            row,
            token_conversion,
            ct_changes,
            non_ct_changes,
        })
    }
}

/// Reorders every keep-free run of a valid script so deletions come before
/// insertions. Within such a run the old and new positions are independent,
/// so the script stays valid; the stable ordering lets a deletion be paired
/// with the insertion that answers it regardless of how the differ
/// interleaved them.
fn deletions_first(script: Vec<EditOp>) -> Vec<EditOp> {
    let mut result = Vec::with_capacity(script.len());
    let mut held_inserts = Vec::new();

    for op in script {
        match op {
            EditOp::Keep { .. } => {
                result.append(&mut held_inserts);
                result.push(op);
            }
            EditOp::Delete { .. } => result.push(op),
            EditOp::Insert { .. } => held_inserts.push(op),
        }
    }
    result.append(&mut held_inserts);

    result
}

fn validate_row(ct_row: &[Option<usize>], old_witness: &Witness) -> Result<(), ReconcileError> {
    let token_count = old_witness.len();
    let mut seen = vec![false; token_count];

    for (col, cell) in ct_row.iter().enumerate() {
        let Some(token_index) = *cell else { continue };
        if token_index >= token_count {
            return Err(ReconcileError::InvalidCollationRow {
                col,
                token_index,
                token_count,
            });
        }
        if seen[token_index] {
            return Err(ReconcileError::DuplicateRowReference { token_index });
        }
        seen[token_index] = true;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{diff::EditOp, token::WitnessToken};

    fn w(text: &str) -> WitnessToken { WitnessToken::word(text) }
    fn ws() -> WitnessToken { WitnessToken::whitespace(" ") }

    #[test]
    fn test_identical_witnesses_yield_no_changes() {
        let witness = Witness::new(vec![w("the"), ws(), w("cat")]);
        let changes = WitnessReconciler::new()
            .changes_between_witnesses(0, &[Some(0), None, Some(2)], &witness, &witness)
            .unwrap();

        assert!(changes.is_unchanged());
        assert!(changes.token_conversion.is_identity());
    }

    #[test]
    fn test_rejects_row_referencing_missing_token() {
        let old = Witness::new(vec![w("a")]);
        let new = old.clone();
        let result =
            WitnessReconciler::new().changes_between_witnesses(0, &[Some(7)], &old, &new);

        assert_eq!(
            result.unwrap_err(),
            ReconcileError::InvalidCollationRow {
                col: 0,
                token_index: 7,
                token_count: 1
            }
        );
    }

    #[test]
    fn test_rejects_duplicate_row_reference() {
        let old = Witness::new(vec![w("a")]);
        let new = old.clone();
        let result = WitnessReconciler::new()
            .changes_between_witnesses(0, &[Some(0), Some(0)], &old, &new);

        assert_eq!(
            result.unwrap_err(),
            ReconcileError::DuplicateRowReference { token_index: 0 }
        );
    }

    #[test]
    fn test_rejects_inconsistent_differ_output() {
        struct BrokenDiffer;
        impl SequenceDiffer<WitnessToken> for BrokenDiffer {
            fn diff(
                &self,
                _old: &[WitnessToken],
                _new: &[WitnessToken],
                _equals: &dyn Fn(&WitnessToken, &WitnessToken) -> bool,
            ) -> Vec<EditOp> {
                vec![EditOp::Keep { old: 0, new: 0 }]
            }
        }

        let old = Witness::new(vec![w("a"), w("b")]);
        let new = Witness::new(vec![w("a")]);
        let result = WitnessReconciler::with_differ(Box::new(BrokenDiffer))
            .changes_between_witnesses(0, &[Some(0), Some(1)], &old, &new);

        assert!(matches!(
            result,
            Err(ReconcileError::InconsistentEditScript { .. })
        ));
    }

    #[test]
    fn test_word_insertion_anchors_after_preceding_aligned_column() {
        // a word inserted mid-sentence anchors after the last aligned column
        let old = Witness::new(vec![w("the"), ws(), w("cat")]);
        let new = Witness::new(vec![w("the"), ws(), w("big"), ws(), w("cat")]);

        let changes = WitnessReconciler::new()
            .changes_between_witnesses(0, &[Some(0), None, Some(2)], &old, &new)
            .unwrap();

        assert_eq!(
            changes.ct_changes,
            vec![CollationChange::InsertColumnAfter {
                after_col: Some(0),
                token_index_in_new_witness: 2,
                new_token: w("big"),
                current_token: Some(w("the")),
            }]
        );
        assert_eq!(changes.token_conversion.get(2), Some(4));
    }

    #[test]
    fn test_corrected_word_becomes_replace() {
        // a typo fix keeps its alignment slot
        let old = Witness::new(vec![w("teh")]);
        let new = Witness::new(vec![w("the")]);

        let changes = WitnessReconciler::new()
            .changes_between_witnesses(0, &[Some(0)], &old, &new)
            .unwrap();

        assert_eq!(
            changes.ct_changes,
            vec![CollationChange::Replace {
                col: 0,
                old_index: 0,
                new_index: 0,
                current_token: w("teh"),
                new_token: w("the"),
            }]
        );
        assert_eq!(changes.token_conversion.get(0), Some(0));
    }

    #[test]
    fn test_removed_word_empties_its_cell() {
        // a removed word leaves its column behind, emptied
        let old = Witness::new(vec![w("cat"), ws(), w("dog")]);
        let new = Witness::new(vec![w("dog")]);

        let changes = WitnessReconciler::new()
            .changes_between_witnesses(0, &[Some(0), Some(2)], &old, &new)
            .unwrap();

        assert_eq!(
            changes.ct_changes,
            vec![CollationChange::EmptyCell {
                col: 0,
                current_token: Some(w("cat")),
            }]
        );
        assert_eq!(changes.token_conversion.get(2), Some(0));
        assert_eq!(changes.token_conversion.get(0), None);
        assert_eq!(changes.token_conversion.get(1), None);
    }

    #[test]
    fn test_inserted_whitespace_never_creates_a_column() {
        let old = Witness::new(vec![w("a"), w("b")]);
        let new = Witness::new(vec![w("a"), ws(), w("b")]);

        let changes = WitnessReconciler::new()
            .changes_between_witnesses(0, &[Some(0), Some(1)], &old, &new)
            .unwrap();

        assert_eq!(changes.ct_changes, vec![]);
        assert_eq!(
            changes.non_ct_changes,
            vec![NonCollationChange::Insert { index: 1 }]
        );
    }

    #[test]
    fn test_deletions_first_only_reorders_within_a_run() {
        let script = vec![
            EditOp::Insert { new: 0 },
            EditOp::Delete { old: 0 },
            EditOp::Keep { old: 1, new: 1 },
            EditOp::Insert { new: 2 },
            EditOp::Delete { old: 2 },
            EditOp::Insert { new: 3 },
        ];

        assert_eq!(
            deletions_first(script),
            vec![
                EditOp::Delete { old: 0 },
                EditOp::Insert { new: 0 },
                EditOp::Keep { old: 1, new: 1 },
                EditOp::Delete { old: 2 },
                EditOp::Insert { new: 2 },
                EditOp::Insert { new: 3 },
            ]
        );
    }

    #[test]
    fn test_conversion_array_is_total() {
        // every old token index must be either mapped or explicitly removed
        let old = Witness::new(vec![w("one"), ws(), w("two"), ws(), w("three")]);
        let new = Witness::new(vec![w("one"), ws(), w("three")]);

        let changes = WitnessReconciler::new()
            .changes_between_witnesses(0, &[Some(0), None, Some(2), Some(4)], &old, &new)
            .unwrap();

        assert_eq!(changes.token_conversion.len(), old.len());
        assert_eq!(changes.token_conversion.get(0), Some(0));
        assert_eq!(changes.token_conversion.get(4), Some(2));
    }
}
