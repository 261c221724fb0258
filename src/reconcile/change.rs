#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::token::WitnessToken;

/// A matrix-level edit produced by reconciliation.
///
/// Changes must be applied in emission order: `after_col` in a later
/// `InsertColumnAfter` assumes the columns of earlier insertions in the same
/// batch already exist.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum CollationChange {
    /// A new token exists in the new witness with no counterpart in the old
    /// alignment; a new column goes immediately after `after_col` (`None`
    /// puts it before the first column).
    InsertColumnAfter {
        after_col: Option<usize>,
        token_index_in_new_witness: usize,
        new_token: WitnessToken,
        /// The token at the anchor column, for change review display.
        current_token: Option<WitnessToken>,
    },

    /// The token occupying `col` no longer exists in the new witness.
    EmptyCell {
        col: usize,
        current_token: Option<WitnessToken>,
    },

    /// The token at `col` is replaced in place by a different token of the
    /// new witness, preserving the alignment slot.
    Replace {
        col: usize,
        old_index: usize,
        new_index: usize,
        current_token: WitnessToken,
        new_token: WitnessToken,
    },
}

/// A token change outside the collation alignment (inserted or deleted
/// whitespace/punctuation that never occupied a column).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonCollationChange {
    /// `index` is a position in the new witness.
    Insert { index: usize },
    /// `index` is a position in the old witness.
    Delete { index: usize },
}

/// Total map from old-witness token indices to their new-witness
/// counterparts; `None` marks a token deleted without successor.
///
/// The caller rewrites every matrix cell of the updated row through this
/// map, except the cells explicitly covered by `CollationChange` entries.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenConversionArray {
    entries: Vec<Option<usize>>,
}

impl TokenConversionArray {
    #[must_use]
    pub fn new(old_token_count: usize) -> Self {
        Self {
            entries: vec![None; old_token_count],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize { self.entries.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// The new index for `old_index`, or `None` if the token was deleted.
    ///
    /// `old_index` must be within `0..len()`; the reconciler validates its
    /// inputs so every collation-row reference is in range.
    #[must_use]
    pub fn get(&self, old_index: usize) -> Option<usize> { self.entries[old_index] }

    /// Whether every token maps to its own index (the identity conversion of
    /// an unchanged witness).
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.entries
            .iter()
            .enumerate()
            .all(|(old, new)| *new == Some(old))
    }

    pub(crate) fn set_mapped(&mut self, old_index: usize, new_index: usize) {
        self.entries[old_index] = Some(new_index);
    }

    pub(crate) fn set_removed(&mut self, old_index: usize) { self.entries[old_index] = None; }
}

/// The complete, ordered result of reconciling one witness row.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct WitnessChangeSet {
    /// The matrix row this change-set belongs to.
    pub row: usize,
    pub token_conversion: TokenConversionArray,
    /// Matrix-level changes, to be applied in this order.
    pub ct_changes: Vec<CollationChange>,
    /// Token changes outside the alignment, for review display only.
    pub non_ct_changes: Vec<NonCollationChange>,
}

impl WitnessChangeSet {
    /// True when the update needs no matrix edits at all.
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.ct_changes.is_empty() && self.non_ct_changes.is_empty() && self.token_conversion.is_identity()
    }
}
