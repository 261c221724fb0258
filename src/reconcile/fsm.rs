use tracing::{debug, trace};

use super::change::{CollationChange, NonCollationChange, TokenConversionArray};
use crate::{
    diff::EditOp,
    token::{TokenType, WitnessToken},
};

/// A script item classified against the collation row: aligned events carry
/// the matrix column whose cell references the item's old token, and
/// inserted tokens are aligned only when they are words (inserted
/// punctuation or whitespace never creates a new column).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FsmEvent {
    KeepAligned { old: usize, new: usize, col: usize },
    Keep { old: usize, new: usize },
    DeleteAligned { old: usize, col: usize },
    Delete { old: usize },
    InsertAligned { new: usize },
    Insert { new: usize },
}

pub(crate) fn classify(
    op: EditOp,
    ct_row: &[Option<usize>],
    new_tokens: &[WitnessToken],
) -> FsmEvent {
    let column_of = |old: usize| ct_row.iter().position(|cell| *cell == Some(old));

    match op {
        EditOp::Keep { old, new } => match column_of(old) {
            Some(col) => FsmEvent::KeepAligned { old, new, col },
            None => FsmEvent::Keep { old, new },
        },
        EditOp::Delete { old } => match column_of(old) {
            Some(col) => FsmEvent::DeleteAligned { old, col },
            None => FsmEvent::Delete { old },
        },
        EditOp::Insert { new } => {
            if new_tokens[new].token_type == TokenType::Word {
                FsmEvent::InsertAligned { new }
            } else {
                FsmEvent::Insert { new }
            }
        }
    }
}

/// FSM state: either scanning, or holding one deletion whose alignment slot
/// may still be claimed by a following insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Scanning,
    /// An aligned token was deleted at `col`; if an aligned insertion
    /// arrives before the next structural event, the pair becomes a
    /// `Replace` at the same column instead of empty-then-new-column.
    PendingDelete { old: usize, col: usize },
}

/// The two-state reconciliation machine of the witness-update algorithm.
///
/// Processes classified edit-script events strictly in script order,
/// tracking the last column confirmed aligned (insertion anchor) and at most
/// one pending deletion.
pub(crate) struct ReconcilerFsm<'a> {
    old_tokens: &'a [WitnessToken],
    new_tokens: &'a [WitnessToken],
    state: State,
    /// Last matrix column confirmed aligned; `None` before the first one.
    last_ct_column: Option<usize>,
    /// Old-witness index of the token at `last_ct_column`.
    last_ct_token: Option<usize>,
    conversion: TokenConversionArray,
    ct_changes: Vec<CollationChange>,
    non_ct_changes: Vec<NonCollationChange>,
}

impl<'a> ReconcilerFsm<'a> {
    pub(crate) fn new(old_tokens: &'a [WitnessToken], new_tokens: &'a [WitnessToken]) -> Self {
        Self {
            old_tokens,
            new_tokens,
            state: State::Scanning,
            last_ct_column: None,
            last_ct_token: None,
            conversion: TokenConversionArray::new(old_tokens.len()),
            ct_changes: Vec::new(),
            non_ct_changes: Vec::new(),
        }
    }

    pub(crate) fn step(&mut self, event: FsmEvent) {
        trace!(?event, state = ?self.state, last_ct_column = ?self.last_ct_column, "fsm step");

        match (self.state, event) {
            (State::Scanning, FsmEvent::KeepAligned { old, new, col }) => {
                self.conversion.set_mapped(old, new);
                self.set_anchor(col, old);
            }

            (State::Scanning, FsmEvent::Keep { old, new })
            | (State::PendingDelete { .. }, FsmEvent::Keep { old, new }) => {
                self.conversion.set_mapped(old, new);
            }

            (State::Scanning, FsmEvent::InsertAligned { new }) => {
                self.emit(CollationChange::InsertColumnAfter {
                    after_col: self.last_ct_column,
                    token_index_in_new_witness: new,
                    new_token: self.new_tokens[new].clone(),
                    current_token: self.last_ct_token.map(|i| self.old_tokens[i].clone()),
                });
            }

            (State::Scanning, FsmEvent::Insert { new })
            | (State::PendingDelete { .. }, FsmEvent::Insert { new }) => {
                self.non_ct_changes.push(NonCollationChange::Insert { index: new });
            }

            (State::Scanning, FsmEvent::DeleteAligned { old, col }) => {
                self.set_anchor(col, old);
                self.state = State::PendingDelete { old, col };
            }

            (State::Scanning, FsmEvent::Delete { old }) => {
                self.conversion.set_removed(old);
                self.non_ct_changes.push(NonCollationChange::Delete { index: old });
            }

            (
                State::PendingDelete {
                    old: pending,
                    col: pending_col,
                },
                FsmEvent::KeepAligned { old, new, col },
            ) => {
                // the pending deletion found no replacement
                self.resolve_pending_as_empty(pending, pending_col);
                self.conversion.set_mapped(old, new);
                self.set_anchor(col, old);
                self.state = State::Scanning;
            }

            (
                State::PendingDelete {
                    old: pending,
                    col: pending_col,
                },
                FsmEvent::InsertAligned { new },
            ) => {
                // deletion immediately answered by an insertion: a word-level
                // correction keeping the alignment slot
                self.conversion.set_mapped(pending, new);
                self.emit(CollationChange::Replace {
                    col: pending_col,
                    old_index: pending,
                    new_index: new,
                    current_token: self.old_tokens[pending].clone(),
                    new_token: self.new_tokens[new].clone(),
                });
                // the anchor stays at the replaced column; an insert event
                // has no collation-row index of its own
                self.last_ct_token = Some(pending);
                self.state = State::Scanning;
            }

            (
                State::PendingDelete {
                    old: pending,
                    col: pending_col,
                },
                FsmEvent::DeleteAligned { old, col },
            ) => {
                self.resolve_pending_as_empty(pending, pending_col);
                self.set_anchor(col, old);
                self.state = State::PendingDelete { old, col };
            }

            (State::PendingDelete { .. }, FsmEvent::Delete { old }) => {
                self.conversion.set_removed(old);
                self.non_ct_changes.push(NonCollationChange::Delete { index: old });
            }
        }
    }

    /// End of script: an outstanding pending deletion empties its cell.
    pub(crate) fn finish(
        mut self,
    ) -> (
        TokenConversionArray,
        Vec<CollationChange>,
        Vec<NonCollationChange>,
    ) {
        if let State::PendingDelete { old, col } = self.state {
            self.resolve_pending_as_empty(old, col);
            self.state = State::Scanning;
        }

        (self.conversion, self.ct_changes, self.non_ct_changes)
    }

    fn set_anchor(&mut self, col: usize, old: usize) {
        self.last_ct_column = Some(col);
        self.last_ct_token = Some(old);
    }

    fn resolve_pending_as_empty(&mut self, pending: usize, pending_col: usize) {
        self.conversion.set_removed(pending);
        self.emit(CollationChange::EmptyCell {
            col: pending_col,
            current_token: Some(self.old_tokens[pending].clone()),
        });
    }

    fn emit(&mut self, change: CollationChange) {
        debug!(?change, "emitting collation change");
        self.ct_changes.push(change);
    }
}
