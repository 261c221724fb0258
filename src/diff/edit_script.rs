use crate::error::ReconcileError;

/// One step of an edit script.
///
/// `Keep` and `Delete` carry a position in the old sequence, `Keep` and
/// `Insert` a position in the new one. Replaying a valid script walks both
/// sequences front to back without gaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOp {
    Keep { old: usize, new: usize },
    Delete { old: usize },
    Insert { new: usize },
}

/// Checks that `script` reconstructs `new` from `old`.
///
/// A differ that returns a script failing this check has violated its
/// contract; the caller must not try to recover.
///
/// # Errors
///
/// Returns `ReconcileError::InconsistentEditScript` describing the first
/// violation found.
pub fn validate_edit_script<T>(
    script: &[EditOp],
    old: &[T],
    new: &[T],
    equals: impl Fn(&T, &T) -> bool,
) -> Result<(), ReconcileError> {
    let mut next_old = 0;
    let mut next_new = 0;

    for (i, op) in script.iter().enumerate() {
        match *op {
            EditOp::Keep {
                old: old_index,
                new: new_index,
            } => {
                if old_index != next_old || new_index != next_new {
                    return Err(inconsistent(format!(
                        "keep at step {i} references ({old_index}, {new_index}), expected \
                         ({next_old}, {next_new})"
                    )));
                }
                let (Some(old_item), Some(new_item)) = (old.get(old_index), new.get(new_index))
                else {
                    return Err(inconsistent(format!("keep at step {i} is out of range")));
                };
                if !equals(old_item, new_item) {
                    return Err(inconsistent(format!(
                        "keep at step {i} pairs unequal items {old_index} and {new_index}"
                    )));
                }
                next_old += 1;
                next_new += 1;
            }
            EditOp::Delete { old: old_index } => {
                if old_index != next_old {
                    return Err(inconsistent(format!(
                        "delete at step {i} references {old_index}, expected {next_old}"
                    )));
                }
                next_old += 1;
            }
            EditOp::Insert { new: new_index } => {
                if new_index != next_new {
                    return Err(inconsistent(format!(
                        "insert at step {i} references {new_index}, expected {next_new}"
                    )));
                }
                next_new += 1;
            }
        }
    }

    if next_old != old.len() || next_new != new.len() {
        return Err(inconsistent(format!(
            "script covers {next_old} of {} old items and {next_new} of {} new items",
            old.len(),
            new.len()
        )));
    }

    Ok(())
}

fn inconsistent(reason: String) -> ReconcileError {
    ReconcileError::InconsistentEditScript { reason }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn eq(a: &char, b: &char) -> bool { a == b }

    #[test]
    fn test_valid_script_passes() {
        let old = ['a', 'b', 'c'];
        let new = ['a', 'x', 'c'];
        let script = [
            EditOp::Keep { old: 0, new: 0 },
            EditOp::Delete { old: 1 },
            EditOp::Insert { new: 1 },
            EditOp::Keep { old: 2, new: 2 },
        ];

        assert_eq!(validate_edit_script(&script, &old, &new, eq), Ok(()));
    }

    #[test]
    fn test_incomplete_script_fails() {
        let old = ['a', 'b'];
        let new = ['a'];
        let script = [EditOp::Keep { old: 0, new: 0 }];

        assert!(validate_edit_script(&script, &old, &new, eq).is_err());
    }

    #[test]
    fn test_unequal_keep_fails() {
        let old = ['a'];
        let new = ['b'];
        let script = [EditOp::Keep { old: 0, new: 0 }];

        assert!(validate_edit_script(&script, &old, &new, eq).is_err());
    }

    #[test]
    fn test_out_of_order_script_fails() {
        let old = ['a', 'b'];
        let new = ['a', 'b'];
        let script = [
            EditOp::Keep { old: 1, new: 1 },
            EditOp::Keep { old: 0, new: 0 },
        ];

        assert!(validate_edit_script(&script, &old, &new, eq).is_err());
    }
}
