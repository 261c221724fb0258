use std::collections::BTreeSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use tracing::warn;

/// A contiguous, inclusive range of column indices grouped together for
/// editorial/apparatus purposes.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnGroup {
    pub from: usize,
    pub to: usize,
}

/// Tracks which contiguous columns of the matrix are grouped together.
///
/// The grouping over columns `0..length` is stored as the set of columns
/// that are grouped with their following column; the equivalent interval
/// representation is derived on demand. Singleton groups are implicit:
/// `groups` reports every column as belonging to exactly one group, so the
/// groups always tile `[0, length)` with contiguous, non-overlapping ranges.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnGroupIndex {
    length: usize,
    grouped_with_next: BTreeSet<usize>,
}

impl ColumnGroupIndex {
    #[must_use]
    pub fn new(length: usize) -> Self {
        Self {
            length,
            grouped_with_next: BTreeSet::new(),
        }
    }

    /// Builds an index over `length` columns with the given columns grouped
    /// with their successors. Out-of-range entries are ignored.
    #[must_use]
    pub fn with_grouped(length: usize, grouped_with_next: impl IntoIterator<Item = usize>) -> Self {
        let mut index = Self::new(length);
        for column in grouped_with_next {
            index.group_with_next(column);
        }
        index
    }

    #[must_use]
    pub fn len(&self) -> usize { self.length }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.length == 0 }

    #[must_use]
    pub fn is_grouped_with_next(&self, column: usize) -> bool {
        self.grouped_with_next.contains(&column)
    }

    #[must_use]
    pub fn is_grouped_with_previous(&self, column: usize) -> bool {
        column > 0 && self.grouped_with_next.contains(&(column - 1))
    }

    pub fn group_with_next(&mut self, column: usize) {
        if column + 1 >= self.length {
            warn!(column, length = self.length, "cannot group with next, column out of bounds");
            return;
        }
        self.grouped_with_next.insert(column);
    }

    pub fn ungroup_with_next(&mut self, column: usize) {
        self.grouped_with_next.remove(&column);
    }

    pub fn group_interval(&mut self, from: usize, to: usize) {
        for column in from..to {
            self.group_with_next(column);
        }
    }

    pub fn ungroup_interval(&mut self, from: usize, to: usize) {
        for column in from..to {
            self.ungroup_with_next(column);
        }
    }

    /// The group the given column belongs to.
    #[must_use]
    pub fn group_for_column(&self, column: usize) -> ColumnGroup {
        let mut from = column;
        let mut to = column;

        while self.is_grouped_with_previous(from) {
            from -= 1;
        }
        while self.is_grouped_with_next(to) {
            to += 1;
        }

        ColumnGroup { from, to }
    }

    /// All groups in column order, tiling `[0, length)`.
    #[must_use]
    pub fn groups(&self) -> Vec<ColumnGroup> {
        let mut groups = Vec::new();
        let mut from = 0;

        for column in 0..self.length {
            if !self.is_grouped_with_next(column) {
                groups.push(ColumnGroup { from, to: column });
                from = column + 1;
            }
        }

        groups
    }

    /// Grows the sequence by one column placed after `after` (`None` puts the
    /// new column in position zero). A column inserted strictly inside a
    /// multi-column group, or right after its last member, extends that
    /// group; inserted after a singleton it stays ungrouped.
    pub fn insert_column_after(&mut self, after: Option<usize>) {
        let Some(after) = after else {
            // every pair shifts up by one; the new first column is ungrouped
            self.grouped_with_next = self.grouped_with_next.iter().map(|n| n + 1).collect();
            self.length += 1;
            return;
        };

        if after >= self.length {
            warn!(after, length = self.length, "cannot insert column, position out of bounds");
            return;
        }

        let mut new_groups = Vec::new();
        for group in self.groups() {
            if group.to < after {
                new_groups.push(group);
            } else if group.from <= after {
                let mut updated = group;
                if group.to != group.from {
                    updated.to += 1;
                }
                new_groups.push(updated);
            } else {
                new_groups.push(ColumnGroup {
                    from: group.from + 1,
                    to: group.to + 1,
                });
            }
        }

        self.length += 1;
        self.rebuild_from_groups(&new_groups);
    }

    /// Removes one column, preserving group consistency: the column's group
    /// shrinks (or disappears, if it was a singleton) and all later groups
    /// are renumbered down by one.
    pub fn remove_column(&mut self, column: usize) {
        if column >= self.length {
            warn!(column, length = self.length, "cannot remove column, position out of bounds");
            return;
        }

        let mut new_groups = Vec::new();
        for group in self.groups() {
            if group.to < column {
                new_groups.push(group);
            } else if group.from <= column {
                // the remaining members keep their grouping, shifted down
                if group.to != group.from {
                    new_groups.push(ColumnGroup {
                        from: group.from,
                        to: group.to - 1,
                    });
                }
            } else {
                new_groups.push(ColumnGroup {
                    from: group.from - 1,
                    to: group.to - 1,
                });
            }
        }

        self.length -= 1;
        self.rebuild_from_groups(&new_groups);
    }

    fn rebuild_from_groups(&mut self, groups: &[ColumnGroup]) {
        self.grouped_with_next = groups
            .iter()
            .flat_map(|group| group.from..group.to)
            .collect();
    }
}
