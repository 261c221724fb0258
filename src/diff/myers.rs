//! Myers' diff algorithm.
//!
//! * time: `O((N+M)D)`
//! * space `O(N+M)`
//!
//! Divide-and-conquer variant after [the original article by Eugene W.
//! Myers](http://www.xmailserver.org/diff2.pdf), structured like the
//! implementation in the `similar` crate but generalized to a caller-supplied
//! equality predicate: token equality for collation purposes is a domain rule
//! (whitespace collapsing, normalized word forms), not `PartialEq`.

use std::ops::{Index, IndexMut, Range};

use super::{EditOp, SequenceDiffer};

/// The default `SequenceDiffer`: a shortest-edit-script Myers diff.
#[derive(Debug, Clone, Copy, Default)]
pub struct MyersDiffer;

impl<T> SequenceDiffer<T> for MyersDiffer {
    fn diff(&self, old: &[T], new: &[T], equals: &dyn Fn(&T, &T) -> bool) -> Vec<EditOp> {
        myers_diff(old, new, equals)
    }
}

/// Diff `old` against `new`, emitting one `EditOp` per sequence item.
pub(crate) fn myers_diff<T>(old: &[T], new: &[T], equals: &dyn Fn(&T, &T) -> bool) -> Vec<EditOp> {
    let max_d = (old.len() + new.len()).div_ceil(2) + 1;
    let mut vb = V::new(max_d);
    let mut vf = V::new(max_d);
    let mut result = Vec::new();

    conquer(
        old,
        0..old.len(),
        new,
        0..new.len(),
        &mut vf,
        &mut vb,
        equals,
        &mut result,
    );

    result
}

fn common_prefix_len<T>(
    old: &[T],
    old_range: Range<usize>,
    new: &[T],
    new_range: Range<usize>,
    equals: &dyn Fn(&T, &T) -> bool,
) -> usize {
    old[old_range]
        .iter()
        .zip(new[new_range].iter())
        .take_while(|(a, b)| equals(a, b))
        .count()
}

fn common_suffix_len<T>(
    old: &[T],
    old_range: Range<usize>,
    new: &[T],
    new_range: Range<usize>,
    equals: &dyn Fn(&T, &T) -> bool,
) -> usize {
    old[old_range]
        .iter()
        .rev()
        .zip(new[new_range].iter().rev())
        .take_while(|(a, b)| equals(a, b))
        .count()
}

/// `V` contains the endpoints of the furthest reaching `D-paths`. For each
/// recorded endpoint `(x,y)` in diagonal `k`, only `x` is retained because
/// `y` can be computed from `x - k`. Since `k` can be negative, `V` wraps a
/// Vec plus an `offset` mapping negative `k`'s back to a value >= 0.
#[derive(Debug)]
struct V {
    offset: isize,
    v: Vec<usize>,
}

impl V {
    fn new(max_d: usize) -> Self {
        let offset = isize::try_from(max_d).unwrap_or(isize::MAX);
        Self {
            offset,
            v: vec![0; 2 * max_d],
        }
    }

    fn len(&self) -> usize { self.v.len() }
}

impl Index<isize> for V {
    type Output = usize;

    fn index(&self, index: isize) -> &Self::Output {
        let idx = usize::try_from(index + self.offset).unwrap_or(usize::MAX);
        &self.v[idx.min(self.v.len().saturating_sub(1))]
    }
}

impl IndexMut<isize> for V {
    fn index_mut(&mut self, index: isize) -> &mut Self::Output {
        let idx = usize::try_from(index + self.offset).unwrap_or(usize::MAX);
        let len = self.v.len();
        &mut self.v[idx.min(len.saturating_sub(1))]
    }
}

fn split_at(range: Range<usize>, at: usize) -> (Range<usize>, Range<usize>) {
    (range.start..at, at..range.end)
}

/// Finds the middle snake of an optimal D-path by running the basic
/// algorithm simultaneously in the forward and reverse directions until the
/// furthest reaching paths starting at opposing corners overlap.
#[allow(clippy::too_many_arguments)]
fn find_middle_snake<T>(
    old: &[T],
    old_range: Range<usize>,
    new: &[T],
    new_range: Range<usize>,
    vf: &mut V,
    vb: &mut V,
    equals: &dyn Fn(&T, &T) -> bool,
) -> Option<(usize, usize)> {
    let n = old_range.len();
    let m = new_range.len();

    // By Lemma 1 in the paper, the optimal edit script length is odd or even
    // as `delta` is odd or even.
    let delta = isize::try_from(n).unwrap_or(isize::MAX) - isize::try_from(m).unwrap_or(isize::MAX);
    let odd = delta & 1 == 1;

    // The initial point at (0, -1)
    vf[1] = 0;
    // The initial point at (N, M+1)
    vb[1] = 0;

    let d_max = (n + m).div_ceil(2) + 1;
    assert!(vf.len() >= d_max);
    assert!(vb.len() >= d_max);

    let d_max_isize = isize::try_from(d_max).unwrap_or(isize::MAX);
    for d in 0..d_max_isize {
        // Forward path
        for k in (-d..=d).rev().step_by(2) {
            let mut x = if k == -d || (k != d && vf[k - 1] < vf[k + 1]) {
                vf[k + 1]
            } else {
                vf[k - 1] + 1
            };
            let y = usize::try_from(isize::try_from(x).unwrap_or(isize::MAX) - k).unwrap_or(0);

            // The coordinate of the start of a snake
            let (x0, y0) = (x, y);
            // While the sequences are identical, keep moving through the
            // graph with no cost
            if x < old_range.len() && y < new_range.len() {
                let advance = common_prefix_len(
                    old,
                    old_range.start + x..old_range.end,
                    new,
                    new_range.start + y..new_range.end,
                    equals,
                );
                x += advance;
            }

            vf[k] = x;

            // Only check for connections from the forward search when N - M
            // is odd and there is a reciprocal k line coming from the other
            // direction.
            if odd && (k - delta).abs() <= (d - 1) && vf[k] + vb[-(k - delta)] >= n {
                return Some((x0 + old_range.start, y0 + new_range.start));
            }
        }

        // Backward path
        for k in (-d..=d).rev().step_by(2) {
            let mut x = if k == -d || (k != d && vb[k - 1] < vb[k + 1]) {
                vb[k + 1]
            } else {
                vb[k - 1] + 1
            };
            let mut y = usize::try_from(isize::try_from(x).unwrap_or(isize::MAX) - k).unwrap_or(0);

            if x < n && y < m {
                let advance = common_suffix_len(
                    old,
                    old_range.start..old_range.start + n - x,
                    new,
                    new_range.start..new_range.start + m - y,
                    equals,
                );
                x += advance;
                y += advance;
            }

            vb[k] = x;

            if !odd && (k - delta).abs() <= d && vb[k] + vf[-(k - delta)] >= n {
                return Some((n - x + old_range.start, m - y + new_range.start));
            }
        }
    }

    None
}

#[allow(clippy::too_many_arguments)]
fn conquer<T>(
    old: &[T],
    mut old_range: Range<usize>,
    new: &[T],
    mut new_range: Range<usize>,
    vf: &mut V,
    vb: &mut V,
    equals: &dyn Fn(&T, &T) -> bool,
    result: &mut Vec<EditOp>,
) {
    let prefix_len = common_prefix_len(
        old,
        old_range.clone(),
        new,
        new_range.clone(),
        equals,
    );
    for i in 0..prefix_len {
        result.push(EditOp::Keep {
            old: old_range.start + i,
            new: new_range.start + i,
        });
    }
    old_range.start += prefix_len;
    new_range.start += prefix_len;

    let suffix_len = common_suffix_len(
        old,
        old_range.clone(),
        new,
        new_range.clone(),
        equals,
    );
    let suffix_start = (old_range.end - suffix_len, new_range.end - suffix_len);
    old_range.end -= suffix_len;
    new_range.end -= suffix_len;

    if old_range.is_empty() && new_range.is_empty() {
        // nothing in the middle
    } else if new_range.is_empty() {
        result.extend(old_range.clone().map(|old| EditOp::Delete { old }));
    } else if old_range.is_empty() {
        result.extend(new_range.clone().map(|new| EditOp::Insert { new }));
    } else if let Some((x_start, y_start)) = find_middle_snake(
        old,
        old_range.clone(),
        new,
        new_range.clone(),
        vf,
        vb,
        equals,
    ) {
        let (old_a, old_b) = split_at(old_range, x_start);
        let (new_a, new_b) = split_at(new_range, y_start);
        conquer(old, old_a, new, new_a, vf, vb, equals, result);
        conquer(old, old_b, new, new_b, vf, vb, equals, result);
    } else {
        result.extend(old_range.clone().map(|old| EditOp::Delete { old }));
        result.extend(new_range.clone().map(|new| EditOp::Insert { new }));
    }

    for i in 0..suffix_len {
        result.push(EditOp::Keep {
            old: suffix_start.0 + i,
            new: suffix_start.1 + i,
        });
    }
}
