use tracing::trace;

use super::{diff_impl, DiffContext};
use crate::{ArraySlot, Delta, Node};

/// Pairs elements of the old and new arrays.
///
/// Non-container elements pair by equality. Containers pair by equality or,
/// failing that, by equal object hashes.
struct ItemMatcher<'a> {
    lhs: &'a [Node],
    rhs: &'a [Node],
    lhs_hashes: Vec<Option<String>>,
    rhs_hashes: Vec<Option<String>>,
}

impl<'a> ItemMatcher<'a> {
    fn new(lhs: &'a [Node], rhs: &'a [Node], context: &DiffContext<'_>) -> Self {
        let hashes = |items: &[Node]| -> Vec<Option<String>> {
            items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    item.is_container().then(|| context.hooks.object_hash(item, index)).flatten()
                })
                .collect()
        };
        Self { lhs, rhs, lhs_hashes: hashes(lhs), rhs_hashes: hashes(rhs) }
    }

    fn matches(&self, i: usize, j: usize) -> bool {
        let (left, right) = (&self.lhs[i], &self.rhs[j]);
        if left == right {
            return true;
        }
        if !left.is_container() || !right.is_container() {
            return false;
        }
        match (&self.lhs_hashes[i], &self.rhs_hashes[j]) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

pub(super) fn diff_lists(lhs: &[Node], rhs: &[Node], context: &DiffContext<'_>) -> Option<Delta> {
    let matcher = ItemMatcher::new(lhs, rhs, context);
    let (len1, len2) = (lhs.len(), rhs.len());
    let mut entries = Vec::new();

    let mut head = 0;
    while head < len1 && head < len2 && matcher.matches(head, head) {
        push_nested(&mut entries, lhs, rhs, head, head, context);
        head += 1;
    }

    let mut tail = 0;
    while head + tail < len1 && head + tail < len2 && matcher.matches(len1 - 1 - tail, len2 - 1 - tail)
    {
        push_nested(&mut entries, lhs, rhs, len1 - 1 - tail, len2 - 1 - tail, context);
        tail += 1;
    }

    if head + tail == len1 {
        for (index, added) in rhs.iter().enumerate().take(len2 - tail).skip(head) {
            entries.push((ArraySlot::Index(index), Delta::added(added.clone())));
        }
        return finish(entries);
    }
    if head + tail == len2 {
        for (index, removed) in lhs.iter().enumerate().take(len1 - tail).skip(head) {
            entries.push((ArraySlot::Vacated(index), Delta::deleted(removed.clone())));
        }
        return finish(entries);
    }

    let (common_lhs, common_rhs) = longest_common_subsequence(&matcher, head..len1 - tail, head..len2 - tail);

    let mut removed = Vec::new();
    for index in head..len1 - tail {
        if !common_lhs.contains(&index) {
            entries.push((ArraySlot::Vacated(index), Delta::deleted(lhs[index].clone())));
            removed.push(index);
        }
    }

    for j in head..len2 - tail {
        if let Some(position) = common_rhs.iter().position(|&index| index == j) {
            push_nested(&mut entries, lhs, rhs, common_lhs[position], j, context);
            continue;
        }
        let moved_from = if context.options.detect_move() {
            removed.iter().position(|&i| matcher.matches(i, j)).map(|slot| removed.remove(slot))
        } else {
            None
        };
        match moved_from {
            Some(i) => {
                trace!(from = i, to = j, "array element moved");
                let value =
                    if context.options.include_value_on_move() { lhs[i].clone() } else { Node::from("") };
                if let Some(entry) = entries.iter_mut().find(|entry| entry.0 == ArraySlot::Vacated(i)) {
                    entry.1 = Delta::moved(value, j);
                }
                push_nested(&mut entries, lhs, rhs, i, j, context);
            }
            None => entries.push((ArraySlot::Index(j), Delta::added(rhs[j].clone()))),
        }
    }

    finish(entries)
}

fn push_nested(
    entries: &mut Vec<(ArraySlot, Delta)>,
    lhs: &[Node],
    rhs: &[Node],
    i: usize,
    j: usize,
    context: &DiffContext<'_>,
) {
    if let Some(delta) = diff_impl(Some(&lhs[i]), Some(&rhs[j]), context) {
        entries.push((ArraySlot::Index(j), delta));
    }
}

fn finish(entries: Vec<(ArraySlot, Delta)>) -> Option<Delta> {
    if entries.is_empty() {
        None
    } else {
        Some(Delta::array(entries))
    }
}

/// Returns the paired old-side and new-side indices of the longest common
/// subsequence of the two ranges, in ascending order.
fn longest_common_subsequence(
    matcher: &ItemMatcher<'_>,
    lhs: std::ops::Range<usize>,
    rhs: std::ops::Range<usize>,
) -> (Vec<usize>, Vec<usize>) {
    let n = lhs.len();
    let m = rhs.len();
    let mut table = vec![vec![0usize; m + 1]; n + 1];
    for i in 0..n {
        for j in 0..m {
            if matcher.matches(lhs.start + i, rhs.start + j) {
                table[i + 1][j + 1] = table[i][j] + 1;
            } else {
                table[i + 1][j + 1] = table[i][j + 1].max(table[i + 1][j]);
            }
        }
    }

    let mut common_lhs = Vec::with_capacity(table[n][m]);
    let mut common_rhs = Vec::with_capacity(table[n][m]);
    let mut i = n;
    let mut j = m;
    while i > 0 && j > 0 {
        if matcher.matches(lhs.start + i - 1, rhs.start + j - 1) {
            common_lhs.push(lhs.start + i - 1);
            common_rhs.push(rhs.start + j - 1);
            i -= 1;
            j -= 1;
        } else if table[i][j - 1] > table[i - 1][j] {
            j -= 1;
        } else {
            i -= 1;
        }
    }
    common_lhs.reverse();
    common_rhs.reverse();
    (common_lhs, common_rhs)
}
