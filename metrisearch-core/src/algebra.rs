//! Sorted-set algebra.
//!
//! Every tag query is eventually reduced to combining sorted identifier lists.
//! Both operations here take any number of ascending sequences and produce one
//! ascending, duplicate-free sequence via a heap-driven k-way merge.
//!
//! Inputs must already be sorted ascending. Duplicates inside one input are
//! fine. Unsorted input is not detected and produces wrong (but memory safe)
//! output.

use core::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use smallvec::SmallVec;

/// Current head of one input set inside the merge heap.
#[derive(Clone, Copy, PartialEq, Eq)]
struct Head<T> {
    value: T,
    set: usize,
}

impl<T: Ord> Ord for Head<T> {
    #[inline(always)]
    fn cmp(&self, other: &Self) -> Ordering {
        self.value
            .cmp(&other.value)
            .then_with(|| self.set.cmp(&other.set))
    }
}

impl<T: Ord> PartialOrd for Head<T> {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Sorted, deduplicated union of all `sets`.
///
/// Empty sets are skipped before the heap is built. Runs in
/// O(total elements × log k) for k non-empty sets.
///
/// ```
/// use metrisearch_core::algebra::union;
///
/// assert_eq!(union(&[vec![1, 3, 5], vec![2, 3, 4]]), vec![1, 2, 3, 4, 5]);
/// ```
pub fn union<T, S>(sets: &[S]) -> Vec<T>
where
    T: Ord + Copy,
    S: AsRef<[T]>,
{
    let mut heap: BinaryHeap<Reverse<Head<T>>> = BinaryHeap::with_capacity(sets.len());
    let mut total = 0usize;
    for (set, list) in sets.iter().enumerate() {
        let list = list.as_ref();
        // empty sets have nothing to add to the union
        if let Some(&value) = list.first() {
            heap.push(Reverse(Head { value, set }));
            total += list.len();
        }
    }

    let mut cursors: SmallVec<[usize; 16]> = SmallVec::from_elem(0, sets.len());
    let mut out: Vec<T> = Vec::with_capacity(total);

    while let Some(Reverse(head)) = heap.pop() {
        if out.last() != Some(&head.value) {
            out.push(head.value);
        }

        let list = sets[head.set].as_ref();
        cursors[head.set] += 1;
        if let Some(&value) = list.get(cursors[head.set]) {
            heap.push(Reverse(Head {
                value,
                set: head.set,
            }));
        }
    }

    out
}

/// Sorted, deduplicated intersection of all `sets`.
///
/// No sets, or any empty set, yields an empty result. Each step pops every
/// heap entry tied at the current minimum; the minimum is emitted when all
/// sets were tied. The merge stops as soon as any set runs out, since nothing
/// later can be common to all of them.
///
/// ```
/// use metrisearch_core::algebra::intersect;
///
/// let sets = [vec![1, 2, 3, 4], vec![2, 4, 6], vec![2, 3, 4, 5]];
/// assert_eq!(intersect(&sets), vec![2, 4]);
/// ```
pub fn intersect<T, S>(sets: &[S]) -> Vec<T>
where
    T: Ord + Copy,
    S: AsRef<[T]>,
{
    let k = sets.len();
    if k == 0 {
        return Vec::new();
    }

    let mut heap: BinaryHeap<Reverse<Head<T>>> = BinaryHeap::with_capacity(k);
    let mut shortest = usize::MAX;
    for (set, list) in sets.iter().enumerate() {
        let list = list.as_ref();
        // any empty set --> empty intersection
        let Some(&value) = list.first() else {
            return Vec::new();
        };
        heap.push(Reverse(Head { value, set }));
        shortest = shortest.min(list.len());
    }

    let mut cursors: SmallVec<[usize; 16]> = SmallVec::from_elem(0, k);
    let mut tied: SmallVec<[usize; 16]> = SmallVec::new();
    let mut out: Vec<T> = Vec::with_capacity(shortest);

    while let Some(&Reverse(Head { value: min, .. })) = heap.peek() {
        tied.clear();
        while let Some(&Reverse(head)) = heap.peek() {
            if head.value != min {
                break;
            }
            heap.pop();
            tied.push(head.set);
        }

        if tied.len() == k && out.last() != Some(&min) {
            out.push(min);
        }

        for &set in &tied {
            let list = sets[set].as_ref();
            cursors[set] += 1;
            match list.get(cursors[set]) {
                Some(&value) => heap.push(Reverse(Head { value, set })),
                None => return out,
            }
        }
    }

    out
}

/// Two-way merge of ascending slices into `out`, collapsing equal heads.
///
/// Produces the same elements as `union(&[a, b])` when neither input holds
/// internal duplicates.
pub fn merge_sorted_dedup<T: Ord + Copy>(a: &[T], b: &[T], out: &mut Vec<T>) {
    let mut ai = 0usize;
    let mut bi = 0usize;

    while ai < a.len() && bi < b.len() {
        match a[ai].cmp(&b[bi]) {
            Ordering::Less => {
                out.push(a[ai]);
                ai += 1;
            }
            Ordering::Greater => {
                out.push(b[bi]);
                bi += 1;
            }
            Ordering::Equal => {
                out.push(a[ai]);
                ai += 1;
                bi += 1;
            }
        }
    }

    out.extend_from_slice(&a[ai..]);
    out.extend_from_slice(&b[bi..]);
}
