//! Property-based tests for the finger tree's algebraic laws.
//!
//! Sequence laws for the end operations and concatenation, the monoid
//! relationship between a tree's measure and its elements, and the split
//! law for monotone predicates.

use fingertree::{Count, FingerTree, Measurer};
use proptest::prelude::*;

// =============================================================================
// Measurers and strategies
// =============================================================================

/// Sums element values; with non-negative elements the accumulated measure
/// is monotone, which makes it a valid split predicate source.
#[derive(Clone, Copy, Debug, Default)]
struct Total;

impl Measurer<i32> for Total {
    type Measure = i64;

    fn identity(&self) -> i64 {
        0
    }

    fn measure(&self, value: &i32) -> i64 {
        i64::from(*value)
    }

    fn sum(&self, left: &i64, right: &i64) -> i64 {
        left + right
    }
}

/// Generates a `FingerTree<i32>` with up to `max_size` elements.
fn finger_tree_strategy(max_size: usize) -> impl Strategy<Value = FingerTree<i32>> {
    prop::collection::vec(any::<i32>(), 0..max_size)
        .prop_map(|values| values.into_iter().collect())
}

/// Generates a small `FingerTree<i32>` for faster tests.
fn small_tree() -> impl Strategy<Value = FingerTree<i32>> {
    finger_tree_strategy(24)
}

proptest! {
    // =========================================================================
    // Sequence laws for construction and end operations
    // =========================================================================

    #[test]
    fn prop_from_values_round_trips(values in prop::collection::vec(any::<i32>(), 0..40)) {
        let tree = FingerTree::from_values(Count, values.clone());
        prop_assert_eq!(tree.to_vec(), values);
    }

    #[test]
    fn prop_push_front_prepends(tree in small_tree(), element: i32) {
        let mut expected = vec![element];
        expected.extend(tree.to_vec());
        prop_assert_eq!(tree.push_front(element).to_vec(), expected);
    }

    #[test]
    fn prop_push_back_appends(tree in small_tree(), element: i32) {
        let mut expected = tree.to_vec();
        expected.push(element);
        prop_assert_eq!(tree.push_back(element).to_vec(), expected);
    }

    #[test]
    fn prop_push_front_then_pop_front_round_trips(tree in small_tree(), element: i32) {
        let (popped, rest) = tree.push_front(element).pop_front().unwrap();
        prop_assert_eq!(popped, element);
        prop_assert_eq!(rest.to_vec(), tree.to_vec());
    }

    #[test]
    fn prop_push_back_then_pop_back_round_trips(tree in small_tree(), element: i32) {
        let (rest, popped) = tree.push_back(element).pop_back().unwrap();
        prop_assert_eq!(popped, element);
        prop_assert_eq!(rest.to_vec(), tree.to_vec());
    }

    #[test]
    fn prop_pop_front_inverts_iteration_order(tree in small_tree()) {
        let mut remaining = tree.clone();
        let mut popped = Vec::new();
        while let Ok((value, rest)) = remaining.pop_front() {
            popped.push(value);
            remaining = rest;
        }
        prop_assert_eq!(popped, tree.to_vec());
    }

    // =========================================================================
    // Concatenation laws
    // =========================================================================

    #[test]
    fn prop_concat_appends_sequences(left in small_tree(), right in small_tree()) {
        let mut expected = left.to_vec();
        expected.extend(right.to_vec());
        prop_assert_eq!(left.concat(&right).to_vec(), expected);
    }

    #[test]
    fn prop_concat_is_associative(
        first in small_tree(),
        second in small_tree(),
        third in small_tree(),
    ) {
        let left_grouped = first.concat(&second).concat(&third);
        let right_grouped = first.concat(&second.concat(&third));
        prop_assert_eq!(left_grouped.to_vec(), right_grouped.to_vec());
        prop_assert_eq!(left_grouped.measure(), right_grouped.measure());
    }

    #[test]
    fn prop_empty_is_concat_identity(tree in small_tree()) {
        let empty: FingerTree<i32> = FingerTree::new(Count);
        prop_assert_eq!(empty.concat(&tree).to_vec(), tree.to_vec());
        prop_assert_eq!(tree.concat(&empty).to_vec(), tree.to_vec());
    }

    #[test]
    fn prop_concat_all_counts_each_element_once(
        trees in prop::collection::vec(finger_tree_strategy(12), 1..5),
    ) {
        let expected: Vec<i32> = trees.iter().flat_map(FingerTree::to_vec).collect();
        let mut iterator = trees.into_iter();
        let first = iterator.next().unwrap();
        let joined = first.concat_all(iterator);
        prop_assert_eq!(joined.to_vec(), expected);
    }

    // =========================================================================
    // Measure laws
    // =========================================================================

    #[test]
    fn prop_count_measure_is_length(tree in small_tree()) {
        prop_assert_eq!(tree.measure(), tree.to_vec().len());
    }

    #[test]
    fn prop_measure_is_monoid_fold_of_elements(
        values in prop::collection::vec(any::<i32>(), 0..40),
    ) {
        let tree = FingerTree::from_values(Total, values.clone());
        let folded: i64 = values.into_iter().map(i64::from).sum();
        prop_assert_eq!(tree.measure(), folded);
    }

    #[test]
    fn prop_measure_survives_concat(
        left_values in prop::collection::vec(any::<i32>(), 0..30),
        right_values in prop::collection::vec(any::<i32>(), 0..30),
    ) {
        let left = FingerTree::from_values(Total, left_values.clone());
        let right = FingerTree::from_values(Total, right_values.clone());
        let folded: i64 = left_values
            .into_iter()
            .chain(right_values)
            .map(i64::from)
            .sum();
        prop_assert_eq!(left.concat(&right).measure(), folded);
    }

    // =========================================================================
    // Split laws
    // =========================================================================

    #[test]
    fn prop_split_partitions_the_sequence(tree in finger_tree_strategy(48), target in 0usize..50) {
        let (left, right) = tree.split(|count| *count > target);
        let mut rejoined = left.to_vec();
        rejoined.extend(right.to_vec());
        prop_assert_eq!(rejoined, tree.to_vec());
    }

    #[test]
    fn prop_split_point_is_the_first_flip(tree in finger_tree_strategy(48), target in 0usize..50) {
        let (left, right) = tree.split(|count| *count > target);
        if right.is_empty() {
            // The predicate never held, even over the whole measure.
            prop_assert!(tree.measure() <= target);
        } else {
            // The predicate fails on the left measure and holds one
            // element further.
            prop_assert!(left.measure() <= target);
            prop_assert!(left.measure() + 1 > target);
        }
    }

    #[test]
    fn prop_split_by_running_sum(values in prop::collection::vec(0i32..100, 0..40), threshold in 0i64..2_000) {
        let tree = FingerTree::from_values(Total, values);
        let (left, right) = tree.split(|sum| *sum > threshold);

        let mut rejoined = left.to_vec();
        rejoined.extend(right.to_vec());
        prop_assert_eq!(rejoined, tree.to_vec());
        prop_assert!(left.measure() <= threshold);
        if let Ok(pivot) = right.front() {
            prop_assert!(left.measure() + i64::from(*pivot) > threshold);
        }
    }

    #[test]
    fn prop_take_and_drop_partition(tree in small_tree(), target in 0usize..30) {
        let taken = tree.take_until(|count| *count > target);
        let dropped = tree.drop_until(|count| *count > target);
        let mut rejoined = taken.to_vec();
        rejoined.extend(dropped.to_vec());
        prop_assert_eq!(rejoined, tree.to_vec());
    }

    // =========================================================================
    // Traversal laws
    // =========================================================================

    #[test]
    fn prop_each_reverse_is_reversed_each(tree in small_tree()) {
        let mut forward = Vec::new();
        tree.each(|value| {
            forward.push(*value);
            true
        });
        let mut backward = Vec::new();
        tree.each_reverse(|value| {
            backward.push(*value);
            true
        });
        backward.reverse();
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn prop_iter_matches_to_vec(tree in small_tree()) {
        let iterated: Vec<i32> = tree.iter().copied().collect();
        prop_assert_eq!(iterated, tree.to_vec());
    }

    #[test]
    fn prop_equal_sequences_are_equal_trees(values in prop::collection::vec(any::<i32>(), 0..30)) {
        let pushed_back = FingerTree::from_values(Count, values.clone());
        let pushed_front = values
            .into_iter()
            .rev()
            .fold(FingerTree::new(Count), |tree, value| tree.push_front(value));
        prop_assert_eq!(pushed_back, pushed_front);
    }
}
