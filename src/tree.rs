//! The finger tree proper: branches, nodes, digits and the three tree
//! shapes, together with the push/pop cascade, concatenation and splitting.
//!
//! Everything in this module is internal. Elements are stored behind
//! [`ReferenceCounter`] and every operation returns a new tree sharing all
//! untouched substructure with its input.
//!
//! # Structure
//!
//! A tree at the surface level holds [`Branch::Leaf`] children. The middle
//! spine of a deep tree is itself a tree whose children are
//! [`Branch::Node`] groupings of the level above, so every descent into a
//! spine moves one level deeper while the element type stays uniform. Nodes
//! group exactly two or three children; digits at the ends of a deep tree
//! hold one to four. Each grouping caches the left-to-right sum of its
//! children's measures at construction time.
//!
//! # References
//!
//! - Hinze & Paterson, "Finger Trees: A Simple General-purpose Data
//!   Structure" (2006)

use std::fmt;

use super::measure::Measurer;
use super::spine::Spine;
use super::ReferenceCounter;

// =============================================================================
// Branch
// =============================================================================

/// A child at any level of the tree: a surface element or a deeper node.
pub(crate) enum Branch<V, M> {
    Leaf(ReferenceCounter<V>),
    Node(ReferenceCounter<Node<V, M>>),
}

impl<V, M> Clone for Branch<V, M> {
    fn clone(&self) -> Self {
        match self {
            Self::Leaf(value) => Self::Leaf(value.clone()),
            Self::Node(node) => Self::Node(node.clone()),
        }
    }
}

impl<V, M: Clone> Branch<V, M> {
    pub(crate) fn leaf(value: V) -> Self {
        Self::Leaf(ReferenceCounter::new(value))
    }

    pub(crate) fn node2<S>(measurer: &S, first: Self, second: Self) -> Self
    where
        S: Measurer<V, Measure = M>,
    {
        Self::Node(ReferenceCounter::new(Node::node2(measurer, first, second)))
    }

    pub(crate) fn node3<S>(measurer: &S, first: Self, second: Self, third: Self) -> Self
    where
        S: Measurer<V, Measure = M>,
    {
        Self::Node(ReferenceCounter::new(Node::node3(
            measurer, first, second, third,
        )))
    }

    pub(crate) fn measure<S>(&self, measurer: &S) -> M
    where
        S: Measurer<V, Measure = M>,
    {
        match self {
            Self::Leaf(value) => measurer.measure(value),
            Self::Node(node) => node.measure().clone(),
        }
    }

    /// The value of a surface-level branch.
    pub(crate) fn expect_leaf(&self) -> &V {
        match self {
            Self::Leaf(value) => value,
            Self::Node(_) => unreachable!("the surface level of a tree holds leaf branches"),
        }
    }

    /// The node of a spine-level branch.
    pub(crate) fn expect_node(&self) -> &Node<V, M> {
        match self {
            Self::Node(node) => node.as_ref(),
            Self::Leaf(_) => unreachable!("spine trees hold node branches"),
        }
    }

    fn each<F>(&self, function: &mut F) -> bool
    where
        F: FnMut(&V) -> bool,
    {
        match self {
            Self::Leaf(value) => function(value),
            Self::Node(node) => node.each(function),
        }
    }

    fn each_reverse<F>(&self, function: &mut F) -> bool
    where
        F: FnMut(&V) -> bool,
    {
        match self {
            Self::Leaf(value) => function(value),
            Self::Node(node) => node.each_reverse(function),
        }
    }
}

impl<V: fmt::Debug, M: fmt::Debug> fmt::Debug for Branch<V, M> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(value) => formatter.debug_tuple("Leaf").field(value).finish(),
            Self::Node(node) => node.fmt(formatter),
        }
    }
}

// =============================================================================
// Node
// =============================================================================

/// A grouping of exactly two or three children one level deeper than its
/// parent, with the sum of the children's measures cached at construction.
pub(crate) enum Node<V, M> {
    Node2 {
        measure: M,
        first: Branch<V, M>,
        second: Branch<V, M>,
    },
    Node3 {
        measure: M,
        first: Branch<V, M>,
        second: Branch<V, M>,
        third: Branch<V, M>,
    },
}

impl<V, M: Clone> Node<V, M> {
    fn node2<S>(measurer: &S, first: Branch<V, M>, second: Branch<V, M>) -> Self
    where
        S: Measurer<V, Measure = M>,
    {
        let measure = measurer.sum(&first.measure(measurer), &second.measure(measurer));
        Self::Node2 {
            measure,
            first,
            second,
        }
    }

    fn node3<S>(
        measurer: &S,
        first: Branch<V, M>,
        second: Branch<V, M>,
        third: Branch<V, M>,
    ) -> Self
    where
        S: Measurer<V, Measure = M>,
    {
        let measure = measurer.sum(
            &measurer.sum(&first.measure(measurer), &second.measure(measurer)),
            &third.measure(measurer),
        );
        Self::Node3 {
            measure,
            first,
            second,
            third,
        }
    }

    pub(crate) const fn measure(&self) -> &M {
        match self {
            Self::Node2 { measure, .. } | Self::Node3 { measure, .. } => measure,
        }
    }

    pub(crate) fn children(&self) -> Vec<Branch<V, M>> {
        match self {
            Self::Node2 { first, second, .. } => vec![first.clone(), second.clone()],
            Self::Node3 {
                first,
                second,
                third,
                ..
            } => vec![first.clone(), second.clone(), third.clone()],
        }
    }

    fn each<F>(&self, function: &mut F) -> bool
    where
        F: FnMut(&V) -> bool,
    {
        match self {
            Self::Node2 { first, second, .. } => first.each(function) && second.each(function),
            Self::Node3 {
                first,
                second,
                third,
                ..
            } => first.each(function) && second.each(function) && third.each(function),
        }
    }

    fn each_reverse<F>(&self, function: &mut F) -> bool
    where
        F: FnMut(&V) -> bool,
    {
        match self {
            Self::Node2 { first, second, .. } => {
                second.each_reverse(function) && first.each_reverse(function)
            }
            Self::Node3 {
                first,
                second,
                third,
                ..
            } => {
                third.each_reverse(function)
                    && second.each_reverse(function)
                    && first.each_reverse(function)
            }
        }
    }
}

impl<V: fmt::Debug, M: fmt::Debug> fmt::Debug for Node<V, M> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node2 {
                measure,
                first,
                second,
            } => formatter
                .debug_struct("Node2")
                .field("measure", measure)
                .field("first", first)
                .field("second", second)
                .finish(),
            Self::Node3 {
                measure,
                first,
                second,
                third,
            } => formatter
                .debug_struct("Node3")
                .field("measure", measure)
                .field("first", first)
                .field("second", second)
                .field("third", third)
                .finish(),
        }
    }
}

// =============================================================================
// Digit
// =============================================================================

/// An ordered group of one to four children at the end of a deep tree, with
/// the sum of the children's measures cached at construction.
pub(crate) struct Digit<V, M> {
    measure: M,
    children: Vec<Branch<V, M>>,
}

impl<V, M: Clone> Clone for Digit<V, M> {
    fn clone(&self) -> Self {
        Self {
            measure: self.measure.clone(),
            children: self.children.clone(),
        }
    }
}

impl<V, M: Clone> Digit<V, M> {
    pub(crate) fn from_branches<S>(measurer: &S, children: Vec<Branch<V, M>>) -> Self
    where
        S: Measurer<V, Measure = M>,
    {
        debug_assert!(
            (1..=4).contains(&children.len()),
            "a digit holds one to four children"
        );
        let mut measure = children[0].measure(measurer);
        for child in &children[1..] {
            measure = measurer.sum(&measure, &child.measure(measurer));
        }
        Self { measure, children }
    }

    /// A digit with the same children as `node`; the cached measure carries
    /// over unchanged.
    pub(crate) fn from_node(node: &Node<V, M>) -> Self {
        Self {
            measure: node.measure().clone(),
            children: node.children(),
        }
    }

    pub(crate) const fn measure(&self) -> &M {
        &self.measure
    }

    pub(crate) fn len(&self) -> usize {
        self.children.len()
    }

    pub(crate) fn as_slice(&self) -> &[Branch<V, M>] {
        &self.children
    }

    pub(crate) fn head(&self) -> &Branch<V, M> {
        &self.children[0]
    }

    pub(crate) fn last(&self) -> &Branch<V, M> {
        &self.children[self.children.len() - 1]
    }

    /// A digit with `branch` prepended, or `None` if this digit is full.
    pub(crate) fn prepend<S>(&self, measurer: &S, branch: &Branch<V, M>) -> Option<Self>
    where
        S: Measurer<V, Measure = M>,
    {
        if self.len() >= 4 {
            return None;
        }
        let mut children = Vec::with_capacity(self.children.len() + 1);
        children.push(branch.clone());
        children.extend(self.children.iter().cloned());
        Some(Self::from_branches(measurer, children))
    }

    /// A digit with `branch` appended, or `None` if this digit is full.
    pub(crate) fn append<S>(&self, measurer: &S, branch: &Branch<V, M>) -> Option<Self>
    where
        S: Measurer<V, Measure = M>,
    {
        if self.len() >= 4 {
            return None;
        }
        let mut children = Vec::with_capacity(self.children.len() + 1);
        children.extend(self.children.iter().cloned());
        children.push(branch.clone());
        Some(Self::from_branches(measurer, children))
    }

    /// Removes the first child; `None` for the digit when it was the last.
    pub(crate) fn pop_front<S>(&self, measurer: &S) -> (Option<Self>, Branch<V, M>)
    where
        S: Measurer<V, Measure = M>,
    {
        let head = self.children[0].clone();
        if self.children.len() == 1 {
            (None, head)
        } else {
            let rest = Self::from_branches(measurer, self.children[1..].to_vec());
            (Some(rest), head)
        }
    }

    /// Removes the last child; `None` for the digit when it was the last.
    pub(crate) fn pop_back<S>(&self, measurer: &S) -> (Option<Self>, Branch<V, M>)
    where
        S: Measurer<V, Measure = M>,
    {
        let last = self.children[self.children.len() - 1].clone();
        if self.children.len() == 1 {
            (None, last)
        } else {
            let rest = Self::from_branches(
                measurer,
                self.children[..self.children.len() - 1].to_vec(),
            );
            (Some(rest), last)
        }
    }
}

impl<V: fmt::Debug, M: fmt::Debug> fmt::Debug for Digit<V, M> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Digit")
            .field("measure", &self.measure)
            .field("children", &self.children)
            .finish()
    }
}

// =============================================================================
// Tree
// =============================================================================

/// One level of a finger tree.
///
/// The spine of a deep tree is suspended behind a [`Spine`] and shared via
/// [`ReferenceCounter`], so cloning a tree is cheap and forcing a shared
/// spine benefits every tree that references it.
pub(crate) enum Tree<V, M> {
    Empty,
    Single(Branch<V, M>),
    Deep {
        measure: M,
        prefix: Digit<V, M>,
        spine: ReferenceCounter<Spine<V, M>>,
        suffix: Digit<V, M>,
    },
}

impl<V, M: Clone> Clone for Tree<V, M> {
    fn clone(&self) -> Self {
        match self {
            Self::Empty => Self::Empty,
            Self::Single(branch) => Self::Single(branch.clone()),
            Self::Deep {
                measure,
                prefix,
                spine,
                suffix,
            } => Self::Deep {
                measure: measure.clone(),
                prefix: prefix.clone(),
                spine: spine.clone(),
                suffix: suffix.clone(),
            },
        }
    }
}

impl<V, M: Clone> Tree<V, M> {
    pub(crate) const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub(crate) fn measure<S>(&self, measurer: &S) -> M
    where
        S: Measurer<V, Measure = M>,
    {
        match self {
            Self::Empty => measurer.identity(),
            Self::Single(branch) => branch.measure(measurer),
            Self::Deep { measure, .. } => measure.clone(),
        }
    }

    pub(crate) fn front(&self) -> Option<&Branch<V, M>> {
        match self {
            Self::Empty => None,
            Self::Single(branch) => Some(branch),
            Self::Deep { prefix, .. } => Some(prefix.head()),
        }
    }

    pub(crate) fn back(&self) -> Option<&Branch<V, M>> {
        match self {
            Self::Empty => None,
            Self::Single(branch) => Some(branch),
            Self::Deep { suffix, .. } => Some(suffix.last()),
        }
    }

    /// The deep constructor. Caches the measure from the digits and the
    /// spine's own cached measure; never forces the spine.
    fn deep<S>(
        measurer: &S,
        prefix: Digit<V, M>,
        spine: ReferenceCounter<Spine<V, M>>,
        suffix: Digit<V, M>,
    ) -> Self
    where
        S: Measurer<V, Measure = M>,
    {
        let measure = measurer.sum(
            &measurer.sum(prefix.measure(), spine.measure()),
            suffix.measure(),
        );
        Self::Deep {
            measure,
            prefix,
            spine,
            suffix,
        }
    }

    // =========================================================================
    // End operations
    // =========================================================================

    pub(crate) fn push_front<S>(&self, measurer: &S, branch: Branch<V, M>) -> Self
    where
        S: Measurer<V, Measure = M>,
    {
        match self {
            Self::Empty => Self::Single(branch),
            Self::Single(existing) => Self::deep(
                measurer,
                Digit::from_branches(measurer, vec![branch]),
                ReferenceCounter::new(Spine::empty(measurer)),
                Digit::from_branches(measurer, vec![existing.clone()]),
            ),
            Self::Deep {
                prefix,
                spine,
                suffix,
                ..
            } => prefix.prepend(measurer, &branch).map_or_else(
                || {
                    // Digit of four: keep the head, overflow the other
                    // three into the spine as a suspended push.
                    let children = prefix.as_slice();
                    let overflow = Branch::node3(
                        measurer,
                        children[1].clone(),
                        children[2].clone(),
                        children[3].clone(),
                    );
                    let new_spine = ReferenceCounter::new(Spine::deferred_push_front(
                        measurer,
                        overflow,
                        spine.clone(),
                    ));
                    let new_prefix = Digit::from_branches(
                        measurer,
                        vec![branch.clone(), children[0].clone()],
                    );
                    Self::deep(measurer, new_prefix, new_spine, suffix.clone())
                },
                |new_prefix| Self::deep(measurer, new_prefix, spine.clone(), suffix.clone()),
            ),
        }
    }

    pub(crate) fn push_back<S>(&self, measurer: &S, branch: Branch<V, M>) -> Self
    where
        S: Measurer<V, Measure = M>,
    {
        match self {
            Self::Empty => Self::Single(branch),
            Self::Single(existing) => Self::deep(
                measurer,
                Digit::from_branches(measurer, vec![existing.clone()]),
                ReferenceCounter::new(Spine::empty(measurer)),
                Digit::from_branches(measurer, vec![branch]),
            ),
            Self::Deep {
                prefix,
                spine,
                suffix,
                ..
            } => suffix.append(measurer, &branch).map_or_else(
                || {
                    let children = suffix.as_slice();
                    let overflow = Branch::node3(
                        measurer,
                        children[0].clone(),
                        children[1].clone(),
                        children[2].clone(),
                    );
                    let new_spine = ReferenceCounter::new(Spine::deferred_push_back(
                        measurer,
                        spine.clone(),
                        overflow,
                    ));
                    let new_suffix = Digit::from_branches(
                        measurer,
                        vec![children[3].clone(), branch.clone()],
                    );
                    Self::deep(measurer, prefix.clone(), new_spine, new_suffix)
                },
                |new_suffix| Self::deep(measurer, prefix.clone(), spine.clone(), new_suffix),
            ),
        }
    }

    pub(crate) fn pop_front<S>(&self, measurer: &S) -> Option<(Branch<V, M>, Self)>
    where
        S: Measurer<V, Measure = M>,
    {
        match self {
            Self::Empty => None,
            Self::Single(branch) => Some((branch.clone(), Self::Empty)),
            Self::Deep {
                prefix,
                spine,
                suffix,
                ..
            } => {
                let (rest_digit, head) = prefix.pop_front(measurer);
                let rest = rest_digit.map_or_else(
                    || Self::deep_left(measurer, &[], spine, suffix),
                    |digit| Self::deep(measurer, digit, spine.clone(), suffix.clone()),
                );
                Some((head, rest))
            }
        }
    }

    pub(crate) fn pop_back<S>(&self, measurer: &S) -> Option<(Self, Branch<V, M>)>
    where
        S: Measurer<V, Measure = M>,
    {
        match self {
            Self::Empty => None,
            Self::Single(branch) => Some((Self::Empty, branch.clone())),
            Self::Deep {
                prefix,
                spine,
                suffix,
                ..
            } => {
                let (rest_digit, last) = suffix.pop_back(measurer);
                let rest = rest_digit.map_or_else(
                    || Self::deep_right(measurer, prefix, spine, &[]),
                    |digit| Self::deep(measurer, prefix.clone(), spine.clone(), digit),
                );
                Some((rest, last))
            }
        }
    }

    // =========================================================================
    // Smart constructors
    // =========================================================================

    /// Builds a small tree out of zero to four branches.
    fn from_branches<S>(measurer: &S, branches: &[Branch<V, M>]) -> Self
    where
        S: Measurer<V, Measure = M>,
    {
        match branches {
            [] => Self::Empty,
            [only] => Self::Single(only.clone()),
            [first, rest @ ..] => Self::deep(
                measurer,
                Digit::from_branches(measurer, vec![first.clone()]),
                ReferenceCounter::new(Spine::empty(measurer)),
                Digit::from_branches(measurer, rest.to_vec()),
            ),
        }
    }

    /// Rebuilds a deep tree whose prefix may have been emptied, borrowing a
    /// node from the spine (forcing it) when necessary.
    fn deep_left<S>(
        measurer: &S,
        prefix: &[Branch<V, M>],
        spine: &ReferenceCounter<Spine<V, M>>,
        suffix: &Digit<V, M>,
    ) -> Self
    where
        S: Measurer<V, Measure = M>,
    {
        if prefix.is_empty() {
            match spine.force(measurer).pop_front(measurer) {
                Some((node_branch, rest)) => Self::deep(
                    measurer,
                    Digit::from_node(node_branch.expect_node()),
                    ReferenceCounter::new(Spine::materialized(measurer, rest)),
                    suffix.clone(),
                ),
                None => Self::from_branches(measurer, suffix.as_slice()),
            }
        } else {
            Self::deep(
                measurer,
                Digit::from_branches(measurer, prefix.to_vec()),
                spine.clone(),
                suffix.clone(),
            )
        }
    }

    /// Mirror of [`Tree::deep_left`] for an emptied suffix.
    fn deep_right<S>(
        measurer: &S,
        prefix: &Digit<V, M>,
        spine: &ReferenceCounter<Spine<V, M>>,
        suffix: &[Branch<V, M>],
    ) -> Self
    where
        S: Measurer<V, Measure = M>,
    {
        if suffix.is_empty() {
            match spine.force(measurer).pop_back(measurer) {
                Some((rest, node_branch)) => Self::deep(
                    measurer,
                    prefix.clone(),
                    ReferenceCounter::new(Spine::materialized(measurer, rest)),
                    Digit::from_node(node_branch.expect_node()),
                ),
                None => Self::from_branches(measurer, prefix.as_slice()),
            }
        } else {
            Self::deep(
                measurer,
                prefix.clone(),
                spine.clone(),
                Digit::from_branches(measurer, suffix.to_vec()),
            )
        }
    }

    // =========================================================================
    // Concatenation
    // =========================================================================

    /// Concatenates `left`, a glue list of zero to twelve branches, and
    /// `right`. For two deep trees the recursion into the spines is
    /// suspended, one pending merge per level.
    pub(crate) fn concat_with_middle<S>(
        measurer: &S,
        left: &Self,
        middle: Vec<Branch<V, M>>,
        right: &Self,
    ) -> Self
    where
        S: Measurer<V, Measure = M>,
    {
        match (left, right) {
            (Self::Empty, _) => middle
                .into_iter()
                .rev()
                .fold(right.clone(), |tree, branch| {
                    tree.push_front(measurer, branch)
                }),
            (_, Self::Empty) => middle.into_iter().fold(left.clone(), |tree, branch| {
                tree.push_back(measurer, branch)
            }),
            (Self::Single(branch), _) => middle
                .into_iter()
                .rev()
                .fold(right.clone(), |tree, glue| tree.push_front(measurer, glue))
                .push_front(measurer, branch.clone()),
            (_, Self::Single(branch)) => middle
                .into_iter()
                .fold(left.clone(), |tree, glue| tree.push_back(measurer, glue))
                .push_back(measurer, branch.clone()),
            (
                Self::Deep {
                    prefix: left_prefix,
                    spine: left_spine,
                    suffix: left_suffix,
                    ..
                },
                Self::Deep {
                    prefix: right_prefix,
                    spine: right_spine,
                    suffix: right_suffix,
                    ..
                },
            ) => {
                let mut glue = left_suffix.as_slice().to_vec();
                glue.extend(middle);
                glue.extend(right_prefix.as_slice().iter().cloned());
                let nodes = Self::nodes_of(measurer, glue);
                let spine = ReferenceCounter::new(Spine::deferred_concat(
                    measurer,
                    left_spine.clone(),
                    nodes,
                    right_spine.clone(),
                ));
                Self::deep(measurer, left_prefix.clone(), spine, right_suffix.clone())
            }
        }
    }

    /// Regroups two to twelve branches into nodes of two or three,
    /// preferring threes and never leaving a lone child behind.
    fn nodes_of<S>(measurer: &S, children: Vec<Branch<V, M>>) -> Vec<Branch<V, M>>
    where
        S: Measurer<V, Measure = M>,
    {
        debug_assert!(
            children.len() >= 2,
            "node regrouping needs at least two children"
        );
        let mut remaining = children.len();
        let mut nodes = Vec::with_capacity(remaining / 2 + 1);
        let mut iterator = children.into_iter();
        loop {
            match remaining {
                2 => {
                    let first = iterator.next().expect("two children remaining");
                    let second = iterator.next().expect("two children remaining");
                    nodes.push(Branch::node2(measurer, first, second));
                    break;
                }
                3 => {
                    let first = iterator.next().expect("three children remaining");
                    let second = iterator.next().expect("three children remaining");
                    let third = iterator.next().expect("three children remaining");
                    nodes.push(Branch::node3(measurer, first, second, third));
                    break;
                }
                4 => {
                    let first = iterator.next().expect("four children remaining");
                    let second = iterator.next().expect("four children remaining");
                    nodes.push(Branch::node2(measurer, first, second));
                    let third = iterator.next().expect("four children remaining");
                    let fourth = iterator.next().expect("four children remaining");
                    nodes.push(Branch::node2(measurer, third, fourth));
                    break;
                }
                _ => {
                    let first = iterator.next().expect("at least five children remaining");
                    let second = iterator.next().expect("at least five children remaining");
                    let third = iterator.next().expect("at least five children remaining");
                    nodes.push(Branch::node3(measurer, first, second, third));
                    remaining -= 3;
                }
            }
        }
        nodes
    }

    // =========================================================================
    // Split
    // =========================================================================

    /// Splits a non-empty tree around the first position where `predicate`
    /// flips to true, given the measure `accumulated` of everything to the
    /// left of this tree.
    ///
    /// The caller guarantees `predicate(accumulated ⊕ self.measure())`.
    pub(crate) fn split_tree<S, P>(
        &self,
        measurer: &S,
        predicate: &mut P,
        accumulated: &M,
    ) -> (Self, Branch<V, M>, Self)
    where
        S: Measurer<V, Measure = M>,
        P: FnMut(&M) -> bool,
    {
        match self {
            Self::Empty => unreachable!("split descends only into non-empty trees"),
            Self::Single(branch) => (Self::Empty, branch.clone(), Self::Empty),
            Self::Deep {
                prefix,
                spine,
                suffix,
                ..
            } => {
                let after_prefix = measurer.sum(accumulated, prefix.measure());
                if predicate(&after_prefix) {
                    // The split point is inside the prefix digit.
                    let index =
                        Self::split_digit(measurer, predicate, accumulated, prefix.as_slice());
                    let left = Self::from_branches(measurer, &prefix.as_slice()[..index]);
                    let pivot = prefix.as_slice()[index].clone();
                    let right =
                        Self::deep_left(measurer, &prefix.as_slice()[index + 1..], spine, suffix);
                    return (left, pivot, right);
                }
                let after_spine = measurer.sum(&after_prefix, spine.measure());
                if predicate(&after_spine) {
                    // The split point is inside the spine: recurse one level
                    // deeper, then split the pivot node's children.
                    let (left_spine, pivot_node, right_spine) = spine
                        .force(measurer)
                        .split_tree(measurer, predicate, &after_prefix);
                    let before_pivot =
                        measurer.sum(&after_prefix, &left_spine.measure(measurer));
                    let children = pivot_node.expect_node().children();
                    let index =
                        Self::split_digit(measurer, predicate, &before_pivot, &children);
                    let left_rest =
                        ReferenceCounter::new(Spine::materialized(measurer, left_spine));
                    let right_rest =
                        ReferenceCounter::new(Spine::materialized(measurer, right_spine));
                    let left = Self::deep_right(measurer, prefix, &left_rest, &children[..index]);
                    let pivot = children[index].clone();
                    let right =
                        Self::deep_left(measurer, &children[index + 1..], &right_rest, suffix);
                    return (left, pivot, right);
                }
                // The split point is inside the suffix digit.
                let index = Self::split_digit(measurer, predicate, &after_spine, suffix.as_slice());
                let left = Self::deep_right(measurer, prefix, spine, &suffix.as_slice()[..index]);
                let pivot = suffix.as_slice()[index].clone();
                let right = Self::from_branches(measurer, &suffix.as_slice()[index + 1..]);
                (left, pivot, right)
            }
        }
    }

    /// Scans `children` left to right, returning the index of the first
    /// child at which the accumulated measure satisfies `predicate`.
    ///
    /// The caller guarantees the predicate holds over the whole group, so a
    /// monotone predicate always flips inside it; a non-monotone predicate
    /// degrades to picking the last child.
    fn split_digit<S, P>(
        measurer: &S,
        predicate: &mut P,
        accumulated: &M,
        children: &[Branch<V, M>],
    ) -> usize
    where
        S: Measurer<V, Measure = M>,
        P: FnMut(&M) -> bool,
    {
        let mut running = accumulated.clone();
        for (index, child) in children.iter().enumerate() {
            running = measurer.sum(&running, &child.measure(measurer));
            if predicate(&running) {
                return index;
            }
        }
        children.len() - 1
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    /// In-order traversal. Stops early (returning `false`) the first time
    /// `function` returns `false`.
    pub(crate) fn each<S, F>(&self, measurer: &S, function: &mut F) -> bool
    where
        S: Measurer<V, Measure = M>,
        F: FnMut(&V) -> bool,
    {
        match self {
            Self::Empty => true,
            Self::Single(branch) => branch.each(function),
            Self::Deep {
                prefix,
                spine,
                suffix,
                ..
            } => {
                for branch in prefix.as_slice() {
                    if !branch.each(function) {
                        return false;
                    }
                }
                if !spine.force(measurer).each(measurer, function) {
                    return false;
                }
                for branch in suffix.as_slice() {
                    if !branch.each(function) {
                        return false;
                    }
                }
                true
            }
        }
    }

    /// Reverse-order traversal with the same early-exit contract as
    /// [`Tree::each`].
    pub(crate) fn each_reverse<S, F>(&self, measurer: &S, function: &mut F) -> bool
    where
        S: Measurer<V, Measure = M>,
        F: FnMut(&V) -> bool,
    {
        match self {
            Self::Empty => true,
            Self::Single(branch) => branch.each_reverse(function),
            Self::Deep {
                prefix,
                spine,
                suffix,
                ..
            } => {
                for branch in suffix.as_slice().iter().rev() {
                    if !branch.each_reverse(function) {
                        return false;
                    }
                }
                if !spine.force(measurer).each_reverse(measurer, function) {
                    return false;
                }
                for branch in prefix.as_slice().iter().rev() {
                    if !branch.each_reverse(function) {
                        return false;
                    }
                }
                true
            }
        }
    }
}

impl<V: fmt::Debug, M: fmt::Debug> fmt::Debug for Tree<V, M> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => formatter.write_str("Empty"),
            Self::Single(branch) => formatter.debug_tuple("Single").field(branch).finish(),
            Self::Deep {
                measure,
                prefix,
                spine,
                suffix,
            } => formatter
                .debug_struct("Deep")
                .field("measure", measure)
                .field("prefix", prefix)
                .field("spine", spine)
                .field("suffix", suffix)
                .finish(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
