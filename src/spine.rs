//! Suspended spines with memoized forcing.
//!
//! The middle sub-tree of a deep finger tree is not stored directly: it is a
//! [`Spine`], a suspension that knows its measure up front and materializes
//! the underlying [`Tree`] only when an operation has to descend into it.
//! This is what keeps end insertions amortized O(1) and lets concatenation
//! stack one pending merge per level instead of rebuilding eagerly.
//!
//! A spine is forced at most once: the result is cached in a one-shot memo
//! cell and every later force returns the cached tree. Under the `arc`
//! feature the cell is a `OnceLock`, so concurrent first forces are guarded
//! by a one-shot lock and all threads observe the same tree.
//!
//! The pending computation itself is a [`SpineJob`], a closed enum of the
//! only suspensions the tree ever creates: an already-known tree, a push at
//! either end, or a concatenation. Keeping the producer first-order (rather
//! than a boxed closure) means a spine is `Send`/`Sync` exactly when its
//! contents are.

use std::fmt;

use super::measure::Measurer;
use super::tree::{Branch, Tree};
use super::ReferenceCounter;

/// One-shot memoization cell for a forced spine.
///
/// `OnceLock` under the `arc` feature (blocking one-shot force), `OnceCell`
/// otherwise.
#[cfg(feature = "arc")]
pub(crate) type MemoCell<T> = std::sync::OnceLock<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type MemoCell<T> = std::cell::OnceCell<T>;

/// The lazily-evaluated middle of a deep tree.
///
/// Carries the measure of the suspended tree so that enclosing constructors
/// can cache their own measures without forcing anything.
pub(crate) struct Spine<V, M> {
    measure: M,
    memo: MemoCell<Tree<V, M>>,
    job: SpineJob<V, M>,
}

/// The pending computation behind a spine.
pub(crate) enum SpineJob<V, M> {
    /// The tree is already known; forcing just hands out a copy.
    Ready(Tree<V, M>),
    /// Push a node onto the front of the suspended rest.
    PushFront {
        node: Branch<V, M>,
        rest: ReferenceCounter<Spine<V, M>>,
    },
    /// Push a node onto the back of the suspended rest.
    PushBack {
        rest: ReferenceCounter<Spine<V, M>>,
        node: Branch<V, M>,
    },
    /// Concatenate two suspended trees around a glue list of nodes.
    Concat {
        left: ReferenceCounter<Spine<V, M>>,
        middle: Vec<Branch<V, M>>,
        right: ReferenceCounter<Spine<V, M>>,
    },
}

impl<V, M: Clone> Spine<V, M> {
    /// Wraps an already-materialized tree.
    pub(crate) fn materialized<S>(measurer: &S, tree: Tree<V, M>) -> Self
    where
        S: Measurer<V, Measure = M>,
    {
        Self {
            measure: tree.measure(measurer),
            memo: MemoCell::new(),
            job: SpineJob::Ready(tree),
        }
    }

    /// An empty spine.
    pub(crate) fn empty<S>(measurer: &S) -> Self
    where
        S: Measurer<V, Measure = M>,
    {
        Self::materialized(measurer, Tree::Empty)
    }

    /// Suspends pushing `node` onto the front of `rest`.
    pub(crate) fn deferred_push_front<S>(
        measurer: &S,
        node: Branch<V, M>,
        rest: ReferenceCounter<Self>,
    ) -> Self
    where
        S: Measurer<V, Measure = M>,
    {
        Self {
            measure: measurer.sum(&node.measure(measurer), rest.measure()),
            memo: MemoCell::new(),
            job: SpineJob::PushFront { node, rest },
        }
    }

    /// Suspends pushing `node` onto the back of `rest`.
    pub(crate) fn deferred_push_back<S>(
        measurer: &S,
        rest: ReferenceCounter<Self>,
        node: Branch<V, M>,
    ) -> Self
    where
        S: Measurer<V, Measure = M>,
    {
        Self {
            measure: measurer.sum(rest.measure(), &node.measure(measurer)),
            memo: MemoCell::new(),
            job: SpineJob::PushBack { rest, node },
        }
    }

    /// Suspends the concatenation of `left`, a glue list of nodes, and
    /// `right`.
    pub(crate) fn deferred_concat<S>(
        measurer: &S,
        left: ReferenceCounter<Self>,
        middle: Vec<Branch<V, M>>,
        right: ReferenceCounter<Self>,
    ) -> Self
    where
        S: Measurer<V, Measure = M>,
    {
        let mut measure = left.measure().clone();
        for branch in &middle {
            measure = measurer.sum(&measure, &branch.measure(measurer));
        }
        let measure = measurer.sum(&measure, right.measure());
        Self {
            measure,
            memo: MemoCell::new(),
            job: SpineJob::Concat {
                left,
                middle,
                right,
            },
        }
    }

    /// The measure of the suspended tree, available without forcing.
    pub(crate) const fn measure(&self) -> &M {
        &self.measure
    }

    /// Returns whether the spine has been forced.
    pub(crate) fn is_forced(&self) -> bool {
        self.memo.get().is_some()
    }

    /// Forces the spine, materializing and caching the suspended tree.
    ///
    /// A long chain of pending end pushes (the result of many insertions
    /// with no intervening reads) is unwound iteratively, innermost first,
    /// so forcing never recurses deeper than the tree has levels.
    pub(crate) fn force<S>(&self, measurer: &S) -> &Tree<V, M>
    where
        S: Measurer<V, Measure = M>,
    {
        if !self.is_forced() {
            let mut pending: Vec<&Self> = Vec::new();
            let mut current = self;
            loop {
                if current.is_forced() {
                    break;
                }
                match &current.job {
                    SpineJob::PushFront { rest, .. } | SpineJob::PushBack { rest, .. } => {
                        pending.push(current);
                        current = rest.as_ref();
                    }
                    SpineJob::Ready(_) | SpineJob::Concat { .. } => break,
                }
            }
            while let Some(spine) = pending.pop() {
                let _ = spine.memo.get_or_init(|| spine.job.run(measurer));
            }
        }
        self.memo.get_or_init(|| self.job.run(measurer))
    }
}

impl<V, M: Clone> SpineJob<V, M> {
    /// Runs the suspended computation.
    fn run<S>(&self, measurer: &S) -> Tree<V, M>
    where
        S: Measurer<V, Measure = M>,
    {
        match self {
            Self::Ready(tree) => tree.clone(),
            Self::PushFront { node, rest } => {
                rest.force(measurer).push_front(measurer, node.clone())
            }
            Self::PushBack { rest, node } => {
                rest.force(measurer).push_back(measurer, node.clone())
            }
            Self::Concat {
                left,
                middle,
                right,
            } => Tree::concat_with_middle(
                measurer,
                left.force(measurer),
                middle.clone(),
                right.force(measurer),
            ),
        }
    }
}

impl<V: fmt::Debug, M: fmt::Debug> fmt::Debug for Spine<V, M> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.memo.get() {
            Some(tree) => formatter.debug_tuple("Spine").field(tree).finish(),
            None => formatter.write_str("Spine(<suspended>)"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
