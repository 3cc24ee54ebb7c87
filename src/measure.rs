//! The measurement monoid contract.
//!
//! Every finger tree is parameterized by a [`Measurer`]: a user-supplied
//! monoid over element values. The tree caches the measurer's sums at every
//! level, which is what makes [`split`](crate::FingerTree::split) and
//! [`measure`](crate::FingerTree::measure) cheap.
//!
//! # Laws
//!
//! For all measures `a`, `b`, `c`:
//!
//! ## Left and Right Identity
//!
//! ```text
//! sum(identity(), a) == a
//! sum(a, identity()) == a
//! ```
//!
//! ## Associativity
//!
//! ```text
//! sum(sum(a, b), c) == sum(a, sum(b, c))
//! ```
//!
//! Commutativity is *not* required. The tree never detects a law violation;
//! a measurer that breaks them silently invalidates every cached measure.
//!
//! # Examples
//!
//! A measurer that tracks the maximum element, turning the tree into a
//! priority structure:
//!
//! ```rust
//! use fingertree::{FingerTree, Measurer};
//!
//! struct Maximum;
//!
//! impl Measurer<i64> for Maximum {
//!     type Measure = i64;
//!
//!     fn identity(&self) -> i64 {
//!         i64::MIN
//!     }
//!
//!     fn measure(&self, value: &i64) -> i64 {
//!         *value
//!     }
//!
//!     fn sum(&self, left: &i64, right: &i64) -> i64 {
//!         (*left).max(*right)
//!     }
//! }
//!
//! let tree = FingerTree::from_values(Maximum, [3, 1, 4, 1, 5]);
//! assert_eq!(tree.measure(), 5);
//! ```

/// A user-supplied monoid over element values.
///
/// The three operations must be pure and total: the tree invokes them while
/// constructing digits, nodes and suspended spines, and trusts the results
/// unconditionally.
///
/// # Laws
///
/// All implementations must satisfy, for all `a`, `b`, `c`:
///
/// ```text
/// sum(identity(), a) == a          // left identity
/// sum(a, identity()) == a          // right identity
/// sum(sum(a, b), c) == sum(a, sum(b, c))   // associativity
/// ```
pub trait Measurer<V> {
    /// The measurement type produced by this measurer.
    type Measure: Clone;

    /// Returns the identity element of the monoid.
    ///
    /// This is the measure of an empty tree.
    fn identity(&self) -> Self::Measure;

    /// Returns the measure of a single element.
    fn measure(&self, value: &V) -> Self::Measure;

    /// Combines two measures. Must be associative.
    ///
    /// The tree always folds left-to-right, so non-commutative monoids
    /// (such as string-like accumulations) are fully supported.
    fn sum(&self, left: &Self::Measure, right: &Self::Measure) -> Self::Measure;
}

/// The counting measurer: every element measures `1` and sums add.
///
/// With `Count`, a tree's measure is its length and a split predicate over
/// the measure is a positional split. This is the default measurer of
/// [`FingerTree`](crate::FingerTree), which is what makes
/// `(1..=5).collect::<FingerTree<i32>>()` work.
///
/// # Examples
///
/// ```rust
/// use fingertree::FingerTree;
///
/// let tree: FingerTree<char> = "abcde".chars().collect();
/// assert_eq!(tree.measure(), 5);
///
/// let (left, right) = tree.split(|count| *count > 2);
/// assert_eq!(left.to_vec(), vec!['a', 'b']);
/// assert_eq!(right.to_vec(), vec!['c', 'd', 'e']);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Count;

impl<V> Measurer<V> for Count {
    type Measure = usize;

    #[inline]
    fn identity(&self) -> usize {
        0
    }

    #[inline]
    fn measure(&self, _value: &V) -> usize {
        1
    }

    #[inline]
    fn sum(&self, left: &usize, right: &usize) -> usize {
        left + right
    }
}

// =============================================================================
// Tests
// =============================================================================
