//! Error types for finger tree operations.

use std::fmt;

/// Error returned when removing or peeking at an element of an empty tree.
///
/// `pop_front`, `pop_back`, `front` and `back` have no meaningful result on
/// an empty tree and report this error instead. It indicates a caller bug:
/// test [`FingerTree::is_empty`](crate::FingerTree::is_empty) first when the
/// tree may be empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyTreeError;

impl fmt::Display for EmptyTreeError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "operation on an empty finger tree")
    }
}

impl std::error::Error for EmptyTreeError {}
