//! Error types for configuration and tree editing.
//!
//! Parsing itself never fails: malformed markup degrades to literal text.
//! The only fallible operations are parser construction (invalid option
//! combinations) and caller-driven edits of the AST.

use thiserror::Error;

use crate::ast::NodeKind;

/// An invalid combination of [`Options`](crate::Options).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Two flags with contradictory effects were both enabled.
    #[error("options `{0}` and `{1}` cannot be enabled together")]
    Conflict(&'static str, &'static str),
}

/// Failure of a structural edit or a type-specific accessor.
///
/// An operation that returns an `EditError` has not modified the tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// The accessor is not defined for this node kind.
    #[error("`{operation}` is not supported on {kind} nodes")]
    TypeMismatch {
        /// Name of the rejected accessor.
        operation: &'static str,
        /// Kind of the node it was called on.
        kind: NodeKind,
    },
    /// The node to insert is the target itself or one of its ancestors.
    #[error("inserting the node would create a cycle")]
    Cycle,
    /// The resulting parent/child pair violates block/inline nesting.
    #[error("{parent} nodes cannot contain {child} nodes")]
    InvalidNesting {
        /// Kind of the would-be parent.
        parent: NodeKind,
        /// Kind of the rejected child.
        child: NodeKind,
    },
    /// The node must be unattached for this operation.
    #[error("node is already attached to a tree")]
    AlreadyAttached,
    /// The node must have a parent for this operation.
    #[error("node has no parent")]
    NotAttached,
    /// The handle refers to a node that has been freed.
    #[error("node handle refers to a freed node")]
    StaleHandle,
    /// A field value was rejected.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// The field being set.
        field: &'static str,
        /// Why the value was rejected.
        reason: &'static str,
    },
    /// An iterator was reset to a node outside its root.
    #[error("node is not inside the iterator's root")]
    OutsideRoot,
}

impl EditError {
    pub(crate) fn mismatch(operation: &'static str, kind: NodeKind) -> Self {
        EditError::TypeMismatch { operation, kind }
    }
}
