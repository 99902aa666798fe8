//! Error types for fdb-sql-ast

use crate::features::Feature;
use crate::nodes::NodeKind;
use thiserror::Error;

/// The result type for syntax tree operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, copying or rendering a syntax tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Construction inputs do not match the node kind's schema
    #[error("Malformed {kind} construction: {message}")]
    MalformedConstruction { kind: NodeKind, message: String },

    /// Accessor used on a field that the node's sub-kind does not populate
    #[error("Field {field} is not applicable to this {kind}")]
    FieldNotApplicable { kind: NodeKind, field: &'static str },

    /// Deep copy of a subtree failed; the source tree is untouched
    #[error("Copy of {kind} failed: {message}")]
    CopyFailure { kind: NodeKind, message: String },

    /// The renderer found a node that construction should have rejected
    #[error("Cannot render {kind}: {message}")]
    UnrenderableNode { kind: NodeKind, message: String },

    /// Feature name outside the closed feature set
    #[error("Unknown feature: {0}")]
    UnknownFeature(String),

    /// A grammar extension was used while its feature flag is off
    #[error("Feature {0} is not enabled")]
    FeatureDisabled(Feature),

    /// A feature override line that does not start with `+` or `-`
    #[error("Malformed feature override line, should start with + or -: {0}")]
    InvalidFeatureOverride(String),
}

impl Error {
    /// Create a malformed construction error
    pub fn malformed(kind: NodeKind, message: impl Into<String>) -> Self {
        Error::MalformedConstruction {
            kind,
            message: message.into(),
        }
    }

    /// Create a field-not-applicable error
    pub fn not_applicable(kind: NodeKind, field: &'static str) -> Self {
        Error::FieldNotApplicable { kind, field }
    }

    /// Create a copy failure
    pub fn copy_failure(kind: NodeKind, message: impl Into<String>) -> Self {
        Error::CopyFailure {
            kind,
            message: message.into(),
        }
    }

    /// Create an unrenderable node error
    pub fn unrenderable(kind: NodeKind, message: impl Into<String>) -> Self {
        Error::UnrenderableNode {
            kind,
            message: message.into(),
        }
    }

    /// Create an unknown feature error
    pub fn unknown_feature(name: impl Into<String>) -> Self {
        Error::UnknownFeature(name.into())
    }

    /// The node kind the error is about, if any
    pub fn kind(&self) -> Option<NodeKind> {
        match self {
            Error::MalformedConstruction { kind, .. }
            | Error::FieldNotApplicable { kind, .. }
            | Error::CopyFailure { kind, .. }
            | Error::UnrenderableNode { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
