use thiserror::Error;

/// Raised by the attachment engine when a graft has no consistent reading.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttachError {
    /// A repeat placeholder carrying children is read as an inverted
    /// "count before unit" label, which only makes sense with a single unit.
    #[error("Node {node} needs to be added, but has ambiguous meaning ({children} children under a repeat count)")]
    AmbiguousRepeat { node: String, children: usize },
}

/// Fatal, per-token resolution failures. A token no rule recognizes is not an
/// error; it resolves to [`Resolution::NoMatch`](crate::Resolution::NoMatch).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Structural contradiction while resolving '{token}': {source}")]
    StructuralContradiction {
        token: String,
        #[source]
        source: AttachError,
    },
}

impl ResolveError {
    pub fn token(&self) -> &str {
        match self {
            ResolveError::StructuralContradiction { token, .. } => token,
        }
    }
}
