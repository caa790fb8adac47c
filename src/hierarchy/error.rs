use thiserror::Error;

use crate::TagId;

/// Conditions reported by the hierarchy engine.
///
/// The first three variants are warnings raised while building a forest: the
/// builder resolves each of them itself and always produces a usable tree.
/// `NotFound` is returned to callers that reference an unknown tag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    /// Two input records share an id; the later record replaced the earlier one.
    #[error("duplicate tag id {id}: later record replaces earlier one")]
    DuplicateIdentity { id: TagId },

    /// A record names a parent that does not exist; the record became a root.
    #[error("tag {id} references missing parent {parent_id}: treated as root")]
    DanglingParentReference { id: TagId, parent_id: TagId },

    /// Attaching the record to its parent would close a loop; the record became a root.
    #[error("tag {id} cannot be attached to {parent_id} without creating a cycle: treated as root")]
    CycleDetected { id: TagId, parent_id: TagId },

    /// No tag with this id exists.
    #[error("tag not found: {0}")]
    NotFound(TagId),
}

impl HierarchyError {
    /// Returns true for conditions the builder resolved on its own.
    pub fn is_warning(&self) -> bool {
        !matches!(self, Self::NotFound(_))
    }

    /// Id of the tag the condition is about.
    pub fn tag_id(&self) -> &TagId {
        match self {
            Self::DuplicateIdentity { id }
            | Self::DanglingParentReference { id, .. }
            | Self::CycleDetected { id, .. }
            | Self::NotFound(id) => id,
        }
    }
}
