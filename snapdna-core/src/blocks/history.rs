//! Edit history is not modelled. The history tree segment is carried as raw
//! bytes that can only be reset, and history node segments stay opaque.

/// Canonical payload of a cleared history tree.
pub const EMPTY_HISTORY: &[u8] = b"";
