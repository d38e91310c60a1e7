use alloc::string::String;

use thiserror::Error;

// -----------------------------------------------------------------------------
// Error

/// Failures of the dynamic descriptor surface.
///
/// Static reflection cannot fail at runtime — layout mismatches, unsupported
/// targets and missing descriptors are all build errors. This taxonomy covers
/// only the erased queries, where the type being asked about is not known to
/// the compiler.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DescribeError {
    /// A registry lookup named a type no descriptor was registered for.
    #[error("no descriptor registered for type `{0}`")]
    MissingDescriptor(String),

    /// A dynamic slot index fell outside the descriptor's slot list.
    #[error("slot index {index} is out of bounds for type `{type_name}` with {len} slots")]
    SlotOutOfBounds {
        /// The requested slot index.
        index: usize,
        /// Name of the described type.
        type_name: &'static str,
        /// Number of slots the descriptor holds.
        len: usize,
    },
}
