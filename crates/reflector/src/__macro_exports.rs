//! Items consumed by macro-generated code. Not public API.

#[cfg(feature = "auto_register")]
pub use inventory;

/// A collected descriptor-building function.
///
/// Submitted by `#[reflect(auto_register)]` and `auto_register!` expansions;
/// drained by `DescriptorRegistry::with_registered`.
#[cfg(feature = "auto_register")]
pub struct RegisteredDescriptor {
    pub build: fn() -> crate::registry::TypeDescriptor,
}

#[cfg(feature = "auto_register")]
inventory::collect!(RegisteredDescriptor);
