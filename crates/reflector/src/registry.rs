//! A registry of erased descriptors.
//!
//! Static reflection resolves descriptors through the type system; the
//! registry is for dynamic consumers — tooling that receives a `TypeId` or a
//! type-name string and still wants slot counts and offsets. Each entry is a
//! [`TypeDescriptor`], the erased form of a [`Reflectable`] descriptor.
//!
//! Registration is first-write-wins and idempotent: registering a type that
//! is already present does nothing and reports `false`, so concurrent or
//! repeated registration of the same type is harmless.

use core::any::{Any, TypeId, type_name};
use core::mem::{align_of, size_of};

use alloc::string::ToString;

use hashbrown::HashMap;
use std::sync::{OnceLock, RwLock, RwLockReadGuard};

use crate::descriptor::Reflectable;
use crate::error::DescribeError;
use crate::layout::FieldSlot;

// -----------------------------------------------------------------------------
// TypeDescriptor

/// The erased form of a structural descriptor.
///
/// Carries everything a dynamic consumer can use without the type itself:
/// identity, extents, slot layouts and verified offsets.
///
/// # Examples
///
/// ```rust
/// use reflector::{derive::Reflectable, registry::TypeDescriptor};
///
/// #[derive(Clone, Copy, Reflectable)]
/// #[repr(C)]
/// struct Sample {
///     flag: u8,
///     value: u32,
/// }
///
/// let erased = TypeDescriptor::of::<Sample>();
/// assert_eq!(erased.slot_count(), 2);
/// assert_eq!(erased.offset(1), Ok(4));
/// ```
#[derive(Clone, Debug)]
pub struct TypeDescriptor {
    type_id: TypeId,
    type_name: &'static str,
    size: usize,
    align: usize,
    slots: &'static [FieldSlot],
    offsets: &'static [usize],
}

impl TypeDescriptor {
    /// Erases the descriptor of `T`.
    pub fn of<T: Reflectable + Any>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            size: size_of::<T>(),
            align: align_of::<T>(),
            slots: T::SLOTS,
            offsets: T::OFFSETS,
        }
    }

    /// The described type's `TypeId`.
    #[inline]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Name of the described type.
    #[inline]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Size of the described type in bytes.
    #[inline]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Alignment of the described type in bytes.
    #[inline]
    pub const fn align(&self) -> usize {
        self.align
    }

    /// Number of slots.
    #[inline]
    pub const fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Per-slot layout records, in slot order.
    #[inline]
    pub const fn slots(&self) -> &'static [FieldSlot] {
        self.slots
    }

    /// Byte offsets of every slot.
    #[inline]
    pub const fn offsets(&self) -> &'static [usize] {
        self.offsets
    }

    /// Byte offset of slot `index`.
    pub fn offset(&self, index: usize) -> Result<usize, DescribeError> {
        self.offsets
            .get(index)
            .copied()
            .ok_or(DescribeError::SlotOutOfBounds {
                index,
                type_name: self.type_name,
                len: self.offsets.len(),
            })
    }

    /// Layout record of slot `index`.
    pub fn slot(&self, index: usize) -> Result<&FieldSlot, DescribeError> {
        self.slots.get(index).ok_or(DescribeError::SlotOutOfBounds {
            index,
            type_name: self.type_name,
            len: self.slots.len(),
        })
    }
}

// -----------------------------------------------------------------------------
// DescriptorRegistry

/// A table of erased descriptors, keyed by `TypeId` and by type name.
///
/// # Examples
///
/// ```rust
/// use reflector::{derive::Reflectable, registry::DescriptorRegistry};
///
/// #[derive(Clone, Copy, Reflectable)]
/// #[repr(C)]
/// struct Sample {
///     value: u32,
/// }
///
/// let mut registry = DescriptorRegistry::new();
/// assert!(registry.register::<Sample>());
///
/// let erased = registry.get_by_path(std::any::type_name::<Sample>()).unwrap();
/// assert_eq!(erased.slot_count(), 1);
/// ```
#[derive(Default)]
pub struct DescriptorRegistry {
    table: HashMap<TypeId, TypeDescriptor>,
    path_to_id: HashMap<&'static str, TypeId>,
}

impl DescriptorRegistry {
    /// Creates an empty registry.
    #[inline]
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
            path_to_id: HashMap::new(),
        }
    }

    /// Creates a registry pre-loaded with every collected descriptor.
    ///
    /// Descriptors are collected from types marked
    /// `#[reflect(auto_register)]` and from [`auto_register!`] invocations
    /// across all linked crates.
    ///
    /// [`auto_register!`]: crate::auto_register
    #[cfg(feature = "auto_register")]
    #[cfg_attr(docsrs, doc(cfg(feature = "auto_register")))]
    pub fn with_registered() -> Self {
        let mut registry = Self::new();
        for entry in inventory::iter::<crate::__macro_exports::RegisteredDescriptor> {
            registry.add((entry.build)());
        }
        registry
    }

    /// Registers `T`'s descriptor.
    ///
    /// First write wins: if `T` is already present the call does nothing and
    /// returns `false`.
    pub fn register<T: Reflectable + Any>(&mut self) -> bool {
        self.add(TypeDescriptor::of::<T>())
    }

    /// Inserts an already-erased descriptor, first write wins.
    pub fn add(&mut self, descriptor: TypeDescriptor) -> bool {
        let type_id = descriptor.type_id();
        if self.table.contains_key(&type_id) {
            log::debug!(
                "descriptor for `{}` already registered; keeping the existing entry",
                descriptor.type_name(),
            );
            return false;
        }

        log::trace!("registering descriptor for `{}`", descriptor.type_name());
        self.path_to_id.insert(descriptor.type_name(), type_id);
        self.table.insert(type_id, descriptor);
        true
    }

    /// Whether a descriptor for `type_id` is present.
    #[inline]
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.table.contains_key(&type_id)
    }

    /// Retrieves the descriptor for `type_id`, if present.
    #[inline]
    pub fn get(&self, type_id: TypeId) -> Option<&TypeDescriptor> {
        self.table.get(&type_id)
    }

    /// Retrieves the descriptor whose type name equals `path`.
    pub fn get_by_path(&self, path: &str) -> Result<&TypeDescriptor, DescribeError> {
        self.path_to_id
            .get(path)
            .and_then(|id| self.table.get(id))
            .ok_or_else(|| DescribeError::MissingDescriptor(path.to_string()))
    }

    /// Number of registered descriptors.
    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Iterates over all registered descriptors, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.table.values()
    }
}

// -----------------------------------------------------------------------------
// Global registry

static GLOBAL: OnceLock<RwLock<DescriptorRegistry>> = OnceLock::new();

/// The process-wide registry.
///
/// Initialized lazily on first access; with the `auto_register` feature the
/// first access also loads every collected descriptor.
pub fn global() -> &'static RwLock<DescriptorRegistry> {
    GLOBAL.get_or_init(|| {
        #[cfg(feature = "auto_register")]
        let registry = DescriptorRegistry::with_registered();
        #[cfg(not(feature = "auto_register"))]
        let registry = DescriptorRegistry::new();

        RwLock::new(registry)
    })
}

/// Read access to the process-wide registry.
///
/// A convenience over [`global`] for the common lookup-only path.
pub fn global_read() -> RwLockReadGuard<'static, DescriptorRegistry> {
    global().read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use reflector_derive::Reflectable;

    use super::*;

    #[derive(Clone, Copy, Reflectable)]
    #[repr(C)]
    struct Sample {
        flag: u8,
        value: u32,
    }

    #[test]
    fn registration_is_first_write_wins() {
        let mut registry = DescriptorRegistry::new();
        assert!(registry.register::<Sample>());
        assert!(!registry.register::<Sample>());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn lookup_by_id_and_path_agree() {
        let mut registry = DescriptorRegistry::new();
        registry.register::<Sample>();

        let by_id = registry.get(TypeId::of::<Sample>()).unwrap();
        let by_path = registry.get_by_path(type_name::<Sample>()).unwrap();
        assert_eq!(by_id.type_id(), by_path.type_id());
        assert_eq!(by_id.offsets(), by_path.offsets());
    }

    #[test]
    fn missing_paths_report_an_error() {
        let registry = DescriptorRegistry::new();
        assert_eq!(
            registry.get_by_path("nowhere::Missing").unwrap_err(),
            DescribeError::MissingDescriptor("nowhere::Missing".to_string()),
        );
    }

    #[cfg(feature = "auto_register")]
    mod auto_registration {
        use reflector_derive::{Reflectable, auto_register, provide};

        use super::*;

        #[derive(Clone, Copy, Reflectable)]
        #[reflect(auto_register)]
        #[repr(C)]
        struct AutoSample {
            value: u64,
        }

        #[derive(Clone, Copy)]
        #[repr(C)]
        struct ManualSample {
            value: u32,
        }

        provide! {
            ManualSample { value: u32 }
        }

        auto_register!(ManualSample);

        #[test]
        fn collected_descriptors_load_into_a_registry() {
            let registry = DescriptorRegistry::with_registered();
            assert!(registry.contains(TypeId::of::<AutoSample>()));
            assert!(registry.contains(TypeId::of::<ManualSample>()));
        }

        #[test]
        fn the_global_registry_sees_collected_descriptors() {
            let registry = crate::registry::global_read();
            assert!(registry.get(TypeId::of::<AutoSample>()).is_some());
        }
    }

    #[test]
    fn erased_queries_match_the_static_descriptor() {
        let erased = TypeDescriptor::of::<Sample>();
        assert_eq!(erased.slot_count(), 2);
        assert_eq!(erased.size(), size_of::<Sample>());
        assert_eq!(erased.offset(1), Ok(Sample::OFFSETS[1]));
        assert_eq!(
            erased.offset(9),
            Err(DescribeError::SlotOutOfBounds {
                index: 9,
                type_name: type_name::<Sample>(),
                len: 2,
            }),
        );
    }
}
