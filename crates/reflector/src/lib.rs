#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![feature(const_type_name)]
#![no_std]
#![expect(unsafe_code, reason = "Field projection is raw pointer arithmetic.")]

// -----------------------------------------------------------------------------
// Extern Self

// The macros emit `reflector::` paths. Inside this crate (doc tests and unit
// tests included) that name must resolve to the crate itself.
extern crate self as reflector;

// -----------------------------------------------------------------------------
// no_std support

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod error;

pub mod descriptor;
pub mod layout;
pub mod project;
pub mod slots;

#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
pub mod registry;

#[doc(hidden)]
pub mod __macro_exports;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use descriptor::{Descriptor, Reflectable, describe};
pub use error::DescribeError;
pub use layout::FieldSlot;
pub use project::{
    Projection, ProjectionMut, field_at, field_at_mut, reflect, reflect_mut, slot_offset,
};
pub use slots::{SlotAt, SlotTuple};

pub use reflector_derive::provide;

#[cfg(feature = "auto")]
#[cfg_attr(docsrs, doc(cfg(feature = "auto")))]
pub use reflector_derive as derive;

#[cfg(feature = "auto_register")]
#[cfg_attr(docsrs, doc(cfg(feature = "auto_register")))]
pub use reflector_derive::auto_register;
