//! The reflection projector.
//!
//! A projection is a tuple of live references aliasing one instance's field
//! slots, built by adding each verified descriptor offset to the instance's
//! base address. Nothing here can fail at runtime: every offset was proven
//! against the real layout when the descriptor was evaluated, and Rust's
//! borrows pin the projection's lifetime to the instance it aliases.

use crate::descriptor::Reflectable;
use crate::slots::{SlotAt, SlotTuple};

/// The shared projection of `T`: `(&'a F0, &'a F1, …)`.
pub type Projection<'a, T> = <<T as Reflectable>::Slots as SlotTuple>::Refs<'a>;

/// The exclusive projection of `T`: `(&'a mut F0, &'a mut F1, …)`.
pub type ProjectionMut<'a, T> = <<T as Reflectable>::Slots as SlotTuple>::Muts<'a>;

// -----------------------------------------------------------------------------
// Projection entry points

/// Reflects over an instance, gathering a reference to each field slot.
///
/// # Examples
///
/// ```rust
/// use reflector::{derive::Reflectable, reflect};
///
/// #[derive(Clone, Copy, Reflectable)]
/// #[repr(C)]
/// struct Point {
///     x: f64,
///     y: f64,
/// }
///
/// let point = Point { x: 4.0, y: 5.0 };
/// let (x, y) = reflect(&point);
///
/// assert_eq!(*x, 4.0);
/// assert!(core::ptr::eq(y, &point.y));
/// ```
#[inline]
pub fn reflect<T: Reflectable>(target: &T) -> Projection<'_, T> {
    debug_check_slots::<T>(target as *const T as usize);
    // SAFETY: the descriptor contract guarantees one verified, in-bounds,
    // aligned offset per slot; the borrow of `target` outlives the refs.
    unsafe { <T::Slots as SlotTuple>::project((target as *const T).cast(), T::OFFSETS) }
}

/// Reflects over an instance, gathering a mutable reference to each field
/// slot.
///
/// The instance is borrowed exclusively, and distinct slots occupy disjoint
/// bytes, so the returned references are independent: writing through one
/// is immediately visible through the instance and any later projection.
///
/// # Examples
///
/// ```rust
/// use reflector::{derive::Reflectable, reflect_mut};
///
/// #[derive(Clone, Copy, Reflectable)]
/// #[repr(C)]
/// struct Point {
///     x: f64,
///     y: f64,
/// }
///
/// let mut point = Point { x: 4.0, y: 5.0 };
/// let (x, y) = reflect_mut(&mut point);
/// *x = 10.0;
/// *y = 20.0;
///
/// assert_eq!(point.x, 10.0);
/// assert_eq!(point.y, 20.0);
/// ```
#[inline]
pub fn reflect_mut<T: Reflectable>(target: &mut T) -> ProjectionMut<'_, T> {
    debug_check_slots::<T>(target as *const T as usize);
    // SAFETY: as in `reflect`; the exclusive borrow rules out aliasing, and
    // disjoint slots keep the per-field exclusive refs from overlapping.
    unsafe { <T::Slots as SlotTuple>::project_mut((target as *mut T).cast(), T::OFFSETS) }
}

// -----------------------------------------------------------------------------
// Indexed access

/// Retrieves a reference to slot `I` of an instance.
///
/// Equivalent to element `I` of [`reflect`]; the slot index is checked
/// against the descriptor at compile time, so an out-of-range `I` is a build
/// error, not a panic.
///
/// # Examples
///
/// ```rust
/// use reflector::{derive::Reflectable, field_at};
///
/// #[derive(Clone, Copy, Reflectable)]
/// #[repr(C)]
/// struct Pair {
///     first: u32,
///     second: u64,
/// }
///
/// let pair = Pair { first: 7, second: 9 };
/// assert_eq!(*field_at::<0, _>(&pair), 7_u32);
/// assert_eq!(*field_at::<1, _>(&pair), 9_u64);
/// ```
#[inline]
pub fn field_at<const I: usize, T>(target: &T) -> &<T::Slots as SlotAt<I>>::Slot
where
    T: Reflectable,
    T::Slots: SlotAt<I>,
{
    // SAFETY: `I < SLOT_COUNT` by the `SlotAt` bound, and `OFFSETS[I]` is the
    // verified offset of a live slot of the returned type.
    unsafe {
        &*(target as *const T)
            .cast::<u8>()
            .add(T::OFFSETS[I])
            .cast::<<T::Slots as SlotAt<I>>::Slot>()
    }
}

/// Retrieves a mutable reference to slot `I` of an instance.
///
/// See [`field_at`].
#[inline]
pub fn field_at_mut<const I: usize, T>(target: &mut T) -> &mut <T::Slots as SlotAt<I>>::Slot
where
    T: Reflectable,
    T::Slots: SlotAt<I>,
{
    // SAFETY: as in `field_at`, with exclusivity from the `&mut` borrow.
    unsafe {
        &mut *(target as *mut T)
            .cast::<u8>()
            .add(T::OFFSETS[I])
            .cast::<<T::Slots as SlotAt<I>>::Slot>()
    }
}

/// Byte offset of slot `index` of `T`, without an instance.
///
/// A pure function of the descriptor.
///
/// # Panics
///
/// Panics if `index` is out of range; in const contexts that is a build
/// error.
///
/// # Examples
///
/// ```rust
/// use reflector::{derive::Reflectable, slot_offset};
///
/// #[derive(Clone, Copy, Reflectable)]
/// #[repr(C)]
/// struct Pair {
///     first: u32,
///     second: u64,
/// }
///
/// const SECOND: usize = slot_offset::<Pair>(1);
/// assert_eq!(SECOND, core::mem::offset_of!(Pair, second));
/// ```
#[inline]
pub const fn slot_offset<T: Reflectable>(index: usize) -> usize {
    T::OFFSETS[index]
}

// -----------------------------------------------------------------------------
// Debug checks

/// Re-checks slot alignment against the instance's actual address.
///
/// Compiled only with the `debug` feature in debug builds; release builds
/// carry no trace of it.
#[cfg(all(debug_assertions, feature = "debug"))]
fn debug_check_slots<T: Reflectable>(base: usize) {
    for (slot, offset) in T::SLOTS.iter().zip(T::OFFSETS) {
        debug_assert!(
            (base + offset) % slot.align() == 0,
            "slot of type {} is not aligned at its projected address",
            slot.type_name(),
        );
    }
}

#[cfg(not(all(debug_assertions, feature = "debug")))]
#[inline(always)]
fn debug_check_slots<T: Reflectable>(_base: usize) {}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use core::mem::offset_of;
    use core::ptr;

    use reflector_derive::Reflectable;

    use super::*;
    use crate::describe;

    #[derive(Clone, Copy, Reflectable)]
    #[repr(C)]
    struct Point {
        x: f64,
        y: f64,
    }

    #[derive(Clone, Copy, Reflectable)]
    #[repr(C)]
    struct Circle {
        center: Point,
        radius: f64,
    }

    #[derive(Clone, Copy, Reflectable)]
    #[repr(C)]
    struct Mixed {
        flag: u8,
        value: u32,
        tail: u16,
    }

    #[test]
    fn projection_yields_one_reference_per_field() {
        let point = Point { x: 4.0, y: 5.0 };
        let (x, y) = reflect(&point);

        assert_eq!(*x, 4.0);
        assert_eq!(*y, 5.0);
        assert!(ptr::eq(x, &point.x));
        assert!(ptr::eq(y, &point.y));
    }

    #[test]
    fn writes_through_a_projection_hit_exactly_one_field() {
        let mut point = Point { x: 4.0, y: 5.0 };
        let (x, _) = reflect_mut(&mut point);
        *x = 10.0;

        assert_eq!(point.x, 10.0);
        assert_eq!(point.y, 5.0);

        // A fresh projection observes the write.
        let (x, y) = reflect(&point);
        assert_eq!((*x, *y), (10.0, 5.0));
    }

    #[test]
    fn composite_slots_project_as_whole_values() {
        let circle = Circle {
            center: Point { x: 4.0, y: 5.0 },
            radius: 3.0,
        };
        let (center, radius) = reflect(&circle);

        assert_eq!(describe::<Circle>().slot_count(), 2);
        assert!(ptr::eq(center, &circle.center));
        assert_eq!(*radius, 3.0);
    }

    #[test]
    fn nested_projection_aliases_the_outer_instance() {
        let mut circle = Circle {
            center: Point { x: 4.0, y: 5.0 },
            radius: 3.0,
        };

        let (center, _) = reflect_mut(&mut circle);
        let (x, y) = reflect_mut(center);
        *x = 8.0;
        *y = 9.0;

        assert_eq!(circle.center.x, 8.0);
        assert_eq!(circle.center.y, 9.0);

        // Offset-additive nesting: the inner slot address equals the outer
        // offset plus the inner offset.
        let base = &circle as *const Circle as usize;
        let inner = field_at::<0, _>(&circle.center) as *const f64 as usize;
        assert_eq!(
            inner,
            base + slot_offset::<Circle>(0) + slot_offset::<Point>(0)
        );
    }

    #[test]
    fn offsets_match_the_platform_layout() {
        assert_eq!(slot_offset::<Mixed>(0), offset_of!(Mixed, flag));
        assert_eq!(slot_offset::<Mixed>(1), offset_of!(Mixed, value));
        assert_eq!(slot_offset::<Mixed>(2), offset_of!(Mixed, tail));
        assert_eq!(describe::<Mixed>().size(), size_of::<Mixed>());
    }

    #[test]
    fn indexed_access_matches_the_projection() {
        let mixed = Mixed {
            flag: 1,
            value: 2,
            tail: 3,
        };
        let (flag, value, tail) = reflect(&mixed);

        assert!(ptr::eq(field_at::<0, _>(&mixed), flag));
        assert!(ptr::eq(field_at::<1, _>(&mixed), value));
        assert!(ptr::eq(field_at::<2, _>(&mixed), tail));
    }

    #[test]
    fn indexed_writes_are_visible_to_the_instance() {
        let mut mixed = Mixed {
            flag: 0,
            value: 0,
            tail: 0,
        };
        *field_at_mut::<1, _>(&mut mixed) = 42_u32;
        assert_eq!(mixed.value, 42);
    }

    #[test]
    fn array_fields_project_one_slot_per_element() {
        #[derive(Clone, Copy, Reflectable)]
        #[repr(C)]
        struct ArrayPoint {
            coords: [f64; 2],
        }

        let mut point = ArrayPoint { coords: [4.0, 5.0] };

        let (a, b) = reflect(&point);
        assert!(ptr::eq(a, &point.coords[0]));
        assert!(ptr::eq(b, &point.coords[1]));

        let (a, _) = reflect_mut(&mut point);
        *a = 10.0;
        assert_eq!(point.coords, [10.0, 5.0]);
    }

    #[test]
    fn composite_fields_flatten_only_when_reflected_themselves() {
        #[derive(Clone, Copy, Reflectable)]
        #[repr(C)]
        struct ArrayPoint {
            coords: [f64; 2],
        }

        #[derive(Clone, Copy, Reflectable)]
        #[repr(C)]
        struct Disc {
            center: ArrayPoint,
            radius: f64,
        }

        let disc = Disc {
            center: ArrayPoint { coords: [4.0, 5.0] },
            radius: 3.0,
        };

        // The composite field is one slot, a reference to the whole point.
        assert_eq!(describe::<Disc>().slot_count(), 2);
        let (center, radius) = reflect(&disc);
        assert!(ptr::eq(center, &disc.center));
        assert_eq!(*radius, 3.0);

        // Reflecting the projected composite reaches its array elements.
        let (a, b) = reflect(center);
        assert!(ptr::eq(a, &disc.center.coords[0]));
        assert!(ptr::eq(b, &disc.center.coords[1]));
    }

    #[test]
    fn tuple_structs_project_by_position() {
        #[derive(Clone, Copy, Reflectable)]
        #[repr(C)]
        struct Wrapper(f32, u32);

        let wrapper = Wrapper(1.5, 7);
        let (a, b) = reflect(&wrapper);
        assert_eq!(*a, 1.5);
        assert_eq!(*b, 7);
        assert!(ptr::eq(a, &wrapper.0));
    }

    #[test]
    fn generic_targets_resolve_per_instantiation() {
        #[derive(Clone, Copy, Reflectable)]
        #[repr(C)]
        struct Pair<T> {
            first: T,
            second: T,
        }

        let pair = Pair {
            first: 3_u16,
            second: 4_u16,
        };
        let (first, second) = reflect(&pair);
        assert_eq!((*first, *second), (3, 4));
        assert_eq!(slot_offset::<Pair<u16>>(1), offset_of!(Pair<u16>, second));

        let wide = Pair {
            first: 3.0_f64,
            second: 4.0_f64,
        };
        let (_, second) = reflect(&wide);
        assert!(ptr::eq(second, &wide.second));
        assert_eq!(slot_offset::<Pair<f64>>(1), 8);
    }
}
