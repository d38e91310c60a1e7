//! The expansion-time slot table.
//!
//! Both discovery mechanisms funnel into [`SlotTable`]: fields are recorded
//! in declaration order, array fields are flattened into one slot per scalar
//! element, and every record is write-once — a duplicate or conflicting
//! record aborts expansion instead of being resolved silently.

use std::collections::HashSet;

use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use syn::spanned::Spanned;
use syn::{Lit, Member, Type};

/// Upper bound on flattened slots per reflected type, set by the projection
/// tuple arities implemented in the core crate.
pub(crate) const MAX_SLOTS: usize = 16;

// -----------------------------------------------------------------------------
// SlotRecord

/// One flattened slot: its static type and an expression for the slot's real
/// byte offset inside `Self`.
#[derive(Debug)]
pub(crate) struct SlotRecord {
    pub ty: Type,
    pub offset: TokenStream,
}

// -----------------------------------------------------------------------------
// SlotTable

/// Append-only record of a type's flattened slots.
pub(crate) struct SlotTable {
    slots: Vec<SlotRecord>,
    declared: HashSet<String>,
}

impl SlotTable {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            declared: HashSet::new(),
        }
    }

    /// Records one declared field, flattening arrays.
    ///
    /// A field may be recorded only once; a second record under the same
    /// accessor is a conflicting redefinition and fails the expansion.
    pub fn record_field(&mut self, member: &Member, ty: &Type) -> syn::Result<()> {
        let accessor = member.to_token_stream().to_string();
        if !self.declared.insert(accessor.clone()) {
            return Err(syn::Error::new(
                member.span(),
                format!("field `{accessor}` is recorded more than once"),
            ));
        }

        let (scalar, count) = flatten(ty)?;
        match count {
            None => self.slots.push(SlotRecord {
                ty: scalar,
                offset: quote!(::core::mem::offset_of!(Self, #member)),
            }),
            Some(count) => {
                for element in 0..count {
                    let ty = scalar.clone();
                    self.slots.push(SlotRecord {
                        ty: ty.clone(),
                        offset: quote! {
                            ::core::mem::offset_of!(Self, #member)
                                + #element * ::core::mem::size_of::<#ty>()
                        },
                    });
                }
            }
        }
        Ok(())
    }

    /// Finishes the table, enforcing the slot arity cap.
    pub fn finish(self, span: proc_macro2::Span) -> syn::Result<Vec<SlotRecord>> {
        if self.slots.len() > MAX_SLOTS {
            return Err(syn::Error::new(
                span,
                format!(
                    "a reflected type is limited to {MAX_SLOTS} flattened field slots, \
                     found {}",
                    self.slots.len(),
                ),
            ));
        }
        Ok(self.slots)
    }
}

// -----------------------------------------------------------------------------
// Array flattening

/// Resolves a field type to its scalar slot type.
///
/// Returns `(scalar, None)` for non-array fields and `(scalar, Some(n))` for
/// arrays, where `n` is the total scalar element count across every nesting
/// level: `[[f64; 2]; 3]` flattens to six `f64` slots.
fn flatten(ty: &Type) -> syn::Result<(Type, Option<usize>)> {
    let Type::Array(array) = ty else {
        return Ok((ty.clone(), None));
    };

    let len = array_len(array)?;
    let (scalar, inner) = flatten(&array.elem)?;
    Ok((scalar, Some(len * inner.unwrap_or(1))))
}

/// Extracts a literal array length.
///
/// Slot arity must be countable while the descriptor is being generated, so
/// lengths written as named constants or const expressions are rejected.
fn array_len(array: &syn::TypeArray) -> syn::Result<usize> {
    if let syn::Expr::Lit(expr) = &array.len
        && let Lit::Int(lit) = &expr.lit
    {
        return lit.base10_parse();
    }

    Err(syn::Error::new(
        array.len.span(),
        "array fields must use a literal length so slots can be counted during expansion",
    ))
}

// -----------------------------------------------------------------------------
// Tests
