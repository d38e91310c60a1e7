//! Descriptor generation shared by `#[derive(Reflectable)]` and `provide!`.
//!
//! Both mechanisms reduce their input to a [`Target`] — a type plus its
//! flattened slot records — and emit the same implementation shape: the
//! `Reflectable` impl whose `OFFSETS` constant models the layout and proves
//! it against the compiler's own `offset_of!` values while it evaluates.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Generics, Member, Type};

use crate::field_model::SlotRecord;

// -----------------------------------------------------------------------------
// Target

/// Everything the generator needs to know about one reflected type.
pub(crate) struct Target {
    /// The type the impl is written for, as a token path.
    pub ty: TokenStream,
    /// Generics of the declaration; empty for `provide!` targets.
    pub generics: Generics,
    /// Flattened slot records in declaration order.
    pub slots: Vec<SlotRecord>,
    /// Accessors to attest (`provide!` restates fields the macro cannot see,
    /// so each one is checked back against the real declaration).
    pub attested: Vec<(Member, Type)>,
    /// Submit the descriptor for collection into the global registry.
    pub auto_register: bool,
}

impl Target {
    /// Emits the full descriptor item block.
    pub fn into_descriptor_impl(self) -> TokenStream {
        let Self {
            ty,
            generics,
            slots,
            attested,
            auto_register,
        } = self;

        let slot_count = slots.len();
        let slot_tys = slots.iter().map(|slot| &slot.ty);
        let slots_tuple = quote!((#(#slot_tys,)*));
        let slot_index = 0..slot_count;
        let slot_offsets = slots.iter().map(|slot| &slot.offset);

        let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
        let mut where_clause = where_clause.cloned().unwrap_or_else(|| syn::parse_quote!(where));
        where_clause
            .predicates
            .push(syn::parse_quote!(#ty #ty_generics: ::core::marker::Copy));
        where_clause
            .predicates
            .push(syn::parse_quote!(#slots_tuple: reflector::SlotTuple));

        let attestations = attested.iter().map(|(member, field_ty)| {
            quote! {
                const _: fn(&#ty #ty_generics) -> &#field_ty =
                    |target: &#ty #ty_generics| &target.#member;
            }
        });

        // Concrete types get their descriptor evaluated right here; generic
        // ones are evaluated per instantiation, on first use.
        let force_eval = generics.params.is_empty().then(|| {
            quote! {
                const _: &[usize] = <#ty as reflector::Reflectable>::OFFSETS;
            }
        });

        let registration = auto_register.then(|| {
            quote! {
                reflector::__macro_exports::inventory::submit! {
                    reflector::__macro_exports::RegisteredDescriptor {
                        build: || reflector::registry::TypeDescriptor::of::<#ty>(),
                    }
                }
            }
        });

        quote! {
            const _: () = {
                #(#attestations)*

                unsafe impl #impl_generics reflector::Reflectable for #ty #ty_generics
                    #where_clause
                {
                    type Slots = #slots_tuple;

                    const OFFSETS: &'static [usize] = &const {
                        let slots = <Self::Slots as reflector::SlotTuple>::SLOTS;
                        let modeled = reflector::layout::model_offsets::<#slot_count>(slots);
                        reflector::descriptor::verify_extents::<Self>(slots);
                        #(
                            reflector::descriptor::verify_offset(
                                modeled[#slot_index],
                                #slot_offsets,
                            );
                        )*
                        modeled
                    };
                }

                #force_eval
                #registration
            };
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use syn::parse_quote;

    use super::*;
    use crate::field_model::SlotTable;

    fn slots_for(fields: &[(&str, Type)]) -> Vec<SlotRecord> {
        let mut table = SlotTable::new();
        for (name, ty) in fields {
            let member: Member = syn::parse_str(name).unwrap();
            table.record_field(&member, ty).unwrap();
        }
        table.finish(proc_macro2::Span::call_site()).unwrap()
    }

    #[test]
    fn generated_impl_names_the_slot_tuple() {
        let target = Target {
            ty: quote!(Point),
            generics: Generics::default(),
            slots: slots_for(&[("x", parse_quote!(f64)), ("y", parse_quote!(f64))]),
            attested: Vec::new(),
            auto_register: false,
        };

        let tokens = target.into_descriptor_impl().to_string();
        assert!(tokens.contains("type Slots"));
        assert!(tokens.contains("model_offsets"));
        assert!(tokens.contains("2usize"));
        assert!(tokens.contains("verify_extents"));
        assert!(tokens.contains("verify_offset"));
    }

    #[test]
    fn attestations_reference_the_real_fields() {
        let target = Target {
            ty: quote!(Point),
            generics: Generics::default(),
            slots: slots_for(&[("x", parse_quote!(f64))]),
            attested: vec![(parse_quote!(x), parse_quote!(f64))],
            auto_register: false,
        };

        let tokens = target.into_descriptor_impl().to_string();
        assert!(tokens.contains("target . x"));
    }
}
