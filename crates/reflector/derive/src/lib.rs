//! See following macros:
//!
//! - [`Reflectable`]
//! - [`provide`]
//! - [`auto_register`]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::std_instead_of_core, reason = "proc-macro lib")]
#![allow(clippy::std_instead_of_alloc, reason = "proc-macro lib")]

use proc_macro::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Attribute, Data, DeriveInput, Generics, Index, Member, parse_macro_input};

static REFLECT_ATTRIBUTE_NAME: &str = "reflect";

// -----------------------------------------------------------------------------
// Modules

mod codegen;
mod field_model;
mod provide;

use codegen::Target;
use field_model::SlotTable;

// -----------------------------------------------------------------------------
// Macros

/// # Automatic Descriptor Derivation
///
/// `#[derive(Reflectable)]` reads the struct declaration and emits its
/// structural descriptor: the flattened field-type list and the verified
/// byte offset of every slot. No annotation per field is needed — the
/// declaration itself is the source of truth.
///
/// ```rust, ignore
/// #[derive(Clone, Copy, Reflectable)]
/// #[repr(C)]
/// struct Point {
///     x: f64,
///     y: f64,
/// }
/// ```
///
/// ## Requirements
///
/// - The struct must be `#[repr(C)]`; `packed` and `align(N)` modifiers are
///   rejected.
/// - The struct must be `Copy`.
/// - Array fields must use literal lengths, and the flattened slot count is
///   limited to 16.
///
/// Unions and enums have no unambiguous projectable layout and are rejected
/// outright.
///
/// ## Array flattening
///
/// An array field contributes one slot per scalar element, at every nesting
/// level: `coords: [f64; 2]` projects as two `&f64` slots, `[[f64; 2]; 3]`
/// as six. Composite struct fields are *not* flattened — they project as a
/// single reference that can itself be reflected.
///
/// ## Auto Registration
///
/// Registration into the global descriptor registry is opt-in per type:
///
/// ```rust, ignore
/// #[derive(Clone, Copy, Reflectable)]
/// #[reflect(auto_register)]
/// #[repr(C)]
/// struct Sample {
///     value: u32,
/// }
/// ```
///
/// The attribute is a no-op when the `auto_register` feature is disabled,
/// and has no effect on generic types, whose concrete instantiations cannot
/// be enumerated here.
#[proc_macro_derive(Reflectable, attributes(reflect))]
pub fn derive_reflectable(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    match expand_derive(ast) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.into_compile_error().into(),
    }
}

/// # Manual Descriptor Provision
///
/// `provide!` builds the descriptor a derive would build, from an explicit
/// ordered accessor list instead of the declaration. Use it for foreign
/// types, or everywhere when the `auto` feature is disabled (manual-only
/// mode).
///
/// ```rust, ignore
/// reflector::provide! {
///     shapes::Circle { center: shapes::Point, radius: f64 }
/// }
/// ```
///
/// Accessors must appear in declaration order. Every accessor is attested
/// against the real type — a misnamed field or a wrong type is a build
/// error — and the combined slot list must reconstruct the target's size
/// and alignment exactly, so an omitted field cannot go unnoticed.
///
/// Array fields flatten exactly as under the derive, keeping the two
/// mechanisms index-compatible:
///
/// ```rust, ignore
/// reflector::provide! {
///     shapes::Point { coords: [f64; 2] }
/// }
/// // slot 0 and 1 are both `f64`
/// ```
///
/// Tuple struct fields are addressed by index: `Wrapper { 0: f32, 1: f32 }`.
///
/// The target must be a concrete `#[repr(C)]`, `Copy` type; generics are not
/// supported here.
#[proc_macro]
pub fn provide(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as provide::ProvideInput);

    match expand_provide(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.into_compile_error().into(),
    }
}

/// Submits a type's descriptor for collection into the global registry.
///
/// If the `auto_register` feature is not enabled, this macro does nothing.
///
/// The type must be concrete and already reflectable (derived or provided):
///
/// ```rust, ignore
/// reflector::auto_register!(shapes::Circle);
/// ```
///
/// This is the `provide!`-side counterpart of the
/// `#[reflect(auto_register)]` derive attribute; using both for one type is
/// harmless, as registration is first-write-wins.
#[proc_macro]
pub fn auto_register(_input: TokenStream) -> TokenStream {
    #[cfg(not(feature = "auto_register"))]
    return TokenStream::new();

    #[cfg(feature = "auto_register")]
    {
        let target = syn::parse_macro_input!(_input as syn::Type);

        TokenStream::from(quote! {
            const _: () = {
                reflector::__macro_exports::inventory::submit! {
                    reflector::__macro_exports::RegisteredDescriptor {
                        build: || reflector::registry::TypeDescriptor::of::<#target>(),
                    }
                }
            };
        })
    }
}

// -----------------------------------------------------------------------------
// Expansion

fn expand_derive(ast: DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let data = match &ast.data {
        Data::Struct(data) => data,
        Data::Union(data) => {
            return Err(syn::Error::new(
                data.union_token.span,
                "union types cannot be reflected: the field layout is ambiguous",
            ));
        }
        Data::Enum(data) => {
            return Err(syn::Error::new(
                data.enum_token.span,
                "enums cannot be reflected: only plain field aggregates have a projectable layout",
            ));
        }
    };

    check_repr_c(&ast)?;
    let auto_register = parse_reflect_attrs(&ast.attrs)?;

    let mut table = SlotTable::new();
    for (index, field) in data.fields.iter().enumerate() {
        let member = match &field.ident {
            Some(ident) => Member::Named(ident.clone()),
            None => Member::Unnamed(Index::from(index)),
        };
        table.record_field(&member, &field.ty)?;
    }
    let slots = table.finish(ast.ident.span())?;

    // Registration needs a concrete type; the attribute is inert on generic
    // declarations.
    let is_generic = !ast.generics.params.is_empty();
    let ident = &ast.ident;

    Ok(Target {
        ty: quote!(#ident),
        generics: ast.generics.clone(),
        slots,
        attested: Vec::new(),
        auto_register: cfg!(feature = "auto_register") && auto_register && !is_generic,
    }
    .into_descriptor_impl())
}

fn expand_provide(input: provide::ProvideInput) -> syn::Result<proc_macro2::TokenStream> {
    let mut table = SlotTable::new();
    for (member, ty) in &input.accessors {
        table.record_field(member, ty)?;
    }
    let slots = table.finish(input.target.span())?;

    let target = &input.target;

    Ok(Target {
        ty: quote!(#target),
        generics: Generics::default(),
        slots,
        attested: input.accessors,
        auto_register: false,
    }
    .into_descriptor_impl())
}

// -----------------------------------------------------------------------------
// Attribute checks

/// Requires `#[repr(C)]` and rejects layout modifiers the storage model
/// cannot reproduce.
fn check_repr_c(ast: &DeriveInput) -> syn::Result<()> {
    let mut has_c = false;
    for attr in &ast.attrs {
        if !attr.path().is_ident("repr") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("C") {
                has_c = true;
                Ok(())
            } else if meta.path.is_ident("packed") || meta.path.is_ident("align") {
                Err(meta.error("`packed` and `align` layout modifiers are not supported"))
            } else if meta.path.is_ident("transparent") {
                Err(meta.error(
                    "`transparent` types have no slot list of their own; reflect the inner type",
                ))
            } else {
                Err(meta.error("unsupported repr for a reflected type"))
            }
        })?;
    }

    if has_c {
        Ok(())
    } else {
        Err(syn::Error::new(
            ast.ident.span(),
            "reflected types must be `#[repr(C)]` so their layout can be modeled",
        ))
    }
}

fn parse_reflect_attrs(attrs: &[Attribute]) -> syn::Result<bool> {
    let mut auto_register = false;
    for attr in attrs {
        if !attr.path().is_ident(REFLECT_ATTRIBUTE_NAME) {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("auto_register") {
                auto_register = true;
                Ok(())
            } else {
                Err(meta.error("unknown `reflect` attribute"))
            }
        })?;
    }
    Ok(auto_register)
}
