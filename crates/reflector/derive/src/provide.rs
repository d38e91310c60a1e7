//! Input parsing for the `provide!` macro.

use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{Member, Token, Type, braced};

// -----------------------------------------------------------------------------
// ProvideInput

/// A manual descriptor: `path::To::Target { field: Type, … }`.
pub(crate) struct ProvideInput {
    pub target: syn::Path,
    pub accessors: Vec<(Member, Type)>,
}

/// One `field: Type` accessor entry.
struct Accessor {
    member: Member,
    ty: Type,
}

impl Parse for Accessor {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let member = input.parse()?;
        input.parse::<Token![:]>()?;
        let ty = input.parse()?;
        Ok(Self { member, ty })
    }
}

impl Parse for ProvideInput {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let target = input.parse()?;

        let content;
        braced!(content in input);
        let accessors = Punctuated::<Accessor, Token![,]>::parse_terminated(&content)?
            .into_iter()
            .map(|accessor| (accessor.member, accessor.ty))
            .collect();

        Ok(Self { target, accessors })
    }
}

// -----------------------------------------------------------------------------
// Tests
