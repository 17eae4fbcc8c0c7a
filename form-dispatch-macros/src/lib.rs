//! Procedural macros for form-dispatch

use darling::{FromDeriveInput, FromVariant};
use proc_macro::TokenStream;
use quote::quote;
use std::collections::HashSet;
use syn::{parse_macro_input, DeriveInput};

/// Container-level attributes for #[derive(Intent)]
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(intent), supports(enum_any))]
struct IntentOpts {
    ident: syn::Ident,
    generics: syn::Generics,
    data: darling::ast::Data<IntentVariant, ()>,

    /// Vocabulary version
    #[darling(default)]
    version: Option<u32>,

    /// Also implement `IntentSummary` with its Debug-based default
    #[darling(default)]
    summary: bool,
}

/// Variant-level attributes
#[derive(Debug, FromVariant)]
#[darling(attributes(intent))]
struct IntentVariant {
    ident: syn::Ident,
    fields: darling::ast::Fields<()>,

    /// Explicit kind instead of the variant name
    #[darling(default)]
    kind: Option<String>,
}

/// Derive macro for the Intent trait
///
/// Generates `kind()` returning the variant name and fills `KINDS` with the
/// full vocabulary.
///
/// # Attributes
///
/// - `#[intent(version = 2)]` on the enum: set `Intent::VERSION`
/// - `#[intent(summary)]` on the enum: also implement `IntentSummary`
/// - `#[intent(kind = "login/submit")]` on a variant: use a custom kind
///
/// # Example
/// ```ignore
/// #[derive(Intent, Clone, Debug)]
/// #[intent(version = 1, summary)]
/// enum Intent {
///     FieldChange { field: String, value: String },
///     FormSubmit,
///     SubmitDidFail(String),
/// }
///
/// assert_eq!(Intent::FormSubmit.kind(), "FormSubmit");
/// assert!(Intent::knows_kind("SubmitDidFail"));
/// ```
#[proc_macro_derive(Intent, attributes(intent))]
pub fn derive_intent(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let opts = match IntentOpts::from_derive_input(&input) {
        Ok(opts) => opts,
        Err(e) => return e.write_errors().into(),
    };

    let name = &opts.ident;
    let (impl_generics, ty_generics, where_clause) = opts.generics.split_for_impl();

    let variants = match &opts.data {
        darling::ast::Data::Enum(variants) => variants,
        _ => {
            return syn::Error::new_spanned(&input, "Intent can only be derived for enums")
                .to_compile_error()
                .into();
        }
    };

    let mut seen = HashSet::new();
    let mut kinds = Vec::with_capacity(variants.len());
    for v in variants {
        let kind = v.kind.clone().unwrap_or_else(|| v.ident.to_string());
        if !seen.insert(kind.clone()) {
            return syn::Error::new_spanned(&v.ident, format!("duplicate intent kind `{kind}`"))
                .to_compile_error()
                .into();
        }
        kinds.push(kind);
    }

    let kind_arms = variants.iter().zip(&kinds).map(|(v, kind)| {
        let variant_name = &v.ident;
        match &v.fields.style {
            darling::ast::Style::Unit => quote! {
                #name::#variant_name => #kind
            },
            darling::ast::Style::Tuple => quote! {
                #name::#variant_name(..) => #kind
            },
            darling::ast::Style::Struct => quote! {
                #name::#variant_name { .. } => #kind
            },
        }
    });

    let version = opts.version.map(|version| {
        quote! { const VERSION: u32 = #version; }
    });

    let mut expanded = quote! {
        impl #impl_generics ::form_dispatch::Intent for #name #ty_generics #where_clause {
            #version

            const KINDS: &'static [&'static str] = &[#(#kinds),*];

            fn kind(&self) -> &'static str {
                match self {
                    #(#kind_arms),*
                }
            }
        }
    };

    if opts.summary {
        expanded.extend(quote! {
            impl #impl_generics ::form_dispatch::IntentSummary for #name #ty_generics #where_clause {}
        });
    }

    TokenStream::from(expanded)
}
