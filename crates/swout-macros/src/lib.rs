use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Lit, Meta};

/// Derive macro for period accumulator structs.
///
/// Every field must be `f64`, `[f64; N]` or `[[f64; N]; M]`. The derive adds
/// `reset()` (zero every slot), `is_reset()`, `field_names()` and
/// `n_slots()` to the struct.
///
/// Use `#[accumulator(label = "weather")]` to set the label returned by
/// `label()`; it defaults to the struct name.
#[proc_macro_derive(Accumulator, attributes(accumulator))]
pub fn derive_accumulator(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let name = &input.ident;

    let label = extract_label(&input).unwrap_or_else(|| name.to_string());

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return syn::Error::new_spanned(
                    name,
                    "Accumulator can only be derived for structs with named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new_spanned(name, "Accumulator can only be derived for structs")
                .to_compile_error()
                .into();
        }
    };

    if fields.is_empty() {
        return syn::Error::new_spanned(name, "Accumulator struct must have at least one field")
            .to_compile_error()
            .into();
    }

    let mut field_names = Vec::new();
    let mut reset_stmts = Vec::new();
    let mut zero_checks = Vec::new();
    let mut slot_counts = Vec::new();
    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let ty = &field.ty;
        let (reset, check) = match slot_rank(ty) {
            Some(0) => (
                quote! { self.#ident = 0.0; },
                quote! { self.#ident == 0.0 },
            ),
            Some(1) => (
                quote! { self.#ident.fill(0.0); },
                quote! { self.#ident.iter().all(|v| *v == 0.0) },
            ),
            Some(2) => (
                quote! { self.#ident.iter_mut().for_each(|row| row.fill(0.0)); },
                quote! { self.#ident.iter().flatten().all(|v| *v == 0.0) },
            ),
            _ => {
                return syn::Error::new_spanned(
                    ty,
                    "Accumulator derive: fields must be f64, [f64; N] or [[f64; N]; M]",
                )
                .to_compile_error()
                .into();
            }
        };
        field_names.push(ident.to_string());
        reset_stmts.push(reset);
        zero_checks.push(check);
        slot_counts.push(quote! {
            ::std::mem::size_of::<#ty>() / ::std::mem::size_of::<f64>()
        });
    }

    let field_name_strs: Vec<&str> = field_names.iter().map(|s| s.as_str()).collect();

    let expanded = quote! {
        impl #name {
            /// Zero every accumulated slot.
            pub fn reset(&mut self) {
                #(#reset_stmts)*
            }

            /// Returns `true` if every slot is exactly zero.
            pub fn is_reset(&self) -> bool {
                true #(&& #zero_checks)*
            }

            /// Returns the field names of this accumulator.
            pub fn field_names() -> &'static [&'static str] {
                &[#(#field_name_strs),*]
            }

            /// Total number of `f64` slots across all fields.
            pub fn n_slots() -> usize {
                0 #(+ #slot_counts)*
            }

            /// Short label used in log messages.
            pub fn label() -> &'static str {
                #label
            }
        }
    };

    expanded.into()
}

fn extract_label(input: &DeriveInput) -> Option<String> {
    for attr in &input.attrs {
        if attr.path().is_ident("accumulator") {
            let nested = attr
                .parse_args_with(
                    syn::punctuated::Punctuated::<syn::Meta, syn::Token![,]>::parse_terminated,
                )
                .ok()?;
            for meta in nested {
                if let Meta::NameValue(nv) = meta {
                    if nv.path.is_ident("label") {
                        if let syn::Expr::Lit(expr_lit) = &nv.value {
                            if let Lit::Str(lit_str) = &expr_lit.lit {
                                return Some(lit_str.value());
                            }
                        }
                    }
                }
            }
        }
    }
    None
}

/// Nesting depth of `f64` arrays: 0 for `f64`, 1 for `[f64; N]`, 2 for
/// `[[f64; N]; M]`. `None` for anything else.
fn slot_rank(ty: &syn::Type) -> Option<usize> {
    match ty {
        syn::Type::Path(type_path) if type_path.path.is_ident("f64") => Some(0),
        syn::Type::Array(array) => match slot_rank(&array.elem)? {
            rank @ (0 | 1) => Some(rank + 1),
            _ => None,
        },
        _ => None,
    }
}
