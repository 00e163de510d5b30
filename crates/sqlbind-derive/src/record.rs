//! Record derive macro implementation

mod attrs;

use crate::common::syn_types::option_inner;
use attrs::{BindMode, get_field_attrs};
use heck::ToSnakeCase;
use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Fields, Result};

struct FieldInfo {
    ident: syn::Ident,
    ty: syn::Type,
    name: String,
    tags: Vec<(String, String)>,
    mode: BindMode,
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Record cannot be derived for generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Record can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Record can only be derived for structs",
            ));
        }
    };

    let mut infos = Vec::new();
    for field in fields {
        let attrs = get_field_attrs(field)?;
        // Only public fields take part in inserts and scans.
        if attrs.skip || !matches!(field.vis, syn::Visibility::Public(_)) {
            continue;
        }
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        infos.push(FieldInfo {
            name: ident.unraw().to_string(),
            ident,
            ty: field.ty.clone(),
            tags: attrs.tags,
            mode: attrs.mode,
        });
    }

    let descriptors = infos.iter().map(descriptor);

    let args = infos.iter().map(|info| {
        let ident = &info.ident;
        quote! { ::sqlbind::FieldArg::of(&self.#ident) }
    });

    let arms = infos.iter().enumerate().map(|(idx, info)| {
        let ident = &info.ident;
        let ty = &info.ty;
        let optional = option_inner(ty).is_some();
        let call = match (info.mode, optional) {
            (BindMode::Convert, _) => {
                quote! { <#ty as ::sqlbind::Bindable>::assign(&mut self.#ident, value, ctx) }
            }
            (BindMode::Unmarshal, false) => quote! { ::sqlbind::unmarshal_into(&mut self.#ident, value) },
            (BindMode::Unmarshal, true) => quote! { ::sqlbind::unmarshal_option(&mut self.#ident, value) },
            (BindMode::Raw, false) => quote! { ::sqlbind::accept_into(&mut self.#ident, value) },
            (BindMode::Raw, true) => quote! { ::sqlbind::accept_option(&mut self.#ident, value) },
        };
        quote! { #idx => #call, }
    });

    let type_name = name.to_string();

    Ok(quote! {
        impl ::sqlbind::Record for #name {
            fn fields() -> &'static [::sqlbind::FieldDescriptor] {
                static FIELDS: &[::sqlbind::FieldDescriptor] = &[#(#descriptors),*];
                FIELDS
            }

            fn field_args(&self) -> ::std::vec::Vec<::sqlbind::FieldArg> {
                ::std::vec![#(#args),*]
            }

            #[allow(unused_variables)]
            fn bind_field(
                &mut self,
                index: usize,
                value: &::sqlbind::Value,
                ctx: &::sqlbind::BindContext<'_>,
            ) -> ::sqlbind::BindResult<()> {
                match index {
                    #(#arms)*
                    _ => ::std::result::Result::Err(::sqlbind::BindError::NotSettable(
                        ::std::format!("{} has no bindable field at index {}", #type_name, index),
                    )),
                }
            }
        }
    })
}

fn descriptor(info: &FieldInfo) -> TokenStream {
    let field = &info.name;
    let derived = info.name.to_snake_case();
    let ty = &info.ty;
    let tags = info.tags.iter().map(|(tag, value)| quote! { (#tag, #value) });
    let optional = option_inner(ty).is_some();

    let (kind, optional) = match info.mode {
        BindMode::Convert => (
            quote! { <#ty as ::sqlbind::Bindable>::KIND },
            quote! { <#ty as ::sqlbind::Bindable>::OPTIONAL },
        ),
        BindMode::Unmarshal => (quote! { ::sqlbind::FieldKind::Unmarshal }, quote! { #optional }),
        BindMode::Raw => (quote! { ::sqlbind::FieldKind::Raw }, quote! { #optional }),
    };
    let unmarshal = info.mode == BindMode::Unmarshal;

    quote! {
        ::sqlbind::FieldDescriptor {
            field: #field,
            derived: #derived,
            tags: &[#(#tags),*],
            kind: #kind,
            optional: #optional,
            unmarshal: #unmarshal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn private_and_skipped_fields_are_omitted() {
        let input: DeriveInput = parse_quote! {
            struct User {
                pub id: i64,
                #[db(skip)]
                pub cache: String,
                secret: String,
            }
        };
        let out = expand(input).unwrap().to_string();
        assert!(out.contains("\"id\""));
        assert!(!out.contains("\"cache\""));
        assert!(!out.contains("\"secret\""));
    }

    #[test]
    fn derived_name_is_snake_case() {
        let input: DeriveInput = parse_quote! {
            struct User {
                pub CreatedAt: i64,
                pub r#type: String,
            }
        };
        let out = expand(input).unwrap().to_string();
        assert!(out.contains("\"created_at\""));
        assert!(out.contains("\"type\""));
    }

    #[test]
    fn unmarshal_option_dispatch() {
        let input: DeriveInput = parse_quote! {
            struct Doc {
                #[db(unmarshal)]
                pub tags: Option<Tags>,
                #[db(raw)]
                pub extra: Value,
            }
        };
        let out = expand(input).unwrap().to_string();
        assert!(out.contains("unmarshal_option"));
        assert!(out.contains("accept_into"));
    }

    #[test]
    fn rejects_generics_and_tuples() {
        let input: DeriveInput = parse_quote! { struct Wrap<T> { pub v: T } };
        assert!(expand(input).is_err());

        let input: DeriveInput = parse_quote! { struct Pair(pub i32, pub i32); };
        assert!(expand(input).is_err());
    }
}
