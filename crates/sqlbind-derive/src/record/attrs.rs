//! Attribute parsing for the Record derive macro.

use proc_macro2::Span;
use syn::Result;

/// How a field's value reaches it during a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum BindMode {
    /// Through the conversion matrix (`Bindable`).
    Convert,
    /// Byte payload handed to `UnmarshalBytes`.
    Unmarshal,
    /// Driver value handed to `AcceptValue` unmodified.
    Raw,
}

pub(super) struct FieldAttrs {
    pub(super) tags: Vec<(String, String)>,
    pub(super) skip: bool,
    pub(super) mode: BindMode,
}

struct FieldAttrList {
    column: Option<String>,
    tags: Vec<(String, String)>,
    skip: bool,
    unmarshal: bool,
    raw: bool,
}

impl syn::parse::Parse for FieldAttrList {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut column: Option<String> = None;
        let mut tags: Vec<(String, String)> = Vec::new();
        let mut skip = false;
        let mut unmarshal = false;
        let mut raw = false;

        loop {
            if input.is_empty() {
                break;
            }

            let ident: syn::Ident = input.parse()?;
            let key = ident.to_string();

            if input.peek(syn::token::Paren) {
                if key != "tag" {
                    return Err(syn::Error::new_spanned(
                        &ident,
                        "unexpected function-style attribute",
                    ));
                }
                let content;
                syn::parenthesized!(content in input);
                tags.extend(parse_tag_list(&content)?);
            } else if input.peek(syn::Token![=]) {
                let _: syn::Token![=] = input.parse()?;
                let value: syn::LitStr = input.parse()?;

                match key.as_str() {
                    "column" => column = Some(value.value()),
                    _ => {
                        return Err(syn::Error::new_spanned(
                            &ident,
                            format!("unknown db attribute `{key}`"),
                        ));
                    }
                }
            } else {
                match key.as_str() {
                    "skip" => skip = true,
                    "unmarshal" => unmarshal = true,
                    "raw" => raw = true,
                    _ => {
                        return Err(syn::Error::new_spanned(
                            &ident,
                            format!("unknown db attribute `{key}`"),
                        ));
                    }
                }
            }

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }

        Ok(Self {
            column,
            tags,
            skip,
            unmarshal,
            raw,
        })
    }
}

/// `json = "userName", zdb = "user_name"`
fn parse_tag_list(input: syn::parse::ParseStream) -> Result<Vec<(String, String)>> {
    let pairs = input.parse_terminated(
        |input| {
            let name: syn::Ident = input.parse()?;
            let _: syn::Token![=] = input.parse()?;
            let value: syn::LitStr = input.parse()?;
            Ok((name.to_string(), value.value()))
        },
        syn::Token![,],
    )?;
    Ok(pairs.into_iter().collect())
}

pub(super) fn get_field_attrs(field: &syn::Field) -> Result<FieldAttrs> {
    let mut column: Option<String> = None;
    let mut extra: Vec<(String, String)> = Vec::new();
    let mut skip = false;
    let mut unmarshal = false;
    let mut raw = false;

    for attr in &field.attrs {
        if !attr.path().is_ident("db") {
            continue;
        }
        let list: FieldAttrList = attr.parse_args()?;
        if list.column.is_some() {
            column = list.column;
        }
        extra.extend(list.tags);
        skip |= list.skip;
        unmarshal |= list.unmarshal;
        raw |= list.raw;
    }

    let mode = match (unmarshal, raw) {
        (true, true) => {
            return Err(syn::Error::new(
                Span::call_site(),
                "`unmarshal` and `raw` cannot be combined on one field",
            ));
        }
        (true, false) => BindMode::Unmarshal,
        (false, true) => BindMode::Raw,
        (false, false) => BindMode::Convert,
    };

    // `column` is shorthand for the `db` tag and takes precedence over `tag(db = ...)`.
    let mut tags = Vec::with_capacity(extra.len() + 1);
    if let Some(column) = column {
        tags.push(("db".to_string(), column));
    }
    tags.extend(extra);

    Ok(FieldAttrs { tags, skip, mode })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn parses_column_and_tags() {
        let field: syn::Field = parse_quote! {
            #[db(column = "username,omitempty", tag(json = "userName", zdb = "user"))]
            pub name: String
        };
        let attrs = get_field_attrs(&field).unwrap();
        assert_eq!(
            attrs.tags,
            vec![
                ("db".to_string(), "username,omitempty".to_string()),
                ("json".to_string(), "userName".to_string()),
                ("zdb".to_string(), "user".to_string()),
            ]
        );
        assert_eq!(attrs.mode, BindMode::Convert);
        assert!(!attrs.skip);
    }

    #[test]
    fn parses_flags_across_attributes() {
        let field: syn::Field = parse_quote! {
            #[db(skip)]
            #[db(unmarshal)]
            pub tags: Tags
        };
        let attrs = get_field_attrs(&field).unwrap();
        assert!(attrs.skip);
        assert_eq!(attrs.mode, BindMode::Unmarshal);
    }

    #[test]
    fn rejects_unknown_keys() {
        let field: syn::Field = parse_quote! {
            #[db(primary_key)]
            pub id: i64
        };
        assert!(get_field_attrs(&field).is_err());
    }

    #[test]
    fn rejects_unmarshal_with_raw() {
        let field: syn::Field = parse_quote! {
            #[db(unmarshal, raw)]
            pub data: Value
        };
        assert!(get_field_attrs(&field).is_err());
    }

    #[test]
    fn ignores_foreign_attributes() {
        let field: syn::Field = parse_quote! {
            #[serde(rename = "x")]
            pub x: i32
        };
        let attrs = get_field_attrs(&field).unwrap();
        assert!(attrs.tags.is_empty());
    }
}
