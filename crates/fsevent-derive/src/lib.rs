use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{parse_macro_input, parse_quote, Data, DeriveInput, Fields, LitStr, Visibility};

/// Derives `fsevent::Decode` and `fsevent::Record` for a struct with named
/// fields.
///
/// Usage:
/// ```ignore
/// #[derive(Default, Decode)]
/// pub struct Order {
///     #[fsevent(tag = "createdAt,serverTimestamp")]
///     pub created_at: Option<DateTime<Utc>>,
///     pub total: f64,
///     #[fsevent(skip)]
///     pub cached: i64,
/// }
/// ```
#[proc_macro_derive(Decode, attributes(fsevent))]
pub fn derive_decode(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

struct FieldInfo {
    member: syn::Ident,
    name: String,
    tag: String,
    exported: bool,
}

fn expand(mut input: DeriveInput) -> syn::Result<TokenStream2> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named
                .named
                .iter()
                .map(field_info)
                .collect::<syn::Result<Vec<_>>>()?,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "Decode can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Decode can only be derived for structs",
            ))
        }
    };

    for param in input.generics.type_params_mut() {
        param.bounds.push(parse_quote!(::fsevent::Decode));
    }
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let count = fields.len();
    let specs = fields.iter().map(|f| {
        let (name, tag, exported) = (&f.name, &f.tag, f.exported);
        quote! {
            ::fsevent::FieldSpec { name: #name, tag: #tag, exported: #exported }
        }
    });
    let arms = fields
        .iter()
        .enumerate()
        .filter(|(_, f)| f.exported && f.tag != "-")
        .map(|(index, f)| {
            let member = &f.member;
            quote! { #index => ::fsevent::Decode::target(&mut self.#member), }
        });

    Ok(quote! {
        impl #impl_generics ::fsevent::Record for #ident #ty_generics #where_clause {
            fn fields(&self) -> &'static [::fsevent::FieldSpec] {
                static FIELDS: [::fsevent::FieldSpec; #count] = [#(#specs),*];
                &FIELDS
            }

            fn field(&mut self, index: usize) -> ::fsevent::Target<'_> {
                match index {
                    #(#arms)*
                    _ => ::fsevent::Target::Unsupported("private field"),
                }
            }
        }

        impl #impl_generics ::fsevent::Decode for #ident #ty_generics #where_clause {
            fn target(&mut self) -> ::fsevent::Target<'_> {
                ::fsevent::Target::Record(self)
            }
        }
    })
}

fn field_info(field: &syn::Field) -> syn::Result<FieldInfo> {
    let Some(member) = field.ident.clone() else {
        return Err(syn::Error::new_spanned(field, "expected a named field"));
    };
    let name = member.unraw().to_string();
    let mut tag = None;
    let mut skip = false;

    for attr in field.attrs.iter().filter(|a| a.path().is_ident("fsevent")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("tag") {
                let value: LitStr = meta.value()?.parse()?;
                tag = Some(value.value());
                Ok(())
            } else if meta.path.is_ident("skip") {
                skip = true;
                Ok(())
            } else {
                Err(meta.error("expected `tag = \"...\"` or `skip`"))
            }
        })?;
    }

    let tag = if skip {
        "-".to_owned()
    } else {
        tag.unwrap_or_else(|| name.clone())
    };
    Ok(FieldInfo {
        member,
        name,
        tag,
        exported: matches!(field.vis, Visibility::Public(_)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expanded(input: DeriveInput) -> String {
        expand(input).unwrap().to_string()
    }

    #[test]
    fn tags_default_to_field_name() {
        let out = expanded(parse_quote! {
            pub struct Doc {
                #[fsevent(tag = "timeP,serverTimestamp")]
                pub time_p: Option<i64>,
                pub r#ref: String,
                #[fsevent(skip)]
                pub cached: i64,
                unex: i64,
            }
        });
        assert!(out.contains("tag : \"timeP,serverTimestamp\""), "{out}");
        assert!(out.contains("name : \"ref\" , tag : \"ref\""), "{out}");
        assert!(out.contains("tag : \"-\""), "{out}");
        assert!(out.contains("name : \"unex\" , tag : \"unex\" , exported : false"), "{out}");
        assert!(out.contains("0usize =>"), "{out}");
        assert!(out.contains("1usize =>"), "{out}");
        assert!(!out.contains("2usize =>"), "{out}");
        assert!(!out.contains("3usize =>"), "{out}");
    }

    #[test]
    fn generic_params_get_decode_bound() {
        let out = expanded(parse_quote! {
            pub struct Wrapper<T> {
                pub inner: T,
            }
        });
        assert!(out.contains("T : :: fsevent :: Decode"), "{out}");
    }

    #[test]
    fn rejects_non_named_structs() {
        let tuple: DeriveInput = parse_quote! { pub struct Pair(pub i64, pub i64); };
        assert!(expand(tuple).is_err());
        let enumeration: DeriveInput = parse_quote! { pub enum E { A } };
        assert!(expand(enumeration).is_err());
    }

    #[test]
    fn rejects_unknown_attribute() {
        let input: DeriveInput = parse_quote! {
            pub struct Doc {
                #[fsevent(rename = "x")]
                pub a: i64,
            }
        };
        let err = expand(input).err().map(|e| e.to_string()).unwrap_or_default();
        assert!(err.contains("expected `tag"), "{err}");
    }
}
