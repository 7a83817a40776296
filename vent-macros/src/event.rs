use crate::utils::parse_attr_args;
use proc_macro::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Fields, Member, parse_macro_input};

enum Anchor {
    Header,
    Parent,
}

/// #[derive(Event)] 实现
/// - 仅支持结构体；恰好一个字段标注 `#[event(header)]` 或 `#[event(parent)]`
/// - header：根事件，直接持有 `EventHeader`
/// - parent：子事件，组合父事件并把 header 委托给父事件，同时暴露 `parent`
pub(crate) fn expand(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_inner(&input) {
        Ok(ts) => ts.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_inner(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let fields = match &input.data {
        Data::Struct(s) => &s.fields,
        _ => {
            return Err(syn::Error::new(
                input.ident.span(),
                "#[derive(Event)] can only be used on structs",
            ));
        }
    };

    let mut anchor: Option<(Member, Anchor)> = None;
    for (index, field) in fields.iter().enumerate() {
        for attr in field.attrs.iter().filter(|a| a.path().is_ident("event")) {
            let args = parse_attr_args(attr)?;
            let [arg] = args.as_slice() else {
                return Err(syn::Error::new(
                    attr.span(),
                    "expected #[event(header)] or #[event(parent)]",
                ));
            };
            let kind = match arg.key.to_string().as_str() {
                "header" => Anchor::Header,
                "parent" => Anchor::Parent,
                _ => {
                    return Err(syn::Error::new(
                        arg.key.span(),
                        "unknown key; expected 'header' | 'parent'",
                    ));
                }
            };
            if anchor.is_some() {
                return Err(syn::Error::new(
                    field.span(),
                    "only one field may be marked #[event(header)] or #[event(parent)]",
                ));
            }
            let member = match &field.ident {
                Some(ident) => Member::Named(ident.clone()),
                None => Member::Unnamed(index.into()),
            };
            anchor = Some((member, kind));
        }
    }

    let Some((member, kind)) = anchor else {
        let span = match fields {
            Fields::Unit => input.ident.span(),
            other => other.span(),
        };
        return Err(syn::Error::new(
            span,
            "missing #[event(header)] or #[event(parent)] field",
        ));
    };

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let body = match kind {
        Anchor::Header => quote! {
            fn header(&self) -> &::vent::event::EventHeader {
                &self.#member
            }

            fn header_mut(&mut self) -> &mut ::vent::event::EventHeader {
                &mut self.#member
            }
        },
        Anchor::Parent => quote! {
            fn header(&self) -> &::vent::event::EventHeader {
                ::vent::event::Event::header(&self.#member)
            }

            fn header_mut(&mut self) -> &mut ::vent::event::EventHeader {
                ::vent::event::Event::header_mut(&mut self.#member)
            }

            fn parent(&self) -> ::std::option::Option<&dyn ::vent::event::Event> {
                ::std::option::Option::Some(&self.#member)
            }

            fn parent_mut(&mut self) -> ::std::option::Option<&mut dyn ::vent::event::Event> {
                ::std::option::Option::Some(&mut self.#member)
            }
        },
    };

    Ok(quote! {
        impl #impl_generics ::vent::event::Event for #ident #ty_generics #where_clause {
            #body
        }
    })
}
