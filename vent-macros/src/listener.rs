use crate::utils::{
    AttrArg, check_duplicate, expect_bool, expect_str, expect_str_list, lit, parse_attr_args,
    required_value, unknown_key,
};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{
    Attribute, Expr, FnArg, Ident, ImplItem, ImplItemFn, ItemImpl, LitStr, Result, ReturnType,
    Token, Type, parse_macro_input,
};

/// #[listener] 宏实现
/// - 作用于固有 impl 块，支持 `#[listener(key = "...")]`
/// - 扫描方法上的 `#[subscribe]`/`#[disabled]`/`#[extend]` 并移除这些属性
/// - 生成 `::vent::link::Listener` 实现，`discover` 中逐个登记处理器与扩展器
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as ListenerAttrConfig);
    let mut item_impl = parse_macro_input!(item as ItemImpl);

    match expand_inner(cfg, &mut item_impl) {
        Ok(listener_impl) => TokenStream::from(quote! {
            #item_impl

            #listener_impl
        }),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_inner(cfg: ListenerAttrConfig, item_impl: &mut ItemImpl) -> Result<TokenStream2> {
    if let Some((_, path, _)) = &item_impl.trait_ {
        return Err(syn::Error::new(
            path.span(),
            "#[listener] can only be used on inherent impl blocks",
        ));
    }

    let mut registrations = Vec::new();
    for item in item_impl.items.iter_mut() {
        let ImplItem::Fn(method) = item else {
            continue;
        };
        let markers = take_markers(method)?;
        if let Some(tokens) = registration(method, markers)? {
            registrations.push(tokens);
        }
    }

    let self_ty = &item_impl.self_ty;
    let (impl_generics, _, where_clause) = item_impl.generics.split_for_impl();
    let key_fn = cfg.key.map(|key| {
        quote! {
            fn key(&self) -> ::std::option::Option<&str> {
                ::std::option::Option::Some(#key)
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::vent::link::Listener for #self_ty #where_clause {
            #key_fn

            fn discover(self: ::std::sync::Arc<Self>) -> ::vent::link::Discovery {
                #[allow(unused_mut)]
                let mut discovery = ::vent::link::Discovery::new();
                #( #registrations )*
                discovery
            }
        }
    })
}

struct SubscribeConfig {
    priority: Ident,
    process_cancelled: bool,
    result_processors: Vec<LitStr>,
}

struct ExtendConfig {
    identifier: LitStr,
    result_processors: Vec<LitStr>,
}

#[derive(Default)]
struct Markers {
    subscribe: Option<SubscribeConfig>,
    disabled: Option<LitStr>,
    extend: Option<ExtendConfig>,
}

// 取出方法上的标记属性，其余属性原样保留
fn take_markers(method: &mut ImplItemFn) -> Result<Markers> {
    let mut markers = Markers::default();
    let mut retained: Vec<Attribute> = Vec::new();

    for attr in method.attrs.drain(..) {
        if attr.path().is_ident("subscribe") {
            if markers.subscribe.is_some() {
                return Err(syn::Error::new(attr.span(), "duplicate #[subscribe]"));
            }
            markers.subscribe = Some(parse_subscribe(&attr)?);
        } else if attr.path().is_ident("disabled") {
            if markers.disabled.is_some() {
                return Err(syn::Error::new(attr.span(), "duplicate #[disabled]"));
            }
            markers.disabled = Some(parse_disabled(&attr)?);
        } else if attr.path().is_ident("extend") {
            if markers.extend.is_some() {
                return Err(syn::Error::new(attr.span(), "duplicate #[extend]"));
            }
            markers.extend = Some(parse_extend(&attr)?);
        } else {
            retained.push(attr);
        }
    }

    method.attrs = retained;
    Ok(markers)
}

fn registration(method: &ImplItemFn, markers: Markers) -> Result<Option<TokenStream2>> {
    let Markers {
        subscribe,
        disabled,
        extend,
    } = markers;

    let name = &method.sig.ident;
    let name_lit = lit(&name.to_string(), name.span());

    if let Some(ext) = extend {
        if subscribe.is_some() || disabled.is_some() {
            return Err(syn::Error::new(
                name.span(),
                "#[extend] cannot be combined with #[subscribe] or #[disabled]",
            ));
        }
        let (payload, mutable) = single_ref_param(method)?;
        if mutable {
            return Err(syn::Error::new(
                payload.span(),
                "#[extend] methods must take the payload by shared reference",
            ));
        }
        let ExtendConfig {
            identifier,
            result_processors,
        } = ext;
        let register = if returns_result(&method.sig.output) {
            quote!(fallible_extender::<#payload, _, _, _>)
        } else {
            quote!(extender::<#payload, _, _>)
        };
        return Ok(Some(quote! {
            {
                let this = ::std::sync::Arc::clone(&self);
                discovery.#register(
                    #name_lit,
                    #identifier,
                    &[#( #result_processors ),*],
                    move |value: &#payload| this.#name(value),
                );
            }
        }));
    }

    if subscribe.is_none() && disabled.is_none() {
        return Ok(None);
    }

    let (event, _) = single_ref_param(method)?;
    let SubscribeConfig {
        priority,
        process_cancelled,
        result_processors,
    } = subscribe.unwrap_or_else(|| SubscribeConfig {
        priority: Ident::new("Medium", name.span()),
        process_cancelled: false,
        result_processors: Vec::new(),
    });

    if let Some(until) = disabled {
        return Ok(Some(quote! {
            discovery.disabled::<#event>(
                #name_lit,
                ::vent::priority::Priority::#priority,
                #until,
            );
        }));
    }

    let register = if returns_result(&method.sig.output) {
        quote!(fallible_handler::<#event, _, _, _>)
    } else {
        quote!(handler::<#event, _, _>)
    };
    Ok(Some(quote! {
        {
            let this = ::std::sync::Arc::clone(&self);
            discovery.#register(
                #name_lit,
                ::vent::priority::Priority::#priority,
                #process_cancelled,
                &[#( #result_processors ),*],
                move |event: &mut #event| this.#name(event),
            );
        }
    }))
}

// 校验签名为 `&self` + 单个引用参数，返回被引用的类型与是否可变
fn single_ref_param(method: &ImplItemFn) -> Result<(Type, bool)> {
    let sig = &method.sig;
    let mut inputs = sig.inputs.iter();

    match inputs.next() {
        Some(FnArg::Receiver(r)) if r.reference.is_some() && r.mutability.is_none() => {}
        _ => {
            return Err(syn::Error::new(
                sig.span(),
                "listener methods must take `&self` as receiver",
            ));
        }
    }

    let param = match (inputs.next(), inputs.next()) {
        (Some(FnArg::Typed(param)), None) => param,
        _ => {
            return Err(syn::Error::new(
                sig.inputs.span(),
                "listener methods must take exactly one parameter besides `&self`",
            ));
        }
    };

    match &*param.ty {
        Type::Reference(r) => Ok(((*r.elem).clone(), r.mutability.is_some())),
        other => Err(syn::Error::new(
            other.span(),
            "listener method parameter must be a reference, e.g. `&mut MyEvent`",
        )),
    }
}

fn returns_result(output: &ReturnType) -> bool {
    match output {
        ReturnType::Default => false,
        ReturnType::Type(_, ty) => match &**ty {
            Type::Path(p) => p
                .path
                .segments
                .last()
                .map(|s| s.ident == "Result")
                .unwrap_or(false),
            _ => false,
        },
    }
}

const PRIORITIES: [&str; 5] = ["Low", "Medium", "High", "Highest", "ReadOnly"];

fn parse_subscribe(attr: &Attribute) -> Result<SubscribeConfig> {
    let mut cfg = SubscribeConfig {
        priority: Ident::new("Medium", attr.span()),
        process_cancelled: false,
        result_processors: Vec::new(),
    };
    let mut seen = Vec::new();

    for arg in parse_attr_args(attr)? {
        check_duplicate(&mut seen, &arg.key)?;
        match arg.key.to_string().as_str() {
            "priority" => cfg.priority = parse_priority(required_value(&arg)?)?,
            "process_cancelled" => cfg.process_cancelled = expect_bool(&arg)?,
            "result_processors" => {
                cfg.result_processors =
                    expect_str_list(required_value(&arg)?, "result_processors")?
            }
            _ => {
                return Err(unknown_key(
                    &arg.key,
                    "'priority' | 'process_cancelled' | 'result_processors'",
                ));
            }
        }
    }
    Ok(cfg)
}

fn parse_priority(expr: &Expr) -> Result<Ident> {
    let ident = match expr {
        Expr::Path(p) => p.path.segments.last().map(|s| s.ident.clone()),
        _ => None,
    };
    match ident {
        Some(ident) if PRIORITIES.iter().any(|p| ident == p) => Ok(ident),
        _ => Err(syn::Error::new(
            expr.span(),
            "expected one of Low | Medium | High | Highest | ReadOnly",
        )),
    }
}

fn parse_disabled(attr: &Attribute) -> Result<LitStr> {
    let mut until = lit("", attr.span());
    let mut seen = Vec::new();
    for arg in parse_attr_args(attr)? {
        check_duplicate(&mut seen, &arg.key)?;
        match arg.key.to_string().as_str() {
            "until" => until = expect_str(required_value(&arg)?, "until")?,
            _ => return Err(unknown_key(&arg.key, "'until'")),
        }
    }
    Ok(until)
}

fn parse_extend(attr: &Attribute) -> Result<ExtendConfig> {
    let mut identifier: Option<LitStr> = None;
    let mut result_processors = Vec::new();
    let mut seen = Vec::new();

    for arg in parse_attr_args(attr)? {
        check_duplicate(&mut seen, &arg.key)?;
        match arg.key.to_string().as_str() {
            "identifier" => identifier = Some(expect_str(required_value(&arg)?, "identifier")?),
            "result_processors" => {
                result_processors = expect_str_list(required_value(&arg)?, "result_processors")?
            }
            _ => return Err(unknown_key(&arg.key, "'identifier' | 'result_processors'")),
        }
    }

    let identifier = identifier.ok_or_else(|| {
        syn::Error::new(attr.span(), "#[extend] requires identifier = \"...\"")
    })?;
    Ok(ExtendConfig {
        identifier,
        result_processors,
    })
}

// impl 块级配置：key = "..."
struct ListenerAttrConfig {
    key: Option<LitStr>,
}

impl Parse for ListenerAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut key: Option<LitStr> = None;
        if input.is_empty() {
            return Ok(Self { key });
        }

        let args: Punctuated<AttrArg, Token![,]> =
            Punctuated::<AttrArg, Token![,]>::parse_terminated(input)?;
        for arg in args {
            match arg.key.to_string().as_str() {
                "key" => {
                    if key.is_some() {
                        return Err(syn::Error::new(
                            arg.key.span(),
                            "duplicate key 'key' in attribute",
                        ));
                    }
                    key = Some(expect_str(required_value(&arg)?, "key")?);
                }
                _ => return Err(unknown_key(&arg.key, "'key'")),
            }
        }
        Ok(Self { key })
    }
}
