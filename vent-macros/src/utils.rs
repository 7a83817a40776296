use proc_macro2::Span;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Attribute, Expr, Ident, LitStr, Meta, Result, Token};

/// 属性参数：`key = value` 或单独的 `key`（布尔开关）
pub(crate) struct AttrArg {
    pub key: Ident,
    pub value: Option<Expr>,
}

impl Parse for AttrArg {
    fn parse(input: ParseStream) -> Result<Self> {
        let key: Ident = input.parse()?;
        let value = if input.peek(Token![=]) {
            let _eq: Token![=] = input.parse()?;
            Some(input.parse()?)
        } else {
            None
        };
        Ok(Self { key, value })
    }
}

/// 解析 `#[name(...)]` 的参数列表；`#[name]` 视为空列表
pub(crate) fn parse_attr_args(attr: &Attribute) -> Result<Vec<AttrArg>> {
    match &attr.meta {
        Meta::Path(_) => Ok(Vec::new()),
        Meta::List(_) => Ok(attr
            .parse_args_with(Punctuated::<AttrArg, Token![,]>::parse_terminated)?
            .into_iter()
            .collect()),
        Meta::NameValue(nv) => Err(syn::Error::new(
            nv.span(),
            "expected #[name] or #[name(key = value, ...)]",
        )),
    }
}

// 拒绝同一属性内重复出现的 key
pub(crate) fn check_duplicate(seen: &mut Vec<String>, key: &Ident) -> Result<()> {
    let name = key.to_string();
    if seen.contains(&name) {
        return Err(syn::Error::new(
            key.span(),
            format!("duplicate key '{name}' in attribute"),
        ));
    }
    seen.push(name);
    Ok(())
}

pub(crate) fn required_value(arg: &AttrArg) -> Result<&Expr> {
    arg.value.as_ref().ok_or_else(|| {
        syn::Error::new(
            arg.key.span(),
            format!("expected a value for '{}'", arg.key),
        )
    })
}

pub(crate) fn expect_str(expr: &Expr, key: &str) -> Result<LitStr> {
    match expr {
        Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Str(lit),
            ..
        }) => Ok(lit.clone()),
        other => Err(syn::Error::new(
            other.span(),
            format!("expected string literal for '{key}'"),
        )),
    }
}

pub(crate) fn expect_bool(arg: &AttrArg) -> Result<bool> {
    match &arg.value {
        None => Ok(true),
        Some(Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Bool(lit),
            ..
        })) => Ok(lit.value),
        Some(other) => Err(syn::Error::new(
            other.span(),
            format!("expected boolean literal for '{}'", arg.key),
        )),
    }
}

/// `["a", "b"]` 或单个 `"a"`
pub(crate) fn expect_str_list(expr: &Expr, key: &str) -> Result<Vec<LitStr>> {
    match expr {
        Expr::Array(array) => array.elems.iter().map(|e| expect_str(e, key)).collect(),
        other => Ok(vec![expect_str(other, key)?]),
    }
}

pub(crate) fn unknown_key(key: &Ident, expected: &str) -> syn::Error {
    syn::Error::new(key.span(), format!("unknown key; expected {expected}"))
}

pub(crate) fn lit(value: &str, span: Span) -> LitStr {
    LitStr::new(value, span)
}
