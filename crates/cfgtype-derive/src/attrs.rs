//! `#[config(...)]` attribute parsing.

use convert_case::{Case, Casing};
use proc_macro2::Span;
use syn::spanned::Spanned;
use syn::{Attribute, Expr, ExprLit, Lit, Meta};

#[derive(Default)]
pub struct ContainerAttrs {
    pub description: Option<String>,
    pub rename_all: Option<RenameRule>,
    pub resource: bool,
    pub discriminator: Option<String>,
}

#[derive(Default)]
pub struct FieldAttrs {
    pub alias: Option<String>,
    pub default: Option<FieldDefaultAttr>,
    pub description: Option<String>,
    pub resource: bool,
    pub skip: bool,
    pub extra: bool,
    pub meta: Vec<(String, String)>,
}

pub enum FieldDefaultAttr {
    /// `#[config(default)]`: the field type's `Default`.
    TypeDefault,
    /// `#[config(default = expr)]`.
    Expr(Box<Expr>),
}

#[derive(Default)]
pub struct VariantAttrs {
    pub rename: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone, Copy)]
pub enum RenameRule {
    Camel,
    Snake,
    Pascal,
    Kebab,
    ScreamingSnake,
    Lower,
    Upper,
}

impl RenameRule {
    pub fn apply(self, name: &str) -> String {
        let case = match self {
            RenameRule::Camel => Case::Camel,
            RenameRule::Snake => Case::Snake,
            RenameRule::Pascal => Case::Pascal,
            RenameRule::Kebab => Case::Kebab,
            RenameRule::ScreamingSnake => Case::UpperSnake,
            RenameRule::Lower => Case::Flat,
            RenameRule::Upper => Case::UpperFlat,
        };
        name.to_case(case)
    }
}

const UNSUPPORTED_CONFIG_ATTR_HINT: &str =
    "unsupported #[config(...)] attribute; hint: check the attribute list on `derive(Config)`";

pub fn parse_container_attrs(attrs: &[Attribute]) -> syn::Result<ContainerAttrs> {
    let mut out = ContainerAttrs::default();
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("config")) {
        for meta in parse_meta_list(attr)? {
            match meta {
                Meta::NameValue(meta) if meta.path.is_ident("description") => {
                    out.description = Some(parse_string_expr(&meta.value, meta.span())?);
                }
                Meta::NameValue(meta) if meta.path.is_ident("rename_all") => {
                    out.rename_all = Some(parse_rename_rule(&meta.value, meta.span())?);
                }
                Meta::NameValue(meta) if meta.path.is_ident("discriminator") => {
                    out.discriminator = Some(parse_string_expr(&meta.value, meta.span())?);
                }
                Meta::Path(path) if path.is_ident("resource") => {
                    out.resource = true;
                }
                _ => return Err(syn::Error::new_spanned(meta, UNSUPPORTED_CONFIG_ATTR_HINT)),
            }
        }
    }
    Ok(out)
}

pub fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut out = FieldAttrs::default();
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("config")) {
        for meta in parse_meta_list(attr)? {
            match meta {
                Meta::NameValue(meta) if meta.path.is_ident("alias") => {
                    out.alias = Some(parse_string_expr(&meta.value, meta.span())?);
                }
                Meta::NameValue(meta) if meta.path.is_ident("default") => {
                    out.default = Some(FieldDefaultAttr::Expr(Box::new(meta.value)));
                }
                Meta::Path(path) if path.is_ident("default") => {
                    out.default = Some(FieldDefaultAttr::TypeDefault);
                }
                Meta::NameValue(meta) if meta.path.is_ident("description") => {
                    out.description = Some(parse_string_expr(&meta.value, meta.span())?);
                }
                Meta::Path(path) if path.is_ident("resource") => {
                    out.resource = true;
                }
                Meta::Path(path) if path.is_ident("skip") => {
                    out.skip = true;
                }
                Meta::Path(path) if path.is_ident("extra") => {
                    out.extra = true;
                }
                Meta::List(list) if list.path.is_ident("meta") => {
                    for item in list.parse_args_with(
                        syn::punctuated::Punctuated::<Meta, syn::Token![,]>::parse_terminated,
                    )? {
                        let Meta::NameValue(pair) = item else {
                            return Err(syn::Error::new_spanned(
                                item,
                                "expected key = \"value\" inside meta(...)",
                            ));
                        };
                        let Some(key) = pair.path.get_ident() else {
                            return Err(syn::Error::new_spanned(
                                &pair.path,
                                "meta keys must be plain identifiers",
                            ));
                        };
                        let value = parse_string_expr(&pair.value, pair.span())?;
                        out.meta.push((key.to_string(), value));
                    }
                }
                _ => return Err(syn::Error::new_spanned(meta, UNSUPPORTED_CONFIG_ATTR_HINT)),
            }
        }
    }
    Ok(out)
}

pub fn parse_variant_attrs(attrs: &[Attribute]) -> syn::Result<VariantAttrs> {
    let mut out = VariantAttrs::default();
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("config")) {
        for meta in parse_meta_list(attr)? {
            match meta {
                Meta::NameValue(meta) if meta.path.is_ident("rename") => {
                    out.rename = Some(parse_string_expr(&meta.value, meta.span())?);
                }
                Meta::NameValue(meta) if meta.path.is_ident("description") => {
                    out.description = Some(parse_string_expr(&meta.value, meta.span())?);
                }
                _ => return Err(syn::Error::new_spanned(meta, UNSUPPORTED_CONFIG_ATTR_HINT)),
            }
        }
    }
    Ok(out)
}

/// Doc comment text, one leading space stripped per line.
pub fn doc_comment(attrs: &[Attribute]) -> Option<String> {
    let lines = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(meta) => match &meta.value {
                Expr::Lit(ExprLit {
                    lit: Lit::Str(value),
                    ..
                }) => Some(value.value()),
                _ => None,
            },
            _ => None,
        })
        .map(|line| line.strip_prefix(' ').map(str::to_string).unwrap_or(line))
        .collect::<Vec<_>>();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

fn parse_meta_list(attr: &Attribute) -> syn::Result<Vec<Meta>> {
    let metas = attr
        .parse_args_with(syn::punctuated::Punctuated::<Meta, syn::Token![,]>::parse_terminated)?;
    Ok(metas.into_iter().collect())
}

fn parse_string_expr(expr: &Expr, span: Span) -> syn::Result<String> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Str(value),
            ..
        }) => Ok(value.value()),
        _ => Err(syn::Error::new(
            span,
            "expected string literal; hint: wrap the value in quotes",
        )),
    }
}

fn parse_rename_rule(expr: &Expr, span: Span) -> syn::Result<RenameRule> {
    let value = parse_string_expr(expr, span)?;
    match value.as_str() {
        "camelCase" => Ok(RenameRule::Camel),
        "snake_case" => Ok(RenameRule::Snake),
        "PascalCase" => Ok(RenameRule::Pascal),
        "kebab-case" => Ok(RenameRule::Kebab),
        "SCREAMING_SNAKE_CASE" => Ok(RenameRule::ScreamingSnake),
        "lowercase" => Ok(RenameRule::Lower),
        "UPPERCASE" => Ok(RenameRule::Upper),
        _ => Err(syn::Error::new(span, "unsupported rename_all value")),
    }
}
