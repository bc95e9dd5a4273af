mod attrs;

use proc_macro::TokenStream;
use proc_macro_crate::{FoundCrate, crate_name};
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::{Data, DataEnum, DeriveInput, Field, Fields, Ident, Path, Type, parse_macro_input};

use crate::attrs::{
    ContainerAttrs, FieldAttrs, FieldDefaultAttr, doc_comment, parse_container_attrs,
    parse_field_attrs, parse_variant_attrs,
};

const INTERNAL_MARKER: &str = "__internal__";

/// Derive a config type.
///
/// Named structs become [`ConfigType`]s with a static field-descriptor table.
/// Enums of unit variants become enum-like values rendered by name. Enums of
/// single-field tuple variants with `#[config(discriminator = "...")]` become
/// discriminated unions.
///
/// Container attributes: `description`, `rename_all`, `resource`,
/// `discriminator`. Field attributes: `alias`, `default`, `default = expr`,
/// `description`, `resource`, `skip`, `extra`, `meta(key = "value", ...)`.
/// Variant attributes: `rename`, `description`.
///
/// [`ConfigType`]: https://docs.rs/cfgtype/latest/cfgtype/trait.ConfigType.html
#[proc_macro_derive(Config, attributes(config))]
pub fn derive_config(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.into_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "generic config types are not supported; hint: derive Config on a concrete type",
        ));
    }

    let runtime = resolve_runtime_crate()?;
    let container = parse_container_attrs(&input.attrs)?;

    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => {
                expand_struct(input, &container, fields.named.iter().collect(), &runtime)
            }
            Fields::Unit => Err(syn::Error::new_spanned(
                &input.ident,
                "unit structs are not supported for Config; hint: use a named-field struct",
            )),
            Fields::Unnamed(_) => Err(syn::Error::new_spanned(
                &input.ident,
                "tuple structs are not supported for Config; hint: use a named-field struct",
            )),
        },
        Data::Enum(data) => match &container.discriminator {
            Some(discriminator) => expand_union(input, &container, data, discriminator, &runtime),
            None => expand_enum(input, &container, data, &runtime),
        },
        Data::Union(union) => Err(syn::Error::new(
            union.union_token.span,
            "Config does not support `union` items; hint: use a struct or enum instead",
        )),
    }
}

fn resolve_runtime_crate() -> syn::Result<Path> {
    match crate_name("cfgtype") {
        // The runtime declares `extern crate self as cfgtype`.
        Ok(FoundCrate::Itself) => Ok(syn::parse_quote!(::cfgtype)),
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name.replace('-', "_"), Span::call_site());
            Ok(syn::parse_quote!(::#ident))
        }
        Err(_) => Err(syn::Error::new(
            Span::call_site(),
            "could not resolve the cfgtype runtime crate; expected a dependency on `cfgtype`",
        )),
    }
}

struct DeclaredField<'a> {
    ident: &'a Ident,
    ty: &'a Type,
    attrs: FieldAttrs,
    key: Option<String>,
    description: Option<String>,
}

enum FieldRole<'a> {
    Declared(DeclaredField<'a>),
    Extra(&'a Ident),
    Skipped(&'a Ident),
}

fn classify_field<'a>(field: &'a Field, container: &ContainerAttrs) -> syn::Result<FieldRole<'a>> {
    let Some(ident) = field.ident.as_ref() else {
        return Err(syn::Error::new_spanned(field, "expected a named field"));
    };
    let attrs = parse_field_attrs(&field.attrs)?;
    let name = ident.unraw().to_string();

    if attrs.skip || name.ends_with(INTERNAL_MARKER) {
        return Ok(FieldRole::Skipped(ident));
    }
    if attrs.extra {
        return Ok(FieldRole::Extra(ident));
    }

    let key = match (&attrs.alias, container.rename_all) {
        (Some(alias), _) => Some(alias.clone()),
        (None, Some(rule)) => Some(rule.apply(&name)).filter(|renamed| *renamed != name),
        (None, None) => None,
    };
    let description = attrs
        .description
        .clone()
        .or_else(|| doc_comment(&field.attrs));

    Ok(FieldRole::Declared(DeclaredField {
        ident,
        ty: &field.ty,
        attrs,
        key,
        description,
    }))
}

fn expand_struct(
    input: &DeriveInput,
    container: &ContainerAttrs,
    fields: Vec<&Field>,
    runtime: &Path,
) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let name_str = name.unraw().to_string();

    let mut declared = Vec::new();
    let mut extra = None;
    let mut skipped = Vec::new();
    for field in &fields {
        match classify_field(field, container)? {
            FieldRole::Declared(field) => declared.push(field),
            FieldRole::Extra(ident) => {
                if extra.replace(ident).is_some() {
                    return Err(syn::Error::new_spanned(
                        ident,
                        "only one #[config(extra)] field is allowed",
                    ));
                }
            }
            FieldRole::Skipped(ident) => skipped.push(ident),
        }
    }

    let description = option_str(
        container
            .description
            .clone()
            .or_else(|| doc_comment(&input.attrs)),
    );
    let permissive = extra.is_some();
    let is_resource = container.resource;
    let kind = if is_resource {
        quote!(#runtime::ConfigKind::Resource)
    } else {
        quote!(#runtime::ConfigKind::Config)
    };

    let mut default_fns = Vec::new();
    let mut descriptors = Vec::new();
    for field in &declared {
        let ident = field.ident;
        let ty = field.ty;
        let field_name = ident.unraw().to_string();
        let alias = option_str(field.key.clone());
        let type_name = type_label(ty);
        let field_description = option_str(field.description.clone());
        let has_default = field.attrs.default.is_some();
        let field_resource = field.attrs.resource;

        let default = match &field.attrs.default {
            Some(default) => {
                let fn_ident = format_ident!("__cfgtype_default_{}", ident);
                let value = match default {
                    FieldDefaultAttr::TypeDefault => {
                        quote!(<#ty as ::core::default::Default>::default())
                    }
                    FieldDefaultAttr::Expr(expr) => quote!(#expr),
                };
                default_fns.push(quote! {
                    fn #fn_ident() -> #runtime::FieldDefault {
                        #runtime::IntoFieldDefault::into_field_default(#value)
                    }
                });
                quote!(::core::option::Option::Some(#fn_ident as fn() -> #runtime::FieldDefault))
            }
            None => quote!(::core::option::Option::None),
        };

        let meta = field.attrs.meta.iter().map(|(key, value)| quote!((#key, #value)));

        descriptors.push(quote! {
            #runtime::FieldDescriptor {
                name: #field_name,
                alias: #alias,
                type_name: #type_name,
                required: !<#ty as #runtime::ConfigField>::OPTIONAL && !#has_default,
                default: #default,
                discriminator: <#ty as #runtime::ConfigField>::DISCRIMINATOR,
                description: #field_description,
                is_resource: #field_resource || <#ty as #runtime::ConfigField>::IS_RESOURCE,
                config_type: <#ty as #runtime::ConfigField>::config_type,
                meta: &[#(#meta),*],
            }
        });
    }

    let locals = declared
        .iter()
        .map(|field| format_ident!("__field_{}", field.ident))
        .collect::<Vec<_>>();
    let takes = declared.iter().zip(&locals).enumerate().map(|(idx, (field, local))| {
        let ty = field.ty;
        quote! {
            let #local = #runtime::__private::take_field::<#ty>(&mut map, &__FIELDS[#idx])?;
        }
    });
    let declared_idents = declared.iter().map(|field| field.ident).collect::<Vec<_>>();

    let (leftover, extra_init, extra_values) = match extra {
        Some(ident) => (
            quote!(),
            quote!(#ident: map,),
            quote! {
                fn extra_values(&self) -> ::core::option::Option<&#runtime::ConfigMap> {
                    ::core::option::Option::Some(&self.#ident)
                }
            },
        ),
        None => (
            quote!(#runtime::__private::deny_unknown(map)?;),
            quote!(),
            quote!(),
        ),
    };

    let value_inserts = declared.iter().enumerate().map(|(idx, field)| {
        let ident = field.ident;
        quote! {
            map.insert(
                ::std::string::String::from(__FIELDS[#idx].key()),
                #runtime::ConfigField::to_config_value(&self.#ident),
            );
        }
    });
    let restores = declared.iter().enumerate().map(|(idx, field)| {
        let ident = field.ident;
        quote! {
            #runtime::__private::restore_field(&mut self.#ident, raw, &__FIELDS[#idx]);
        }
    });
    let field_count = declared.len();

    Ok(quote! {
        const _: () = {
            #(#default_fns)*

            static __TYPE_INFO: #runtime::TypeInfo = #runtime::TypeInfo {
                name: #name_str,
                description: #description,
                permissive: #permissive,
                kind: #kind,
            };

            static __FIELDS: &[#runtime::FieldDescriptor] = &[#(#descriptors),*];

            impl #runtime::ConfigType for #name {
                fn type_info() -> &'static #runtime::TypeInfo {
                    &__TYPE_INFO
                }

                fn fields() -> &'static [#runtime::FieldDescriptor] {
                    __FIELDS
                }

                #[allow(unused_mut)]
                fn from_config_map(
                    mut map: #runtime::ConfigMap,
                ) -> ::core::result::Result<Self, #runtime::ValidationError> {
                    #(#takes)*
                    #leftover
                    ::core::result::Result::Ok(Self {
                        #(#declared_idents: #locals,)*
                        #extra_init
                        #(#skipped: ::core::default::Default::default(),)*
                    })
                }

                fn field_values(&self) -> #runtime::ConfigMap {
                    let mut map = #runtime::ConfigMap::with_capacity(#field_count);
                    #(#value_inserts)*
                    map
                }

                #extra_values
            }

            impl #runtime::ConfigField for #name {
                const IS_RESOURCE: bool = #is_resource;

                fn config_type() -> ::core::result::Result<#runtime::ConfigTypeNode, #runtime::SchemaError> {
                    #runtime::__private::nested_config_type::<Self>()
                }

                fn from_config_value(
                    value: #runtime::ConfigValue,
                ) -> ::core::result::Result<Self, #runtime::ValidationError> {
                    #runtime::__private::nested_from_config_value::<Self>(value)
                }

                fn to_config_value(&self) -> #runtime::ConfigValue {
                    #runtime::__private::nested_to_config_value(self)
                }

                #[allow(unused_variables)]
                fn restore_markers(&mut self, raw: &#runtime::ConfigValue) {
                    #(#restores)*
                }
            }
        };
    })
}

fn expand_enum(
    input: &DeriveInput,
    container: &ContainerAttrs,
    data: &DataEnum,
    runtime: &Path,
) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let name_str = name.unraw().to_string();

    let mut idents = Vec::new();
    let mut labels = Vec::new();
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "data-carrying variants need a discriminator; hint: add #[config(discriminator = \"...\")] \
                 and use single-field tuple variants",
            ));
        }
        let attrs = parse_variant_attrs(&variant.attrs)?;
        idents.push(&variant.ident);
        labels.push(variant_label(&variant.ident, attrs.rename, container));
    }

    Ok(quote! {
        impl #runtime::ConfigField for #name {
            fn config_type() -> ::core::result::Result<#runtime::ConfigTypeNode, #runtime::SchemaError> {
                ::core::result::Result::Ok(#runtime::ConfigTypeNode::Enum {
                    name: #name_str,
                    values: ::std::vec![#(::std::string::String::from(#labels)),*],
                })
            }

            fn from_config_value(
                value: #runtime::ConfigValue,
            ) -> ::core::result::Result<Self, #runtime::ValidationError> {
                match value {
                    #runtime::ConfigValue::String(label) => match label.as_str() {
                        #(#labels => ::core::result::Result::Ok(Self::#idents),)*
                        _ => ::core::result::Result::Err(
                            #runtime::ValidationError::unknown_variant(label.as_str(), &[#(#labels),*]),
                        ),
                    },
                    other => ::core::result::Result::Err(
                        #runtime::ValidationError::type_mismatch("string", &other),
                    ),
                }
            }

            fn to_config_value(&self) -> #runtime::ConfigValue {
                match self {
                    #(Self::#idents => #runtime::ConfigValue::String(::std::string::String::from(#labels)),)*
                }
            }
        }
    })
}

fn expand_union(
    input: &DeriveInput,
    container: &ContainerAttrs,
    data: &DataEnum,
    discriminator: &str,
    runtime: &Path,
) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let description = option_string(
        container
            .description
            .clone()
            .or_else(|| doc_comment(&input.attrs)),
    );

    let mut idents = Vec::new();
    let mut labels = Vec::new();
    let mut inner_types = Vec::new();
    let mut variant_descriptions = Vec::new();
    for variant in &data.variants {
        let inner = match &variant.fields {
            Fields::Unnamed(fields) if fields.unnamed.len() == 1 => &fields.unnamed[0].ty,
            _ => {
                return Err(syn::Error::new_spanned(
                    variant,
                    "discriminated union variants must wrap exactly one config struct; hint: `Cat(CatConfig)`",
                ));
            }
        };
        let attrs = parse_variant_attrs(&variant.attrs)?;
        variant_descriptions.push(option_string(
            attrs.description.clone().or_else(|| doc_comment(&variant.attrs)),
        ));
        idents.push(&variant.ident);
        labels.push(variant_label(&variant.ident, attrs.rename, container));
        inner_types.push(inner);
    }

    Ok(quote! {
        impl #runtime::ConfigField for #name {
            const DISCRIMINATOR: ::core::option::Option<&'static str> =
                ::core::option::Option::Some(#discriminator);

            fn config_type() -> ::core::result::Result<#runtime::ConfigTypeNode, #runtime::SchemaError> {
                let mut fields = #runtime::__private::IndexMap::new();
                #(
                    fields.insert(
                        ::std::string::String::from(#labels),
                        #runtime::SchemaField::new(
                            #runtime::__private::nested_config_type_omitting::<#inner_types>(&[#discriminator])?,
                        )
                        .with_description(#variant_descriptions),
                    );
                )*
                ::core::result::Result::Ok(#runtime::ConfigTypeNode::Selector(#runtime::Selector {
                    fields,
                    description: #description,
                }))
            }

            fn from_config_value(
                value: #runtime::ConfigValue,
            ) -> ::core::result::Result<Self, #runtime::ValidationError> {
                let variant = #runtime::__private::union_variant(&value, #discriminator)?;
                match variant.as_str() {
                    #(
                        #labels => #runtime::__private::union_body::<#inner_types>(value, #discriminator)
                            .map(Self::#idents),
                    )*
                    _ => ::core::result::Result::Err(
                        #runtime::ValidationError::unknown_variant(variant.as_str(), &[#(#labels),*])
                            .with_path_prefix(#discriminator),
                    ),
                }
            }

            fn to_config_value(&self) -> #runtime::ConfigValue {
                match self {
                    #(
                        Self::#idents(inner) => #runtime::__private::union_flat(inner, #discriminator, #labels),
                    )*
                }
            }

            fn restore_markers(&mut self, raw: &#runtime::ConfigValue) {
                match self {
                    #(
                        Self::#idents(inner) => #runtime::ConfigField::restore_markers(inner, raw),
                    )*
                }
            }
        }
    })
}

fn variant_label(ident: &Ident, rename: Option<String>, container: &ContainerAttrs) -> String {
    let name = ident.unraw().to_string();
    rename
        .or_else(|| container.rename_all.map(|rule| rule.apply(&name)))
        .unwrap_or(name)
}

fn option_str(value: Option<String>) -> TokenStream2 {
    match value {
        Some(value) => quote!(::core::option::Option::Some(#value)),
        None => quote!(::core::option::Option::None),
    }
}

fn option_string(value: Option<String>) -> TokenStream2 {
    match value {
        Some(value) => quote!(::core::option::Option::Some(::std::string::String::from(#value))),
        None => quote!(::core::option::Option::<::std::string::String>::None),
    }
}

/// Source-like rendering of a type, e.g. `Option<Vec<String>>`.
fn type_label(ty: &Type) -> String {
    let mut label = quote!(#ty).to_string();
    for (from, to) in [(" < ", "<"), ("< ", "<"), (" >", ">"), (" ,", ","), (" :: ", "::"), (":: ", "::"), ("& ", "&")] {
        label = label.replace(from, to);
    }
    label
}
