use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use proc_macro_crate::{FoundCrate, crate_name};
use quote::{format_ident, quote};
use syn::{
    AttributeArgs, FnArg, GenericArgument, ImplItem, Item, ItemFn, ItemImpl, Lit, LitStr, Meta,
    NestedMeta, Pat, PathArguments, ReturnType, Signature, Type, parse_macro_input, spanned::Spanned,
};

/// Derive a `Tool` from a function, or from the single `&self` method of an
/// inherent impl block.
///
/// ```ignore
/// #[tool(
///     name = "describe_air_quality",
///     description = "Describe an OpenWeather air quality index",
///     params(index = "Index between 1 and 5")
/// )]
/// fn describe_aqi(index: u8) -> String { ... }
///
/// #[tool(description = "Fetch real-time weather", params(location = "City name"))]
/// impl WeatherTool {
///     async fn get_weather(&self, location: String) -> String { ... }
/// }
/// ```
///
/// A free function gets the unit struct `<Name>Tool`; an impl block makes the
/// type itself the tool. Both get `<Name>Params` deserialized from the call
/// arguments. `Option<T>` parameters are optional and a `Result` return maps
/// `Err` into `ToolError::ExecutionError`.
#[proc_macro_attribute]
pub fn tool(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as AttributeArgs);
    let item = parse_macro_input!(item as Item);

    let expanded = ToolAttrs::parse(args).and_then(|attrs| match item {
        Item::Fn(func) => expand_fn(&attrs, func),
        Item::Impl(block) => expand_impl(&attrs, block),
        other => Err(syn::Error::new(
            other.span(),
            "#[tool] applies to a function or an inherent impl block",
        )),
    });
    expanded.unwrap_or_else(|err| err.to_compile_error()).into()
}

struct ToolAttrs {
    name: Option<String>,
    description: String,
    params: Vec<(String, String)>,
}

impl ToolAttrs {
    fn parse(args: AttributeArgs) -> syn::Result<Self> {
        let mut name = None;
        let mut description = None;
        let mut params = Vec::new();

        for nested in args {
            match nested {
                NestedMeta::Meta(Meta::NameValue(nv)) => {
                    let key = nv.path.get_ident().map(|i| i.to_string()).unwrap_or_default();
                    let Lit::Str(value) = &nv.lit else {
                        return Err(syn::Error::new_spanned(&nv.lit, "expected a string literal"));
                    };
                    match key.as_str() {
                        "name" => name = Some(value.value()),
                        "description" => description = Some(value.value()),
                        _ => {
                            return Err(syn::Error::new_spanned(
                                &nv.path,
                                format!("unknown tool attribute '{key}'"),
                            ));
                        }
                    }
                }
                NestedMeta::Meta(Meta::List(list)) if list.path.is_ident("params") => {
                    for entry in list.nested {
                        match entry {
                            NestedMeta::Meta(Meta::NameValue(nv)) => match (nv.path.get_ident(), &nv.lit) {
                                (Some(ident), Lit::Str(s)) => params.push((ident.to_string(), s.value())),
                                _ => return Err(syn::Error::new_spanned(&nv, "expected `param = \"description\"`")),
                            },
                            other => {
                                return Err(syn::Error::new_spanned(other, "expected `param = \"description\"`"));
                            }
                        }
                    }
                }
                other => return Err(syn::Error::new_spanned(other, "unsupported tool attribute")),
            }
        }

        let description = description
            .ok_or_else(|| syn::Error::new(Span::call_site(), "tool requires `description = \"...\"`"))?;
        Ok(Self { name, description, params })
    }

    fn param_description(&self, name: &str) -> Option<&str> {
        self.params.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }
}

/// One typed argument of the tool function.
struct Param {
    ident: syn::Ident,
    ty: Type,
    description: String,
}

/// Typed arguments of `sig`, checked against the `params(..)` descriptions.
/// `with_receiver` requires (and skips) a leading `&self`.
fn collect_params(attrs: &ToolAttrs, sig: &Signature, with_receiver: bool) -> syn::Result<Vec<Param>> {
    let mut inputs = sig.inputs.iter();
    if with_receiver {
        match inputs.next() {
            Some(FnArg::Receiver(recv)) if recv.reference.is_some() && recv.mutability.is_none() => {}
            _ => return Err(syn::Error::new_spanned(&sig.ident, "tool methods must take `&self`")),
        }
    }

    let mut params = Vec::new();
    for input in inputs {
        let FnArg::Typed(pt) = input else {
            return Err(syn::Error::new_spanned(input, "`self` is only allowed on impl-block tools"));
        };
        let Pat::Ident(pi) = &*pt.pat else {
            return Err(syn::Error::new_spanned(&pt.pat, "only simple identifiers are supported"));
        };
        let description = attrs
            .param_description(&pi.ident.to_string())
            .ok_or_else(|| syn::Error::new_spanned(&pi.ident, format!("missing description for param '{}'", pi.ident)))?;
        params.push(Param {
            ident: pi.ident.clone(),
            ty: (*pt.ty).clone(),
            description: description.to_string(),
        });
    }

    if let Some((unknown, _)) = attrs
        .params
        .iter()
        .find(|(k, _)| !params.iter().any(|p| p.ident == k.as_str()))
    {
        return Err(syn::Error::new_spanned(
            &sig.ident,
            format!("param '{unknown}' not found in function signature"),
        ));
    }
    Ok(params)
}

fn expand_fn(attrs: &ToolAttrs, func: ItemFn) -> syn::Result<TokenStream2> {
    let params = collect_params(attrs, &func.sig, false)?;
    let ident = &func.sig.ident;
    let tool_struct = format_ident!("{}Tool", pascal_case(&ident.to_string()));
    let target = quote!(#tool_struct);
    let body = tool_impl(attrs, &func.sig, &params, &target, quote!(#ident))?;

    Ok(quote! {
        #func

        pub struct #tool_struct;

        #body
    })
}

fn expand_impl(attrs: &ToolAttrs, block: ItemImpl) -> syn::Result<TokenStream2> {
    if let Some((_, path, _)) = &block.trait_ {
        return Err(syn::Error::new_spanned(path, "#[tool] needs an inherent impl block"));
    }
    if !block.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(&block.generics, "generic tool types are not supported"));
    }

    let mut methods = block.items.iter().filter_map(|item| match item {
        ImplItem::Method(method) => Some(method),
        _ => None,
    });
    let method = match (methods.next(), methods.next()) {
        (Some(method), None) => method,
        _ => {
            return Err(syn::Error::new_spanned(
                &block.self_ty,
                "a tool impl block holds exactly one method",
            ));
        }
    };

    let params = collect_params(attrs, &method.sig, true)?;
    let ident = &method.sig.ident;
    let self_ty = &block.self_ty;
    let target = quote!(#self_ty);
    let body = tool_impl(attrs, &method.sig, &params, &target, quote!(self.#ident))?;

    Ok(quote! {
        #block

        #body
    })
}

/// The params struct plus `impl Tool for #target`, calling `callee`.
fn tool_impl(
    attrs: &ToolAttrs,
    sig: &Signature,
    params: &[Param],
    target: &TokenStream2,
    callee: TokenStream2,
) -> syn::Result<TokenStream2> {
    let host = host_crate();
    let serde_path = LitStr::new(&format!("{}::serde", host.to_string().replace(' ', "")), Span::call_site());
    let fn_name = sig.ident.to_string();
    let tool_name = attrs.name.clone().unwrap_or_else(|| fn_name.clone());
    let description = &attrs.description;
    let params_struct = format_ident!("{}Params", pascal_case(&fn_name));

    let fields = params.iter().map(|p| {
        let (ident, ty) = (&p.ident, &p.ty);
        if option_inner(ty).is_some() {
            quote!(#[serde(default)] pub #ident: #ty)
        } else {
            quote!(pub #ident: #ty)
        }
    });

    let schema = params.iter().map(|p| {
        let (inner, required) = match option_inner(&p.ty) {
            Some(inner) => (inner, false),
            None => (&p.ty, true),
        };
        let arg_type = json_type(inner);
        let name = p.ident.to_string();
        let description = &p.description;
        quote! {
            #host::tools::traits::ArgSchema {
                name: #name.into(),
                arg_type: #arg_type.into(),
                description: #description.into(),
                required: #required,
            }
        }
    });

    let values = params.iter().map(|p| {
        let ident = &p.ident;
        quote!(params.#ident)
    });
    let mut call = quote!(#callee(#(#values),*));
    if sig.asyncness.is_some() {
        call = quote!(#call.await);
    }
    let output = if returns_result(&sig.output) {
        quote! {
            #call.map_err(|e| #host::tools::error::ToolError::ExecutionError {
                name: #tool_name.to_string(),
                reason: e.to_string(),
            })
        }
    } else {
        quote!(Ok(#call))
    };

    Ok(quote! {
        #[derive(#host::serde::Deserialize)]
        #[serde(crate = #serde_path)]
        pub struct #params_struct {
            #(#fields,)*
        }

        #[#host::async_trait::async_trait]
        impl #host::tools::traits::Tool for #target {
            fn name(&self) -> &str { #tool_name }
            fn description(&self) -> &str { #description }
            fn args(&self) -> Vec<#host::tools::traits::ArgSchema> {
                vec![#(#schema),*]
            }
            async fn run(
                &self,
                input: #host::serde_json::Value,
            ) -> Result<String, #host::tools::error::ToolError> {
                let params: #params_struct = #host::serde_json::from_value(input)
                    .map_err(|e| #host::tools::error::ToolError::ParamsNotMatched(e.to_string()))?;
                #output
            }
        }
    })
}

/// Path to the `weather-agent` crate as seen from the expansion site.
fn host_crate() -> TokenStream2 {
    match crate_name("weather-agent") {
        Ok(FoundCrate::Itself) => quote!(crate),
        Ok(FoundCrate::Name(name)) => {
            let ident = syn::Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        Err(_) => quote!(::weather_agent),
    }
}

fn pascal_case(s: &str) -> String {
    s.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            chars
                .next()
                .map(|first| first.to_uppercase().chain(chars).collect::<String>())
                .unwrap_or_default()
        })
        .collect()
}

fn last_segment(ty: &Type) -> Option<&syn::PathSegment> {
    match ty {
        Type::Path(p) => p.path.segments.last(),
        _ => None,
    }
}

/// `Some(T)` when `ty` is `Option<T>`.
fn option_inner(ty: &Type) -> Option<&Type> {
    let seg = last_segment(ty).filter(|seg| seg.ident == "Option")?;
    let PathArguments::AngleBracketed(generics) = &seg.arguments else {
        return None;
    };
    generics.args.iter().find_map(|arg| match arg {
        GenericArgument::Type(t) => Some(t),
        _ => None,
    })
}

fn returns_result(output: &ReturnType) -> bool {
    match output {
        ReturnType::Type(_, ty) => last_segment(ty).is_some_and(|seg| seg.ident == "Result"),
        ReturnType::Default => false,
    }
}

fn json_type(ty: &Type) -> &'static str {
    let Some(seg) = last_segment(ty) else { return "object" };
    match seg.ident.to_string().as_str() {
        "String" | "str" => "string",
        "bool" => "boolean",
        "i8" | "i16" | "i32" | "i64" | "u8" | "u16" | "u32" | "u64" | "usize" | "isize" => "integer",
        "f32" | "f64" => "number",
        "Vec" => "array",
        _ => "object",
    }
}
