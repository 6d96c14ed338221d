use proc_macro::TokenStream;
use quote::quote;
use syn::{
    parse_macro_input, Data, DeriveInput, ImplItem, ImplItemFn, ItemImpl, Stmt, Type,
    Variant, Visibility,
};

/// Attribute macro for error enums that cross the FFI boundary.
///
/// The macro:
/// 1. Adds `#[derive(Debug, thiserror::Error, uniffi::Error)]` and `#[uniffi(flat_error)]`
/// 2. Appends a `Generic { message: String }` variant unless the enum already declares one
/// 3. Implements `From<anyhow::Error>`, flattening the cause chain into the message
/// 4. Adds `from_anyhow_result` to convert `anyhow::Result`s in one call
///
/// # Usage
///
/// ```rust,ignore
/// #[blinkup_error]
/// pub enum BlinkUpError {
///     #[error("unsupported action: {action}")]
///     UnsupportedAction { action: String },
/// }
/// ```
#[proc_macro_attribute]
pub fn blinkup_error(_args: TokenStream, input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let Data::Enum(data_enum) = &input.data else {
        return syn::Error::new_spanned(&input, "blinkup_error can only be applied to enums")
            .to_compile_error()
            .into();
    };

    let enum_name = &input.ident;
    let visibility = &input.vis;
    let generics = &input.generics;

    // Derives and uniffi attributes are re-emitted below
    let attrs: Vec<_> = input
        .attrs
        .iter()
        .filter(|attr| !attr.path().is_ident("derive") && !attr.path().is_ident("uniffi"))
        .collect();

    let mut variants = data_enum.variants.clone();
    if !variants.iter().any(|variant| variant.ident == "Generic") {
        let generic_variant: Variant = syn::parse_quote! {
            /// Wraps an `anyhow` error chain that has no dedicated variant.
            #[error("Generic error: {message}")]
            Generic {
                /// The flattened error chain.
                message: String
            }
        };
        variants.push(generic_variant);
    }

    quote! {
        #[allow(unused_imports)]
        use anyhow::Context as _;

        #[derive(Debug, thiserror::Error, uniffi::Error)]
        #[uniffi(flat_error)]
        #(#attrs)*
        #visibility enum #enum_name #generics {
            #variants
        }

        impl #generics From<anyhow::Error> for #enum_name #generics {
            fn from(err: anyhow::Error) -> Self {
                let mut message = err.to_string();
                let chain: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
                if !chain.is_empty() {
                    message.push_str(" (caused by: ");
                    message.push_str(&chain.join(" -> "));
                    message.push(')');
                }
                Self::Generic { message }
            }
        }

        impl #generics #enum_name #generics {
            /// Converts an `anyhow::Result` into a result carrying this error type.
            ///
            /// # Errors
            /// Returns the `Generic` variant when `result` is an error.
            pub fn from_anyhow_result<T>(result: anyhow::Result<T>) -> Result<T, Self> {
                result.map_err(Self::from)
            }
        }
    }
    .into()
}

/// Wraps `uniffi::export` and injects a logging context into every public method.
///
/// For each `pub fn` in the impl block the macro inserts
/// `let _blinkup_logger_ctx = crate::primitives::logger::LogContext::new("TypeName");`
/// as the first statement, so crate log lines are prefixed with `[BlinkUp][TypeName]`.
/// When any public method is `async`, `async_runtime = "tokio"` is added to the export.
///
/// # Usage
///
/// ```rust,ignore
/// #[blinkup_export]
/// impl InvocationHandle {
///     pub fn cancel(&self) {
///         crate::info!("cancel requested");
///     }
///
///     pub async fn wait_for_outcome(&self) -> Option<OnboardingOutcome> {
///         // exported with async_runtime = "tokio"
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn blinkup_export(args: TokenStream, input: TokenStream) -> TokenStream {
    let input_impl = parse_macro_input!(input as ItemImpl);

    let type_name = exported_type_name(&input_impl.self_ty);
    let has_async_functions = has_async_functions_in_impl(&input_impl.items);

    let items = input_impl
        .items
        .iter()
        .map(|item| match item {
            ImplItem::Fn(method) if matches!(method.vis, Visibility::Public(_)) => {
                let mut method = method.clone();
                inject_logging_context(&mut method, &type_name);
                ImplItem::Fn(method)
            }
            other => other.clone(),
        })
        .collect();

    let new_impl = ItemImpl {
        items,
        ..input_impl
    };

    let args = export_args(proc_macro2::TokenStream::from(args), has_async_functions);

    quote! {
        #[uniffi::export(#args)]
        #new_impl
    }
    .into()
}

/// Last path segment of the impl target, used as the log context label
fn exported_type_name(self_ty: &Type) -> String {
    match self_ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map_or_else(|| "Unknown".to_string(), |segment| segment.ident.to_string()),
        _ => "Unknown".to_string(),
    }
}

/// Appends `async_runtime = "tokio"` to the export arguments when needed
fn export_args(
    args: proc_macro2::TokenStream,
    has_async_functions: bool,
) -> proc_macro2::TokenStream {
    if !has_async_functions {
        args
    } else if args.is_empty() {
        quote! { async_runtime = "tokio" }
    } else {
        quote! { #args, async_runtime = "tokio" }
    }
}

/// Check if any public functions in the impl items are async
fn has_async_functions_in_impl(impl_items: &[ImplItem]) -> bool {
    impl_items.iter().any(|item| {
        if let ImplItem::Fn(method) = item {
            matches!(method.vis, Visibility::Public(_)) && method.sig.asyncness.is_some()
        } else {
            false
        }
    })
}

fn inject_logging_context(method: &mut ImplItemFn, type_name: &str) {
    let context_stmt: Stmt = syn::parse_quote! {
        let _blinkup_logger_ctx = crate::primitives::logger::LogContext::new(#type_name);
    };
    method.block.stmts.insert(0, context_stmt);
}
