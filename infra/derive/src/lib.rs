#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by the Lumo infrastructure crates.
//!
//! * [`lumo_error`] turns a plain enum into a context-aware error type.
//! * [`main`] bootstraps a binary on a profiled Tokio runtime (re-exported by `lumo-runtime`).
//!
//! Examples are `ignore`d here because a proc-macro crate cannot use its own macros in doctests.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemFn, parse_macro_input};

/// Attribute macro to bootstrap a binary on the specialized Tokio runtime.
///
/// Turns an `async fn main` returning a `Result` into a synchronous `fn main` that builds
/// a runtime from the selected profile and blocks on the original body.
///
/// # Arguments
///
/// * `high_performance` - Larger stacks and longer keep-alive for long-running processes.
/// * `memory_efficient` - Half the worker threads and smaller stacks for short-lived tools.
/// * `default` - Worker threads auto-detected from available parallelism.
///
/// # Examples
///
/// ```rust,ignore
/// #[lumo_runtime::main(memory_efficient)]
/// async fn main() -> anyhow::Result<()> {
///     Ok(())
/// }
/// ```
#[proc_macro_attribute]
pub fn main(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    macros::runtime::expand_main(args.into(), input).into()
}

/// Attribute macro for defining crate-level error enums.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]` unless already present.
/// * **Context Support**: Generates a companion `<Name>Ext` trait adding `.context(...)` to
///   `Result<T, Name>` and to `Result<T, Source>` for every wrapped source error.
/// * **Conversions**: Implements `From<Source>` for variants whose only payload is a
///   `source` field plus `context`, so `?` works on upstream errors.
/// * **Internal Fallback**: Implements `From<&'static str>` and `From<String>` when an
///   `Internal { message, context }` variant exists.
/// * **Formatting Helper**: Emits a module-local `format_context` function for `#[error]` strings.
///
/// # Requirements
///
/// 1. Applied to an **enum** with **named-field** variants only.
/// 2. A `context` field, when present, must be `Option<Cow<'static, str>>`.
/// 3. Every variant carrying a `source` (or `#[source]`/`#[from]`) field must also carry `context`.
///
/// # Example
///
/// ```rust,ignore
/// use std::borrow::Cow;
///
/// #[lumo_derive::lumo_error]
/// pub enum StoreError {
///     #[error("Record codec failure{}: {source}", format_context(.context))]
///     Codec { source: postcard::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal store error{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn decode(bytes: &[u8]) -> Result<Record, StoreError> {
///     postcard::from_bytes(bytes).context("Decoding record envelope")
/// }
/// ```
#[proc_macro_attribute]
pub fn lumo_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}
