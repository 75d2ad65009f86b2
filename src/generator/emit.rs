//! Test-module emission
//!
//! Builds the module as a token stream with `quote!`, parses it back through
//! `syn` and pretty-prints it with `prettyplease`, so the output is valid,
//! consistently formatted Rust regardless of notebook names.

use std::path::Path;

use proc_macro2::{Ident, Literal, Span, TokenStream};
use quote::quote;

use super::{GenerateError, GenerateOptions};
use crate::runner::timeout_secs;

/// Name of the generated test for the notebook at sorted index `index`.
pub fn test_name(index: usize) -> String {
    format!("test_ipynb_{}", index)
}

/// Render the complete test module for `notebooks`, in the order given.
pub fn emit_module(notebooks: &[impl AsRef<Path>], options: &GenerateOptions) -> Result<String, GenerateError> {
    let crate_path: syn::Path =
        syn::parse_str(&options.crate_path).map_err(|e| GenerateError::InvalidCratePath {
            path: options.crate_path.clone(),
            message: e.to_string(),
        })?;
    let secs = timeout_secs(options.timeout).ok_or(GenerateError::InvalidTimeout(options.timeout))?;
    let timeout_lit = Literal::u64_unsuffixed(secs);

    let tests: Vec<TokenStream> = notebooks
        .iter()
        .enumerate()
        .map(|(index, notebook)| emit_test(index, notebook.as_ref()))
        .collect();

    let tokens = quote! {
        #![allow(dead_code, unused_imports)]

        use std::time::Duration;

        use #crate_path::notebook::format_errors;
        use #crate_path::runner::{NotebookRunner, RunError};

        fn notebook_runner() -> NotebookRunner {
            NotebookRunner::new().with_timeout(Duration::from_secs(#timeout_lit))
        }

        #(#tests)*
    };

    let syntax_tree: syn::File = syn::parse2(tokens).map_err(|e| GenerateError::Emit(e.to_string()))?;
    let formatted = prettyplease::unparse(&syntax_tree);

    let header = format!(
        "// Generated by nbtest v{}. Do not edit; re-run `nbtest generate` instead.\n\n",
        crate::version::NBTEST_VERSION
    );

    Ok(format!("{}{}", header, formatted))
}

fn emit_test(index: usize, notebook: &Path) -> TokenStream {
    let name = Ident::new(&test_name(index), Span::call_site());
    let notebook = notebook.display().to_string();

    quote! {
        #[test]
        fn #name() -> Result<(), RunError> {
            let (_notebook, errors) = notebook_runner().run(#notebook)?;
            assert!(
                errors.is_empty(),
                "{} produced {} error output(s):\n{}",
                #notebook,
                errors.len(),
                format_errors(&errors)
            );
            Ok(())
        }
    }
}
