use proc_macro_crate::{FoundCrate, crate_name};
use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::Ident;
use tracing::{debug, warn};

/// Path to the runtime crate as seen from the crate being built.
pub(super) fn root_crate_name_ts() -> TokenStream {
    match crate_name("rama-rest") {
        Ok(FoundCrate::Itself) => quote!(crate),
        Ok(FoundCrate::Name(name)) => {
            debug!("generated code refers to runtime crate `{name}`");
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        Err(err) => {
            warn!("rama-rest dependency not found ({err}), assuming `::rama_rest`");
            quote!(::rama_rest)
        }
    }
}
