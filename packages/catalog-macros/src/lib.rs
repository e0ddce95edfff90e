use proc_macro::TokenStream;
use quote::quote;
use syn::{Item, LitStr, parse_macro_input};

/// Procedural macro to register a node type in the catalog.
///
/// Usage:
/// ```ignore
/// #[register_node("tensorflowCocoSsd")]
/// pub struct CocoSsdNode { /* ... */ }
///
/// impl NodeFactory for CocoSsdNode { /* ... */ }
/// ```
///
/// The struct gets a `NODE_TYPE` constant and a `NodeConstructor` is submitted
/// to the catalog, bound to the type name. The struct must implement
/// `NodeFactory`; `NodeConstructor` and `NodeFactory` must be reachable from
/// the crate root.
#[proc_macro_attribute]
pub fn register_node(attr: TokenStream, item: TokenStream) -> TokenStream {
    let type_name = parse_macro_input!(attr as LitStr);
    let input = parse_macro_input!(item as Item);

    let name = match &input {
        Item::Struct(item_struct) => item_struct.ident.clone(),
        other => {
            return syn::Error::new_spanned(other, "register_node can only be used on structs")
                .to_compile_error()
                .into();
        }
    };

    let expanded = quote! {
        #input

        impl #name {
            pub const NODE_TYPE: &'static str = #type_name;
        }

        ::inventory::submit! {
            crate::NodeConstructor::new(#type_name, <#name as crate::NodeFactory>::create)
        }
    };

    TokenStream::from(expanded)
}
