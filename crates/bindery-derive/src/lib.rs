use proc_macro::TokenStream;

mod entity;
mod util;

/// Derive `bindery::traits::Entity` for a struct with named fields.
///
/// Struct attributes: `#[entity(name = "Ns.Type", base = "Ns.Base",
/// is_abstract, on_delete)]`.
///
/// Field attributes: `#[entity(name = "...", column = "...",
/// references = "Ns.Target", type_reference, base_type_reference,
/// type_name, enum_repr, skip)]`. Property names default to the field name
/// in PascalCase.
#[proc_macro_derive(Entity, attributes(entity))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    entity::derive_entity(input.into()).into()
}
