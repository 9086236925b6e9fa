use crate::util::option_inner;
use convert_case::{Case, Casing};
use darling::{FromDeriveInput, FromField, ast::Data};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Error, Generics, Ident, Type, ext::IdentExt};

///
/// EntityArgs
///

#[derive(Debug, FromDeriveInput)]
#[darling(attributes(entity), supports(struct_named))]
struct EntityArgs {
    ident: Ident,
    generics: Generics,
    data: Data<(), FieldArgs>,

    #[darling(default)]
    name: Option<String>,

    #[darling(default)]
    base: Option<String>,

    #[darling(default)]
    is_abstract: bool,

    #[darling(default)]
    on_delete: bool,
}

///
/// FieldArgs
///

#[derive(Debug, FromField)]
#[darling(attributes(entity))]
struct FieldArgs {
    ident: Option<Ident>,
    ty: Type,

    #[darling(default)]
    name: Option<String>,

    #[darling(default)]
    column: Option<String>,

    #[darling(default)]
    references: Option<String>,

    #[darling(default)]
    type_reference: bool,

    #[darling(default)]
    base_type_reference: bool,

    #[darling(default)]
    type_name: bool,

    #[darling(default)]
    enum_repr: bool,

    #[darling(default)]
    skip: bool,
}

impl FieldArgs {
    fn property_name(&self, ident: &Ident) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| ident.unraw().to_string().to_case(Case::Pascal))
    }

    fn shape_and_getter(&self, ident: &Ident) -> (TokenStream, TokenStream) {
        let ty = &self.ty;

        if !self.enum_repr {
            return (
                quote!(<#ty as FieldType>::SHAPE),
                quote! {
                    <<#ty as FieldType>::Native as NativeValue>::getter::<Self>(
                        |entity: &Self| FieldType::read(&entity.#ident)
                    )
                },
            );
        }

        let (inner, nullable) = option_inner(ty).map_or((ty, false), |inner| (inner, true));
        let repr = quote!(<<#inner as DbEnum>::Repr as NativeValue>);
        let read = if nullable {
            quote!(|entity: &Self| entity.#ident.map(DbEnum::to_repr))
        } else {
            quote!(|entity: &Self| Some(DbEnum::to_repr(entity.#ident)))
        };

        (
            quote!(FieldShape::enumeration(#repr::TYPE_CODE, #nullable)),
            quote!(#repr::getter::<Self>(#read)),
        )
    }

    fn flags(&self) -> Vec<TokenStream> {
        let mut flags = Vec::new();
        if self.type_reference {
            flags.push(quote!(PropertyFlags::TYPE_REFERENCE));
        }
        if self.base_type_reference {
            flags.push(quote!(PropertyFlags::BASE_TYPE_REFERENCE));
        }
        if self.type_name {
            flags.push(quote!(PropertyFlags::TYPE_NAME));
        }

        flags
    }

    fn accessor(&self, ident: &Ident) -> TokenStream {
        let property = self.property_name(ident);
        let (shape, getter) = self.shape_and_getter(ident);

        let mut accessor = quote!(FieldAccessor::new(#property, #shape, #getter));
        if let Some(column) = &self.column {
            accessor = quote!(#accessor.with_column(#column));
        }
        if let Some(target) = &self.references {
            accessor = quote!(#accessor.with_target(#target));
        }

        let flags = self.flags();
        if !flags.is_empty() {
            accessor = quote!(#accessor.with_flags(#(#flags)|*));
        }

        accessor
    }
}

// derive_entity
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input: DeriveInput = match syn::parse2(input) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };

    let args = match EntityArgs::from_derive_input(&input) {
        Ok(args) => args,
        Err(err) => return err.write_errors(),
    };

    if !args.generics.params.is_empty() {
        return Error::new_spanned(
            &args.generics,
            "Entity cannot be derived for generic types",
        )
        .to_compile_error();
    }

    let Data::Struct(fields) = &args.data else {
        return Error::new_spanned(
            &args.ident,
            "Entity can only be derived for structs with named fields",
        )
        .to_compile_error();
    };

    let ident = &args.ident;
    let type_name = args.name.clone().unwrap_or_else(|| ident.to_string());
    let base_name = args
        .base
        .as_ref()
        .map_or_else(|| quote!(None), |base| quote!(Some(#base)));
    let is_abstract = args.is_abstract;
    let has_on_delete = args.on_delete;

    let accessors = fields
        .iter()
        .filter(|field| !field.skip)
        .filter_map(|field| field.ident.as_ref().map(|ident| field.accessor(ident)));

    let new_uninitialized = if is_abstract {
        quote!(None)
    } else {
        quote!(Some(<Self as ::core::default::Default>::default()))
    };

    let on_delete = has_on_delete.then(|| {
        quote! {
            fn invoke_on_delete(&self) {
                <Self as ::bindery::traits::OnDelete>::on_delete(self);
            }
        }
    });

    quote! {
        impl ::bindery::traits::Entity for #ident {
            const TYPE_NAME: &'static str = #type_name;
            const BASE_NAME: ::core::option::Option<&'static str> = #base_name;
            const IS_ABSTRACT: bool = #is_abstract;
            const HAS_ON_DELETE: bool = #has_on_delete;

            fn fields() -> ::std::vec::Vec<::bindery::traits::FieldAccessor<Self>> {
                #[allow(unused_imports)]
                use ::bindery::traits::{
                    DbEnum, FieldAccessor, FieldShape, FieldType, NativeValue, PropertyFlags,
                };

                ::std::vec![#(#accessors),*]
            }

            fn new_uninitialized() -> ::core::option::Option<Self> {
                #new_uninitialized
            }

            #on_delete
        }
    }
}
