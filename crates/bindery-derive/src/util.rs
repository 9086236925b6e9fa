use syn::{GenericArgument, PathArguments, Type};

pub fn is_path_ident(ty: &Type, ident: &str) -> bool {
    let Type::Path(path) = ty else {
        return false;
    };

    path.path
        .segments
        .last()
        .is_some_and(|segment| segment.ident == ident)
}

/// The `T` of an `Option<T>` written as a path type.
pub fn option_inner(ty: &Type) -> Option<&Type> {
    if !is_path_ident(ty, "Option") {
        return None;
    }
    let Type::Path(path) = ty else {
        return None;
    };
    let PathArguments::AngleBracketed(args) = &path.path.segments.last()?.arguments else {
        return None;
    };

    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn option_inner_unwraps_qualified_paths() {
        let plain: Type = parse_quote!(Option<Status>);
        let qualified: Type = parse_quote!(::core::option::Option<crate::Status>);
        let other: Type = parse_quote!(Vec<Status>);

        let expected: Type = parse_quote!(Status);
        assert_eq!(option_inner(&plain), Some(&expected));
        assert!(option_inner(&qualified).is_some());
        assert!(option_inner(&other).is_none());
    }
}
