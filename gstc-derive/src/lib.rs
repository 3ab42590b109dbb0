use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, Lit, LitStr, Meta, Type};

/// Derive macro describing the CSV columns a record deserializes from.
///
/// For each named field it records:
/// - column name (honours `#[serde(rename = "...")]`)
/// - whether the column is required (`Option<T>` and `#[serde(default)]` fields are not)
/// - description (joined doc comments)
///
/// Generates `csv_columns() -> &'static [CsvColumn]` and `csv_header() -> String`.
/// A `CsvColumn` type with `name`, `required` and `description` fields must be in scope.
#[proc_macro_derive(CsvColumns, attributes(serde))]
pub fn derive_csv_columns(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return syn::Error::new_spanned(name, "CsvColumns requires named fields")
                    .to_compile_error()
                    .into()
            }
        },
        _ => {
            return syn::Error::new_spanned(name, "CsvColumns only supports structs")
                .to_compile_error()
                .into()
        }
    };

    let mut columns = Vec::new();
    for field in fields {
        let ident = field.ident.as_ref().expect("named field").to_string();
        let serde = match serde_options(&field.attrs) {
            Ok(opts) => opts,
            Err(err) => return err.to_compile_error().into(),
        };
        let column = serde.rename.unwrap_or(ident);
        let required = !serde.default && !is_option_type(&field.ty);
        let description = doc_comment(&field.attrs);
        columns.push((column, required, description));
    }

    let header = columns
        .iter()
        .map(|(column, _, _)| column.as_str())
        .collect::<Vec<_>>()
        .join(",");

    let entries = columns.iter().map(|(column, required, description)| {
        quote! {
            CsvColumn {
                name: #column,
                required: #required,
                description: #description,
            }
        }
    });

    let expanded = quote! {
        impl #name {
            pub fn csv_columns() -> &'static [CsvColumn] {
                static COLUMNS: &[CsvColumn] = &[
                    #(#entries),*
                ];
                COLUMNS
            }

            pub fn csv_header() -> String {
                #header.to_string()
            }
        }
    };

    TokenStream::from(expanded)
}

#[derive(Default)]
struct SerdeOptions {
    rename: Option<String>,
    default: bool,
}

fn serde_options(attrs: &[Attribute]) -> syn::Result<SerdeOptions> {
    let mut opts = SerdeOptions::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                opts.rename = Some(value.value());
            } else if meta.path.is_ident("default") {
                opts.default = true;
                // `default = "path"` form
                if meta.input.peek(syn::Token![=]) {
                    let _: LitStr = meta.value()?.parse()?;
                }
            } else if meta.input.peek(syn::Token![=]) {
                let _: syn::Expr = meta.value()?.parse()?;
            }
            Ok(())
        })?;
    }
    Ok(opts)
}

fn doc_comment(attrs: &[Attribute]) -> String {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(meta) => match &meta.value {
                syn::Expr::Lit(expr) => match &expr.lit {
                    Lit::Str(s) => Some(s.value().trim().to_string()),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_option_type(ty: &Type) -> bool {
    match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Option"),
        _ => false,
    }
}
