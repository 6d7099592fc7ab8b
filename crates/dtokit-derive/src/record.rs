use darling::{FromDeriveInput, FromField, FromMeta, ast::Data, util::Ignored};
use proc_macro2::TokenStream;
use quote::quote;
use std::collections::BTreeSet;
use syn::{DeriveInput, Error, Generics, Ident, Path, Type};

///
/// RecordInput
///

#[derive(FromDeriveInput)]
#[darling(attributes(record), supports(struct_named))]
struct RecordInput {
    ident: Ident,
    generics: Generics,
    data: Data<Ignored, RecordField>,

    /// Overrides `Record::NAME`.
    name: Option<String>,

    #[darling(multiple)]
    setter: Vec<SetterSpec>,
}

///
/// RecordField
///

#[derive(FromField)]
#[darling(attributes(record))]
struct RecordField {
    ident: Option<Ident>,
    ty: Type,

    #[darling(default)]
    skip: bool,

    rename: Option<String>,

    #[darling(default)]
    presence: bool,
}

impl RecordField {
    fn ident(&self) -> &Ident {
        self.ident.as_ref().expect("named field")
    }

    fn declared_name(&self) -> String {
        self.rename
            .clone()
            .unwrap_or_else(|| self.ident().to_string())
    }

    fn is_presence(&self) -> bool {
        self.presence || is_path_ident(&self.ty, "Presence")
    }
}

///
/// SetterSpec
/// A target name served by a method instead of a field.
///

#[derive(FromMeta)]
struct SetterSpec {
    field: String,
    with: Path,
    getter: Option<Path>,
}

// derive_record
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input: DeriveInput = match syn::parse2(input) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };

    let parsed = match RecordInput::from_derive_input(&input) {
        Ok(parsed) => parsed,
        Err(err) => return err.write_errors(),
    };

    expand(&parsed).unwrap_or_else(|err| err.to_compile_error())
}

fn expand(input: &RecordInput) -> Result<TokenStream, Error> {
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let record_name = input.name.clone().unwrap_or_else(|| ident.to_string());

    let fields = input
        .data
        .as_ref()
        .take_struct()
        .expect("darling enforces named structs")
        .fields;

    let presence = find_presence(ident, &fields)?;

    let declared = fields
        .iter()
        .filter(|f| !f.skip && !f.is_presence())
        .map(|f| (f.ident(), f.declared_name()))
        .collect::<Vec<_>>();

    let mut seen = BTreeSet::new();
    for (field_ident, name) in &declared {
        if !seen.insert(name.clone()) {
            return Err(Error::new_spanned(
                field_ident,
                format!("duplicate record field name '{name}'"),
            ));
        }
    }

    let setters = live_setters(&input.setter, &seen)?;

    let serde_json = quote!(::dtokit::__reexports::serde_json);
    let record = quote!(::dtokit::record);
    let error = quote!(::dtokit::error::HydrationError);

    let field_names = declared.iter().map(|(_, name)| name);

    let blank_inits = fields.iter().map(|f| {
        let field_ident = f.ident();
        quote!(#field_ident: ::core::default::Default::default())
    });

    let field_assign_arms = declared.iter().map(|(field_ident, name)| {
        quote! {
            #name => {
                self.#field_ident = #serde_json::from_value(value)
                    .map_err(|err| #error::field(<Self as #record::Record>::NAME, field, err))?;
            }
        }
    });

    let setter_assign_arms = setters.iter().map(|setter| {
        let name = &setter.field;
        let with = &setter.with;
        quote! {
            #name => {
                #with(
                    self,
                    #serde_json::from_value(value)
                        .map_err(|err| #error::field(<Self as #record::Record>::NAME, field, err))?,
                );
            }
        }
    });

    let field_value_arms = declared.iter().map(|(field_ident, name)| {
        quote! {
            #name => #serde_json::to_value(&self.#field_ident).ok(),
        }
    });

    let getter_value_arms = setters.iter().filter_map(|setter| {
        let name = &setter.field;
        let getter = setter.getter.as_ref()?;
        Some(quote! {
            #name => #serde_json::to_value(&#getter(self)).ok(),
        })
    });

    let presence_ident = presence.ident();

    Ok(quote! {
        impl #impl_generics #record::Record for #ident #ty_generics #where_clause {
            const NAME: &'static str = #record_name;
            const FIELDS: &'static [&'static str] = &[#(#field_names),*];

            fn blank() -> Self {
                Self {
                    #(#blank_inits),*
                }
            }

            #[allow(unreachable_code)]
            fn assign(
                &mut self,
                field: &str,
                value: ::dtokit::path::Tree,
            ) -> ::core::result::Result<#record::Assignment, #error> {
                match field {
                    #(#field_assign_arms)*
                    #(#setter_assign_arms)*
                    _ => return ::core::result::Result::Ok(#record::Assignment::Ignored),
                }

                ::core::result::Result::Ok(#record::Assignment::Assigned)
            }

            fn field_value(&self, field: &str) -> ::core::option::Option<::dtokit::path::Tree> {
                match field {
                    #(#field_value_arms)*
                    #(#getter_value_arms)*
                    _ => ::core::option::Option::None,
                }
            }

            fn presence(&self) -> &#record::Presence {
                &self.#presence_ident
            }

            fn presence_mut(&mut self) -> &mut #record::Presence {
                &mut self.#presence_ident
            }
        }
    })
}

// exactly one field must hold the presence state
fn find_presence<'a>(ident: &Ident, fields: &[&'a RecordField]) -> Result<&'a RecordField, Error> {
    let mut found = fields.iter().copied().filter(|f| f.is_presence());

    let Some(first) = found.next() else {
        return Err(Error::new_spanned(
            ident,
            "Record requires one field of type `Presence` (or marked #[record(presence)])",
        ));
    };

    if let Some(second) = found.next() {
        return Err(Error::new_spanned(
            second.ident(),
            "Record allows only one presence field",
        ));
    }

    Ok(first)
}

// setters shadowed by a same-named field are dropped; the field wins
fn live_setters<'a>(
    setters: &'a [SetterSpec],
    declared: &BTreeSet<String>,
) -> Result<Vec<&'a SetterSpec>, Error> {
    let mut seen = BTreeSet::new();
    let mut live = Vec::new();

    for setter in setters {
        if !seen.insert(setter.field.as_str()) {
            return Err(Error::new_spanned(
                &setter.with,
                format!("duplicate setter for '{}'", setter.field),
            ));
        }
        if !declared.contains(&setter.field) {
            live.push(setter);
        }
    }

    Ok(live)
}

fn is_path_ident(ty: &Type, ident: &str) -> bool {
    let Type::Path(path) = ty else {
        return false;
    };

    path.path
        .segments
        .last()
        .is_some_and(|segment| segment.ident == ident)
}
