//! Renders the type catalog back to SDL. Used only to hand the validator a
//! schema document when the schema was ingested from introspection JSON, so
//! descriptions are omitted; structure, arguments and defaults are preserved.

use super::cache::{FieldDef, InputValueDef, TypeCache, TypeRef};

const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

pub fn render_sdl(
    cache: &TypeCache,
    query_type: &str,
    mutation_type: Option<&str>,
    subscription_type: Option<&str>,
) -> String {
    let mut blocks: Vec<(String, String)> = Vec::new();

    for (name, scalar) in &cache.scalars {
        if is_system_type(name) || BUILTIN_SCALARS.contains(&name.as_str()) {
            continue;
        }
        blocks.push((name.clone(), format!("scalar {}", scalar.name)));
    }
    for (name, object) in &cache.objects {
        if is_system_type(name) {
            continue;
        }
        blocks.push((
            name.clone(),
            format!(
                "type {}{} {{\n{}}}",
                object.name,
                implements_clause(object.implements.iter()),
                fields_block(object.fields.values()),
            ),
        ));
    }
    for (name, interface) in &cache.interfaces {
        if is_system_type(name) {
            continue;
        }
        blocks.push((
            name.clone(),
            format!(
                "interface {}{} {{\n{}}}",
                interface.name,
                implements_clause(interface.implements.iter()),
                fields_block(interface.fields.values()),
            ),
        ));
    }
    for (name, union) in &cache.unions {
        if is_system_type(name) {
            continue;
        }
        let mut members: Vec<&str> = union.possible_types.iter().map(String::as_str).collect();
        members.sort_unstable();
        blocks.push((
            name.clone(),
            format!("union {} = {}", union.name, members.join(" | ")),
        ));
    }
    for (name, en) in &cache.enums {
        if is_system_type(name) {
            continue;
        }
        let values: String = en
            .values
            .iter()
            .map(|value| format!("  {}\n", value.name))
            .collect();
        blocks.push((name.clone(), format!("enum {} {{\n{}}}", en.name, values)));
    }
    for (name, input_object) in &cache.input_objects {
        if is_system_type(name) {
            continue;
        }
        let fields: String = input_object
            .input_fields
            .iter()
            .map(|field| format!("  {}\n", input_value_sdl(field)))
            .collect();
        blocks.push((
            name.clone(),
            format!("input {} {{\n{}}}", input_object.name, fields),
        ));
    }

    blocks.sort_by(|a, b| a.0.cmp(&b.0));

    let mut sdl = String::new();
    sdl.push_str("schema {\n");
    sdl.push_str(&format!("  query: {}\n", query_type));
    if let Some(mutation) = mutation_type {
        sdl.push_str(&format!("  mutation: {}\n", mutation));
    }
    if let Some(subscription) = subscription_type {
        sdl.push_str(&format!("  subscription: {}\n", subscription));
    }
    sdl.push_str("}\n");
    for (_, block) in blocks {
        sdl.push('\n');
        sdl.push_str(&block);
        sdl.push('\n');
    }
    sdl
}

fn is_system_type(name: &str) -> bool {
    name.starts_with("__")
}

fn implements_clause<'a>(interfaces: impl Iterator<Item = &'a String>) -> String {
    let mut names: Vec<&str> = interfaces.map(String::as_str).collect();
    if names.is_empty() {
        return String::new();
    }
    names.sort_unstable();
    format!(" implements {}", names.join(" & "))
}

fn fields_block<'a>(fields: impl Iterator<Item = &'a FieldDef>) -> String {
    let mut fields: Vec<&FieldDef> = fields.collect();
    fields.sort_by(|a, b| a.name.cmp(&b.name));
    fields
        .iter()
        .map(|field| {
            let args = if field.args.is_empty() {
                String::new()
            } else {
                let rendered: Vec<String> =
                    field.args.iter().map(input_value_sdl).collect();
                format!("({})", rendered.join(", "))
            };
            format!("  {}{}: {}\n", field.name, args, type_ref_sdl(&field.ty))
        })
        .collect()
}

fn input_value_sdl(value: &InputValueDef) -> String {
    match &value.default_value {
        Some(default) => format!("{}: {} = {}", value.name, type_ref_sdl(&value.ty), default),
        None => format!("{}: {}", value.name, type_ref_sdl(&value.ty)),
    }
}

fn type_ref_sdl(ty: &TypeRef) -> String {
    match ty {
        TypeRef::Named(name) => name.clone(),
        TypeRef::List(inner) => format!("[{}]", type_ref_sdl(inner)),
        TypeRef::NonNull(inner) => format!("{}!", type_ref_sdl(inner)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::sdl::schema_from_sdl;

    #[test]
    fn rendered_sdl_reparses_into_the_same_catalog() {
        let source = r#"
            type Query {
              hero(episode: Episode! = NEWHOPE): Character
              search: SearchResult
            }
            interface Character { id: ID! name: String! }
            type Jedi implements Character { id: ID! name: String! saber: [String!]! }
            type Droid implements Character { id: ID! name: String! }
            union SearchResult = Jedi | Droid
            enum Episode { NEWHOPE EMPIRE JEDI }
            input ReviewInput { stars: Int! commentary: String }
            scalar Date
        "#;
        let schema = schema_from_sdl(source, false).unwrap();
        let rendered = render_sdl(&schema.cache, "Query", None, None);
        let reparsed = schema_from_sdl(&rendered, false).unwrap();

        assert_eq!(
            schema.cache.objects.len(),
            reparsed.cache.objects.len()
        );
        assert!(reparsed.cache.scalars.contains_key("Date"));
        assert!(reparsed.cache.objects["Jedi"].implements.contains("Character"));
        assert_eq!(
            reparsed.cache.objects["Jedi"].fields["saber"].ty,
            schema.cache.objects["Jedi"].fields["saber"].ty
        );
        assert_eq!(
            reparsed.cache.objects["Query"].fields["hero"].args[0]
                .default_value
                .as_deref(),
            Some("NEWHOPE")
        );
    }
}
