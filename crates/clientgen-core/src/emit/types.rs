//! Record declarations for `components.schemas`.

use std::fmt::Write;

use openapiv3::{ObjectType, ReferenceOr, Schema, SchemaKind, Type};

use crate::openapi::OpenApiContext;
use crate::resolver::TypeResolver;
use crate::source::SourceFile;
use crate::utils::{doc_comment, ident, public, sorted_keys};
use crate::{Error, Result};

/// Component name reserved for the embedded server error model
pub const ERROR_TYPE: &str = "Error";

/// Names of the component schemas that become local declarations, sorted.
///
/// Excludes the reserved `Error` and every schema replaced by an honored
/// `x-ee.type`.
pub fn declared_names<'a>(spec: &'a OpenApiContext, resolver: &TypeResolver<'_>) -> Vec<&'a str> {
    let Some(schemas) = spec.schemas() else {
        return Vec::new();
    };

    sorted_keys(schemas)
        .into_iter()
        .filter(|name| *name != ERROR_TYPE)
        .filter(|name| match &schemas[*name] {
            ReferenceOr::Item(schema) => resolver.honored_override(schema).is_none(),
            ReferenceOr::Reference { .. } => true,
        })
        .collect()
}

/// Emit one record per declared component schema, in sorted order
pub fn emit_types(f: &mut SourceFile, spec: &OpenApiContext, resolver: &TypeResolver<'_>) -> Result<()> {
    let Some(schemas) = spec.schemas() else {
        return Ok(());
    };

    for name in declared_names(spec, resolver) {
        let schema = match &schemas[name] {
            ReferenceOr::Item(schema) => schema,
            ReferenceOr::Reference { reference } => {
                return Err(Error::unsupported(
                    name,
                    format!("top-level reference to {reference} is not supported"),
                ));
            }
        };

        match &schema.schema_kind {
            SchemaKind::Type(Type::Object(object)) => {
                log::debug!("emitting type {name}");
                emit_struct(f, resolver, name, schema, object)?;
            }
            SchemaKind::Type(other) => {
                return Err(Error::unsupported(
                    name,
                    format!("top-level {} schemas are not supported", kind_name(other)),
                ));
            }
            _ => {
                return Err(Error::unsupported(
                    name,
                    "oneOf/allOf/anyOf/not and untyped schemas are not supported",
                ));
            }
        }
    }
    Ok(())
}

fn emit_struct(
    f: &mut SourceFile,
    resolver: &TypeResolver<'_>,
    name: &str,
    schema: &Schema,
    object: &ObjectType,
) -> Result<()> {
    let serialize = f.import_name("serde", "Serialize");
    let deserialize = f.import_name("serde", "Deserialize");

    if let Some(description) = &schema.schema_data.description {
        write!(f, "{}", doc_comment(description))?;
    }
    writeln!(f, "#[derive(Debug, Clone, Default, {serialize}, {deserialize})]")?;
    writeln!(f, "#[serde(default)]")?;
    writeln!(f, "pub struct {name} {{")?;
    f.shift_right();

    for property in sorted_keys(&object.properties) {
        let property_schema = &object.properties[property];
        if let ReferenceOr::Item(item) = property_schema {
            if let Some(description) = &item.schema_data.description {
                write!(f, "{}", doc_comment(description))?;
            }
        }

        let field = ident(&public(property));
        if field != property {
            writeln!(f, "#[serde(rename = {property:?})]")?;
        }
        let typ = resolver.type_name(f, property_schema, &format!("{name}.{property}"))?;
        writeln!(f, "pub {field}: {typ},")?;
    }

    f.shift_left();
    writeln!(f, "}}")?;
    writeln!(f)?;
    Ok(())
}

fn kind_name(typ: &Type) -> &'static str {
    match typ {
        Type::String(_) => "string",
        Type::Number(_) => "number",
        Type::Integer(_) => "integer",
        Type::Boolean(_) => "boolean",
        Type::Array(_) => "array",
        Type::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;
    use serde_json::json;

    fn spec(schemas: serde_json::Value) -> OpenApiContext {
        let doc = json!({
            "openapi": "3.0.1",
            "info": {"title": "t", "version": "1"},
            "paths": {},
            "components": {"schemas": schemas}
        });
        OpenApiContext::from_slice(doc.to_string().as_bytes()).unwrap()
    }

    fn status_schemas() -> serde_json::Value {
        json!({
            "Status": {
                "type": "object",
                "description": "Status tells about the setup.",
                "x-ee.type": "my_app::setup#Status",
                "properties": {
                    "Message": {"type": "string"},
                    "Id": {"type": "integer", "description": "Id of the status."},
                    "tags": {"type": "array", "items": {"type": "string"}},
                    "type": {"type": "string"}
                }
            },
            "Error": {"type": "object", "properties": {"x": {"type": "string"}}},
            "Account": {"type": "object", "properties": {"status": {"$ref": "#/components/schemas/Status"}}}
        })
    }

    #[test]
    fn test_emit_struct_layout() -> Result<()> {
        let spec = spec(status_schemas());
        let options = Options::default();
        let resolver = TypeResolver::new(&spec, &options);
        let mut f = SourceFile::new("blub", "test");

        assert_eq!(declared_names(&spec, &resolver), vec!["Account", "Status"]);
        emit_types(&mut f, &spec, &resolver)?;

        let body = f.body();
        let account = body.find("pub struct Account").unwrap();
        let status = body.find("pub struct Status").unwrap();
        assert!(account < status);
        assert!(!body.contains("pub struct Error"));

        assert!(body.contains(
            "/// Status tells about the setup.\n\
             #[derive(Debug, Clone, Default, Serialize, Deserialize)]\n\
             #[serde(default)]\n\
             pub struct Status {\n    \
             /// Id of the status.\n    \
             pub Id: i64,\n    \
             pub Message: ::std::string::String,\n    \
             #[serde(rename = \"tags\")]\n    \
             pub Tags: ::std::vec::Vec<::std::string::String>,\n    \
             #[serde(rename = \"type\")]\n    \
             pub Type: ::std::string::String,\n\
             }\n"
        ));
        assert!(body.contains("#[serde(rename = \"status\")]\n    pub Status: Status,\n"));
        assert_eq!(f.import_block(), "use serde::Deserialize;\nuse serde::Serialize;\n");
        Ok(())
    }

    #[test]
    fn test_honored_override_is_not_declared() -> Result<()> {
        let spec = spec(status_schemas());
        let options = Options::default().with_reference("my_app::setup#Status");
        let resolver = TypeResolver::new(&spec, &options);
        let mut f = SourceFile::new("blub", "test");

        assert_eq!(declared_names(&spec, &resolver), vec!["Account"]);
        emit_types(&mut f, &spec, &resolver)?;
        assert!(!f.body().contains("pub struct Status"));
        assert!(f.body().contains("pub Status: Status,"));
        assert!(f.import_block().contains("use my_app::setup::Status;\n"));
        Ok(())
    }

    #[test]
    fn test_top_level_primitives_fail() {
        for (schema, kind) in [
            (json!({"type": "string"}), "string"),
            (json!({"type": "array", "items": {"type": "string"}}), "array"),
            (json!({"type": "boolean"}), "boolean"),
        ] {
            let spec = spec(json!({ "Alias": schema }));
            let options = Options::default();
            let resolver = TypeResolver::new(&spec, &options);
            let mut f = SourceFile::new("blub", "test");

            let err = emit_types(&mut f, &spec, &resolver).unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("unsupported schema 'Alias': top-level {kind} schemas are not supported")
            );
        }
    }

    #[test]
    fn test_inline_object_property_fails() {
        let spec = spec(json!({
            "Pet": {"type": "object", "properties": {"owner": {"type": "object", "properties": {}}}}
        }));
        let options = Options::default();
        let resolver = TypeResolver::new(&spec, &options);
        let mut f = SourceFile::new("blub", "test");

        let err = emit_types(&mut f, &spec, &resolver).unwrap_err();
        assert!(matches!(err, Error::UnsupportedSchema { ref name, .. } if name == "Pet.owner"));
    }
}
