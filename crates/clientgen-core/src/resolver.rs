//! Maps OpenAPI schema nodes onto Rust type expressions.

use std::borrow::Borrow;

use openapiv3::{ReferenceOr, Schema, SchemaKind, Type};

use crate::config::Options;
use crate::openapi::OpenApiContext;
use crate::source::SourceFile;
use crate::Error;

/// Vendor extension naming an externally defined replacement type
pub const TYPE_EXTENSION: &str = "x-ee.type";

/// Standard library types, spelled out so that no declared or imported name shadows them
pub const STRING: &str = "::std::string::String";
pub const VEC: &str = "::std::vec::Vec";
pub const RESULT: &str = "::std::result::Result";

/// Resolves schemas against one document and one set of options
#[derive(Debug, Clone, Copy)]
pub struct TypeResolver<'a> {
    spec: &'a OpenApiContext,
    options: &'a Options,
}

impl<'a> TypeResolver<'a> {
    pub fn new(spec: &'a OpenApiContext, options: &'a Options) -> Self {
        Self { spec, options }
    }

    /// The `x-ee.type` of `schema`, if the options say to honor it
    pub fn honored_override<'s>(&self, schema: &'s Schema) -> Option<&'s str> {
        schema
            .schema_data
            .extensions
            .get(TYPE_EXTENSION)
            .and_then(serde_json::Value::as_str)
            .filter(|name| self.options.use_references.contains(*name))
    }

    /// The type used where a schema cannot be typed
    pub fn any_type(&self, f: &mut SourceFile) -> String {
        f.import_name("serde_json", "Value")
    }

    /// Produce the type expression for `schema`.
    ///
    /// `context` names the place the schema is used at and only shows up in errors.
    pub fn type_name<S: Borrow<Schema>>(
        &self,
        f: &mut SourceFile,
        schema: &ReferenceOr<S>,
        context: &str,
    ) -> crate::Result<String> {
        match schema {
            ReferenceOr::Reference { reference } => {
                let (name, target) = self.spec.resolve_schema(reference)?;
                match self.honored_override(target) {
                    Some(external) => Ok(import_external(f, external)),
                    None => Ok(name.to_string()),
                }
            }
            ReferenceOr::Item(schema) => self.inline_type_name(f, schema.borrow(), context),
        }
    }

    fn inline_type_name(
        &self,
        f: &mut SourceFile,
        schema: &Schema,
        context: &str,
    ) -> crate::Result<String> {
        let typ = match &schema.schema_kind {
            SchemaKind::Type(typ) => typ,
            _ => {
                return Err(Error::unsupported(
                    context,
                    "oneOf/allOf/anyOf/not and untyped schemas are not supported",
                ));
            }
        };

        match typ {
            Type::String(_) => Ok(STRING.to_string()),
            Type::Integer(_) => Ok("i64".to_string()),
            Type::Number(_) => Ok("f64".to_string()),
            Type::Boolean(_) => Ok("bool".to_string()),
            Type::Array(array) => {
                let items = array
                    .items
                    .as_ref()
                    .ok_or_else(|| Error::unsupported(context, "array without items"))?;
                Ok(format!("{VEC}<{}>", self.type_name(f, items, context)?))
            }
            Type::Object(_) => Err(Error::unsupported(
                context,
                "inline object schemas are not supported, declare them in components.schemas",
            )),
        }
    }
}

/// Import an `x-ee.type` name and return its local reference.
///
/// Accepts `module::path#Symbol` as well as `module::path::Symbol`.
fn import_external(f: &mut SourceFile, name: &str) -> String {
    match name.split_once('#').or_else(|| name.rsplit_once("::")) {
        Some((source, symbol)) if !source.is_empty() && !symbol.is_empty() => {
            f.import_name(source, symbol)
        }
        _ => name.to_string(),
    }
}
