//! Verbatim pieces of the generated client.
//!
//! The server error model is plain Rust and is copied into the output as is.
//! The root service is a Tera template, because it refers to the local aliases
//! the source buffer hands out for its imports.

use serde::Serialize;
use tera::{Context, Tera};

use crate::error::Result;

/// The embedded server error model
pub const ERROR_MODEL: &str = include_str!("../../templates/error_model.rs");

/// Modules the error model refers to by name
pub const ERROR_MODEL_IMPORTS: &[&str] = &[
    "serde",
    "serde_json",
    "std::any",
    "std::error",
    "std::fmt",
    "std::io",
];

const ROOT_SERVICE_NAME: &str = "root_service.rs.tera";
const ROOT_SERVICE: &str = include_str!("../../templates/root_service.rs.tera");

/// Values substituted into the root service template
#[derive(Debug, Clone, Serialize)]
pub struct RootServiceContext {
    /// Name of the root service type
    pub root: String,
    /// Doc comment lines placed above the root service, may be empty
    pub description: String,
    pub arc: String,
    pub duration: String,
    pub url: String,
    pub client: String,
    pub method: String,
    pub request: String,
    pub status_code: String,
    pub header: String,
    pub deserialize_owned: String,
    pub serialize: String,
}

/// Render the root service with the given aliases
pub fn render_root_service(context: &RootServiceContext) -> Result<String> {
    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);
    tera.add_raw_template(ROOT_SERVICE_NAME, ROOT_SERVICE)?;

    let context = Context::from_serialize(context)?;
    Ok(tera.render(ROOT_SERVICE_NAME, &context)?)
}
