//! OpenAPI document loading and lookups.
//!
//! This module wraps the parsed `openapiv3` model and provides the lookups the
//! emitters need: following local `$ref`s and flattening `paths` into a sorted
//! list of endpoints.
//!
//! # Examples
//!
//! ```no_run
//! use clientgen_core::openapi::OpenApiContext;
//!
//! # #[tokio::main]
//! # async fn main() -> clientgen_core::Result<()> {
//! let spec = OpenApiContext::from_file_or_url("openapi.json").await?;
//! println!("API Title: {}", spec.title());
//! for endpoint in spec.endpoints()? {
//!     println!("{} {}", endpoint.method, endpoint.path);
//! }
//! # Ok(())
//! # }
//! ```

// Internal imports (std, crate)
use std::path::Path;

use crate::Error;

// External imports (alphabetized)
use indexmap::IndexMap;
use openapiv3::{
    Components, OpenAPI, Operation, Parameter, ParameterData, ReferenceOr, Response, Schema,
};
use serde::{Deserialize, Serialize};
use tokio::fs;

/// Reference chains longer than this are treated as cycles
const MAX_REF_DEPTH: usize = 32;

/// Represents a parsed OpenAPI v3 document
#[derive(Debug, Clone)]
pub struct OpenApiContext {
    /// The parsed document
    pub spec: OpenAPI,
}

/// Parameter kind based on the OpenAPI `in` field
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    Path,
    Query,
    Header,
    Cookie,
}

/// A resolved operation parameter
#[derive(Debug, Clone, Copy)]
pub struct EndpointParameter<'a> {
    pub kind: ParameterKind,
    pub data: &'a ParameterData,
}

impl<'a> EndpointParameter<'a> {
    fn new(parameter: &'a Parameter) -> Self {
        let (kind, data) = match parameter {
            Parameter::Path { parameter_data, .. } => (ParameterKind::Path, parameter_data),
            Parameter::Query { parameter_data, .. } => (ParameterKind::Query, parameter_data),
            Parameter::Header { parameter_data, .. } => (ParameterKind::Header, parameter_data),
            Parameter::Cookie { parameter_data, .. } => (ParameterKind::Cookie, parameter_data),
        };
        Self { kind, data }
    }

    /// The declared parameter name
    pub fn name(&self) -> &'a str {
        &self.data.name
    }
}

/// A single `(path, verb, operation)` triple
#[derive(Debug, Clone)]
pub struct Endpoint<'a> {
    /// Path template as written in the document, e.g. `/items/{id}`
    pub path: &'a str,
    /// Lower-case HTTP verb
    pub method: &'a str,
    pub operation: &'a Operation,
    /// Path-item parameters followed by the operation's own, in document order
    pub parameters: Vec<EndpointParameter<'a>>,
}

impl Endpoint<'_> {
    /// Content type of the request body.
    // TODO: derive this from `requestBody` once request bodies are emitted
    pub fn content_type(&self) -> &'static str {
        ""
    }

    /// Content type the generated call accepts
    pub fn accept_type(&self) -> &'static str {
        "application/json"
    }
}

impl OpenApiContext {
    /// Load a document from a file or URL (supports both YAML and JSON)
    pub async fn from_file_or_url<P: AsRef<str>>(location: P) -> crate::Result<Self> {
        let location = location.as_ref();

        if location.starts_with("http://") || location.starts_with("https://") {
            return Self::from_url(location).await;
        }

        Self::from_file(location).await
    }

    /// Load a document from a file (supports both YAML and JSON)
    pub async fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = fs::read(path).await?;
        Self::from_slice(&content).map_err(|e| {
            Error::openapi(format!(
                "Failed to parse OpenAPI spec at {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Load a document from a URL (supports both YAML and JSON)
    pub async fn from_url(url: &str) -> crate::Result<Self> {
        let content = fetch(url).await?;
        Self::from_slice(&content).map_err(|e| {
            Error::openapi(format!("Failed to parse OpenAPI spec from {}: {}", url, e))
        })
    }

    /// Parse content as either JSON or YAML
    pub fn from_slice(content: &[u8]) -> crate::Result<Self> {
        let spec = match serde_json::from_slice::<OpenAPI>(content) {
            Ok(spec) => spec,
            Err(json_err) => serde_yaml::from_slice::<OpenAPI>(content).map_err(|yaml_err| {
                Error::openapi(format!(
                    "content is neither a valid JSON ({json_err}) nor YAML ({yaml_err}) OpenAPI document"
                ))
            })?,
        };

        if !spec.openapi.starts_with("3.") {
            return Err(Error::openapi(format!(
                "unsupported OpenAPI version: {}",
                spec.openapi
            )));
        }

        Ok(Self { spec })
    }

    /// Get the title of the API
    pub fn title(&self) -> &str {
        &self.spec.info.title
    }

    /// Get the description of the API, empty if there is none
    pub fn description(&self) -> &str {
        self.spec.info.description.as_deref().unwrap_or_default()
    }

    /// Named schemas from `components.schemas`
    pub fn schemas(&self) -> Option<&IndexMap<String, ReferenceOr<Schema>>> {
        self.spec.components.as_ref().map(|c| &c.schemas)
    }

    /// Follow a `#/components/schemas/...` reference to the named schema.
    ///
    /// Returns the name of the last schema in the chain together with the schema.
    pub fn resolve_schema<'s>(
        &'s self,
        reference: &'s str,
    ) -> crate::Result<(&'s str, &'s Schema)> {
        let mut name = component_name(reference, "schemas")?;
        for _ in 0..MAX_REF_DEPTH {
            match self.component(|c| &c.schemas, name, reference)? {
                ReferenceOr::Item(schema) => return Ok((name, schema)),
                ReferenceOr::Reference { reference } => {
                    name = component_name(reference, "schemas")?;
                }
            }
        }
        Err(Error::openapi(format!("reference cycle at '{reference}'")))
    }

    /// Resolve a parameter which may be a `#/components/parameters/...` reference
    pub fn resolve_parameter<'a>(
        &'a self,
        parameter: &'a ReferenceOr<Parameter>,
    ) -> crate::Result<&'a Parameter> {
        self.resolve_item(parameter, "parameters", |c| &c.parameters)
    }

    /// Resolve a response which may be a `#/components/responses/...` reference
    pub fn resolve_response<'a>(
        &'a self,
        response: &'a ReferenceOr<Response>,
    ) -> crate::Result<&'a Response> {
        self.resolve_item(response, "responses", |c| &c.responses)
    }

    /// Flatten `paths` into endpoints, sorted by path and then by verb
    pub fn endpoints(&self) -> crate::Result<Vec<Endpoint<'_>>> {
        let paths = &self.spec.paths.paths;
        let mut endpoints = Vec::new();
        for path in crate::utils::sorted_keys(paths) {
            let item = match &paths[path] {
                ReferenceOr::Item(item) => item,
                ReferenceOr::Reference { reference } => {
                    return Err(Error::openapi(format!(
                        "path {path} uses reference {reference}, unsupported"
                    )));
                }
            };

            let mut operations: Vec<(&str, &Operation)> = item.iter().collect();
            operations.sort_by_key(|(method, _)| *method);

            for (method, operation) in operations {
                let parameters = self.merge_parameters(&item.parameters, &operation.parameters)?;
                endpoints.push(Endpoint {
                    path,
                    method,
                    operation,
                    parameters,
                });
            }
        }
        Ok(endpoints)
    }

    /// Path-level parameters first; an operation parameter with the same name
    /// and location replaces the path-level one in place.
    fn merge_parameters<'a>(
        &'a self,
        path_level: &'a [ReferenceOr<Parameter>],
        operation_level: &'a [ReferenceOr<Parameter>],
    ) -> crate::Result<Vec<EndpointParameter<'a>>> {
        let mut merged: Vec<EndpointParameter<'a>> = Vec::new();
        for parameter in path_level {
            merged.push(EndpointParameter::new(self.resolve_parameter(parameter)?));
        }
        for parameter in operation_level {
            let parameter = EndpointParameter::new(self.resolve_parameter(parameter)?);
            match merged
                .iter_mut()
                .find(|p| p.kind == parameter.kind && p.name() == parameter.name())
            {
                Some(existing) => *existing = parameter,
                None => merged.push(parameter),
            }
        }
        Ok(merged)
    }

    fn resolve_item<'a, T>(
        &'a self,
        mut item: &'a ReferenceOr<T>,
        kind: &str,
        section: fn(&Components) -> &IndexMap<String, ReferenceOr<T>>,
    ) -> crate::Result<&'a T> {
        for _ in 0..MAX_REF_DEPTH {
            match item {
                ReferenceOr::Item(value) => return Ok(value),
                ReferenceOr::Reference { reference } => {
                    let name = component_name(reference, kind)?;
                    item = self.component(section, name, reference)?;
                }
            }
        }
        Err(Error::openapi(format!("reference cycle in components.{kind}")))
    }

    fn component<'a, T>(
        &'a self,
        section: fn(&Components) -> &IndexMap<String, ReferenceOr<T>>,
        name: &str,
        reference: &str,
    ) -> crate::Result<&'a ReferenceOr<T>> {
        self.spec
            .components
            .as_ref()
            .and_then(|c| section(c).get(name))
            .ok_or_else(|| Error::openapi(format!("unresolved reference '{reference}'")))
    }
}

/// Extract the component name from a local reference like `#/components/schemas/Status`
fn component_name<'r>(reference: &'r str, kind: &str) -> crate::Result<&'r str> {
    reference
        .strip_prefix("#/components/")
        .and_then(|rest| rest.strip_prefix(kind))
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            Error::openapi(format!(
                "unsupported reference '{reference}', expected #/components/{kind}/<name>"
            ))
        })
}

async fn fetch(url: &str) -> crate::Result<Vec<u8>> {
    let response = reqwest::get(url).await.map_err(|e| {
        Error::openapi(format!("Failed to fetch OpenAPI spec from {}: {}", url, e))
    })?;

    if !response.status().is_success() {
        return Err(Error::openapi(format!(
            "Failed to fetch OpenAPI spec from {}: HTTP {}",
            url,
            response.status()
        )));
    }

    let content = response.bytes().await.map_err(|e| {
        Error::openapi(format!("Failed to read response from {}: {}", url, e))
    })?;
    Ok(content.to_vec())
}
