//! The api root: server error model, root service, request plumbing.

use std::fmt::Write;

use crate::openapi::OpenApiContext;
use crate::source::SourceFile;
use crate::templates::{self, RootServiceContext};
use crate::utils::{doc_comment, public};
use crate::Result;

/// Type every request takes as its first argument
pub const REQUEST_CONTEXT: &str = "RequestContext";

/// Name of the root service for a document titled `title`
pub fn root_name(title: &str) -> String {
    public(&format!("{title}Service"))
}

/// Emit the error model and the root service. Returns the root service name.
pub fn emit_api_root(f: &mut SourceFile, spec: &OpenApiContext) -> Result<String> {
    for module in templates::ERROR_MODEL_IMPORTS {
        f.import_name(module, "");
    }
    writeln!(f, "{}", templates::ERROR_MODEL)?;

    let root = root_name(spec.title());
    let description = match spec.description().trim() {
        "" => String::new(),
        text => doc_comment(text),
    };

    let context = RootServiceContext {
        root: root.clone(),
        description,
        arc: f.import_name("std::sync", "Arc"),
        duration: f.import_name("std::time", "Duration"),
        url: f.import_name("url", "Url"),
        client: f.import_name("reqwest", "Client"),
        method: f.import_name("reqwest", "Method"),
        request: f.import_name("reqwest", "Request"),
        status_code: f.import_name("reqwest", "StatusCode"),
        header: f.import_name("reqwest", "header"),
        deserialize_owned: f.import_name("serde::de", "DeserializeOwned"),
        serialize: f.import_name("serde", "Serialize"),
    };
    writeln!(f, "{}", templates::render_root_service(&context)?)?;

    log::debug!("emitted api root {root}");
    Ok(root)
}
