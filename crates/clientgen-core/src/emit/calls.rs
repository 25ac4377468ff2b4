//! Call groups: one service per tag, a synchronous and an asynchronous method per endpoint.

use std::collections::{BTreeMap, HashSet};
use std::fmt::Write;

use once_cell::sync::Lazy;
use openapiv3::{ParameterSchemaOrContent, StatusCode};
use regex::Regex;

use crate::emit::root::REQUEST_CONTEXT;
use crate::emit::types::ERROR_TYPE;
use crate::openapi::{Endpoint, OpenApiContext, ParameterKind};
use crate::resolver::{TypeResolver, RESULT, STRING};
use crate::source::SourceFile;
use crate::utils::{doc_comment, ident, public, slash_to_camel_case};
use crate::{Error, Result};

static PATH_PARAM: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\w*\}").expect("Invalid regex"));

/// Group endpoints by tag. Untagged endpoints go to the group named after the
/// document title; an endpoint with several tags is listed in each of them.
pub fn group_endpoints<'e, 'a>(
    title: &str,
    endpoints: &'e [Endpoint<'a>],
) -> BTreeMap<String, Vec<&'e Endpoint<'a>>> {
    let mut groups: BTreeMap<String, Vec<&'e Endpoint<'a>>> = BTreeMap::new();
    for endpoint in endpoints {
        let tags = &endpoint.operation.tags;
        if tags.is_empty() {
            groups.entry(title.to_string()).or_default().push(endpoint);
        } else {
            for tag in tags {
                groups.entry(tag.clone()).or_default().push(endpoint);
            }
        }
    }
    groups
}

/// Name of the service type for `tag`
pub fn group_name(tag: &str) -> String {
    format!("{}Service", public(tag))
}

/// Method name of an endpoint, without the `sync` prefix
pub fn method_name(endpoint: &Endpoint<'_>) -> String {
    let path = endpoint.path.replace(['{', '}'], "");
    let method = endpoint.method.to_lowercase();
    let base = match method.as_str() {
        "get" => String::new(),
        "post" => {
            let summary = endpoint.operation.summary.as_deref().unwrap_or_default();
            if summary.to_lowercase().contains("create") {
                "Create".to_string()
            } else {
                "Post".to_string()
            }
        }
        _ => public(&method),
    };
    slash_to_camel_case(&format!("{base}/{path}"))
}

/// A piece of a path template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPiece {
    /// Text taken over as is
    Text(String),
    /// A `{name}` placeholder
    Param(String),
}

/// Split `path` at its `{name}` placeholders. An unnamed `{}` stays text.
pub fn split_path(path: &str) -> Vec<PathPiece> {
    let mut pieces = Vec::new();
    let mut text = String::new();
    let mut last = 0;
    for token in PATH_PARAM.find_iter(path) {
        let name = &path[token.start() + 1..token.end() - 1];
        text.push_str(&path[last..token.start()]);
        if name.is_empty() {
            text.push_str("{}");
        } else {
            if !text.is_empty() {
                pieces.push(PathPiece::Text(std::mem::take(&mut text)));
            }
            pieces.push(PathPiece::Param(name.to_string()));
        }
        last = token.end();
    }
    text.push_str(&path[last..]);
    if !text.is_empty() {
        pieces.push(PathPiece::Text(text));
    }
    pieces
}

/// A step appending to the request path
enum PathStep {
    Text(String),
    /// A parameter value as is
    Value(String),
    /// A parameter value, form-urlencoded
    Escaped(String),
}

/// Statements appending `steps` to `_path`, adjacent text merged
fn path_statements(steps: Vec<PathStep>, escape: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut text = String::new();
    for step in steps {
        let line = match step {
            PathStep::Text(more) => {
                text.push_str(&more);
                continue;
            }
            PathStep::Value(binding) => format!("_path.push_str(&formatParam(&{binding}));"),
            PathStep::Escaped(binding) => {
                format!("_path.extend({escape}(formatParam(&{binding}).as_bytes()));")
            }
        };
        if !text.is_empty() {
            lines.push(format!("_path.push_str({:?});", std::mem::take(&mut text)));
        }
        lines.push(line);
    }
    if !text.is_empty() {
        lines.push(format!("_path.push_str({text:?});"));
    }
    lines
}

/// Locals of the generated methods that no parameter binding may take
const CALL_LOCALS: &[&str] = &["_ctx", "_path", "_req", "_res", "_self", "_f"];

/// A binding for `name` not yet in `taken`, numbered on a clash
fn unique_binding(name: &str, taken: &mut HashSet<String>) -> String {
    let base = ident(name);
    let mut binding = base.clone();
    let mut n = 2;
    while taken.contains(&binding) {
        binding = ident(&format!("{}{n}", base.trim_start_matches("r#")));
        n += 1;
    }
    taken.insert(binding.clone());
    binding
}

/// How the methods of a group reach the api root
struct Receiver<'r> {
    /// Type the methods are implemented on
    name: &'r str,
    /// Expression naming the root inside a method
    parent: &'static str,
    /// Receiver of the asynchronous methods
    async_self: String,
    /// Expression producing an owned receiver for the spawned task
    clone_self: String,
}

/// Emit all call groups, in sorted group order
pub fn emit_call_groups(
    f: &mut SourceFile,
    spec: &OpenApiContext,
    resolver: &TypeResolver<'_>,
    root: &str,
) -> Result<()> {
    let endpoints = spec.endpoints()?;
    let groups = group_endpoints(spec.title(), &endpoints);
    for (tag, endpoints) in &groups {
        let name = group_name(tag);
        log::debug!("emitting call group {name} with {} endpoints", endpoints.len());
        emit_call_group(f, spec, resolver, root, &name, endpoints)?;
    }
    Ok(())
}

fn emit_call_group(
    f: &mut SourceFile,
    spec: &OpenApiContext,
    resolver: &TypeResolver<'_>,
    root: &str,
    name: &str,
    endpoints: &[&Endpoint<'_>],
) -> Result<()> {
    let arc = f.import_name("std::sync", "Arc");

    // the default group of a document is the root service itself
    let receiver = if name == root {
        Receiver {
            name: root,
            parent: "self",
            async_self: format!("self: &{arc}<Self>"),
            clone_self: format!("{arc}::clone(self)"),
        }
    } else {
        writeln!(f, "impl {root} {{")?;
        f.shift_right();
        writeln!(f, "/// {name} returns the according api group.")?;
        writeln!(f, "pub fn {name}(self: &{arc}<Self>) -> {name} {{")?;
        writeln!(f, "    {name} {{ parent: {arc}::clone(self) }}")?;
        writeln!(f, "}}")?;
        f.shift_left();
        writeln!(f, "}}")?;
        writeln!(f)?;

        writeln!(f, "/// {name} groups tagged api calls.")?;
        writeln!(f, "#[derive(Debug, Clone)]")?;
        writeln!(f, "pub struct {name} {{")?;
        writeln!(f, "    parent: {arc}<{root}>,")?;
        writeln!(f, "}}")?;
        writeln!(f)?;

        Receiver {
            name,
            parent: "self.parent",
            async_self: "&self".to_string(),
            clone_self: "self.clone()".to_string(),
        }
    };

    writeln!(f, "impl {} {{", receiver.name)?;
    f.shift_right();
    for endpoint in endpoints {
        let call = Call::new(f, spec, resolver, endpoint)?;
        log::debug!("emitting {} {} as {}", endpoint.method, endpoint.path, call.name);
        call.emit_sync(f, &receiver, endpoint)?;
        call.emit_async(f, &receiver)?;
    }
    f.shift_left();
    writeln!(f, "}}")?;
    writeln!(f)?;
    Ok(())
}

/// One parameter of a call
struct Param {
    kind: ParameterKind,
    /// Name in the document
    name: String,
    /// Local binding in the generated methods
    binding: String,
    typ: String,
}

/// The resolved signature of one endpoint
struct Call {
    name: String,
    doc: String,
    /// In declaration order
    params: Vec<Param>,
    response: String,
}

impl Call {
    fn new(
        f: &mut SourceFile,
        spec: &OpenApiContext,
        resolver: &TypeResolver<'_>,
        endpoint: &Endpoint<'_>,
    ) -> Result<Self> {
        let name = method_name(endpoint);
        let operation = endpoint.operation;
        let doc = operation
            .description
            .as_deref()
            .or(operation.summary.as_deref())
            .map(doc_comment)
            .unwrap_or_default();

        let mut taken: HashSet<String> = CALL_LOCALS.iter().map(|local| local.to_string()).collect();
        let mut params = Vec::with_capacity(endpoint.parameters.len());
        for parameter in &endpoint.parameters {
            let context = format!("{name}.{}", parameter.name());
            let schema = match &parameter.data.format {
                ParameterSchemaOrContent::Schema(schema) => schema,
                ParameterSchemaOrContent::Content(_) => {
                    return Err(Error::unsupported(
                        context,
                        "parameters described by content are not supported",
                    ));
                }
            };
            params.push(Param {
                kind: parameter.kind,
                name: parameter.name().to_string(),
                binding: unique_binding(parameter.name(), &mut taken),
                typ: resolver.type_name(f, schema, &context)?,
            });
        }

        let response = response_type(f, spec, resolver, endpoint, &name)?;
        Ok(Self {
            name,
            doc,
            params,
            response,
        })
    }

    fn signature_params(&self) -> String {
        self.params
            .iter()
            .map(|param| format!(", {}: {}", param.binding, param.typ))
            .collect()
    }

    /// The path template with parameters substituted, then the query suffix
    fn path_steps(&self, path: &str) -> Result<Vec<PathStep>> {
        let mut steps = Vec::new();
        for piece in split_path(path) {
            match piece {
                PathPiece::Text(text) => steps.push(PathStep::Text(text)),
                PathPiece::Param(name) => {
                    let param = self
                        .params
                        .iter()
                        .find(|param| param.kind == ParameterKind::Path && param.name == name)
                        .ok_or_else(|| {
                            Error::unsupported(
                                format!("{}.{name}", self.name),
                                "the path uses a parameter the operation does not declare",
                            )
                        })?;
                    steps.push(PathStep::Value(param.binding.clone()));
                }
            }
        }

        steps.push(PathStep::Text("?".to_string()));
        for param in &self.params {
            match param.kind {
                ParameterKind::Query => {
                    steps.push(PathStep::Text(format!("&{}=", param.name)));
                    steps.push(PathStep::Escaped(param.binding.clone()));
                }
                ParameterKind::Path => {}
                ParameterKind::Header | ParameterKind::Cookie => {
                    log::debug!("{:?} parameter {} of {} is not sent", param.kind, param.name, self.name);
                }
            }
        }
        Ok(steps)
    }

    fn emit_sync(
        &self,
        f: &mut SourceFile,
        receiver: &Receiver<'_>,
        endpoint: &Endpoint<'_>,
    ) -> Result<()> {
        let method = f.import_name("reqwest", "Method");
        let steps = self.path_steps(endpoint.path)?;
        let escape = if steps.iter().any(|step| matches!(step, PathStep::Escaped(_))) {
            f.import_name("url::form_urlencoded", "byte_serialize")
        } else {
            String::new()
        };

        write!(f, "{}", self.doc)?;
        writeln!(
            f,
            "pub async fn sync{}(&self, _ctx: {REQUEST_CONTEXT}{}) -> {RESULT}<{}, {ERROR_TYPE}> {{",
            self.name,
            self.signature_params(),
            self.response
        )?;
        f.shift_right();

        writeln!(f, "let mut _path = {STRING}::new();")?;
        for line in path_statements(steps, &escape) {
            writeln!(f, "{line}")?;
        }
        writeln!(
            f,
            "let _req = {}.newRequest(&_ctx, {method}::{}, &_path, \"{}\", \"{}\", None)?;",
            receiver.parent,
            endpoint.method.to_uppercase(),
            endpoint.content_type(),
            endpoint.accept_type()
        )?;
        writeln!(f, "let (_, _res) = {}.doJson(_req).await;", receiver.parent)?;
        writeln!(f, "_res")?;

        f.shift_left();
        writeln!(f, "}}")?;
        writeln!(f)?;
        Ok(())
    }

    fn emit_async(&self, f: &mut SourceFile, receiver: &Receiver<'_>) -> Result<()> {
        let spawn = f.import_name("tokio", "spawn");
        let args: String = self
            .params
            .iter()
            .map(|param| format!(", {}", param.binding))
            .collect();

        write!(f, "{}", self.doc)?;
        writeln!(
            f,
            "pub fn {}({}, _ctx: {REQUEST_CONTEXT}{}, _f: impl ::std::ops::FnOnce({RESULT}<{}, {ERROR_TYPE}>) + ::std::marker::Send + 'static) {{",
            self.name,
            receiver.async_self,
            self.signature_params(),
            self.response
        )?;
        f.shift_right();
        writeln!(f, "let _self = {};", receiver.clone_self)?;
        writeln!(f, "{spawn}(async move {{")?;
        writeln!(f, "    _f(_self.sync{}(_ctx{args}).await);", self.name)?;
        writeln!(f, "}});")?;
        f.shift_left();
        writeln!(f, "}}")?;
        writeln!(f)?;
        Ok(())
    }
}

/// The type of the `200` `application/json` response, or the untyped marker
fn response_type(
    f: &mut SourceFile,
    spec: &OpenApiContext,
    resolver: &TypeResolver<'_>,
    endpoint: &Endpoint<'_>,
    context: &str,
) -> Result<String> {
    let Some(response) = endpoint.operation.responses.responses.get(&StatusCode::Code(200)) else {
        return Ok(resolver.any_type(f));
    };
    let response = spec.resolve_response(response)?;
    match response
        .content
        .get("application/json")
        .and_then(|media| media.schema.as_ref())
    {
        Some(schema) => resolver.type_name(f, schema, &format!("{context} response")),
        None => Ok(resolver.any_type(f)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;
    use serde_json::json;

    fn spec(paths: serde_json::Value) -> OpenApiContext {
        let doc = json!({
            "openapi": "3.0.1",
            "info": {"title": "test", "version": "1"},
            "paths": paths,
            "components": {"schemas": {
                "Status": {"type": "object", "properties": {"Id": {"type": "integer"}}}
            }}
        });
        OpenApiContext::from_slice(doc.to_string().as_bytes()).unwrap()
    }

    fn emit(spec: &OpenApiContext) -> Result<SourceFile> {
        let options = Options::default();
        let resolver = TypeResolver::new(spec, &options);
        let mut f = SourceFile::new("blub", "test");
        emit_call_groups(&mut f, spec, &resolver, "TestService")?;
        Ok(f)
    }

    #[test]
    fn test_method_names() -> Result<()> {
        let spec = spec(json!({
            "/api/v1/setup/status": {"get": {"responses": {}}},
            "/users": {
                "post": {"summary": "Create a user", "responses": {}},
                "put": {"responses": {}}
            },
            "/items/{id}": {
                "post": {"summary": "Replace it", "responses": {}},
                "delete": {"responses": {}}
            }
        }));
        let names: Vec<(String, String)> = spec
            .endpoints()?
            .iter()
            .map(|e| (format!("{} {}", e.method, e.path), method_name(e)))
            .collect();
        let names: Vec<(&str, &str)> = names.iter().map(|(a, b)| (a.as_str(), b.as_str())).collect();
        assert_eq!(
            names,
            vec![
                ("get /api/v1/setup/status", "ApiV1SetupStatus"),
                ("delete /items/{id}", "DeleteItemsId"),
                ("post /items/{id}", "PostItemsId"),
                ("post /users", "CreateUsers"),
                ("put /users", "PutUsers"),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_split_path_order() {
        assert_eq!(
            split_path("/a/{x}/b/{y}"),
            vec![
                PathPiece::Text("/a/".to_string()),
                PathPiece::Param("x".to_string()),
                PathPiece::Text("/b/".to_string()),
                PathPiece::Param("y".to_string()),
            ]
        );
        assert_eq!(
            split_path("/a/{}/{not-a-param}/{id}"),
            vec![
                PathPiece::Text("/a/{}/{not-a-param}/".to_string()),
                PathPiece::Param("id".to_string()),
            ]
        );
    }

    #[test]
    fn test_path_statements_merge_text() {
        let steps = vec![
            PathStep::Text("/items/".to_string()),
            PathStep::Value("id".to_string()),
            PathStep::Text("?".to_string()),
            PathStep::Text("&q=".to_string()),
            PathStep::Escaped("q".to_string()),
            PathStep::Text("\"quoted\"".to_string()),
        ];
        assert_eq!(
            path_statements(steps, "byte_serialize"),
            vec![
                "_path.push_str(\"/items/\");",
                "_path.push_str(&formatParam(&id));",
                "_path.push_str(\"?&q=\");",
                "_path.extend(byte_serialize(formatParam(&q).as_bytes()));",
                "_path.push_str(\"\\\"quoted\\\"\");",
            ]
        );
    }

    #[test]
    fn test_tag_fan_out_and_default_group() -> Result<()> {
        let spec = spec(json!({
            "/multi": {"get": {"tags": ["b", "a"], "responses": {}}},
            "/plain": {"get": {"responses": {}}}
        }));
        let endpoints = spec.endpoints()?;
        let groups = group_endpoints(spec.title(), &endpoints);
        let keys: Vec<&str> = groups.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "b", "test"]);
        assert_eq!(groups["a"][0].path, "/multi");
        assert_eq!(groups["b"][0].path, "/multi");
        assert_eq!(groups["test"][0].path, "/plain");

        let f = emit(&spec)?;
        let body = f.body();
        let a = body.find("pub fn AService(self: &Arc<Self>) -> AService").unwrap();
        let b = body.find("pub fn BService(self: &Arc<Self>) -> BService").unwrap();
        assert!(a < b);
        assert_eq!(body.matches("pub async fn syncMulti(").count(), 2);

        // untagged calls live on the root service itself
        assert!(!body.contains("pub struct TestService"));
        assert!(body.contains("impl TestService {\n    pub async fn syncPlain(&self"));
        assert!(body.contains("pub fn Plain(self: &Arc<Self>, _ctx: RequestContext"));
        assert!(body.contains("let _req = self.newRequest("));
        Ok(())
    }

    #[test]
    fn test_sync_and_async_pair() -> Result<()> {
        let spec = spec(json!({
            "/items/{id}": {
                "get": {
                    "tags": ["items"],
                    "description": "Fetches one item.",
                    "parameters": [
                        {"name": "id", "in": "path", "required": true, "schema": {"type": "string"}},
                        {"name": "verbose", "in": "query", "schema": {"type": "boolean"}},
                        {"name": "type", "in": "query", "schema": {"type": "integer"}},
                        {"name": "trace", "in": "header", "schema": {"type": "string"}}
                    ],
                    "responses": {"200": {
                        "description": "ok",
                        "content": {"application/json": {"schema": {
                            "type": "array", "items": {"$ref": "#/components/schemas/Status"}
                        }}}
                    }}
                }
            }
        }));
        let f = emit(&spec)?;
        let body = f.body();

        assert!(body.contains(
            "    /// Fetches one item.\n    \
             pub async fn syncItemsId(&self, _ctx: RequestContext, id: ::std::string::String, verbose: bool, r#type: i64, trace: ::std::string::String) -> ::std::result::Result<::std::vec::Vec<Status>, Error> {\n        \
             let mut _path = ::std::string::String::new();\n        \
             _path.push_str(\"/items/\");\n        \
             _path.push_str(&formatParam(&id));\n        \
             _path.push_str(\"?&verbose=\");\n        \
             _path.extend(byte_serialize(formatParam(&verbose).as_bytes()));\n        \
             _path.push_str(\"&type=\");\n        \
             _path.extend(byte_serialize(formatParam(&r#type).as_bytes()));\n        \
             let _req = self.parent.newRequest(&_ctx, Method::GET, &_path, \"\", \"application/json\", None)?;\n        \
             let (_, _res) = self.parent.doJson(_req).await;\n        \
             _res\n    \
             }\n"
        ));
        assert!(body.contains(
            "pub fn ItemsId(&self, _ctx: RequestContext, id: ::std::string::String, verbose: bool, r#type: i64, trace: ::std::string::String, \
             _f: impl ::std::ops::FnOnce(::std::result::Result<::std::vec::Vec<Status>, Error>) + ::std::marker::Send + 'static) {\n        \
             let _self = self.clone();\n        \
             spawn(async move {\n            \
             _f(_self.syncItemsId(_ctx, id, verbose, r#type, trace).await);\n        \
             });\n    \
             }\n"
        ));

        let imports = f.import_block();
        assert!(imports.contains("use tokio::spawn;\n"));
        assert!(imports.contains("use url::form_urlencoded::byte_serialize;\n"));
        Ok(())
    }

    #[test]
    fn test_untyped_response_and_bare_query() -> Result<()> {
        let spec = spec(json!({
            "/ping": {"post": {"tags": ["health"], "responses": {"204": {"description": "none"}}}}
        }));
        let f = emit(&spec)?;
        assert!(f.body().contains("-> ::std::result::Result<Value, Error> {"));
        assert!(f.body().contains("let mut _path = ::std::string::String::new();\n        _path.push_str(\"/ping?\");\n"));
        assert!(f.import_block().contains("use serde_json::Value;\n"));
        assert!(!f.import_block().contains("byte_serialize"));
        Ok(())
    }

    #[test]
    fn test_content_parameter_is_unsupported() {
        let spec = spec(json!({
            "/q": {"get": {
                "parameters": [{"name": "filter", "in": "query", "content": {"application/json": {}}}],
                "responses": {}
            }}
        }));
        let err = emit(&spec).err().unwrap();
        assert!(matches!(err, Error::UnsupportedSchema { ref name, .. } if name == "Q.filter"));
    }

    #[test]
    fn test_bindings_never_clash() -> Result<()> {
        let spec = spec(json!({
            "/items/{id}": {"get": {
                "tags": ["items"],
                "parameters": [
                    {"name": "id", "in": "path", "required": true, "schema": {"type": "string"}},
                    {"name": "id", "in": "header", "schema": {"type": "string"}},
                    {"name": "f", "in": "query", "schema": {"type": "string"}},
                    {"name": "_f", "in": "query", "schema": {"type": "string"}},
                    {"name": "_ctx", "in": "query", "schema": {"type": "string"}},
                    {"name": "X-Trace", "in": "header", "schema": {"type": "string"}},
                    {"name": "X_Trace", "in": "header", "schema": {"type": "string"}}
                ],
                "responses": {}
            }}
        }));
        let f = emit(&spec)?;
        let body = f.body();

        assert!(body.contains(
            "pub async fn syncItemsId(&self, _ctx: RequestContext, id: ::std::string::String, id2: ::std::string::String, \
             f: ::std::string::String, _f2: ::std::string::String, _ctx2: ::std::string::String, \
             X_Trace: ::std::string::String, X_Trace2: ::std::string::String)"
        ));
        assert!(body.contains("_path.push_str(&formatParam(&id));"));
        assert!(body.contains("_path.push_str(\"?&f=\");\n        _path.extend(byte_serialize(formatParam(&f).as_bytes()));"));
        assert!(body.contains("_path.push_str(\"&_f=\");\n        _path.extend(byte_serialize(formatParam(&_f2).as_bytes()));"));
        assert!(body.contains("_path.push_str(\"&_ctx=\");\n        _path.extend(byte_serialize(formatParam(&_ctx2).as_bytes()));"));
        assert!(body.contains("_f(_self.syncItemsId(_ctx, id, id2, f, _f2, _ctx2, X_Trace, X_Trace2).await);"));
        Ok(())
    }

    #[test]
    fn test_undeclared_path_parameter_is_unsupported() {
        let spec = spec(json!({
            "/items/{id}": {"get": {"tags": ["items"], "responses": {}}}
        }));
        let err = emit(&spec).err().unwrap();
        assert!(matches!(err, Error::UnsupportedSchema { ref name, .. } if name == "ItemsId.id"));
    }

    #[test]
    fn test_unique_binding() {
        let mut taken: HashSet<String> = CALL_LOCALS.iter().map(|local| local.to_string()).collect();
        assert_eq!(unique_binding("type", &mut taken), "r#type");
        assert_eq!(unique_binding("type", &mut taken), "type2");
        assert_eq!(unique_binding("_path", &mut taken), "_path2");
        assert_eq!(unique_binding("self", &mut taken), "self_");
        assert_eq!(unique_binding("self_", &mut taken), "self_2");
    }
}
