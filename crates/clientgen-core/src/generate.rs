//! Client generation: render a document into one source file and write it
//! into the surrounding cargo package.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::{
    config::Options,
    emit::{
        calls::{group_endpoints, group_name},
        emit_api_root, emit_call_groups, emit_types,
        root::{root_name, REQUEST_CONTEXT},
        types::{declared_names, ERROR_TYPE},
    },
    error::{Error, Result},
    openapi::OpenApiContext,
    resolver::TypeResolver,
    source::SourceFile,
    templates::ERROR_MODEL_IMPORTS,
};

/// Generator name announced in the provenance line
pub const TOOL_NAME: &str = "clientgen";

/// File name of the generated client
pub const OUTPUT_FILE: &str = "openapiclient.gen.rs";

/// File marking the root of a cargo package
pub const MODULE_MARKER: &str = "Cargo.toml";

/// Functions of the api root that imports must not shadow
const ROOT_FUNCTIONS: &[&str] = &["ParseError", "AsError", "formatParam"];

/// Primitive types a declared record must not shadow
const PRIMITIVES: &[&str] = &[
    "bool", "char", "f32", "f64", "i8", "i16", "i32", "i64", "i128", "isize", "str", "u8", "u16",
    "u32", "u64", "u128", "usize",
];

/// Render the client for a JSON or YAML document
pub fn render(spec: &[u8], options: &Options) -> Result<String> {
    let spec = OpenApiContext::from_slice(spec).map_err(|e| e.context("unable to parse document"))?;
    render_document(&spec, options)
}

/// Render the client for an already parsed document
pub fn render_document(spec: &OpenApiContext, options: &Options) -> Result<String> {
    options.validate()?;

    let resolver = TypeResolver::new(spec, options);
    let mut f = SourceFile::new(&options.target_package_name, TOOL_NAME);
    reserve_names(&mut f, spec, &resolver)?;

    emit_types(&mut f, spec, &resolver).map_err(|e| e.context("unable to emit types"))?;
    let root = emit_api_root(&mut f, spec).map_err(|e| e.context("unable to emit api root"))?;
    emit_call_groups(&mut f, spec, &resolver, &root)
        .map_err(|e| e.context("unable to emit call groups"))?;

    f.format_string()
}

/// Reserve every name the file declares itself.
///
/// A component schema may not take a name the generator declares or imports
/// as a module, as the file would then declare it twice.
fn reserve_names(f: &mut SourceFile, spec: &OpenApiContext, resolver: &TypeResolver<'_>) -> Result<()> {
    let root = root_name(spec.title());
    let endpoints = spec
        .endpoints()
        .map_err(|e| e.context("unable to emit call groups"))?;

    let mut generated: Vec<String> = vec![REQUEST_CONTEXT.to_string(), format!("New{root}")];
    generated.extend(ROOT_FUNCTIONS.iter().map(|name| name.to_string()));
    generated.extend(group_endpoints(spec.title(), &endpoints).keys().map(|tag| group_name(tag)));
    generated.push(root);
    let modules = ERROR_MODEL_IMPORTS
        .iter()
        .map(|module| module.rsplit("::").next().unwrap_or(*module));

    for name in declared_names(spec, resolver) {
        if generated.iter().any(|g| g == name) {
            return Err(Error::unsupported(name, "the name is taken by the generated client")
                .context("unable to emit types"));
        }
        if modules.clone().chain(PRIMITIVES.iter().copied()).any(|m| m == name) {
            return Err(Error::unsupported(name, "the name shadows a module or primitive type")
                .context("unable to emit types"));
        }
        f.reserve(name);
    }

    f.reserve(ERROR_TYPE);
    for name in generated {
        f.reserve(name);
    }
    Ok(())
}

/// Render the client and write it below `module_root`.
///
/// Nothing is written unless rendering succeeds. Returns the written file.
pub async fn generate_at<P: AsRef<Path>>(module_root: P, spec: &[u8], options: &Options) -> Result<PathBuf> {
    let text = render(spec, options)?;
    write_output(module_root.as_ref(), options, &text).await
}

/// Like [`generate_at`] for an already parsed document
pub async fn generate_document_at<P: AsRef<Path>>(
    module_root: P,
    spec: &OpenApiContext,
    options: &Options,
) -> Result<PathBuf> {
    let text = render_document(spec, options)?;
    write_output(module_root.as_ref(), options, &text).await
}

/// Render the client into the cargo package containing the working directory
pub async fn generate(spec: &[u8], options: &Options) -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    let module_root = find_module_root(&cwd)?;
    generate_at(module_root, spec, options).await
}

/// Nearest directory at or above `start` containing a `Cargo.toml`
pub fn find_module_root(start: &Path) -> Result<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(MODULE_MARKER).is_file())
        .map(Path::to_path_buf)
        .ok_or_else(|| Error::ModuleRoot {
            cwd: start.to_path_buf(),
        })
}

/// Where the client for `module_root` goes
pub fn output_path(module_root: &Path, options: &Options) -> PathBuf {
    module_root.join(&options.target_directory).join(OUTPUT_FILE)
}

async fn write_output(module_root: &Path, options: &Options, text: &str) -> Result<PathBuf> {
    let path = output_path(module_root, options);
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).await?;
    }
    fs::write(&path, text).await?;
    log::info!("wrote {} ({} bytes)", path.display(), text.len());
    Ok(path)
}
