//! clientgen CLI entrypoint
//! Parses command-line arguments and dispatches to the core generator.

// Internal imports (std, crate)
use std::path::PathBuf;

// External imports (alphabetized)
use anyhow::Context;
use clap::Parser;
use clientgen_core::{generate, openapi::OpenApiContext, Options};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "clientgen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Generate a typed http client from an OpenAPI spec
    Generate {
        /// Path or URL to OpenAPI schema (YAML or JSON)
        ///
        /// Can be a local file path or an HTTP/HTTPS URL
        /// Example: --schema-path path/to/schema.yaml
        /// Example: --schema-path https://example.com/openapi.json
        #[arg(long)]
        schema_path: String,
        /// Options file (YAML, or TOML with a .toml extension)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Directory of the generated file, relative to the module root
        #[arg(long)]
        target_dir: Option<String>,
        /// Module name the generated file announces
        #[arg(long)]
        package: Option<String>,
        /// Honor this x-ee.type name instead of generating the type (repeatable)
        #[arg(long = "use-reference")]
        use_references: Vec<String>,
        /// Cargo package to write into (default: discovered from the working directory)
        #[arg(long)]
        module_root: Option<PathBuf>,
        /// Print the generated source to stdout instead of writing it
        #[arg(long)]
        print: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging; RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Generate {
            schema_path,
            config,
            target_dir,
            package,
            use_references,
            module_root,
            print,
        } => {
            // Flags win over the options file
            let mut options = match &config {
                Some(path) => Options::from_file(path)
                    .await
                    .with_context(|| format!("Failed to load options from {}", path.display()))?,
                None => Options::default(),
            };
            if let Some(target_dir) = target_dir {
                options.target_directory = target_dir;
            }
            if let Some(package) = package {
                options.target_package_name = package;
            }
            options.use_references.extend(use_references);
            options.validate().context("Invalid options")?;

            tracing::info!("Loading OpenAPI schema from: {}", schema_path);
            let spec = OpenApiContext::from_file_or_url(&schema_path)
                .await
                .with_context(|| format!("Failed to load OpenAPI schema from {schema_path}"))?;

            if print {
                let text = generate::render_document(&spec, &options)
                    .context("Failed to generate client")?;
                print!("{text}");
                return Ok(());
            }

            let module_root = match module_root {
                Some(dir) => dir,
                None => {
                    let cwd = std::env::current_dir()?;
                    generate::find_module_root(&cwd)?
                }
            };
            let path = generate::generate_document_at(&module_root, &spec, &options)
                .await
                .context("Failed to generate client")?;

            println!("✅ Successfully generated client in: {}", path.display());
        }
    }
    Ok(())
}
