//! Renders the clients under test from the generator's test documents.

use std::path::PathBuf;
use std::{env, fs};

use clientgen_core::{render, Options};

/// Module name and document of every rendered client
const CLIENTS: &[(&str, &str)] = &[("setup", "setup.json"), ("shop", "items.yaml")];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let fixtures = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?).join("../clientgen-core/tests/fixtures");
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);

    let mut modules = String::new();
    for (module, document) in CLIENTS {
        let source = fixtures.join(document);
        println!("cargo:rerun-if-changed={}", source.display());

        let text = render(&fs::read(&source)?, &Options::new("", *module))?;
        let target = out_dir.join(format!("{module}.gen.rs"));
        fs::write(&target, text)?;
        modules.push_str(&format!(
            "#[path = {:?}]\npub mod {module};\n",
            target.display().to_string()
        ));
    }
    fs::write(out_dir.join("clients.rs"), modules)?;
    Ok(())
}
