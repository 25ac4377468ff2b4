//! Append-only source buffer for the generated file.
//!
//! Text is written through [`std::fmt::Write`] (`write!`/`writeln!`), external
//! symbols are requested through [`SourceFile::import_name`], and
//! [`SourceFile::format_string`] composes header, sorted imports and body and
//! runs the result through `syn` and `prettyplease`.

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;

use crate::utils::comment;
use crate::Error;

const INDENT: &str = "    ";

/// Prelude names an import alias must not shadow
const PRELUDE_NAMES: &[&str] = &[
    "Box", "Err", "FnOnce", "Into", "None", "Ok", "Option", "Result", "Send", "Sized", "Some",
    "String", "Sync", "Vec",
];

/// The generated file while it is being assembled
#[derive(Debug)]
pub struct SourceFile {
    package: String,
    generator: String,
    indent: usize,
    at_line_start: bool,
    /// import path -> local alias, in request order
    imports: IndexMap<String, String>,
    /// aliases in use plus names declared by the file itself
    taken: HashSet<String>,
    body: String,
}

impl SourceFile {
    /// Create an empty buffer announcing `package`, generated by `generator`
    pub fn new(package: impl Into<String>, generator: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            generator: generator.into(),
            indent: 0,
            at_line_start: true,
            imports: IndexMap::new(),
            taken: PRELUDE_NAMES.iter().map(|name| name.to_string()).collect(),
            body: String::new(),
        }
    }

    /// Mark a name as declared locally so that no import alias shadows it
    pub fn reserve(&mut self, name: impl Into<String>) {
        self.taken.insert(name.into());
    }

    /// Record `source` for import and return the local reference to `symbol`.
    ///
    /// With an empty `symbol` the module itself is imported (`use source;`)
    /// and an empty string is returned. The first request for a symbol decides
    /// its alias; later requests return the same one.
    pub fn import_name(&mut self, source: &str, symbol: &str) -> String {
        if symbol.is_empty() {
            if !self.imports.contains_key(source) {
                let alias = last_segment(source).to_string();
                self.taken.insert(alias.clone());
                self.imports.insert(source.to_string(), alias);
            }
            return String::new();
        }

        let path = format!("{source}::{symbol}");
        if let Some(alias) = self.imports.get(&path) {
            return alias.clone();
        }

        let mut alias = symbol.to_string();
        let mut n = 2;
        while self.taken.contains(&alias) {
            alias = format!("{symbol}{n}");
            n += 1;
        }
        self.taken.insert(alias.clone());
        self.imports.insert(path, alias.clone());
        alias
    }

    /// Indent following lines one level deeper
    pub fn shift_right(&mut self) {
        self.indent += 1;
    }

    /// Undo one [`SourceFile::shift_right`]
    pub fn shift_left(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    /// The raw body written so far
    pub fn body(&self) -> &str {
        &self.body
    }

    /// The `use` items, sorted by path
    pub fn import_block(&self) -> String {
        let mut paths: Vec<(&String, &String)> = self.imports.iter().collect();
        paths.sort_unstable();

        let mut out = String::new();
        for (path, alias) in paths {
            if last_segment(path) == alias {
                out.push_str(&format!("use {path};\n"));
            } else {
                out.push_str(&format!("use {path} as {alias};\n"));
            }
        }
        out
    }

    /// The unformatted file: header, imports and body
    pub fn unformatted(&self) -> String {
        format!(
            "//! Package `{}` is a generated client. See the types and services below.\n\
             #![allow(non_snake_case, dead_code, unused_variables, clippy::all)]\n\n{}\n{}",
            self.package,
            self.import_block(),
            self.body
        )
    }

    /// Compose and pretty-print the file.
    ///
    /// Fails with [`Error::Format`] carrying the unformatted text if the
    /// accumulated source is not valid Rust.
    pub fn format_string(&self) -> crate::Result<String> {
        let text = self.unformatted();
        let file = syn::parse_file(&text).map_err(|e| Error::Format {
            message: e.to_string(),
            source_text: text.clone(),
        })?;

        let mut out = comment(&format!(
            "Code generated by {}. DO NOT EDIT.",
            self.generator
        ));
        out.push_str(&prettyplease::unparse(&file));
        Ok(out)
    }
}

impl fmt::Write for SourceFile {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for line in s.split_inclusive('\n') {
            if self.at_line_start && line != "\n" {
                for _ in 0..self.indent {
                    self.body.push_str(INDENT);
                }
            }
            self.body.push_str(line);
            self.at_line_start = line.ends_with('\n');
        }
        Ok(())
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}
