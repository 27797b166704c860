//! CLI: schema documents → (Java sources | registry dump)
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{ArgAction, Args, Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;

use crate::codegen::{self, Codegen};
use crate::config::GeneratorConfig;
use crate::lower::TypeMapper;
use crate::registry::Report;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate typed Java bindings (contract interface + parsing class per object)
/// from JSON-Schema / OpenAPI documents
#[derive(Parser, Debug)]
#[command(name = "json-bindgen", version)]
pub struct CommandLineInterface {
    /// more logging; repeat for more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// errors only
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// classify, resolve and emit Java source units
    Generate(GenerateOut),
    /// classify and resolve, then print the node registry as JSON
    Registry(RegistryOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JSON Pointer selecting the schema (map) inside each document (e.g. /components/schemas)
    #[arg(long)]
    json_pointer: Option<String>,

    /// jq filter selecting the schema (map); each output is generated separately
    #[arg(long, conflicts_with = "json_pointer")]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct GenerateOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output root; units land under <out>/<package path>/ (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// JSON generator config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Java package of the generated units
    #[arg(long)]
    package: Option<String>,

    /// type name used when the document root is itself a schema
    #[arg(long)]
    root_type: Option<String>,

    /// add `@Generated` with a timestamp to every unit
    #[arg(long)]
    stamp: bool,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct RegistryOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// type name used when the document root is itself a schema
    #[arg(long)]
    root_type: Option<String>,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

/// One selected schema document.
#[derive(Debug)]
struct Document {
    source: PathBuf,
    base: String, // canonical pointer of the selected root
    value: Value,
}

#[derive(Debug, Serialize)]
struct RegistryDump {
    source: String,
    nodes: Vec<RegistryEntry>,
    report: Report,
}

#[derive(Debug, Serialize)]
struct RegistryEntry {
    pointer: String,
    kind: &'static str,
    type_name: String,
    java_type: String,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_documents(&self) -> Result<Vec<Document>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        let mut out = Vec::new();
        for source_path in source_paths {
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {}", source_path.display()))?;
            let value = serde_json::from_str::<Value>(&source)
                .with_context(|| format!("failed to parse JSON source file {}", source_path.display()))?;

            if let Some(pointer) = self.json_pointer.as_deref() {
                let selected = value
                    .pointer(pointer)
                    .ok_or_else(|| anyhow!("json pointer {pointer} not found in {}", source_path.display()))?;
                out.push(Document { source: source_path.clone(), base: format!("#{pointer}"), value: selected.clone() });
            } else if let Some(jq_expr) = self.jq_expr.as_deref() {
                let selected = crate::jq_exec::run_jaq(jq_expr, &value).with_context(|| {
                    format!("failed to apply jq expression to source file {}", source_path.display())
                })?;
                for value in selected {
                    out.push(Document { source: source_path.clone(), base: "#".into(), value });
                }
            } else {
                out.push(Document { source: source_path, base: "#".into(), value });
            }
        }
        Ok(out)
    }
}

impl GenerateOut {
    fn config(&self) -> Result<GeneratorConfig> {
        let mut config = match self.config.as_deref() {
            Some(path) => GeneratorConfig::load(path)?,
            None => GeneratorConfig::default(),
        };
        if let Some(package) = &self.package {
            config.package = package.clone();
        }
        if let Some(root_type) = &self.root_type {
            config.root_type = root_type.clone();
        }
        if self.stamp {
            config.stamp_generated = true;
        }
        config.validate()?;
        Ok(config)
    }

    fn run(&self) -> Result<()> {
        let config = self.config()?;
        if self.no_op {
            eprintln!("{self:#?}\n{config:#?}");
            return Ok(());
        }
        for doc in self.input_settings.load_documents()? {
            let generated = crate::generate(&doc.value, &doc.base, &config)
                .with_context(|| format!("failed to generate sources from {}", doc.source.display()))?;
            match self.out.as_deref() {
                Some(out) => {
                    let written = codegen::write_units(&generated.units, out, &config)?;
                    eprintln!(
                        "{} {} files from {} into {}",
                        "generated".green().bold(),
                        written.len(),
                        doc.source.display(),
                        out.join(config.package_dir()).display(),
                    );
                }
                None => {
                    for unit in &generated.units {
                        println!("// ---- {} ----", unit.file_name);
                        println!("{}", unit.contents);
                    }
                }
            }
        }
        Ok(())
    }
}

impl RegistryOut {
    fn run(&self) -> Result<()> {
        let mut config = GeneratorConfig::default();
        if let Some(root_type) = &self.root_type {
            config.root_type = root_type.clone();
        }
        let mut dumps = Vec::new();
        for doc in self.input_settings.load_documents()? {
            let dump = registry_dump(&doc, &config)
                .with_context(|| format!("failed to build registry for {}", doc.source.display()))?;
            dumps.push(dump);
        }
        let src = serde_json::to_string_pretty(&dumps)?;
        write_or_print(self.out.as_deref(), &src)
    }
}

fn registry_dump(doc: &Document, config: &GeneratorConfig) -> crate::GenResult<RegistryDump> {
    let schema = crate::load_schema(&doc.value, &doc.base, config)?;
    let mapper = TypeMapper::new(&schema);
    let mut nodes = Vec::with_capacity(schema.registry().len());
    for node in schema.registry().nodes() {
        nodes.push(RegistryEntry {
            pointer: node.pointer().to_string(),
            kind: node.kind_name(),
            type_name: node.type_name().to_string(),
            java_type: mapper.target_type(node)?.render(false),
        });
    }
    // every emittable object must also survive emission
    Codegen::new(&schema, config).emit_all()?;
    Ok(RegistryDump {
        source: doc.source.display().to_string(),
        nodes,
        report: schema.report().clone(),
    })
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    /// Default log filter for the `-v` / `-q` flags.
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Generate(target) => target.run(),
            Command::Registry(target) => target.run(),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_or_print(out: Option<&Path>, src: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, src).with_context(|| format!("failed to write {}", out.display()))?;
            eprintln!("{} {}", "wrote".green().bold(), out.display());
        }
        None => println!("{src}"),
    }
    Ok(())
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
