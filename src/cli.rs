//! Minimal CLI: service description → sub-clients, typed values → plain JSON
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;

use client_gen_core::clients::{ClientTree, PromotionRule};
use client_gen_core::lower::{lower_description, ContainerDecl};
use client_gen_core::normalize::{decode_typed_value, get_value_type_value, property_defaults};
use client_gen_core::path_de::from_value_with_path;
use client_gen_core::semantic::{ContainerKind, ModelDecl};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// resolve SDK client hierarchies and normalize default values from a compiled service model
#[derive(Parser, Debug)]
#[command(name = "client-gen", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// list the sub-clients of a client in each service description
    Clients(ClientsOut),
    /// normalize typed value documents into plain JSON
    Values(ValuesOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /service)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(clap::Parser, Debug)]
struct ClientsOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// qualified name of the client to expand (e.g. `A.AA`); the root client if omitted
    #[arg(long)]
    client: Option<String>,

    /// list every descendant in level order instead of direct children only
    #[arg(long, short)]
    recursive: bool,

    /// which nested namespaces/interfaces become clients
    #[arg(long, value_enum, default_value_t = PromotionRule::AllNested)]
    rule: PromotionRule,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct ValuesOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// inputs are model documents; emit the normalized default of each property
    #[arg(long)]
    model: bool,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

/// One input document after pointer selection / jq expansion.
#[derive(Debug, Clone)]
struct Document {
    source: String,
    value: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientsReport {
    source: String,
    client: String,
    sub_clients: Vec<SubClientEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubClientEntry {
    name: String,
    qualified_name: String,
    kind: &'static str,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_documents(&self) -> Result<Vec<Document>> {
        let source_paths = expand_inputs(&self.input)?;

        let mut out = Vec::new();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file ({source_path_str})"))?;

            let mut raw = Vec::new();
            if self.ndjson {
                for (line_no, line) in source.lines().enumerate().filter(|(_, l)| !l.trim().is_empty()) {
                    let value = serde_json::from_str::<Value>(line).with_context(|| {
                        format!("failed to parse JSON ({source_path_str}:{})", line_no + 1)
                    })?;
                    raw.push((format!("{source_path_str}:{}", line_no + 1), value));
                }
            } else {
                let value = serde_json::from_str::<Value>(&source)
                    .with_context(|| format!("failed to parse JSON source file ({source_path_str})"))?;
                raw.push((source_path_str, value));
            }

            for (label, value) in raw {
                out.extend(self.select(label, value)?);
            }
        }
        tracing::debug!(documents = out.len(), "loaded input documents");
        Ok(out)
    }

    fn select(&self, label: String, value: Value) -> Result<Vec<Document>> {
        let value = match self.json_pointer.as_deref() {
            None => value,
            Some(ptr) => value
                .pointer(ptr)
                .cloned()
                .ok_or_else(|| anyhow!("JSON pointer `{ptr}` selects nothing in {label}"))?,
        };
        match self.jq_expr.as_ref() {
            None => Ok(vec![Document { source: label, value }]),
            Some(jq_expr) => {
                let docs = crate::jq_exec::run_jaq(jq_expr, &value)
                    .with_context(|| format!("failed to apply jq expression to {label}"))?;
                Ok(docs
                    .into_iter()
                    .map(|value| Document { source: label.clone(), value })
                    .collect())
            }
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Clients(target) => {
                let docs = target.input_settings.load_documents()?;
                let reports = docs
                    .par_iter()
                    .map(|doc| clients_report(doc, target))
                    .collect::<Result<Vec<_>>>()?;

                let rendered = match target.format {
                    OutputFormat::Json => serde_json::to_string_pretty(&reports)?,
                    OutputFormat::Text => render_text(&reports),
                };
                write_output(target.out.as_deref(), &rendered)
            }
            Command::Values(target) => {
                let docs = target.input_settings.load_documents()?;
                let values = docs
                    .par_iter()
                    .map(|doc| normalize_document(doc, target.model))
                    .collect::<Result<Vec<_>>>()?;

                let rendered = match values.as_slice() {
                    [single] => serde_json::to_string_pretty(single)?,
                    _ => serde_json::to_string_pretty(&values)?,
                };
                write_output(target.out.as_deref(), &rendered)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn clients_report(doc: &Document, target: &ClientsOut) -> Result<ClientsReport> {
    let decl: ContainerDecl = from_value_with_path(doc.value.clone())
        .with_context(|| format!("{} is not a service description", doc.source))?;
    let graph = lower_description(&decl);
    let tree = ClientTree::build(&graph, target.rule);

    let selected = match target.client.as_deref() {
        Some(name) => tree
            .find(name)
            .ok_or_else(|| anyhow!("no client named `{name}` in {}", doc.source))?,
        None => tree
            .roots()
            .next()
            .ok_or_else(|| anyhow!("{} has no root client", doc.source))?,
    };

    let subs = tree.list_sub_clients(selected.id, target.recursive)?;
    let mut sub_clients = Vec::with_capacity(subs.len());
    for sub in subs {
        let kind = match graph.container(sub.container).map(|c| c.kind) {
            Some(ContainerKind::Namespace) => "namespace",
            Some(ContainerKind::Interface) => "interface",
            None => bail!("client `{}` lost its container", sub.name),
        };
        sub_clients.push(SubClientEntry {
            name: sub.name.clone(),
            qualified_name: tree.qualified_name(sub.id).unwrap_or_else(|| sub.name.clone()),
            kind,
        });
    }

    Ok(ClientsReport {
        source: doc.source.clone(),
        client: tree.qualified_name(selected.id).unwrap_or_else(|| selected.name.clone()),
        sub_clients,
    })
}

fn normalize_document(doc: &Document, model: bool) -> Result<Value> {
    if model {
        let decl: ModelDecl = from_value_with_path(doc.value.clone())
            .with_context(|| format!("{} is not a model document", doc.source))?;
        let defaults = property_defaults(&decl)
            .into_iter()
            .map(|(k, v)| (k, Value::from(v)))
            .collect::<serde_json::Map<_, _>>();
        Ok(Value::Object(defaults))
    } else {
        let typed = decode_typed_value(doc.value.clone())
            .with_context(|| format!("{} is not a typed value", doc.source))?;
        Ok(Value::from(get_value_type_value(&typed)))
    }
}

fn render_text(reports: &[ClientsReport]) -> String {
    let mut out = String::new();
    for report in reports {
        out.push_str(&format!("{} {}\n", report.client.bold(), format!("({})", report.source).dimmed()));
        if report.sub_clients.is_empty() {
            out.push_str(&format!("  {}\n", "no sub-clients".dimmed()));
        }
        for sub in &report.sub_clients {
            out.push_str(&format!("  {} {}\n", sub.qualified_name, sub.kind.dimmed()));
        }
    }
    out
}

fn write_output(out: Option<&Path>, rendered: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(out, rendered)
                .with_context(|| format!("failed to write {}", out.display()))
        }
        None => {
            println!("{rendered}");
            Ok(())
        }
    }
}

/// Literal paths pass through untouched; anything with glob syntax must
/// match at least one file.
fn expand_inputs(inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::with_capacity(inputs.len());
    for input in inputs {
        if !input.contains(['*', '?', '[', '{']) {
            out.push(PathBuf::from(input));
            continue;
        }
        let before = out.len();
        for entry in glob::glob(input).with_context(|| format!("bad glob pattern `{input}`"))? {
            out.push(entry.with_context(|| format!("unreadable match for `{input}`"))?);
        }
        if out.len() == before {
            bail!("glob pattern matched no files: {input}");
        }
    }
    Ok(out)
}
