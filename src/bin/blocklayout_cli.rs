//! BlockLayout CLI - Bridge interface for layout tooling
//!
//! Commands: show, reconcile
//! Outputs JSON to stdout
//! Returns non-zero on build or reconciliation failure

use clap::{Parser, Subcommand};
use indexmap::IndexMap;
use serde::Deserialize;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use blocklayout_core::{
    find_view, merge_attributes, merge_context, reconcile, AttrDefault, BlockTree, FormView,
    FormViewHandle, NodeId, ProcessedFieldMap, TreeError, Value,
};

#[derive(Parser)]
#[command(name = "blocklayout-cli")]
#[command(about = "BlockLayout CLI - Block-View Layout Engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the view tree and print it
    Show {
        /// JSON payload (RenderPass)
        #[arg(short, long)]
        payload: String,
    },

    /// Build the view tree, run finish-phase reconciliation, report fields
    Reconcile {
        /// JSON payload (RenderPass)
        #[arg(short, long)]
        payload: String,
    },
}

/// One self-contained render pass: layout description, context variables,
/// optional form structure and the processed-field map.
#[derive(Deserialize)]
struct RenderPass {
    layout: NodeSpec,
    #[serde(default)]
    context: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    form: Option<FormSpec>,
    /// Block id carrying the form view; defaults to the root.
    #[serde(default)]
    form_block: Option<String>,
    #[serde(default)]
    processed_fields: ProcessedFieldMap,
}

#[derive(Deserialize)]
struct NodeSpec {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    vars: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    attr: serde_json::Map<String, serde_json::Value>,
    /// Raw defaults; `~`-prefixed keys mark appendable entries.
    #[serde(default)]
    defaults: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    children: Vec<NodeSpec>,
}

#[derive(Deserialize)]
struct FormSpec {
    name: String,
    #[serde(default)]
    multipart: bool,
    #[serde(default)]
    children: Vec<FormSpec>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let (payload, reconcile_pass) = match cli.command {
        Commands::Show { payload } => (payload, false),
        Commands::Reconcile { payload } => (payload, true),
    };

    let pass: RenderPass = match serde_json::from_str(&payload) {
        Ok(p) => p,
        Err(e) => {
            eprintln!(r#"{{"error": "Invalid payload: {}"}}"#, e);
            return ExitCode::FAILURE;
        }
    };

    let (mut tree, form) = match build_pass(&pass) {
        Ok(built) => built,
        Err(e) => {
            eprintln!(r#"{{"error": "{}"}}"#, e);
            return ExitCode::FAILURE;
        }
    };

    // Context variables flow into the whole tree before finishing
    if !pass.context.is_empty() {
        let vars: IndexMap<String, Value> = pass
            .context
            .iter()
            .map(|(k, v)| (k.clone(), Value::from(v.clone())))
            .collect();
        let root = tree.root();
        merge_context(&mut tree, root, &vars);
    }

    if !reconcile_pass {
        let output = serde_json::json!({ "tree": tree_json(&tree, tree.root()) });
        println!("{}", serde_json::to_string_pretty(&output).unwrap());
        return ExitCode::SUCCESS;
    }

    let Some(form) = form else {
        eprintln!(r#"{{"error": "Reconciliation requires a form structure"}}"#);
        return ExitCode::FAILURE;
    };

    let form_block = match &pass.form_block {
        Some(id) => match tree.find(id) {
            Some(node) => node,
            None => {
                eprintln!(r#"{{"error": "Unknown form block: {}"}}"#, id);
                return ExitCode::FAILURE;
            }
        },
        None => tree.root(),
    };

    match reconcile(&tree, form_block, &pass.processed_fields) {
        Ok(()) => {
            let fields: Vec<_> = pass
                .processed_fields
                .keys()
                .map(|path| {
                    let rendered = find_view(&form, path).map(|v| v.is_rendered());
                    serde_json::json!({
                        "field": path,
                        "marked_rendered": rendered,
                    })
                })
                .collect();
            let output = serde_json::json!({
                "success": true,
                "fields": fields,
                "tree": tree_json(&tree, tree.root()),
            });
            println!("{}", serde_json::to_string_pretty(&output).unwrap());
            ExitCode::SUCCESS
        }
        Err(e) => {
            let output = serde_json::json!({
                "success": false,
                "error": e.to_string(),
            });
            println!("{}", serde_json::to_string(&output).unwrap());
            ExitCode::from(2) // topology inconsistency
        }
    }
}

fn build_pass(pass: &RenderPass) -> Result<(BlockTree, Option<FormViewHandle>), TreeError> {
    let mut tree = BlockTree::new(pass.layout.id.as_str());
    let root = tree.root();
    build_node(&mut tree, root, &pass.layout)?;

    let form = pass.form.as_ref().map(build_form);
    if let Some(form) = &form {
        let form_block = pass
            .form_block
            .as_deref()
            .and_then(|id| tree.find(id))
            .unwrap_or(root);
        tree.set_var(form_block, "form", Value::Form(form.clone()));
    }
    Ok((tree, form))
}

fn build_node(tree: &mut BlockTree, node: NodeId, spec: &NodeSpec) -> Result<(), TreeError> {
    for (name, value) in &spec.vars {
        tree.set_var(node, name.clone(), Value::from(value.clone()));
    }

    if !spec.attr.is_empty() || !spec.defaults.is_empty() {
        let attr: IndexMap<String, Value> = spec
            .attr
            .iter()
            .map(|(k, v)| (k.clone(), Value::from(v.clone())))
            .collect();
        let defaults = AttrDefault::parse_map(
            spec.defaults
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(v.clone())))
                .collect(),
        );
        tree.set_var(node, "attr", Value::Keyed(merge_attributes(attr, &defaults)));
    }

    for child_spec in &spec.children {
        let name = child_spec.name.as_deref().unwrap_or(&child_spec.id);
        let child = tree.add(node, name, child_spec.id.as_str())?;
        build_node(tree, child, child_spec)?;
    }
    Ok(())
}

fn build_form(spec: &FormSpec) -> FormViewHandle {
    let mut builder = FormView::build(spec.name.as_str()).multipart(spec.multipart);
    for child in &spec.children {
        builder = builder.child(build_form(child));
    }
    builder.finish()
}

fn tree_json(tree: &BlockTree, node: NodeId) -> serde_json::Value {
    let children: serde_json::Map<String, serde_json::Value> = tree
        .children(node)
        .map(|(name, child)| (name.to_string(), tree_json(tree, child)))
        .collect();
    serde_json::json!({
        "id": tree.node(node).id(),
        "vars": tree.node(node).vars(),
        "children": children,
    })
}
