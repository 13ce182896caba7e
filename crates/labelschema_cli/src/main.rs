//! Label schema inspection CLI.
//!
//! # Responsibility
//! - Load schema records stored as JSON and print active labels, groups and hierarchy.
//! - Apply cascading deletions and derive per-task views from the command line.
//! - Keep stdout machine-readable: records are printed as pretty JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use labelschema_core::{Label, LabelId, LabelSchema, LabelSchemaRecord, ViewOptions};
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "labelschema")]
#[command(about = "Inspect and edit label schema records", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, global = true, env = "LABELSCHEMA_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute log directory; file logging is off when unset
    #[arg(long, global = true, env = "LABELSCHEMA_LOG_DIR")]
    log_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print active labels, groups and hierarchy
    Inspect {
        /// Schema record (JSON)
        record: PathBuf,
    },

    /// Mark labels deleted (with descendants) and print the updated record
    Delete {
        /// Schema record (JSON)
        record: PathBuf,

        /// Label ids to delete
        #[arg(required = true)]
        label_ids: Vec<Uuid>,
    },

    /// Print the view record restricted to the given labels
    View {
        /// Schema record (JSON)
        record: PathBuf,

        /// Label ids kept in the view
        #[arg(required = true)]
        label_ids: Vec<Uuid>,

        /// Task node the view is built for
        #[arg(long)]
        task_node_id: Option<Uuid>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        let level = cli
            .log_level
            .as_deref()
            .unwrap_or_else(|| labelschema_core::default_log_level());
        let log_dir = log_dir
            .to_str()
            .context("log directory must be valid UTF-8")?;
        labelschema_core::init_logging(level, log_dir).context("failed to start logging")?;
    }

    match cli.command {
        Commands::Inspect { record } => {
            let schema = load_schema(&record)?;
            print!("{}", render_summary(&schema));
        }
        Commands::Delete { record, label_ids } => {
            let mut schema = load_schema(&record)?;
            schema
                .mark_labels_deleted(label_ids)
                .context("deletion rejected")?;
            print_record(&schema)?;
        }
        Commands::View {
            record,
            label_ids,
            task_node_id,
        } => {
            let schema = load_schema(&record)?;
            let labels = resolve_labels(&schema, &label_ids)?;
            let view = LabelSchema::from_parent(
                &schema,
                &labels,
                ViewOptions {
                    task_node_id,
                    ..ViewOptions::default()
                },
            );
            print_record(&view)?;
        }
    }
    Ok(())
}

fn load_schema(path: &Path) -> Result<LabelSchema> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let record: LabelSchemaRecord = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    LabelSchema::from_record(record).with_context(|| format!("invalid schema in {}", path.display()))
}

fn print_record(schema: &LabelSchema) -> Result<()> {
    let json = serde_json::to_string_pretty(&schema.to_record())?;
    println!("{json}");
    Ok(())
}

fn resolve_labels(schema: &LabelSchema, ids: &[LabelId]) -> Result<Vec<Label>> {
    ids.iter()
        .map(|id| {
            schema
                .get_label_by_id(*id)
                .with_context(|| format!("label not found: {id}"))
        })
        .collect()
}

fn render_summary(schema: &LabelSchema) -> String {
    let mut out = format!("schema {}\n", schema.id());
    if let Some(previous) = schema.previous_schema_revision_id() {
        out.push_str(&format!("previous revision {previous}\n"));
    }
    out.push_str(&format!(
        "labels: {} active, {} deleted\n",
        schema.get_labels(true).len(),
        schema.deleted_label_ids().len()
    ));

    for group in schema.get_groups(true) {
        let names: Vec<&str> = group.labels.iter().map(|label| label.name.as_str()).collect();
        out.push_str(&format!(
            "group {} [{:?}]: {}\n",
            group.name,
            group.kind,
            names.join(", ")
        ));
    }

    for label in schema.get_labels(true) {
        let path: Vec<String> = schema
            .get_ancestors(&label)
            .into_iter()
            .rev()
            .map(|ancestor| ancestor.name)
            .collect();
        if path.len() > 1 {
            out.push_str(&format!("{}\n", path.join(" > ")));
        }
    }
    out
}
