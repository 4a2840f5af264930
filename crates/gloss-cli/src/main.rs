//! `gloss`: command-line front end for the Gloss annotation engine.
//!
//! # Usage
//!
//! ```
//! gloss project add "Caregiver interviews"
//! gloss document add --project <id> --name interview-01 --file interview-01.txt
//! gloss code add --project <id> Trust --flag affect
//! gloss code update --project <id> <code> --description "Reliance on staff"
//! gloss assign <document> 120 184 <code>
//! gloss show <document>
//! gloss suggest <document> 120 184
//! ```

mod config;
mod render;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use gloss_annotate::AnnotationService;
use gloss_core::{
  document::{CodeUpdate, NewCode, NewDocument},
  interval::SegmentUpdate,
  project::NewProject,
  settings::SuggestionLimit,
  store::RecordStore,
};
use gloss_store_sqlite::SqliteStore;
use gloss_suggest::ChatCompletionsProvider;
use render::CodeNames;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::config::CliConfig;

type Service = AnnotationService<SqliteStore, ChatCompletionsProvider>;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "gloss", version, about = "Qualitative coding of text documents")]
struct Cli {
  /// Path to a TOML config file. Defaults to `gloss.toml` if present.
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  #[command(subcommand)]
  Project(ProjectCommand),
  #[command(subcommand)]
  Document(DocumentCommand),
  #[command(subcommand)]
  Code(CodeCommand),
  /// Code the character range [START, END) of a document. Overlapping
  /// segments are replaced.
  Assign {
    document: Uuid,
    start:    usize,
    end:      usize,
    #[arg(required = true)]
    codes:    Vec<Uuid>,
  },
  /// Replace a segment's codes. With no codes the segment is removed.
  SetCodes { segment: Uuid, codes: Vec<Uuid> },
  /// Remove every segment of a document.
  Clear { document: Uuid },
  /// Print a document with its coded segments.
  Show {
    document: Uuid,
    /// Print the document and its segments as JSON.
    #[arg(long)]
    json:     bool,
  },
  /// Ask the configured provider for codes that fit [START, END).
  Suggest {
    document: Uuid,
    start:    usize,
    end:      usize,
    /// Number of suggestions (1-5); defaults to the saved setting.
    #[arg(long)]
    limit:    Option<f64>,
  },
  /// Show or change settings.
  Settings {
    #[arg(long)]
    ai_enabled: Option<bool>,
    /// Default number of suggestions (1-5); rounded to the nearest integer.
    #[arg(long)]
    limit:      Option<f64>,
  },
}

#[derive(Subcommand, Debug)]
enum ProjectCommand {
  Add {
    name:        String,
    #[arg(long)]
    description: Option<String>,
  },
  List,
}

#[derive(Subcommand, Debug)]
enum DocumentCommand {
  /// Import a document from a file, or from `--text`.
  Add {
    #[arg(long)]
    project: Uuid,
    #[arg(long)]
    name:    String,
    #[arg(long, conflicts_with = "text", required_unless_present = "text")]
    file:    Option<PathBuf>,
    #[arg(long)]
    text:    Option<String>,
  },
  List {
    #[arg(long)]
    project: Uuid,
  },
  Delete { document: Uuid },
}

#[derive(Subcommand, Debug)]
enum CodeCommand {
  Add {
    #[arg(long)]
    project:     Uuid,
    name:        String,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    color:       Option<String>,
    /// Repeatable; commas also separate flags.
    #[arg(long = "flag", value_delimiter = ',')]
    flags:       Vec<String>,
  },
  List {
    #[arg(long)]
    project: Uuid,
  },
  /// Change a code's fields. Blank values clear the description or colour;
  /// `--flag` replaces the whole flag list.
  Update {
    #[arg(long)]
    project:     Uuid,
    code:        Uuid,
    #[arg(long)]
    name:        Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    color:       Option<String>,
    #[arg(long = "flag", value_delimiter = ',')]
    flags:       Option<Vec<String>>,
  },
  /// Delete a code and strip it from every segment.
  Delete { code: Uuid },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let cfg = CliConfig::load(cli.config.as_deref())?;

  if let Some(parent) = cfg.store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }
  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;

  let provider = ChatCompletionsProvider::new(cfg.provider.chat_completions())
    .context("failed to build suggestion provider")?;
  let service =
    AnnotationService::new(Arc::new(store), provider).with_timeout(cfg.provider.timeout());

  run(&service, cli.command).await
}

async fn run(service: &Service, command: Command) -> Result<()> {
  let store = service.store();

  match command {
    Command::Project(ProjectCommand::Add { name, description }) => {
      let project = store.add_project(NewProject { name, description }).await?;
      println!("{}", project.project_id);
    }
    Command::Project(ProjectCommand::List) => {
      for p in store.list_projects().await? {
        match &p.description {
          Some(d) => println!("{}  {} - {d}", p.project_id, p.name),
          None => println!("{}  {}", p.project_id, p.name),
        }
      }
    }

    Command::Document(DocumentCommand::Add { project, name, file, text }) => {
      let text = match (file, text) {
        (Some(path), _) => std::fs::read_to_string(&path)
          .with_context(|| format!("reading {}", path.display()))?,
        (None, Some(text)) => text,
        (None, None) => bail!("either --file or --text is required"),
      };
      ensure_project(store, project).await?;
      let document = store
        .add_document(NewDocument { project_id: project, name, text })
        .await?;
      println!("{}", document.document_id);
    }
    Command::Document(DocumentCommand::List { project }) => {
      for d in store.list_documents(project).await? {
        println!("{}  {}  ({} chars)", d.document_id, d.name, d.len());
      }
    }
    Command::Document(DocumentCommand::Delete { document }) => {
      service.delete_document(document).await?;
    }

    Command::Code(CodeCommand::Add { project, name, description, color, flags }) => {
      ensure_project(store, project).await?;
      let code = store
        .add_code(NewCode {
          description,
          color,
          flags,
          ..NewCode::new(project, name)
        })
        .await?;
      println!("{}", code.code_id);
    }
    Command::Code(CodeCommand::List { project }) => {
      for (i, code) in store.list_codes(project).await?.iter().enumerate() {
        println!("{:>3}. {}", i + 1, render::code_line(code));
      }
    }
    Command::Code(CodeCommand::Update { project, code, name, description, color, flags }) => {
      let update = CodeUpdate { name, description, color, flags };
      let Some(updated) = store.update_code(project, code, update).await? else {
        bail!("code {code} not found in project {project}");
      };
      println!("{}", render::code_line(&updated));
    }
    Command::Code(CodeCommand::Delete { code }) => {
      let removal = service.delete_code(code).await?;
      println!(
        "deleted; {} segment(s) updated, {} removed",
        removal.updated, removal.removed
      );
    }

    Command::Assign { document, start, end, codes } => {
      let assignment = service.assign_codes(document, start, end, &codes).await?;
      if !assignment.replaced.is_empty() {
        tracing::warn!(
          replaced = assignment.replaced.len(),
          "overlapping segments were replaced"
        );
      }
      println!("{}", assignment.segment.segment_id);
    }
    Command::SetCodes { segment, codes } => {
      match service.set_segment_codes(segment, &codes).await? {
        SegmentUpdate::Updated { segment } => println!("{}", segment.segment_id),
        SegmentUpdate::Removed { segment_id } => println!("{segment_id} removed"),
      }
    }
    Command::Clear { document } => {
      let removed = service.clear_document(document).await?;
      println!("{removed} segment(s) removed");
    }

    Command::Show { document, json } => {
      let coding = service.coding(document).await?;
      if json {
        println!("{}", serde_json::to_string_pretty(&coding)?);
      } else {
        let names = CodeNames::new(&store.list_codes(coding.document.project_id).await?);
        println!("{}\n", render::coded_text(&coding, &names));
        print!("{}", render::segment_table(&coding, &names));
      }
    }

    Command::Suggest { document, start, end, limit } => {
      let limit = limit.map(SuggestionLimit::from_number).transpose()?;
      let suggestions = service.request_suggestions(document, start, end, limit).await?;
      if suggestions.is_empty() {
        println!("no suggestions");
        return Ok(());
      }
      let project_id = store
        .get_document(document)
        .await?
        .context("document disappeared")?
        .project_id;
      let names = CodeNames::new(&store.list_codes(project_id).await?);
      for s in &suggestions {
        println!("{}", render::suggestion_line(s, &names));
      }
    }

    Command::Settings { ai_enabled, limit } => {
      let mut settings = service.settings().await?;
      if ai_enabled.is_some() || limit.is_some() {
        if let Some(enabled) = ai_enabled {
          settings.ai_enabled = enabled;
        }
        if let Some(limit) = limit {
          settings.suggestion_limit = SuggestionLimit::from_number(limit)?;
        }
        settings = service.update_settings(settings).await?;
      }
      println!("{}", serde_json::to_string_pretty(&settings)?);
    }
  }

  Ok(())
}

async fn ensure_project(store: &SqliteStore, project_id: Uuid) -> Result<()> {
  if store.get_project(project_id).await?.is_none() {
    bail!("project not found: {project_id}");
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn code_update_leaves_absent_fields_unset() {
    let (project, code) = (Uuid::new_v4().to_string(), Uuid::new_v4().to_string());
    let cli = Cli::try_parse_from([
      "gloss", "code", "update", "--project", project.as_str(), code.as_str(),
      "--color", "", "--flag", "affect,relational",
    ])
    .unwrap();

    let Command::Code(CodeCommand::Update { name, description, color, flags, .. }) = cli.command
    else {
      panic!("expected a code update");
    };
    assert_eq!(name, None);
    assert_eq!(description, None);
    assert_eq!(color.as_deref(), Some(""));
    assert_eq!(flags, Some(vec!["affect".to_owned(), "relational".to_owned()]));
  }

  #[test]
  fn project_list_takes_no_arguments() {
    let cli = Cli::try_parse_from(["gloss", "project", "list"]).unwrap();
    assert!(matches!(cli.command, Command::Project(ProjectCommand::List)));
  }
}
