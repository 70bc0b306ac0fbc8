use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use formflow_config::{RunMode, WorkflowDef};
use formflow_engine::{EngineConfig, FormEngine, HttpResponse, validate_forms};
use formflow_form::{HttpMethod, InboundRequest};
use formflow_store::SqliteRunStore;
use formflow_workflow::Workflow;

const DEFAULT_BASE_URL: &str = "http://localhost:5678/form-waiting";

/// Formflow - multi-page forms that suspend and resume workflow runs
#[derive(Parser)]
#[command(name = "formflow")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.formflow)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  /// Base of the resume URLs handed out for waiting runs
  #[arg(long, global = true, default_value = DEFAULT_BASE_URL)]
  base_url: String,

  /// Start runs in test mode
  #[arg(long, global = true)]
  test_mode: bool,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Check a workflow definition and the placement of its form nodes
  Validate {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,
  },

  /// Start a run, reading the trigger payload from stdin
  Start {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,
  },

  /// Send a request to a waiting run, reading the body from stdin
  Request {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,

    /// Waiting token of the run
    #[arg(long)]
    token: String,

    /// HTTP method of the request
    #[arg(long, default_value = "GET")]
    method: String,
  },

  /// Cancel a waiting run
  Cancel {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,

    #[arg(long)]
    run_id: String,
  },

  /// List the runs of a workflow
  Runs {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    )
    .init();

  let cli = Cli::parse();

  let data_dir = match cli.data_dir {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".formflow"),
  };
  let config = EngineConfig {
    resume_base_url: cli.base_url,
    mode: if cli.test_mode {
      RunMode::Test
    } else {
      RunMode::Production
    },
  };

  let Some(command) = cli.command else {
    println!("formflow - use --help to see available commands");
    return Ok(());
  };

  if let Commands::Validate { workflow_file } = &command {
    return validate(workflow_file);
  }

  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async { run_command(command, data_dir, config).await })
}

async fn run_command(command: Commands, data_dir: PathBuf, config: EngineConfig) -> Result<()> {
  match command {
    Commands::Validate { workflow_file } => validate(&workflow_file),
    Commands::Start { workflow_file } => {
      let engine = open_engine(&workflow_file, &data_dir, config).await?;
      let payload = read_json_from_stdin()?;

      let run = engine.start(payload).await.context("run failed")?;

      eprintln!("Run: {}", run.run_id);
      eprintln!("Status: {:?}", run.status);
      if let Some(node_id) = run.waiting_node() {
        eprintln!("Waiting on: {}", node_id);
      }
      if let Some(token) = run.resume_token() {
        println!("{}", engine.resume_url(token));
      }
      Ok(())
    }
    Commands::Request {
      workflow_file,
      token,
      method,
    } => {
      let engine = open_engine(&workflow_file, &data_dir, config).await?;
      let method: HttpMethod = method.parse()?;
      let body = match method {
        HttpMethod::Get | HttpMethod::Head => serde_json::json!({}),
        _ => read_json_from_stdin()?,
      };

      let result = engine
        .handle_request(&token, InboundRequest::with_body(method, body))
        .await;
      let response = match &result {
        Ok(response) => response.clone(),
        Err(e) => HttpResponse::from_error(e),
      };

      eprintln!("HTTP {} ({})", response.status, response.content_type);
      if let Some(location) = &response.location {
        eprintln!("Location: {}", location);
        println!("{}", location);
      } else {
        println!("{}", response.body);
      }
      result.map(|_| ()).context("request failed")
    }
    Commands::Cancel {
      workflow_file,
      run_id,
    } => {
      let engine = open_engine(&workflow_file, &data_dir, config).await?;
      let run = engine.cancel(&run_id).await.context("cancel failed")?;
      eprintln!("Cancelled run: {}", run.run_id);
      Ok(())
    }
    Commands::Runs { workflow_file } => {
      let engine = open_engine(&workflow_file, &data_dir, config).await?;
      let runs = engine.list_runs().await?;

      let output: Vec<serde_json::Value> = runs
        .iter()
        .map(|run| {
          serde_json::json!({
            "run_id": run.run_id,
            "status": run.status,
            "waiting_node": run.waiting_node(),
            "resume_url": run.resume_token().map(|token| engine.resume_url(token)),
            "error": run.error,
            "created_at": run.created_at,
          })
        })
        .collect();
      println!("{}", serde_json::to_string_pretty(&output)?);
      Ok(())
    }
  }
}

fn validate(workflow_file: &Path) -> Result<()> {
  let workflow = load_workflow(workflow_file)?;
  let errors = validate_forms(&workflow);

  if errors.is_empty() {
    eprintln!(
      "Workflow '{}' is valid ({} nodes)",
      workflow.name,
      workflow.nodes.len()
    );
    return Ok(());
  }

  for error in &errors {
    eprintln!("error: {}", error);
  }
  bail!("workflow '{}' has {} invalid form node(s)", workflow.name, errors.len())
}

async fn open_engine(
  workflow_file: &Path,
  data_dir: &Path,
  config: EngineConfig,
) -> Result<FormEngine<SqliteRunStore>> {
  let workflow = load_workflow(workflow_file)?;

  tokio::fs::create_dir_all(data_dir)
    .await
    .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;

  let db_path = data_dir.join("runs.db");
  let store = SqliteRunStore::connect(&db_path)
    .await
    .with_context(|| format!("failed to open run store: {}", db_path.display()))?;

  info!(workflow_id = %workflow.workflow_id, db = %db_path.display(), "engine ready");
  Ok(FormEngine::new(workflow, store, config))
}

fn load_workflow(workflow_file: &Path) -> Result<Workflow> {
  let content = std::fs::read_to_string(workflow_file)
    .with_context(|| format!("failed to read workflow file: {}", workflow_file.display()))?;

  let def: WorkflowDef = serde_json::from_str(&content)
    .with_context(|| format!("failed to parse workflow file: {}", workflow_file.display()))?;

  Workflow::lock(def).with_context(|| format!("invalid workflow: {}", workflow_file.display()))
}

fn read_json_from_stdin() -> Result<serde_json::Value> {
  use std::io::IsTerminal;

  if io::stdin().is_terminal() {
    // No stdin pipe, use empty object
    return Ok(serde_json::json!({}));
  }

  let mut input = String::new();
  io::stdin()
    .read_to_string(&mut input)
    .context("failed to read JSON from stdin")?;

  if input.trim().is_empty() {
    Ok(serde_json::json!({}))
  } else {
    serde_json::from_str(&input).context("failed to parse JSON from stdin")
  }
}
