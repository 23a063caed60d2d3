//! page-pilot command line
//!
//! Launches (or attaches to) a browser, optionally opens a start page, and runs one
//! task to completion. With `--jsonl` it instead reads fabric messages from stdin
//! and writes every UI-bound message to stdout, one JSON object per line.

use anyhow::{bail, Context};
use clap::Parser;
use page_pilot::agent::config::{DEFAULT_BUDGET, DEFAULT_ENDPOINT, DEFAULT_MODEL};
use page_pilot::fabric::Outbox;
use page_pilot::store::{self, JsonFileStore, KeyValueStore, MemoryStore};
use page_pilot::{
    AgentConfig, AgentRuntime, BrowserSession, ChromePage, ConnectionOptions, ExecutorTimings, GeminiPlanner,
    LaunchOptions, Message, Outcome, PlannerConfig, StatusLevel,
};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "page-pilot")]
#[command(version)]
#[command(about = "Autonomous web agent driven by an LLM", long_about = None)]
struct Cli {
    /// What the agent should achieve (required unless --jsonl)
    #[arg(long, short = 'g')]
    goal: Option<String>,

    /// Page to open before the task starts
    #[arg(long, short = 'u', value_name = "URL")]
    url: Option<String>,

    /// Gemini API key; falls back to the stored key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Maximum number of actions per task
    #[arg(long, default_value_t = DEFAULT_BUDGET)]
    budget: usize,

    /// Gemini model name
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Generative API base URL
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Launch browser in headed mode (default: headless)
    #[arg(long, short = 'H')]
    headed: bool,

    /// Path to custom browser executable
    #[arg(long, value_name = "PATH")]
    chrome_path: Option<PathBuf>,

    /// WebSocket endpoint URL for remote browser connection
    #[arg(long, value_name = "URL")]
    ws_endpoint: Option<String>,

    /// Persistent browser profile directory
    #[arg(long, value_name = "DIR")]
    user_data_dir: Option<PathBuf>,

    /// Disable the Chrome sandbox (needed in some containers)
    #[arg(long)]
    no_sandbox: bool,

    /// Save the given API key to the credential store
    #[arg(long)]
    remember_key: bool,

    /// Exchange JSON-lines messages on stdin/stdout instead of running one goal
    #[arg(long)]
    jsonl: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let store = open_store();
    let api_key = resolve_api_key(&cli, store.as_ref())?;

    let task = single_task(&cli, api_key.as_deref())?;

    let planner_config = PlannerConfig::default().endpoint(cli.endpoint.clone()).model(cli.model.clone());
    let planner = GeminiPlanner::new(planner_config)?;

    let (session, page) = open_page(&cli).await?;
    let mut runtime = AgentRuntime::start(
        page,
        planner,
        AgentConfig::new().budget(cli.budget),
        ExecutorTimings::default(),
    );

    let result = match task {
        Some((goal, api_key)) => run_goal(&mut runtime, goal, api_key).await,
        None => run_jsonl(&mut runtime, api_key).await,
    };

    runtime.shutdown().await?;
    tokio::task::spawn_blocking(move || session.close()).await??;
    result
}

/// Goal and key for single-goal mode, checked before any browser is started; `None` with --jsonl
fn single_task(cli: &Cli, api_key: Option<&str>) -> anyhow::Result<Option<(String, String)>> {
    if cli.jsonl {
        return Ok(None);
    }
    let goal = cli.goal.clone().context("--goal is required unless --jsonl is given")?;
    let api_key = api_key.context("No API key: pass --api-key, set GEMINI_API_KEY or store one with --remember-key")?;
    Ok(Some((goal, api_key.to_string())))
}

fn open_store() -> Box<dyn KeyValueStore> {
    match JsonFileStore::open_default() {
        Ok(store) => Box::new(store),
        Err(e) => {
            log::warn!("Credential store unavailable, using memory: {}", e);
            Box::new(MemoryStore::new())
        }
    }
}

/// Explicit key first, stored key second; the store is only written with --remember-key
fn resolve_api_key(cli: &Cli, store: &dyn KeyValueStore) -> anyhow::Result<Option<String>> {
    let explicit = cli.api_key.clone().filter(|k| !k.trim().is_empty());

    if cli.remember_key {
        let key = explicit.as_ref().context("--remember-key needs --api-key or GEMINI_API_KEY")?;
        store.set(store::API_KEY, serde_json::Value::String(key.clone()))?;
        log::info!("Stored API key");
    }

    Ok(explicit.or_else(|| store.api_key()))
}

async fn open_page(cli: &Cli) -> anyhow::Result<(BrowserSession, ChromePage)> {
    let ws_endpoint = cli.ws_endpoint.clone();
    let mut launch = LaunchOptions::new().headless(!cli.headed).sandbox(!cli.no_sandbox);
    if let Some(path) = &cli.chrome_path {
        launch = launch.chrome_path(path);
    }
    if let Some(dir) = &cli.user_data_dir {
        launch = launch.user_data_dir(dir);
    }
    let url = cli.url.clone();

    let opened = tokio::task::spawn_blocking(move || -> page_pilot::Result<(BrowserSession, ChromePage)> {
        let session = match ws_endpoint {
            Some(ws_url) => BrowserSession::connect(ConnectionOptions::new(ws_url))?,
            None => BrowserSession::launch(launch)?,
        };
        if let Some(url) = url {
            session.navigate(&url)?;
        }
        let page = session.active_page()?;
        Ok((session, page))
    })
    .await??;

    Ok(opened)
}

fn print_message(message: &Message) {
    match message {
        Message::AgentStatusUpdate { status, level } => {
            let tag = match level {
                StatusLevel::Info => "info",
                StatusLevel::Success => "ok",
                StatusLevel::Error => "error",
                StatusLevel::Action => "action",
            };
            eprintln!("[{}] {}", tag, status);
        }
        Message::AgentAction { action } => eprintln!("[action] {}", action),
        _ => {}
    }
}

async fn run_goal(runtime: &mut AgentRuntime, goal: String, api_key: String) -> anyhow::Result<()> {
    runtime.start_task(goal, api_key)?;

    let outcome = tokio::select! {
        outcome = runtime.wait_for_outcome(print_message) => outcome?,
        _ = tokio::signal::ctrl_c() => {
            runtime.cancel()?;
            bail!("Interrupted");
        }
    };

    match outcome {
        Outcome::Finished(answer) => {
            println!("{}", answer);
            Ok(())
        }
        Outcome::Failed(error) => bail!("Agent failed: {}", error),
    }
}

/// Forward stdin lines to the controller until stdin closes
///
/// Returns how many START_TASK messages were delivered.
async fn feed_stdin(outbox: Outbox, api_key: Option<String>) -> anyhow::Result<usize> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut started = 0;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let Some(mut message) = Message::decode(&line) else {
            continue;
        };

        let is_start = matches!(message, Message::StartTask { .. });
        if let Message::StartTask { api_key: key, .. } = &mut message {
            if key.is_empty() {
                if let Some(stored) = &api_key {
                    key.clone_from(stored);
                }
            }
        }

        match outbox.send(message) {
            Ok(()) if is_start => started += 1,
            Ok(()) => {}
            Err(e) => log::warn!("{}", e),
        }
    }

    Ok(started)
}

/// START_TASK messages sent from stdin against the UI messages that ended them
#[derive(Debug, Default)]
struct TaskTally {
    /// Known once stdin has closed
    started: Option<usize>,
    ended: usize,
}

impl TaskTally {
    fn record(&mut self, message: &Message) {
        if message.ends_task() {
            self.ended += 1;
        }
    }

    fn stdin_closed(&mut self, started: usize) {
        self.started = Some(started);
    }

    fn is_open(&self) -> bool {
        self.started.is_none()
    }

    /// Stdin is closed and every task it started has ended
    fn is_done(&self) -> bool {
        self.started.is_some_and(|started| self.ended >= started)
    }
}

/// Print UI messages as JSON lines
///
/// After stdin closes, output continues until every task it started has ended.
async fn run_jsonl(runtime: &mut AgentRuntime, api_key: Option<String>) -> anyhow::Result<()> {
    let mut reader = tokio::spawn(feed_stdin(runtime.sender(), api_key));
    let mut tally = TaskTally::default();

    while !tally.is_done() {
        tokio::select! {
            message = runtime.next() => {
                let Some(message) = message else { break };
                println!("{}", message.encode()?);
                tally.record(&message);
            }
            started = &mut reader, if tally.is_open() => {
                tally.stdin_closed(started??);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}
