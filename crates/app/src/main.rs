use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use dioxus::LaunchBuilder;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use quiz_core::model::SessionId;
use services::{
    ClientConfig, HttpQuizBackend, InMemoryBackend, QuizBackend, QuizClient, SubmitMode,
    init_logging,
};
use storage::{FileStore, InMemoryStore, KeyValueStore, ProgressStore};
use tracing::info;
use ui::{App, UiApp, build_app_context};

const DEMO_SESSION: &str = "demo";

/// Join a live quiz session as a participant
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
struct Cli {
    /// base URL of the quiz API (overrides QUIZ_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// seconds between session polls (overrides QUIZ_POLL_SECS)
    #[arg(long)]
    poll_secs: Option<u64>,

    /// whole-quiz time limit in seconds; 0 disables the countdown
    #[arg(long)]
    time_limit_secs: Option<u64>,

    /// answer submission mode: per-question or bulk (overrides QUIZ_MODE)
    #[arg(long)]
    mode: Option<SubmitMode>,

    /// file holding local progress; defaults to the platform data directory
    #[arg(long, env = "QUIZ_DATA_FILE")]
    data_file: Option<PathBuf>,

    /// fallback log filter when RUST_LOG is unset
    #[arg(long, env = "QUIZ_LOG", default_value = "info")]
    log_level: String,

    /// use a seeded in-process backend and in-memory progress
    #[arg(long)]
    demo: bool,

    /// open this session directly
    #[arg(long)]
    session: Option<String>,
}

impl Cli {
    /// Environment first, then explicit flags on top.
    fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::from_env();
        if let Some(url) = &self.api_url {
            config = config.with_api_base_url(url.clone());
        }
        if let Some(secs) = self.poll_secs {
            config = config.with_poll_interval(Duration::from_secs(secs));
        }
        if let Some(mode) = self.mode {
            config = config.with_mode(mode);
        }
        config.with_time_limit_override(self.time_limit_secs.map(Duration::from_secs))
    }

    fn initial_session(&self) -> Option<SessionId> {
        match &self.session {
            Some(raw) if !raw.trim().is_empty() => Some(SessionId::new(raw.trim())),
            _ if self.demo => Some(SessionId::new(DEMO_SESSION)),
            _ => None,
        }
    }
}

struct DesktopApp {
    client: Arc<QuizClient>,
    initial_session: Option<SessionId>,
}

impl UiApp for DesktopApp {
    fn quiz_client(&self) -> Arc<QuizClient> {
        Arc::clone(&self.client)
    }

    fn initial_session(&self) -> Option<SessionId> {
        self.initial_session.clone()
    }
}

fn open_store(cli: &Cli) -> Result<Arc<dyn KeyValueStore>, Box<dyn std::error::Error>> {
    if cli.demo {
        return Ok(Arc::new(InMemoryStore::new()));
    }
    let path = cli
        .data_file
        .clone()
        .or_else(FileStore::default_path)
        .ok_or("no data directory available; pass --data-file")?;
    let store = FileStore::open(&path)?;
    info!(path = %path.display(), "progress file opened");
    Ok(Arc::new(store))
}

fn open_backend(
    cli: &Cli,
    config: &ClientConfig,
) -> Result<Arc<dyn QuizBackend>, Box<dyn std::error::Error>> {
    if cli.demo {
        info!("using the in-process demo backend");
        return Ok(Arc::new(InMemoryBackend::demo()));
    }
    let timeout = config.request_timeout();
    info!(
        api_base_url = %config.api_base_url,
        timeout_ms = timeout.as_millis(),
        "using the HTTP backend"
    );
    let backend = HttpQuizBackend::new(config.api_base_url.clone(), timeout)?;
    Ok(Arc::new(backend))
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let config = cli.client_config();
    info!(
        mode = %config.mode,
        poll_secs = config.poll_interval.as_secs(),
        time_limit_secs = ?config.time_limit_secs(),
        "starting participant client"
    );

    let store = ProgressStore::new(open_store(&cli)?);
    let backend = open_backend(&cli, &config)?;
    let client = QuizClient::new(config, backend, store, tokio::runtime::Handle::current());

    let app: Arc<dyn UiApp> = Arc::new(DesktopApp {
        client: Arc::new(client),
        initial_session: cli.initial_session(),
    });
    let context = build_app_context(&app);

    // On macOS, Dioxus/tao can default to an always-on-top window in some dev setups.
    let desktop_cfg = DesktopConfig::new().with_window(
        WindowBuilder::new()
            .with_title("Quiz")
            .with_always_on_top(false),
    );

    LaunchBuilder::desktop()
        .with_cfg(desktop_cfg)
        .with_context(context)
        .launch(App);
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
