use std::io::{self, BufRead};

use anyhow::Context;
use chat_agent::app::App;
use chat_agent::config::AgentConfig;
use chat_agent::console::Console;
use chat_agent::engine::CheckpointEngine;
use chat_agent::providers;
use conversation_store::{ConversationStore, FileSnapshotSink};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_WIDTH: usize = 80;

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config = AgentConfig::from_env().context("failed to load configuration")?;
    let cwd = std::env::current_dir().context("failed to resolve working directory")?;
    let state_path = config.resolve_state_path(&cwd);
    info!(path = %state_path.display(), "opening conversation state");

    let store = ConversationStore::open(FileSnapshotSink::new(&state_path));
    let gateway = providers::gateway_from_config(&config).map_err(anyhow::Error::msg)?;
    let engine = CheckpointEngine::new(store, gateway).with_delivery(config.delivery);
    let mut app = App::new(engine);

    let mut console = Console::new(terminal_width());
    let stdout = io::stdout();
    let mut out = stdout.lock();
    console.start(&app, &mut out).context("failed to write transcript")?;

    for line in io::stdin().lock().lines() {
        let line = line.context("failed to read input")?;
        console
            .handle_line(&mut app, &line, &mut out)
            .context("failed to write transcript")?;
        if app.should_exit {
            break;
        }
    }

    Ok(())
}

fn terminal_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|width| *width > 0)
        .unwrap_or(DEFAULT_WIDTH)
}
