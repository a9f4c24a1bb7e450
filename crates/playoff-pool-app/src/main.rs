// Playoff pool entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file; stdout carries protocol output)
// 2. Load config
// 3. Open database and load the pool snapshots
// 4. Create mpsc channels
// 5. Spawn the stdin reader and stdout writer tasks
// 6. Run the app event loop until QUIT or end of input
// 7. Cleanup on exit

use playoff_pool_app::app::{self, AppState};
use playoff_pool_app::protocol::{PoolCommand, PoolUpdate};
use playoff_pool_store::config;
use playoff_pool_store::db::Database;
use playoff_pool_store::PoolStore;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("Playoff pool starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: pool={}, {} series, max {} entries per participant",
        config.pool.name,
        config.bracket.series_count(),
        config.max_per_participant
    );
    info!("Pool covers {} {}", config.sport(), config.season());
    match &config.bracket_path {
        Some(path) => info!("Bracket loaded from {}", path.display()),
        None => info!("Using built-in bracket"),
    }

    // 3. Open database
    let db = Database::open(&config.db_path).context("failed to open database")?;
    info!("Database opened at {}", config.db_path);
    let store = PoolStore::new(db, config.bracket.clone(), config.max_per_participant)
        .context("failed to load pool state")?;
    let state = AppState::from_config(&config, store);

    // 4. Create mpsc channels
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (update_tx, update_rx) = mpsc::channel(256);

    // 5. Spawn I/O tasks
    let reader_handle = tokio::spawn(read_commands(cmd_tx, update_tx.clone()));
    let writer_handle = tokio::spawn(write_updates(update_rx));

    // 6. Run the event loop
    if let Err(e) = app::run(cmd_rx, update_tx, state).await {
        error!("Application loop error: {}", e);
    }

    // 7. Cleanup: stop reading, then let the writer drain
    reader_handle.abort();
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let _ = writer_handle.await;
    })
    .await;

    info!("Playoff pool shut down cleanly");
    Ok(())
}

/// Parse stdin lines into commands. Lines that do not parse are answered
/// with a rejection and otherwise ignored.
async fn read_commands(cmd_tx: mpsc::Sender<PoolCommand>, update_tx: mpsc::Sender<PoolUpdate>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("End of input");
                break;
            }
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<PoolCommand>(&line) {
            Ok(cmd) => {
                if cmd_tx.send(cmd).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!("Failed to parse command: {}", e);
                let _ = update_tx
                    .send(PoolUpdate::rejected(format!("malformed command: {e}")))
                    .await;
            }
        }
    }
}

/// Write each update to stdout as one JSON line.
async fn write_updates(mut update_rx: mpsc::Receiver<PoolUpdate>) {
    let mut stdout = tokio::io::stdout();
    while let Some(update) = update_rx.recv().await {
        let mut line = match serde_json::to_string(&update) {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to serialize update: {}", e);
                continue;
            }
        };
        line.push('\n');
        if let Err(e) = stdout.write_all(line.as_bytes()).await {
            error!("Failed to write to stdout: {}", e);
            break;
        }
        let _ = stdout.flush().await;
    }
}

/// Initialize tracing to log to a file (stdout is reserved for updates).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("playoff-pool.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("playoff_pool=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
