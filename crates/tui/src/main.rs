mod app;
mod events;
mod persist;
mod strings;
mod terminal;
mod theme;
mod ui;

use anyhow::Result;
use terminal::TerminalGuard;

fn main() -> Result<()> {
    // The terminal owns stdout/stderr once raw mode is up, so logs go to a
    // daily file under the data dir. The guard must outlive the event loop.
    let _log_guard = init_logging();
    let mut app = app::App::new();
    let mut term = TerminalGuard::new()?;
    events::run(&mut term.terminal, &mut app)
}

fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let base = directories::BaseDirs::new()?;
    let dir = base.data_dir().join("pulse").join("logs");
    std::fs::create_dir_all(&dir).ok()?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "pulse.log"));
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Some(guard)
}
