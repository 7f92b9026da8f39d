mod app;
mod bridge;
mod renderer;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use viewport_core::ObservationOptions;

/// Log to the file named by `VIEWPORT_WATCH_LOG`, if set. Logging to the
/// terminal would corrupt the panel.
fn init_logging() -> Result<()> {
    let Some(path) = std::env::var_os("VIEWPORT_WATCH_LOG") else {
        return Ok(());
    };
    let file = File::create(&path)
        .with_context(|| format!("creating log file {}", PathBuf::from(&path).display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn load_options(path: Option<&str>) -> Result<ObservationOptions> {
    let Some(path) = path else {
        return Ok(ObservationOptions::default());
    };
    let data = std::fs::read(path).with_context(|| format!("reading {path}"))?;
    let options =
        ObservationOptions::from_json(&data).with_context(|| format!("parsing {path}"))?;
    Ok(options)
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 2 {
        eprintln!("Usage: viewport-watch [options.json]");
        std::process::exit(1);
    }

    init_logging()?;
    let options = load_options(args.get(1).map(String::as_str))?;

    let (cols, rows) = renderer::terminal_size()?;
    let mut app = app::App::new(cols, rows, options);
    app.subscribe_all()?;

    let result = renderer::run_tui(&mut app);
    app.shutdown()?;
    result
}
