use anyhow::Context;
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::File;
use std::io;
use std::sync::{mpsc, Mutex};
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod cli;
mod dates;
mod display;
mod error;
mod fetch;
mod openmeteo;
mod presenter;
mod units;
mod weather;

use crate::app::{run_app, TuiView};
use crate::cli::Args;
use crate::fetch::ThreadFetcher;
use crate::openmeteo::{forecast::ForecastClient, geocoding::GeocodingClient};
use crate::presenter::Presenter;
use crate::units::UnitsState;

// The terminal belongs to the UI, so logs go to a file.
fn init_logging(args: &Args) -> anyhow::Result<()> {
    let path = args.log_path();
    let file = File::create(&path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wx_lookup=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args)?;
    tracing::info!("starting wx-lookup");

    let (tx, rx) = mpsc::channel();
    let fetcher = ThreadFetcher::new(
        GeocodingClient::new().context("building geocoding client")?,
        ForecastClient::new().context("building forecast client")?,
        tx,
    );

    let mut units = UnitsState::default();
    if args.imperial {
        units.switch_to_imperial();
    }
    let mut presenter = Presenter::new(TuiView::default(), fetcher).with_units(units);
    if let Some(place) = &args.place {
        presenter.submit_search(place, Instant::now());
    }

    // setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut presenter, &rx);

    // restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "terminal loop failed");
        println!("{:?}", err)
    }

    tracing::info!(
        phase = ?presenter.phase(),
        last_location = ?presenter.state().view.last_location.as_ref().map(|l| l.name.as_str()),
        "shutting down"
    );
    Ok(())
}
