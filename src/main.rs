use std::fs;
use std::io::{self, Stdout};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event as CEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use hongbao::ui::draw;
use hongbao::{App, Cli, Config};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

enum Event<I> {
    Input(I),
    Tick,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli)?;
    if cli.dump_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    let _guard = init_logging(&config)?;
    let tick_rate = config.tick_rate();
    let mut app = App::new(config)?;
    let mut terminal = setup_terminal()?;
    let res = run_app(&mut terminal, &mut app, tick_rate);
    restore_terminal(&mut terminal)?;
    match &res {
        Ok(()) => info!("session ended"),
        Err(err) => error!(error = %err, "session aborted"),
    }
    res
}

// The terminal belongs to the UI, so logs go to a file.
fn init_logging(config: &Config) -> Result<WorkerGuard> {
    fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("failed to create log dir {}", config.log_dir.display()))?;
    let appender = tracing_appender::rolling::never(&config.log_dir, "hongbao.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hongbao=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(anyhow::Error::msg)?;
    Ok(guard)
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    tick_rate: Duration,
) -> Result<()> {
    let (tx, rx) = mpsc::channel();

    let input_tx = tx.clone();
    thread::spawn(move || {
        loop {
            if !event::poll(Duration::from_millis(250)).unwrap_or(false) {
                continue;
            }
            match event::read() {
                Ok(CEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                    if input_tx.send(Event::Input(key)).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => {}
            }
        }
    });

    thread::spawn(move || {
        loop {
            if tx.send(Event::Tick).is_err() {
                break;
            }
            thread::sleep(tick_rate);
        }
    });

    loop {
        terminal.draw(|f| draw(f, app))?;

        match rx.recv()? {
            Event::Input(key) => {
                app.on_key(key);
            }
            Event::Tick => {
                app.on_tick(tick_rate);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
