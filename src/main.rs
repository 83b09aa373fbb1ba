use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::{self, OpenOptions};
use std::io;
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod app;
mod ui;

use app::{App, AppState};
use toaster::Config;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let config = Config::load()?;
    tracing::info!(path = ?config.path, "config loaded");
    let mut app = App::new(config)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

/// Logs go to `<cache_dir>/toaster/toaster.log`; the terminal belongs to the UI.
/// Filtering follows `TOASTER_LOG` (default `info`).
fn init_logging() {
    let Some(dir) = dirs::cache_dir().map(|d| d.join("toaster")) else { return };
    let file = fs::create_dir_all(&dir)
        .and_then(|_| OpenOptions::new().create(true).append(true).open(dir.join("toaster.log")));
    let Ok(file) = file else { return };

    let filter = EnvFilter::try_from_env("TOASTER_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        // Short poll so the countdowns and expiries show up without input.
        if !event::poll(Duration::from_millis(100))? { continue; }
        let Event::Key(KeyEvent { code, modifiers, kind, .. }) = event::read()? else { continue };
        if kind != KeyEventKind::Press { continue; }

        match app.state {
            AppState::Normal => match code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(())
                }
                KeyCode::Char('?') => { app.show_help = !app.show_help; }
                KeyCode::Char(c @ '1'..='9') => {
                    app.select_style(c as usize - '1' as usize);
                }
                KeyCode::Tab => app.next_style(),
                KeyCode::BackTab => app.previous_style(),
                KeyCode::Char('i') => app.open_input(),
                KeyCode::Char('s') => app.send_sample(),
                KeyCode::Char('x') => app.dismiss_latest(),
                KeyCode::Char('h') => app.toggle_host(),
                KeyCode::Char('t') => app.toggle_detail(),
                KeyCode::Esc => app.show_help = false,
                _ => {}
            },
            AppState::Input => match code {
                KeyCode::Enter => app.submit_input(),
                KeyCode::Esc => app.cancel_input(),
                KeyCode::Backspace => app.input_backspace(),
                KeyCode::Char(c) => app.input_char(c),
                KeyCode::Left => app.input_move_left(),
                KeyCode::Right => app.input_move_right(),
                _ => {}
            },
        }
    }
}
