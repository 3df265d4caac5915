mod app;
mod clipboard;
mod input;

use app::App;
use clap::Parser;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use input::AppKey;
use plan_core::Day;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::File;
use std::io;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "plan_editor",
    version,
    about = "Spreadsheet-style editor for weekly training plans"
)]
struct Args {
    /// Directory holding grid.toml and the catalog/ templates
    #[arg(long, default_value = "config")]
    config: PathBuf,

    /// Plan file to edit, created on first save
    #[arg(long, default_value = "plan.json")]
    plan: PathBuf,

    /// Day shown first
    #[arg(long, default_value = "monday", value_parser = parse_day)]
    day: Day,

    /// Log file; RUST_LOG sets the level
    #[arg(long, default_value = "plan_editor.log")]
    log: PathBuf,
}

fn parse_day(s: &str) -> Result<Day, String> {
    Day::parse(s).ok_or_else(|| format!("unknown day '{s}'"))
}

fn main() -> Result<(), io::Error> {
    let args = Args::parse();

    // The terminal belongs to the UI, so logs go to a file
    let log_file = File::create(&args.log)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let app = App::new(&args.config, &args.plan, args.day, clipboard::open());

    // Run app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        log::error!("editor stopped: {err}");
        println!("Error: {err:?}");
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, mut app: App) -> io::Result<()> {
    loop {
        terminal.draw(|f| app.render(f))?;

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if handle_key(&mut app, key) {
                    return Ok(());
                }
            }
            Event::Mouse(mouse) => {
                if mouse.kind == MouseEventKind::Down(MouseButton::Left)
                    && !app.show_quit_confirm
                    && app.load_error.is_none()
                {
                    app.clear_message();
                    app.click(mouse.column, mouse.row);
                }
            }
            _ => {}
        }
    }
}

/// Returns true when the app should exit
fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    // Clear message on any keypress
    app.clear_message();

    // Ctrl+Q always quits
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if app.load_error.is_some() {
        return key.code == KeyCode::Char('q');
    }

    // Handle quit confirmation popup
    if app.show_quit_confirm {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => return true,
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.show_quit_confirm = false;
            }
            _ => {}
        }
        return false;
    }

    if key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.save();
        return false;
    }

    let editing = app.is_editing();
    if let Some(app_key) = input::app_key(key).filter(|_| !editing) {
        match app_key {
            AppKey::Quit if app.is_dirty() => app.show_quit_confirm = true,
            AppKey::Quit => return true,
            AppKey::NextDay => app.next_day(),
            AppKey::PrevDay => app.prev_day(),
            AppKey::Day(index) => {
                if let Some(day) = Day::from_index(index) {
                    app.switch_day(day);
                }
            }
        }
        return false;
    }

    if let Some(grid_key) = input::grid_key(key, editing) {
        app.dispatch(grid_key);
    }
    false
}
