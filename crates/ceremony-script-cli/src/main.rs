mod records;
mod render;

use anyhow::Result;
use ceremony_script_config::Config;
use ceremony_script_engine::{
    EditorSession, FileStore, FormatCommand, ScriptId, ScriptRecord, SessionState, now_millis,
};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use records::RecordStore;
use std::{
    env, fs,
    io::{Stdout, stdout},
    path::Path,
    process,
    time::Duration,
};

const TICK: Duration = Duration::from_millis(250);
const PALETTE: &[&str] = &["#aa0000", "#1f4e9c", "#2e7d32", "#6a1b9a"];

struct App {
    session: EditorSession<FileStore>,
    records: RecordStore,
    message: String,
    color_index: usize,
    quit: bool,
}

impl App {
    fn new(session: EditorSession<FileStore>, records: RecordStore) -> Self {
        Self {
            session,
            records,
            message: String::new(),
            color_index: 0,
            quit: false,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);

        match key.code {
            KeyCode::Char('q') if ctrl => self.close(false),
            KeyCode::Char('d') if ctrl => self.close(true),
            KeyCode::Char('s') if ctrl => self.save(),
            KeyCode::Char('a') if ctrl => self.autosave(),
            KeyCode::Char('b') if ctrl => self.format(FormatCommand::Bold),
            KeyCode::Char('e') if ctrl => self.format(FormatCommand::Italic),
            KeyCode::Char('u') if ctrl => self.format(FormatCommand::Underline),
            KeyCode::Char('l') if ctrl => self.format(FormatCommand::UnorderedList),
            KeyCode::Char('o') if ctrl => self.format(FormatCommand::OrderedList),
            KeyCode::Char('1') if alt => self.format(FormatCommand::AlignLeft),
            KeyCode::Char('2') if alt => self.format(FormatCommand::AlignCenter),
            KeyCode::Char('3') if alt => self.format(FormatCommand::AlignRight),
            KeyCode::Char('k') if ctrl => self.next_color(),
            KeyCode::Up if alt => {
                if let Some(size) = self.session.increase_font_size() {
                    self.message = format!("Font size {size}px");
                }
            }
            KeyCode::Down if alt => {
                if let Some(size) = self.session.decrease_font_size() {
                    self.message = format!("Font size {size}px");
                }
            }
            KeyCode::Char(c) if !ctrl && !alt => {
                self.session.type_text(&c.to_string());
            }
            KeyCode::Enter => {
                self.session.type_text("\n");
            }
            KeyCode::Backspace => {
                self.session.delete_backward();
            }
            KeyCode::Left => self.session.move_caret(-1, shift),
            KeyCode::Right => self.session.move_caret(1, shift),
            KeyCode::Home => self.session.move_caret(isize::MIN, shift),
            KeyCode::End => self.session.move_caret(isize::MAX, shift),
            KeyCode::Esc => self.session.blur(),
            _ => {}
        }
    }

    fn format(&mut self, command: FormatCommand) {
        if let Some(outcome) = self.session.apply_format(command)
            && !outcome.applied
        {
            self.message = format!("Nothing to apply {} to", command.name());
        }
    }

    fn next_color(&mut self) {
        let color = PALETTE[self.color_index % PALETTE.len()];
        self.color_index += 1;
        if self.session.apply_color(color).is_some() {
            self.message = format!("Color {color}");
        }
    }

    fn save(&mut self) {
        match self.session.save() {
            Ok(record) => match self.records.save(&record) {
                Ok(()) => self.message = format!("Saved \"{}\"", record.title),
                Err(e) => {
                    log::error!("Failed to write record {}: {e:#}", record.id);
                    self.message = format!("Error writing record: {e}");
                }
            },
            Err(e) => self.message = e.to_string(),
        }
    }

    fn autosave(&mut self) {
        self.message = match self.session.autosave() {
            Ok(_) => "Autosaved".to_string(),
            Err(e) => format!("Autosave failed: {e}"),
        };
    }

    fn close(&mut self, discard: bool) {
        self.session.close(discard);
        self.quit = true;
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let (config, first_run) = match Config::load() {
        Ok(Some(config)) => (config, false),
        Ok(None) => (Config::default(), true),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    let (id, title) = match args.as_slice() {
        [_] => (ScriptId::generate(), "Untitled ceremony".to_string()),
        [_, id] => (ScriptId::new(id.as_str()), id.clone()),
        [_, id, title] => (ScriptId::new(id.as_str()), title.clone()),
        _ => {
            eprintln!("Usage: {} [script-id [title]]", args[0]);
            process::exit(1);
        }
    };
    if !id
        .as_str()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        eprintln!("Error: Script id '{id}' may only contain letters, digits, '_' and '-'");
        process::exit(1);
    }

    init_logging(&config.storage_path)?;
    log::info!("ceremony-script starting up with storage at {}", config.storage_path.display());
    if first_run {
        write_default_config(&config);
    }

    let records = RecordStore::new(config.storage_path.join("records"));
    let record = records
        .load(&id)?
        .unwrap_or_else(|| ScriptRecord::new(id, title, ""));

    let mut session = EditorSession::new(FileStore::new(config.storage_path.join("store")), config.editor);
    session.open_record(record);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session, records);
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

/// Leave a config file with every setting spelled out for the user to edit
fn write_default_config(config: &Config) {
    match config.save() {
        Ok(()) => log::info!("Created default config file at {}", Config::config_path().display()),
        Err(e) => log::warn!("Failed to create default config file: {e}"),
    }
}

/// Log to a file next to the scripts; stderr belongs to the terminal UI.
fn init_logging(storage_path: &Path) -> Result<()> {
    fs::create_dir_all(storage_path)?;
    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(storage_path.join("ceremony-script.log"))?;
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();
    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if event::poll(TICK)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.handle_key(key);
        }
        app.session.tick(now_millis());

        if app.quit {
            return Ok(());
        }
    }
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(3), Constraint::Length(1), Constraint::Length(1)].as_ref())
        .split(f.area());

    let title = app
        .session
        .record()
        .map(|record| format!("{} [{}]", record.title, record.id))
        .unwrap_or_else(|| "No script".to_string());

    let lines = match app.session.surface() {
        Some(surface) => render::render_document(
            surface.document().nodes(),
            surface.selection().map(|selection| &selection.focus),
            app.session.selection().map(|offsets| offsets.range()),
        ),
        None => vec![Line::from("No script open")],
    };

    let editor = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    f.render_widget(editor, chunks[0]);

    f.render_widget(Paragraph::new(status_line(app)), chunks[1]);

    let help_text = Line::from(vec![
        Span::raw("^S: Save | ^A: Autosave | ^Q: Close | ^D: Discard | "),
        Span::raw("^B/^E/^U: Style | ^L/^O: List | Alt+1/2/3: Align | "),
        Span::raw("^K: Color | Alt+↑/↓: Size"),
    ]);
    f.render_widget(
        Paragraph::new(help_text).style(Style::default().fg(Color::DarkGray)),
        chunks[2],
    );
}

fn status_line(app: &App) -> Line<'static> {
    let count = app.session.character_count();
    let limits = app.session.settings().limits();
    let guidance = match app.session.validation() {
        Some(Ok(_)) | None => Span::styled(
            format!("{count} characters"),
            Style::default().fg(Color::Green),
        ),
        Some(Err(_)) => Span::styled(
            format!("{count} characters ({}-{} needed)", limits.min_chars, limits.max_chars),
            Style::default().fg(Color::Yellow),
        ),
    };

    let state = match app.session.state() {
        SessionState::Closed => "closed",
        SessionState::Loading => "loading",
        SessionState::Editing => "editing",
        SessionState::Saved => "saved",
    };
    let font_size = app.session.font_size().unwrap_or_default();

    Line::from(vec![
        guidance,
        Span::raw(format!(" | {state} | {font_size}px")),
        Span::styled(
            if app.message.is_empty() {
                String::new()
            } else {
                format!(" | {}", app.message)
            },
            Style::default().fg(Color::Cyan),
        ),
    ])
}
