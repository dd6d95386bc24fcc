use crate::commands::{validate_tag_name, validate_title};
use notebook::config::Config;
use notebook::dates::format_relative;
use notebook::editor::{Editor, EditorField, FieldValue};
use notebook::export::export_note;
use notebook::handle::StoreHandle;
use notebook::markup;
use notebook::model::{NoteChanges, NoteDraft, NoteId, NoteWithTag, StoreError, TagId, TagWithCount};
use notebook::query::{NoteBrowser, NoteSearch};
use notebook::store::NoteStore;
use notebook::styled::{ActiveStyles, StyleKind, TextColor, PALETTE};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use log::{debug, warn};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Terminal;
use std::future::Future;
use std::io::{stdout, Stdout};
use std::path::PathBuf;
use std::time::Duration;
use tokio::runtime::{Handle, Runtime};
use tokio::sync::{mpsc, watch};

pub fn run(store: NoteStore, config: &Config) -> Result<()> {
    let runtime = Runtime::new().context("starting background runtime")?;
    let mut app = App::new(StoreHandle::new(store), config, runtime.handle().clone())?;
    app.reload();
    let mut terminal = setup_terminal()?;
    let result = app.event_loop(&mut terminal);
    teardown_terminal(&mut terminal)?;
    result
}

/// Results delivered from background store work.
enum AppEvent {
    Status(String),
    Failed(String),
    Tags(Vec<TagWithCount>),
}

struct App {
    rt: Handle,
    store: StoreHandle,
    browser: NoteBrowser,
    search: NoteSearch,
    notes_rx: watch::Receiver<Vec<NoteWithTag>>,
    results_rx: watch::Receiver<Vec<NoteWithTag>>,
    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
    notes: Vec<NoteWithTag>,
    results: Vec<NoteWithTag>,
    tags: Vec<TagWithCount>,
    view: ViewMode,
    focus: NotesFocus,
    sidebar_idx: usize,
    note_idx: usize,
    note_offset: usize,
    result_idx: usize,
    tag_idx: usize,
    query: FieldValue,
    mode: Mode,
    status: String,
    max_title: usize,
    export_dir: PathBuf,
    db_path: PathBuf,
}

enum Mode {
    Normal,
    Editing(Editor),
    TagForm {
        tag_id: Option<TagId>,
        name: FieldValue,
    },
    ConfirmDelete(DeleteTarget),
}

enum DeleteTarget {
    Note { id: NoteId, title: String },
    Tag { id: TagId, name: String },
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum ViewMode {
    Notes,
    Search,
    Tags,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum NotesFocus {
    Sidebar,
    List,
}

impl ViewMode {
    fn label(&self) -> &'static str {
        match self {
            ViewMode::Notes => "Notes",
            ViewMode::Search => "Search",
            ViewMode::Tags => "Tags",
        }
    }
}

impl App {
    fn new(store: StoreHandle, config: &Config, rt: Handle) -> Result<Self> {
        let browser = NoteBrowser::new(store.clone());
        let search = NoteSearch::new(store.clone());
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let db_path = config.database_path()?;
        Ok(App {
            rt,
            notes_rx: browser.subscribe(),
            results_rx: search.subscribe(),
            store,
            browser,
            search,
            events_tx,
            events_rx,
            notes: Vec::new(),
            results: Vec::new(),
            tags: Vec::new(),
            view: ViewMode::Notes,
            focus: NotesFocus::List,
            sidebar_idx: 0,
            note_idx: 0,
            note_offset: 0,
            result_idx: 0,
            tag_idx: 0,
            query: FieldValue::new(""),
            mode: Mode::Normal,
            status: format!("Opened {}", db_path.display()),
            max_title: config.max_title_length,
            export_dir: config.export_dir()?,
            db_path,
        })
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            self.pump();
            terminal.draw(|f| self.draw(f))?;
            if event::poll(Duration::from_millis(200))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key)? {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    /// Applies finished background work and fresh query results.
    fn pump(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                AppEvent::Status(message) => self.status = message,
                AppEvent::Failed(message) => {
                    debug!("background operation failed: {}", message);
                    self.status = message;
                }
                AppEvent::Tags(tags) => {
                    self.tags = tags;
                    self.tag_idx = self.tag_idx.min(self.tags.len().saturating_sub(1));
                    self.sync_sidebar();
                }
            }
        }
        if self.notes_rx.has_changed().unwrap_or(false) {
            self.notes = self.notes_rx.borrow_and_update().clone();
            self.note_idx = self.note_idx.min(self.notes.len().saturating_sub(1));
        }
        if self.results_rx.has_changed().unwrap_or(false) {
            self.results = self.results_rx.borrow_and_update().clone();
            self.result_idx = self.result_idx.min(self.results.len().saturating_sub(1));
        }
    }

    /// Keeps the sidebar on the selected tag when the tag list changes, or
    /// falls back to "All" when that tag is gone.
    fn sync_sidebar(&mut self) {
        let selected = self.browser.selected_tag();
        let position = selected.and_then(|id| self.tags.iter().position(|t| t.tag.id == id));
        match (selected, position) {
            (Some(_), Some(pos)) => self.sidebar_idx = pos + 1,
            (Some(_), None) => {
                self.sidebar_idx = 0;
                self.select_tag(None);
            }
            (None, _) => self.sidebar_idx = 0,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Ok(true);
        }
        match self.mode {
            Mode::Normal => self.handle_normal_key(key),
            Mode::Editing(_) => self.handle_editor_key(key),
            Mode::TagForm { .. } => self.handle_tag_form_key(key),
            Mode::ConfirmDelete(_) => self.handle_confirm_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Result<bool> {
        if self.view == ViewMode::Search {
            return self.handle_search_key(key);
        }
        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Char('1') => {
                self.set_view(ViewMode::Notes);
                return Ok(false);
            }
            KeyCode::Char('2') | KeyCode::Char('/') => {
                self.set_view(ViewMode::Search);
                return Ok(false);
            }
            KeyCode::Char('3') => {
                self.set_view(ViewMode::Tags);
                return Ok(false);
            }
            _ => {}
        }
        match self.view {
            ViewMode::Notes => self.handle_notes_key(key),
            ViewMode::Tags => self.handle_tags_key(key),
            ViewMode::Search => Ok(false),
        }
    }

    fn handle_notes_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = match self.focus {
                    NotesFocus::Sidebar => NotesFocus::List,
                    NotesFocus::List => NotesFocus::Sidebar,
                };
            }
            KeyCode::Left | KeyCode::Char('h') => self.focus = NotesFocus::Sidebar,
            KeyCode::Right | KeyCode::Char('l') => self.focus = NotesFocus::List,
            KeyCode::Up | KeyCode::Char('k') => match self.focus {
                NotesFocus::Sidebar => self.move_sidebar(-1),
                NotesFocus::List => self.note_idx = self.note_idx.saturating_sub(1),
            },
            KeyCode::Down | KeyCode::Char('j') => match self.focus {
                NotesFocus::Sidebar => self.move_sidebar(1),
                NotesFocus::List => {
                    if self.note_idx + 1 < self.notes.len() {
                        self.note_idx += 1;
                    }
                }
            },
            KeyCode::Char('n') => {
                self.mode = Mode::Editing(Editor::new(self.max_title, self.browser.selected_tag()));
                self.status = "New note (Tab fields, Ctrl-S save, Esc cancel)".into();
            }
            KeyCode::Enter | KeyCode::Char('e') => {
                if let Some(entry) = self.notes.get(self.note_idx) {
                    self.open_editor(entry.clone());
                } else {
                    self.status = "No note selected to edit".into();
                }
            }
            KeyCode::Char('d') => {
                if let Some(entry) = self.notes.get(self.note_idx) {
                    self.mode = Mode::ConfirmDelete(DeleteTarget::Note {
                        id: entry.note.id,
                        title: entry.note.title.clone(),
                    });
                } else {
                    self.status = "No note selected to delete".into();
                }
            }
            KeyCode::Char('x') => {
                if let Some(entry) = self.notes.get(self.note_idx) {
                    self.export(entry.note.id);
                } else {
                    self.status = "No note selected to export".into();
                }
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Esc => self.set_view(ViewMode::Notes),
            KeyCode::Up => self.result_idx = self.result_idx.saturating_sub(1),
            KeyCode::Down => {
                if self.result_idx + 1 < self.results.len() {
                    self.result_idx += 1;
                }
            }
            KeyCode::Left => self.query.move_left(),
            KeyCode::Right => self.query.move_right(),
            KeyCode::Enter => {
                if let Some(entry) = self.results.get(self.result_idx) {
                    self.open_editor(entry.clone());
                }
            }
            KeyCode::Backspace => {
                self.query.backspace();
                self.run_search();
            }
            KeyCode::Char(c) => {
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                    && self.query.insert_char(c)
                {
                    self.run_search();
                }
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_tags_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.tag_idx = self.tag_idx.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                if self.tag_idx + 1 < self.tags.len() {
                    self.tag_idx += 1;
                }
            }
            KeyCode::Char('a') | KeyCode::Char('n') => {
                let max = self.store.max_tag_count();
                if self.tags.len() >= max {
                    self.status = StoreError::TagLimitExceeded { max }.to_string();
                } else {
                    self.mode = Mode::TagForm {
                        tag_id: None,
                        name: FieldValue::new(""),
                    };
                }
            }
            KeyCode::Char('r') | KeyCode::Enter => {
                if let Some(entry) = self.tags.get(self.tag_idx) {
                    self.mode = Mode::TagForm {
                        tag_id: Some(entry.tag.id),
                        name: FieldValue::new(&entry.tag.name),
                    };
                }
            }
            KeyCode::Char('c') => {
                if let Some(entry) = self.tags.get(self.tag_idx) {
                    let id = entry.tag.id;
                    let (name, color) = next_palette_color(&entry.tag.color);
                    let store = self.store.clone();
                    self.spawn_mutation(async move {
                        store.recolor_tag(id, color.to_string()).await?;
                        anyhow::Ok(format!("Tag color set to {}", name))
                    });
                }
            }
            KeyCode::Char('d') => {
                if let Some(entry) = self.tags.get(self.tag_idx) {
                    self.mode = Mode::ConfirmDelete(DeleteTarget::Tag {
                        id: entry.tag.id,
                        name: entry.tag.name.clone(),
                    });
                }
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_editor_key(&mut self, key: KeyEvent) -> Result<bool> {
        let mode = std::mem::replace(&mut self.mode, Mode::Normal);
        let Mode::Editing(mut editor) = mode else {
            self.mode = mode;
            return Ok(false);
        };
        let close = self.process_editor_key(&mut editor, key);
        if !close {
            self.mode = Mode::Editing(editor);
        }
        Ok(false)
    }

    fn process_editor_key(&mut self, editor: &mut Editor, key: KeyEvent) -> bool {
        let control = key.modifiers.contains(KeyModifiers::CONTROL);
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        match key.code {
            KeyCode::Esc => {
                self.status = "Canceled".into();
                return true;
            }
            KeyCode::Char('s') if control => return self.save(editor),
            KeyCode::Enter if control => return self.save(editor),
            KeyCode::Tab => editor.next_field(),
            KeyCode::BackTab => editor.prev_field(),
            _ => {}
        }
        let outcome = match editor.field {
            EditorField::Title => {
                match key.code {
                    KeyCode::Left => editor.title.move_left(),
                    KeyCode::Right => editor.title.move_right(),
                    KeyCode::Backspace => editor.title.backspace(),
                    KeyCode::Enter => editor.next_field(),
                    KeyCode::Char(c) if !control => {
                        if !editor.title.insert_char(c) {
                            self.status =
                                format!("Title is limited to {} characters", self.max_title);
                        }
                    }
                    _ => {}
                }
                Ok(())
            }
            EditorField::Body => self.process_body_key(editor, key, control, shift),
            EditorField::Tag => {
                match key.code {
                    KeyCode::Left | KeyCode::Up => editor.tag_id = self.cycle_tag(editor.tag_id, -1),
                    KeyCode::Right | KeyCode::Down | KeyCode::Char(' ') => {
                        editor.tag_id = self.cycle_tag(editor.tag_id, 1)
                    }
                    _ => {}
                }
                Ok(())
            }
        };
        if let Err(err) = outcome {
            self.status = format!("Edit failed: {}", err);
        }
        false
    }

    fn process_body_key(
        &mut self,
        editor: &mut Editor,
        key: KeyEvent,
        control: bool,
        shift: bool,
    ) -> Result<(), notebook::styled::StyleError> {
        match key.code {
            KeyCode::Char('b') if control => self.report_toggle("Bold", editor.toggle(StyleKind::Bold)?),
            KeyCode::Char('t') if control => {
                self.report_toggle("Italic", editor.toggle(StyleKind::Italic)?)
            }
            KeyCode::Char('k') if control => {
                self.status = match editor.cycle_color()? {
                    Some(name) => format!("Color: {}", name),
                    None => "Select text first (Shift+arrows)".into(),
                };
            }
            KeyCode::Char(c) if !control => editor.insert(&c.to_string())?,
            KeyCode::Enter => editor.insert("\n")?,
            KeyCode::Backspace => editor.backspace()?,
            KeyCode::Delete => editor.delete_forward()?,
            KeyCode::Left => editor.move_left(shift),
            KeyCode::Right => editor.move_right(shift),
            KeyCode::Up => editor.move_up(shift),
            KeyCode::Down => editor.move_down(shift),
            KeyCode::Home => editor.home(shift),
            KeyCode::End => editor.end(shift),
            _ => {}
        }
        Ok(())
    }

    fn report_toggle(&mut self, label: &str, toggled: Option<bool>) {
        self.status = match toggled {
            Some(true) => format!("{} on", label),
            Some(false) => format!("{} off", label),
            None => "Select text first (Shift+arrows)".into(),
        };
    }

    /// Validates and submits the editor. Returns whether it should close.
    fn save(&mut self, editor: &Editor) -> bool {
        let title = match validate_title(&editor.title.value, self.max_title) {
            Ok(title) => title,
            Err(err) => {
                self.status = format!("Could not save: {}", err);
                return false;
            }
        };
        let store = self.store.clone();
        let tag_id = editor.tag_id;
        match editor.note_id {
            None => {
                let draft = NoteDraft::new(title, editor.body(), tag_id);
                self.spawn_mutation(async move {
                    let id = store.create_note(draft).await?;
                    anyhow::Ok(format!("Created note {}", id))
                });
            }
            Some(id) => {
                let changes = NoteChanges::default()
                    .with_title(title)
                    .with_body(editor.body())
                    .with_tag(tag_id);
                self.spawn_mutation(async move {
                    store.update_note(id, changes).await?;
                    anyhow::Ok(format!("Updated note {}", id))
                });
            }
        }
        true
    }

    fn handle_tag_form_key(&mut self, key: KeyEvent) -> Result<bool> {
        let mode = std::mem::replace(&mut self.mode, Mode::Normal);
        let Mode::TagForm { tag_id, mut name } = mode else {
            self.mode = mode;
            return Ok(false);
        };
        match key.code {
            KeyCode::Esc => {
                self.status = "Canceled".into();
                return Ok(false);
            }
            KeyCode::Enter => match validate_tag_name(&name.value) {
                Ok(valid) => {
                    let store = self.store.clone();
                    self.spawn_mutation(async move {
                        match tag_id {
                            Some(id) => {
                                store.update_tag(id, valid.clone()).await?;
                                anyhow::Ok(format!("Renamed tag to {}", valid))
                            }
                            None => {
                                store.create_tag(valid.clone()).await?;
                                anyhow::Ok(format!("Added tag {}", valid))
                            }
                        }
                    });
                    return Ok(false);
                }
                Err(err) => self.status = err.to_string(),
            },
            KeyCode::Left => name.move_left(),
            KeyCode::Right => name.move_right(),
            KeyCode::Backspace => name.backspace(),
            KeyCode::Char(c) => {
                name.insert_char(c);
            }
            _ => {}
        }
        self.mode = Mode::TagForm { tag_id, name };
        Ok(false)
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                let mode = std::mem::replace(&mut self.mode, Mode::Normal);
                let store = self.store.clone();
                match mode {
                    Mode::ConfirmDelete(DeleteTarget::Note { id, title }) => {
                        self.spawn_mutation(async move {
                            store.delete_note(id).await?;
                            anyhow::Ok(format!("Deleted \"{}\"", title))
                        });
                    }
                    Mode::ConfirmDelete(DeleteTarget::Tag { id, name }) => {
                        self.spawn_mutation(async move {
                            store.delete_tag(id).await?;
                            anyhow::Ok(format!("Deleted tag {}; its notes are now untagged", name))
                        });
                    }
                    other => self.mode = other,
                }
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.status = "Delete canceled".into();
                self.mode = Mode::Normal;
            }
            _ => {}
        }
        Ok(false)
    }

    fn set_view(&mut self, view: ViewMode) {
        if self.view != view {
            self.view = view;
            self.status = format!("Switched to {} view", view.label());
        }
    }

    fn open_editor(&mut self, entry: NoteWithTag) {
        let note = entry.to_note();
        self.status = format!("Editing \"{}\" (Ctrl-B bold, Ctrl-T italic, Ctrl-K color)", note.title);
        self.mode = Mode::Editing(Editor::from_note(&note, self.max_title));
    }

    fn move_sidebar(&mut self, delta: isize) {
        let len = self.tags.len() + 1;
        let next = (self.sidebar_idx as isize + delta).clamp(0, len as isize - 1) as usize;
        if next == self.sidebar_idx {
            return;
        }
        self.sidebar_idx = next;
        self.note_idx = 0;
        let tag = next.checked_sub(1).and_then(|i| self.tags.get(i)).map(|t| t.tag.id);
        self.select_tag(tag);
    }

    fn cycle_tag(&self, current: Option<TagId>, delta: isize) -> Option<TagId> {
        let options: Vec<Option<TagId>> = std::iter::once(None)
            .chain(self.tags.iter().map(|t| Some(t.tag.id)))
            .collect();
        let pos = options.iter().position(|o| *o == current).unwrap_or(0) as isize;
        let len = options.len() as isize;
        options[((pos + delta).rem_euclid(len)) as usize]
    }

    fn select_tag(&self, tag: Option<TagId>) {
        let browser = self.browser.clone();
        let tx = self.events_tx.clone();
        self.rt.spawn(async move {
            if let Err(err) = browser.select_tag(tag).await {
                let _ = tx.send(AppEvent::Failed(format!("Loading notes failed: {}", err)));
            }
        });
    }

    fn run_search(&mut self) {
        self.result_idx = 0;
        let search = self.search.clone();
        let keyword = self.query.value.clone();
        let tx = self.events_tx.clone();
        self.rt.spawn(async move {
            if let Err(err) = search.search(&keyword).await {
                let _ = tx.send(AppEvent::Failed(format!("Search failed: {}", err)));
            }
        });
    }

    fn export(&mut self, id: NoteId) {
        let store = self.store.clone();
        let dir = self.export_dir.clone();
        let tx = self.events_tx.clone();
        self.status = "Exporting...".into();
        self.rt.spawn(async move {
            let outcome = async move {
                let note = store
                    .get_note(id)
                    .await?
                    .ok_or_else(|| anyhow!(StoreError::NoteNotFound(id)))?;
                let path =
                    tokio::task::spawn_blocking(move || export_note(&note, &dir, &Local::now()))
                        .await??;
                anyhow::Ok(path)
            }
            .await;
            let event = match outcome {
                Ok(path) => AppEvent::Status(format!("Exported to {}", path.display())),
                Err(err) => {
                    warn!("export of note {} failed: {:#}", id, err);
                    AppEvent::Failed(format!("Export failed: {:#}", err))
                }
            };
            let _ = tx.send(event);
        });
    }

    /// Runs a store mutation in the background, reports its outcome, then
    /// reloads every view.
    fn spawn_mutation<F>(&self, work: F)
    where
        F: Future<Output = Result<String>> + Send + 'static,
    {
        let tx = self.events_tx.clone();
        let reload = self.reloader();
        self.rt.spawn(async move {
            let event = match work.await {
                Ok(message) => AppEvent::Status(message),
                Err(err) => AppEvent::Failed(format!("{:#}", err)),
            };
            let _ = tx.send(event);
            reload.await;
        });
    }

    fn reload(&self) {
        self.rt.spawn(self.reloader());
    }

    fn reloader(&self) -> impl Future<Output = ()> + Send + 'static {
        let browser = self.browser.clone();
        let search = self.search.clone();
        let store = self.store.clone();
        let tx = self.events_tx.clone();
        async move {
            let tags = store.list_tags_with_counts().await;
            let notes = browser.refresh().await;
            let results = search.refresh().await;
            let event = match (tags, notes, results) {
                (Ok(tags), Ok(_), Ok(_)) => AppEvent::Tags(tags),
                (Err(err), _, _) | (_, Err(err), _) | (_, _, Err(err)) => {
                    AppEvent::Failed(format!("Reload failed: {}", err))
                }
            };
            let _ = tx.send(event);
        }
    }

    fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(4),
            ])
            .split(f.size());

        let now = Local::now();
        self.draw_header(f, layout[0]);
        match self.view {
            ViewMode::Notes => self.draw_notes(f, layout[1], &now),
            ViewMode::Search => self.draw_search(f, layout[1], &now),
            ViewMode::Tags => self.draw_tags(f, layout[1]),
        }
        self.draw_footer(f, layout[2]);

        match &self.mode {
            Mode::Editing(editor) => self.draw_editor(f, editor),
            Mode::TagForm { tag_id, name } => self.draw_tag_form(f, tag_id.is_some(), name),
            Mode::ConfirmDelete(target) => draw_confirm(f, target),
            Mode::Normal => {}
        }
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let title = Line::from(vec![
            Span::styled(
                "notebook ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("{}", self.db_path.display()),
                Style::default().fg(Color::DarkGray),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("{} tags", self.tags.len()),
                Style::default().fg(Color::Green),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("view {}", self.view.label().to_lowercase()),
                Style::default().fg(Color::Magenta),
            ),
        ]);
        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        let paragraph = Paragraph::new(title)
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
    }

    fn draw_notes(&mut self, f: &mut ratatui::Frame<'_>, area: Rect, now: &DateTime<Local>) {
        let sections = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(28), Constraint::Percentage(72)])
            .split(area);

        let total: usize = self.notes.len();
        let mut items = vec![ListItem::new(Line::from(vec![
            Span::styled("● ", Style::default().fg(Color::White)),
            Span::raw(if self.browser.selected_tag().is_none() {
                format!("All ({})", total)
            } else {
                "All".to_string()
            }),
        ]))];
        items.extend(self.tags.iter().map(|entry| {
            ListItem::new(Line::from(vec![
                Span::styled("● ", Style::default().fg(tag_color(&entry.tag.color))),
                Span::raw(format!("{} ({})", entry.tag.name, entry.note_count)),
            ]))
        }));
        let mut state = ListState::default();
        state.select(Some(self.sidebar_idx.min(items.len().saturating_sub(1))));
        let sidebar_focused = self.focus == NotesFocus::Sidebar;
        let sidebar = List::new(items)
            .block(panel_block("Tags", sidebar_focused))
            .highlight_style(highlight(sidebar_focused));
        f.render_stateful_widget(sidebar, sections[0], &mut state);

        let viewport = sections[1].height.saturating_sub(2) as usize / 2;
        self.note_offset = adjust_offset(self.note_idx, self.note_offset, viewport, 1, total);
        let list_focused = self.focus == NotesFocus::List;
        let offset = self.note_offset;
        self.draw_note_list(f, sections[1], "Notes", NoteListState {
            notes: &self.notes,
            selected: self.note_idx,
            offset,
            focused: list_focused,
            empty: "No notes yet. Press n to write one.",
        }, now);
    }

    fn draw_search(&mut self, f: &mut ratatui::Frame<'_>, area: Rect, now: &DateTime<Local>) {
        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3)])
            .split(area);
        let input = Paragraph::new(self.query.with_caret()).block(
            Block::default()
                .title("Search titles")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );
        f.render_widget(input, sections[0]);

        let viewport = sections[1].height.saturating_sub(2) as usize / 2;
        let offset = adjust_offset(self.result_idx, 0, viewport, 1, self.results.len());
        let empty = if self.search.keyword().is_empty() {
            "Type to search note titles"
        } else {
            "No matching notes"
        };
        self.draw_note_list(f, sections[1], "Results", NoteListState {
            notes: &self.results,
            selected: self.result_idx,
            offset,
            focused: true,
            empty,
        }, now);
    }

    fn draw_note_list(
        &self,
        f: &mut ratatui::Frame<'_>,
        area: Rect,
        title: &str,
        list: NoteListState<'_>,
        now: &DateTime<Local>,
    ) {
        let width = area.width.saturating_sub(4) as usize;
        let items = if list.notes.is_empty() {
            vec![ListItem::new(list.empty)]
        } else {
            list.notes
                .iter()
                .map(|entry| note_item(entry, width, now))
                .collect()
        };
        let mut state = ListState::default();
        *state.offset_mut() = list.offset;
        if list.focused && !list.notes.is_empty() {
            state.select(Some(list.selected.min(list.notes.len() - 1)));
        }
        let widget = List::new(items)
            .block(panel_block(&format!("{} ({})", title, list.notes.len()), list.focused))
            .highlight_style(highlight(list.focused));
        f.render_stateful_widget(widget, area, &mut state);
    }

    fn draw_tags(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let items = if self.tags.is_empty() {
            vec![ListItem::new("No tags yet. Press a to add one.")]
        } else {
            self.tags
                .iter()
                .map(|entry| {
                    ListItem::new(Line::from(vec![
                        Span::styled("■ ", Style::default().fg(tag_color(&entry.tag.color))),
                        Span::styled(
                            format!("{:<16}", truncate_text(&entry.tag.name, 16)),
                            Style::default().add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(
                            format!("{}  ", entry.tag.color),
                            Style::default().fg(Color::DarkGray),
                        ),
                        Span::raw(format!("{} note(s)", entry.note_count)),
                    ]))
                })
                .collect()
        };
        let mut state = ListState::default();
        if !self.tags.is_empty() {
            state.select(Some(self.tag_idx));
        }
        let title = format!("Tags ({} / {})", self.tags.len(), self.store.max_tag_count());
        let list = List::new(items)
            .block(panel_block(&title, true))
            .highlight_style(highlight(true));
        f.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Length(2)])
            .split(area);

        let help_bar = Paragraph::new(self.footer_help_line())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(help_bar, rows[0]);

        let status = Paragraph::new(self.status.clone())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(status, rows[1]);
    }

    fn footer_help_line(&self) -> Line<'static> {
        let key = |k: &'static str, color: Color| Span::styled(k, Style::default().fg(color));
        let mut spans = Vec::new();
        if self.view != ViewMode::Search {
            spans.extend([
                key("1", Color::LightCyan),
                Span::raw(" notes  "),
                key("2 /", Color::LightCyan),
                Span::raw(" search  "),
                key("3", Color::LightCyan),
                Span::raw(" tags  "),
            ]);
        }
        match self.view {
            ViewMode::Notes => spans.extend([
                key("Tab", Color::LightCyan),
                Span::raw(" focus  "),
                key("n", Color::LightMagenta),
                Span::raw(" new  "),
                key("e", Color::LightYellow),
                Span::raw(" edit  "),
                key("x", Color::LightGreen),
                Span::raw(" export  "),
                key("d", Color::LightRed),
                Span::raw(" delete  "),
                key("q", Color::LightRed),
                Span::raw(" quit"),
            ]),
            ViewMode::Search => spans.extend([
                key("type", Color::LightCyan),
                Span::raw(" filter titles  "),
                key("↑↓", Color::LightCyan),
                Span::raw(" browse  "),
                key("Enter", Color::LightYellow),
                Span::raw(" edit  "),
                key("Esc", Color::LightRed),
                Span::raw(" back"),
            ]),
            ViewMode::Tags => spans.extend([
                key("a", Color::LightMagenta),
                Span::raw(" add  "),
                key("r", Color::LightYellow),
                Span::raw(" rename  "),
                key("c", Color::LightGreen),
                Span::raw(" color  "),
                key("d", Color::LightRed),
                Span::raw(" delete  "),
                key("q", Color::LightRed),
                Span::raw(" quit"),
            ]),
        }
        Line::from(spans)
    }

    fn draw_editor(&self, f: &mut ratatui::Frame<'_>, editor: &Editor) {
        let area = centered_rect(70, 70, f.size());
        let label = Style::default()
            .fg(Color::Gray)
            .add_modifier(Modifier::BOLD | Modifier::DIM);
        let active = |field: EditorField| {
            Style::default().fg(if editor.field == field {
                Color::Cyan
            } else {
                Color::White
            })
        };

        let mut lines = Vec::new();
        let title = if editor.field == EditorField::Title {
            editor.title.with_caret()
        } else {
            editor.title.value.clone()
        };
        lines.push(Line::from(vec![
            Span::styled("Title: ", label),
            Span::styled(title, active(EditorField::Title)),
            Span::styled(
                format!("  {}/{}", editor.title.value.chars().count(), self.max_title),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
        let tag = editor.tag_id.and_then(|id| self.tags.iter().find(|t| t.tag.id == id));
        lines.push(Line::from(vec![
            Span::styled("Tag: ", label),
            match tag {
                Some(entry) => Span::styled(
                    format!("● {}", entry.tag.name),
                    active(EditorField::Tag).fg(tag_color(&entry.tag.color)),
                ),
                None => Span::styled("(none)", active(EditorField::Tag)),
            },
            Span::styled(
                if editor.field == EditorField::Tag {
                    "  ←/→ to change"
                } else {
                    ""
                },
                Style::default().fg(Color::DarkGray),
            ),
        ]));
        lines.push(Line::from(Span::styled("Body:", label)));
        lines.extend(body_lines(editor, editor.field == EditorField::Body));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Ctrl-S save • Esc cancel • Tab next field • Shift+arrows select • Ctrl-B bold • Ctrl-T italic • Ctrl-K color",
            Style::default().fg(Color::Gray),
        )));

        let heading = if editor.note_id.is_some() {
            "Edit Note"
        } else {
            "New Note"
        };
        let dialog = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(Span::styled(
                        heading,
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }

    fn draw_tag_form(&self, f: &mut ratatui::Frame<'_>, renaming: bool, name: &FieldValue) {
        let area = centered_rect(50, 25, f.size());
        let body = vec![
            Line::from(vec![
                Span::styled("Name: ", Style::default().fg(Color::Gray)),
                Span::styled(name.with_caret(), Style::default().fg(Color::Cyan)),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                "Enter to save • Esc to cancel",
                Style::default().fg(Color::Gray),
            )),
        ];
        let dialog = Paragraph::new(body).block(
            Block::default()
                .title(if renaming { "Rename Tag" } else { "New Tag" })
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }
}

struct NoteListState<'a> {
    notes: &'a [NoteWithTag],
    selected: usize,
    offset: usize,
    focused: bool,
    empty: &'static str,
}

fn draw_confirm(f: &mut ratatui::Frame<'_>, target: &DeleteTarget) {
    let area = centered_rect(50, 30, f.size());
    let (question, detail) = match target {
        DeleteTarget::Note { title, .. } => (format!("Delete \"{}\"?", title), String::new()),
        DeleteTarget::Tag { name, .. } => (
            format!("Delete tag \"{}\"?", name),
            "Its notes are kept and become untagged.".to_string(),
        ),
    };
    let body = vec![
        Line::from(Span::styled(
            question,
            Style::default()
                .fg(Color::LightRed)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(detail),
        Line::from(""),
        Line::from("Press y to confirm, n or Esc to cancel"),
    ];
    let dialog = Paragraph::new(body).alignment(Alignment::Center).block(
        Block::default()
            .title(Span::styled(
                "Confirm Delete",
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::LightRed)),
    );
    f.render_widget(Clear, area);
    f.render_widget(dialog, area);
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn panel_block(title: &str, focused: bool) -> Block<'static> {
    let accent = if focused { Color::Cyan } else { Color::DarkGray };
    Block::default()
        .title(Span::styled(
            title.to_string(),
            Style::default()
                .fg(if focused { Color::Cyan } else { Color::Gray })
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent))
}

fn highlight(focused: bool) -> Style {
    if focused {
        Style::default()
            .bg(Color::LightCyan)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    }
}

fn tag_color(hex: &str) -> Color {
    hex.parse::<TextColor>()
        .map(|c| Color::Rgb(c.r, c.g, c.b))
        .unwrap_or(Color::Gray)
}

/// The palette entry following `current`, wrapping around.
fn next_palette_color(current: &str) -> (&'static str, TextColor) {
    let idx = current
        .parse::<TextColor>()
        .ok()
        .and_then(|c| PALETTE.iter().position(|(_, p)| *p == c))
        .map(|i| (i + 1) % PALETTE.len())
        .unwrap_or(0);
    PALETTE[idx]
}

fn span_style(style: &ActiveStyles) -> Style {
    let mut out = Style::default();
    if style.bold {
        out = out.add_modifier(Modifier::BOLD);
    }
    if style.italic {
        out = out.add_modifier(Modifier::ITALIC);
    }
    if let Some(color) = style.color {
        out = out.fg(Color::Rgb(color.r, color.g, color.b));
    }
    out
}

/// Renders the editor body with its styling, the selection reversed and the
/// cursor shown as an underlined cell.
fn body_lines(editor: &Editor, show_cursor: bool) -> Vec<Line<'static>> {
    let body = editor.body();
    let selection = editor.selection();
    let cursor = show_cursor.then_some(editor.cursor());
    let mut lines = Vec::new();
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut pending = String::new();
    let mut pending_style = Style::default();

    for run in body.runs() {
        let base = span_style(&run.style);
        for (offset, ch) in body.slice(run.start, run.end).chars().enumerate() {
            let pos = run.start + offset;
            let mut style = base;
            if selection.is_some_and(|(start, end)| start <= pos && pos < end) {
                style = style.add_modifier(Modifier::REVERSED);
            }
            if cursor == Some(pos) {
                style = style.add_modifier(Modifier::UNDERLINED | Modifier::SLOW_BLINK);
            }
            if ch == '\n' {
                flush(&mut spans, &mut pending, pending_style);
                if cursor == Some(pos) {
                    spans.push(Span::styled(" ", style));
                }
                lines.push(Line::from(std::mem::take(&mut spans)));
                continue;
            }
            if style != pending_style {
                flush(&mut spans, &mut pending, pending_style);
                pending_style = style;
            }
            pending.push(ch);
        }
    }
    flush(&mut spans, &mut pending, pending_style);
    if cursor == Some(body.len()) {
        spans.push(Span::styled("▌", Style::default().fg(Color::Cyan)));
    }
    lines.push(Line::from(spans));
    lines
}

fn flush(spans: &mut Vec<Span<'static>>, pending: &mut String, style: Style) {
    if !pending.is_empty() {
        spans.push(Span::styled(std::mem::take(pending), style));
    }
}

fn note_item(entry: &NoteWithTag, width: usize, now: &DateTime<Local>) -> ListItem<'static> {
    let when = format_relative(&entry.note.modified_at.with_timezone(&Local), now);
    let mut head = vec![Span::styled(
        truncate_text(&entry.note.title, width.saturating_sub(when.len() + 16).max(8)),
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    )];
    if let (Some(name), Some(color)) = (&entry.tag_name, &entry.tag_color) {
        head.push(Span::raw("  "));
        head.push(Span::styled(
            format!("#{}", name),
            Style::default().fg(tag_color(color)),
        ));
    }
    head.push(Span::raw("  "));
    head.push(Span::styled(when, Style::default().fg(Color::DarkGray)));

    let preview = if entry.note.formatted_content.is_empty() {
        entry.note.content.clone()
    } else {
        markup::to_plain_text(&entry.note.formatted_content)
    };
    let first_line = preview.lines().next().unwrap_or("").to_string();
    let lines = vec![
        Line::from(head),
        Line::from(Span::styled(
            format!("  {}", truncate_text(&first_line, width.saturating_sub(2))),
            Style::default().fg(Color::Gray).add_modifier(Modifier::DIM),
        )),
    ];
    ListItem::new(lines)
}

fn adjust_offset(
    selected: usize,
    current_offset: usize,
    viewport: usize,
    scrolloff: usize,
    len: usize,
) -> usize {
    if viewport == 0 || len == 0 {
        return 0;
    }
    let max_offset = len.saturating_sub(viewport);
    let margin = scrolloff.min(viewport.saturating_sub(1));
    let mut offset = current_offset.min(max_offset);
    if selected < offset.saturating_add(margin) {
        offset = selected.saturating_sub(margin);
    } else {
        let upper = offset
            .saturating_add(viewport.saturating_sub(1))
            .saturating_sub(margin);
        if selected > upper {
            offset = selected.saturating_add(margin + 1).saturating_sub(viewport);
        }
    }
    offset.min(max_offset)
}

fn truncate_text(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max <= 3 {
        return text.chars().take(max).collect();
    }
    let mut out: String = text.chars().take(max - 3).collect();
    out.push_str("...");
    out
}
