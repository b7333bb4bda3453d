use std::collections::HashMap;
use std::sync::mpsc::Receiver;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use kanban_core::task::Task;
use kanban_service::{BlockingHttpService, ServiceError};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use tracing::{info, warn};

use crate::components::board::{Board, MSG_LOAD_FAILED, MSG_MOVE_FAILED};
use crate::components::card::{
    generated_label, AdviceState, CardField, FieldEdit, TaskCard, CONFIRM_DELETE,
};
use crate::components::form::{FormField, FormOutcome, TaskForm};
use crate::components::{expire, Banner, BannerKind};
use crate::events::{self, BoardEvent, EventSender};

pub const MSG_NETWORK_LOST: &str =
    "Network connection lost. Some features may not work properly.";

const NETWORK_BANNER_TTL: Duration = Duration::from_secs(5);
pub const PROBE_INTERVAL: Duration = Duration::from_secs(10);

/// What the app is currently doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Board navigation
    Normal,
    /// The new-task form is open
    NewTask,
    /// Viewing one task; field editing lives on its card
    Card { task_id: i64 },
    /// Waiting for y/n before deleting
    ConfirmDelete { task_id: i64 },
}

/// A blocking request queued until the loading state has been drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Advice(i64),
    CreateTask,
}

/// Fetch the task list, retrying with a linear backoff
/// (`base_delay * attempt`) between attempts.
pub fn load_with_retry(
    service: &BlockingHttpService,
    max_attempts: u32,
    base_delay: Duration,
) -> Result<Vec<Task>, ServiceError> {
    let mut attempt = 1;
    loop {
        match service.list_tasks() {
            Ok(tasks) => return Ok(tasks),
            Err(e) if attempt < max_attempts => {
                warn!(attempt, max_attempts, error = %e, "initial load failed, retrying");
                thread::sleep(base_delay * attempt);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

pub struct App {
    service: BlockingHttpService,
    board: Board,
    form: TaskForm,
    cards: HashMap<i64, TaskCard>,
    mode: Mode,
    /// Alert from the last action, cleared on the next key.
    status_message: Option<String>,
    network_banner: Option<Banner>,
    online: bool,
    last_probe: Instant,
    pending: Option<Pending>,
    tx: EventSender,
    rx: Receiver<BoardEvent>,
}

impl App {
    pub fn new(service: BlockingHttpService) -> Result<Self> {
        let tasks = service.list_tasks()?;
        Ok(Self::with_tasks(service, tasks))
    }

    pub fn with_tasks(service: BlockingHttpService, tasks: Vec<Task>) -> Self {
        let (tx, rx) = events::channel();
        let mut app = Self {
            service,
            board: Board::new(),
            form: TaskForm::new(),
            cards: HashMap::new(),
            mode: Mode::Normal,
            status_message: None,
            network_banner: None,
            online: true,
            last_probe: Instant::now(),
            pending: None,
            tx,
            rx,
        };
        app.show_tasks(tasks);
        app
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn form(&self) -> &TaskForm {
        &self.form
    }

    pub fn card(&self, task_id: i64) -> Option<&TaskCard> {
        self.cards.get(&task_id)
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn network_banner(&self) -> Option<&Banner> {
        self.network_banner.as_ref()
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn is_input_mode(&self) -> bool {
        match &self.mode {
            Mode::NewTask => true,
            Mode::Card { task_id } => self.cards.get(task_id).is_some_and(|c| c.is_editing()),
            _ => false,
        }
    }

    fn show_tasks(&mut self, tasks: Vec<Task>) {
        self.cards = tasks
            .iter()
            .map(|t| (t.id, TaskCard::new(t.clone())))
            .collect();
        self.board.load(tasks);
    }

    /// Full reload of the task list.
    pub fn reload(&mut self) {
        match self.service.list_tasks() {
            Ok(tasks) => {
                info!(count = tasks.len(), "tasks reloaded");
                self.show_tasks(tasks);
            }
            Err(e) => {
                warn!(error = %e, "reload failed");
                self.board.show_error(MSG_LOAD_FAILED);
            }
        }
    }

    /// Apply everything cards and the form have announced.
    pub fn drain_events(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            self.board.apply(&event);
            match &event {
                BoardEvent::Created(task) => {
                    self.cards.insert(task.id, TaskCard::new(task.clone()));
                    self.board.select_task_by_id(task.id);
                }
                BoardEvent::Updated(task) | BoardEvent::StatusChanged { task, .. } => {
                    if let Some(card) = self.cards.get_mut(&task.id) {
                        card.sync(task);
                    }
                    if matches!(event, BoardEvent::StatusChanged { .. }) {
                        self.board.select_task_by_id(task.id);
                    }
                }
                BoardEvent::Deleted(task) => {
                    self.cards.remove(&task.id);
                    if self.mode_task_id() == Some(task.id) {
                        self.mode = Mode::Normal;
                    }
                }
            }
        }
    }

    fn mode_task_id(&self) -> Option<i64> {
        match self.mode {
            Mode::Card { task_id } | Mode::ConfirmDelete { task_id } => Some(task_id),
            _ => None,
        }
    }

    /// Periodic housekeeping: hide expired banners and probe the server.
    pub fn tick(&mut self, now: Instant) {
        self.board.tick(now);
        self.form.tick(now);
        expire(&mut self.network_banner, now);
        if now.duration_since(self.last_probe) >= PROBE_INTERVAL {
            self.last_probe = now;
            self.check_connectivity();
        }
    }

    /// Probe the server. Losing it raises the network banner; getting it
    /// back reloads the board.
    pub fn check_connectivity(&mut self) {
        let reachable = self.service.health().is_ok();
        match (self.online, reachable) {
            (true, false) => {
                warn!(server = self.service.base_url(), "server unreachable");
                self.online = false;
                self.network_banner = Some(Banner::new(
                    MSG_NETWORK_LOST,
                    BannerKind::Warning,
                    NETWORK_BANNER_TTL,
                ));
            }
            (false, true) => {
                info!(server = self.service.base_url(), "server reachable again");
                self.online = true;
                self.network_banner = None;
                self.reload();
            }
            _ => {}
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Run the queued request. Called by the event loop after the loading
    /// state has been drawn.
    pub fn run_pending(&mut self) {
        match self.pending.take() {
            Some(Pending::Advice(id)) => {
                if let Some(card) = self.cards.get_mut(&id) {
                    card.finish_advice(&self.service, &self.tx);
                }
            }
            Some(Pending::CreateTask) => {
                if self.form.finish_submit(&self.service, &self.tx) {
                    self.mode = Mode::Normal;
                }
            }
            None => return,
        }
        self.drain_events();
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        self.status_message = None;

        match self.mode.clone() {
            Mode::Normal => self.handle_normal(key),
            Mode::NewTask => self.handle_new_task(key),
            Mode::Card { task_id } => self.handle_card(key, task_id),
            Mode::ConfirmDelete { task_id } => self.handle_confirm_delete(key, task_id),
        }
        self.drain_events();
    }

    fn handle_normal(&mut self, key: KeyEvent) {
        let selected = self.board.selected_task().map(|t| t.id);
        match key.code {
            KeyCode::Esc => self.dismiss_banners(),
            KeyCode::Char('n') => self.mode = Mode::NewTask,
            KeyCode::Char('r') => self.reload(),
            KeyCode::Enter => {
                if let Some(task_id) = selected {
                    self.mode = Mode::Card { task_id };
                }
            }
            KeyCode::Char('s') => {
                if let Some(task_id) = selected {
                    self.move_task(task_id);
                }
            }
            KeyCode::Char('d') => {
                if let Some(task_id) = selected {
                    self.mode = Mode::ConfirmDelete { task_id };
                }
            }
            KeyCode::Char('a') => {
                if let Some(task_id) = selected {
                    self.mode = Mode::Card { task_id };
                    self.request_advice(task_id, false);
                }
            }
            _ => self.board.handle_key(key),
        }
    }

    fn dismiss_banners(&mut self) {
        self.board.dismiss_banner();
        self.network_banner = None;
    }

    /// Advance a task's status from the board.
    fn move_task(&mut self, task_id: i64) {
        let Some(task) = self.board.task(task_id) else {
            return;
        };
        let from = task.status;
        match self.service.set_status(&task_id.to_string(), &from.next().into()) {
            Ok(task) => {
                let _ = self.tx.send(BoardEvent::StatusChanged { task, from });
            }
            Err(e) => {
                warn!(task_id, error = %e, "move failed");
                self.board.show_error(MSG_MOVE_FAILED);
            }
        }
    }

    fn handle_new_task(&mut self, key: KeyEvent) {
        match self.form.handle_key(key) {
            FormOutcome::Open => {}
            FormOutcome::Cancelled => self.mode = Mode::Normal,
            FormOutcome::Pending => self.pending = Some(Pending::CreateTask),
        }
    }

    fn handle_card(&mut self, key: KeyEvent, task_id: i64) {
        let Some(card) = self.cards.get_mut(&task_id) else {
            self.mode = Mode::Normal;
            return;
        };

        if card.is_editing() {
            self.status_message = card.edit_key(key, &self.service, &self.tx);
            return;
        }

        match key.code {
            KeyCode::Esc => self.mode = Mode::Normal,
            KeyCode::Char('t') => card.begin_edit(CardField::Title),
            KeyCode::Char('e') => card.begin_edit(CardField::Description),
            KeyCode::Char('s') => {
                if let Err(alert) = card.advance_status(&self.service, &self.tx) {
                    self.status_message = Some(alert);
                }
            }
            KeyCode::Char('d') => self.mode = Mode::ConfirmDelete { task_id },
            KeyCode::Char('a') => self.request_advice(task_id, false),
            KeyCode::Char('r') => self.request_advice(task_id, true),
            _ => {}
        }
    }

    fn request_advice(&mut self, task_id: i64, regenerate: bool) {
        if let Some(card) = self.cards.get_mut(&task_id) {
            if card.request_advice(regenerate) {
                self.pending = Some(Pending::Advice(task_id));
            }
        }
    }

    fn handle_confirm_delete(&mut self, key: KeyEvent, task_id: i64) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.mode = Mode::Normal;
                if let Some(card) = self.cards.get(&task_id) {
                    if let Err(alert) = card.delete(&self.service, &self.tx) {
                        self.status_message = Some(alert);
                    }
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.mode = Mode::Normal;
            }
            _ => {}
        }
    }

    // ---- Rendering ----

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);

        self.render_title_bar(frame, layout[0]);
        self.board.render(frame, layout[1]);
        self.render_status_bar(frame, layout[2]);

        match &self.mode {
            Mode::Normal => {}
            Mode::NewTask => self.render_form(frame, area),
            Mode::Card { task_id } => {
                if let Some(card) = self.cards.get(task_id) {
                    self.render_card(frame, card, area);
                    if let FieldEdit::Editing { field, buffer } = card.edit() {
                        let label = match field {
                            CardField::Title => " Title ",
                            CardField::Description => " Description ",
                        };
                        render_input_bar(frame, label, buffer, area);
                    }
                }
            }
            Mode::ConfirmDelete { task_id } => {
                if let Some(card) = self.cards.get(task_id) {
                    render_confirm_delete(frame, card.task(), area);
                }
            }
        }
    }

    fn render_title_bar(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![
            Span::styled(" kanban ", Style::default().bold().fg(Color::Cyan)),
            Span::raw("| "),
            Span::styled(self.service.base_url(), Style::default().fg(Color::DarkGray)),
        ];
        if !self.online {
            spans.push(Span::styled(" offline", Style::default().fg(Color::Red)));
        }
        frame.render_widget(Line::from(spans), area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let banner = self
            .network_banner
            .as_ref()
            .or(self.board.banner())
            .or(self.form.message());

        let line = if let Some(msg) = &self.status_message {
            Line::from(Span::styled(format!(" {msg}"), Style::default().fg(Color::Red)))
        } else if let Some(banner) = banner {
            let mut spans = vec![Span::styled(format!(" {}", banner.text), banner.style())];
            if self.mode == Mode::Normal {
                spans.push(Span::styled("  esc:dismiss", Style::default().fg(Color::DarkGray)));
            }
            Line::from(spans)
        } else {
            let help = match self.mode {
                Mode::Normal => {
                    " n:new  enter:open  s:advance  d:delete  a:advice  r:reload  h/l j/k:move  q:quit"
                }
                Mode::NewTask => " tab:switch field  enter:create  ctrl+l:clear  esc:cancel",
                Mode::Card { .. } => {
                    " t:edit title  e:edit description  s:advance  d:delete  a:advice  r:regenerate  esc:back"
                }
                Mode::ConfirmDelete { .. } => " y:delete  n:cancel",
            };
            Line::from(Span::styled(help, Style::default().fg(Color::DarkGray)))
        };
        frame.render_widget(line, area);
    }

    fn render_form(&self, frame: &mut Frame, area: Rect) {
        let popup = centered_rect(60, 50, area);
        frame.render_widget(Clear, popup);

        let block = Block::default()
            .title(" New Task ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let focused = |field| {
            if self.form.focus() == field {
                Style::default().fg(Color::Yellow).bold()
            } else {
                Style::default().bold()
            }
        };
        let error = |msg: Option<&str>| {
            Line::from(Span::styled(
                msg.unwrap_or("").to_string(),
                Style::default().fg(Color::Red),
            ))
        };

        let mut lines = vec![
            Line::from(Span::styled("Title", focused(FormField::Title))),
            Line::from(self.form.title().to_string()),
            error(self.form.title_error()),
            Line::from(""),
            Line::from(Span::styled("Description", focused(FormField::Description))),
            Line::from(self.form.description().to_string()),
            error(self.form.description_error()),
        ];
        if self.form.is_submitting() {
            lines.push(Line::from("Creating..."));
        } else if let Some(msg) = self.form.message() {
            lines.push(Line::from(Span::styled(msg.text.clone(), msg.style())));
        }

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
    }

    fn render_card(&self, frame: &mut Frame, card: &TaskCard, area: Rect) {
        let popup = centered_rect(60, 70, area);
        frame.render_widget(Clear, popup);

        let task = card.task();
        let block = Block::default()
            .title(format!(" Task #{} ", task.id))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let label = Style::default().bold();
        let mut lines = vec![
            Line::from(vec![
                Span::styled("Title: ", label),
                Span::raw(task.title.as_str()),
            ]),
            Line::from(vec![
                Span::styled("Status: ", label),
                Span::raw(task.status.display_name()),
                Span::styled(
                    format!("   [s] {}", card.status_label()),
                    Style::default().fg(Color::Green),
                ),
            ]),
            Line::from(vec![
                Span::styled("Created: ", label),
                Span::raw(
                    task.created_at
                        .with_timezone(&chrono::Local)
                        .format("%Y-%m-%d %H:%M")
                        .to_string(),
                ),
            ]),
            Line::from(""),
            Line::from(Span::styled("Description:", label)),
            Line::from(task.description.clone().unwrap_or_default()),
            Line::from(""),
        ];

        let advice_style = Style::default().fg(Color::Magenta);
        match card.advice() {
            AdviceState::Idle => {
                lines.push(Line::from(Span::styled("[a] Get AI Advice", advice_style)));
            }
            AdviceState::Loading => {
                lines.push(Line::from(Span::styled(
                    "Generating AI advice...",
                    advice_style,
                )));
            }
            AdviceState::Shown { text, generated_at } => {
                lines.push(Line::from(vec![
                    Span::styled("AI Guidance", advice_style.bold()),
                    Span::styled("   [r] Regenerate", advice_style),
                ]));
                lines.push(Line::from(text.clone()));
                lines.push(Line::from(Span::styled(
                    generated_label(*generated_at),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            AdviceState::Error(msg) => {
                lines.push(Line::from(Span::styled(
                    msg.clone(),
                    Style::default().fg(Color::Red),
                )));
                lines.push(Line::from(Span::styled("[a] Retry", advice_style)));
            }
        }

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
    }
}

fn render_input_bar(frame: &mut Frame, label: &str, input: &str, area: Rect) {
    let input_area = Rect {
        x: area.x,
        y: area.y + area.height.saturating_sub(3),
        width: area.width,
        height: 3.min(area.height),
    };
    frame.render_widget(Clear, input_area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(label);
    frame.render_widget(Paragraph::new(input).block(block), input_area);
}

fn render_confirm_delete(frame: &mut Frame, task: &Task, area: Rect) {
    let popup = centered_rect(50, 20, area);
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .title(" Delete ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));
    let text = vec![
        Line::from(CONFIRM_DELETE),
        Line::from(Span::styled(task.title.as_str(), Style::default().bold())),
        Line::from(""),
        Line::from("y / n"),
    ];
    frame.render_widget(Paragraph::new(text).block(block), popup);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
