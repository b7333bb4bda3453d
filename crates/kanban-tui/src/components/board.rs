use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent};
use kanban_core::task::{Status, Task};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState};

use super::{expire, Banner, BannerKind};
use crate::events::BoardEvent;

pub const MSG_LOAD_FAILED: &str = "Failed to load tasks. Please refresh the page.";
pub const MSG_MOVE_FAILED: &str = "Failed to move task. Please try again.";

const BANNER_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardState {
    /// Nothing has been loaded yet.
    Empty,
    Loaded,
}

/// The in-memory task list and the three status columns derived from it.
pub struct Board {
    /// Newest first, mirroring the server's list order.
    tasks: Vec<Task>,
    state: BoardState,
    selected: [usize; 3],
    active_column: usize,
    banner: Option<Banner>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            state: BoardState::Empty,
            selected: [0; 3],
            active_column: 0,
            banner: None,
        }
    }

    /// Replace the whole list, keeping the cursor on the same task if it
    /// still exists.
    pub fn load(&mut self, tasks: Vec<Task>) {
        let selected_id = self.selected_task().map(|t| t.id);
        self.tasks = tasks;
        self.state = BoardState::Loaded;
        self.clamp_selection();
        if let Some(id) = selected_id {
            self.select_task_by_id(id);
        }
    }

    pub fn state(&self) -> BoardState {
        self.state
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn column(&self, status: Status) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.status == status).collect()
    }

    pub fn column_title(&self, status: Status) -> String {
        format!("{} ({})", status.display_name(), self.column(status).len())
    }

    /// Reconcile the list with a change that already happened on the server.
    pub fn apply(&mut self, event: &BoardEvent) {
        match event {
            BoardEvent::Created(task) => {
                self.tasks.retain(|t| t.id != task.id);
                self.tasks.insert(0, task.clone());
                self.state = BoardState::Loaded;
            }
            BoardEvent::Updated(task) | BoardEvent::StatusChanged { task, .. } => {
                if let Some(slot) = self.tasks.iter_mut().find(|t| t.id == task.id) {
                    *slot = task.clone();
                }
            }
            BoardEvent::Deleted(task) => {
                self.tasks.retain(|t| t.id != task.id);
            }
        }
        self.clamp_selection();
    }

    pub fn show_error(&mut self, message: &str) {
        self.banner = Some(Banner::new(message, BannerKind::Error, BANNER_TTL));
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }

    pub fn tick(&mut self, now: Instant) {
        expire(&mut self.banner, now);
    }

    pub fn active_status(&self) -> Status {
        Status::ALL[self.active_column]
    }

    pub fn selected_task(&self) -> Option<&Task> {
        let idx = self.selected[self.active_column];
        self.column(self.active_status()).get(idx).copied()
    }

    /// Move the cursor to the task with this id. Returns `false` and leaves
    /// the cursor alone if no such task is on the board.
    pub fn select_task_by_id(&mut self, id: i64) -> bool {
        let Some(status) = self.task(id).map(|t| t.status) else {
            return false;
        };
        let pos = self.column(status).iter().position(|t| t.id == id);
        match pos {
            Some(pos) => {
                self.active_column = status.index();
                self.selected[status.index()] = pos;
                true
            }
            None => false,
        }
    }

    fn clamp_selection(&mut self) {
        for status in Status::ALL {
            let len = self.column(*status).len();
            let sel = &mut self.selected[status.index()];
            *sel = (*sel).min(len.saturating_sub(1));
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        let len = self.column(self.active_status()).len();
        let sel = &mut self.selected[self.active_column];
        match key.code {
            KeyCode::Char('h') | KeyCode::Left => {
                self.active_column = self.active_column.saturating_sub(1);
            }
            KeyCode::Char('l') | KeyCode::Right => {
                if self.active_column + 1 < Status::ALL.len() {
                    self.active_column += 1;
                }
            }
            KeyCode::Char('j') | KeyCode::Down => {
                if *sel + 1 < len {
                    *sel += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                *sel = sel.saturating_sub(1);
            }
            KeyCode::Char('g') => *sel = 0,
            KeyCode::Char('G') => *sel = len.saturating_sub(1),
            _ => {}
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ])
            .split(area);

        for (status, chunk) in Status::ALL.iter().zip(chunks.iter()) {
            self.render_column(frame, *status, *chunk);
        }
    }

    fn render_column(&self, frame: &mut Frame, status: Status, area: Rect) {
        let is_active = status.index() == self.active_column;
        let border_style = if is_active {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let block = Block::default()
            .title(format!(" {} ", self.column_title(status)))
            .borders(Borders::ALL)
            .border_style(border_style);

        let tasks = self.column(status);
        let items: Vec<ListItem> = tasks
            .iter()
            .map(|task| {
                let marker = if task.ai_advice.is_some() { "* " } else { "  " };
                ListItem::new(Line::from(vec![
                    Span::styled(marker, Style::default().fg(Color::Magenta)),
                    Span::raw(task.title.as_str()),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan).bold())
            .highlight_symbol("> ");

        let mut state = ListState::default();
        if is_active && !tasks.is_empty() {
            state.select(Some(self.selected[status.index()]));
        }
        frame.render_stateful_widget(list, area, &mut state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crossterm::event::KeyModifiers;

    fn make_task(id: i64, status: Status) -> Task {
        Task {
            id,
            title: format!("Task {id}"),
            description: None,
            status,
            created_at: Utc::now(),
            ai_advice: None,
            ai_advice_timestamp: None,
        }
    }

    fn make_board() -> Board {
        let mut board = Board::new();
        board.load(vec![
            make_task(5, Status::Done),
            make_task(4, Status::Doing),
            make_task(3, Status::Todo),
            make_task(2, Status::Todo),
            make_task(1, Status::Doing),
        ]);
        board
    }

    fn press(board: &mut Board, c: char) {
        board.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
    }

    #[test]
    fn starts_empty_then_loaded() {
        let mut board = Board::new();
        assert_eq!(board.state(), BoardState::Empty);
        assert!(board.selected_task().is_none());
        board.load(vec![]);
        assert_eq!(board.state(), BoardState::Loaded);
    }

    #[test]
    fn column_titles_carry_counts() {
        let board = make_board();
        assert_eq!(board.column_title(Status::Todo), "To Do (2)");
        assert_eq!(board.column_title(Status::Doing), "Doing (2)");
        assert_eq!(board.column_title(Status::Done), "Done (1)");
    }

    #[test]
    fn created_is_prepended() {
        let mut board = make_board();
        board.apply(&BoardEvent::Created(make_task(6, Status::Todo)));
        let ids: Vec<i64> = board.column(Status::Todo).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![6, 3, 2]);
        assert_eq!(board.tasks()[0].id, 6);
    }

    #[test]
    fn status_change_moves_between_columns() {
        let mut board = make_board();
        let mut moved = make_task(3, Status::Doing);
        moved.title = "Task 3".into();
        board.apply(&BoardEvent::StatusChanged {
            task: moved,
            from: Status::Todo,
        });
        assert_eq!(board.column_title(Status::Todo), "To Do (1)");
        assert_eq!(board.column_title(Status::Doing), "Doing (3)");
        assert_eq!(board.task(3).unwrap().status, Status::Doing);
    }

    #[test]
    fn updated_replaces_in_place() {
        let mut board = make_board();
        let mut edited = make_task(2, Status::Todo);
        edited.title = "Renamed".into();
        board.apply(&BoardEvent::Updated(edited));
        assert_eq!(board.task(2).unwrap().title, "Renamed");
        assert_eq!(board.tasks().len(), 5);
        assert_eq!(board.tasks()[3].id, 2);
    }

    #[test]
    fn deleted_removes_and_clamps_cursor() {
        let mut board = make_board();
        press(&mut board, 'j');
        assert_eq!(board.selected_task().unwrap().id, 2);
        board.apply(&BoardEvent::Deleted(make_task(2, Status::Todo)));
        assert_eq!(board.selected_task().unwrap().id, 3);
        assert!(board.task(2).is_none());
    }

    #[test]
    fn navigation_stays_in_bounds() {
        let mut board = make_board();
        press(&mut board, 'h');
        assert_eq!(board.active_status(), Status::Todo);
        press(&mut board, 'l');
        press(&mut board, 'l');
        press(&mut board, 'l');
        assert_eq!(board.active_status(), Status::Done);
        press(&mut board, 'j');
        assert_eq!(board.selected_task().unwrap().id, 5);
        press(&mut board, 'h');
        press(&mut board, 'G');
        assert_eq!(board.selected_task().unwrap().id, 1);
        press(&mut board, 'g');
        assert_eq!(board.selected_task().unwrap().id, 4);
    }

    #[test]
    fn select_by_id_switches_column() {
        let mut board = make_board();
        assert!(board.select_task_by_id(1));
        assert_eq!(board.active_status(), Status::Doing);
        assert_eq!(board.selected_task().unwrap().id, 1);

        assert!(!board.select_task_by_id(99));
        assert_eq!(board.selected_task().unwrap().id, 1);
    }

    #[test]
    fn reload_keeps_cursor_on_same_task() {
        let mut board = make_board();
        board.select_task_by_id(2);
        let mut tasks = board.tasks().to_vec();
        tasks.insert(0, make_task(9, Status::Todo));
        board.load(tasks);
        assert_eq!(board.selected_task().unwrap().id, 2);
    }

    #[test]
    fn error_banner_hides_after_five_seconds() {
        let mut board = make_board();
        board.show_error(MSG_MOVE_FAILED);
        board.tick(Instant::now() + Duration::from_secs(4));
        assert_eq!(board.banner().unwrap().text, MSG_MOVE_FAILED);
        board.tick(Instant::now() + Duration::from_secs(6));
        assert!(board.banner().is_none());
    }

    #[test]
    fn error_banner_can_be_dismissed_early() {
        let mut board = make_board();
        board.show_error(MSG_LOAD_FAILED);
        board.dismiss_banner();
        assert!(board.banner().is_none());
    }
}
