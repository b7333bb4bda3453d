use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use kanban_core::task::CreateTask;
use kanban_core::validate::{
    DESCRIPTION_MAX_CHARS, MSG_DESCRIPTION_TOO_LONG, MSG_TITLE_TOO_LONG, TITLE_MAX_CHARS,
};
use kanban_service::BlockingHttpService;
use tracing::{info, warn};

use super::{expire, Banner, BannerKind};
use crate::events::{BoardEvent, EventSender};

pub const MSG_TITLE_REQUIRED: &str = "Title is required";
pub const MSG_FIX_ERRORS: &str = "Please fix the errors above";
pub const MSG_CREATED: &str = "Task created successfully!";

const SUCCESS_TTL: Duration = Duration::from_secs(3);
const ERROR_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Description,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormOutcome {
    Open,
    /// Closed by the user.
    Cancelled,
    /// Input passed validation and the create request is queued; run it
    /// with [`TaskForm::finish_submit`].
    Pending,
}

/// New-task form.
pub struct TaskForm {
    title: String,
    description: String,
    focus: FormField,
    title_error: Option<String>,
    description_error: Option<String>,
    submitting: bool,
    message: Option<Banner>,
}

impl Default for TaskForm {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskForm {
    pub fn new() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            focus: FormField::Title,
            title_error: None,
            description_error: None,
            submitting: false,
            message: None,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn focus(&self) -> FormField {
        self.focus
    }

    pub fn title_error(&self) -> Option<&str> {
        self.title_error.as_deref()
    }

    pub fn description_error(&self) -> Option<&str> {
        self.description_error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn message(&self) -> Option<&Banner> {
        self.message.as_ref()
    }

    pub fn tick(&mut self, now: Instant) {
        expire(&mut self.message, now);
    }

    /// Empty the inputs and errors. The last message stays up until it
    /// expires.
    pub fn clear(&mut self) {
        self.title.clear();
        self.description.clear();
        self.focus = FormField::Title;
        self.title_error = None;
        self.description_error = None;
    }

    /// Keys are ignored while a create request is queued.
    pub fn handle_key(&mut self, key: KeyEvent) -> FormOutcome {
        if self.submitting {
            return FormOutcome::Open;
        }
        match key.code {
            KeyCode::Esc => return FormOutcome::Cancelled,
            KeyCode::Char('l') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.clear();
                self.message = None;
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = match self.focus {
                    FormField::Title => FormField::Description,
                    FormField::Description => FormField::Title,
                };
            }
            KeyCode::Enter => {
                if self.begin_submit() {
                    return FormOutcome::Pending;
                }
            }
            KeyCode::Backspace => {
                self.focused_mut().pop();
                self.revalidate_focused();
            }
            KeyCode::Char(c) => {
                self.focused_mut().push(c);
                self.revalidate_focused();
            }
            _ => {}
        }
        FormOutcome::Open
    }

    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            FormField::Title => &mut self.title,
            FormField::Description => &mut self.description,
        }
    }

    /// Live feedback only clears errors the user has fixed.
    fn revalidate_focused(&mut self) {
        match self.focus {
            FormField::Title if self.title_error.is_some() => {
                self.validate_title();
            }
            FormField::Description if self.description_error.is_some() => {
                self.validate_description();
            }
            _ => {}
        }
    }

    fn validate_title(&mut self) -> bool {
        let title = self.title.trim();
        self.title_error = if title.is_empty() {
            Some(MSG_TITLE_REQUIRED.into())
        } else if title.chars().count() > TITLE_MAX_CHARS {
            Some(MSG_TITLE_TOO_LONG.into())
        } else {
            None
        };
        self.title_error.is_none()
    }

    fn validate_description(&mut self) -> bool {
        self.description_error = if self.description.trim().chars().count() > DESCRIPTION_MAX_CHARS
        {
            Some(MSG_DESCRIPTION_TOO_LONG.into())
        } else {
            None
        };
        self.description_error.is_none()
    }

    pub fn validate(&mut self) -> bool {
        let title_ok = self.validate_title();
        let description_ok = self.validate_description();
        title_ok && description_ok
    }

    /// Validate and mark the form as submitting. Returns `false` if the
    /// input is invalid or a request is already queued.
    pub fn begin_submit(&mut self) -> bool {
        if self.submitting {
            return false;
        }
        if !self.validate() {
            self.message = Some(Banner::new(MSG_FIX_ERRORS, BannerKind::Error, ERROR_TTL));
            return false;
        }
        self.submitting = true;
        true
    }

    /// Send the queued create request. Returns `true` once the server
    /// accepted the task.
    pub fn finish_submit(&mut self, service: &BlockingHttpService, tx: &EventSender) -> bool {
        if !self.submitting {
            return false;
        }
        let description = self.description.trim();
        let input = CreateTask {
            title: self.title.trim().to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
        };
        let result = service.create_task(&input);
        self.submitting = false;

        match result {
            Ok(task) => {
                info!(task_id = task.id, "task created");
                self.clear();
                self.message = Some(Banner::new(MSG_CREATED, BannerKind::Success, SUCCESS_TTL));
                let _ = tx.send(BoardEvent::Created(task));
                true
            }
            Err(e) => {
                warn!(error = %e, "create failed");
                self.message = Some(Banner::new(
                    format!("Failed to create task: {}", e.message()),
                    BannerKind::Error,
                    ERROR_TTL,
                ));
                false
            }
        }
    }
}
