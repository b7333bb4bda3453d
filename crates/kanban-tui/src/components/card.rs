use chrono::{DateTime, Local, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use kanban_core::task::{Task, UpdateTask};
use kanban_service::BlockingHttpService;
use tracing::{debug, warn};

use crate::events::{BoardEvent, EventSender};

pub const MSG_EMPTY_TITLE: &str = "Task title cannot be empty";
pub const MSG_UPDATE_FAILED: &str = "Failed to update task. Please try again.";
pub const MSG_STATUS_FAILED: &str = "Failed to update task status. Please try again.";
pub const MSG_DELETE_FAILED: &str = "Failed to delete task. Please try again.";
pub const MSG_ADVICE_FAILED: &str = "Failed to generate AI advice. Please try again.";
pub const CONFIRM_DELETE: &str = "Are you sure you want to delete this task?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardField {
    Title,
    Description,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEdit {
    Viewing,
    /// `buffer` starts as the field's current value.
    Editing { field: CardField, buffer: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum AdviceState {
    Idle,
    Loading,
    Shown {
        text: String,
        generated_at: DateTime<Utc>,
    },
    Error(String),
}

/// Local view state for one task.
pub struct TaskCard {
    task: Task,
    edit: FieldEdit,
    advice: AdviceState,
}

impl TaskCard {
    pub fn new(task: Task) -> Self {
        let advice = match (&task.ai_advice, task.ai_advice_timestamp) {
            (Some(text), Some(generated_at)) => AdviceState::Shown {
                text: text.clone(),
                generated_at,
            },
            _ => AdviceState::Idle,
        };
        Self {
            task,
            edit: FieldEdit::Viewing,
            advice,
        }
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn edit(&self) -> &FieldEdit {
        &self.edit
    }

    pub fn advice(&self) -> &AdviceState {
        &self.advice
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.edit, FieldEdit::Editing { .. })
    }

    /// Take a newer copy of the task from the board. Local edit and advice
    /// state are kept.
    pub fn sync(&mut self, task: &Task) {
        self.task = task.clone();
    }

    pub fn status_label(&self) -> &'static str {
        self.task.status.action_label()
    }

    fn current_value(&self, field: CardField) -> &str {
        match field {
            CardField::Title => &self.task.title,
            CardField::Description => self.task.description.as_deref().unwrap_or(""),
        }
    }

    pub fn begin_edit(&mut self, field: CardField) {
        if self.is_editing() {
            return;
        }
        self.edit = FieldEdit::Editing {
            field,
            buffer: self.current_value(field).to_string(),
        };
    }

    pub fn cancel_edit(&mut self) {
        self.edit = FieldEdit::Viewing;
    }

    /// Feed a key to the open editor. Returns an alert to show, if any.
    pub fn edit_key(
        &mut self,
        key: KeyEvent,
        service: &BlockingHttpService,
        tx: &EventSender,
    ) -> Option<String> {
        let FieldEdit::Editing { buffer, .. } = &mut self.edit else {
            return None;
        };
        match key.code {
            KeyCode::Esc => {
                self.cancel_edit();
                None
            }
            KeyCode::Enter => self.commit_edit(service, tx),
            KeyCode::Backspace => {
                buffer.pop();
                None
            }
            KeyCode::Char(c) => {
                buffer.push(c);
                None
            }
            _ => None,
        }
    }

    fn commit_edit(&mut self, service: &BlockingHttpService, tx: &EventSender) -> Option<String> {
        let FieldEdit::Editing { field, buffer } = &self.edit else {
            return None;
        };
        let field = *field;
        let value = buffer.trim().to_string();

        if value == self.current_value(field) {
            self.cancel_edit();
            return None;
        }
        if field == CardField::Title && value.is_empty() {
            self.cancel_edit();
            return Some(MSG_EMPTY_TITLE.into());
        }

        let description = |d: &str| (!d.is_empty()).then(|| d.to_string());
        let update = match field {
            CardField::Title => {
                UpdateTask::fields(value, self.task.description.clone())
            }
            CardField::Description => {
                UpdateTask::fields(self.task.title.clone(), description(&value))
            }
        };

        self.cancel_edit();
        match service.update_task(&self.task.id.to_string(), &update) {
            Ok(task) => {
                self.task = task.clone();
                let _ = tx.send(BoardEvent::Updated(task));
                None
            }
            Err(e) => {
                warn!(task_id = self.task.id, error = %e, "update failed");
                Some(MSG_UPDATE_FAILED.into())
            }
        }
    }

    /// Move the task to the next status in the cycle.
    pub fn advance_status(
        &mut self,
        service: &BlockingHttpService,
        tx: &EventSender,
    ) -> Result<(), String> {
        let from = self.task.status;
        let next = from.next();
        match service.set_status(&self.task.id.to_string(), &next.into()) {
            Ok(task) => {
                self.task = task.clone();
                let _ = tx.send(BoardEvent::StatusChanged { task, from });
                Ok(())
            }
            Err(e) => {
                warn!(task_id = self.task.id, error = %e, "status change failed");
                Err(MSG_STATUS_FAILED.into())
            }
        }
    }

    /// Delete after the user has confirmed.
    pub fn delete(&self, service: &BlockingHttpService, tx: &EventSender) -> Result<(), String> {
        match service.delete_task(&self.task.id.to_string()) {
            Ok(task) => {
                let _ = tx.send(BoardEvent::Deleted(task));
                Ok(())
            }
            Err(e) => {
                warn!(task_id = self.task.id, error = %e, "delete failed");
                Err(MSG_DELETE_FAILED.into())
            }
        }
    }

    /// Enter `Loading` if a request is allowed from the current state.
    /// A first request or retry needs `Idle`/`Error`; `regenerate` needs
    /// `Shown`.
    pub fn request_advice(&mut self, regenerate: bool) -> bool {
        let allowed = match self.advice {
            AdviceState::Idle | AdviceState::Error(_) => !regenerate,
            AdviceState::Shown { .. } => regenerate,
            AdviceState::Loading => false,
        };
        if allowed {
            self.advice = AdviceState::Loading;
        }
        allowed
    }

    /// Run the advice request started by `request_advice`.
    pub fn finish_advice(&mut self, service: &BlockingHttpService, tx: &EventSender) {
        if self.advice != AdviceState::Loading {
            return;
        }
        match service.generate_advice(&self.task.id.to_string()) {
            Ok(advice) => {
                debug!(task_id = self.task.id, "advice received");
                self.task.ai_advice = Some(advice.advice.clone());
                self.task.ai_advice_timestamp = Some(advice.generated_at);
                self.advice = AdviceState::Shown {
                    text: advice.advice,
                    generated_at: advice.generated_at,
                };
                let _ = tx.send(BoardEvent::Updated(self.task.clone()));
            }
            Err(e) => {
                let message = match e.message() {
                    "" => MSG_ADVICE_FAILED.to_string(),
                    m => m.to_string(),
                };
                self.advice = AdviceState::Error(message);
            }
        }
    }
}

/// "Generated: <local time>" line under shown advice.
pub fn generated_label(at: DateTime<Utc>) -> String {
    format!(
        "Generated: {}",
        at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
    )
}
