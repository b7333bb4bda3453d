use std::sync::mpsc::{self, Receiver, Sender};

use kanban_core::task::{Status, Task};

/// Messages from cards and the form to the board.
///
/// Producers send after a successful server round-trip; the app drains the
/// channel once per tick and the board reconciles its task list.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardEvent {
    Created(Task),
    Updated(Task),
    StatusChanged { task: Task, from: Status },
    Deleted(Task),
}

impl BoardEvent {
    pub fn task(&self) -> &Task {
        match self {
            BoardEvent::Created(t)
            | BoardEvent::Updated(t)
            | BoardEvent::StatusChanged { task: t, .. }
            | BoardEvent::Deleted(t) => t,
        }
    }
}

pub type EventSender = Sender<BoardEvent>;

pub fn channel() -> (EventSender, Receiver<BoardEvent>) {
    mpsc::channel()
}
