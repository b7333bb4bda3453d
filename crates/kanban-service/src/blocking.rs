use kanban_core::advice::Advice;
use kanban_core::task::{CreateTask, StatusUpdate, Task, UpdateTask};
use tokio::runtime::Runtime;

use crate::{HttpService, ServiceError, TaskService};

/// Blocking wrapper around the async `HttpService`.
///
/// Owns a tokio runtime and uses `block_on()` for each call.
/// Designed for sync callers like the TUI.
pub struct BlockingHttpService {
    inner: HttpService,
    rt: Runtime,
}

impl BlockingHttpService {
    pub fn new(base_url: &str) -> Result<Self, ServiceError> {
        let rt = Runtime::new()
            .map_err(|e| ServiceError::Internal(format!("failed to create tokio runtime: {e}")))?;
        Ok(Self {
            inner: HttpService::new(base_url),
            rt,
        })
    }

    pub fn base_url(&self) -> &str {
        self.inner.base_url()
    }

    pub fn health(&self) -> Result<(), ServiceError> {
        self.rt.block_on(self.inner.health())
    }

    pub fn list_tasks(&self) -> Result<Vec<Task>, ServiceError> {
        self.rt.block_on(self.inner.list_tasks())
    }

    pub fn create_task(&self, input: &CreateTask) -> Result<Task, ServiceError> {
        self.rt.block_on(self.inner.create_task(input))
    }

    pub fn update_task(&self, id: &str, update: &UpdateTask) -> Result<Task, ServiceError> {
        self.rt.block_on(self.inner.update_task(id, update))
    }

    pub fn delete_task(&self, id: &str) -> Result<Task, ServiceError> {
        self.rt.block_on(self.inner.delete_task(id))
    }

    pub fn set_status(&self, id: &str, update: &StatusUpdate) -> Result<Task, ServiceError> {
        self.rt.block_on(self.inner.set_status(id, update))
    }

    pub fn generate_advice(&self, id: &str) -> Result<Advice, ServiceError> {
        self.rt.block_on(self.inner.generate_advice(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanban_core::task::Status;

    /// The test server lives on its own thread and runtime so that
    /// `block_on` here never nests inside another runtime.
    fn spawn_blocking_server() -> String {
        let (tx, rx) = std::sync::mpsc::sync_channel(1);
        std::thread::spawn(move || {
            let rt = Runtime::new().unwrap();
            rt.block_on(async {
                let server = kanban_server::test_helpers::spawn_test_server().await;
                tx.send(server.base_url.clone()).unwrap();
                std::future::pending::<()>().await;
            });
        });
        rx.recv().unwrap()
    }

    fn new_task(title: &str) -> CreateTask {
        CreateTask {
            title: title.into(),
            description: Some("details".into()),
        }
    }

    #[test]
    fn blocking_health() {
        let url = spawn_blocking_server();
        let svc = BlockingHttpService::new(&url).unwrap();
        svc.health().unwrap();
    }

    #[test]
    fn blocking_create_and_list() {
        let url = spawn_blocking_server();
        let svc = BlockingHttpService::new(&url).unwrap();

        let t = svc.create_task(&new_task("Write report")).unwrap();
        assert_eq!(t.status, Status::Todo);

        let tasks = svc.list_tasks().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, t.id);
    }

    #[test]
    fn blocking_status_cycle() {
        let url = spawn_blocking_server();
        let svc = BlockingHttpService::new(&url).unwrap();
        let t = svc.create_task(&new_task("cycle")).unwrap();
        let id = t.id.to_string();

        let mut status = t.status;
        for _ in 0..3 {
            let moved = svc.set_status(&id, &status.next().into()).unwrap();
            assert_eq!(moved.status, status.next());
            status = moved.status;
        }
        assert_eq!(status, Status::Todo);
    }

    #[test]
    fn blocking_update_and_delete() {
        let url = spawn_blocking_server();
        let svc = BlockingHttpService::new(&url).unwrap();
        let t = svc.create_task(&new_task("old")).unwrap();
        let id = t.id.to_string();

        let updated = svc
            .update_task(&id, &UpdateTask::fields("new", None))
            .unwrap();
        assert_eq!(updated.title, "new");
        assert_eq!(updated.description, None);

        let deleted = svc.delete_task(&id).unwrap();
        assert_eq!(deleted.title, "new");
        let err = svc.delete_task(&id).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn blocking_advice() {
        let url = spawn_blocking_server();
        let svc = BlockingHttpService::new(&url).unwrap();
        let t = svc.create_task(&new_task("Deploy")).unwrap();
        let advice = svc.generate_advice(&t.id.to_string()).unwrap();
        assert_eq!(advice.task_id, t.id);
        assert!(!advice.advice.is_empty());
    }
}
