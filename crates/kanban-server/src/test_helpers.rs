use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use kanban_service::{AdviceError, AdviceErrorKind, AdviceProvider, LocalService};
use tokio::net::TcpListener;

use crate::routes::{build_router, InnerAppState, RouterOptions};

/// Advice provider with a canned answer, or a canned failure.
pub struct ScriptedAdvisor {
    failure: Option<AdviceErrorKind>,
    calls: AtomicUsize,
}

impl ScriptedAdvisor {
    pub fn succeeding() -> Arc<Self> {
        Arc::new(Self {
            failure: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(kind: AdviceErrorKind) -> Arc<Self> {
        Arc::new(Self {
            failure: Some(kind),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AdviceProvider for ScriptedAdvisor {
    async fn generate(
        &self,
        title: &str,
        _description: Option<&str>,
    ) -> Result<String, AdviceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failure {
            Some(kind) => Err(kind.into()),
            None => Ok(format!("Break \"{title}\" into small steps.")),
        }
    }
}

/// Build a test router with in-memory SQLite and the given advisor.
pub fn test_router_with(advisor: Arc<dyn AdviceProvider>, options: RouterOptions) -> Router {
    let db = Arc::new(kanban_db::SqliteDatabase::open_in_memory().unwrap());
    let state = Arc::new(InnerAppState {
        service: LocalService::new(db, advisor),
        dev_mode: options.dev_mode,
    });
    build_router(state, &options)
}

/// Build a test router with in-memory SQLite and a succeeding advisor.
pub fn test_router() -> Router {
    test_router_with(ScriptedAdvisor::succeeding(), RouterOptions::default())
}

/// A running test server with base_url and background task handle.
pub struct TestServer {
    pub base_url: String,
    _handle: tokio::task::JoinHandle<()>,
}

async fn spawn_router(app: Router) -> TestServer {
    serve_on(TcpListener::bind("127.0.0.1:0").await.unwrap(), app)
}

fn serve_on(listener: TcpListener, app: Router) -> TestServer {
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{addr}");
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestServer {
        base_url,
        _handle: handle,
    }
}

/// Spawn an axum test server on a random port. Returns the TestServer
/// with the `base_url` (e.g. "http://127.0.0.1:12345").
pub async fn spawn_test_server() -> TestServer {
    spawn_router(test_router()).await
}

pub async fn spawn_test_server_with(advisor: Arc<dyn AdviceProvider>) -> TestServer {
    spawn_router(test_router_with(advisor, RouterOptions::default())).await
}

/// Spawn on a fixed address, e.g. one a client was already pointed at
/// before the server came up.
pub async fn spawn_test_server_at(addr: &str, advisor: Arc<dyn AdviceProvider>) -> TestServer {
    let listener = TcpListener::bind(addr).await.unwrap();
    serve_on(listener, test_router_with(advisor, RouterOptions::default()))
}
