pub mod advice;
pub mod config;
mod routes;
#[cfg(feature = "test-helpers")]
pub mod test_helpers;

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use kanban_db::Database;
use kanban_service::{AdviceProvider, LocalService};
use tokio::net::TcpListener;

pub use routes::{build_router, AppState, InnerAppState, RouterOptions};

/// Serve the API and client bundle until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    db: Arc<dyn Database>,
    advisor: Arc<dyn AdviceProvider>,
    options: RouterOptions,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = Arc::new(InnerAppState {
        service: LocalService::new(db, advisor),
        dev_mode: options.dev_mode,
    });
    let app = build_router(state, &options);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
