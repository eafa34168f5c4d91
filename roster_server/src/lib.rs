//! HTTP/JSON surface for roster.

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

use roster_core::RosterCore;

pub use routes::app;
pub use state::AppState;

/// Build the router and serve it on `listener` until `shutdown` resolves.
pub async fn serve(
    core: RosterCore,
    listener: tokio::net::TcpListener,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let app = app(core);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}
