// Server module entry point
// Accept loop with graceful shutdown

pub mod connection;
pub mod listener;
pub mod signal;

use std::future::Future;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;

use crate::config::AppState;
use crate::logger;

pub use connection::accept_connection;
pub use listener::create_reusable_listener;
pub use signal::shutdown_signal;

/// Accept connections until `shutdown` resolves, then wait for in-flight
/// connections (bounded by `performance.connection_timeout`).
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()>,
) {
    let graceful = GracefulShutdown::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => match accept_result {
                Ok((stream, peer_addr)) => accept_connection(stream, peer_addr, &state, &graceful),
                Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
            },
            () = &mut shutdown => break,
        }
    }

    // Stop accepting before draining
    drop(listener);
    logger::log_shutdown(state.active_connections.load(Ordering::SeqCst));

    let drain = Duration::from_secs(state.config.performance.connection_timeout);
    tokio::select! {
        () = graceful.shutdown() => logger::log_info("All connections closed"),
        () = tokio::time::sleep(drain) => logger::log_warning(&format!(
            "Timed out after {}s waiting for connections to close",
            drain.as_secs()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[tokio::test]
    async fn test_serves_until_shutdown() {
        let static_dir = tempfile::tempdir().unwrap();
        std::fs::write(static_dir.path().join("pic.png"), b"png").unwrap();

        let mut config = Config::defaults().unwrap();
        config.logging.access_log = false;
        config.static_files.root = static_dir.path().to_path_buf();
        let state = Arc::new(AppState::new(&config).unwrap());

        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(serve(listener, state, async {
            let _ = rx.await;
        }));

        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let response = client
            .get(format!("http://{addr}/static/pic.png*---"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()["cache-control"], "public, max-age=86400");
        assert_eq!(&response.bytes().await.unwrap()[..], b"png");

        let response = client
            .get(format!("http://{addr}/proxy-image?url=ftp://example.com/a.png"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);

        drop(client);
        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap();
    }
}
