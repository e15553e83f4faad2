// Server loop module
// Accepts connections until a shutdown signal arrives

use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use super::connection::spawn_connection;
use crate::config::AppState;
use crate::logger;

/// Accept connections on `listener` and hand each one to its own task.
///
/// Returns once `shutdown` is notified. Connections already in flight keep
/// running on their tasks until the runtime is dropped.
#[allow(clippy::ignored_unit_patterns)]
pub async fn serve(listener: TcpListener, state: Arc<AppState>, shutdown: Arc<Notify>) {
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer_addr)) => {
                        spawn_connection(stream, peer_addr, Arc::clone(&state));
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            _ = shutdown.notified() => {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::server::listener::bind_listener;
    use crate::upstream::testing::RecordingClient;
    use crate::upstream::CompletionClient;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    #[tokio::test]
    async fn test_serve_answers_and_stops_on_shutdown() {
        let listener = bind_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();

        let client: Arc<dyn CompletionClient> = Arc::new(RecordingClient::text("{}"));
        let state = Arc::new(AppState::new(Config::for_tests("."), client));
        let shutdown = Arc::new(Notify::new());
        let server = tokio::spawn(serve(listener, state, Arc::clone(&shutdown)));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"OPTIONS /api/chat HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await.unwrap();
        let text = String::from_utf8_lossy(&raw).to_lowercase();
        assert!(text.starts_with("http/1.1 200"));
        assert!(text.contains("access-control-allow-origin: *"));

        shutdown.notify_one();
        tokio::time::timeout(std::time::Duration::from_secs(2), server)
            .await
            .unwrap()
            .unwrap();
    }
}
