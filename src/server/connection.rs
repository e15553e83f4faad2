// Connection module
// Serves one accepted TCP connection over HTTP/1.1

use std::net::SocketAddr;
use std::sync::Arc;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Serve `stream` on its own task until the client closes it
pub fn spawn_connection(stream: TcpStream, peer_addr: SocketAddr, state: Arc<AppState>) {
    logger::log_debug(&format!("[Connection] Accepted from: {peer_addr}"));

    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let service = service_fn(move |req| {
            let state = Arc::clone(&state);
            async move { handler::handle_request(req, state, peer_addr).await }
        });

        if let Err(err) = http1::Builder::new()
            .keep_alive(true)
            .serve_connection(io, service)
            .await
        {
            logger::log_connection_error(&err);
        }
    });
}
