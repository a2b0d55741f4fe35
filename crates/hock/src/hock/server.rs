//! Embedded HTTP/1 listener.

use super::core::Hock;
use super::handler::handle_hock_request;
use super::types::HockError;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

/// Running listener serving a [`Hock`].
///
/// The accept loop stops when the server is closed or dropped. Connections
/// already accepted finish their current request.
pub struct HockServer {
    addr: SocketAddr,
    hock: Hock,
    shutdown_tx: broadcast::Sender<()>,
}

impl Hock {
    /// Bind `addr` and serve this registrar on it. Port 0 picks a free port.
    pub async fn listen(&self, addr: SocketAddr) -> Result<HockServer, HockError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| HockError::Bind { addr, source })?;
        let addr = listener
            .local_addr()
            .map_err(|source| HockError::Bind { addr, source })?;
        info!("Hock listening on {}", addr);

        let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);
        let hock = self.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, peer)) => {
                                let hock = hock.clone();
                                tokio::spawn(async move {
                                    let io = TokioIo::new(stream);
                                    let service = service_fn(move |req| {
                                        let hock = hock.clone();
                                        async move { handle_hock_request(req, hock).await }
                                    });
                                    if let Err(e) = http1::Builder::new()
                                        .serve_connection(io, service)
                                        .await
                                    {
                                        debug!("Connection error from {}: {}", peer, e);
                                    }
                                });
                            }
                            Err(e) => {
                                error!("Accept error on {}: {}", addr, e);
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        info!("Hock on {} shutting down", addr);
                        break;
                    }
                }
            }
        });

        Ok(HockServer {
            addr,
            hock: self.clone(),
            shutdown_tx,
        })
    }
}

impl HockServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Absolute url for `path` on this server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Registrar served by this listener.
    pub fn hock(&self) -> &Hock {
        &self.hock
    }

    /// Stop accepting connections.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for HockServer {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
    }
}
