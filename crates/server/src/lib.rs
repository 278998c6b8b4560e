//! HTTP surface over [`tissea_network::NetworkService`].

mod convert;
pub mod error;
pub mod routes;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tissea_network::{NetworkService, NetworkStore};
use tokio::net::TcpListener;
use tokio::runtime::Runtime;
use tokio::sync::oneshot;

pub use routes::create_router;

/// Serve the API on `listener` until `shutdown` resolves.
pub async fn serve<S: NetworkStore + 'static>(
    listener: TcpListener,
    service: Arc<NetworkService<S>>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let app = create_router(service);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

/// API server running on its own runtime. Stops when dropped.
pub struct ApiServer {
    #[allow(dead_code)] // Kept alive to keep server running
    runtime: Runtime,
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl ApiServer {
    pub fn start<S: NetworkStore + 'static>(
        service: Arc<NetworkService<S>>,
        addr: SocketAddr,
    ) -> std::io::Result<Self> {
        let runtime = Runtime::new()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let listener = runtime.block_on(TcpListener::bind(addr))?;
        let addr = listener.local_addr()?;

        runtime.spawn(async move {
            let shutdown = async move {
                let _ = shutdown_rx.await;
            };
            if let Err(err) = serve(listener, service, shutdown).await {
                tracing::error!(error = %err, "api server stopped");
            }
        });

        Ok(Self {
            runtime,
            addr,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

impl Drop for ApiServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
