use std::net::SocketAddr;

use rift_common::{Error, Result};
use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::SharedState;

pub struct GatewayServer {
    state: SharedState,
}

impl GatewayServer {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    /// Serve until ctrl-c.
    pub async fn run(self) -> Result<()> {
        let gateway = &self.state.config.gateway;
        let addr: SocketAddr = format!("{}:{}", gateway.host, gateway.port)
            .parse()
            .map_err(|e| Error::Config(format!("invalid gateway address: {e}")))?;

        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "gateway listening");

        axum::serve(listener, build_router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("gateway stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
