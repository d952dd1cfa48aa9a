//! The Diameter TCP listener: accepts connections up to `MAX_CONNECTIONS`,
//! spawning one peer per connection, and stops accepting first on shutdown.

use std::sync::Arc;

use log::{error, info, warn};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::config::Config;
use crate::diameter::peer::run_peer;
use crate::diameter::s13_handler::S13Handler;
use crate::load::LoadMonitor;

pub async fn run_listener(
    config: Arc<Config>,
    handler: Arc<S13Handler>,
    load: LoadMonitor,
    shutdown: CancellationToken,
    tasks: TaskTracker,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.bind_addr_diameter).await?;
    info!("Diameter S13 listener bound on {}", config.bind_addr_diameter);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Diameter listener stopping (no new peers)");
                break;
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer_addr)) => {
                        if load.snapshot().is_overloaded() {
                            warn!("rejecting {peer_addr}: at MAX_CONNECTIONS");
                            continue;
                        }
                        let guard = load.accept();
                        let config = config.clone();
                        let handler = handler.clone();
                        let shutdown = shutdown.clone();
                        tasks.spawn(async move {
                            run_peer(stream, peer_addr, config, handler, shutdown, guard).await;
                        });
                    }
                    Err(e) => {
                        error!("accept error: {e}");
                    }
                }
            }
        }
    }

    Ok(())
}
