//! The per-connection Diameter peer state machine: one reader task, one
//! writer task, communicating only through bounded `mpsc` channels, the
//! same split the teacher's meshtastic worker uses between its serial
//! read-loop and the entity that owns outbound writes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eir_diameter::constants::*;
use eir_diameter::{DiameterHeader, Message};
use log::{debug, info, warn};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::diameter::s13_handler::S13Handler;
use crate::load::ConnectionGuard;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PeerState {
    WaitCer,
    Open,
}

/// A "disarmed" deadline: far enough out that it never fires on its own,
/// used to park the DWA-wait timer between watchdog rounds.
const DWA_DEADLINE_DISARMED: Duration = Duration::from_secs(365 * 24 * 3600);

/// Drive one accepted TCP connection to completion. Returns once the peer
/// has closed, whether cleanly (DPR, shutdown) or on error.
pub async fn run_peer(
    stream: TcpStream,
    peer_addr: std::net::SocketAddr,
    config: Arc<Config>,
    handler: Arc<S13Handler>,
    shutdown: CancellationToken,
    _guard: ConnectionGuard,
) {
    let (mut reader, mut writer) = tokio::io::split(stream);
    let (send_tx, mut send_rx) = mpsc::channel::<Vec<u8>>(config.send_channel_size);

    let write_timeout = config.write_timeout();
    let writer_task = tokio::spawn(async move {
        while let Some(bytes) = send_rx.recv().await {
            match tokio::time::timeout(write_timeout, writer.write_all(&bytes)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!("peer {peer_addr} write error: {e}");
                    break;
                }
                Err(_) => {
                    warn!("peer {peer_addr} write timed out");
                    break;
                }
            }
        }
    });

    // The bounded receive queue feeds the dispatch task: the reader decodes
    // and enqueues, dispatch runs the decoded messages against the state
    // machine and the engine one at a time, off the reader's hot path.
    let (recv_tx, mut recv_rx) = mpsc::channel::<Message>(config.recv_channel_size);
    let is_open = Arc::new(AtomicBool::new(false));
    let dispatch_closed = CancellationToken::new();

    let dispatch_task = {
        let handler = Arc::clone(&handler);
        let send_tx = send_tx.clone();
        let is_open = Arc::clone(&is_open);
        let dispatch_closed = dispatch_closed.clone();
        tokio::spawn(async move {
            let mut state = PeerState::WaitCer;
            while let Some(message) = recv_rx.recv().await {
                let keep_open = dispatch(&message, &mut state, &handler, &send_tx).await;
                is_open.store(state == PeerState::Open, Ordering::Relaxed);
                if !keep_open {
                    break;
                }
            }
            dispatch_closed.cancel();
        })
    };

    let mut header_buf = [0u8; DiameterHeader::LEN];
    let watchdog = tokio::time::sleep(config.watchdog_interval());
    tokio::pin!(watchdog);
    let dwa_deadline = tokio::time::sleep(DWA_DEADLINE_DISARMED);
    tokio::pin!(dwa_deadline);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("peer {peer_addr} closing on shutdown signal");
                break;
            }
            _ = dispatch_closed.cancelled() => {
                break;
            }
            _ = &mut dwa_deadline => {
                warn!("peer {peer_addr} did not answer the watchdog within the expected timeout, closing");
                break;
            }
            _ = &mut watchdog => {
                if is_open.load(Ordering::Relaxed) {
                    let dwr = handler.build_dwr();
                    if send_tx.try_send(dwr.encode()).is_err() {
                        warn!("peer {peer_addr} send queue full sending DWR, closing");
                        break;
                    }
                    dwa_deadline.as_mut().reset(Instant::now() + config.watchdog_timeout());
                }
                watchdog.as_mut().reset(Instant::now() + config.watchdog_interval());
            }
            read_result = tokio::time::timeout(config.read_timeout(), reader.read_exact(&mut header_buf)) => {
                let Some(message) = (match read_result {
                    Err(_) => {
                        warn!("peer {peer_addr} read timed out, closing");
                        None
                    }
                    Ok(Err(e)) => {
                        debug!("peer {peer_addr} closed: {e}");
                        None
                    }
                    Ok(Ok(())) => {
                        watchdog.as_mut().reset(Instant::now() + config.watchdog_interval());
                        dwa_deadline.as_mut().reset(Instant::now() + DWA_DEADLINE_DISARMED);
                        read_message(&mut reader, &header_buf, config.max_message_size, peer_addr).await
                    }
                }) else {
                    break;
                };

                if recv_tx.send(message).await.is_err() {
                    break;
                }
            }
        }
    }

    drop(recv_tx);
    let _ = dispatch_task.await;
    drop(send_tx);
    let _ = writer_task.await;
}

async fn read_message(
    reader: &mut (impl AsyncReadExt + Unpin),
    header_buf: &[u8; DiameterHeader::LEN],
    max_message_size: usize,
    peer_addr: std::net::SocketAddr,
) -> Option<Message> {
    let declared = match Message::peek_length(header_buf) {
        Ok(len) => len,
        Err(e) => {
            warn!("peer {peer_addr} sent a malformed header: {e}");
            return None;
        }
    };
    if declared > max_message_size {
        warn!("peer {peer_addr} sent an oversize message ({declared} bytes), closing");
        return None;
    }
    if declared < DiameterHeader::LEN {
        warn!("peer {peer_addr} sent a length shorter than the header, closing");
        return None;
    }

    let mut full = Vec::with_capacity(declared);
    full.extend_from_slice(header_buf);
    let mut body = vec![0u8; declared - DiameterHeader::LEN];
    if let Err(e) = reader.read_exact(&mut body).await {
        warn!("peer {peer_addr} body read error, closing: {e}");
        return None;
    }
    full.extend_from_slice(&body);

    match Message::decode(&full, max_message_size) {
        Ok(message) => Some(message),
        Err(e) => {
            warn!("peer {peer_addr} message decode error, closing: {e}");
            None
        }
    }
}

/// Advance `state` for one inbound message. Returns `false` when the peer
/// should close (protocol error, DPR, or any unexpected command).
async fn dispatch(
    message: &Message,
    state: &mut PeerState,
    handler: &Arc<S13Handler>,
    send_tx: &mpsc::Sender<Vec<u8>>,
) -> bool {
    match *state {
        PeerState::WaitCer => {
            if message.header.command_code == COMMAND_CAPABILITIES_EXCHANGE && message.header.is_request() {
                if !S13Handler::cer_is_valid(message) {
                    let _ = send_tx.try_send(handler.build_cea_failure(message).encode());
                    return false;
                }
                let cea = handler.build_cea(message);
                if send_tx.try_send(cea.encode()).is_err() {
                    return false;
                }
                *state = PeerState::Open;
                true
            } else {
                false
            }
        }
        PeerState::Open => match message.header.command_code {
            COMMAND_ME_IDENTITY_CHECK if message.header.is_request() => {
                let answer = handler.handle_identity_check(message).await;
                send_tx.try_send(answer.encode()).is_ok()
            }
            COMMAND_DEVICE_WATCHDOG if message.header.is_request() => {
                let dwa = handler.build_dwa(message);
                send_tx.try_send(dwa.encode()).is_ok()
            }
            COMMAND_DISCONNECT_PEER if message.header.is_request() => {
                let dpa = handler.build_dpa(message);
                let _ = send_tx.try_send(dpa.encode());
                false
            }
            other => {
                warn!("unexpected command code {other} in OPEN state, closing peer");
                false
            }
        },
    }
}
