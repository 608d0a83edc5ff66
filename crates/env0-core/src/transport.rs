//! WebSocket transport to the env0 backend.
//!
//! The transport runs as its own tokio task. Inbound frames are decoded and
//! forwarded as `TransportEvent`s; outbound messages are taken from the
//! `Outbox`. A lost connection is retried forever after a fixed delay plus
//! random jitter. Messages sent while offline are dropped.

use std::time::Duration;

use env0_types::{ClientMessage, Inbound};
use futures_util::{SinkExt, StreamExt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::ReconnectConfig;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Events emitted by the transport task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A connection was established.
    Connected,
    /// One decoded inbound frame.
    Frame(Inbound),
    /// A connect attempt or an open connection failed.
    Error { message: String },
    /// The connection ended; a reconnect is scheduled.
    Disconnected,
}

/// Fixed-delay reconnect policy with additive jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub delay: Duration,
    pub jitter: Duration,
}

impl From<&ReconnectConfig> for ReconnectPolicy {
    fn from(config: &ReconnectConfig) -> Self {
        Self {
            delay: Duration::from_millis(config.delay_ms),
            jitter: Duration::from_millis(config.jitter_ms),
        }
    }
}

impl ReconnectPolicy {
    /// Returns the wait before the next attempt, in `[delay, delay + jitter]`.
    pub fn next_delay<R: Rng>(&self, rng: &mut R) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return self.delay;
        }
        self.delay + Duration::from_millis(rng.gen_range(0..=jitter_ms))
    }
}

/// Transport settings.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub url: Url,
    pub reconnect: ReconnectPolicy,
}

/// Sender half for outbound messages.
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<ClientMessage>,
}

impl Outbox {
    /// Queues a message for the transport task.
    ///
    /// Returns false if the transport task has stopped.
    pub fn send(&self, message: ClientMessage) -> bool {
        self.tx.send(message).is_ok()
    }
}

/// Handle to a running transport task.
#[derive(Debug)]
pub struct TransportHandle {
    pub outbox: Outbox,
    pub events: mpsc::UnboundedReceiver<TransportEvent>,
}

/// Spawns the transport task on the current tokio runtime.
///
/// The task stops when `cancel` fires or the event receiver is dropped.
pub fn spawn(config: TransportConfig, cancel: CancellationToken) -> TransportHandle {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();
    tokio::spawn(run(config, events_tx, outbox_rx, cancel));
    TransportHandle {
        outbox: Outbox { tx: outbox_tx },
        events: events_rx,
    }
}

/// Why a connected session ended.
enum SessionEnd {
    Lost,
    Stopped,
}

async fn run(
    config: TransportConfig,
    events: mpsc::UnboundedSender<TransportEvent>,
    mut outbox: mpsc::UnboundedReceiver<ClientMessage>,
    cancel: CancellationToken,
) {
    let mut rng = StdRng::from_entropy();

    loop {
        let attempt = tokio::select! {
            () = cancel.cancelled() => return,
            attempt = connect_async(config.url.as_str()) => attempt,
        };

        match attempt {
            Ok((socket, _response)) => {
                tracing::info!(url = %config.url, "connected");
                if events.send(TransportEvent::Connected).is_err() {
                    return;
                }
                match session(socket, &events, &mut outbox, &cancel).await {
                    SessionEnd::Stopped => return,
                    SessionEnd::Lost => tracing::warn!(url = %config.url, "connection lost"),
                }
            }
            Err(err) => {
                tracing::warn!(url = %config.url, error = %err, "connect failed");
                if events
                    .send(TransportEvent::Error {
                        message: err.to_string(),
                    })
                    .is_err()
                {
                    return;
                }
            }
        }

        if events.send(TransportEvent::Disconnected).is_err() {
            return;
        }

        let delay = config.reconnect.next_delay(&mut rng);
        tracing::debug!(delay_ms = delay.as_millis() as u64, "reconnect scheduled");
        if !wait_offline(delay, &mut outbox, &cancel).await {
            return;
        }
    }
}

/// Sleeps for `delay`, discarding outbound messages. Returns false if the
/// transport should stop.
async fn wait_offline(
    delay: Duration,
    outbox: &mut mpsc::UnboundedReceiver<ClientMessage>,
    cancel: &CancellationToken,
) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            () = &mut sleep => return true,
            () = cancel.cancelled() => return false,
            message = outbox.recv() => match message {
                Some(message) => tracing::debug!(?message, "offline, dropping outbound message"),
                None => return false,
            },
        }
    }
}

async fn session(
    socket: Socket,
    events: &mpsc::UnboundedSender<TransportEvent>,
    outbox: &mut mpsc::UnboundedReceiver<ClientMessage>,
    cancel: &CancellationToken,
) -> SessionEnd {
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                return SessionEnd::Stopped;
            }
            outbound = outbox.recv() => {
                let Some(message) = outbound else {
                    let _ = sink.send(Message::Close(None)).await;
                    return SessionEnd::Stopped;
                };
                let text = match message.to_json() {
                    Ok(text) => text,
                    Err(err) => {
                        tracing::warn!(error = %err, "failed to encode outbound message");
                        continue;
                    }
                };
                if let Err(err) = sink.send(Message::Text(text)).await {
                    tracing::warn!(error = %err, "send failed");
                    let _ = events.send(TransportEvent::Error {
                        message: err.to_string(),
                    });
                    return SessionEnd::Lost;
                }
            }
            inbound = stream.next() => {
                let frame = match inbound {
                    Some(Ok(Message::Text(text))) => Inbound::decode(&text),
                    Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                        Ok(text) => Inbound::decode(&text),
                        Err(err) => Inbound::Malformed {
                            error: err.to_string(),
                        },
                    },
                    Some(Ok(Message::Close(_))) | None => return SessionEnd::Lost,
                    Some(Ok(_)) => continue,
                    Some(Err(err)) => {
                        tracing::warn!(error = %err, "receive failed");
                        if events
                            .send(TransportEvent::Error {
                                message: err.to_string(),
                            })
                            .is_err()
                        {
                            return SessionEnd::Stopped;
                        }
                        return SessionEnd::Lost;
                    }
                };
                if let Inbound::Malformed { error } = &frame {
                    tracing::warn!(%error, "malformed frame");
                }
                if events.send(TransportEvent::Frame(frame)).is_err() {
                    return SessionEnd::Stopped;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_delay_within_jitter_window() {
        let policy = ReconnectPolicy {
            delay: Duration::from_millis(1500),
            jitter: Duration::from_millis(250),
        };
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let delay = policy.next_delay(&mut rng);
            assert!(delay >= Duration::from_millis(1500));
            assert!(delay <= Duration::from_millis(1750));
        }
    }

    #[test]
    fn test_zero_jitter_is_fixed() {
        let policy = ReconnectPolicy::from(&ReconnectConfig {
            delay_ms: 500,
            jitter_ms: 0,
        });
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(policy.next_delay(&mut rng), Duration::from_millis(500));
    }

    #[test]
    fn test_outbox_reports_stopped_task() {
        let (tx, rx) = mpsc::unbounded_channel();
        let outbox = Outbox { tx };
        assert!(outbox.send(ClientMessage::Choice { index: 1 }));
        drop(rx);
        assert!(!outbox.send(ClientMessage::Choice { index: 1 }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_offline_drops_messages() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(ClientMessage::Choice { index: 3 }).unwrap();
        let cancel = CancellationToken::new();

        assert!(wait_offline(Duration::from_millis(100), &mut rx, &cancel).await);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_offline_stops_on_cancel() {
        let (_tx, mut rx) = mpsc::unbounded_channel::<ClientMessage>();
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(!wait_offline(Duration::from_secs(60), &mut rx, &cancel).await);
    }
}
