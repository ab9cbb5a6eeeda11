//! Realtime subscription client.
//!
//! Holds an event-name → handler-set registry and a background task that
//! owns the socket. After a server-initiated disconnect the task retries
//! at most [`MAX_RECONNECT_ATTEMPTS`] times, doubling the delay from
//! [`RECONNECT_BASE_DELAY_MS`] on each attempt, then dispatches a terminal
//! `connection:failed` event and stops. A handler returning an error is
//! logged and isolated; the dispatch loop never dies with it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use models::{ClientCommand, GeographicBounds, PredictionRequest};

pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;
pub const RECONNECT_BASE_DELAY_MS: u64 = 1000;

/// Event dispatched locally once the reconnect budget is spent.
pub const CONNECTION_FAILED: &str = "connection:failed";

/// The reconnect schedule: `[1000, 2000, 4000, 8000, 16000]` ms.
pub fn backoff_delays() -> Vec<u64> {
    (0..MAX_RECONNECT_ATTEMPTS)
        .map(|attempt| RECONNECT_BASE_DELAY_MS << attempt)
        .collect()
}

pub type Handler = Arc<dyn Fn(&Value) -> anyhow::Result<()> + Send + Sync>;
type Registry = Arc<Mutex<HashMap<String, Vec<Handler>>>>;

enum Command {
    Emit(ClientCommand),
    Shutdown,
}

/// Why a live socket ended.
enum EndReason {
    /// The server closed or the transport broke: reconnect.
    Server,
    /// The consumer asked for it: stay down.
    Client,
}

pub struct RealtimeClient {
    url: String,
    handlers: Registry,
    commands: UnboundedSender<Command>,
    /// Taken by the first `connect` call.
    commands_rx: Mutex<Option<UnboundedReceiver<Command>>>,
}

impl RealtimeClient {
    /// `url` is the full websocket endpoint, token included, e.g.
    /// `ws://localhost:8080/ws?token=...`.
    pub fn new(url: impl Into<String>) -> Self {
        let (commands, commands_rx) = mpsc::unbounded_channel();
        Self {
            url: url.into(),
            handlers: Arc::new(Mutex::new(HashMap::new())),
            commands,
            commands_rx: Mutex::new(Some(commands_rx)),
        }
    }

    /// Register a handler for an event name. Multiple handlers per event
    /// are dispatched in registration order.
    pub fn on(
        &self,
        event: impl Into<String>,
        handler: impl Fn(&Value) -> anyhow::Result<()> + Send + Sync + 'static,
    ) {
        self.handlers
            .lock()
            .unwrap()
            .entry(event.into())
            .or_default()
            .push(Arc::new(handler));
    }

    /// Start the connection task. Call once; the task runs until `close`
    /// or until the reconnect budget is spent.
    pub fn connect(&self) -> JoinHandle<()> {
        let rx = self
            .commands_rx
            .lock()
            .unwrap()
            .take()
            .expect("connect called twice");

        let url = self.url.clone();
        let handlers = self.handlers.clone();
        tokio::spawn(run_loop(url, handlers, rx))
    }

    pub fn subscribe_map(&self, bounds: GeographicBounds) {
        self.send(ClientCommand::MapSubscribe { bounds });
    }

    pub fn unsubscribe_map(&self) {
        self.send(ClientCommand::MapUnsubscribe);
    }

    pub fn request_prediction(&self, request: PredictionRequest) {
        self.send(ClientCommand::PredictionRequest(request));
    }

    pub fn close(&self) {
        let _ = self.commands.send(Command::Shutdown);
    }

    fn send(&self, command: ClientCommand) {
        if self.commands.send(Command::Emit(command)).is_err() {
            warn!("Realtime task is gone, dropping command");
        }
    }
}

async fn run_loop(url: String, handlers: Registry, mut commands: UnboundedReceiver<Command>) {
    let mut attempt: u32 = 0;

    loop {
        match connect_async(&url).await {
            Ok((socket, _)) => {
                debug!("Realtime connected");
                attempt = 0;

                match drive_socket(socket, &handlers, &mut commands).await {
                    EndReason::Client => return,
                    EndReason::Server => debug!("Realtime connection lost"),
                }
            }
            Err(e) => warn!("Realtime connect failed: {e}"),
        }

        if attempt >= MAX_RECONNECT_ATTEMPTS {
            warn!("Realtime reconnect budget spent, giving up");
            dispatch(
                &handlers,
                CONNECTION_FAILED,
                &json!({ "attempts": MAX_RECONNECT_ATTEMPTS }),
            );
            return;
        }

        let delay = RECONNECT_BASE_DELAY_MS << attempt;
        attempt += 1;
        debug!("Reconnecting in {delay} ms (attempt {attempt}/{MAX_RECONNECT_ATTEMPTS})");
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
}

async fn drive_socket(
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
    handlers: &Registry,
    commands: &mut UnboundedReceiver<Command>,
) -> EndReason {
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => dispatch_frame(handlers, &text),
                Some(Ok(Message::Close(_))) | None => return EndReason::Server,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("Realtime socket error: {e}");
                    return EndReason::Server;
                }
            },
            command = commands.recv() => match command {
                Some(Command::Emit(command)) => {
                    let frame = match serde_json::to_string(&command) {
                        Ok(frame) => frame,
                        Err(e) => {
                            warn!("Failed to encode command: {e}");
                            continue;
                        }
                    };
                    if sink.send(Message::Text(frame)).await.is_err() {
                        return EndReason::Server;
                    }
                }
                Some(Command::Shutdown) | None => {
                    let _ = sink.send(Message::Close(None)).await;
                    return EndReason::Client;
                }
            },
        }
    }
}

/// Parse one incoming frame and hand its payload to the subscribers for
/// its event name. Malformed frames are logged and dropped.
fn dispatch_frame(handlers: &Registry, text: &str) {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            debug!("Ignoring malformed frame: {e}");
            return;
        }
    };

    let Some(event) = value["event"].as_str() else {
        debug!("Ignoring frame without an event name");
        return;
    };

    dispatch(handlers, event, &value["data"]);
}

/// One failing subscriber never stops the others.
fn dispatch(handlers: &Registry, event: &str, data: &Value) {
    let subscribers: Vec<Handler> = handlers
        .lock()
        .unwrap()
        .get(event)
        .cloned()
        .unwrap_or_default();

    for handler in subscribers {
        if let Err(e) = handler(data) {
            warn!("Handler for {event} failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_backoff_schedule() {
        assert_eq!(backoff_delays(), vec![1000, 2000, 4000, 8000, 16000]);
        assert_eq!(backoff_delays().len(), MAX_RECONNECT_ATTEMPTS as usize);
    }

    fn counting_registry() -> (Registry, Arc<AtomicUsize>) {
        let handlers: Registry = Arc::new(Mutex::new(HashMap::new()));
        let calls = Arc::new(AtomicUsize::new(0));
        (handlers, calls)
    }

    #[test]
    fn test_dispatch_reaches_all_handlers() {
        let (handlers, calls) = counting_registry();
        for _ in 0..3 {
            let calls = calls.clone();
            handlers
                .lock()
                .unwrap()
                .entry("prediction:ready".to_string())
                .or_default()
                .push(Arc::new(move |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }));
        }

        dispatch(&handlers, "prediction:ready", &json!({}));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_failing_handler_is_isolated() {
        let (handlers, calls) = counting_registry();
        {
            let mut map = handlers.lock().unwrap();
            let entry = map.entry("outbreak:created".to_string()).or_default();
            entry.push(Arc::new(|_| anyhow::bail!("subscriber bug")));
            let calls = calls.clone();
            entry.push(Arc::new(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }));
        }

        dispatch(&handlers, "outbreak:created", &json!({}));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dispatch_frame_routes_payload() {
        let (handlers, _) = counting_registry();
        let seen = Arc::new(Mutex::new(None));
        {
            let seen = seen.clone();
            handlers
                .lock()
                .unwrap()
                .entry("outbreak:deleted".to_string())
                .or_default()
                .push(Arc::new(move |data| {
                    *seen.lock().unwrap() = Some(data.clone());
                    Ok(())
                }));
        }

        dispatch_frame(
            &handlers,
            r#"{"event":"outbreak:deleted","data":{"id":"o1"}}"#,
        );
        assert_eq!(seen.lock().unwrap().as_ref().unwrap()["id"], "o1");
    }

    #[test]
    fn test_malformed_frames_are_dropped() {
        let (handlers, _) = counting_registry();
        dispatch_frame(&handlers, "not json at all");
        dispatch_frame(&handlers, r#"{"no_event_key":true}"#);
    }

    #[test]
    fn test_unknown_event_is_a_noop() {
        let (handlers, calls) = counting_registry();
        {
            let calls = calls.clone();
            handlers
                .lock()
                .unwrap()
                .entry("system:error".to_string())
                .or_default()
                .push(Arc::new(move |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }));
        }

        dispatch_frame(&handlers, r#"{"event":"system:maintenance","data":{}}"#);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_client_registers_handlers() {
        let client = RealtimeClient::new("ws://localhost:8080/ws?token=t");
        client.on("prediction:ready", |_| Ok(()));
        client.on("prediction:ready", |_| Ok(()));

        assert_eq!(
            client
                .handlers
                .lock()
                .unwrap()
                .get("prediction:ready")
                .map(|h| h.len()),
            Some(2)
        );
    }
}
