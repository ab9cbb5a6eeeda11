//! Realtime hub: one broadcast channel, one task per socket.
//!
//! Frames are the [`Event`]/[`ClientCommand`] JSON shapes from the models
//! crate. Sockets authenticate with `?token=` at upgrade time using the
//! same token store as the REST surface.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use models::{ClientCommand, Event, GeographicBounds};

use crate::auth::{permissions, Identity};
use crate::database;
use crate::error::AppError;
use crate::routes::predictions;
use crate::state::SharedState;

const CHANNEL_CAPACITY: usize = 256;

/// Fan-out point for realtime events. Cloned into state; publishing with
/// no connected sockets is a no-op.
#[derive(Clone)]
pub struct Hub {
    sender: broadcast::Sender<Event>,
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

impl Hub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn publish(&self, event: Event) {
        // Err only means nobody is listening right now.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }
}

#[derive(Deserialize)]
pub struct WsQuery {
    token: Option<String>,
}

pub async fn ws_handler(
    State(state): State<SharedState>,
    Query(params): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, AppError> {
    let token = params.token.ok_or(AppError::Unauthorized)?;
    let identity = database::resolve_token(state.redis_connection.clone(), &token)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, identity)))
}

/// Should `event` reach a socket whose map subscription is `filter`?
///
/// Only located events are filtered; system and prediction frames always
/// go through.
fn event_allowed(filter: &Option<GeographicBounds>, event: &Event) -> bool {
    match (filter, event.position()) {
        (Some(bounds), Some((latitude, longitude))) => bounds.contains(latitude, longitude),
        _ => true,
    }
}

async fn handle_socket(socket: WebSocket, state: SharedState, identity: Identity) {
    let (mut sink, mut stream) = socket.split();
    let mut events = state.hub.subscribe();
    let mut map_filter: Option<GeographicBounds> = None;

    debug!("Socket connected for {}", identity.actor);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    if !event_allowed(&map_filter, &event) {
                        continue;
                    }
                    let frame = match serde_json::to_string(&event) {
                        Ok(frame) => frame,
                        Err(e) => {
                            warn!("Failed to encode event: {e}");
                            continue;
                        }
                    };
                    if sink.send(Message::Text(frame.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Socket for {} lagged, skipped {skipped} events", identity.actor);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    handle_command(text.as_str(), &state, &identity, &mut map_filter, &mut sink)
                        .await;
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!("Socket error for {}: {e}", identity.actor);
                    break;
                }
            },
        }
    }

    debug!("Socket closed for {}", identity.actor);
}

async fn handle_command(
    text: &str,
    state: &SharedState,
    identity: &Identity,
    map_filter: &mut Option<GeographicBounds>,
    sink: &mut (impl SinkExt<Message> + Unpin),
) {
    let command: ClientCommand = match serde_json::from_str(text) {
        Ok(command) => command,
        Err(e) => {
            debug!("Ignoring malformed frame from {}: {e}", identity.actor);
            return;
        }
    };

    match command {
        ClientCommand::MapSubscribe { bounds } => {
            if bounds.is_valid() {
                *map_filter = Some(bounds);
            } else {
                send_error(sink, "map:subscribe bounds out of range").await;
            }
        }
        ClientCommand::MapUnsubscribe => {
            *map_filter = None;
        }
        ClientCommand::PredictionRequest(request) => {
            if !identity.can(permissions::PREDICTIONS_WRITE) {
                send_error(sink, "permission denied").await;
                return;
            }
            match predictions::generate(state, identity, &request).await {
                // Everyone subscribed sees the finished prediction, the
                // same as one produced over REST.
                Ok(prediction) => state.hub.publish(Event::PredictionReady(prediction)),
                // Failures only concern the requesting socket.
                Err(e) => send_error(sink, &e.to_string()).await,
            }
        }
    }
}

async fn send_error(sink: &mut (impl SinkExt<Message> + Unpin), message: &str) {
    let event = Event::SystemError {
        message: message.to_string(),
    };
    if let Ok(frame) = serde_json::to_string(&event) {
        let _ = sink.send(Message::Text(frame.into())).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use models::OutbreakCluster;

    fn located_event(latitude: f64, longitude: f64) -> Event {
        Event::OutbreakCreated(OutbreakCluster {
            id: "o1".into(),
            name: "cluster".into(),
            disease_type: "cholera".into(),
            latitude,
            longitude,
            case_count: 10,
            severity: 2,
            confidence: 0.9,
            symptoms: vec![],
            reported_at: Utc::now(),
            updated_at: Utc::now(),
            active: true,
        })
    }

    #[test]
    fn test_unfiltered_socket_gets_everything() {
        assert!(event_allowed(&None, &located_event(42.0, -72.0)));
    }

    #[test]
    fn test_filter_applies_to_located_events() {
        let filter = Some(GeographicBounds::new(45.0, 40.0, -70.0, -75.0));
        assert!(event_allowed(&filter, &located_event(42.0, -72.0)));
        assert!(!event_allowed(&filter, &located_event(10.0, 10.0)));
    }

    #[test]
    fn test_filter_never_blocks_system_events() {
        let filter = Some(GeographicBounds::new(1.0, 0.0, 1.0, 0.0));
        let event = Event::SystemMaintenance {
            message: "restart".into(),
        };
        assert!(event_allowed(&filter, &event));
    }

    #[test]
    fn test_filter_never_blocks_deletions() {
        // Deletions carry no position; clients must always drop the marker.
        let filter = Some(GeographicBounds::new(1.0, 0.0, 1.0, 0.0));
        assert!(event_allowed(&filter, &Event::OutbreakDeleted { id: "o1".into() }));
    }

    #[test]
    fn test_hub_publish_without_subscribers() {
        let hub = Hub::new();
        hub.publish(Event::SystemMaintenance {
            message: "noop".into(),
        });
    }

    #[test]
    fn test_hub_fan_out() {
        let hub = Hub::new();
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();

        hub.publish(Event::OutbreakDeleted { id: "o1".into() });

        assert!(matches!(a.try_recv(), Ok(Event::OutbreakDeleted { .. })));
        assert!(matches!(b.try_recv(), Ok(Event::OutbreakDeleted { .. })));
    }
}
