//! Subscription plumbing: converts a round's broadcast hub into an SSE
//! response stream.

use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use crate::{
    dto::sse::{Handshake, StreamEvent},
    error::ServiceError,
    services::sse_events,
    state::{SharedState, SseHub},
};

/// Subscribe to a round's event stream.
///
/// The handshake plus a fresh snapshot are pushed onto the hub so the new
/// subscriber starts from the current document rather than an empty stream.
pub async fn subscribe(
    state: &SharedState,
    round_id: Uuid,
) -> Result<broadcast::Receiver<StreamEvent>, ServiceError> {
    let handle = state.round(round_id)?;
    let receiver = handle.hub().subscribe();

    broadcast_handshake(
        handle.hub(),
        Handshake {
            round_id,
            message: "round stream connected".into(),
            degraded: state.is_degraded(),
        },
    );
    sse_events::broadcast_round_snapshot(&handle).await;

    Ok(receiver)
}

/// Convert a broadcast receiver into an SSE response, forwarding events
/// until the client disconnects. Lagged receivers skip messages and catch up
/// from the next full snapshot.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<StreamEvent>,
    round_id: Uuid,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Small bounded channel between the forwarder task and the response.
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            let mut event = Event::default().data(payload.data);
                            if let Some(name) = payload.event {
                                event = event.event(name);
                            }

                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(_)) => {
                            // Skip lagged messages but keep the stream alive;
                            // the next snapshot restores full state.
                            continue;
                        }
                    }
                }
            }
        }

        tracing::info!(round_id = %round_id, "round stream disconnected");
    });

    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn broadcast_handshake(hub: &SseHub, handshake: Handshake) {
    if let Ok(event) = StreamEvent::json(Some("handshake".to_string()), &handshake) {
        hub.broadcast(event);
    }
}
