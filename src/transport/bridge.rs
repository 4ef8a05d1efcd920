//! WebSocket Bridge
//!
//! Accepts WebSocket upgrades on the configured transport path and adapts
//! the socket into the byte source and byte sink a broker session runs on.

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures_util::{future, Sink, SinkExt, Stream, StreamExt};
use std::sync::Arc;

use super::error::TransportError;
use crate::api::{ApiError, AppState};
use crate::session::{SessionManager, SessionSlot};

/// Subprotocols offered by MQTT-over-WebSocket clients
pub const SUBPROTOCOLS: [&str; 2] = ["mqtt", "mqttv3.1"];

/// Body returned for a plain GET on the transport path
pub const UPGRADE_HINT: &str = "WebSocket MQTT endpoint. Use ws(s):// and MQTT over WebSockets.";

/// Upgrade handler mounted on the transport path
pub async fn upgrade_handler(
    State(state): State<Arc<AppState>>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let ws = match upgrade {
        Ok(ws) => ws,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Non-upgrade request on transport path");
            return (StatusCode::UPGRADE_REQUIRED, UPGRADE_HINT).into_response();
        }
    };

    let Some(slot) = state.sessions.try_reserve() else {
        tracing::warn!(
            active = state.sessions.active_sessions(),
            max = state.sessions.config().max_sessions,
            "Broker at capacity, upgrade refused"
        );
        return (StatusCode::SERVICE_UNAVAILABLE, "Broker at capacity").into_response();
    };

    let sessions = Arc::clone(&state.sessions);
    ws.protocols(SUBPROTOCOLS)
        .on_upgrade(move |socket| bridge(socket, sessions, slot))
}

/// Run one broker session over an established WebSocket
pub async fn bridge(socket: WebSocket, sessions: Arc<SessionManager>, slot: SessionSlot) {
    let protocol = socket
        .protocol()
        .and_then(|value| value.to_str().ok())
        .unwrap_or("none")
        .to_string();

    let (sink, stream) = socket.split();
    let reason = sessions.run_in(slot, inbound(stream), outbound(sink)).await;

    tracing::debug!(subprotocol = %protocol, reason = %reason, "WebSocket bridge closed");
}

/// Binary frames become byte chunks
///
/// Ping and pong frames are skipped, a close frame ends the stream and a
/// text frame surfaces as [`TransportError::TextFrame`].
pub fn inbound<S>(frames: S) -> impl Stream<Item = Result<Bytes, TransportError>>
where
    S: Stream<Item = Result<Message, axum::Error>>,
{
    frames
        .take_while(|frame| future::ready(!matches!(frame, Ok(Message::Close(_)))))
        .filter_map(|frame| {
            future::ready(match frame {
                Ok(Message::Binary(data)) => Some(Ok(Bytes::from(data))),
                Ok(Message::Text(_)) => Some(Err(TransportError::TextFrame)),
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Close(_)) => None,
                Err(err) => Some(Err(err.into())),
            })
        })
}

/// Byte chunks become binary frames
pub fn outbound<K>(sink: K) -> impl Sink<Bytes, Error = TransportError>
where
    K: Sink<Message, Error = axum::Error>,
{
    sink.with(|chunk: Bytes| future::ready(Ok::<_, TransportError>(Message::Binary(chunk.to_vec()))))
}

/// Fallback for every path the router does not know
///
/// WebSocket upgrades are refused before the handshake; everything else
/// gets the JSON not-found body.
pub async fn reject_unknown_path(headers: HeaderMap, uri: Uri) -> Response {
    if is_websocket_upgrade(&headers) {
        tracing::debug!(path = %uri.path(), "WebSocket upgrade refused on unknown path");
        return (StatusCode::NOT_FOUND, "No WebSocket endpoint at this path").into_response();
    }

    ApiError::NotFound(format!("No route for {}", uri.path())).into_response()
}

fn is_websocket_upgrade(headers: &HeaderMap) -> bool {
    headers
        .get(header::UPGRADE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.eq_ignore_ascii_case("websocket"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    #[tokio::test]
    async fn test_inbound_adapter() {
        let frames: Vec<Result<Message, axum::Error>> = vec![
            Ok(Message::Binary(vec![0xC0, 0x00])),
            Ok(Message::Ping(vec![1])),
            Ok(Message::Pong(vec![])),
            Ok(Message::Binary(vec![0xE0, 0x00])),
            Ok(Message::Close(None)),
            Ok(Message::Binary(vec![0xFF])),
        ];

        let chunks: Vec<_> = inbound(stream::iter(frames)).collect().await;
        assert_eq!(chunks.len(), 2);
        assert_eq!(&chunks[0].as_ref().unwrap()[..], &[0xC0, 0x00]);
        assert_eq!(&chunks[1].as_ref().unwrap()[..], &[0xE0, 0x00]);
    }

    #[tokio::test]
    async fn test_text_frame_is_transport_error() {
        let frames: Vec<Result<Message, axum::Error>> = vec![Ok(Message::Text("hello".to_string()))];

        let chunks: Vec<_> = inbound(stream::iter(frames)).collect().await;
        assert!(matches!(chunks[0], Err(TransportError::TextFrame)));
    }

    #[test]
    fn test_upgrade_detection() {
        let mut headers = HeaderMap::new();
        assert!(!is_websocket_upgrade(&headers));

        headers.insert(header::UPGRADE, "WebSocket".parse().unwrap());
        assert!(is_websocket_upgrade(&headers));
    }
}
