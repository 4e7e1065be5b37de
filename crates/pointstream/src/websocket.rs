//! WebSocket transport.
//!
//! One binary message is one frame. Text, ping and pong messages carry no
//! frame data and are ignored. There is no reconnect: when the socket
//! closes, the stream ends.

use std::sync::Arc;

use futures_util::{Stream, StreamExt, future, stream};
use tokio_tungstenite::tungstenite::Message;

use crate::admission::AdmissionController;
use crate::error::Result;
use crate::stream::{StreamUpdate, TransportEvent, pump};

/// Open a WebSocket and expose it as transport events.
///
/// The stream starts with [`TransportEvent::Opened`] and always ends with
/// [`TransportEvent::Closed`].
pub async fn connect(url: &str) -> Result<impl Stream<Item = TransportEvent>> {
    let (socket, _response) = tokio_tungstenite::connect_async(url).await?;
    tracing::info!("Connected to {}", url);

    let messages = socket.filter_map(|message| {
        future::ready(match message {
            Ok(Message::Binary(payload)) => Some(TransportEvent::Frame(payload.to_vec())),
            Ok(Message::Close(_)) => Some(TransportEvent::Closed),
            Ok(_) => None,
            Err(e) => Some(TransportEvent::Error(e.to_string())),
        })
    });

    Ok(stream::once(future::ready(TransportEvent::Opened))
        .chain(messages)
        .chain(stream::once(future::ready(TransportEvent::Closed))))
}

/// Connect to `url` and pump frames into `sink` until the socket closes.
///
/// A failed connection is reported through `sink` as an error update.
pub async fn run(
    url: String,
    controller: Arc<AdmissionController>,
    sink: async_channel::Sender<StreamUpdate>,
) {
    match connect(&url).await {
        Ok(events) => pump(events, controller, sink).await,
        Err(e) => {
            tracing::error!("Failed to connect to {}: {}", url, e);
            let _ = sink.send(StreamUpdate::Error(e.to_string())).await;
        }
    }
}
