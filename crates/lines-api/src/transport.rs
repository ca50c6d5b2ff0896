//! WebSocket framing for subscription sessions
//!
//! Requests and responses are JSON text frames. A Close frame ends the
//! request stream cleanly; ping/pong frames are skipped.

use axum::extract::ws::{Message, WebSocket};
use futures::{future, Sink, SinkExt, Stream, StreamExt};
use lines_core::{SubscriptionRequest, SubscriptionResponse, TransportError};

/// Split a socket into the request stream and response sink a session expects
pub fn split_socket(
    socket: WebSocket,
) -> (
    impl Stream<Item = Result<SubscriptionRequest, TransportError>> + Unpin + Send,
    impl Sink<SubscriptionResponse, Error = TransportError> + Unpin + Send + 'static,
) {
    let (sink, stream) = socket.split();

    let incoming = stream
        .take_while(|frame| future::ready(!matches!(frame, Ok(Message::Close(_)))))
        .filter_map(|frame| future::ready(decode_frame(frame)));

    let outgoing = sink
        .sink_map_err(|e| TransportError::Send(e.to_string()))
        .with(|response: SubscriptionResponse| future::ready(encode_response(&response)));

    (Box::pin(incoming), Box::pin(outgoing))
}

/// Decode one frame; `None` for frames that carry no request
fn decode_frame(
    frame: Result<Message, axum::Error>,
) -> Option<Result<SubscriptionRequest, TransportError>> {
    match frame {
        Ok(Message::Text(text)) => Some(decode_request(text.as_bytes())),
        Ok(Message::Binary(bytes)) => Some(decode_request(&bytes)),
        Ok(_) => None,
        Err(e) => Some(Err(TransportError::Receive(e.to_string()))),
    }
}

fn decode_request(payload: &[u8]) -> Result<SubscriptionRequest, TransportError> {
    serde_json::from_slice(payload).map_err(|e| TransportError::Malformed(e.to_string()))
}

fn encode_response(response: &SubscriptionResponse) -> Result<Message, TransportError> {
    serde_json::to_string(response)
        .map(|json| Message::Text(json.into()))
        .map_err(|e| TransportError::Send(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_text_frame() {
        let frame = Ok(Message::Text(r#"{"sports":["soccer"],"interval":1}"#.into()));
        let request = decode_frame(frame).unwrap().unwrap();
        assert_eq!(request, SubscriptionRequest::new(["soccer"], 1));
    }

    #[test]
    fn test_decode_malformed_frame() {
        let frame = Ok(Message::Text("not json".into()));
        let result = decode_frame(frame).unwrap();
        assert!(matches!(result, Err(TransportError::Malformed(_))));
    }

    #[test]
    fn test_ping_is_skipped() {
        let frame = Ok(Message::Ping(Default::default()));
        assert!(decode_frame(frame).is_none());
    }

    #[test]
    fn test_encode_response() {
        let mut response = SubscriptionResponse::default();
        response.deltas.insert("tennis".to_string(), 0.5);
        let message = encode_response(&response).unwrap();
        match message {
            Message::Text(text) => assert_eq!(text.as_str(), r#"{"deltas":{"tennis":0.5}}"#),
            other => panic!("unexpected frame: {:?}", other),
        }
    }
}
