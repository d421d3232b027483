// Chunked JSON streaming utilities
use crate::application::streaming_service::AnalysisMessage;
use crate::infrastructure::http_response::brotli_compress;
use crate::infrastructure::wire_mapper::{message_to_wire, WireStreamMessage};
use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use axum::response::IntoResponse;
use bytes::{BufMut, Bytes, BytesMut};
use futures::stream::Stream;
use futures::StreamExt;

/// Create a chunked streaming response of length-prefixed JSON messages.
pub fn chunked_json_stream<S>(stream: S, compress: bool) -> Result<Response<Body>, StatusCode>
where
    S: Stream<Item = WireStreamMessage> + Send + 'static,
{
    let byte_stream = stream.then(move |msg| async move { serialize_chunk(&msg, compress).await });

    let body = Body::from_stream(byte_stream);

    // Chunks are compressed individually, so no Content-Encoding on the response
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::TRANSFER_ENCODING, "chunked")
        .body(body)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Frame one message: 4-byte big-endian length, then the (optionally
/// Brotli-compressed) JSON payload.
pub async fn serialize_chunk(msg: &WireStreamMessage, compress: bool) -> Result<Bytes, std::io::Error> {
    let json = serde_json::to_vec(msg).map_err(std::io::Error::other)?;

    let payload = if compress {
        brotli_compress(&json).await?
    } else {
        json
    };

    let length = u32::try_from(payload.len()).map_err(std::io::Error::other)?;
    let mut chunk = BytesMut::with_capacity(4 + payload.len());
    chunk.put_u32(length);
    chunk.put_slice(&payload);

    Ok(chunk.freeze())
}

/// Helper to create a streaming response from a receiver
pub fn stream_from_receiver(
    mut rx: tokio::sync::mpsc::Receiver<AnalysisMessage>,
    compress: bool,
) -> impl IntoResponse {
    let stream = async_stream::stream! {
        while let Some(msg) = rx.recv().await {
            yield message_to_wire(msg);
        }
    };

    match chunked_json_stream(stream, compress) {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_compression::tokio::bufread::BrotliDecoder;
    use tokio::io::AsyncReadExt;

    fn complete() -> WireStreamMessage {
        WireStreamMessage::Complete {
            widgets: 2,
            duration_ms: 5,
        }
    }

    #[tokio::test]
    async fn test_chunk_is_length_prefixed() {
        let chunk = serialize_chunk(&complete(), false).await.unwrap();
        let length = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as usize;

        assert_eq!(length, chunk.len() - 4);
        let json: serde_json::Value = serde_json::from_slice(&chunk[4..]).unwrap();
        assert_eq!(json["type"], "complete");
    }

    #[tokio::test]
    async fn test_compressed_chunk_decodes() {
        let chunk = serialize_chunk(&complete(), true).await.unwrap();
        let length = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as usize;
        assert_eq!(length, chunk.len() - 4);

        let mut decoder = BrotliDecoder::new(&chunk[4..]);
        let mut json = String::new();
        decoder.read_to_string(&mut json).await.unwrap();
        assert!(json.contains("\"widgets\":2"));
    }

    #[tokio::test]
    async fn test_stream_from_receiver_frames_every_message() {
        let (tx, rx) = tokio::sync::mpsc::channel(4);
        tx.send(AnalysisMessage::Failed {
            message: "gone".to_string(),
        })
        .await
        .unwrap();
        drop(tx);

        let response = stream_from_receiver(rx, false).into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let length = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        assert_eq!(bytes.len(), 4 + length);
        let json: serde_json::Value = serde_json::from_slice(&bytes[4..]).unwrap();
        assert_eq!(json, serde_json::json!({"type": "failed", "message": "gone"}));
    }
}
