//! HTTP request handling for the listener.
//!
//! Converts a hyper request into an [`IncomingRequest`], routes it through the
//! registrar on a separate task, and streams the reply back as the response
//! body.

use super::core::Hock;
use crate::expectation::{IncomingRequest, RequestBody};
use crate::response::{channel, ChannelReceiver, ResponseHead};
use bytes::Bytes;
use futures::StreamExt;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full, StreamBody};
use hyper::body::{Frame, Incoming};
use hyper::{Request, Response, StatusCode};
use std::collections::HashMap;
use std::convert::Infallible;
use tracing::{debug, error};

pub type HockBody = UnsyncBoxBody<Bytes, Infallible>;

/// Handle a request to the listener
pub async fn handle_hock_request(
    req: Request<Incoming>,
    hock: Hock,
) -> Result<Response<HockBody>, Infallible> {
    let method = req.method().to_string();
    let url = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());
    let headers: HashMap<String, String> = req
        .headers()
        .iter()
        .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap_or("").to_string()))
        .collect();

    let body = match req.into_body().collect().await {
        Ok(collected) => String::from_utf8_lossy(&collected.to_bytes()).into_owned(),
        Err(e) => {
            debug!("Failed to read request body for {} {}: {}", method, url, e);
            String::new()
        }
    };

    let incoming = IncomingRequest {
        method,
        url,
        headers,
        body: RequestBody::Text(body),
    };

    let (mut sink, receiver) = channel();
    tokio::spawn(async move {
        if let Err(e) = hock.respond(incoming, &mut sink).await {
            debug!("Request routing ended with error: {}", e);
        }
    });

    Ok(into_response(receiver).await)
}

async fn into_response(receiver: ChannelReceiver) -> Response<HockBody> {
    let ChannelReceiver { head, body } = receiver;
    let ResponseHead { status, headers } = match head.await {
        Ok(head) => head,
        Err(_) => {
            error!("Reply ended before a response head was written");
            return build_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
        }
    };

    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = Response::builder().status(status);
    for (k, v) in &headers {
        response = response.header(k.as_str(), v.as_str());
    }

    let stream = body.map(|chunk| Ok::<_, Infallible>(Frame::data(chunk)));
    response
        .body(StreamBody::new(stream).boxed_unsync())
        .unwrap_or_else(|e| {
            error!("Failed to build response: {}", e);
            build_response(StatusCode::INTERNAL_SERVER_ERROR, "Response build error")
        })
}

fn build_response(status: StatusCode, body: &'static str) -> Response<HockBody> {
    let body = Full::new(Bytes::from_static(body.as_bytes())).boxed_unsync();
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response
}
