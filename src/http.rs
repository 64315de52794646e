//! Reference HTTP host for the [`Dispatcher`].
//!
//! Only adapts axum requests to `(method, decoded path, body)` and maps the
//! [`crate::soap::SoapReply`] back. No ONVIF logic lives here.

use crate::soap::Dispatcher;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use log::info;
use percent_encoding::percent_decode_str;
use std::future::Future;
use tokio::net::TcpListener;

/// Every path is routed to the dispatcher
pub fn router(dispatcher: Dispatcher) -> Router {
    Router::new().fallback(handle).with_state(dispatcher)
}

pub async fn serve<F>(listener: TcpListener, dispatcher: Dispatcher, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!("[Http] Serving ONVIF on {}", listener.local_addr()?);

    axum::serve(listener, router(dispatcher))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn handle(
    State(dispatcher): State<Dispatcher>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let path = percent_decode_str(uri.path()).decode_utf8_lossy();
    let reply = dispatcher.handle(method.as_str(), &path, &body);

    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (status, [(header::CONTENT_TYPE, reply.content_type)], reply.body).into_response()
}
