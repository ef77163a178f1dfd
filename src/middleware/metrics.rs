//! Request ID propagation and HTTP metrics as a Tower layer

use axum::{body::Body, http::Request, response::Response};
use metrics::{counter, gauge, histogram};
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Instant,
};
use tower::{Layer, Service};
use tracing::Instrument;
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
pub struct ObservabilityLayer;

impl<S> Layer<S> for ObservabilityLayer {
    type Service = ObservabilityMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ObservabilityMiddleware { inner }
    }
}

#[derive(Clone)]
pub struct ObservabilityMiddleware<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for ObservabilityMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let method = request.method().to_string();
        let route = route_label(request.uri().path());
        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let span = tracing::info_span!(
            "http",
            request_id = %request_id,
            method = %method,
            route = %route
        );
        let mut inner = self.inner.clone();

        Box::pin(
            async move {
                gauge!("hotelhub_http_requests_in_flight").increment(1.0);
                let started = Instant::now();
                let result = inner.call(request).await;
                gauge!("hotelhub_http_requests_in_flight").decrement(1.0);

                let mut response = result?;
                let status = response.status();
                counter!(
                    "hotelhub_http_requests_total",
                    "method" => method.clone(),
                    "route" => route.clone(),
                    "status" => status.as_u16().to_string()
                )
                .increment(1);
                histogram!(
                    "hotelhub_http_request_duration_seconds",
                    "method" => method,
                    "route" => route
                )
                .record(started.elapsed().as_secs_f64());

                if status.is_server_error() {
                    tracing::error!(status = status.as_u16(), "request failed");
                }

                if let Ok(value) = request_id.parse() {
                    response.headers_mut().insert(REQUEST_ID_HEADER, value);
                }
                Ok(response)
            }
            .instrument(span),
        )
    }
}

/// Replace id segments with `{id}` so labels stay low-cardinality.
fn route_label(path: &str) -> String {
    path.split('/')
        .map(|seg| if is_id_segment(seg) { "{id}" } else { seg })
        .collect::<Vec<_>>()
        .join("/")
}

fn is_id_segment(seg: &str) -> bool {
    let uuid_like = seg.len() == 36 && seg.chars().all(|c| c.is_ascii_hexdigit() || c == '-');
    let numeric = !seg.is_empty() && seg.chars().all(|c| c.is_ascii_digit());
    uuid_like || numeric
}
