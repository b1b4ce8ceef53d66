use std::time::Instant;

use tracing::{Instrument, Level};

use super::Middleware;
use crate::{Endpoint, Request, Response, Result};

/// Middleware for [`tracing`](https://crates.io/crates/tracing).
///
/// Opens a span for every request and logs the outcome together with the
/// prefix of the route that handled it.
#[derive(Default)]
pub struct Tracing;

impl<E: Endpoint> Middleware<E> for Tracing {
    type Output = TracingEndpoint<E>;

    fn transform(&self, ep: E) -> Self::Output {
        TracingEndpoint { inner: ep }
    }
}

/// Endpoint for `Tracing` middleware.
pub struct TracingEndpoint<E> {
    inner: E,
}

#[async_trait::async_trait]
impl<E: Endpoint> Endpoint for TracingEndpoint<E> {
    async fn call(&self, req: Request) -> Result<Response> {
        let span = tracing::span!(
            target: module_path!(),
            Level::INFO,
            "request",
            method = %req.method(),
            path = %req.uri(),
        );
        let route = req
            .bindings()
            .matcher()
            .map(|matcher| matcher.prefix().to_string());

        async move {
            let now = Instant::now();
            let resp = self.inner.call(req).await;
            match &resp {
                Ok(resp) => tracing::info!(
                    status = %resp.status(),
                    route = ?route,
                    duration = ?now.elapsed(),
                    "response"
                ),
                Err(err) => tracing::info!(
                    status = %err.status(),
                    error = %err,
                    route = ?route,
                    duration = ?now.elapsed(),
                    "error"
                ),
            }
            resp
        }
        .instrument(span)
        .await
    }
}
