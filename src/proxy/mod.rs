// Proxy module - Pingora ProxyHttp implementation
// Every response is produced in request_filter; nothing is forwarded upstream.

use async_trait::async_trait;
use pingora_core::upstreams::peer::HttpPeer;
use pingora_core::{Error, ErrorType, Result};
use pingora_http::ResponseHeader;
use pingora_proxy::{ProxyHttp, Session};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

use crate::config::ResolvedConfig;
use crate::metrics::Metrics;
use crate::pipeline::RequestContext;
use crate::router;

pub mod image_handler;
pub mod special_endpoints;

use image_handler::ImageHandler;
use special_endpoints::EndpointResponse;

/// KagamiProxy implements the Pingora ProxyHttp trait
/// Serves transformed images, health and metrics
pub struct KagamiProxy {
    handler: ImageHandler,
    metrics: Arc<Metrics>,
    request_semaphore: Arc<Semaphore>,
    /// Proxy start time (for uptime calculation in /health endpoint)
    start_time: Instant,
}

impl KagamiProxy {
    pub fn new(config: &ResolvedConfig) -> Self {
        Self::with_handler(config, |config, metrics| ImageHandler::new(config, metrics))
    }

    fn with_handler<F>(config: &ResolvedConfig, build: F) -> Self
    where
        F: FnOnce(&ResolvedConfig, Arc<Metrics>) -> ImageHandler,
    {
        let metrics = Arc::new(Metrics::new());
        let handler = build(config, metrics.clone());

        tracing::info!(
            routes = handler.router().routes().len(),
            sources = config.sources.len(),
            processors = config.processors.len(),
            max_concurrent_requests = config.server.max_concurrent_requests,
            "Proxy initialized"
        );

        Self {
            handler,
            metrics,
            request_semaphore: Arc::new(Semaphore::new(config.server.max_concurrent_requests)),
            start_time: Instant::now(),
        }
    }

    /// Get a reference to the metrics instance
    pub fn metrics(&self) -> Arc<Metrics> {
        self.metrics.clone()
    }

    /// Dispatch a request that already holds a concurrency permit.
    async fn respond(&self, ctx: &mut RequestContext) -> EndpointResponse {
        if !matches!(ctx.method(), "GET" | "HEAD") {
            return special_endpoints::method_not_allowed();
        }

        match ctx.path() {
            "/health" => special_endpoints::handle_health(self.start_time),
            "/metrics" => special_endpoints::handle_metrics(&self.metrics),
            _ => self.handler.handle(ctx).await,
        }
    }
}

/// Write a complete response; HEAD gets the headers only.
async fn write_response(
    session: &mut Session,
    ctx: &mut RequestContext,
    response: EndpointResponse,
) -> Result<()> {
    let head_only = ctx.method() == "HEAD";

    let mut header = ResponseHeader::build(response.status, None)?;
    header.insert_header("Content-Type", response.content_type)?;
    header.insert_header("Content-Length", response.body.len().to_string())?;
    header.insert_header("X-Request-Id", ctx.request_id())?;
    for (name, value) in response.headers {
        header.insert_header(name, value)?;
    }

    session
        .write_response_header(Box::new(header), head_only)
        .await?;
    if !head_only {
        session
            .write_response_body(Some(response.body), true)
            .await?;
    }

    ctx.set_status(response.status);
    Ok(())
}

/// Keeps the active request gauge balanced on every exit path.
struct ActiveRequest<'a>(&'a Metrics);

impl<'a> ActiveRequest<'a> {
    fn start(metrics: &'a Metrics) -> Self {
        metrics.increment_active_requests();
        ActiveRequest(metrics)
    }
}

impl Drop for ActiveRequest<'_> {
    fn drop(&mut self) {
        self.0.decrement_active_requests();
    }
}

#[async_trait]
impl ProxyHttp for KagamiProxy {
    type CTX = RequestContext;

    fn new_ctx(&self) -> Self::CTX {
        RequestContext::default()
    }

    async fn upstream_peer(
        &self,
        _session: &mut Session,
        _ctx: &mut Self::CTX,
    ) -> Result<Box<HttpPeer>> {
        Err(Error::explain(
            ErrorType::InternalError,
            "no upstream peer: responses are written in request_filter",
        ))
    }

    async fn request_filter(&self, session: &mut Session, ctx: &mut Self::CTX) -> Result<bool> {
        let req = session.req_header();
        let path = router::decode(req.uri.path()).into_owned();
        let query_params = router::parse_query(req.uri.query());
        *ctx = RequestContext::with_query_params(req.method.as_str().to_string(), path, query_params);

        self.metrics.increment_request_count();

        let _permit = match self.request_semaphore.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                self.metrics.increment_concurrency_limit_rejection();
                tracing::warn!(
                    request_id = %ctx.request_id(),
                    path = %ctx.path(),
                    "Concurrency limit reached, rejecting request"
                );
                write_response(session, ctx, special_endpoints::service_unavailable()).await?;
                return Ok(true);
            }
        };

        let _active = ActiveRequest::start(&self.metrics);
        let response = self.respond(ctx).await;
        write_response(session, ctx, response).await?;

        // Response is complete; never proxy upstream.
        Ok(true)
    }

    async fn logging(
        &self,
        session: &mut Session,
        e: Option<&pingora_core::Error>,
        ctx: &mut Self::CTX,
    ) {
        let status_code = session
            .response_written()
            .map(|resp| resp.status.as_u16())
            .or(ctx.status())
            .unwrap_or(500);

        self.metrics.increment_status_count(status_code);

        let duration_ms = ctx.started_at().elapsed().as_secs_f64() * 1000.0;
        match e {
            Some(err) => tracing::error!(
                request_id = %ctx.request_id(),
                method = %ctx.method(),
                path = %ctx.path(),
                status = status_code,
                duration_ms = duration_ms,
                error = %err,
                "Request failed while writing response"
            ),
            None => tracing::info!(
                request_id = %ctx.request_id(),
                method = %ctx.method(),
                path = %ctx.path(),
                route = ctx.route_name().unwrap_or("-"),
                status = status_code,
                duration_ms = duration_ms,
                "Request completed"
            ),
        }
    }
}
