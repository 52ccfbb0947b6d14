//! Image request handling.
//!
//! Route match → parameter resolution → source fetch → transform, bounded by
//! the server's request deadline. The outcome is always a complete
//! [`EndpointResponse`]; failures become JSON error bodies.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ResolvedConfig;
use crate::error::ProxyError;
use crate::image_processor::{ImageProcessor, ProcessedImage};
use crate::metrics::Metrics;
use crate::pipeline::RequestContext;
use crate::router::{self, ResolvedRequest, Router};
use crate::source::{ImageSource, SourceRegistry};

use super::special_endpoints::{error_response, EndpointResponse};

pub struct ImageHandler {
    router: Router,
    sources: SourceRegistry,
    processors: HashMap<String, Arc<ImageProcessor>>,
    metrics: Arc<Metrics>,
    deadline: Duration,
}

impl ImageHandler {
    pub fn new(config: &ResolvedConfig, metrics: Arc<Metrics>) -> Self {
        Self::with_sources(config, SourceRegistry::from_config(&config.sources), metrics)
    }

    /// Build a handler that fetches from `sources` instead of the configured ones.
    pub fn with_sources(
        config: &ResolvedConfig,
        sources: SourceRegistry,
        metrics: Arc<Metrics>,
    ) -> Self {
        let processors = config
            .processors
            .iter()
            .map(|(name, processor)| {
                (
                    name.to_string(),
                    Arc::new(ImageProcessor::new(processor.clone())),
                )
            })
            .collect();

        Self {
            router: Router::new(config.routes.clone()),
            sources,
            processors,
            metrics,
            deadline: config.server.request_deadline(),
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Serve one image request and record its outcome.
    pub async fn handle(&self, ctx: &mut RequestContext) -> EndpointResponse {
        match self.serve(ctx).await {
            Ok(image) => {
                if let Some(route) = ctx.route_name() {
                    self.metrics
                        .record_route_response(route, image.data.len() as u64);
                    self.metrics
                        .record_route_latency(route, ctx.started_at().elapsed());
                }
                if !image.modified {
                    self.metrics.increment_passthrough();
                }

                tracing::debug!(
                    request_id = %ctx.request_id(),
                    route = ctx.route_name().unwrap_or("-"),
                    original = %image.original_size,
                    output = %image.output_size,
                    modified = image.modified,
                    bytes = image.data.len(),
                    "Image served"
                );
                EndpointResponse::image(image)
            }
            Err(err) => {
                self.record_failure(ctx, &err);
                error_response(&err)
            }
        }
    }

    async fn serve(&self, ctx: &mut RequestContext) -> Result<ProcessedImage, ProxyError> {
        let route = self.router.match_path(ctx.path())?;
        let request = router::resolve(route, ctx.path(), ctx.query_params())?;
        ctx.set_route(&route.name, &request.source_key);

        let source = self.sources.get(&route.source).ok_or_else(|| {
            ProxyError::Internal(format!("source '{}' is not registered", route.source))
        })?;
        let processor = self.processors.get(&route.processor).cloned().ok_or_else(|| {
            ProxyError::Internal(format!("processor '{}' is not registered", route.processor))
        })?;

        tokio::time::timeout(
            self.deadline,
            fetch_and_transform(source, processor, request),
        )
        .await
        .map_err(|_| ProxyError::Timeout(self.deadline))?
    }

    fn record_failure(&self, ctx: &RequestContext, err: &ProxyError) {
        self.metrics.increment_error(err.kind());

        let stage = err.stage();
        if let Some(stage) = stage {
            self.metrics.increment_stage_failure(stage.as_str());
        }

        let status = err.to_http_status();
        if status >= 500 {
            tracing::warn!(
                request_id = %ctx.request_id(),
                path = %ctx.path(),
                route = ctx.route_name().unwrap_or("-"),
                kind = err.kind(),
                stage = stage.map(|s| s.as_str()).unwrap_or("-"),
                status = status,
                error = %err,
                "Image request failed"
            );
        } else {
            tracing::info!(
                request_id = %ctx.request_id(),
                path = %ctx.path(),
                kind = err.kind(),
                status = status,
                error = %err,
                "Image request rejected"
            );
        }
    }
}

async fn fetch_and_transform(
    source: Arc<dyn ImageSource>,
    processor: Arc<ImageProcessor>,
    request: ResolvedRequest,
) -> Result<ProcessedImage, ProxyError> {
    let raw = source.fetch(&request.source_key).await?;
    let options = request.options;

    // Decoding and resampling are CPU-bound; keep them off the reactor.
    let processed = tokio::task::spawn_blocking(move || processor.process(&raw, &options))
        .await
        .map_err(|e| ProxyError::Internal(format!("transform task failed: {}", e)))??;
    Ok(processed)
}
