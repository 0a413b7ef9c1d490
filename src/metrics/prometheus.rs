//! Prometheus metrics definitions and HTTP server

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use prometheus::{
    CounterVec, Encoder, Gauge, HistogramOpts, HistogramTimer, HistogramVec, Opts, Registry,
    TextEncoder,
};
use tokio::net::TcpListener;
use tracing::{error, info};

/// Operator metrics, registered in their own registry
pub struct Metrics {
    registry: Registry,

    /// Total number of reconciliations
    pub reconciliations: CounterVec,

    /// Total number of reconciliation errors
    pub reconciliation_errors: CounterVec,

    /// Reconciliation duration histogram
    pub reconcile_duration: HistogramVec,

    /// Ceph commands by operation and outcome
    pub ceph_commands: CounterVec,

    /// Total number of cleanup operations
    pub cleanups: CounterVec,

    /// Operator health (1 = healthy, 0 = unhealthy)
    pub operator_health: Gauge,
}

impl Metrics {
    /// Create and register all operator metrics
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let reconciliations = CounterVec::new(
            Opts::new(
                "ceph_subvolumegroup_operator_reconciliations_total",
                "Total number of reconciliations",
            ),
            &["kind"],
        )?;
        let reconciliation_errors = CounterVec::new(
            Opts::new(
                "ceph_subvolumegroup_operator_reconciliation_errors_total",
                "Total number of reconciliation errors",
            ),
            &["kind"],
        )?;
        let reconcile_duration = HistogramVec::new(
            HistogramOpts::new(
                "ceph_subvolumegroup_operator_reconcile_duration_seconds",
                "Duration of reconciliations in seconds",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
            &["kind"],
        )?;
        let ceph_commands = CounterVec::new(
            Opts::new(
                "ceph_subvolumegroup_operator_ceph_commands_total",
                "Total number of ceph subvolume group commands by outcome",
            ),
            &["operation", "outcome"],
        )?;
        let cleanups = CounterVec::new(
            Opts::new(
                "ceph_subvolumegroup_operator_cleanups_total",
                "Total number of cleanup operations",
            ),
            &["kind"],
        )?;
        let operator_health = Gauge::new(
            "ceph_subvolumegroup_operator_health",
            "Operator health status (1 = healthy, 0 = unhealthy)",
        )?;

        registry.register(Box::new(reconciliations.clone()))?;
        registry.register(Box::new(reconciliation_errors.clone()))?;
        registry.register(Box::new(reconcile_duration.clone()))?;
        registry.register(Box::new(ceph_commands.clone()))?;
        registry.register(Box::new(cleanups.clone()))?;
        registry.register(Box::new(operator_health.clone()))?;

        Ok(Self {
            registry,
            reconciliations,
            reconciliation_errors,
            reconcile_duration,
            ceph_commands,
            cleanups,
            operator_health,
        })
    }

    /// Count a reconciliation and time it until the timer is dropped
    pub fn start_reconcile(&self, kind: &str) -> HistogramTimer {
        self.reconciliations.with_label_values(&[kind]).inc();
        self.reconcile_duration.with_label_values(&[kind]).start_timer()
    }

    pub fn record_reconcile_error(&self, kind: &str) {
        self.reconciliation_errors.with_label_values(&[kind]).inc();
    }

    pub fn record_ceph_command(&self, operation: &str, success: bool) {
        let outcome = if success { "success" } else { "failure" };
        self.ceph_commands
            .with_label_values(&[operation, outcome])
            .inc();
    }

    pub fn record_cleanup(&self) {
        self.cleanups
            .with_label_values(&["CephFilesystemSubVolumeGroup"])
            .inc();
    }

    /// Render all metrics in the Prometheus text format
    pub fn encode(&self) -> prometheus::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(buffer)
    }

    fn is_healthy(&self) -> bool {
        self.operator_health.get() >= 1.0
    }
}

/// Start the metrics HTTP server
pub async fn serve(port: u16, metrics: Arc<Metrics>) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("Metrics server listening on {}", addr);

    // Set initial health
    metrics.operator_health.set(1.0);

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                let metrics = metrics.clone();
                async move { handle_request(req, &metrics) }
            });
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                error!("Error serving connection: {}", e);
            }
        });
    }
}

/// Handle HTTP requests
fn handle_request<B>(req: Request<B>, metrics: &Metrics) -> Result<Response<Full<Bytes>>, Infallible> {
    let response = match req.uri().path() {
        "/metrics" => metrics_response(metrics),
        "/healthz" | "/health" => text_response(StatusCode::OK, "ok"),
        "/readyz" | "/ready" if metrics.is_healthy() => text_response(StatusCode::OK, "ok"),
        "/readyz" | "/ready" => text_response(StatusCode::SERVICE_UNAVAILABLE, "not ready"),
        _ => text_response(StatusCode::NOT_FOUND, "Not Found"),
    };

    Ok(response)
}

/// Generate metrics response
fn metrics_response(metrics: &Metrics) -> Response<Full<Bytes>> {
    match metrics.encode() {
        Ok(buffer) => {
            let mut response = Response::new(Full::new(Bytes::from(buffer)));
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(prometheus::TEXT_FORMAT));
            response
        }
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            text_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics")
        }
    }
}

fn text_response(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
    *response.status_mut() = status;
    response
}
