//! Prometheus metrics HTTP endpoint
//!
//! Exposes admission metrics in Prometheus text format at /metrics.
//! Uses hyper for the HTTP server.

use crate::domain::types::{AttractionStatus, CapacityStatus};
use crate::infra::metrics::{
    LatencyHistogram, MetricsSummary, METRICS_BUCKET_BOUNDS, METRICS_NUM_BUCKETS,
};
use crate::services::park::Park;
use bytes::Bytes;
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::fmt::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

/// Prometheus metric type
enum MetricType {
    Counter,
    Gauge,
}

impl MetricType {
    fn as_str(&self) -> &'static str {
        match self {
            MetricType::Counter => "counter",
            MetricType::Gauge => "gauge",
        }
    }
}

/// Write a simple metric (counter or gauge) with site label
fn write_metric(
    output: &mut String,
    name: &str,
    help: &str,
    typ: MetricType,
    site: &str,
    val: u64,
) {
    let _ = writeln!(output, "# HELP {name} {help}");
    let _ = writeln!(output, "# TYPE {name} {}", typ.as_str());
    let _ = writeln!(output, "{name}{{site=\"{site}\"}} {val}");
}

/// Write a histogram metric with buckets, sum, and count
fn write_histogram(
    output: &mut String,
    name: &str,
    help: &str,
    site: &str,
    histogram: &LatencyHistogram,
) {
    let buckets = &histogram.buckets;
    let _ = writeln!(output, "# HELP {name} {help}");
    let _ = writeln!(output, "# TYPE {name} histogram");

    let mut cumulative = 0u64;
    for (i, &bound) in METRICS_BUCKET_BOUNDS.iter().enumerate() {
        cumulative += buckets[i];
        let _ = writeln!(output, "{name}_bucket{{site=\"{site}\",le=\"{bound}\"}} {cumulative}");
    }
    cumulative += buckets[METRICS_NUM_BUCKETS - 1];
    let _ = writeln!(output, "{name}_bucket{{site=\"{site}\",le=\"+Inf\"}} {cumulative}");

    let _ = writeln!(output, "{name}_sum{{site=\"{site}\"}} {}", histogram.sum_us);
    let _ = writeln!(output, "{name}_count{{site=\"{site}\"}} {}", histogram.count());
}

/// Format metrics in Prometheus text exposition format
///
/// Read-only: the periodic log owns the reporting window.
fn format_prometheus_metrics(park: &Park, site_id: &str) -> String {
    let summary = park.metrics().snapshot();
    let latency = park.metrics().latency_histogram();
    let statuses = park.statuses();
    let mut output = String::with_capacity(4096);

    write_admission_metrics(&mut output, site_id, &summary, &latency);
    write_incident_metrics(&mut output, site_id, &summary, park.open_incidents().len());
    write_score_metrics(&mut output, site_id, &summary, park.scores().len());
    write_attraction_gauges(&mut output, site_id, &statuses);

    output
}

fn write_admission_metrics(
    output: &mut String,
    site: &str,
    summary: &MetricsSummary,
    latency: &LatencyHistogram,
) {
    write_metric(
        output,
        "park_check_ins_total",
        "Check-in requests decided",
        MetricType::Counter,
        site,
        summary.check_ins_total,
    );
    write_metric(
        output,
        "park_admitted_total",
        "Check-ins that reserved a slot",
        MetricType::Counter,
        site,
        summary.admitted_total,
    );
    write_metric(
        output,
        "park_rejected_full_total",
        "Check-ins rejected at capacity",
        MetricType::Counter,
        site,
        summary.rejected_full_total,
    );
    write_metric(
        output,
        "park_rejected_incident_total",
        "Check-ins rejected by an open incident",
        MetricType::Counter,
        site,
        summary.rejected_incident_total,
    );
    write_metric(
        output,
        "park_check_outs_total",
        "Check-outs processed",
        MetricType::Counter,
        site,
        summary.check_outs_total,
    );
    write_metric(
        output,
        "park_releases_noop_total",
        "Check-outs on an already empty attraction",
        MetricType::Counter,
        site,
        summary.releases_noop_total,
    );
    write_metric(
        output,
        "park_invalid_requests_total",
        "Requests rejected as invalid input",
        MetricType::Counter,
        site,
        summary.invalid_requests_total,
    );
    write_histogram(
        output,
        "park_decision_latency_us",
        "Admission decision latency in microseconds",
        site,
        latency,
    );
}

fn write_incident_metrics(output: &mut String, site: &str, summary: &MetricsSummary, open: usize) {
    write_metric(
        output,
        "park_incidents_declared_total",
        "Incidents declared",
        MetricType::Counter,
        site,
        summary.incidents_declared_total,
    );
    write_metric(
        output,
        "park_incidents_resolved_total",
        "Incidents resolved",
        MetricType::Counter,
        site,
        summary.incidents_resolved_total,
    );
    write_metric(
        output,
        "park_open_incidents",
        "Attractions currently closed by an incident",
        MetricType::Gauge,
        site,
        open as u64,
    );
}

fn write_score_metrics(output: &mut String, site: &str, summary: &MetricsSummary, visitors: usize) {
    write_metric(
        output,
        "park_points_awarded_total",
        "Sum of all points awarded",
        MetricType::Counter,
        site,
        summary.points_awarded_total,
    );
    write_metric(
        output,
        "park_ranking_snapshots_total",
        "Ranking snapshots served",
        MetricType::Counter,
        site,
        summary.ranking_snapshots_total,
    );
    write_metric(
        output,
        "park_scored_visitors",
        "Visitors with a score entry",
        MetricType::Gauge,
        site,
        visitors as u64,
    );
}

fn write_attraction_gauges(output: &mut String, site: &str, statuses: &[AttractionStatus]) {
    let _ = writeln!(output, "# HELP park_attraction_occupancy Visitors currently admitted");
    let _ = writeln!(output, "# TYPE park_attraction_occupancy gauge");
    for s in statuses {
        let _ = writeln!(
            output,
            "park_attraction_occupancy{{site=\"{site}\",attraction_id=\"{}\"}} {}",
            s.attraction_id, s.occupancy
        );
    }

    let _ = writeln!(output, "# HELP park_attraction_capacity Configured maximum capacity");
    let _ = writeln!(output, "# TYPE park_attraction_capacity gauge");
    for s in statuses {
        let _ = writeln!(
            output,
            "park_attraction_capacity{{site=\"{site}\",attraction_id=\"{}\"}} {}",
            s.attraction_id, s.max_capacity
        );
    }

    let _ = writeln!(
        output,
        "# HELP park_attraction_status Status band (0=available, 1=medium, 2=high, 3=nearly_full, 4=full, 5=closed_incident)"
    );
    let _ = writeln!(output, "# TYPE park_attraction_status gauge");
    for s in statuses {
        let _ = writeln!(
            output,
            "park_attraction_status{{site=\"{site}\",attraction_id=\"{}\",status=\"{}\"}} {}",
            s.attraction_id,
            s.status,
            s.status.code()
        );
    }

    let _ = writeln!(output, "# HELP park_attraction_incident Open incident (1) or not (0)");
    let _ = writeln!(output, "# TYPE park_attraction_incident gauge");
    for s in statuses {
        let open = u64::from(s.status == CapacityStatus::ClosedIncident);
        let _ = writeln!(
            output,
            "park_attraction_incident{{site=\"{site}\",attraction_id=\"{}\"}} {open}",
            s.attraction_id
        );
    }
}

/// Handle HTTP requests
async fn handle_request(
    req: Request<hyper::body::Incoming>,
    park: Arc<Park>,
    site_id: Arc<String>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let response = match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => {
            let body = format_prometheus_metrics(&park, &site_id);
            Response::builder()
                .status(StatusCode::OK)
                .header("Content-Type", "text/plain; version=0.0.4; charset=utf-8")
                .body(Full::new(Bytes::from(body)))
        }
        (&Method::GET, "/health") => {
            Response::builder().status(StatusCode::OK).body(Full::new(Bytes::from("ok")))
        }
        _ => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Full::new(Bytes::from("Not Found"))),
    };

    // Builder only fails on invalid header values, which are all static here
    Ok(response.unwrap_or_else(|_| Response::new(Full::new(Bytes::new()))))
}

/// Start the Prometheus metrics HTTP server
pub async fn start_metrics_server(
    port: u16,
    park: Arc<Park>,
    site_id: String,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    let site_id = Arc::new(site_id);

    info!(port = %port, site = %site_id, "prometheus_metrics_server_started");

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, _addr)) => {
                        let io = TokioIo::new(stream);
                        let park = park.clone();
                        let site_id = site_id.clone();

                        tokio::spawn(async move {
                            let service = service_fn(move |req| {
                                let park = park.clone();
                                let site_id = site_id.clone();
                                async move { handle_request(req, park, site_id).await }
                            });

                            if let Err(e) = http1::Builder::new()
                                .serve_connection(io, service)
                                .await
                            {
                                error!(error = %e, "prometheus_http_error");
                            }
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "prometheus_accept_error");
                    }
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("prometheus_metrics_server_shutdown");
                    return Ok(());
                }
            }
        }
    }
}
