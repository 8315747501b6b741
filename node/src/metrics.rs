//! # Prometheus Metrics
//!
//! Exposes escrow activity metrics. Scraped by Prometheus at the `/metrics`
//! HTTP endpoint on the configured metrics port.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] so they
//! do not collide with any default global registry consumers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

use estate_contracts::{EscrowEventKind, InMemoryLedger, SaleStatus};

/// Holds all Prometheus metric handles for the node.
///
/// Clone-friendly (prometheus handles are `Arc`s internally) so it can be
/// shared across request handlers.
#[derive(Clone)]
pub struct EscrowMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Properties listed (including relistings).
    pub listings_total: IntCounter,
    /// Earnest deposits accepted.
    pub earnest_deposits_total: IntCounter,
    /// Sales settled.
    pub sales_finalized_total: IntCounter,
    /// Sales cancelled.
    pub sales_cancelled_total: IntCounter,
    /// Transactions the ledger rejected.
    pub rejected_calls_total: IntCounter,
    /// Value currently held in escrow.
    pub escrow_balance: IntGauge,
    /// Properties currently in the `Listed` status.
    pub active_listings: IntGauge,
    /// Histogram of RPC handling latency in seconds.
    pub rpc_latency_seconds: Histogram,
}

fn counter(registry: &Registry, name: &str, help: &str) -> IntCounter {
    let c = IntCounter::new(name, help).expect("metric creation");
    registry
        .register(Box::new(c.clone()))
        .expect("metric registration");
    c
}

fn gauge(registry: &Registry, name: &str, help: &str) -> IntGauge {
    let g = IntGauge::new(name, help).expect("metric creation");
    registry
        .register(Box::new(g.clone()))
        .expect("metric registration");
    g
}

impl EscrowMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("estate".into()), None)
            .expect("failed to create prometheus registry");

        let listings_total = counter(&registry, "listings_total", "Properties listed for sale");
        let earnest_deposits_total = counter(
            &registry,
            "earnest_deposits_total",
            "Earnest deposits accepted into escrow",
        );
        let sales_finalized_total =
            counter(&registry, "sales_finalized_total", "Sales settled to the buyer");
        let sales_cancelled_total =
            counter(&registry, "sales_cancelled_total", "Sales cancelled");
        let rejected_calls_total = counter(
            &registry,
            "rejected_calls_total",
            "Escrow transactions rejected by the ledger",
        );
        let escrow_balance = gauge(&registry, "escrow_balance", "Value currently held in escrow");
        let active_listings = gauge(
            &registry,
            "active_listings",
            "Properties listed and awaiting settlement",
        );

        let rpc_latency_seconds = Histogram::with_opts(
            HistogramOpts::new("rpc_latency_seconds", "JSON-RPC handling latency in seconds")
                .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        )
        .expect("metric creation");
        registry
            .register(Box::new(rpc_latency_seconds.clone()))
            .expect("metric registration");

        Self {
            registry,
            listings_total,
            earnest_deposits_total,
            sales_finalized_total,
            sales_cancelled_total,
            rejected_calls_total,
            escrow_balance,
            active_listings,
            rpc_latency_seconds,
        }
    }

    /// Bumps the counter matching an escrow event.
    pub fn record_event(&self, kind: &EscrowEventKind) {
        match kind {
            EscrowEventKind::Listed { .. } => self.listings_total.inc(),
            EscrowEventKind::EarnestDeposited { .. } => self.earnest_deposits_total.inc(),
            EscrowEventKind::SaleFinalized { .. } => self.sales_finalized_total.inc(),
            EscrowEventKind::SaleCancelled { .. } => self.sales_cancelled_total.inc(),
            EscrowEventKind::FundsReceived { .. }
            | EscrowEventKind::InspectionUpdated { .. }
            | EscrowEventKind::SaleApproved { .. } => {}
        }
    }

    /// Refreshes the gauges from the ledger.
    pub fn observe_ledger(&self, ledger: &InMemoryLedger) {
        self.escrow_balance
            .set(i64::try_from(ledger.balance()).unwrap_or(i64::MAX));
        let active = ledger
            .listings()
            .filter(|l| l.status == SaleStatus::Listed)
            .count();
        self.active_listings.set(active as i64);
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer).expect("prometheus output is valid utf-8"))
    }
}

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<EscrowMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
///
/// Returns HTTP 500 if encoding fails (should never happen in practice).
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
