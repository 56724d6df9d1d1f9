use anyhow::Result;
use metrics::describe_counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;

pub const PAGES_ASSEMBLED: &str = "history_pages_assembled_total";
pub const IMITATIONS_FLAGGED: &str = "history_imitations_flagged_total";
pub const IMITATIONS_SUPPRESSED: &str = "history_imitations_suppressed_total";

pub fn describe() {
    describe_counter!(PAGES_ASSEMBLED, "Number of history pages assembled.");
    describe_counter!(
        IMITATIONS_FLAGGED,
        "Number of transfers flagged as address-poisoning imitations."
    );
    describe_counter!(
        IMITATIONS_SUPPRESSED,
        "Number of flagged transfers removed from history pages."
    );
    describe_counter!(
        common::observability::ERROR_EVENTS_METRIC,
        "Number of ERROR-level tracing events."
    );
}

pub fn install_prometheus(port: u16) -> Result<PrometheusHandle> {
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    Ok(PrometheusBuilder::new()
        .with_http_listener(addr)
        .install_recorder()?)
}
