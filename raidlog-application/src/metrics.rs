use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    ingest_requests: AtomicU64,
    ingest_signals: AtomicU64,
    ingest_errors: AtomicU64,
    events_recorded: AtomicU64,
    events_removed: AtomicU64,
    deliveries_enqueued: AtomicU64,
    invariant_violations: AtomicU64,
}

impl Metrics {
    pub fn record_ingest(&self, signal_count: usize) {
        self.ingest_requests.fetch_add(1, Ordering::Relaxed);
        self.ingest_signals
            .fetch_add(signal_count as u64, Ordering::Relaxed);
    }

    pub fn record_ingest_error(&self) {
        self.ingest_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_events(&self, count: usize) {
        self.events_recorded.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_removed(&self, count: usize) {
        self.events_removed.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_delivery_enqueued(&self) {
        self.deliveries_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invariant_violation(&self) {
        self.invariant_violations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn render_prometheus(&self, log_size: usize, in_flight: usize, pending: usize) -> String {
        let requests = self.ingest_requests.load(Ordering::Relaxed);
        let signals = self.ingest_signals.load(Ordering::Relaxed);
        let errors = self.ingest_errors.load(Ordering::Relaxed);
        let recorded = self.events_recorded.load(Ordering::Relaxed);
        let removed = self.events_removed.load(Ordering::Relaxed);
        let enqueued = self.deliveries_enqueued.load(Ordering::Relaxed);
        let violations = self.invariant_violations.load(Ordering::Relaxed);

        format!(
            "# TYPE raidlog_ingest_requests_total counter\n\
raidlog_ingest_requests_total {}\n\
# TYPE raidlog_ingest_signals_total counter\n\
raidlog_ingest_signals_total {}\n\
# TYPE raidlog_ingest_errors_total counter\n\
raidlog_ingest_errors_total {}\n\
# TYPE raidlog_events_recorded_total counter\n\
raidlog_events_recorded_total {}\n\
# TYPE raidlog_events_removed_total counter\n\
raidlog_events_removed_total {}\n\
# TYPE raidlog_deliveries_enqueued_total counter\n\
raidlog_deliveries_enqueued_total {}\n\
# TYPE raidlog_invariant_violations_total counter\n\
raidlog_invariant_violations_total {}\n\
# TYPE raidlog_event_log_size gauge\n\
raidlog_event_log_size {}\n\
# TYPE raidlog_explosives_in_flight gauge\n\
raidlog_explosives_in_flight {}\n\
# TYPE raidlog_deliveries_pending gauge\n\
raidlog_deliveries_pending {}\n",
            requests,
            signals,
            errors,
            recorded,
            removed,
            enqueued,
            violations,
            log_size,
            in_flight,
            pending
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prometheus_output_carries_counters_and_gauges() {
        let metrics = Metrics::default();
        metrics.record_ingest(3);
        metrics.record_events(2);
        let rendered = metrics.render_prometheus(10, 1, 0);
        assert!(rendered.contains("raidlog_ingest_signals_total 3\n"));
        assert!(rendered.contains("raidlog_events_recorded_total 2\n"));
        assert!(rendered.contains("raidlog_event_log_size 10\n"));
    }
}
