//! Bridges the `metrics` facade macros (`counter!`, `gauge!`, `histogram!`)
//! onto an EMF [`Metrics`] buffer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use metrics::{
    Counter, CounterFn, Gauge, GaugeFn, Histogram, HistogramFn, Key, KeyName, Metadata, Recorder,
    SharedString, Unit,
};
use powertools_errors::{PowertoolsError, PowertoolsResult};
use tracing::warn;

use crate::metrics::Metrics;
use crate::unit::MetricUnit;

/// A [`Recorder`] that stores every observation in a [`Metrics`] buffer.
///
/// Counters default to `Count`; gauges and histograms default to `None`
/// unless a unit was described. Keys with labels are emitted immediately as
/// single metrics with the labels as dimensions. Handles are registered once
/// per key, so a gauge keeps its value across `gauge!` calls.
#[derive(Clone)]
pub struct EmfRecorder {
    metrics: Metrics,
    units: Arc<Mutex<HashMap<String, MetricUnit>>>,
    handles: Arc<Mutex<HashMap<Key, Arc<EmfHandle>>>>,
}

impl EmfRecorder {
    pub fn new(metrics: Metrics) -> Self {
        Self {
            metrics,
            units: Arc::new(Mutex::new(HashMap::new())),
            handles: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Installs this recorder as the process-wide `metrics` recorder.
    pub fn install(self) -> PowertoolsResult<()> {
        metrics::set_global_recorder(self)
            .map_err(|e| PowertoolsError::config_error(format!("failed to install EMF recorder: {e}")))
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Number of distinct keys registered so far.
    pub fn registered_keys(&self) -> usize {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn describe(&self, key: KeyName, unit: Option<Unit>) {
        if let Some(unit) = unit {
            self.units
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(key.as_str().to_string(), MetricUnit::from(unit));
        }
    }

    fn handle(&self, key: &Key, fallback: MetricUnit) -> Arc<EmfHandle> {
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.clone())
            .or_insert_with(|| {
                Arc::new(EmfHandle {
                    metrics: self.metrics.clone(),
                    units: self.units.clone(),
                    name: key.name().to_string(),
                    labels: key
                        .labels()
                        .map(|label| (label.key().to_string(), label.value().to_string()))
                        .collect(),
                    fallback,
                    gauge: AtomicU64::new(0f64.to_bits()),
                })
            })
            .clone()
    }
}

impl Recorder for EmfRecorder {
    fn describe_counter(&self, key: KeyName, unit: Option<Unit>, _description: SharedString) {
        self.describe(key, unit);
    }

    fn describe_gauge(&self, key: KeyName, unit: Option<Unit>, _description: SharedString) {
        self.describe(key, unit);
    }

    fn describe_histogram(&self, key: KeyName, unit: Option<Unit>, _description: SharedString) {
        self.describe(key, unit);
    }

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        Counter::from_arc(self.handle(key, MetricUnit::Count))
    }

    fn register_gauge(&self, key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        Gauge::from_arc(self.handle(key, MetricUnit::NoUnit))
    }

    fn register_histogram(&self, key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        Histogram::from_arc(self.handle(key, MetricUnit::NoUnit))
    }
}

struct EmfHandle {
    metrics: Metrics,
    units: Arc<Mutex<HashMap<String, MetricUnit>>>,
    name: String,
    labels: Vec<(String, String)>,
    fallback: MetricUnit,
    gauge: AtomicU64,
}

impl EmfHandle {
    fn unit(&self) -> MetricUnit {
        self.units
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&self.name)
            .copied()
            .unwrap_or(self.fallback)
    }

    fn record_value(&self, value: f64) {
        let unit = self.unit();
        let result = if self.labels.is_empty() {
            self.metrics.add_metric(&self.name, unit, value)
        } else {
            let single = self.metrics.single_metric();
            single
                .add_dimensions(self.labels.iter().cloned())
                .and_then(|_| single.add_metric(&self.name, unit, value))
        };
        if let Err(e) = result {
            warn!(metric = %self.name, error = %e, "Dropped metric observation");
        }
    }

    fn update_gauge(&self, f: impl Fn(f64) -> f64) -> f64 {
        let mut current = self.gauge.load(Ordering::Acquire);
        loop {
            let next = f(f64::from_bits(current));
            match self.gauge.compare_exchange_weak(
                current,
                next.to_bits(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }
}

impl CounterFn for EmfHandle {
    fn increment(&self, value: u64) {
        self.record_value(value as f64);
    }

    fn absolute(&self, value: u64) {
        self.record_value(value as f64);
    }
}

impl GaugeFn for EmfHandle {
    fn increment(&self, value: f64) {
        let current = self.update_gauge(|v| v + value);
        self.record_value(current);
    }

    fn decrement(&self, value: f64) {
        let current = self.update_gauge(|v| v - value);
        self.record_value(current);
    }

    fn set(&self, value: f64) {
        self.update_gauge(|_| value);
        self.record_value(value);
    }
}

impl HistogramFn for EmfHandle {
    fn record(&self, value: f64) {
        self.record_value(value);
    }
}
