//! Label-keyed gauges with whole-set replacement

use crate::error::{ObservabilityError, Result};
use parking_lot::RwLock;
use prometheus::core::Collector;
use prometheus::GaugeVec;
use std::sync::Arc;

/// Handle to a registered gauge family.
///
/// Cloning is cheap; all clones address the same family and share the
/// registry's publish lock.
#[derive(Clone)]
pub struct GaugeHandle {
    gauge: GaugeVec,
    label_names: Arc<[String]>,
    publish_lock: Arc<RwLock<()>>,
}

impl std::fmt::Debug for GaugeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GaugeHandle")
            .field("label_names", &self.label_names)
            .finish()
    }
}

impl GaugeHandle {
    pub(crate) fn new(
        gauge: GaugeVec,
        label_names: &[&str],
        publish_lock: Arc<RwLock<()>>,
    ) -> Self {
        Self {
            gauge,
            label_names: label_names.iter().map(|s| s.to_string()).collect(),
            publish_lock,
        }
    }

    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }

    /// Drop every label combination.
    ///
    /// Not synchronized with scrapes on its own; use [`GaugeHandle::replace_with`]
    /// when the reset is followed by a rebuild.
    pub fn reset(&self) {
        self.gauge.reset();
    }

    /// Set the value of one label combination.
    pub fn set(&self, label_values: &[&str], value: f64) -> Result<()> {
        set_value(&self.gauge, &self.label_names, label_values, value)
    }

    /// Replace the whole family: reset, then let `rebuild` set the new series.
    ///
    /// The registry's publish lock is held exclusively for the duration, so a
    /// concurrent gather sees either the old or the new label set.
    pub fn replace_with<R>(&self, rebuild: impl FnOnce(&GaugeWriter<'_>) -> R) -> R {
        let _guard = self.publish_lock.write();
        self.gauge.reset();
        rebuild(&GaugeWriter { handle: self })
    }

    /// Current value of one label combination, if it exists.
    pub fn get(&self, label_values: &[&str]) -> Option<f64> {
        let families = {
            let _guard = self.publish_lock.read();
            self.gauge.collect()
        };

        families
            .iter()
            .flat_map(|family| family.get_metric())
            .find(|metric| {
                let pairs = metric.get_label();
                pairs.len() == label_values.len()
                    && self.label_names.iter().zip(label_values).all(|(name, value)| {
                        pairs
                            .iter()
                            .any(|p| p.get_name() == name && p.get_value() == *value)
                    })
            })
            .map(|metric| metric.get_gauge().get_value())
    }

    /// Number of label combinations currently set.
    pub fn series_count(&self) -> usize {
        let families = {
            let _guard = self.publish_lock.read();
            self.gauge.collect()
        };
        families.iter().map(|family| family.get_metric().len()).sum()
    }
}

/// Write access to a gauge family while its publish lock is held.
pub struct GaugeWriter<'a> {
    handle: &'a GaugeHandle,
}

impl GaugeWriter<'_> {
    pub fn set(&self, label_values: &[&str], value: f64) -> Result<()> {
        set_value(
            &self.handle.gauge,
            &self.handle.label_names,
            label_values,
            value,
        )
    }
}

fn set_value(gauge: &GaugeVec, names: &[String], values: &[&str], value: f64) -> Result<()> {
    if names.len() != values.len() {
        return Err(ObservabilityError::Metrics(format!(
            "expected {} label values, got {}",
            names.len(),
            values.len()
        )));
    }
    gauge.get_metric_with_label_values(values)?.set(value);
    Ok(())
}
