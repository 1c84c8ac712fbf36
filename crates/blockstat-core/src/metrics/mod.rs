//! Const metrics on top of the `prometheus` client data model.
//!
//! A [`ConstDesc`] is built once when a collector is constructed and then only
//! read. Every scrape turns raw kernel values into `proto::Metric`s through
//! [`ConstDesc::metric`], which applies the unit-conversion factor and attaches
//! both the variable labels and the constant labels of the labeling context.
//! Metrics are grouped into families by a [`MetricSink`] such as [`Families`].

pub mod export;

use std::collections::HashMap;

use prometheus::Opts;
use prometheus::core::{Desc, Describer};
use prometheus::proto::{self, LabelPair, MetricFamily, MetricType};

pub use export::{Sample, encode_text, samples};

/// Constant labels attached to every metric of a collector.
pub type Labels = HashMap<String, String>;

/// Descriptor of a metric whose value is computed at scrape time.
#[derive(Debug, Clone)]
pub struct ConstDesc {
    desc: Desc,
    metric_type: MetricType,
    factor: f64,
}

impl ConstDesc {
    /// Validates `opts` and creates a descriptor with a factor of 1.
    pub fn new(opts: Opts, metric_type: MetricType) -> prometheus::Result<Self> {
        Ok(Self {
            desc: opts.describe()?,
            metric_type,
            factor: 1.0,
        })
    }

    /// Sets the factor every raw value is multiplied by.
    pub fn with_factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    pub fn desc(&self) -> &Desc {
        &self.desc
    }

    pub fn fq_name(&self) -> &str {
        &self.desc.fq_name
    }

    pub fn metric_type(&self) -> MetricType {
        self.metric_type
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Builds a metric from a raw value.
    ///
    /// `label_values` are matched positionally against the descriptor's
    /// variable labels. Label pairs are sorted by name.
    pub fn metric(&self, raw: f64, label_values: &[&str]) -> proto::Metric {
        debug_assert_eq!(
            self.desc.variable_labels.len(),
            label_values.len(),
            "label cardinality mismatch for {}",
            self.desc.fq_name
        );

        let mut labels = self.desc.const_label_pairs.clone();
        for (name, value) in self.desc.variable_labels.iter().zip(label_values) {
            let mut pair = LabelPair::default();
            pair.set_name(name.clone());
            pair.set_value((*value).to_string());
            labels.push(pair);
        }
        labels.sort_by(|a, b| a.get_name().cmp(b.get_name()));

        let value = raw * self.factor;
        let mut metric = proto::Metric::default();
        metric.set_label(labels.into());
        match self.metric_type {
            MetricType::GAUGE => {
                let mut gauge = proto::Gauge::default();
                gauge.set_value(value);
                metric.set_gauge(gauge);
            }
            _ => {
                let mut counter = proto::Counter::default();
                counter.set_value(value);
                metric.set_counter(counter);
            }
        }
        metric
    }
}

/// Destination for metrics produced by a collector.
pub trait MetricSink {
    fn emit(&mut self, desc: &ConstDesc, metric: proto::Metric);
}

/// Metric families in first-seen order.
#[derive(Debug, Default)]
pub struct Families {
    families: Vec<MetricFamily>,
}

impl Families {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of metrics across all families.
    pub fn metric_count(&self) -> usize {
        self.families.iter().map(|mf| mf.get_metric().len()).sum()
    }

    pub fn as_slice(&self) -> &[MetricFamily] {
        &self.families
    }

    pub fn into_inner(self) -> Vec<MetricFamily> {
        self.families
    }
}

impl MetricSink for Families {
    fn emit(&mut self, desc: &ConstDesc, metric: proto::Metric) {
        let index = match self
            .families
            .iter()
            .position(|mf| mf.get_name() == desc.fq_name())
        {
            Some(index) => index,
            None => {
                let mut family = MetricFamily::default();
                family.set_name(desc.fq_name().to_string());
                family.set_help(desc.desc().help.clone());
                family.set_field_type(desc.metric_type());
                self.families.push(family);
                self.families.len() - 1
            }
        };
        self.families[index].mut_metric().push(metric);
    }
}
