//! Output encodings of gathered metric families.

use std::collections::BTreeMap;

use prometheus::proto::{MetricFamily, MetricType};
use prometheus::{Encoder, TextEncoder};
use serde::{Serialize, Serializer};

/// Encodes families in the Prometheus text exposition format.
pub fn encode_text(families: &[MetricFamily]) -> prometheus::Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// Flat view of one metric, used for JSON output and assertions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub name: String,
    #[serde(rename = "type", serialize_with = "serialize_metric_type")]
    pub metric_type: MetricType,
    pub labels: BTreeMap<String, String>,
    pub value: f64,
}

impl Sample {
    /// Returns the value of a label, if present.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }
}

fn serialize_metric_type<S: Serializer>(metric_type: &MetricType, s: S) -> Result<S::Ok, S::Error> {
    let name = match metric_type {
        MetricType::COUNTER => "counter",
        MetricType::GAUGE => "gauge",
        MetricType::SUMMARY => "summary",
        MetricType::HISTOGRAM => "histogram",
        MetricType::UNTYPED => "untyped",
    };
    s.serialize_str(name)
}

/// Flattens counter and gauge families into samples, family by family.
pub fn samples(families: &[MetricFamily]) -> Vec<Sample> {
    families
        .iter()
        .flat_map(|mf| {
            let metric_type = mf.get_field_type();
            mf.get_metric().iter().map(move |m| Sample {
                name: mf.get_name().to_string(),
                metric_type,
                labels: m
                    .get_label()
                    .iter()
                    .map(|l| (l.get_name().to_string(), l.get_value().to_string()))
                    .collect(),
                value: match metric_type {
                    MetricType::GAUGE => m.get_gauge().get_value(),
                    MetricType::UNTYPED => m.get_untyped().get_value(),
                    _ => m.get_counter().get_value(),
                },
            })
        })
        .collect()
}
