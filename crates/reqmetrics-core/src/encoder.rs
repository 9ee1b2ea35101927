//! Text exposition format (version 0.0.4).

use std::fmt::Write;

use crate::family::{MetricFamily, MetricValue};
use crate::labels::LabelPair;

/// Content type served alongside `encode_text` output.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

fn format_float(v: f64) -> String {
    if v.is_nan() {
        "NaN".into()
    } else if v == f64::INFINITY {
        "+Inf".into()
    } else if v == f64::NEG_INFINITY {
        "-Inf".into()
    } else {
        v.to_string()
    }
}

fn label_str(labels: &[LabelPair], extra: Option<(&str, &str)>) -> String {
    let mut parts: Vec<String> = labels
        .iter()
        .map(|l| format!("{}=\"{}\"", l.name, escape_label(&l.value)))
        .collect();
    if let Some((k, v)) = extra {
        parts.push(format!("{}=\"{}\"", k, escape_label(v)));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!("{{{}}}", parts.join(","))
    }
}

pub fn encode_text(families: &[MetricFamily]) -> String {
    let mut out = String::new();
    for fam in families {
        if fam.metrics.is_empty() {
            continue;
        }
        let name = &fam.name;
        let _ = writeln!(out, "# HELP {} {}", name, escape_help(&fam.help));
        let _ = writeln!(out, "# TYPE {} {}", name, fam.kind.as_str());

        for m in &fam.metrics {
            match &m.value {
                MetricValue::Counter(v) | MetricValue::Gauge(v) => {
                    let _ = writeln!(out, "{}{} {}", name, label_str(&m.labels, None), format_float(*v));
                }
                MetricValue::Histogram(h) => {
                    for (le, count) in &h.buckets {
                        let le = format_float(*le);
                        let _ = writeln!(
                            out,
                            "{}_bucket{} {}",
                            name,
                            label_str(&m.labels, Some(("le", &le))),
                            count
                        );
                    }
                    let _ = writeln!(
                        out,
                        "{}_bucket{} {}",
                        name,
                        label_str(&m.labels, Some(("le", "+Inf"))),
                        h.count
                    );
                    let labels = label_str(&m.labels, None);
                    let _ = writeln!(out, "{}_sum{} {}", name, labels, format_float(h.sum));
                    let _ = writeln!(out, "{}_count{} {}", name, labels, h.count);
                }
            }
        }
    }
    out
}
