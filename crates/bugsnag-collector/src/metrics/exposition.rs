use std::fmt::{self, Write};

use crate::metrics::types::{CollectedMetric, MetricValue};

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Encodes metric families in the Prometheus text exposition format.
pub fn render_prometheus(families: &[CollectedMetric]) -> String {
    let mut output = String::new();
    // Writing into a String never fails.
    let _ = write_prometheus(&mut output, families);
    output
}

fn write_prometheus(out: &mut String, families: &[CollectedMetric]) -> fmt::Result {
    for family in families {
        let name = family.descriptor.name.as_str();
        writeln!(out, "# HELP {name} {}", Escaped::help(&family.descriptor.help))?;
        writeln!(
            out,
            "# TYPE {name} {}",
            family.descriptor.metric_type.as_prometheus_type()
        )?;

        for sample in &family.samples {
            let labels = Labels::new(&sample.labels);
            match &sample.value {
                MetricValue::Gauge(value) => {
                    writeln!(out, "{name}{labels} {}", SampleValue(*value))?;
                }
                MetricValue::Histogram {
                    buckets,
                    count,
                    sum,
                } => {
                    for &(bound, cumulative) in buckets {
                        writeln!(
                            out,
                            "{name}_bucket{} {cumulative}",
                            labels.with_le(bound)
                        )?;
                    }
                    writeln!(out, "{name}_sum{labels} {}", SampleValue(*sum))?;
                    writeln!(out, "{name}_count{labels} {count}")?;
                }
            }
        }
    }

    Ok(())
}

/// A sample value or bucket bound. Integral values drop the fraction.
struct SampleValue(f64);

impl fmt::Display for SampleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.0;
        if value.is_nan() {
            f.write_str("NaN")
        } else if value.is_infinite() {
            f.write_str(if value > 0.0 { "+Inf" } else { "-Inf" })
        } else if value.fract() == 0.0 {
            write!(f, "{value:.0}")
        } else {
            write!(f, "{value}")
        }
    }
}

#[derive(Clone, Copy)]
struct Labels<'a> {
    pairs: &'a [(String, String)],
    le: Option<f64>,
}

impl<'a> Labels<'a> {
    fn new(pairs: &'a [(String, String)]) -> Self {
        Self { pairs, le: None }
    }

    fn with_le(self, bound: f64) -> Self {
        Self {
            le: Some(bound),
            ..self
        }
    }
}

impl fmt::Display for Labels<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pairs.is_empty() && self.le.is_none() {
            return Ok(());
        }

        f.write_char('{')?;
        let mut separator = "";
        for (key, value) in self.pairs {
            write!(f, "{separator}{key}=\"{}\"", Escaped::label(value))?;
            separator = ",";
        }
        if let Some(bound) = self.le {
            write!(f, "{separator}le=\"{}\"", SampleValue(bound))?;
        }
        f.write_char('}')
    }
}

/// Escapes backslashes and newlines, plus double quotes inside label values.
struct Escaped<'a> {
    text: &'a str,
    quotes: bool,
}

impl<'a> Escaped<'a> {
    fn help(text: &'a str) -> Self {
        Self { text, quotes: false }
    }

    fn label(text: &'a str) -> Self {
        Self { text, quotes: true }
    }
}

impl fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ch in self.text.chars() {
            match ch {
                '\\' => f.write_str("\\\\")?,
                '\n' => f.write_str("\\n")?,
                '"' if self.quotes => f.write_str("\\\"")?,
                other => f.write_char(other)?,
            }
        }
        Ok(())
    }
}
