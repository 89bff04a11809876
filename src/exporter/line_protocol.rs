//! InfluxDB line protocol encoding
//!
//! One line per registry entry:
//! - counters: `<env>.<name> value=<n>i <ts>`
//! - decimals: `<env>.<name> value=<x> <ts>`
//! - gauges:   `<env>.<name> value=..,min=..,max=..,mean=..,count=<n>i <ts>`
//!
//! Timestamps are epoch milliseconds (`precision=ms`).

use std::fmt::Write;

use tracing::warn;

use crate::registry::MetricValue;

use super::ExportBatch;

/// Measurement name with the environment label prepended
pub fn measurement(environment: &str, name: &str) -> String {
    if environment.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", environment, name)
    }
}

/// Escape a measurement name (commas and spaces)
pub fn escape_measurement(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c == ',' || c == ' ' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn push_float(out: &mut String, key: &str, v: f64) {
    if v.is_finite() {
        if !out.is_empty() {
            out.push(',');
        }
        let _ = write!(out, "{}={}", key, v);
    }
}

/// Field set of one entry. Non-finite floats are not representable and dropped.
fn fields(value: &MetricValue) -> String {
    let mut out = String::new();

    match value {
        MetricValue::Integer(v) => {
            let _ = write!(out, "value={}i", v);
        }
        MetricValue::Decimal(v) => push_float(&mut out, "value", *v),
        MetricValue::Gauge(g) => {
            push_float(&mut out, "value", g.value);
            push_float(&mut out, "min", g.min);
            push_float(&mut out, "max", g.max);
            push_float(&mut out, "mean", g.mean);
            if !out.is_empty() {
                out.push(',');
            }
            let _ = write!(out, "count={}i", g.count);
        }
    }
    out
}

/// Encode a batch. Returns the body and the number of lines written.
pub fn encode(batch: &ExportBatch) -> (String, usize) {
    let ts = batch.timestamp.timestamp_millis();
    let mut body = String::new();
    let mut lines = 0;

    for (name, value) in &batch.entries {
        let field_set = fields(value);
        if field_set.is_empty() {
            warn!("LineProtocol: {} has no finite fields, skipping", name);
            continue;
        }
        let _ = writeln!(
            body,
            "{} {} {}",
            escape_measurement(&measurement(&batch.environment, name)),
            field_set,
            ts
        );
        lines += 1;
    }

    (body, lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::GaugeSummary;
    use chrono::{TimeZone, Utc};

    fn batch(entries: Vec<(String, MetricValue)>) -> ExportBatch {
        ExportBatch {
            environment: "prod".to_string(),
            timestamp: Utc.timestamp_millis_opt(1_700_000_000_123).unwrap(),
            entries,
        }
    }

    #[test]
    fn test_encode_counter_and_gauge() {
        let (body, lines) = encode(&batch(vec![
            ("counter.batch.job.1.itemsRead".to_string(), MetricValue::Integer(42)),
            (
                "gauge.batch.job.1.throughput".to_string(),
                MetricValue::Gauge(GaugeSummary::single(3.5)),
            ),
        ]));

        assert_eq!(lines, 2);
        let mut it = body.lines();
        assert_eq!(
            it.next().unwrap(),
            "prod.counter.batch.job.1.itemsRead value=42i 1700000000123"
        );
        assert_eq!(
            it.next().unwrap(),
            "prod.gauge.batch.job.1.throughput value=3.5,min=3.5,max=3.5,mean=3.5,count=1i 1700000000123"
        );
    }

    #[test]
    fn test_escape_measurement() {
        assert_eq!(escape_measurement("a b,c"), "a\\ b\\,c");
    }

    #[test]
    fn test_empty_environment_keeps_name() {
        assert_eq!(measurement("", "x.y"), "x.y");
        assert_eq!(measurement("dev", "x.y"), "dev.x.y");
    }

    #[test]
    fn test_non_finite_decimal_is_skipped() {
        let (body, lines) = encode(&batch(vec![
            ("bad".to_string(), MetricValue::Decimal(f64::NAN)),
            ("good".to_string(), MetricValue::Decimal(1.5)),
        ]));
        assert_eq!(lines, 1);
        assert_eq!(body, "prod.good value=1.5 1700000000123\n");
    }
}
