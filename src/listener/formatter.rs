//! Report rendering for the job-completion log line.

use super::snapshot::{CounterEntry, GaugeEntry};

pub const REPORT_START: &str = "\n########## Metrics Start ##########\n";
pub const REPORT_END: &str = "########## Metrics End ############";

/// Renders harvested metrics as text.
///
/// Implementations must not fail on empty input. Any
/// `Fn(&[CounterEntry], &[GaugeEntry]) -> String` is a formatter.
pub trait OutputFormatter: Send + Sync {
    fn format(&self, counters: &[CounterEntry], gauges: &[GaugeEntry]) -> String;
}

impl<F> OutputFormatter for F
where
    F: Fn(&[CounterEntry], &[GaugeEntry]) -> String + Send + Sync,
{
    fn format(&self, counters: &[CounterEntry], gauges: &[GaugeEntry]) -> String {
        self(counters, gauges)
    }
}

/// Default formatter: banner, one line per gauge, one line per counter, end banner
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleOutputFormatter;

impl OutputFormatter for SimpleOutputFormatter {
    fn format(&self, counters: &[CounterEntry], gauges: &[GaugeEntry]) -> String {
        let mut out = String::from(REPORT_START);
        for gauge in gauges {
            out.push_str(&gauge.to_string());
            out.push('\n');
        }
        for counter in counters {
            out.push_str(&counter.to_string());
            out.push('\n');
        }
        out.push_str(REPORT_END);
        out
    }
}
