//! OS process collector backed by `/proc`.
//!
//! Exported families (prefixed with `<namespace>_`):
//! - `process_cpu_seconds_total` (counter)
//! - `process_resident_memory_bytes`, `process_virtual_memory_bytes`
//! - `process_open_fds`, `process_max_fds`
//! - `process_start_time_seconds`, `process_threads`
//!
//! Read failures (including non-Linux hosts) either fail the collect or are
//! logged and skipped, depending on `report_errors`.

use std::fs;
use std::io;
use std::sync::Arc;

use reqmetrics_core::error::{MetricsError, Result};
use reqmetrics_core::labels::fq_name;
use reqmetrics_core::{Collector, MetricFamily, MetricKind};

/// Resolves the process id to report on.
pub type PidFn = Arc<dyn Fn() -> io::Result<u32> + Send + Sync>;

// Fallback when sysconf cannot answer; USER_HZ on mainstream Linux builds.
const DEFAULT_CLOCK_TICKS: f64 = 100.0;

const FAMILIES: [&str; 7] = [
    "process_cpu_seconds_total",
    "process_resident_memory_bytes",
    "process_virtual_memory_bytes",
    "process_open_fds",
    "process_max_fds",
    "process_start_time_seconds",
    "process_threads",
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessStats {
    pub cpu_seconds: f64,
    pub resident_bytes: f64,
    pub virtual_bytes: f64,
    pub open_fds: f64,
    pub max_fds: Option<f64>,
    pub start_time_seconds: f64,
    pub threads: f64,
}

pub struct ProcessCollector {
    namespace: String,
    pid_fn: Option<PidFn>,
    report_errors: bool,
}

impl ProcessCollector {
    pub fn new(namespace: impl Into<String>, pid_fn: Option<PidFn>, report_errors: bool) -> Self {
        Self {
            namespace: namespace.into(),
            pid_fn,
            report_errors,
        }
    }

    fn name(&self, suffix: &str) -> String {
        fq_name(&self.namespace, "", suffix)
    }

    fn proc_dir(&self) -> io::Result<String> {
        match &self.pid_fn {
            Some(f) => Ok(format!("/proc/{}", f()?)),
            None => Ok("/proc/self".to_string()),
        }
    }

    fn families(&self, s: &ProcessStats) -> Vec<MetricFamily> {
        let mut out = vec![
            MetricFamily::single(
                self.name("process_cpu_seconds_total"),
                "Total user and system CPU time spent in seconds.",
                MetricKind::Counter,
                s.cpu_seconds,
            ),
            MetricFamily::single(
                self.name("process_resident_memory_bytes"),
                "Resident memory size in bytes.",
                MetricKind::Gauge,
                s.resident_bytes,
            ),
            MetricFamily::single(
                self.name("process_virtual_memory_bytes"),
                "Virtual memory size in bytes.",
                MetricKind::Gauge,
                s.virtual_bytes,
            ),
            MetricFamily::single(
                self.name("process_open_fds"),
                "Number of open file descriptors.",
                MetricKind::Gauge,
                s.open_fds,
            ),
            MetricFamily::single(
                self.name("process_start_time_seconds"),
                "Start time of the process since unix epoch in seconds.",
                MetricKind::Gauge,
                s.start_time_seconds,
            ),
            MetricFamily::single(
                self.name("process_threads"),
                "Number of OS threads in the process.",
                MetricKind::Gauge,
                s.threads,
            ),
        ];
        if let Some(max) = s.max_fds {
            out.push(MetricFamily::single(
                self.name("process_max_fds"),
                "Maximum number of open file descriptors.",
                MetricKind::Gauge,
                max,
            ));
        }
        out
    }
}

impl Collector for ProcessCollector {
    fn describe(&self) -> Vec<String> {
        FAMILIES.iter().map(|f| self.name(f)).collect()
    }

    fn collect(&self) -> Result<Vec<MetricFamily>> {
        match self.proc_dir().and_then(|dir| read_stats(&dir)) {
            Ok(stats) => Ok(self.families(&stats)),
            Err(e) if self.report_errors => Err(MetricsError::Collect(format!("process stats: {e}"))),
            Err(e) => {
                tracing::debug!(error = %e, "process stats unavailable, skipping");
                Ok(Vec::new())
            }
        }
    }
}

fn invalid(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.to_string())
}

/// Read everything for one `/proc/<pid>` directory.
pub fn read_stats(dir: &str) -> io::Result<ProcessStats> {
    let stat = fs::read_to_string(format!("{dir}/stat"))?;
    let status = fs::read_to_string(format!("{dir}/status"))?;
    let boot = fs::read_to_string("/proc/stat")?;

    let fields = parse_stat(&stat)?;
    let btime = parse_btime(&boot).ok_or_else(|| invalid("btime missing from /proc/stat"))?;

    let ticks = clock_ticks_per_sec();

    let open_fds = fs::read_dir(format!("{dir}/fd"))?.count() as f64;
    let max_fds = fs::read_to_string(format!("{dir}/limits"))
        .ok()
        .and_then(|l| parse_max_open_files(&l));

    Ok(ProcessStats {
        cpu_seconds: (fields.utime + fields.stime) / ticks,
        resident_bytes: status_kb(&status, "VmRSS:").unwrap_or(0.0) * 1024.0,
        virtual_bytes: fields.vsize,
        open_fds,
        max_fds,
        start_time_seconds: btime + fields.starttime / ticks,
        threads: fields.num_threads,
    })
}

/// `sysconf(_SC_CLK_TCK)`, the unit of the `/proc/<pid>/stat` time fields.
#[cfg(target_os = "linux")]
fn clock_ticks_per_sec() -> f64 {
    // SAFETY: sysconf only reads a configuration value.
    let ticks = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    if ticks > 0 {
        ticks as f64
    } else {
        DEFAULT_CLOCK_TICKS
    }
}

#[cfg(not(target_os = "linux"))]
fn clock_ticks_per_sec() -> f64 {
    DEFAULT_CLOCK_TICKS
}

#[derive(Debug, PartialEq)]
struct StatFields {
    utime: f64,
    stime: f64,
    num_threads: f64,
    starttime: f64,
    vsize: f64,
}

/// Parse `/proc/<pid>/stat`. `comm` may contain spaces and parens, so fields
/// are counted from the last `)`.
fn parse_stat(s: &str) -> io::Result<StatFields> {
    let close = s.rfind(')').ok_or_else(|| invalid("malformed stat"))?;
    // after ")" the first field is `state` (field 3 overall)
    let rest: Vec<&str> = s[close + 1..].split_whitespace().collect();
    let field = |n: usize| -> io::Result<f64> {
        rest.get(n - 3)
            .and_then(|v| v.parse::<f64>().ok())
            .ok_or_else(|| invalid("stat field missing"))
    };
    Ok(StatFields {
        utime: field(14)?,
        stime: field(15)?,
        num_threads: field(20)?,
        starttime: field(22)?,
        vsize: field(23)?,
    })
}

fn parse_btime(s: &str) -> Option<f64> {
    s.lines()
        .find_map(|l| l.strip_prefix("btime"))
        .and_then(|v| v.trim().parse().ok())
}

fn status_kb(s: &str, key: &str) -> Option<f64> {
    s.lines()
        .find_map(|l| l.strip_prefix(key))
        .and_then(|v| v.split_whitespace().next())
        .and_then(|v| v.parse().ok())
}

fn parse_max_open_files(s: &str) -> Option<f64> {
    let line = s.lines().find(|l| l.starts_with("Max open files"))?;
    let soft = line.trim_start_matches("Max open files").split_whitespace().next()?;
    if soft == "unlimited" {
        return Some(f64::INFINITY);
    }
    soft.parse().ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const STAT: &str = "4242 (my (odd) proc) S 1 4242 4242 0 -1 4194560 1234 0 0 0 250 50 0 0 20 0 9 0 123400 104857600 2560 18446744073709551615 1 1 0 0 0 0 0 0 0 0 0 0 17 3 0 0 0 0 0";

    #[test]
    fn stat_fields_survive_parens_in_comm() {
        let f = parse_stat(STAT).unwrap();
        assert_eq!(
            f,
            StatFields {
                utime: 250.0,
                stime: 50.0,
                num_threads: 9.0,
                starttime: 123400.0,
                vsize: 104857600.0,
            }
        );
    }

    #[test]
    fn truncated_stat_is_an_error() {
        assert!(parse_stat("1 (x) S 1 2").is_err());
        assert!(parse_stat("garbage").is_err());
    }

    #[test]
    fn helper_parsers() {
        assert_eq!(parse_btime("cpu 1 2 3\nbtime 1700000000\nprocesses 5\n"), Some(1_700_000_000.0));
        assert_eq!(status_kb("Name:\tx\nVmRSS:\t  2048 kB\n", "VmRSS:"), Some(2048.0));
        let limits = "Limit                     Soft Limit           Hard Limit           Units\nMax open files            1024                 524288               files\n";
        assert_eq!(parse_max_open_files(limits), Some(1024.0));
    }

    #[test]
    fn unreadable_pid_is_skipped_or_reported() {
        let missing: PidFn = Arc::new(|| Ok(u32::MAX));
        let quiet = ProcessCollector::new("gfast", Some(missing.clone()), false);
        assert!(quiet.collect().unwrap().is_empty());

        let loud = ProcessCollector::new("gfast", Some(missing), true);
        assert!(matches!(loud.collect(), Err(MetricsError::Collect(_))));
    }

    #[test]
    fn pid_resolver_errors_follow_report_flag() {
        let failing: PidFn = Arc::new(|| Err(io::Error::new(io::ErrorKind::NotFound, "no pid")));
        let loud = ProcessCollector::new("gfast", Some(failing), true);
        assert!(loud.collect().is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn clock_ticks_come_from_the_os() {
        let expected = unsafe { libc::sysconf(libc::_SC_CLK_TCK) } as f64;
        assert!(expected > 0.0);
        assert_eq!(clock_ticks_per_sec(), expected);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn reads_own_process() {
        let c = ProcessCollector::new("gfast", None, true);
        let fams = c.collect().unwrap();
        let names: Vec<&str> = fams.iter().map(|f| f.name.as_str()).collect();
        assert!(names.contains(&"gfast_process_cpu_seconds_total"));
        assert!(names.contains(&"gfast_process_open_fds"));
        for n in &names {
            assert!(c.describe().iter().any(|d| d == n));
        }
    }
}
