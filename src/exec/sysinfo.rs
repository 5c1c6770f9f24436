// src/exec/sysinfo.rs

//! Static host information recorded at the top of every log.
//!
//! Read from `/proc/cpuinfo` and `/proc/meminfo`; on hosts without them the
//! report says `unavailable` instead of failing the run.

use std::fmt::Write;
use std::path::Path;

use tracing::debug;

use crate::fs::FileSystem;
use crate::plan::CommandSpec;

pub const CPUINFO_PATH: &str = "/proc/cpuinfo";
pub const MEMINFO_PATH: &str = "/proc/meminfo";
pub const UPTIME_PREFIX: &str = "Uptime: ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuCore {
    pub model: String,
    /// Clock speed in MHz.
    pub speed_mhz: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostInfo {
    pub cpus: Vec<CpuCore>,
    /// Bytes.
    pub total_memory: Option<u64>,
    /// Bytes available to new allocations.
    pub free_memory: Option<u64>,
}

/// The external uptime query run after the static info.
pub fn uptime_command() -> CommandSpec {
    CommandSpec::new("uptime", Vec::<String>::new())
}

pub fn gather(fs: &dyn FileSystem) -> HostInfo {
    let read = |path: &str| match fs.read_to_string(Path::new(path)) {
        Ok(text) => Some(text),
        Err(e) => {
            debug!(path, error = %e, "host information not readable");
            None
        }
    };

    let cpus = read(CPUINFO_PATH)
        .map(|text| parse_cpuinfo(&text))
        .unwrap_or_default();
    let (total_memory, free_memory) = read(MEMINFO_PATH)
        .map(|text| parse_meminfo(&text))
        .unwrap_or_default();

    HostInfo {
        cpus,
        total_memory,
        free_memory,
    }
}

/// One entry per `processor` block of `/proc/cpuinfo`.
pub fn parse_cpuinfo(text: &str) -> Vec<CpuCore> {
    let mut cores = Vec::new();
    let mut current: Option<CpuCore> = None;

    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());

        match key {
            "processor" => {
                cores.extend(current.take());
                current = Some(CpuCore {
                    model: "unknown".to_string(),
                    speed_mhz: None,
                });
            }
            "model name" | "Processor" | "cpu model" => {
                if let Some(core) = current.as_mut() {
                    core.model = value.to_string();
                }
            }
            "cpu MHz" => {
                if let Some(core) = current.as_mut() {
                    core.speed_mhz = value.parse::<f64>().ok().map(|mhz| mhz.round() as u64);
                }
            }
            _ => {}
        }
    }

    cores.extend(current);
    cores
}

/// `(total, available)` in bytes from `/proc/meminfo`.
///
/// Available memory prefers `MemAvailable` and falls back to `MemFree`.
pub fn parse_meminfo(text: &str) -> (Option<u64>, Option<u64>) {
    let field = |name: &str| {
        text.lines().find_map(|line| {
            let rest = line.strip_prefix(name)?.strip_prefix(':')?;
            let kib = rest.trim().trim_end_matches("kB").trim().parse::<u64>().ok()?;
            Some(kib * 1024)
        })
    };

    let total = field("MemTotal");
    let free = field("MemAvailable").or_else(|| field("MemFree"));
    (total, free)
}

impl HostInfo {
    /// The `CPU:` / `Memory:` block written to the log.
    pub fn report(&self) -> String {
        let mut out = String::from("CPU:\n");
        if self.cpus.is_empty() {
            out.push_str("    unavailable\n");
        }
        for (i, core) in self.cpus.iter().enumerate() {
            let speed = core
                .speed_mhz
                .map_or_else(|| "unknown".to_string(), |mhz| mhz.to_string());
            let _ = writeln!(out, "    Core {} Model: {}", i + 1, core.model);
            let _ = writeln!(out, "    Core {} Speed: {}", i + 1, speed);
        }

        out.push_str("Memory:\n");
        let _ = writeln!(out, "    Total: {}", bytes_or_unavailable(self.total_memory));
        let _ = writeln!(out, "    Free: {}", bytes_or_unavailable(self.free_memory));
        out
    }
}

fn bytes_or_unavailable(bytes: Option<u64>) -> String {
    bytes.map_or_else(|| "unavailable".to_string(), |b| b.to_string())
}
