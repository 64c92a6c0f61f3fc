//! `server` namespace: host statistics.
//!
//! Values come from `/proc` where available. Fields the platform cannot
//! supply are reported as `null` rather than failing the call.

use std::fs;
use std::thread;

use serde::Serialize;
use serde_json::Value;

use crate::error::RpcError;
use crate::extensions::{Extension, Params};

pub(super) fn extension() -> Extension {
    Extension::builder("server")
        .version("1.0.0")
        .description("Reports host system information")
        .handler("system", system)
        .build()
}

#[derive(Debug, Serialize)]
struct SystemInfo {
    hostname: String,
    platform: &'static str,
    arch: &'static str,
    cpus: usize,
    memory: MemoryInfo,
    uptime: Option<f64>,
    loadavg: Option<[f64; 3]>,
}

#[derive(Debug, Default, Serialize)]
struct MemoryInfo {
    total: Option<u64>,
    free: Option<u64>,
    used: Option<u64>,
}

fn system(_params: &Params) -> Result<Value, RpcError> {
    let info = SystemInfo {
        hostname: hostname(),
        platform: std::env::consts::OS,
        arch: std::env::consts::ARCH,
        cpus: thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get),
        memory: read_proc("/proc/meminfo")
            .map(|text| parse_meminfo(&text))
            .unwrap_or_default(),
        uptime: read_proc("/proc/uptime").and_then(|text| parse_uptime(&text)),
        loadavg: read_proc("/proc/loadavg").and_then(|text| parse_loadavg(&text)),
    };
    serde_json::to_value(info).map_err(|error| RpcError::internal(error.to_string()))
}

fn read_proc(path: &str) -> Option<String> {
    fs::read_to_string(path).ok()
}

fn hostname() -> String {
    read_proc("/proc/sys/kernel/hostname")
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty())
        .or_else(|| std::env::var("HOSTNAME").ok())
        .unwrap_or_else(|| "localhost".to_owned())
}

/// Reads `MemTotal` and `MemAvailable` (falling back to `MemFree`), in bytes.
fn parse_meminfo(text: &str) -> MemoryInfo {
    let field = |key: &str| {
        text.lines().find_map(|line| {
            let rest = line.strip_prefix(key)?.strip_prefix(':')?;
            let kib = rest.trim().trim_end_matches("kB").trim().parse::<u64>().ok()?;
            kib.checked_mul(1024)
        })
    };
    let total = field("MemTotal");
    let free = field("MemAvailable").or_else(|| field("MemFree"));
    let used = total.zip(free).map(|(total, free)| total.saturating_sub(free));
    MemoryInfo { total, free, used }
}

fn parse_uptime(text: &str) -> Option<f64> {
    text.split_whitespace().next()?.parse().ok()
}

fn parse_loadavg(text: &str) -> Option<[f64; 3]> {
    let mut fields = text.split_whitespace().map(str::parse::<f64>);
    let one = fields.next()?.ok()?;
    let five = fields.next()?.ok()?;
    let fifteen = fields.next()?.ok()?;
    Some([one, five, fifteen])
}
