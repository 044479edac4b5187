use std::collections::HashSet;

use crate::config::GateConfig;

pub const FORWARDED_FOR: &str = "x-forwarded-for";

/// Lets requests through only when one of the forwarded client IPs is on
/// the allowlist. An empty allowlist turns the gate off.
#[derive(Debug, Clone, Default)]
pub struct AccessGate {
    allowed: HashSet<String>,
}

impl AccessGate {
    pub fn new(config: &GateConfig) -> Self {
        Self {
            allowed: config.allowed_ips.iter().map(|ip| ip.trim().to_string()).collect(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.allowed.is_empty()
    }

    // Input: "client, proxy1, proxy2"
    pub fn permits(&self, forwarded_for: Option<&str>) -> bool {
        if self.is_open() {
            return true;
        }
        forwarded_for
            .unwrap_or_default()
            .split(',')
            .map(|ip| ip.trim())
            .any(|ip| self.allowed.contains(ip))
    }
}
