use crate::icmp::v4::DEFAULT_PAYLOAD_SIZE;
use crate::StopCondition;
use std::time::Duration;

pub const DEFAULT_PING_COUNT: u16 = 4;
pub const DEFAULT_PING_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_HOPS: u8 = 30;
pub const DEFAULT_PROBES_PER_HOP: u16 = 3;
pub const DEFAULT_TRACEROUTE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Clone, Debug)]
pub struct PingConfig {
    /// Number of echo requests to send.
    pub count: u16,
    /// How long to wait for each reply.
    pub timeout: Duration,
    pub payload_size: usize,
    /// Minimum spacing between consecutive probes.
    pub interval: Duration,
    pub stop: StopCondition,
}

impl Default for PingConfig {
    fn default() -> Self {
        PingConfig {
            count: DEFAULT_PING_COUNT,
            timeout: DEFAULT_PING_TIMEOUT,
            payload_size: DEFAULT_PAYLOAD_SIZE,
            interval: DEFAULT_PING_INTERVAL,
            stop: StopCondition::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct TracerouteConfig {
    pub max_hops: u8,
    /// Echo requests sent per TTL value.
    pub probes: u16,
    /// How long to wait for each probe's reply.
    pub timeout: Duration,
    pub payload_size: usize,
    pub stop: StopCondition,
}

impl Default for TracerouteConfig {
    fn default() -> Self {
        TracerouteConfig {
            max_hops: DEFAULT_MAX_HOPS,
            probes: DEFAULT_PROBES_PER_HOP,
            timeout: DEFAULT_TRACEROUTE_TIMEOUT,
            payload_size: DEFAULT_PAYLOAD_SIZE,
            stop: StopCondition::new(),
        }
    }
}
