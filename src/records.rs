use crate::icmp::v4::Ttl;
use crate::ProbeError;
use std::net::Ipv4Addr;
use std::time::Duration;

/// Which ICMP message answered a probe.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReplyKind {
    EchoReply,
    TimeExceeded,
}

/// What became of one probe.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProbeOutcome {
    Answered {
        round_trip_time: Duration,
        responder: Ipv4Addr,
        /// TTL of the reply as it arrived; only echo replies carry a meaningful one.
        ttl: Option<Ttl>,
        kind: ReplyKind,
    },
    TimedOut,
}

impl ProbeOutcome {
    #[must_use]
    pub fn is_echo_reply(&self) -> bool {
        matches!(self, ProbeOutcome::Answered { kind: ReplyKind::EchoReply, .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RttStats {
    pub min: Duration,
    pub avg: Duration,
    pub max: Duration,
}

impl RttStats {
    /// `None` for an empty sample.
    #[must_use]
    pub fn from_samples(samples: &[Duration]) -> Option<RttStats> {
        let min = samples.iter().min()?;
        let max = samples.iter().max()?;
        let n = u32::try_from(samples.len()).ok()?;
        let avg = samples.iter().sum::<Duration>() / n;
        Some(RttStats { min: *min, avg, max: *max })
    }
}

/// Result of one ping session. Built once the probing loop is over.
#[derive(Debug)]
pub struct PingSummary {
    pub host: String,
    pub addr: Option<Ipv4Addr>,
    pub is_reachable: bool,
    pub packets_sent: u16,
    pub packets_received: u16,
    /// Percentage, `0.0` when nothing was sent.
    pub packet_loss: f64,
    /// `None` when no reply arrived.
    pub rtt: Option<RttStats>,
    pub interrupted: bool,
    pub error: Option<ProbeError>,
}

impl PingSummary {
    pub(crate) fn failed(host: &str, addr: Option<Ipv4Addr>, error: ProbeError) -> PingSummary {
        PingSummary {
            host: host.to_owned(),
            addr,
            is_reachable: false,
            packets_sent: 0,
            packets_received: 0,
            packet_loss: 0.0,
            rtt: None,
            interrupted: false,
            error: Some(error),
        }
    }

    pub(crate) fn conclude(
        host: &str,
        addr: Ipv4Addr,
        packets_sent: u16,
        round_trip_times: &[Duration],
        interrupted: bool,
        error: Option<ProbeError>,
    ) -> PingSummary {
        let packets_received = u16::try_from(round_trip_times.len()).unwrap_or(u16::MAX).min(packets_sent);
        let packet_loss = if packets_sent == 0 {
            0.0
        } else {
            f64::from(packets_sent - packets_received) / f64::from(packets_sent) * 100.0
        };
        PingSummary {
            host: host.to_owned(),
            addr: Some(addr),
            is_reachable: packets_received > 0,
            packets_sent,
            packets_received,
            packet_loss,
            rtt: RttStats::from_samples(round_trip_times),
            interrupted,
            error,
        }
    }
}

/// Consecutive answers from one router within a hop.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HopResponder {
    pub addr: Ipv4Addr,
    pub round_trip_times: Vec<Duration>,
}

/// All probes sent with one TTL value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HopResult {
    pub ttl: Ttl,
    /// In send order; probes whose reply failed to decode are absent.
    pub probes: Vec<ProbeOutcome>,
    /// Some probe of this hop got an echo reply from the destination.
    pub reached: bool,
}

impl HopResult {
    pub(crate) fn new(ttl: Ttl) -> Self {
        HopResult { ttl, probes: Vec::new(), reached: false }
    }

    pub(crate) fn record(&mut self, outcome: ProbeOutcome) {
        self.reached |= outcome.is_echo_reply();
        self.probes.push(outcome);
    }

    /// Answering routers in order. A new entry starts whenever the responding address changes,
    /// so one router can appear more than once if answers alternate.
    #[must_use]
    pub fn responders(&self) -> Vec<HopResponder> {
        let mut responders: Vec<HopResponder> = Vec::new();
        for probe in &self.probes {
            if let ProbeOutcome::Answered { round_trip_time, responder, .. } = probe {
                match responders.last_mut() {
                    Some(last) if last.addr == *responder => last.round_trip_times.push(*round_trip_time),
                    _ => responders.push(HopResponder { addr: *responder, round_trip_times: vec![*round_trip_time] }),
                }
            }
        }
        responders
    }
}

/// Result of one traceroute session.
#[derive(Debug)]
pub struct TraceSummary {
    pub host: String,
    pub addr: Option<Ipv4Addr>,
    pub hops: Vec<HopResult>,
    pub reached: bool,
    pub interrupted: bool,
    pub error: Option<ProbeError>,
}
