use crate::ping::PingEvent;
use crate::records::{HopResult, PingSummary, ProbeOutcome, TraceSummary};
use crate::resolver::ReverseCache;
use crate::traceroute::TraceEvent;
use crate::HostResolver;
use std::net::Ipv4Addr;
use std::time::Duration;

/// Process-style result of a streamed session.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExitStatus {
    /// At least one reply, or the destination was reached.
    Success = 0,
    Failure = 1,
}

impl ExitStatus {
    #[must_use]
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl From<bool> for ExitStatus {
    fn from(success: bool) -> Self {
        if success {
            ExitStatus::Success
        } else {
            ExitStatus::Failure
        }
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

fn host_and_addr(name: Option<&str>, addr: Ipv4Addr) -> String {
    match name {
        Some(name) => format!("{name} ({addr})"),
        None => addr.to_string(),
    }
}

/// Turns ping events into conventional `ping` output, one line per call of `emit`.
pub(crate) struct PingPrinter<'r, R: ?Sized, F> {
    names: ReverseCache<'r, R>,
    emit: F,
}

impl<'r, R, F> PingPrinter<'r, R, F>
where
    R: HostResolver + ?Sized,
    F: FnMut(String),
{
    pub(crate) fn new(resolver: &'r R, emit: F) -> Self {
        PingPrinter { names: ReverseCache::new(resolver), emit }
    }

    pub(crate) fn on_event(&mut self, event: &PingEvent<'_>) {
        match event {
            PingEvent::Started { host, addr, payload_size } => {
                // IP header (20) + ICMP header (8)
                let total_size = payload_size + 28;
                (self.emit)(format!("PING {host} ({addr}) {payload_size}({total_size}) bytes of data."));
            }
            PingEvent::Reply { sequence, ttl, round_trip_time, responder, bytes } => {
                let from = host_and_addr(self.names.lookup(*responder), *responder);
                (self.emit)(format!(
                    "{bytes} bytes from {from}: icmp_seq={sequence} ttl={ttl} time={:.1} ms",
                    millis(*round_trip_time)
                ));
            }
            PingEvent::Timeout { sequence } => {
                (self.emit)(format!("Request timeout for icmp_seq {sequence}"));
            }
            PingEvent::Finished(summary) => self.statistics(summary),
        }
    }

    fn statistics(&mut self, summary: &PingSummary) {
        if let Some(error) = &summary.error {
            (self.emit)(format!("ping: {error}"));
            if summary.packets_sent == 0 {
                return;
            }
        }
        (self.emit)(String::new());
        (self.emit)(format!("--- {} ping statistics ---", summary.host));
        (self.emit)(format!(
            "{} packets transmitted, {} packets received, {:.1}% packet loss",
            summary.packets_sent, summary.packets_received, summary.packet_loss
        ));
        if let Some(rtt) = &summary.rtt {
            (self.emit)(format!(
                "rtt min/avg/max = {:.3}/{:.3}/{:.3} ms",
                millis(rtt.min),
                millis(rtt.avg),
                millis(rtt.max)
            ));
        }
    }
}

/// Turns traceroute events into conventional `traceroute` output.
pub(crate) struct TracePrinter<'r, R: ?Sized, F> {
    names: ReverseCache<'r, R>,
    emit: F,
}

impl<'r, R, F> TracePrinter<'r, R, F>
where
    R: HostResolver + ?Sized,
    F: FnMut(String),
{
    pub(crate) fn new(resolver: &'r R, emit: F) -> Self {
        TracePrinter { names: ReverseCache::new(resolver), emit }
    }

    pub(crate) fn on_event(&mut self, event: &TraceEvent<'_>) {
        match event {
            TraceEvent::Started { host, addr, max_hops, probes } => {
                (self.emit)(format!(
                    "traceroute to {host} ({addr}), {max_hops} hops max, {probes} probes per hop"
                ));
            }
            TraceEvent::Hop(hop) => {
                let line = self.hop_line(hop);
                (self.emit)(line);
            }
            TraceEvent::Finished(summary) => self.conclusion(summary),
        }
    }

    fn hop_line(&mut self, hop: &HopResult) -> String {
        let mut line = format!("{:2}  ", hop.ttl.0);
        let mut last_addr: Option<Ipv4Addr> = None;
        for probe in &hop.probes {
            match probe {
                ProbeOutcome::Answered { round_trip_time, responder, .. } => {
                    if last_addr != Some(*responder) {
                        if last_addr.is_some() {
                            line.push_str("   ");
                        }
                        line.push_str(&host_and_addr(self.names.lookup(*responder), *responder));
                        line.push(' ');
                        last_addr = Some(*responder);
                    }
                    line.push_str(&format!("{:.3} ms ", millis(*round_trip_time)));
                }
                ProbeOutcome::TimedOut => line.push_str(" * "),
            }
        }
        line
    }

    fn conclusion(&mut self, summary: &TraceSummary) {
        if let Some(error) = &summary.error {
            (self.emit)(format!("traceroute: {error}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icmp::v4::{SequenceNumber, Ttl};
    use crate::records::ReplyKind;
    use crate::resolver::tests::ResolverMock;
    use crate::ProbeError;

    fn collect_ping(resolver: &ResolverMock, events: &[PingEvent<'_>]) -> Vec<String> {
        let mut lines = Vec::new();
        let mut printer = PingPrinter::new(resolver, |line| lines.push(line));
        for event in events {
            printer.on_event(event);
        }
        drop(printer);
        lines
    }

    fn answered(responder: Ipv4Addr, micros: u64) -> ProbeOutcome {
        ProbeOutcome::Answered {
            round_trip_time: Duration::from_micros(micros),
            responder,
            ttl: None,
            kind: ReplyKind::TimeExceeded,
        }
    }

    #[test]
    fn exit_status_codes() {
        assert_eq!(0, ExitStatus::Success.code());
        assert_eq!(1, ExitStatus::Failure.code());
        assert_eq!(ExitStatus::Failure, ExitStatus::from(false));
    }

    #[test]
    fn ping_banner() {
        let addr = Ipv4Addr::new(93, 184, 216, 34);
        let lines = collect_ping(
            &ResolverMock::default(),
            &[PingEvent::Started { host: "example.com", addr, payload_size: 56 }],
        );
        assert_eq!(vec!["PING example.com (93.184.216.34) 56(84) bytes of data."], lines);
    }

    #[test]
    fn ping_reply_with_and_without_name() {
        let named = Ipv4Addr::new(93, 184, 216, 34);
        let anonymous = Ipv4Addr::new(192, 0, 2, 7);
        let resolver = ResolverMock::default().with_name(named, "example.com");
        let reply = |responder| PingEvent::Reply {
            sequence: SequenceNumber::from(2),
            ttl: Ttl(56),
            round_trip_time: Duration::from_micros(12_345),
            responder,
            bytes: 64,
        };

        let lines = collect_ping(&resolver, &[reply(named), reply(anonymous)]);

        assert_eq!(
            vec![
                "64 bytes from example.com (93.184.216.34): icmp_seq=2 ttl=56 time=12.3 ms",
                "64 bytes from 192.0.2.7: icmp_seq=2 ttl=56 time=12.3 ms",
            ],
            lines
        );
    }

    #[test]
    fn ping_timeout_line() {
        let lines = collect_ping(
            &ResolverMock::default(),
            &[PingEvent::Timeout { sequence: SequenceNumber::from(3) }],
        );
        assert_eq!(vec!["Request timeout for icmp_seq 3"], lines);
    }

    #[test]
    fn ping_statistics() {
        let summary = PingSummary::conclude(
            "example.com",
            Ipv4Addr::new(93, 184, 216, 34),
            3,
            &[Duration::from_micros(10_000), Duration::from_micros(20_000)],
            false,
            None,
        );

        let lines = collect_ping(&ResolverMock::default(), &[PingEvent::Finished(&summary)]);

        assert_eq!(
            vec![
                "",
                "--- example.com ping statistics ---",
                "3 packets transmitted, 2 packets received, 33.3% packet loss",
                "rtt min/avg/max = 10.000/15.000/20.000 ms",
            ],
            lines
        );
    }

    #[test]
    fn ping_statistics_without_replies_omit_rtt() {
        let summary = PingSummary::conclude("example.com", Ipv4Addr::new(93, 184, 216, 34), 2, &[], false, None);

        let lines = collect_ping(&ResolverMock::default(), &[PingEvent::Finished(&summary)]);

        assert_eq!("2 packets transmitted, 0 packets received, 100.0% packet loss", lines[2]);
        assert_eq!(3, lines.len());
    }

    #[test]
    fn ping_fatal_error_is_a_single_line() {
        let summary = PingSummary::failed("nowhere.invalid", None, ProbeError::resolution("nowhere.invalid"));

        let lines = collect_ping(&ResolverMock::default(), &[PingEvent::Finished(&summary)]);

        assert_eq!(vec!["ping: Cannot resolve hostname: nowhere.invalid"], lines);
    }

    #[test]
    fn trace_banner_and_hops() {
        let gateway = Ipv4Addr::new(10, 0, 0, 1);
        let other = Ipv4Addr::new(10, 0, 0, 2);
        let resolver = ResolverMock::default().with_name(gateway, "gw.example");
        let mut hop = HopResult::new(Ttl(1));
        hop.record(answered(gateway, 1_234));
        hop.record(ProbeOutcome::TimedOut);
        hop.record(answered(other, 2_000));
        let mut silent = HopResult::new(Ttl(12));
        silent.record(ProbeOutcome::TimedOut);
        silent.record(ProbeOutcome::TimedOut);

        let mut lines = Vec::new();
        let mut printer = TracePrinter::new(&resolver, |line| lines.push(line));
        printer.on_event(&TraceEvent::Started {
            host: "example.com",
            addr: Ipv4Addr::new(93, 184, 216, 34),
            max_hops: 30,
            probes: 3,
        });
        printer.on_event(&TraceEvent::Hop(&hop));
        printer.on_event(&TraceEvent::Hop(&silent));
        drop(printer);

        assert_eq!(
            vec![
                "traceroute to example.com (93.184.216.34), 30 hops max, 3 probes per hop",
                " 1  gw.example (10.0.0.1) 1.234 ms  *    10.0.0.2 2.000 ms ",
                "12   *  * ",
            ],
            lines
        );
    }

    #[test]
    fn trace_hop_with_one_responder_names_it_once() {
        let router = Ipv4Addr::new(172, 16, 0, 254);
        let mut hop = HopResult::new(Ttl(3));
        hop.record(answered(router, 800));
        hop.record(answered(router, 950));
        hop.record(answered(router, 1_000));

        let mut lines = Vec::new();
        let resolver = ResolverMock::default();
        let mut printer = TracePrinter::new(&resolver, |line| lines.push(line));
        printer.on_event(&TraceEvent::Hop(&hop));
        drop(printer);

        assert_eq!(vec![" 3  172.16.0.254 0.800 ms 0.950 ms 1.000 ms "], lines);
    }
}
