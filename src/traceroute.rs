use crate::config::TracerouteConfig;
use crate::icmp::v4::{
    decode, encode_echo_request, Identifier, InvalidReason, ParsedReply, RawSocket, SequenceNumber, TSocket, Ttl,
};
use crate::output::{ExitStatus, TracePrinter};
use crate::records::{HopResult, ProbeOutcome, ReplyKind, TraceSummary};
use crate::resolver::{HostResolver, SystemResolver};
use crate::transport::{recv_buffer, Received, Transport};
use crate::ProbeResult;
use std::io;
use std::net::Ipv4Addr;
use std::time::Duration;

#[derive(Debug)]
pub(crate) enum TraceEvent<'a> {
    Started {
        host: &'a str,
        addr: Ipv4Addr,
        max_hops: u8,
        probes: u16,
    },
    /// A hop is reported once all of its probes are done.
    Hop(&'a HopResult),
    Finished(&'a TraceSummary),
}

struct RouteDiscovery<'c, S: TSocket> {
    config: &'c TracerouteConfig,
    identifier: Identifier,
    destination: Ipv4Addr,
    transport: Transport<S>,
    buf: Vec<u8>,
    // keeps counting across hops
    sequence: SequenceNumber,
}

impl<'c, S> RouteDiscovery<'c, S>
where
    S: TSocket,
{
    fn new(config: &'c TracerouteConfig, identifier: Identifier, destination: Ipv4Addr, transport: Transport<S>) -> Self {
        RouteDiscovery {
            config,
            identifier,
            destination,
            transport,
            buf: recv_buffer(config.payload_size),
            sequence: SequenceNumber::start_value(),
        }
    }

    /// Sends one probe with the current TTL and waits for its answer.
    ///
    /// Datagrams that cannot answer this probe (our own looped-back requests, other sessions'
    /// replies, late replies to earlier probes) are passed over within the same deadline. `None`
    /// when a corrupt or truncated datagram arrives; the probe is then left out of the hop.
    fn probe(&mut self) -> ProbeResult<Option<ProbeOutcome>> {
        let sequence = self.sequence;
        self.sequence = sequence.next();

        let packet = encode_echo_request(self.identifier, sequence, self.config.payload_size)?;
        let send_time = self.transport.send(&packet, self.destination)?;
        let deadline = send_time + self.config.timeout;

        loop {
            let (len, source, at) = match self.transport.receive(&mut self.buf, deadline)? {
                Received::TimedOut => return Ok(Some(ProbeOutcome::TimedOut)),
                Received::Datagram { len, source, at } => (len, source, at),
            };
            let round_trip_time = at.saturating_duration_since(send_time);
            match decode(&self.buf[..len], self.identifier) {
                ParsedReply::EchoReply { sequence: received, ttl } if received == sequence => {
                    return Ok(Some(ProbeOutcome::Answered {
                        round_trip_time,
                        responder: source,
                        ttl: Some(ttl),
                        kind: ReplyKind::EchoReply,
                    }));
                }
                ParsedReply::EchoReply { sequence: received, .. } => {
                    tracing::debug!("passing over late reply icmp_seq={} while waiting for {}", received, sequence);
                }
                ParsedReply::TimeExceeded => {
                    return Ok(Some(ProbeOutcome::Answered {
                        round_trip_time,
                        responder: source,
                        ttl: None,
                        kind: ReplyKind::TimeExceeded,
                    }));
                }
                ParsedReply::Invalid(
                    reason @ (InvalidReason::ForeignIdentifier(_) | InvalidReason::UnexpectedType(_)),
                ) => {
                    tracing::trace!("passing over datagram from {}: {:?}", source, reason);
                }
                ParsedReply::Invalid(reason) => {
                    tracing::debug!("skipping probe icmp_seq={}: {:?} from {}", sequence, reason, source);
                    return Ok(None);
                }
            }
        }
    }
}

/// Probes the path to `host` one TTL at a time until the destination answers, `max_hops` is
/// exhausted, an error occurs or a stop is requested.
pub(crate) fn run<S, F, R, E>(
    host: &str,
    config: &TracerouteConfig,
    identifier: Identifier,
    resolver: &R,
    open_socket: F,
    mut on_event: E,
) -> TraceSummary
where
    S: TSocket,
    F: Fn(Duration) -> io::Result<S>,
    R: HostResolver + ?Sized,
    E: FnMut(TraceEvent<'_>),
{
    let mut summary = TraceSummary {
        host: host.to_owned(),
        addr: None,
        hops: Vec::new(),
        reached: false,
        interrupted: false,
        error: None,
    };
    let destination = match resolver.resolve(host) {
        Ok(addr) => addr,
        Err(e) => {
            tracing::warn!("{}", e);
            summary.error = Some(e);
            on_event(TraceEvent::Finished(&summary));
            return summary;
        }
    };
    summary.addr = Some(destination);
    on_event(TraceEvent::Started { host, addr: destination, max_hops: config.max_hops, probes: config.probes });

    let transport = match Transport::open_split(open_socket, config.timeout) {
        Ok(transport) => transport,
        Err(e) => {
            tracing::warn!("{}", e);
            summary.error = Some(e);
            on_event(TraceEvent::Finished(&summary));
            return summary;
        }
    };
    let mut discovery = RouteDiscovery::new(config, identifier, destination, transport);

    'hops: for ttl in 1..=config.max_hops {
        if config.stop.should_stop() {
            summary.interrupted = true;
            break;
        }
        if let Err(e) = discovery.transport.set_ttl(Ttl(ttl)) {
            summary.error = Some(e);
            break;
        }
        let mut hop = HopResult::new(Ttl(ttl));
        for _ in 0..config.probes {
            if config.stop.should_stop() {
                summary.interrupted = true;
                break;
            }
            match discovery.probe() {
                Ok(Some(outcome)) => hop.record(outcome),
                Ok(None) => {}
                Err(e) => {
                    summary.error = Some(e);
                    break;
                }
            }
        }
        tracing::trace!("hop {} done, reached={}", ttl, hop.reached);
        on_event(TraceEvent::Hop(&hop));
        summary.reached = hop.reached;
        summary.hops.push(hop);
        if summary.reached || summary.interrupted || summary.error.is_some() {
            break 'hops;
        }
    }
    drop(discovery);

    if let Some(e) = &summary.error {
        tracing::warn!("traceroute to {} aborted: {}", host, e);
    }
    on_event(TraceEvent::Finished(&summary));
    summary
}

pub(crate) fn stream<S, F, R, W>(
    host: &str,
    config: &TracerouteConfig,
    identifier: Identifier,
    resolver: &R,
    open_socket: F,
    emit: W,
) -> (ExitStatus, TraceSummary)
where
    S: TSocket,
    F: Fn(Duration) -> io::Result<S>,
    R: HostResolver + ?Sized,
    W: FnMut(String),
{
    let mut printer = TracePrinter::new(resolver, emit);
    let summary = run(host, config, identifier, resolver, open_socket, |event| printer.on_event(&event));
    (ExitStatus::from(summary.reached), summary)
}

#[must_use]
pub fn traceroute(host: &str, config: &TracerouteConfig) -> TraceSummary {
    traceroute_with(host, config, Identifier::random(), &SystemResolver)
}

pub fn traceroute_with<R>(host: &str, config: &TracerouteConfig, identifier: Identifier, resolver: &R) -> TraceSummary
where
    R: HostResolver + ?Sized,
{
    run(host, config, identifier, resolver, RawSocket::new, |_| {})
}

/// Traces the route to `host`, handing each output line to `emit` as soon as its hop is done.
///
/// Returns [`ExitStatus::Success`] only if the destination answered.
pub fn traceroute_stream<R, W>(host: &str, config: &TracerouteConfig, resolver: &R, emit: W) -> ExitStatus
where
    R: HostResolver + ?Sized,
    W: FnMut(String),
{
    stream(host, config, Identifier::random(), resolver, RawSocket::new, emit).0
}
