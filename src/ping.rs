use crate::config::PingConfig;
use crate::icmp::v4::{
    decode, encode_echo_request, Identifier, ParsedReply, RawSocket, SequenceNumber, TSocket, Ttl, ICMP_HEADER_LEN,
};
use crate::output::{ExitStatus, PingPrinter};
use crate::records::{PingSummary, ProbeOutcome, ReplyKind};
use crate::resolver::{HostResolver, SystemResolver};
use crate::transport::{recv_buffer, Received, Transport};
use crate::ProbeResult;
use std::io;
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

/// Progress of a ping session, in the order it happens.
#[derive(Debug)]
pub(crate) enum PingEvent<'a> {
    Started {
        host: &'a str,
        addr: Ipv4Addr,
        payload_size: usize,
    },
    Reply {
        sequence: SequenceNumber,
        ttl: Ttl,
        round_trip_time: Duration,
        responder: Ipv4Addr,
        /// ICMP bytes received, header included.
        bytes: usize,
    },
    Timeout {
        sequence: SequenceNumber,
    },
    Finished(&'a PingSummary),
}

struct EchoSession<'c, S: TSocket> {
    config: &'c PingConfig,
    identifier: Identifier,
    destination: Ipv4Addr,
    transport: Transport<S>,
    buf: Vec<u8>,
}

impl<'c, S> EchoSession<'c, S>
where
    S: TSocket,
{
    fn new(config: &'c PingConfig, identifier: Identifier, destination: Ipv4Addr, transport: Transport<S>) -> Self {
        EchoSession { config, identifier, destination, transport, buf: recv_buffer(config.payload_size) }
    }

    fn send(&self, sequence: SequenceNumber) -> ProbeResult<Instant> {
        let packet = encode_echo_request(self.identifier, sequence, self.config.payload_size)?;
        let send_time = self.transport.send(&packet, self.destination)?;
        tracing::trace!("sent echo request icmp_seq={} to {}", sequence, self.destination);
        Ok(send_time)
    }

    /// Waits for the echo reply matching `sequence`. Everything else arriving before the deadline
    /// is dropped without extending it.
    fn await_reply(&mut self, sequence: SequenceNumber, send_time: Instant) -> ProbeResult<ProbeOutcome> {
        let deadline = send_time + self.config.timeout;
        loop {
            let (len, source, at) = match self.transport.receive(&mut self.buf, deadline)? {
                Received::TimedOut => return Ok(ProbeOutcome::TimedOut),
                Received::Datagram { len, source, at } => (len, source, at),
            };
            match decode(&self.buf[..len], self.identifier) {
                ParsedReply::EchoReply { sequence: received, ttl } if received == sequence => {
                    return Ok(ProbeOutcome::Answered {
                        round_trip_time: at.saturating_duration_since(send_time),
                        responder: source,
                        ttl: Some(ttl),
                        kind: ReplyKind::EchoReply,
                    });
                }
                ParsedReply::EchoReply { sequence: received, .. } => {
                    tracing::debug!("dropping late reply icmp_seq={} while waiting for {}", received, sequence);
                }
                ParsedReply::TimeExceeded => {
                    tracing::trace!("dropping time exceeded from {}", source);
                }
                ParsedReply::Invalid(reason) => {
                    tracing::trace!("dropping datagram from {}: {:?}", source, reason);
                }
            }
        }
    }
}

/// Resolves `host`, opens the transport and runs `config.count` echo probes.
///
/// `on_event` sees every step; the returned summary is the one passed with
/// [`PingEvent::Finished`]. The transport is closed before that final event.
pub(crate) fn run<S, F, R, E>(
    host: &str,
    config: &PingConfig,
    identifier: Identifier,
    resolver: &R,
    open_socket: F,
    mut on_event: E,
) -> PingSummary
where
    S: TSocket,
    F: Fn(Duration) -> io::Result<S>,
    R: HostResolver + ?Sized,
    E: FnMut(PingEvent<'_>),
{
    let destination = match resolver.resolve(host) {
        Ok(addr) => addr,
        Err(e) => {
            tracing::warn!("{}", e);
            let summary = PingSummary::failed(host, None, e);
            on_event(PingEvent::Finished(&summary));
            return summary;
        }
    };
    let transport = match Transport::open(open_socket, config.timeout) {
        Ok(transport) => transport,
        Err(e) => {
            tracing::warn!("{}", e);
            let summary = PingSummary::failed(host, Some(destination), e);
            on_event(PingEvent::Finished(&summary));
            return summary;
        }
    };
    tracing::debug!("pinging {} ({}) with identifier {}", host, destination, identifier);
    on_event(PingEvent::Started { host, addr: destination, payload_size: config.payload_size });

    let mut session = EchoSession::new(config, identifier, destination, transport);
    let mut round_trip_times = Vec::new();
    let mut packets_sent: u16 = 0;
    let mut interrupted = false;
    let mut error = None;
    let mut sequence = SequenceNumber::start_value();

    for n in 1..=config.count {
        if config.stop.should_stop() {
            interrupted = true;
            break;
        }
        let send_time = match session.send(sequence) {
            Ok(send_time) => send_time,
            Err(e) => {
                error = Some(e);
                break;
            }
        };
        packets_sent += 1;
        match session.await_reply(sequence, send_time) {
            Ok(ProbeOutcome::Answered { round_trip_time, responder, ttl, .. }) => {
                round_trip_times.push(round_trip_time);
                on_event(PingEvent::Reply {
                    sequence,
                    ttl: ttl.unwrap_or(Ttl(0)),
                    round_trip_time,
                    responder,
                    bytes: config.payload_size + ICMP_HEADER_LEN,
                });
            }
            Ok(ProbeOutcome::TimedOut) => on_event(PingEvent::Timeout { sequence }),
            Err(e) => {
                error = Some(e);
                break;
            }
        }
        if n < config.count {
            let pause = config.interval.saturating_sub(send_time.elapsed());
            if config.stop.wait_timeout(pause) {
                interrupted = true;
                break;
            }
        }
        sequence = sequence.next();
    }
    drop(session);

    if let Some(e) = &error {
        tracing::warn!("ping of {} aborted: {}", host, e);
    }
    let summary = PingSummary::conclude(host, destination, packets_sent, &round_trip_times, interrupted, error);
    on_event(PingEvent::Finished(&summary));
    summary
}

pub(crate) fn stream<S, F, R, W>(
    host: &str,
    config: &PingConfig,
    identifier: Identifier,
    resolver: &R,
    open_socket: F,
    emit: W,
) -> (ExitStatus, PingSummary)
where
    S: TSocket,
    F: Fn(Duration) -> io::Result<S>,
    R: HostResolver + ?Sized,
    W: FnMut(String),
{
    let mut printer = PingPrinter::new(resolver, emit);
    let summary = run(host, config, identifier, resolver, open_socket, |event| printer.on_event(&event));
    let status = ExitStatus::from(summary.is_reachable && summary.error.is_none());
    (status, summary)
}

/// Pings `host` with a fresh random identifier, resolving through the operating system.
#[must_use]
pub fn ping(host: &str, config: &PingConfig) -> PingSummary {
    ping_with(host, config, Identifier::random(), &SystemResolver)
}

/// Like [`ping`] with a caller-chosen identifier and resolver.
pub fn ping_with<R>(host: &str, config: &PingConfig, identifier: Identifier, resolver: &R) -> PingSummary
where
    R: HostResolver + ?Sized,
{
    run(host, config, identifier, resolver, RawSocket::new, |_| {})
}

/// Pings `host` and hands each output line to `emit` as soon as it is known.
///
/// Lines carry no trailing newline. Returns [`ExitStatus::Success`] when at least one reply
/// arrived and nothing failed.
pub fn ping_stream<R, W>(host: &str, config: &PingConfig, resolver: &R, emit: W) -> ExitStatus
where
    R: HostResolver + ?Sized,
    W: FnMut(String),
{
    stream(host, config, Identifier::random(), resolver, RawSocket::new, emit).0
}

/// Sends a single echo request and reports whether it was answered within `timeout`.
#[must_use]
pub fn is_host_reachable(host: &str, timeout: Duration) -> bool {
    let config = PingConfig { count: 1, timeout, ..PingConfig::default() };
    ping(host, &config).is_reachable
}

/// Pings each host in turn; one summary per host, in input order.
pub fn ping_multiple<H>(hosts: &[H], config: &PingConfig) -> Vec<PingSummary>
where
    H: AsRef<str>,
{
    let mut summaries = Vec::with_capacity(hosts.len());
    for host in hosts {
        if config.stop.should_stop() {
            break;
        }
        summaries.push(ping(host.as_ref(), config));
    }
    summaries
}
