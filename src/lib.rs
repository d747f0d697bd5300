#![warn(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

//! ICMP echo probing over raw IPv4 sockets: `ping` style reachability checks and `traceroute`
//! style route discovery.
//!
//! Raw sockets need elevated privileges; without them sessions end with
//! [`ProbeError::PermissionDenied`].

pub use config::*;
pub use interrupt::StopCondition;
pub use output::ExitStatus;
pub use ping::{is_host_reachable, ping, ping_multiple, ping_stream, ping_with};
pub use probe_error::{ProbeError, ProbeResult};
pub use records::{HopResponder, HopResult, PingSummary, ProbeOutcome, ReplyKind, RttStats, TraceSummary};
pub use resolver::{HostResolver, SystemResolver};
pub use traceroute::{traceroute, traceroute_stream, traceroute_with};

pub mod icmp;

mod config;
mod interrupt;
mod output;
mod ping;
mod probe_error;
mod records;
mod resolver;
mod traceroute;
mod transport;
