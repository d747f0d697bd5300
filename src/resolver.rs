use crate::{ProbeError, ProbeResult};
use dns_lookup::{lookup_addr, lookup_host};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};

/// Name resolution used by the probing sessions.
pub trait HostResolver {
    /// Forward lookup to an IPv4 address.
    fn resolve(&self, host: &str) -> ProbeResult<Ipv4Addr>;

    /// Best-effort reverse lookup; `None` when the address has no name.
    fn reverse(&self, addr: Ipv4Addr) -> Option<String>;
}

/// Resolves through the operating system (`getaddrinfo` / `getnameinfo`).
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemResolver;

impl HostResolver for SystemResolver {
    fn resolve(&self, host: &str) -> ProbeResult<Ipv4Addr> {
        if let Ok(addr) = host.parse::<Ipv4Addr>() {
            return Ok(addr);
        }
        let addrs = lookup_host(host).map_err(|e| {
            tracing::debug!("lookup of {} failed: {}", host, e);
            ProbeError::resolution(host)
        })?;
        addrs
            .into_iter()
            .find_map(|addr| match addr {
                IpAddr::V4(ipv4) => Some(ipv4),
                IpAddr::V6(_) => None,
            })
            .ok_or_else(|| ProbeError::resolution(host))
    }

    fn reverse(&self, addr: Ipv4Addr) -> Option<String> {
        // getnameinfo hands back the numeric form when there is no PTR record
        lookup_addr(&IpAddr::V4(addr)).ok().filter(|name| *name != addr.to_string())
    }
}

/// Remembers reverse lookups for the lifetime of one output stream.
pub(crate) struct ReverseCache<'a, R: ?Sized> {
    resolver: &'a R,
    names: HashMap<Ipv4Addr, Option<String>>,
}

impl<'a, R> ReverseCache<'a, R>
where
    R: HostResolver + ?Sized,
{
    pub(crate) fn new(resolver: &'a R) -> Self {
        ReverseCache { resolver, names: HashMap::new() }
    }

    pub(crate) fn lookup(&mut self, addr: Ipv4Addr) -> Option<&str> {
        let resolver = self.resolver;
        self.names.entry(addr).or_insert_with(|| resolver.reverse(addr)).as_deref()
    }
}
