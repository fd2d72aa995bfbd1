use std::fmt::{self, Display};
use std::net::IpAddr;
use std::str::FromStr;

use crate::ParseAddrError;

/// Upper bound on the stderr diagnostics surfaced from a failed program.
pub const MAX_EXEC_STDERR_BYTES: usize = 1024;

/// An IP address produced by discovery, with an optional IPv6 zone index.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct IpAddrRecord {
    /// The address.
    pub ip: IpAddr,

    /// The IPv6 zone index (for example `eth0` in `fe80::1%eth0`).
    pub zone: Option<String>,
}

impl IpAddrRecord {
    /// Creates a record without a zone.
    #[must_use]
    pub const fn new(ip: IpAddr) -> Self {
        Self { ip, zone: None }
    }
}

impl From<IpAddr> for IpAddrRecord {
    fn from(ip: IpAddr) -> Self {
        Self::new(ip)
    }
}

impl Display for IpAddrRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.zone {
            Some(zone) => write!(f, "{}%{zone}", self.ip),
            None => write!(f, "{}", self.ip),
        }
    }
}

impl FromStr for IpAddrRecord {
    type Err = ParseAddrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, zone) = match s.split_once('%') {
            Some((_, "")) => return Err(ParseAddrError::EmptyZone(s.to_string())),
            Some((_, zone)) if zone.contains('%') => {
                return Err(ParseAddrError::InvalidZone(s.to_string()));
            }
            Some((host, zone)) => (host, Some(zone.to_string())),
            None => (s, None),
        };

        let ip: IpAddr = host
            .parse()
            .map_err(|_| ParseAddrError::InvalidIp(s.to_string()))?;

        if zone.is_some() && ip.is_ipv4() {
            return Err(ParseAddrError::ZoneOnIpv4(s.to_string()));
        }

        Ok(Self { ip, zone })
    }
}

/// Parses the stdout of a discovery program into address records.
///
/// # Errors
///
/// Returns the first token that is not a valid IP literal.
pub fn parse_exec_output(stdout: &str) -> Result<Vec<IpAddrRecord>, ParseAddrError> {
    stdout.split_whitespace().map(str::parse).collect()
}

/// Converts a failed program's stderr into a bounded diagnostic message.
#[must_use]
pub fn truncate_stderr(stderr: &[u8]) -> String {
    let bounded = &stderr[..stderr.len().min(MAX_EXEC_STDERR_BYTES)];
    String::from_utf8_lossy(bounded).trim().to_string()
}
