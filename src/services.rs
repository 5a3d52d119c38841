//! Service catalog based on well-known port numbers.
//!
//! Maps port numbers to the services that commonly listen there. Entries are
//! guesses only; a service is confirmed solely by a detector.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// A networked application that may run on a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Service {
    Cpanel,
    Cups,
    Dns,
    Docker,
    Ftp,
    Http,
    Imap,
    Kerberos,
    Mysql,
    Nfs,
    NodeExporter,
    Ntp,
    Pop3,
    Sftp,
    Smtp,
    Squid,
    Ssh,
    Syslog,
    Telnet,
    Vnc,
}

impl Service {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cpanel => "cpanel",
            Self::Cups => "cups",
            Self::Dns => "dns",
            Self::Docker => "docker",
            Self::Ftp => "ftp",
            Self::Http => "http",
            Self::Imap => "imap",
            Self::Kerberos => "kerberos",
            Self::Mysql => "mysql",
            Self::Nfs => "nfs",
            Self::NodeExporter => "node-exporter",
            Self::Ntp => "ntp",
            Self::Pop3 => "pop3",
            Self::Sftp => "sftp",
            Self::Smtp => "smtp",
            Self::Squid => "squid",
            Self::Ssh => "ssh",
            Self::Syslog => "syslog",
            Self::Telnet => "telnet",
            Self::Vnc => "vnc",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const HTTP: &[Service] = &[Service::Http];
const CPANEL: &[Service] = &[Service::Cpanel];
const DOCKER: &[Service] = &[Service::Docker];

/// Static map of well-known ports to candidate services.
///
/// Based on the IANA registry plus ports developers commonly pick for local
/// web servers.
static PORT_SERVICES: LazyLock<HashMap<u16, &'static [Service]>> = LazyLock::new(|| {
    let mut m: HashMap<u16, &'static [Service]> = HashMap::new();

    m.insert(21, &[Service::Ftp]);
    m.insert(22, &[Service::Ssh]);
    m.insert(23, &[Service::Telnet]);
    m.insert(25, &[Service::Smtp]);
    m.insert(53, &[Service::Dns]);
    m.insert(80, HTTP);
    m.insert(88, &[Service::Kerberos]);
    m.insert(110, &[Service::Pop3]);
    m.insert(115, &[Service::Sftp]);
    m.insert(143, &[Service::Imap]);
    m.insert(443, HTTP); // over TLS
    m.insert(465, &[Service::Smtp]); // over TLS
    m.insert(514, &[Service::Syslog]);
    m.insert(631, &[Service::Cups]);
    m.insert(993, &[Service::Imap]); // over TLS
    m.insert(995, &[Service::Pop3]); // over TLS
    m.insert(3306, &[Service::Mysql]);
    m.insert(5009, &[Service::Vnc]);
    m.insert(9100, &[Service::NodeExporter]);

    for port in [2082, 2083, 2086, 2087, 2095, 2096] {
        m.insert(port, CPANEL);
    }
    for port in 2375..=2377 {
        m.insert(port, DOCKER);
    }

    // Common ports chosen by developers
    for port in [1111, 2222, 3333, 4200, 4444, 5555, 6666, 7777, 8080, 8081, 8888, 9999] {
        m.insert(port, HTTP);
    }

    m
});

/// Look up the candidate services for a port.
///
/// Returns an empty slice if the port is not in the catalog.
pub fn potential_services(port: u16) -> &'static [Service] {
    PORT_SERVICES.get(&port).copied().unwrap_or(&[])
}

/// All catalogued ports, sorted ascending.
pub fn common_ports() -> Vec<u16> {
    let mut ports: Vec<u16> = PORT_SERVICES.keys().copied().collect();
    ports.sort_unstable();
    ports
}

/// Iterate the catalog in port order.
pub fn catalog() -> impl Iterator<Item = (u16, &'static [Service])> {
    common_ports()
        .into_iter()
        .map(|port| (port, potential_services(port)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_ports() {
        assert_eq!(potential_services(21), &[Service::Ftp]);
        assert_eq!(potential_services(22), &[Service::Ssh]);
        assert_eq!(potential_services(80), &[Service::Http]);
        assert_eq!(potential_services(443), &[Service::Http]);
        assert_eq!(potential_services(465), &[Service::Smtp]);
        assert_eq!(potential_services(2376), &[Service::Docker]);
        assert_eq!(potential_services(3306), &[Service::Mysql]);
        assert_eq!(potential_services(4200), &[Service::Http]);
        assert_eq!(potential_services(9100), &[Service::NodeExporter]);
    }

    #[test]
    fn test_unknown_port() {
        assert!(potential_services(12345).is_empty());
    }

    #[test]
    fn test_common_ports_sorted() {
        let ports = common_ports();
        assert!(ports.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(ports.first(), Some(&21));
        assert_eq!(catalog().count(), ports.len());
    }

    #[test]
    fn test_service_names() {
        assert_eq!(Service::NodeExporter.to_string(), "node-exporter");
        assert_eq!(
            serde_json::to_string(&Service::NodeExporter).unwrap(),
            "\"node-exporter\""
        );
        assert_eq!(Service::Http.as_str(), "http");
    }
}
