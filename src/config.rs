use crate::packet::frame::LinkType;

/// Settings for a `Listener`.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub local_port: u16,        // Only segments to this port are handled
    pub ttl: u8,                // TTL of every reply
    pub window: u16,            // Window advertised in every reply
    pub link: LinkType,         // Framing of captured and injected frames
    pub max_connections: usize, // SYNs from new endpoints are dropped beyond this
}

impl Default for Config {
    fn default() -> Self {
        Config {
            local_port: 8080,
            ttl: 64,
            window: 65535,
            link: LinkType::Ethernet,
            max_connections: 1024,
        }
    }
}
