use std::collections::HashMap;
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{debug, info, trace, warn};
use crate::config::Config;
use crate::ip::ip_header::IPHeader;
use crate::packet::{self, Inbound, Outbound};
use crate::tcp::connection::{Connection, ConnectionKey};
use crate::tcp::errors::TcpError;
use crate::tcp::state::TCPState;
use crate::tcp::tcp_flags::TCPFlags;

/// Owns every connection on one listening port and turns captured frames into reply frames.
pub struct Listener {
    config: Config,
    connections: HashMap<ConnectionKey, Connection>,
    rng: Box<dyn RngCore + Send>, // ISN source
}

impl Listener {
    pub fn new(config: Config) -> Self {
        Self::with_rng(config, Box::new(OsRng))
    }

    /// A listener drawing initial sequence numbers from `rng` instead of the OS.
    pub fn with_rng(config: Config, rng: Box<dyn RngCore + Send>) -> Self {
        Listener {
            config,
            connections: HashMap::new(),
            rng,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn connection(&self, key: &ConnectionKey) -> Option<&Connection> {
        self.connections.get(key)
    }

    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Handle one captured frame, returning the frame to inject if a reply is due.
    /// Malformed frames and unexpected segments are dropped; only a fatal error is returned.
    pub fn handle_frame(&mut self, frame: &[u8]) -> Result<Option<Vec<u8>>, TcpError> {
        match self.process_frame(frame) {
            Err(err) if err.is_fatal() => {
                warn!("Cannot handle frame: {err}");
                Err(err)
            }
            Err(TcpError::HeaderError(err)) => {
                debug!("Dropping malformed frame: {err}");
                Ok(None)
            }
            Err(err) => {
                debug!("Ignoring segment: {err}");
                Ok(None)
            }
            Ok(reply) => Ok(reply),
        }
    }

    /// Like `handle_frame`, but every failure is returned to the caller.
    pub fn process_frame(&mut self, frame: &[u8]) -> Result<Option<Vec<u8>>, TcpError> {
        let Inbound { link, iph, tcph } = packet::unpack(frame, self.config.link)?;

        if tcph.dst_port != self.config.local_port {
            trace!("Dropping segment for port {}", tcph.dst_port);
            return Ok(None);
        }

        let key = ConnectionKey {
            local_port: tcph.dst_port,
            remote_ip: iph.src_ip,
            remote_port: tcph.src_port,
        };
        let window = self.config.window;
        let ttl = self.config.ttl;

        let created = tcph.flags.contains(TCPFlags::SYN) && !self.connections.contains_key(&key);
        if created && self.connections.len() >= self.config.max_connections {
            debug!(
                "Connection table full ({} entries), dropping SYN from {}:{}",
                self.connections.len(),
                iph.src_ip,
                tcph.src_port
            );
            return Ok(None);
        }

        let conn = if tcph.flags.contains(TCPFlags::SYN) {
            info!("Received SYN from {}:{}", iph.src_ip, tcph.src_port);
            self.connections
                .entry(key)
                .or_insert_with(|| Connection::listen(iph.dst_ip, key.local_port, window))
        } else {
            debug!("Received {:?} from {}:{}", tcph.flags, iph.src_ip, tcph.src_port);
            match self.connections.get_mut(&key) {
                Some(conn) => conn,
                None => {
                    debug!("No connection for {}:{}", iph.src_ip, tcph.src_port);
                    return Ok(None);
                }
            }
        };

        let reply = match conn.on_segment_with(&mut *self.rng, &tcph, iph.src_ip) {
            Ok(reply) => reply,
            Err(err) => {
                // Never keep an entry that was only created for this SYN
                if err.is_fatal() && created {
                    self.connections.remove(&key);
                }
                return Err(err);
            }
        };

        let Some(reply) = reply else {
            if conn.state == TCPState::Established {
                info!("Connection established with {}:{}", conn.remote_ip, conn.remote_port);
            }
            return Ok(None);
        };

        let reply = Outbound {
            link: link.reply_to(),
            iph: IPHeader {
                ttl,
                src_ip: conn.local_ip,
                dst_ip: conn.remote_ip,
                ..Default::default()
            },
            tcph: reply,
        };
        debug!(
            "Sending {:?} seq={} ack={} to {}:{}",
            reply.tcph.flags, reply.tcph.seq_no, reply.tcph.ack_no, conn.remote_ip, conn.remote_port
        );
        Ok(Some(packet::pack(&reply)))
    }
}

// -- Unit tests --

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ethernet::frame::EthernetFrame;
    use crate::packet::frame::{LinkHeader, LinkType};
    use crate::packet::test_utils;
    use crate::tcp::tcp_header::TCPHeader;
    use crate::tcp::test_utils::BrokenRng;
    use crate::tcp::wrap32::Wrap32;
    use std::net::Ipv4Addr;

    const CLIENT_IP: Ipv4Addr = Ipv4Addr::new(10, 110, 208, 106);
    const SERVER_IP: Ipv4Addr = Ipv4Addr::new(204, 44, 192, 60);

    fn http_listener() -> Listener {
        Listener::new(Config {
            local_port: 80,
            ..Default::default()
        })
    }

    fn client_key() -> ConnectionKey {
        ConnectionKey { local_port: 80, remote_ip: CLIENT_IP, remote_port: 50871 }
    }

    /// The client's ACK for `syn_ack`, framed like the SYN it answers.
    fn ack_frame(syn_ack: &TCPHeader, ack_no: Wrap32) -> Vec<u8> {
        let eth = EthernetFrame::parse(&hex::decode(test_utils::get_eth_hex()).unwrap()).unwrap();
        packet::pack(&Outbound {
            link: LinkHeader::Ethernet(eth),
            iph: IPHeader {
                src_ip: CLIENT_IP,
                dst_ip: SERVER_IP,
                ..Default::default()
            },
            tcph: TCPHeader {
                src_port: syn_ack.dst_port,
                dst_port: syn_ack.src_port,
                seq_no: syn_ack.ack_no,
                ack_no,
                flags: TCPFlags::ACK,
                window: 65535,
                ..Default::default()
            },
        })
    }

    #[test]
    fn test_handshake_over_ethernet() {
        let mut listener = http_listener();

        let reply = listener.handle_frame(&test_utils::get_syn_frame()).unwrap().unwrap();
        assert_eq!(reply.len(), 54);

        let inbound = packet::unpack(&reply, LinkType::Ethernet).unwrap();
        let LinkHeader::Ethernet(eth) = inbound.link else {
            panic!("expected an Ethernet header");
        };
        assert_eq!(eth.dst_mac.to_string(), "11:22:33:44:55:66");
        assert_eq!(eth.src_mac.to_string(), "aa:bb:cc:dd:ee:ff");

        assert_eq!(inbound.iph.src_ip, SERVER_IP);
        assert_eq!(inbound.iph.dst_ip, CLIENT_IP);
        assert_eq!(inbound.iph.ttl, 64);
        assert_eq!(inbound.iph.total_len, 40);
        assert_eq!(IPHeader::checksum(&reply[14..34]), 0);
        assert_eq!(TCPHeader::checksum(&reply[34..], SERVER_IP, CLIENT_IP), 0);

        let syn_ack = inbound.tcph;
        assert_eq!(syn_ack.flags, TCPFlags::SYN | TCPFlags::ACK);
        assert_eq!(syn_ack.ack_no, Wrap32::new(2753993876));
        assert_eq!(syn_ack.src_port, 80);
        assert_eq!(syn_ack.dst_port, 50871);

        let conn = listener.connection(&client_key()).unwrap();
        assert_eq!(conn.state, TCPState::SynRcvd);
        assert_eq!(conn.local_ip, SERVER_IP);

        let reply = listener.handle_frame(&ack_frame(&syn_ack, syn_ack.seq_no + 1u32)).unwrap();
        assert!(reply.is_none());
        assert_eq!(listener.connection(&client_key()).unwrap().state, TCPState::Established);
    }

    #[test]
    fn test_wrong_ack_is_ignored() {
        let mut listener = http_listener();
        let reply = listener.handle_frame(&test_utils::get_syn_frame()).unwrap().unwrap();
        let syn_ack = packet::unpack(&reply, LinkType::Ethernet).unwrap().tcph;

        let frame = ack_frame(&syn_ack, syn_ack.seq_no + 7u32);
        assert!(listener.handle_frame(&frame).unwrap().is_none());
        assert!(matches!(listener.process_frame(&frame), Err(TcpError::InvalidAckNumber { .. })));
        assert_eq!(listener.connection(&client_key()).unwrap().state, TCPState::SynRcvd);
    }

    #[test]
    fn test_other_port_is_dropped() {
        let mut listener = Listener::new(Config::default());

        assert!(listener.handle_frame(&test_utils::get_syn_frame()).unwrap().is_none());
        assert_eq!(listener.connections().count(), 0);
    }

    #[test]
    fn test_malformed_frame_is_dropped() {
        let mut listener = http_listener();
        let frame = test_utils::get_syn_frame();

        assert!(listener.handle_frame(&frame[..40]).unwrap().is_none());
        assert!(matches!(listener.process_frame(&frame[..40]), Err(TcpError::HeaderError(_))));
        assert_eq!(listener.connections().count(), 0);
    }

    #[test]
    fn test_ack_without_connection_is_dropped() {
        let mut listener = http_listener();
        let syn_ack = TCPHeader {
            src_port: 80,
            dst_port: 50871,
            ..Default::default()
        };

        assert!(listener.handle_frame(&ack_frame(&syn_ack, Wrap32::new(1))).unwrap().is_none());
        assert_eq!(listener.connections().count(), 0);
    }

    #[test]
    fn test_repeated_syn_is_ignored() {
        let mut listener = http_listener();
        let frame = test_utils::get_syn_frame();

        assert!(listener.handle_frame(&frame).unwrap().is_some());
        let before = listener.connection(&client_key()).unwrap().clone();

        assert!(listener.handle_frame(&frame).unwrap().is_none());
        assert_eq!(listener.connection(&client_key()).unwrap(), &before);
    }

    #[test]
    fn test_connections_per_remote_endpoint() {
        let mut listener = http_listener();
        let mut frame = test_utils::get_syn_frame();
        listener.handle_frame(&frame).unwrap().unwrap();

        // Same client, different source port
        frame[34..36].copy_from_slice(&50872u16.to_be_bytes());
        listener.handle_frame(&frame).unwrap().unwrap();

        assert_eq!(listener.connections().count(), 2);
        assert!(listener.connections().all(|conn| conn.state == TCPState::SynRcvd));
    }

    #[test]
    fn test_handshake_over_loopback() {
        let mut listener = Listener::new(Config {
            local_port: 80,
            link: LinkType::Loopback,
            ..Default::default()
        });
        let frame = [
            hex::decode("02000000").unwrap(),
            hex::decode(test_utils::get_ip_hex()).unwrap(),
            hex::decode(test_utils::get_tcp_hex()).unwrap(),
        ]
        .concat();

        let reply = listener.handle_frame(&frame).unwrap().unwrap();
        assert_eq!(reply.len(), 44);
        assert_eq!(reply[..4], [0x02u8, 0x00, 0x00, 0x00]);

        let inbound = packet::unpack(&reply, LinkType::Loopback).unwrap();
        assert_eq!(inbound.tcph.flags, TCPFlags::SYN | TCPFlags::ACK);
        assert_eq!(TCPHeader::checksum(&reply[24..], SERVER_IP, CLIENT_IP), 0);
    }

    #[test]
    fn test_full_table_drops_new_syns() {
        let mut listener = Listener::new(Config {
            local_port: 80,
            max_connections: 3,
            ..Default::default()
        });
        let mut frame = test_utils::get_syn_frame();

        for src_port in 1..=3u16 {
            frame[34..36].copy_from_slice(&src_port.to_be_bytes());
            assert!(listener.handle_frame(&frame).unwrap().is_some());
        }
        assert_eq!(listener.connections().count(), 3);

        frame[34..36].copy_from_slice(&4u16.to_be_bytes());
        assert!(listener.handle_frame(&frame).unwrap().is_none());
        assert!(listener.process_frame(&frame).unwrap().is_none());
        assert_eq!(listener.connections().count(), 3);
        let key = ConnectionKey { local_port: 80, remote_ip: CLIENT_IP, remote_port: 4 };
        assert!(listener.connection(&key).is_none());

        // Known endpoints still complete the handshake
        let key = ConnectionKey { local_port: 80, remote_ip: CLIENT_IP, remote_port: 1 };
        let conn = listener.connection(&key).unwrap().clone();
        let syn_ack = TCPHeader {
            src_port: 80,
            dst_port: 1,
            seq_no: conn.send_seq,
            ack_no: conn.send_ack,
            ..Default::default()
        };
        assert!(listener.handle_frame(&ack_frame(&syn_ack, conn.send_seq + 1u32)).unwrap().is_none());
        assert_eq!(listener.connection(&key).unwrap().state, TCPState::Established);
    }

    #[test]
    fn test_entropy_failure_leaves_no_entry() {
        let config = Config {
            local_port: 80,
            ..Default::default()
        };
        let mut listener = Listener::with_rng(config, Box::new(BrokenRng));

        let err = listener.handle_frame(&test_utils::get_syn_frame()).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(listener.connections().count(), 0);
        assert!(listener.connection(&client_key()).is_none());
    }
}
