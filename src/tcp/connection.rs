use std::net::Ipv4Addr;
use rand::rngs::OsRng;
use rand::RngCore;
use crate::tcp::errors::TcpError;
use crate::tcp::state::{TCPEvent, TCPState};
use crate::tcp::tcp_flags::TCPFlags;
use crate::tcp::tcp_header::{TCPHeader, DATA_OFFSET};
use crate::tcp::wrap32::Wrap32;

/// Identifies one connection in a caller-owned table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionKey {
    pub local_port: u16,
    pub remote_ip: Ipv4Addr,
    pub remote_port: u16,
}

/// State of one passive TCP endpoint. Handlers take `&mut self`, so they run serially.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub state: TCPState,
    pub local_ip: Ipv4Addr,
    pub local_port: u16,
    pub remote_ip: Ipv4Addr,
    pub remote_port: u16,
    pub send_seq: Wrap32, // Next seq_no we send
    pub recv_seq: Wrap32, // Next seq_no expected from the peer
    pub send_ack: Wrap32, // Last ack_no we sent
    pub window: u16,      // Advertised in every reply
}

impl Connection {
    /// A connection in LISTEN on `local_ip:local_port`.
    pub fn listen(local_ip: Ipv4Addr, local_port: u16, window: u16) -> Self {
        Connection {
            state: TCPState::Listen,
            local_ip,
            local_port,
            remote_ip: Ipv4Addr::UNSPECIFIED,
            remote_port: 0,
            send_seq: Wrap32::new(0),
            recv_seq: Wrap32::new(0),
            send_ack: Wrap32::new(0),
            window,
        }
    }

    pub fn key(&self) -> ConnectionKey {
        ConnectionKey {
            local_port: self.local_port,
            remote_ip: self.remote_ip,
            remote_port: self.remote_port,
        }
    }

    /// Dispatch an inbound segment. SYN takes precedence over ACK.
    pub fn on_segment(&mut self, segment: &TCPHeader, remote_ip: Ipv4Addr) -> Result<Option<TCPHeader>, TcpError> {
        self.on_segment_with(&mut OsRng, segment, remote_ip)
    }

    /// Same as `on_segment` with any ISN drawn from `rng`.
    pub fn on_segment_with<R: RngCore + ?Sized>(
        &mut self,
        rng: &mut R,
        segment: &TCPHeader,
        remote_ip: Ipv4Addr,
    ) -> Result<Option<TCPHeader>, TcpError> {
        if segment.flags.contains(TCPFlags::SYN) {
            self.on_syn_with(rng, segment, remote_ip, segment.src_port)
        } else if segment.flags.contains(TCPFlags::ACK) {
            self.on_ack(segment)
        } else {
            Err(self.mismatch(TCPEvent::Segment))
        }
    }

    /// Handle a SYN, answering with a SYN-ACK. The ISN comes from the OS CSPRNG.
    pub fn on_syn(&mut self, segment: &TCPHeader, remote_ip: Ipv4Addr, remote_port: u16) -> Result<Option<TCPHeader>, TcpError> {
        self.on_syn_with(&mut OsRng, segment, remote_ip, remote_port)
    }

    /// Same as `on_syn` with the ISN drawn from `rng`.
    pub fn on_syn_with<R: RngCore + ?Sized>(
        &mut self,
        rng: &mut R,
        segment: &TCPHeader,
        remote_ip: Ipv4Addr,
        remote_port: u16,
    ) -> Result<Option<TCPHeader>, TcpError> {
        match self.state {
            TCPState::Listen => self.listen_on_syn(rng, segment, remote_ip, remote_port).map(Some),
            _ => Err(self.mismatch(TCPEvent::Syn)),
        }
    }

    /// Handle an ACK completing the handshake. Never produces a reply.
    pub fn on_ack(&mut self, segment: &TCPHeader) -> Result<Option<TCPHeader>, TcpError> {
        match self.state {
            TCPState::SynRcvd => self.syn_rcvd_on_ack(segment).map(|_| None),
            _ => Err(self.mismatch(TCPEvent::Ack)),
        }
    }

    fn listen_on_syn<R: RngCore + ?Sized>(
        &mut self,
        rng: &mut R,
        segment: &TCPHeader,
        remote_ip: Ipv4Addr,
        remote_port: u16,
    ) -> Result<TCPHeader, TcpError> {
        // Nothing is mutated unless an ISN could be drawn
        let isn = initial_seq_no(rng)?;

        self.state = TCPState::SynRcvd;
        self.remote_ip = remote_ip;
        self.remote_port = remote_port;
        self.send_seq = isn;
        self.recv_seq = segment.seq_no + 1u32; // SYN consumes one seq_no
        self.send_ack = self.recv_seq;

        Ok(self.segment(TCPFlags::SYN | TCPFlags::ACK))
    }

    fn syn_rcvd_on_ack(&mut self, segment: &TCPHeader) -> Result<(), TcpError> {
        let expected = self.send_seq + 1u32;
        if segment.ack_no != expected {
            return Err(TcpError::InvalidAckNumber {
                expected,
                got: segment.ack_no,
            });
        }

        self.state = TCPState::Established;
        self.send_seq = expected; // Our SYN consumed one seq_no
        Ok(())
    }

    /// Build an outbound segment from the current connection state.
    fn segment(&self, flags: TCPFlags) -> TCPHeader {
        TCPHeader {
            src_port: self.local_port,
            dst_port: self.remote_port,
            seq_no: self.send_seq,
            ack_no: self.send_ack,
            data_offset: DATA_OFFSET,
            flags,
            window: self.window,
        }
    }

    fn mismatch(&self, event: TCPEvent) -> TcpError {
        TcpError::InvalidState { state: self.state, event }
    }
}

/// Draw an unpredictable initial sequence number.
fn initial_seq_no<R: RngCore + ?Sized>(rng: &mut R) -> Result<Wrap32, rand::Error> {
    let mut buf = [0u8; 4];
    rng.try_fill_bytes(&mut buf)?;
    Ok(Wrap32::new(u32::from_be_bytes(buf)))
}

// -- Unit tests --
