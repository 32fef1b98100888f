use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TCPState {
    // -- Opening states --
    Listen,  // Waiting for SYN
    SynRcvd, // SYN received, expecting ACK
    SynSent, // SYN sent, waiting for SYN-ACK

    // -- Steady state; opened --
    Established, // Connection established, exchanging data

    // -- Passive close states --
    CloseWait, // FIN received, waiting for application to close
    LastAck,   // FIN sent, waiting for ACK

    // -- Active close states --
    FinWait1, // FIN sent, waiting for ACK of FIN or FIN from peer
    FinWait2, // FIN acknowledged, waiting for FIN from peer
    Closing,  // Both FINs sent, waiting for final ACK
    TimeWait, // Connection in TIME-WAIT after both FIN and ACK
    Closed,   // Connection closed normally
}

impl fmt::Display for TCPState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TCPState::Listen => "LISTEN",
            TCPState::SynRcvd => "SYN-RECEIVED",
            TCPState::SynSent => "SYN-SENT",
            TCPState::Established => "ESTABLISHED",
            TCPState::CloseWait => "CLOSE-WAIT",
            TCPState::LastAck => "LAST-ACK",
            TCPState::FinWait1 => "FIN-WAIT-1",
            TCPState::FinWait2 => "FIN-WAIT-2",
            TCPState::Closing => "CLOSING",
            TCPState::TimeWait => "TIME-WAIT",
            TCPState::Closed => "CLOSED",
        };
        f.write_str(name)
    }
}

/// The inbound events the state machine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TCPEvent {
    Syn,
    Ack,
    Segment, // Neither SYN nor ACK set
}

impl fmt::Display for TCPEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TCPEvent::Syn => f.write_str("SYN"),
            TCPEvent::Ack => f.write_str("ACK"),
            TCPEvent::Segment => f.write_str("segment"),
        }
    }
}
