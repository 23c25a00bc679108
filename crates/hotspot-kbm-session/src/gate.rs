use std::net::{IpAddr, Shutdown, TcpStream};
use std::sync::Mutex;

use tracing::info;

/// Handle the gate uses to tear down a client's control channel on
/// [`SessionGate::disconnect`]. Closing is best-effort and must not block.
pub trait ControlChannel: Send {
    fn close(&self);
}

impl ControlChannel for TcpStream {
    fn close(&self) {
        let _ = self.shutdown(Shutdown::Both);
    }
}

struct ActiveSession {
    peer: IpAddr,
    channel: Box<dyn ControlChannel>,
}

/// Single-client session gate.
///
/// Exactly one instance exists process-wide; the network receivers hold
/// read-only handles and consult [`is_authorized`](SessionGate::is_authorized)
/// before forwarding any input. All operations share one mutex, so an
/// acceptance and a concurrent authorization check serialize.
#[derive(Default)]
pub struct SessionGate {
    inner: Mutex<Option<ActiveSession>>,
}

impl SessionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `peer` as the connected client. Fails (returns false) when a
    /// session is already active; the existing session is untouched.
    pub fn try_connect(&self, peer: IpAddr, channel: Box<dyn ControlChannel>) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if inner.is_some() {
            return false;
        }
        *inner = Some(ActiveSession { peer, channel });
        info!("[Session] Client connected: {peer}");
        true
    }

    /// Drop the active session, closing its control channel best-effort.
    /// No-op when already disconnected.
    pub fn disconnect(&self) {
        let session = self.inner.lock().unwrap().take();
        if let Some(session) = session {
            session.channel.close();
            info!("[Session] Client disconnected: {}", session.peer);
        }
    }

    pub fn is_connected(&self) -> bool {
        self.inner.lock().unwrap().is_some()
    }

    /// True iff a session is active and `ip` is its peer. This is the filter
    /// the UDP receiver applies to every datagram.
    pub fn is_authorized(&self, ip: IpAddr) -> bool {
        matches!(&*self.inner.lock().unwrap(), Some(s) if s.peer == ip)
    }

    pub fn active_peer(&self) -> Option<IpAddr> {
        self.inner.lock().unwrap().as_ref().map(|s| s.peer)
    }
}
