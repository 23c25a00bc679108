use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info};

use hotspot_kbm_core::{NetError, ServerConfig, DISCOVERY_MAGIC, DISCOVERY_RESPONSE_HEADER};
use hotspot_kbm_session::SessionGate;

const RECV_TIMEOUT: Duration = Duration::from_secs(1);

/// UDP discovery responder.
///
/// Answers the fixed magic probe with a newline-joined advert carrying the
/// server name, its IPv4 address, and the control port. Adverts are only
/// sent while no client session is active, so a paired server goes quiet
/// on the network.
pub struct DiscoveryResponder {
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    local_addr: SocketAddr,
}

impl DiscoveryResponder {
    /// Bind the discovery port on all interfaces and start the responder
    /// thread.
    pub fn start(
        config: &ServerConfig,
        server_ip: Ipv4Addr,
        session: Arc<SessionGate>,
    ) -> Result<Self, NetError> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, config.discovery_port)).map_err(
            |source| NetError::Bind {
                listener: "discovery",
                port: config.discovery_port,
                source,
            },
        )?;
        socket.set_broadcast(true)?;
        socket.set_read_timeout(Some(RECV_TIMEOUT))?;
        let local_addr = socket.local_addr()?;

        let response = build_response(&config.server_name, server_ip, config.control_port);
        let running = Arc::new(AtomicBool::new(true));
        let worker = {
            let running = Arc::clone(&running);
            thread::Builder::new()
                .name("discovery".into())
                .spawn(move || listen_loop(socket, response, session, running))
                .map_err(NetError::Io)?
        };

        info!("[Discovery] Responder listening on UDP {}", local_addr.port());
        Ok(Self {
            running,
            worker: Some(worker),
            local_addr,
        })
    }

    /// Actual bound port (differs from the configured one when it was 0).
    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for DiscoveryResponder {
    fn drop(&mut self) {
        self.stop();
    }
}

fn build_response(server_name: &str, server_ip: Ipv4Addr, control_port: u16) -> String {
    [
        DISCOVERY_RESPONSE_HEADER,
        server_name,
        &server_ip.to_string(),
        &control_port.to_string(),
        "AUTH_REQUIRED=true",
    ]
    .join("\n")
}

fn listen_loop(
    socket: UdpSocket,
    response: String,
    session: Arc<SessionGate>,
    running: Arc<AtomicBool>,
) {
    let mut buf = [0u8; 1024];

    while running.load(Ordering::Relaxed) {
        match socket.recv_from(&mut buf) {
            Ok((len, addr)) => {
                let message = String::from_utf8_lossy(&buf[..len]);
                if message.trim() != DISCOVERY_MAGIC {
                    continue;
                }
                if session.is_connected() {
                    debug!("[Discovery] Ignoring probe from {addr} (client already connected)");
                    continue;
                }
                match socket.send_to(response.as_bytes(), addr) {
                    Ok(_) => info!("[Discovery] Sent advert to {addr}"),
                    Err(e) => error!("[Discovery] Failed to answer {addr}: {e}"),
                }
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => continue,
            Err(e) => {
                if running.load(Ordering::Relaxed) {
                    error!("[Discovery] Socket error: {e}");
                }
                break;
            }
        }
    }
}

/// Detect the primary LAN IPv4 address by probing an external socket.
///
/// No packets are actually sent — this just queries the OS routing table.
pub fn detect_local_ip() -> Ipv4Addr {
    UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .and_then(|s| {
            s.connect("8.8.8.8:80")?;
            s.local_addr()
        })
        .map(|a| match a.ip() {
            IpAddr::V4(ip) => ip,
            IpAddr::V6(_) => Ipv4Addr::LOCALHOST,
        })
        .unwrap_or(Ipv4Addr::LOCALHOST)
}
