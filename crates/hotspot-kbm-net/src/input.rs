use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{error, info};

use hotspot_kbm_core::NetError;
use hotspot_kbm_session::SessionGate;

const RECV_TIMEOUT: Duration = Duration::from_secs(1);
// MOVE/SCROLL datagrams are tiny; anything longer is garbage anyway.
const RECV_BUF: usize = 256;

/// Forwarding handles for decoded input packets.
///
/// The listener never sees a smoother or a device, only these two hooks
/// injected by the server at startup.
pub struct InputHandlers {
    pub on_move: Box<dyn Fn(i32, i32) + Send>,
    pub on_scroll: Box<dyn Fn(i32, i32) + Send>,
}

/// UDP receiver for the pointer/scroll stream.
///
/// Every datagram is source-filtered through the session gate before it is
/// even parsed: packets from anyone but the connected peer vanish without a
/// log line, so a scanning host learns nothing.
pub struct UdpInputListener {
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    local_addr: SocketAddr,
}

impl UdpInputListener {
    pub fn start(
        port: u16,
        session: Arc<SessionGate>,
        handlers: InputHandlers,
    ) -> Result<Self, NetError> {
        let socket =
            UdpSocket::bind((Ipv4Addr::UNSPECIFIED, port)).map_err(|source| NetError::Bind {
                listener: "udp-input",
                port,
                source,
            })?;
        socket.set_read_timeout(Some(RECV_TIMEOUT))?;
        let local_addr = socket.local_addr()?;

        let running = Arc::new(AtomicBool::new(true));
        let worker = {
            let running = Arc::clone(&running);
            thread::Builder::new()
                .name("udp-input".into())
                .spawn(move || listen_loop(socket, session, handlers, running))
                .map_err(NetError::Io)?
        };

        info!("[Input] UDP listener on port {}", local_addr.port());
        Ok(Self {
            running,
            worker: Some(worker),
            local_addr,
        })
    }

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

impl Drop for UdpInputListener {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputCommand {
    Move(i32, i32),
    Scroll(i32, i32),
}

/// Decode one datagram. Exactly three whitespace-separated tokens, verb
/// case-insensitive, both values signed integers; anything else is `None`.
fn parse_datagram(data: &[u8]) -> Option<InputCommand> {
    let message = String::from_utf8_lossy(data);
    let tokens: Vec<&str> = message.split_whitespace().collect();
    if tokens.len() != 3 {
        return None;
    }
    let v1: i32 = tokens[1].parse().ok()?;
    let v2: i32 = tokens[2].parse().ok()?;
    match tokens[0].to_ascii_uppercase().as_str() {
        "MOVE" => Some(InputCommand::Move(v1, v2)),
        "SCROLL" => Some(InputCommand::Scroll(v1, v2)),
        _ => None,
    }
}

fn listen_loop(
    socket: UdpSocket,
    session: Arc<SessionGate>,
    handlers: InputHandlers,
    running: Arc<AtomicBool>,
) {
    let mut buf = [0u8; RECV_BUF];

    while running.load(Ordering::Relaxed) {
        match socket.recv_from(&mut buf) {
            Ok((len, addr)) => {
                if !session.is_authorized(addr.ip()) {
                    continue;
                }
                match parse_datagram(&buf[..len]) {
                    Some(InputCommand::Move(dx, dy)) => (handlers.on_move)(dx, dy),
                    Some(InputCommand::Scroll(v, h)) => (handlers.on_scroll)(v, h),
                    None => {}
                }
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => continue,
            Err(e) => {
                if running.load(Ordering::Relaxed) {
                    error!("[Input] UDP socket error: {e}");
                }
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct NopChannel;
    impl hotspot_kbm_session::ControlChannel for NopChannel {
        fn close(&self) {}
    }

    #[test]
    fn parses_well_formed_packets() {
        assert_eq!(parse_datagram(b"MOVE 5 -3"), Some(InputCommand::Move(5, -3)));
        assert_eq!(parse_datagram(b"move 1 2"), Some(InputCommand::Move(1, 2)));
        assert_eq!(parse_datagram(b"SCROLL -1 0"), Some(InputCommand::Scroll(-1, 0)));
        assert_eq!(parse_datagram(b"  MOVE  7   8  "), Some(InputCommand::Move(7, 8)));
    }

    #[test]
    fn rejects_malformed_packets() {
        assert_eq!(parse_datagram(b""), None);
        assert_eq!(parse_datagram(b"MOVE 5"), None, "too few tokens");
        assert_eq!(parse_datagram(b"MOVE 5 6 7"), None, "too many tokens");
        assert_eq!(parse_datagram(b"MOVE x y"), None, "non-integer values");
        assert_eq!(parse_datagram(b"MOVE 5.5 1"), None, "floats are not integers");
        assert_eq!(parse_datagram(b"JUMP 1 2"), None, "unknown verb");
        assert_eq!(parse_datagram(&[0xff, 0xfe, 0x20, 0x31]), None, "invalid UTF-8");
    }

    fn recording_handlers() -> (InputHandlers, Arc<Mutex<Vec<InputCommand>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let moves = Arc::clone(&log);
        let scrolls = Arc::clone(&log);
        let handlers = InputHandlers {
            on_move: Box::new(move |dx, dy| moves.lock().unwrap().push(InputCommand::Move(dx, dy))),
            on_scroll: Box::new(move |v, h| {
                scrolls.lock().unwrap().push(InputCommand::Scroll(v, h))
            }),
        };
        (handlers, log)
    }

    #[test]
    fn authorized_packets_are_forwarded() {
        let session = Arc::new(SessionGate::new());
        session.try_connect("127.0.0.1".parse().unwrap(), Box::new(NopChannel));

        let (handlers, log) = recording_handlers();
        let mut listener =
            UdpInputListener::start(0, session, handlers).expect("bind input listener");

        let client = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let target = (Ipv4Addr::LOCALHOST, listener.port());
        client.send_to(b"MOVE 10 -4", target).unwrap();
        client.send_to(b"SCROLL 2 0", target).unwrap();
        client.send_to(b"MOVE not ints", target).unwrap();

        thread::sleep(Duration::from_millis(300));
        listener.stop();

        let log = log.lock().unwrap();
        assert_eq!(
            log.as_slice(),
            &[InputCommand::Move(10, -4), InputCommand::Scroll(2, 0)]
        );
    }

    #[test]
    fn packets_from_strangers_are_dropped() {
        let session = Arc::new(SessionGate::new());
        // The connected peer is someone else entirely.
        session.try_connect("10.1.2.3".parse().unwrap(), Box::new(NopChannel));

        let (handlers, log) = recording_handlers();
        let mut listener =
            UdpInputListener::start(0, session, handlers).expect("bind input listener");

        let client = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        client
            .send_to(b"MOVE 10 10", (Ipv4Addr::LOCALHOST, listener.port()))
            .unwrap();

        thread::sleep(Duration::from_millis(300));
        listener.stop();

        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn disconnected_session_drops_everything() {
        let session = Arc::new(SessionGate::new());
        let (handlers, log) = recording_handlers();
        let mut listener =
            UdpInputListener::start(0, session, handlers).expect("bind input listener");

        let client = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        client
            .send_to(b"MOVE 1 1", (Ipv4Addr::LOCALHOST, listener.port()))
            .unwrap();

        thread::sleep(Duration::from_millis(300));
        listener.stop();

        assert!(log.lock().unwrap().is_empty());
    }
}
