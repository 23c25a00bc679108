use std::io::{ErrorKind, Read, Write};
use std::net::{IpAddr, Ipv4Addr, Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{error, info, warn};

use hotspot_kbm_core::{
    KeyState, MouseButton, NetError, AUTH_FAIL_ALREADY_CONNECTED, AUTH_FAIL_INVALID_CODE, AUTH_OK,
};
use hotspot_kbm_input::{keymap, Key};

const READ_TIMEOUT: Duration = Duration::from_secs(1);
const ACCEPT_POLL: Duration = Duration::from_millis(100);
const READ_CHUNK: usize = 1024;

/// Result of an AUTH attempt, decided by the server behind
/// [`ControlEvents::on_auth`]. The handler turns it into the wire reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Accepted,
    InvalidCode,
    AlreadyConnected,
}

/// Callbacks from the control channel into the server.
///
/// `on_auth` receives the client stream so the server can register a clone
/// of it with the session gate; everything else is fire-and-forget. Key
/// names have already been resolved against the static keymap and button
/// and state tokens validated when these fire.
pub trait ControlEvents: Send + Sync {
    fn on_auth(&self, stream: &TcpStream, peer: IpAddr, code: &str) -> AuthOutcome;
    fn on_click(&self, button: MouseButton, state: KeyState);
    fn on_key(&self, key: Key, state: KeyState);
    fn on_disconnect(&self);
}

/// TCP control server: authentication plus the reliable click/key path.
///
/// Serves clients strictly one at a time: the accept thread runs the
/// client handler inline and only returns to `accept` once the client is
/// gone. A second connection completes its handshake into the backlog and
/// waits there unserved.
pub struct TcpControlListener {
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    local_addr: SocketAddr,
}

impl TcpControlListener {
    pub fn start(port: u16, events: Arc<dyn ControlEvents>) -> Result<Self, NetError> {
        let listener =
            TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).map_err(|source| NetError::Bind {
                listener: "tcp-control",
                port,
                source,
            })?;
        // Non-blocking accept lets the loop poll the running flag; client
        // sockets are switched back to blocking with a read timeout.
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        let running = Arc::new(AtomicBool::new(true));
        let worker = {
            let running = Arc::clone(&running);
            thread::Builder::new()
                .name("tcp-control".into())
                .spawn(move || accept_loop(listener, events, running))
                .map_err(NetError::Io)?
        };

        info!("[Control] TCP listener on port {}", local_addr.port());
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

impl Drop for TcpControlListener {
    fn drop(&mut self) {
        self.stop();
    }
}

fn accept_loop(listener: TcpListener, events: Arc<dyn ControlEvents>, running: Arc<AtomicBool>) {
    while running.load(Ordering::Relaxed) {
        match listener.accept() {
            Ok((stream, addr)) => {
                info!("[Control] Client connected: {addr}");
                // Inline handling: no new accept until this client is done.
                handle_client(stream, addr, &*events, &running);
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
            Err(e) => {
                if running.load(Ordering::Relaxed) {
                    error!("[Control] Accept error: {e}");
                }
                break;
            }
        }
    }
}

fn handle_client(
    mut stream: TcpStream,
    addr: SocketAddr,
    events: &dyn ControlEvents,
    running: &AtomicBool,
) {
    let peer = addr.ip();
    if stream.set_nonblocking(false).is_err()
        || stream.set_read_timeout(Some(READ_TIMEOUT)).is_err()
    {
        warn!("[Control] Could not configure client socket for {peer}");
    }

    let mut buffer: Vec<u8> = Vec::new();
    let mut chunk = [0u8; READ_CHUNK];
    let mut authenticated = false;

    while running.load(Ordering::Relaxed) {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                buffer.extend_from_slice(&chunk[..n]);
                while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=pos).collect();
                    let line = String::from_utf8_lossy(&line[..pos]);
                    process_command(&mut stream, peer, line.trim(), &mut authenticated, events);
                }
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => continue,
            Err(_) => break,
        }
    }

    info!("[Control] Client disconnected: {peer}");
    let _ = stream.shutdown(Shutdown::Both);
    // The departed peer's queued input must not be honoured: the session
    // and auth gates reset before anything else happens.
    events.on_disconnect();
}

fn process_command(
    stream: &mut TcpStream,
    peer: IpAddr,
    line: &str,
    authenticated: &mut bool,
    events: &dyn ControlEvents,
) {
    if line.is_empty() {
        return;
    }
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let verb = tokens[0].to_ascii_uppercase();

    match verb.as_str() {
        "AUTH" if tokens.len() >= 2 => match events.on_auth(stream, peer, tokens[1]) {
            AuthOutcome::Accepted => {
                *authenticated = true;
                send_line(stream, AUTH_OK);
            }
            AuthOutcome::InvalidCode => send_line(stream, AUTH_FAIL_INVALID_CODE),
            AuthOutcome::AlreadyConnected => send_line(stream, AUTH_FAIL_ALREADY_CONNECTED),
        },
        "CLICK" if *authenticated && tokens.len() >= 3 => {
            let button = MouseButton::from_token(&tokens[1].to_ascii_uppercase());
            let state = KeyState::from_token(&tokens[2].to_ascii_uppercase());
            if let (Some(button), Some(state)) = (button, state) {
                events.on_click(button, state);
            }
        }
        "KEY" if *authenticated && tokens.len() >= 3 => {
            let state = KeyState::from_token(&tokens[1].to_ascii_uppercase());
            let key = keymap::lookup(&tokens[2].to_ascii_uppercase());
            if let (Some(state), Some(key)) = (state, key) {
                events.on_key(key, state);
            }
        }
        // Unknown verbs and pre-auth commands are dropped silently.
        _ => {}
    }
}

fn send_line(stream: &mut TcpStream, line: &str) {
    if let Err(e) = stream.write_all(format!("{line}\n").as_bytes()) {
        warn!("[Control] Failed to send '{line}': {e}");
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader};
    use std::sync::Mutex;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        Auth,
        Click(MouseButton, KeyState),
        Key(Key, KeyState),
        Disconnect,
    }

    /// Scripted server side: answers AUTH attempts from a queue and records
    /// everything that reaches it.
    struct MockEvents {
        outcomes: Mutex<Vec<AuthOutcome>>,
        log: Mutex<Vec<Event>>,
    }

    impl MockEvents {
        fn new(outcomes: Vec<AuthOutcome>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes),
                log: Mutex::new(Vec::new()),
            })
        }

        fn log(&self) -> Vec<Event> {
            self.log.lock().unwrap().clone()
        }
    }

    impl ControlEvents for MockEvents {
        fn on_auth(&self, _stream: &TcpStream, _peer: IpAddr, _code: &str) -> AuthOutcome {
            self.log.lock().unwrap().push(Event::Auth);
            let mut outcomes = self.outcomes.lock().unwrap();
            if outcomes.is_empty() {
                AuthOutcome::InvalidCode
            } else {
                outcomes.remove(0)
            }
        }

        fn on_click(&self, button: MouseButton, state: KeyState) {
            self.log.lock().unwrap().push(Event::Click(button, state));
        }

        fn on_key(&self, key: Key, state: KeyState) {
            self.log.lock().unwrap().push(Event::Key(key, state));
        }

        fn on_disconnect(&self) {
            self.log.lock().unwrap().push(Event::Disconnect);
        }
    }

    fn connect(port: u16) -> (TcpStream, BufReader<TcpStream>) {
        let stream = TcpStream::connect((Ipv4Addr::LOCALHOST, port)).expect("connect");
        stream
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let reader = BufReader::new(stream.try_clone().unwrap());
        (stream, reader)
    }

    fn read_line(reader: &mut BufReader<TcpStream>) -> String {
        let mut line = String::new();
        reader.read_line(&mut line).expect("read reply");
        line.trim_end().to_owned()
    }

    #[test]
    fn auth_happy_path_then_commands() {
        let events = MockEvents::new(vec![AuthOutcome::Accepted]);
        let mut listener = TcpControlListener::start(0, events.clone()).expect("bind control");

        let (mut stream, mut reader) = connect(listener.port());
        stream.write_all(b"AUTH 147258\n").unwrap();
        assert_eq!(read_line(&mut reader), AUTH_OK);

        stream.write_all(b"CLICK LEFT DOWN\n").unwrap();
        stream.write_all(b"CLICK left up\n").unwrap();
        stream.write_all(b"KEY DOWN KEY_A\n").unwrap();
        stream.write_all(b"KEY UP KEY_A\n").unwrap();
        // Dropped: bad button, bad state, unknown key, unknown verb.
        stream.write_all(b"CLICK X2 DOWN\n").unwrap();
        stream.write_all(b"CLICK LEFT HELD\n").unwrap();
        stream.write_all(b"KEY DOWN KEY_FNORD\n").unwrap();
        stream.write_all(b"WAVE HELLO THERE\n").unwrap();
        drop(stream);
        drop(reader);

        thread::sleep(Duration::from_millis(300));
        listener.stop();

        assert_eq!(
            events.log(),
            vec![
                Event::Auth,
                Event::Click(MouseButton::Left, KeyState::Down),
                Event::Click(MouseButton::Left, KeyState::Up),
                Event::Key(Key::KEY_A, KeyState::Down),
                Event::Key(Key::KEY_A, KeyState::Up),
                Event::Disconnect,
            ]
        );
    }

    #[test]
    fn bad_code_is_rejected_and_commands_stay_gated() {
        let events = MockEvents::new(vec![AuthOutcome::InvalidCode]);
        let mut listener = TcpControlListener::start(0, events.clone()).expect("bind control");

        let (mut stream, mut reader) = connect(listener.port());
        // Pre-auth commands are dropped without a reply.
        stream.write_all(b"CLICK LEFT DOWN\n").unwrap();
        stream.write_all(b"AUTH 000000\n").unwrap();
        assert_eq!(read_line(&mut reader), AUTH_FAIL_INVALID_CODE);
        stream.write_all(b"KEY DOWN KEY_A\n").unwrap();
        drop(stream);
        drop(reader);

        thread::sleep(Duration::from_millis(300));
        listener.stop();

        assert_eq!(events.log(), vec![Event::Auth, Event::Disconnect]);
    }

    #[test]
    fn second_client_waits_for_the_first() {
        let events = MockEvents::new(vec![
            AuthOutcome::Accepted,
            AuthOutcome::AlreadyConnected,
        ]);
        let mut listener = TcpControlListener::start(0, events.clone()).expect("bind control");

        let (mut first, mut first_reader) = connect(listener.port());
        first.write_all(b"AUTH 111111\n").unwrap();
        assert_eq!(read_line(&mut first_reader), AUTH_OK);

        // Second connection sits in the backlog; its AUTH is not processed
        // while the first client is being served.
        let (mut second, mut second_reader) = connect(listener.port());
        second.write_all(b"AUTH 111111\n").unwrap();
        thread::sleep(Duration::from_millis(300));
        assert_eq!(events.log().len(), 1, "only the first AUTH seen so far");

        // First client leaves; the second gets its turn and is refused.
        drop(first);
        drop(first_reader);
        assert_eq!(read_line(&mut second_reader), AUTH_FAIL_ALREADY_CONNECTED);

        drop(second);
        drop(second_reader);
        thread::sleep(Duration::from_millis(300));
        listener.stop();

        let log = events.log();
        assert_eq!(
            log,
            vec![Event::Auth, Event::Disconnect, Event::Auth, Event::Disconnect]
        );
    }

    #[test]
    fn split_lines_across_reads_are_reassembled() {
        let events = MockEvents::new(vec![AuthOutcome::Accepted]);
        let mut listener = TcpControlListener::start(0, events.clone()).expect("bind control");

        let (mut stream, mut reader) = connect(listener.port());
        stream.write_all(b"AU").unwrap();
        thread::sleep(Duration::from_millis(50));
        stream.write_all(b"TH 123456\nCLICK MID").unwrap();
        thread::sleep(Duration::from_millis(50));
        stream.write_all(b"DLE DOWN\n").unwrap();
        assert_eq!(read_line(&mut reader), AUTH_OK);
        drop(stream);
        drop(reader);

        thread::sleep(Duration::from_millis(300));
        listener.stop();

        assert_eq!(
            events.log(),
            vec![
                Event::Auth,
                Event::Click(MouseButton::Middle, KeyState::Down),
                Event::Disconnect,
            ]
        );
    }
}
