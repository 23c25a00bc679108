//! Server orchestration: wires the gates, smoothers, devices, and listeners
//! together and owns their lifecycle.
//!
//! Component graph (arrows = runtime data flow):
//!
//! ```text
//! DiscoveryResponder ──(is_connected?)──► SessionGate
//! UdpInputListener ──(is_authorized?)──► SessionGate
//!                  ──MOVE──►  InputSmoother ─┐
//!                  ──SCROLL─► ScrollSmoother ─┤──► VirtualMouse
//! TcpControlListener ──AUTH──► AuthGate + SessionGate
//!                    ──CLICK─► VirtualMouse
//!                    ──KEY───► VirtualKeyboard
//! ```

use std::net::{IpAddr, Ipv4Addr, TcpStream};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use hotspot_kbm_core::{KeyState, MouseButton, PointerTuning, ScrollTuning, ServerConfig};
use hotspot_kbm_input::{Key, VirtualKeyboard, VirtualMouse};
use hotspot_kbm_net::{
    detect_local_ip, AuthOutcome, ControlEvents, DiscoveryResponder, InputHandlers,
    TcpControlListener, UdpInputListener,
};
use hotspot_kbm_session::{AuthGate, ControlChannel, SessionGate};
use hotspot_kbm_smoother::{InputSmoother, PointerSink, ScrollSmoother};

use crate::banner;

// ── Sink bridge ────────────────────────────────────────────────────────────────

/// Adapts the virtual mouse to the smoother-facing sink trait. Write
/// failures are logged and the event dropped; the device stays up.
struct MouseSink(Arc<VirtualMouse>);

impl PointerSink for MouseSink {
    fn move_rel(&self, dx: i32, dy: i32) {
        if let Err(e) = self.0.move_rel(dx, dy) {
            error!("[Sink] Move failed: {e}");
        }
    }

    fn scroll(&self, vertical: i32, horizontal: i32) {
        if let Err(e) = self.0.scroll(vertical, horizontal) {
            error!("[Sink] Scroll failed: {e}");
        }
    }
}

// ── Core (control-channel side) ────────────────────────────────────────────────

/// State shared with the TCP handler thread.
struct Core {
    auth: AuthGate,
    session: Arc<SessionGate>,
    mouse: Arc<VirtualMouse>,
    keyboard: VirtualKeyboard,
}

impl ControlEvents for Core {
    fn on_auth(&self, stream: &TcpStream, peer: IpAddr, code: &str) -> AuthOutcome {
        if !self.auth.validate(code) {
            warn!("[Auth] Invalid or expired code from {peer}");
            return AuthOutcome::InvalidCode;
        }

        let channel: Box<dyn ControlChannel> = match stream.try_clone() {
            Ok(clone) => Box::new(clone),
            Err(e) => {
                warn!("[Auth] Could not retain control channel for {peer}: {e}");
                return AuthOutcome::InvalidCode;
            }
        };

        if self.session.try_connect(peer, channel) {
            info!("[Auth] Client authenticated: {peer}");
            AuthOutcome::Accepted
        } else {
            warn!("[Auth] Rejected {peer}: another client is connected");
            AuthOutcome::AlreadyConnected
        }
    }

    fn on_click(&self, button: MouseButton, state: KeyState) {
        if let Err(e) = self.mouse.click(button, state) {
            error!("[Sink] Click failed: {e}");
        }
    }

    fn on_key(&self, key: Key, state: KeyState) {
        if let Err(e) = self.keyboard.key(key, state) {
            error!("[Sink] Key failed: {e}");
        }
    }

    fn on_disconnect(&self) {
        self.session.disconnect();
        self.auth.reset();
        let code = self.auth.generate();
        banner::print_pairing_code(&code);
        info!("Waiting for connection...");
    }
}

// ── Server ─────────────────────────────────────────────────────────────────────

/// The assembled server. Construction brings every thread up; `stop`
/// (or drop) tears them down in reverse dependency order.
pub struct Server {
    config: ServerConfig,
    local_ip: Ipv4Addr,
    core: Arc<Core>,
    pointer: Arc<InputSmoother>,
    scroll: Arc<ScrollSmoother>,
    discovery: DiscoveryResponder,
    udp: UdpInputListener,
    tcp: TcpControlListener,
}

impl Server {
    pub fn start(config: ServerConfig) -> Result<Self> {
        info!("Creating virtual input devices...");
        let mouse = Arc::new(VirtualMouse::create().context("virtual mouse")?);
        let keyboard = VirtualKeyboard::create().context("virtual keyboard")?;

        let sink: Arc<dyn PointerSink> = Arc::new(MouseSink(Arc::clone(&mouse)));
        let pointer = Arc::new(InputSmoother::new(Arc::clone(&sink), PointerTuning::default()));
        let scroll = Arc::new(ScrollSmoother::new(sink, ScrollTuning::default()));
        pointer.start();
        scroll.start();

        let auth = AuthGate::new(config.auth_timeout());
        auth.generate();
        let session = Arc::new(SessionGate::new());
        let core = Arc::new(Core {
            auth,
            session: Arc::clone(&session),
            mouse,
            keyboard,
        });

        let local_ip = detect_local_ip();
        let discovery = DiscoveryResponder::start(&config, local_ip, Arc::clone(&session))
            .context("discovery responder")?;

        let udp = {
            let pointer = Arc::clone(&pointer);
            let scroll = Arc::clone(&scroll);
            UdpInputListener::start(
                config.input_port,
                Arc::clone(&session),
                InputHandlers {
                    on_move: Box::new(move |dx, dy| pointer.add_movement(dx, dy)),
                    on_scroll: Box::new(move |v, h| scroll.add_scroll(v, h)),
                },
            )
            .context("udp input listener")?
        };

        let tcp = TcpControlListener::start(
            config.control_port,
            Arc::clone(&core) as Arc<dyn ControlEvents>,
        )
        .context("tcp control listener")?;

        Ok(Self {
            config,
            local_ip,
            core,
            pointer,
            scroll,
            discovery,
            udp,
            tcp,
        })
    }

    pub fn stop(&mut self) {
        info!("Stopping server...");
        self.tcp.stop();
        self.udp.stop();
        self.discovery.stop();
        self.pointer.stop();
        self.scroll.stop();
        self.core.session.disconnect();
        info!("Server stopped");
    }

    // Accessors for the banner.

    pub fn server_name(&self) -> &str {
        &self.config.server_name
    }

    pub fn local_ip(&self) -> Ipv4Addr {
        self.local_ip
    }

    pub fn discovery_port(&self) -> u16 {
        self.discovery.port()
    }

    pub fn input_port(&self) -> u16 {
        self.udp.port()
    }

    pub fn control_port(&self) -> u16 {
        self.tcp.port()
    }

    pub fn pairing_code(&self) -> Option<String> {
        self.core.auth.current_code()
    }
}
