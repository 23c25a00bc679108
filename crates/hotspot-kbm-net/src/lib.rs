//! Network front-end: the three listeners a handheld talks to.
//!
//! ```text
//! Handheld                              Server (this crate)
//! ───────────────────────────────────   ─────────────────────────────────────
//! discovery probe   ──UDP:5000──►  DiscoveryResponder ── advert when idle
//! MOVE / SCROLL     ──UDP:5001──►  UdpInputListener   ── deltas → smoothers
//! AUTH / CLICK / KEY ─TCP:5002──►  TcpControlListener ── ControlEvents trait
//! ```
//!
//! Each listener owns one daemon-style thread with a 1 s socket timeout so a
//! shared `running` flag is observed promptly. The TCP accept loop handles
//! its client inline, which is what guarantees single-client behaviour at
//! the transport layer; a second connection waits in the backlog until the
//! first handler returns.
//!
//! Malformed traffic never propagates: undecodable datagrams, unknown verbs,
//! bad integers, and out-of-keymap key names are all dropped silently, per
//! the drop-and-continue error model.

mod control;
mod discovery;
mod input;

pub use control::{AuthOutcome, ControlEvents, TcpControlListener};
pub use discovery::{detect_local_ip, DiscoveryResponder};
pub use input::{InputHandlers, UdpInputListener};
