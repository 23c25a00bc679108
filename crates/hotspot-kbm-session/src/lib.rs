//! Pairing and session state machines.
//!
//! Two small gates guard the input pipeline:
//!
//! - [`AuthGate`] owns the 6-digit pairing code shown on the server console.
//!   A client must echo it over the TCP control channel within the validity
//!   window to authenticate.
//! - [`SessionGate`] enforces the at-most-one-connected-client invariant.
//!   While a session is active, only packets from its peer IP reach the
//!   virtual devices, and discovery probes go unanswered.
//!
//! Both are cheap state holders behind their own mutex; neither performs
//! network I/O beyond the best-effort channel close on disconnect.

mod auth;
mod gate;

pub use auth::AuthGate;
pub use gate::{ControlChannel, SessionGate};
