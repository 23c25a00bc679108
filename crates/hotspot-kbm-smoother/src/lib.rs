//! Capacitor-style input smoothing.
//!
//! Pointer and scroll packets arrive over UDP with network jitter: bursts,
//! gaps, loss. Feeding them straight into uinput reproduces that jitter on
//! screen. Instead, each incoming delta charges a per-axis buffer, and a
//! dedicated worker discharges a fraction of the buffer every frame at a
//! fixed rate:
//!
//! ```text
//! UDP receiver ──add_movement()──►  charge ─┐
//!                                           │ discharge loop (60 Hz)
//!                                           ▼
//!                             out = charge · rate(|charge|)
//!                             subpixel carry → integer delta ──► PointerSink
//! ```
//!
//! The discharge rate adapts to the stored magnitude (fast response to
//! flicks, smooth glide on precise work), fractional residue is carried
//! between frames so sub-unit drifts still reach the cursor, and a short
//! momentum tail hides UDP gaps after input stops. A direction reversal
//! zeroes the tracked velocity so no stale momentum bleeds through.
//!
//! [`InputSmoother`] handles pointer motion; [`ScrollSmoother`] is the same
//! capacitor adapted to wheel ticks, with a longer flick-style momentum
//! phase in place of the pointer's ease-out continuation.

mod pointer;
mod scroll;

pub use pointer::InputSmoother;
pub use scroll::ScrollSmoother;

/// Narrow capability handle the smoothers discharge into.
///
/// Implemented by the server over the virtual mouse; injected at
/// construction so the smoothers never see a device. Calls happen with the
/// smoother lock held, which serialises all writes to the mouse device from
/// the discharge threads.
pub trait PointerSink: Send + Sync {
    fn move_rel(&self, dx: i32, dy: i32);
    fn scroll(&self, vertical: i32, horizontal: i32);
}
