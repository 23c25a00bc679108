use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::debug;

use hotspot_kbm_core::ScrollTuning;

use crate::PointerSink;

// Wheel ticks are coarser than pixels, so the scroll capacitor drains harder
// and flushes earlier than the pointer one.
const FAST_RATE_CAP: f64 = 0.45;
const RESIDUAL_FLUSH: f64 = 0.1;
// Momentum coasting stops once both axes fall below this.
const MOMENTUM_MIN: f64 = 0.2;

/// Scroll capacitor state: vertical and horizontal wheel charge plus the
/// smoothed velocity that drives the flick phase.
#[derive(Debug, Default)]
struct ScrollCapacitor {
    charge_v: f64,
    charge_h: f64,
    subtick_v: f64,
    subtick_h: f64,
    velocity_v: f64,
    velocity_h: f64,
    last_input: Option<Instant>,
    active: bool,
}

impl ScrollCapacitor {
    fn charge(&mut self, vertical: i32, horizontal: i32, now: Instant, tuning: &ScrollTuning) {
        let (dv, dh) = (vertical as f64, horizontal as f64);
        self.charge_v += dv;
        self.charge_h += dh;

        let interval = 1.0 / tuning.target_fps as f64;
        let dt = match self.last_input {
            Some(t) => {
                let dt = now.saturating_duration_since(t).as_secs_f64();
                if dt < 0.001 { interval } else { dt }
            }
            None => interval,
        };
        let frames = (dt * tuning.target_fps as f64).max(1.0);

        // Reversing the wheel kills the flick immediately.
        if dv * self.velocity_v + dh * self.velocity_h < 0.0 {
            self.velocity_v = 0.0;
            self.velocity_h = 0.0;
        }

        let blend = tuning.velocity_blend;
        self.velocity_v = self.velocity_v * (1.0 - blend) + (dv / frames) * blend;
        self.velocity_h = self.velocity_h * (1.0 - blend) + (dh / frames) * blend;

        self.active = true;
        self.last_input = Some(now);
    }

    fn frame(&mut self, now: Instant, tuning: &ScrollTuning) -> (i32, i32) {
        let since_input = match self.last_input {
            Some(t) => now.saturating_duration_since(t).as_secs_f64(),
            None => f64::INFINITY,
        };
        let window = tuning.momentum_window().as_secs_f64();

        let mut out_v = 0.0;
        let mut out_h = 0.0;

        if self.charge_v != 0.0 || self.charge_h != 0.0 {
            let magnitude = self.charge_v.hypot(self.charge_h);
            let base = tuning.discharge_rate;
            let rate = if magnitude > 8.0 {
                (base * 1.8).min(FAST_RATE_CAP)
            } else if magnitude < 2.0 {
                base
            } else {
                base * 1.2
            };

            out_v = self.charge_v * rate;
            out_h = self.charge_h * rate;
            self.charge_v -= out_v;
            self.charge_h -= out_h;

            if self.charge_v.abs() < RESIDUAL_FLUSH {
                out_v += self.charge_v;
                self.charge_v = 0.0;
            }
            if self.charge_h.abs() < RESIDUAL_FLUSH {
                out_h += self.charge_h;
                self.charge_h = 0.0;
            }
        } else if self.active && since_input < window {
            // Flick phase: coast on decaying velocity until it peters out.
            self.velocity_v *= tuning.momentum_decay;
            self.velocity_h *= tuning.momentum_decay;
            if self.velocity_v.abs() < MOMENTUM_MIN && self.velocity_h.abs() < MOMENTUM_MIN {
                self.active = false;
                self.velocity_v = 0.0;
                self.velocity_h = 0.0;
            } else {
                out_v = self.velocity_v;
                out_h = self.velocity_h;
            }
        } else if self.active {
            self.active = false;
            self.velocity_v = 0.0;
            self.velocity_h = 0.0;
        }

        self.subtick_v += out_v;
        self.subtick_h += out_h;
        let int_v = self.subtick_v.trunc();
        let int_h = self.subtick_h.trunc();
        self.subtick_v -= int_v;
        self.subtick_h -= int_h;

        (int_v as i32, int_h as i32)
    }
}

// ── ScrollSmoother ─────────────────────────────────────────────────────────────

struct Shared {
    state: Mutex<ScrollCapacitor>,
    running: AtomicBool,
    tuning: ScrollTuning,
    sink: Arc<dyn PointerSink>,
}

/// Wheel capacitor with its discharge worker. Same model as
/// [`InputSmoother`](crate::InputSmoother), emitting integer wheel ticks and
/// coasting on a flick after input stops.
pub struct ScrollSmoother {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ScrollSmoother {
    pub fn new(sink: Arc<dyn PointerSink>, tuning: ScrollTuning) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(ScrollCapacitor::default()),
                running: AtomicBool::new(false),
                tuning,
                sink,
            }),
            worker: Mutex::new(None),
        }
    }

    pub fn start(&self) {
        if self.shared.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let shared = Arc::clone(&self.shared);
        *self.worker.lock().unwrap() = Some(
            thread::Builder::new()
                .name("scroll-discharge".into())
                .spawn(move || discharge_loop(shared))
                .expect("spawn scroll discharge thread"),
        );
        debug!(
            "[Smoother] Scroll discharge started ({} fps, rate {})",
            self.shared.tuning.target_fps, self.shared.tuning.discharge_rate
        );
    }

    pub fn stop(&self) {
        self.shared.running.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.lock().unwrap().take() {
            let _ = worker.join();
        }
    }

    /// Charge the capacitor with one incoming scroll packet.
    pub fn add_scroll(&self, vertical: i32, horizontal: i32) {
        let now = Instant::now();
        self.shared
            .state
            .lock()
            .unwrap()
            .charge(vertical, horizontal, now, &self.shared.tuning);
    }
}

impl Drop for ScrollSmoother {
    fn drop(&mut self) {
        self.stop();
    }
}

fn discharge_loop(shared: Arc<Shared>) {
    let interval = shared.tuning.frame_interval();

    while shared.running.load(Ordering::Relaxed) {
        let frame_start = Instant::now();
        {
            let mut state = shared.state.lock().unwrap();
            let (v, h) = state.frame(frame_start, &shared.tuning);
            if v != 0 || h != 0 {
                shared.sink.scroll(v, h);
            }
        }
        if let Some(remaining) = interval.checked_sub(frame_start.elapsed()) {
            thread::sleep(remaining);
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn tuning() -> ScrollTuning {
        ScrollTuning::default()
    }

    #[test]
    fn big_flick_discharges_at_the_capped_rate() {
        let tuning = tuning();
        let mut state = ScrollCapacitor::default();
        let t0 = Instant::now();

        state.charge(10, 0, t0, &tuning);
        let (v, h) = state.frame(t0 + tuning.frame_interval(), &tuning);

        // magnitude 10 → rate = min(0.25 · 1.8, 0.45) = 0.45
        assert_eq!(v, 4);
        assert_eq!(h, 0);
    }

    #[test]
    fn mid_charge_uses_the_boosted_base_rate() {
        let tuning = tuning();
        let mut state = ScrollCapacitor::default();
        let t0 = Instant::now();

        state.charge(4, 0, t0, &tuning);
        state.frame(t0 + tuning.frame_interval(), &tuning);

        // magnitude 4 → rate = 0.25 · 1.2 = 0.3, so 1.2 ticks released.
        assert!((state.charge_v - 2.8).abs() < 1e-9, "charge_v = {}", state.charge_v);
    }

    #[test]
    fn flick_coasts_then_stops() {
        let tuning = tuning();
        let mut state = ScrollCapacitor::default();
        let t0 = Instant::now();
        let interval = tuning.frame_interval();

        state.charge(10, 0, t0, &tuning);

        // Drain the charge.
        let mut i = 1;
        while state.charge_v != 0.0 {
            state.frame(t0 + interval * i, &tuning);
            i += 1;
            assert!(i < 120, "charge failed to drain");
        }
        assert!(state.active, "momentum phase should follow the drain");

        // Coasting: velocity decays 10% per frame and keeps emitting.
        let mut coasted = 0i64;
        while state.active {
            let (v, _) = state.frame(t0 + interval * i, &tuning);
            assert!(v >= 0, "coasting must not reverse");
            coasted += v as i64;
            i += 1;
            assert!(i < 600, "momentum failed to stop");
        }
        assert!(coasted > 0, "flick should keep scrolling after input stops");
        assert_eq!(state.velocity_v, 0.0);

        // Once stopped, nothing more comes out.
        let (v, h) = state.frame(t0 + interval * i, &tuning);
        assert_eq!((v, h), (0, 0));
    }

    #[test]
    fn reversal_kills_the_flick() {
        let tuning = tuning();
        let mut state = ScrollCapacitor::default();
        let t0 = Instant::now();

        state.charge(8, 0, t0, &tuning);
        assert!(state.velocity_v > 0.0);

        state.charge(-8, 0, t0 + tuning.frame_interval(), &tuning);
        assert!(state.velocity_v <= 0.0, "velocity_v = {}", state.velocity_v);
    }

    #[test]
    fn axes_are_independent() {
        let tuning = tuning();
        let mut state = ScrollCapacitor::default();
        let t0 = Instant::now();

        state.charge(0, 6, t0, &tuning);
        let mut total_v = 0i64;
        let mut total_h = 0i64;
        for i in 1..=60 {
            let (v, h) = state.frame(t0 + tuning.frame_interval() * i, &tuning);
            total_v += v as i64;
            total_h += h as i64;
        }
        assert_eq!(total_v, 0);
        assert!(total_h >= 6, "horizontal flick must deliver at least the charge");
    }

    #[test]
    fn idle_past_the_window_resets_state() {
        let tuning = tuning();
        let mut state = ScrollCapacitor::default();
        let t0 = Instant::now();

        state.charge(2, 0, t0, &tuning);
        // One second without frames: first frame drains some charge, the
        // rest flushes, and once empty the window has long passed.
        let mut i = 60;
        loop {
            let _ = state.frame(t0 + tuning.frame_interval() * i, &tuning);
            i += 1;
            if !state.active {
                break;
            }
            assert!(i < 300, "state failed to go idle");
        }
        assert_eq!(state.velocity_v, 0.0);
        assert_eq!(state.velocity_h, 0.0);
    }
}
