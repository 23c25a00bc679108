use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::debug;

use hotspot_kbm_core::PointerTuning;

use crate::PointerSink;

// Adaptive discharge clamps.
const FAST_RATE_CAP: f64 = 0.27;
const SLOW_RATE_FLOOR: f64 = 0.12;
// Per-axis charge below this is flushed in one frame instead of decaying
// asymptotically.
const RESIDUAL_FLUSH: f64 = 0.02;
// Minimum smoothed speed before the stored direction is overwritten.
const DIRECTION_MIN_SPEED: f64 = 0.05;
// Continuation output below this is suppressed entirely.
const CONTINUATION_MIN_SPEED: f64 = 0.03;
const CONTINUATION_SCALE: f64 = 0.5;

// ── Capacitor state ────────────────────────────────────────────────────────────

/// All mutable smoother state, guarded by one mutex.
///
/// `charge` is accumulated un-emitted movement, `subpixel` the fractional
/// carry between frames (each component stays in (-1, 1)), `velocity` an
/// exponentially smoothed per-frame delta, and `direction`/`speed` the last
/// significant heading used for the momentum tail.
#[derive(Debug, Default)]
struct Capacitor {
    charge_x: f64,
    charge_y: f64,
    subpixel_x: f64,
    subpixel_y: f64,
    velocity_x: f64,
    velocity_y: f64,
    direction_x: f64,
    direction_y: f64,
    speed: f64,
    last_input: Option<Instant>,
    active: bool,
}

impl Capacitor {
    /// Charge phase: fold one incoming packet into the buffer.
    fn charge(&mut self, dx: i32, dy: i32, now: Instant, tuning: &PointerTuning) {
        let (dx, dy) = (dx as f64, dy as f64);
        self.charge_x += dx;
        self.charge_y += dy;

        // Instantaneous velocity in pixels per output frame.
        let interval = 1.0 / tuning.target_fps as f64;
        let dt = match self.last_input {
            Some(t) => {
                let dt = now.saturating_duration_since(t).as_secs_f64();
                if dt < 0.001 { interval } else { dt }
            }
            None => interval,
        };
        let frames = (dt * tuning.target_fps as f64).max(1.0);
        let new_vx = dx / frames;
        let new_vy = dy / frames;

        // Quick-turn: a reversal must not leave stale momentum.
        if dx * self.velocity_x + dy * self.velocity_y < 0.0 {
            self.velocity_x = 0.0;
            self.velocity_y = 0.0;
        }

        let blend = tuning.velocity_blend;
        self.velocity_x = self.velocity_x * (1.0 - blend) + new_vx * blend;
        self.velocity_y = self.velocity_y * (1.0 - blend) + new_vy * blend;

        let speed = self.velocity_x.hypot(self.velocity_y);
        if speed > DIRECTION_MIN_SPEED {
            self.direction_x = self.velocity_x / speed;
            self.direction_y = self.velocity_y / speed;
            self.speed = speed;
        }

        self.active = true;
        self.last_input = Some(now);
    }

    /// Discharge phase: advance one output frame and return the integer
    /// delta to inject (possibly zero).
    fn frame(&mut self, now: Instant, tuning: &PointerTuning) -> (i32, i32) {
        let since_input = match self.last_input {
            Some(t) => now.saturating_duration_since(t).as_secs_f64(),
            None => f64::INFINITY,
        };
        let timeout = tuning.continuation_timeout().as_secs_f64();

        let mut out_x = 0.0;
        let mut out_y = 0.0;

        if self.charge_x != 0.0 || self.charge_y != 0.0 {
            // Discharging: release a magnitude-dependent fraction.
            let magnitude = self.charge_x.hypot(self.charge_y);
            let base = tuning.discharge_rate;
            let rate = if magnitude > 10.0 {
                (base * 1.5).min(FAST_RATE_CAP)
            } else if magnitude < 2.0 {
                (base * 0.7).max(SLOW_RATE_FLOOR)
            } else {
                base
            };

            out_x = self.charge_x * rate;
            out_y = self.charge_y * rate;
            self.charge_x -= out_x;
            self.charge_y -= out_y;

            // Near-empty axes release everything so no charge lingers.
            if self.charge_x.abs() < RESIDUAL_FLUSH {
                out_x += self.charge_x;
                self.charge_x = 0.0;
            }
            if self.charge_y.abs() < RESIDUAL_FLUSH {
                out_y += self.charge_y;
                self.charge_y = 0.0;
            }
        } else if self.active && since_input < timeout {
            // Continuing: quadratic ease-out along the last heading.
            let progress = since_input / timeout;
            let fade = (1.0 - progress) * (1.0 - progress);
            let continue_speed = self.speed * fade * CONTINUATION_SCALE;
            if continue_speed > CONTINUATION_MIN_SPEED {
                out_x = self.direction_x * continue_speed;
                out_y = self.direction_y * continue_speed;
            }
        } else if self.active {
            // Idle: the continuation window has passed.
            self.active = false;
            self.speed = 0.0;
            self.velocity_x = 0.0;
            self.velocity_y = 0.0;
        }

        // Sub-pixel carry: emit whole pixels, keep the fraction.
        self.subpixel_x += out_x;
        self.subpixel_y += out_y;
        let int_x = self.subpixel_x.trunc();
        let int_y = self.subpixel_y.trunc();
        self.subpixel_x -= int_x;
        self.subpixel_y -= int_y;

        (int_x as i32, int_y as i32)
    }
}

// ── InputSmoother ──────────────────────────────────────────────────────────────

struct Shared {
    state: Mutex<Capacitor>,
    running: AtomicBool,
    tuning: PointerTuning,
    sink: Arc<dyn PointerSink>,
}

/// Pointer capacitor with its 60 Hz discharge worker.
///
/// [`add_movement`](InputSmoother::add_movement) is called from the UDP
/// receiver thread and does nothing beyond a mutex hand-off; the worker owns
/// all output timing.
pub struct InputSmoother {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl InputSmoother {
    pub fn new(sink: Arc<dyn PointerSink>, tuning: PointerTuning) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(Capacitor::default()),
                running: AtomicBool::new(false),
                tuning,
                sink,
            }),
            worker: Mutex::new(None),
        }
    }

    /// Start the discharge worker. Idempotent.
    pub fn start(&self) {
        if self.shared.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let shared = Arc::clone(&self.shared);
        *self.worker.lock().unwrap() = Some(
            thread::Builder::new()
                .name("pointer-discharge".into())
                .spawn(move || discharge_loop(shared))
                .expect("spawn pointer discharge thread"),
        );
        debug!(
            "[Smoother] Pointer discharge started ({} fps, rate {})",
            self.shared.tuning.target_fps, self.shared.tuning.discharge_rate
        );
    }

    /// Stop the worker and wait for it to exit.
    pub fn stop(&self) {
        self.shared.running.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.lock().unwrap().take() {
            let _ = worker.join();
        }
    }

    /// Charge the capacitor with one incoming pointer delta.
    pub fn add_movement(&self, dx: i32, dy: i32) {
        let now = Instant::now();
        self.shared
            .state
            .lock()
            .unwrap()
            .charge(dx, dy, now, &self.shared.tuning);
    }
}

impl Drop for InputSmoother {
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
            let (dx, dy) = state.frame(frame_start, &shared.tuning);
            if dx != 0 || dy != 0 {
                // Still under the lock: uinput writes are non-blocking and
                // this keeps mouse-device writes serial.
                shared.sink.move_rel(dx, dy);
            }
        }
        if let Some(remaining) = interval.checked_sub(frame_start.elapsed()) {
            thread::sleep(remaining);
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
