use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Network and pairing configuration for the server.
///
/// Nothing here is persisted; the defaults are the documented wire contract
/// and the fields exist so the surrounding glue can override ports (tests
/// bind port 0 to get an ephemeral one).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Name advertised in the discovery response.
    pub server_name: String,
    /// UDP port answering discovery probes.
    pub discovery_port: u16,
    /// UDP port receiving MOVE/SCROLL packets.
    pub input_port: u16,
    /// TCP port for the AUTH/CLICK/KEY control channel.
    pub control_port: u16,
    /// Validity window of a pairing code, in seconds.
    pub auth_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_name: DEFAULT_SERVER_NAME.to_owned(),
            discovery_port: 5000,
            input_port: 5001,
            control_port: 5002,
            auth_timeout_secs: 300,
        }
    }
}

pub const DEFAULT_SERVER_NAME: &str = "Hotspot KBM Server";

impl ServerConfig {
    pub fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth_timeout_secs)
    }
}

// ── Smoother tuning ────────────────────────────────────────────────────────────

/// Tuning for the pointer capacitor.
///
/// The defaults are the shipped behaviour; they are exposed as a struct so
/// the discharge maths can be unit-tested against explicit values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerTuning {
    /// Output frame rate of the discharge loop.
    pub target_fps: u32,
    /// Base fraction of stored charge released per frame.
    pub discharge_rate: f64,
    /// How long after the last packet momentum continuation runs, in ms.
    pub continuation_timeout_ms: u64,
    /// EMA blend toward the instantaneous velocity (1.0 = no smoothing).
    pub velocity_blend: f64,
}

impl Default for PointerTuning {
    fn default() -> Self {
        Self {
            target_fps: 60,
            discharge_rate: 0.22,
            continuation_timeout_ms: 80,
            velocity_blend: 0.6,
        }
    }
}

impl PointerTuning {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.target_fps as f64)
    }

    pub fn continuation_timeout(&self) -> Duration {
        Duration::from_millis(self.continuation_timeout_ms)
    }
}

/// Tuning for the scroll capacitor.
///
/// Same shape as [`PointerTuning`] but with a momentum (flick) window in
/// place of the ease-out continuation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollTuning {
    pub target_fps: u32,
    pub discharge_rate: f64,
    /// How long a flick keeps coasting after the last packet, in ms.
    pub momentum_window_ms: u64,
    /// Per-frame decay applied to velocity during the flick phase.
    pub momentum_decay: f64,
    pub velocity_blend: f64,
}

impl Default for ScrollTuning {
    fn default() -> Self {
        Self {
            target_fps: 60,
            discharge_rate: 0.25,
            momentum_window_ms: 800,
            momentum_decay: 0.90,
            velocity_blend: 0.5,
        }
    }
}

impl ScrollTuning {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.target_fps as f64)
    }

    pub fn momentum_window(&self) -> Duration {
        Duration::from_millis(self.momentum_window_ms)
    }
}
