//! Wire-protocol constants and token types.
//!
//! Everything on the wire is UTF-8 text: single datagrams on UDP, `\n`
//! terminated lines on TCP.
//!
//! ```text
//! Handheld                               Server
//! ────────────────────────────────────   ─────────────────────────────────
//! "HOTSPOT_KBM_DISCOVERY"  ──UDP:5000─►  5-line advert (only when idle)
//! "MOVE <dx> <dy>"         ──UDP:5001─►  pointer capacitor
//! "SCROLL <v> <h>"         ──UDP:5001─►  scroll capacitor
//! "AUTH <code>"            ──TCP:5002─►  "AUTH_OK" | "AUTH_FAIL:…"
//! "CLICK <button> <state>" ──TCP:5002─►  mouse button (authenticated only)
//! "KEY <state> <key>"      ──TCP:5002─►  keyboard key (authenticated only)
//! ```

/// Exact payload a handheld sends to locate the server.
pub const DISCOVERY_MAGIC: &str = "HOTSPOT_KBM_DISCOVERY";

/// First line of the discovery advert.
pub const DISCOVERY_RESPONSE_HEADER: &str = "HOTSPOT_KBM_SERVER";

// TCP replies. Terminated with '\n' on the wire.
pub const AUTH_OK: &str = "AUTH_OK";
pub const AUTH_FAIL_INVALID_CODE: &str = "AUTH_FAIL:INVALID_CODE";
pub const AUTH_FAIL_ALREADY_CONNECTED: &str = "AUTH_FAIL:ALREADY_CONNECTED";

// ── MouseButton ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    /// Parse an already-uppercased wire token. Unknown tokens are dropped by
    /// the caller, so this returns `None` rather than an error.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "LEFT" => Some(Self::Left),
            "RIGHT" => Some(Self::Right),
            "MIDDLE" => Some(Self::Middle),
            _ => None,
        }
    }
}

// ── KeyState ───────────────────────────────────────────────────────────────────

/// Press state shared by CLICK and KEY commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Down,
    Up,
}

impl KeyState {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "DOWN" => Some(Self::Down),
            "UP" => Some(Self::Up),
            _ => None,
        }
    }

    /// evdev EV_KEY value: 1 = press, 0 = release.
    pub fn value(self) -> i32 {
        match self {
            Self::Down => 1,
            Self::Up => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_tokens() {
        assert_eq!(MouseButton::from_token("LEFT"), Some(MouseButton::Left));
        assert_eq!(MouseButton::from_token("MIDDLE"), Some(MouseButton::Middle));
        assert_eq!(MouseButton::from_token("left"), None);
        assert_eq!(MouseButton::from_token("X1"), None);
    }

    #[test]
    fn state_tokens() {
        assert_eq!(KeyState::from_token("DOWN"), Some(KeyState::Down));
        assert_eq!(KeyState::from_token("UP"), Some(KeyState::Up));
        assert_eq!(KeyState::Down.value(), 1);
        assert_eq!(KeyState::Up.value(), 0);
        assert_eq!(KeyState::from_token("HELD"), None);
    }
}
