use std::sync::Mutex;
use std::time::{Duration, Instant};

use rand::Rng;

pub const CODE_LEN: usize = 6;

#[derive(Default)]
struct AuthState {
    code: Option<String>,
    generated_at: Option<Instant>,
    authenticated: bool,
}

/// The 6-digit pairing authenticator.
///
/// Lifecycle: a code is generated at server start and after every client
/// disconnect, consumed by a successful [`validate`](AuthGate::validate)
/// (each code authenticates at most once), and discarded once the validity
/// window passes (one-shot expiry: the first `validate` after the deadline
/// clears it).
pub struct AuthGate {
    state: Mutex<AuthState>,
    timeout: Duration,
}

impl AuthGate {
    pub fn new(timeout: Duration) -> Self {
        Self {
            state: Mutex::new(AuthState::default()),
            timeout,
        }
    }

    /// Generate and store a fresh code, invalidating any previous one.
    pub fn generate(&self) -> String {
        let mut rng = rand::thread_rng();
        let code: String = (0..CODE_LEN)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect();

        let mut state = self.state.lock().unwrap();
        state.code = Some(code.clone());
        state.generated_at = Some(Instant::now());
        state.authenticated = false;
        code
    }

    /// Check `input` against the stored code.
    ///
    /// Returns true only if a code exists, it has not expired, and the
    /// trimmed input matches; success latches the authenticated flag and
    /// consumes the code. A failed attempt leaves the flag untouched.
    pub fn validate(&self, input: &str) -> bool {
        let mut state = self.state.lock().unwrap();

        let (Some(code), Some(generated_at)) = (state.code.as_deref(), state.generated_at) else {
            return false;
        };

        if generated_at.elapsed() > self.timeout {
            state.code = None;
            state.generated_at = None;
            return false;
        }

        if input.trim() == code {
            state.code = None;
            state.generated_at = None;
            state.authenticated = true;
            return true;
        }
        false
    }

    /// Current code, for console display. `None` before the first
    /// [`generate`](AuthGate::generate) or after expiry/reset.
    pub fn current_code(&self) -> Option<String> {
        self.state.lock().unwrap().code.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.lock().unwrap().authenticated
    }

    /// Return to the post-construction state: no code, not authenticated.
    pub fn reset(&self) {
        *self.state.lock().unwrap() = AuthState::default();
    }
}
