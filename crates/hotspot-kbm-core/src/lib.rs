pub mod config;
pub mod errors;
pub mod protocol;

pub use config::{PointerTuning, ScrollTuning, ServerConfig};
pub use errors::{InputError, NetError};
pub use protocol::*;
