pub mod password_gate;

pub use password_gate::{is_authenticated_marker, PasswordGate, AUTHENTICATED_MARKER};
