//! Auth-domain primitives: redacted secrets and the session record handed to providers.

pub mod secret;
pub mod session;

pub use secret::*;
pub use session::*;
