//! Request authentication: shared-secret handling, HMAC request signing, the clock that
//! stamps each attempt, and webhook payload digests.

pub mod clock;
pub mod digest;
pub mod secret;
pub mod signature;

pub use clock::*;
pub use digest::*;
pub use secret::*;
pub use signature::*;
