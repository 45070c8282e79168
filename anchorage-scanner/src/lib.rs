pub mod dns;
pub mod error;
pub mod result;
pub mod verifier;

pub use dns::HostResolver;
pub use error::ScanError;
pub use result::{Hop, Outcome, TransportError, VerificationOutcome};
pub use verifier::{ProgressCallback, Verifier};
