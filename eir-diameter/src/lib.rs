//! Diameter base protocol (RFC 6733) wire codec for the S13 application:
//! the 20-byte header, AVP TLV encode/decode, and the typed `Message` the
//! peer state machine and S13 handler in `eir-daemon` build on.

pub mod avp;
pub mod constants;
pub mod header;
pub mod message;

pub use avp::{Avp, AvpError};
pub use constants::*;
pub use header::DiameterHeader;
pub use message::{Message, MessageError};
