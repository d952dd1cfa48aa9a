//! The 20-byte Diameter base header (RFC 6733 §3).

use deku::prelude::*;

/// Fixed Diameter header. Three-byte big-endian fields (`length`,
/// `command_code`) are expressed with `#[deku(bits = 24)]` rather than a
/// hand-rolled byte-shuffling helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, DekuRead, DekuWrite)]
#[deku(endian = "big")]
pub struct DiameterHeader {
    pub version: u8,
    #[deku(bits = 24)]
    pub length: u32,
    pub command_flags: u8,
    #[deku(bits = 24)]
    pub command_code: u32,
    pub application_id: u32,
    pub hop_by_hop_id: u32,
    pub end_to_end_id: u32,
}

impl DiameterHeader {
    pub const LEN: usize = 20;
    pub const DIAMETER_VERSION: u8 = 1;

    pub const FLAG_REQUEST: u8 = 0x80;
    pub const FLAG_PROXIABLE: u8 = 0x40;
    pub const FLAG_ERROR: u8 = 0x20;
    pub const FLAG_RETRANSMIT: u8 = 0x10;

    pub fn request(command_code: u32, application_id: u32, hop_by_hop_id: u32, end_to_end_id: u32) -> Self {
        Self {
            version: Self::DIAMETER_VERSION,
            length: Self::LEN as u32,
            command_flags: Self::FLAG_REQUEST,
            command_code,
            application_id,
            hop_by_hop_id,
            end_to_end_id,
        }
    }

    /// Build the answer header matching `self`'s request, per P6: the
    /// HopByHopID/EndToEndID are echoed byte-for-byte and the request flag
    /// is cleared.
    pub fn answer_to(&self) -> Self {
        Self {
            version: Self::DIAMETER_VERSION,
            length: Self::LEN as u32,
            command_flags: self.command_flags & !Self::FLAG_REQUEST,
            command_code: self.command_code,
            application_id: self.application_id,
            hop_by_hop_id: self.hop_by_hop_id,
            end_to_end_id: self.end_to_end_id,
        }
    }

    pub fn is_request(&self) -> bool {
        self.command_flags & Self::FLAG_REQUEST != 0
    }

    pub fn is_error(&self) -> bool {
        self.command_flags & Self::FLAG_ERROR != 0
    }

    pub fn set_error(&mut self, error: bool) {
        if error {
            self.command_flags |= Self::FLAG_ERROR;
        } else {
            self.command_flags &= !Self::FLAG_ERROR;
        }
    }
}
