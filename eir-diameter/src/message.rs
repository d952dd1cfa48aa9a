//! A full Diameter message: header plus AVP list, with the framing the peer
//! needs to read one message off a TCP stream.

use bytes::{Bytes, BytesMut};
use deku::prelude::*;
use thiserror::Error;

use crate::avp::{Avp, AvpError, decode_all};
use crate::header::DiameterHeader;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    #[error("header truncated: need {0} bytes, have {1}")]
    HeaderTruncated(usize, usize),
    #[error("failed to decode header: {0}")]
    HeaderMalformed(String),
    #[error("declared length {declared} exceeds the {limit} byte maximum")]
    TooLarge { declared: usize, limit: usize },
    #[error("declared length {0} is smaller than the header")]
    LengthBelowHeader(usize),
    #[error("body truncated: need {0} bytes, have {1}")]
    BodyTruncated(usize, usize),
    #[error(transparent)]
    Avp(#[from] AvpError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub header: DiameterHeader,
    pub avps: Vec<Avp>,
}

impl Message {
    pub fn new(header: DiameterHeader, avps: Vec<Avp>) -> Self {
        Self { header, avps }
    }

    pub fn find(&self, code: u32) -> Option<&Avp> {
        self.avps.iter().find(|avp| avp.code == code)
    }

    pub fn find_vendor(&self, code: u32, vendor_id: u32) -> Option<&Avp> {
        self.avps
            .iter()
            .find(|avp| avp.code == code && avp.vendor_id == Some(vendor_id))
    }

    /// Serialize header + AVPs, writing the correct total length into the
    /// header's `length` field first.
    pub fn encode(&self) -> Vec<u8> {
        let mut body = BytesMut::new();
        for avp in &self.avps {
            avp.encode(&mut body);
        }

        let mut header = self.header;
        header.length = (DiameterHeader::LEN + body.len()) as u32;

        let mut out = header.to_bytes().expect("fixed-width header always encodes");
        out.extend_from_slice(&body);
        out
    }

    /// Peek the declared total message length from a 20-byte header buffer,
    /// without consuming anything. Used by the peer's reader to know how
    /// many more bytes to read.
    pub fn peek_length(header_bytes: &[u8]) -> Result<usize, MessageError> {
        if header_bytes.len() < DiameterHeader::LEN {
            return Err(MessageError::HeaderTruncated(
                DiameterHeader::LEN,
                header_bytes.len(),
            ));
        }
        let (_, header) = DiameterHeader::from_bytes((header_bytes, 0))
            .map_err(|e| MessageError::HeaderMalformed(e.to_string()))?;
        Ok(header.length as usize)
    }

    /// Decode a full message from an exactly-`length`-sized buffer (header
    /// + body, as read by the peer once `peek_length` is known).
    pub fn decode(buf: &[u8], max_message_size: usize) -> Result<Message, MessageError> {
        if buf.len() > max_message_size {
            return Err(MessageError::TooLarge {
                declared: buf.len(),
                limit: max_message_size,
            });
        }
        if buf.len() < DiameterHeader::LEN {
            return Err(MessageError::HeaderTruncated(DiameterHeader::LEN, buf.len()));
        }
        let (body_bytes, header) = DiameterHeader::from_bytes((buf, 0))
            .map_err(|e| MessageError::HeaderMalformed(e.to_string()))?;
        let declared = header.length as usize;
        if declared < DiameterHeader::LEN {
            return Err(MessageError::LengthBelowHeader(declared));
        }
        if declared > buf.len() {
            return Err(MessageError::BodyTruncated(declared, buf.len()));
        }

        let body_start = DiameterHeader::LEN;
        let body_end = declared;
        let mut body = Bytes::copy_from_slice(&buf[body_start..body_end]);
        let _ = body_bytes;
        let avps = decode_all(&mut body)?;
        Ok(Message { header, avps })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::*;

    #[test]
    fn message_round_trips_with_correct_length_in_header() {
        let header = DiameterHeader::request(COMMAND_ME_IDENTITY_CHECK, APPLICATION_ID_S13, 1, 2);
        let avps = vec![
            Avp::utf8_string(AVP_SESSION_ID, true, "eir;1;2"),
            Avp::unsigned32(AVP_AUTH_SESSION_STATE, true, AUTH_SESSION_STATE_NO_STATE_MAINTAINED),
        ];
        let msg = Message::new(header, avps.clone());
        let wire = msg.encode();

        let declared = Message::peek_length(&wire[..DiameterHeader::LEN]).unwrap();
        assert_eq!(declared, wire.len());

        let decoded = Message::decode(&wire, 4096).unwrap();
        assert_eq!(decoded.avps, avps);
    }

    #[test]
    fn oversize_message_is_rejected() {
        let header = DiameterHeader::request(COMMAND_ME_IDENTITY_CHECK, APPLICATION_ID_S13, 1, 2);
        let msg = Message::new(header, vec![Avp::octet_string(1, true, vec![0u8; 100])]);
        let wire = msg.encode();
        assert!(Message::decode(&wire, 32).is_err());
    }

    #[test]
    fn find_locates_avp_by_code() {
        let header = DiameterHeader::request(COMMAND_ME_IDENTITY_CHECK, APPLICATION_ID_S13, 1, 2);
        let msg = Message::new(header, vec![Avp::unsigned32(AVP_RESULT_CODE, true, RESULT_DIAMETER_SUCCESS)]);
        assert_eq!(msg.find(AVP_RESULT_CODE).unwrap().as_u32().unwrap(), RESULT_DIAMETER_SUCCESS);
        assert!(msg.find(999).is_none());
    }
}
