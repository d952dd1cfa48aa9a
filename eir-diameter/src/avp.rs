//! AVP (Attribute-Value Pair) TLV encode/decode (RFC 6733 §4).
//!
//! AVP bodies nest arbitrarily (grouped AVPs contain AVPs), which does not
//! fit deku's fixed-shape derive model, so this codec is hand-written
//! directly over `bytes::{Buf, BufMut}` the way the teacher hand-writes its
//! HDLC framing rather than forcing deku onto it.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AvpError {
    #[error("AVP header truncated: need at least 8 bytes, have {0}")]
    HeaderTruncated(usize),
    #[error("AVP {code} declares length {declared} but only {available} bytes remain")]
    BodyTruncated {
        code: u32,
        declared: usize,
        available: usize,
    },
    #[error("AVP {0} declares a length shorter than its own header")]
    LengthBelowHeader(u32),
    #[error("AVP {0} is not the expected integer width")]
    WrongWidth(u32),
    #[error("AVP {0} data is not valid UTF-8")]
    NotUtf8(u32),
}

/// One decoded AVP. `vendor_id` is `Some` iff the V flag was set on the
/// wire; `data` is the raw payload with wire padding already stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Avp {
    pub code: u32,
    pub vendor_id: Option<u32>,
    pub mandatory: bool,
    pub data: Vec<u8>,
}

const FLAG_VENDOR: u8 = 0x80;
const FLAG_MANDATORY: u8 = 0x40;

impl Avp {
    pub fn new(code: u32, mandatory: bool, data: Vec<u8>) -> Self {
        Self {
            code,
            vendor_id: None,
            mandatory,
            data,
        }
    }

    pub fn vendor(code: u32, vendor_id: u32, mandatory: bool, data: Vec<u8>) -> Self {
        Self {
            code,
            vendor_id: Some(vendor_id),
            mandatory,
            data,
        }
    }

    pub fn unsigned32(code: u32, mandatory: bool, value: u32) -> Self {
        Self::new(code, mandatory, value.to_be_bytes().to_vec())
    }

    pub fn vendor_unsigned32(code: u32, vendor_id: u32, mandatory: bool, value: u32) -> Self {
        Self::vendor(code, vendor_id, mandatory, value.to_be_bytes().to_vec())
    }

    pub fn octet_string(code: u32, mandatory: bool, value: impl Into<Vec<u8>>) -> Self {
        Self::new(code, mandatory, value.into())
    }

    pub fn utf8_string(code: u32, mandatory: bool, value: &str) -> Self {
        Self::new(code, mandatory, value.as_bytes().to_vec())
    }

    pub fn grouped(code: u32, mandatory: bool, children: &[Avp]) -> Self {
        let mut body = BytesMut::new();
        for child in children {
            child.encode(&mut body);
        }
        Self::new(code, mandatory, body.to_vec())
    }

    pub fn as_u32(&self) -> Result<u32, AvpError> {
        self.data
            .as_slice()
            .try_into()
            .map(u32::from_be_bytes)
            .map_err(|_| AvpError::WrongWidth(self.code))
    }

    pub fn as_utf8(&self) -> Result<&str, AvpError> {
        std::str::from_utf8(&self.data).map_err(|_| AvpError::NotUtf8(self.code))
    }

    pub fn as_grouped(&self) -> Result<Vec<Avp>, AvpError> {
        decode_all(&mut Bytes::copy_from_slice(&self.data))
    }

    fn header_len(&self) -> usize {
        if self.vendor_id.is_some() { 12 } else { 8 }
    }

    fn wire_len(&self) -> usize {
        self.header_len() + self.data.len()
    }

    fn padded_len(&self) -> usize {
        let len = self.wire_len();
        len.div_ceil(4) * 4
    }

    /// Append this AVP's wire form (header + data + zero padding) to `out`.
    pub fn encode(&self, out: &mut BytesMut) {
        let mut flags = 0u8;
        if self.vendor_id.is_some() {
            flags |= FLAG_VENDOR;
        }
        if self.mandatory {
            flags |= FLAG_MANDATORY;
        }

        out.put_u32(self.code);
        out.put_u8(flags);
        let len = self.wire_len() as u32;
        out.put_u8((len >> 16) as u8);
        out.put_u16(len as u16);
        if let Some(vendor_id) = self.vendor_id {
            out.put_u32(vendor_id);
        }
        out.extend_from_slice(&self.data);
        let padding = self.padded_len() - self.wire_len();
        out.extend_from_slice(&[0u8; 3][..padding]);
    }

    /// Decode one AVP (header + data + padding) from the front of `buf`,
    /// advancing it past the padded length.
    pub fn decode(buf: &mut Bytes) -> Result<Avp, AvpError> {
        if buf.remaining() < 8 {
            return Err(AvpError::HeaderTruncated(buf.remaining()));
        }
        let code = buf.get_u32();
        let flags = buf.get_u8();
        let len_hi = buf.get_u8() as u32;
        let len_lo = buf.get_u16() as u32;
        let declared = ((len_hi << 16) | len_lo) as usize;

        let vendor_flagged = flags & FLAG_VENDOR != 0;
        let header_len = if vendor_flagged { 12 } else { 8 };
        if declared < header_len {
            return Err(AvpError::LengthBelowHeader(code));
        }

        let vendor_id = if vendor_flagged {
            if buf.remaining() < 4 {
                return Err(AvpError::HeaderTruncated(buf.remaining()));
            }
            Some(buf.get_u32())
        } else {
            None
        };

        let data_len = declared - header_len;
        if buf.remaining() < data_len {
            return Err(AvpError::BodyTruncated {
                code,
                declared,
                available: buf.remaining(),
            });
        }
        let data = buf.copy_to_bytes(data_len).to_vec();

        let padded = declared.div_ceil(4) * 4;
        let padding = padded - declared;
        if buf.remaining() < padding {
            return Err(AvpError::BodyTruncated {
                code,
                declared: padded,
                available: buf.remaining() + data_len,
            });
        }
        buf.advance(padding);

        Ok(Avp {
            code,
            vendor_id,
            mandatory: flags & FLAG_MANDATORY != 0,
            data,
        })
    }
}

/// Decode every AVP in `buf` until it is exhausted.
pub fn decode_all(buf: &mut Bytes) -> Result<Vec<Avp>, AvpError> {
    let mut avps = Vec::new();
    while buf.has_remaining() {
        avps.push(Avp::decode(buf)?);
    }
    Ok(avps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_avp_round_trips() {
        let avp = Avp::unsigned32(268, true, 2001);
        let mut out = BytesMut::new();
        avp.encode(&mut out);
        // 8 byte header + 4 byte body, already 4-aligned
        assert_eq!(out.len(), 12);
        let mut bytes = out.freeze();
        let decoded = Avp::decode(&mut bytes).unwrap();
        assert_eq!(decoded, avp);
        assert_eq!(decoded.as_u32().unwrap(), 2001);
    }

    #[test]
    fn unpadded_octet_string_gets_padded_on_wire() {
        let avp = Avp::octet_string(1, true, b"123".to_vec());
        let mut out = BytesMut::new();
        avp.encode(&mut out);
        // header(8) + data(3) = 11, padded to 12
        assert_eq!(out.len(), 12);
        let mut bytes = out.freeze();
        let decoded = Avp::decode(&mut bytes).unwrap();
        assert_eq!(decoded.data, b"123".to_vec());
        assert!(!bytes.has_remaining());
    }

    #[test]
    fn vendor_avp_carries_vendor_id_and_wider_header() {
        let avp = Avp::vendor_unsigned32(1445, 10415, true, 0);
        let mut out = BytesMut::new();
        avp.encode(&mut out);
        assert_eq!(out.len(), 16);
        let mut bytes = out.freeze();
        let decoded = Avp::decode(&mut bytes).unwrap();
        assert_eq!(decoded.vendor_id, Some(10415));
    }

    #[test]
    fn grouped_avp_round_trips_its_children() {
        let child_a = Avp::octet_string(1, true, b"123456789012345".to_vec());
        let child_b = Avp::utf8_string(2, false, "v1.0");
        let group = Avp::grouped(900, true, &[child_a.clone(), child_b.clone()]);

        let mut out = BytesMut::new();
        group.encode(&mut out);
        let mut bytes = out.freeze();
        let decoded = Avp::decode(&mut bytes).unwrap();

        let children = decoded.as_grouped().unwrap();
        assert_eq!(children, vec![child_a, child_b]);
    }

    #[test]
    fn truncated_header_is_rejected() {
        let mut buf = Bytes::from_static(&[0, 0, 0, 1]);
        assert_eq!(Avp::decode(&mut buf), Err(AvpError::HeaderTruncated(4)));
    }

    #[test]
    fn declared_length_past_buffer_is_rejected() {
        let mut out = BytesMut::new();
        out.put_u32(1);
        out.put_u8(0);
        out.put_u8(0);
        out.put_u16(200);
        let mut buf = out.freeze();
        assert!(matches!(
            Avp::decode(&mut buf),
            Err(AvpError::BodyTruncated { .. })
        ));
    }
}
