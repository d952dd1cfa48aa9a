//! A raw TCP Diameter peer for wire-level conformance checks: the harness
//! plays the client side of S13 (CER, DWR, DPR) and reads back whatever the
//! daemon answers, without going through `eir-diameter`'s peer state
//! machine (that's the thing under test).

use anyhow::{Context, Result, bail};
use eir_diameter::{Avp, DiameterHeader, Message};
use eir_diameter::constants::*;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

pub struct DiameterClient {
    stream: TcpStream,
    next_id: u32,
}

const MAX_MESSAGE_SIZE: usize = 1 << 20;

impl DiameterClient {
    pub async fn connect(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .with_context(|| format!("connecting to Diameter listener at {addr}"))?;
        Ok(Self { stream, next_id: 1 })
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub async fn send(&mut self, message: &Message) -> Result<()> {
        self.stream
            .write_all(&message.encode())
            .await
            .context("writing Diameter message")
    }

    /// Read exactly one framed message, honoring the header's declared
    /// length the same way the daemon's own peer reader does.
    pub async fn recv(&mut self) -> Result<Message> {
        let mut header_buf = [0u8; DiameterHeader::LEN];
        self.stream
            .read_exact(&mut header_buf)
            .await
            .context("reading Diameter header")?;
        let declared = Message::peek_length(&header_buf).context("parsing declared length")?;
        if declared > MAX_MESSAGE_SIZE {
            bail!("peer declared an oversize message ({declared} bytes)");
        }
        let mut body = vec![0u8; declared - DiameterHeader::LEN];
        self.stream
            .read_exact(&mut body)
            .await
            .context("reading Diameter body")?;
        let mut full = Vec::with_capacity(declared);
        full.extend_from_slice(&header_buf);
        full.extend_from_slice(&body);
        Message::decode(&full, MAX_MESSAGE_SIZE).context("decoding Diameter message")
    }

    /// Send a connection-opening CER and return the CEA.
    pub async fn capability_exchange(&mut self, origin_host: &str, origin_realm: &str) -> Result<Message> {
        let id = self.next_id();
        let header = DiameterHeader::request(COMMAND_CAPABILITIES_EXCHANGE, APPLICATION_ID_S13, id, id);
        let avps = vec![
            Avp::utf8_string(AVP_ORIGIN_HOST, true, origin_host),
            Avp::utf8_string(AVP_ORIGIN_REALM, true, origin_realm),
        ];
        self.send(&Message::new(header, avps)).await?;
        self.recv().await
    }

    /// Send a ME-Identity-Check-Request for `imei` inside an open session.
    pub async fn identity_check(&mut self, session_id: &str, imei: &str) -> Result<Message> {
        let id = self.next_id();
        let header = DiameterHeader::request(COMMAND_ME_IDENTITY_CHECK, APPLICATION_ID_S13, id, id);
        let avps = vec![
            Avp::utf8_string(AVP_SESSION_ID, true, session_id),
            Avp::grouped(
                AVP_TERMINAL_INFORMATION,
                true,
                &[Avp::utf8_string(AVP_IMEI, true, imei)],
            ),
        ];
        self.send(&Message::new(header, avps)).await?;
        self.recv().await
    }

    /// Send a ME-Identity-Check-Request with no Terminal-Information AVP.
    pub async fn identity_check_without_imei(&mut self, session_id: &str) -> Result<Message> {
        let id = self.next_id();
        let header = DiameterHeader::request(COMMAND_ME_IDENTITY_CHECK, APPLICATION_ID_S13, id, id);
        let avps = vec![Avp::utf8_string(AVP_SESSION_ID, true, session_id)];
        self.send(&Message::new(header, avps)).await?;
        self.recv().await
    }

    pub async fn watchdog(&mut self) -> Result<Message> {
        let id = self.next_id();
        let header = DiameterHeader::request(COMMAND_DEVICE_WATCHDOG, APPLICATION_ID_S13, id, id);
        self.send(&Message::new(header, vec![])).await?;
        self.recv().await
    }

    pub async fn disconnect(&mut self, session_id: &str) -> Result<Message> {
        let id = self.next_id();
        let header = DiameterHeader::request(COMMAND_DISCONNECT_PEER, APPLICATION_ID_S13, id, id);
        let avps = vec![Avp::utf8_string(AVP_SESSION_ID, true, session_id)];
        self.send(&Message::new(header, avps)).await?;
        self.recv().await
    }

    /// Write a 20-byte header claiming `declared_length` as the message
    /// length without ever sending that many body bytes — used to exercise
    /// the peer's oversize-message rejection. Hand-assembled rather than
    /// routed through `DiameterHeader`'s deku codec, since the point is to
    /// put an arbitrary, possibly-invalid value on the wire.
    pub async fn send_oversize_header(&mut self, declared_length: u32) -> Result<()> {
        let id = self.next_id();
        let mut bytes = Vec::with_capacity(DiameterHeader::LEN);
        bytes.push(DiameterHeader::DIAMETER_VERSION);
        bytes.extend_from_slice(&declared_length.to_be_bytes()[1..]);
        bytes.push(DiameterHeader::FLAG_REQUEST);
        bytes.extend_from_slice(&COMMAND_ME_IDENTITY_CHECK.to_be_bytes()[1..]);
        bytes.extend_from_slice(&APPLICATION_ID_S13.to_be_bytes());
        bytes.extend_from_slice(&id.to_be_bytes());
        bytes.extend_from_slice(&id.to_be_bytes());
        self.stream.write_all(&bytes).await.context("writing oversize header")?;
        Ok(())
    }

    pub async fn expect_closed(&mut self) -> Result<()> {
        let mut buf = [0u8; 1];
        match self.stream.read(&mut buf).await {
            Ok(0) => Ok(()),
            Ok(_) => bail!("peer sent more data instead of closing"),
            Err(e) => bail!("unexpected read error waiting for close: {e}"),
        }
    }
}
