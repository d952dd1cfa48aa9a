//! The binding between Diameter and the Decision Engine: builds CER/CEA,
//! DWR/DWA, DPR/DPA, and ME-Identity-Check-Answer messages.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Utc;
use eir_core::audit::{AuditRecord, AuditSink, RequestSource};
use eir_core::{Colour, DecisionEngine, DecisionError, InMemoryRangeStore};
use eir_diameter::constants::*;
use eir_diameter::{Avp, Message};
use log::warn;

use crate::config::Config;
use crate::load::LoadMonitor;

pub struct S13Handler {
    engine: Arc<DecisionEngine<InMemoryRangeStore>>,
    audit: Arc<dyn AuditSink>,
    config: Arc<Config>,
    load: LoadMonitor,
    next_id: AtomicU32,
}

fn extract_imei(req: &Message) -> Option<String> {
    let terminal_info = req.find(AVP_TERMINAL_INFORMATION)?;
    let children = terminal_info.as_grouped().ok()?;
    let imei_avp = children.iter().find(|avp| avp.code == AVP_IMEI)?;
    imei_avp.as_utf8().ok().map(str::to_string)
}

impl S13Handler {
    pub fn new(
        engine: Arc<DecisionEngine<InMemoryRangeStore>>,
        audit: Arc<dyn AuditSink>,
        config: Arc<Config>,
        load: LoadMonitor,
    ) -> Self {
        Self {
            engine,
            audit,
            config,
            load,
            next_id: AtomicU32::new(1),
        }
    }

    fn next_id(&self) -> u32 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn identity_avps(&self) -> Vec<Avp> {
        vec![
            Avp::utf8_string(AVP_ORIGIN_HOST, true, &self.config.origin_host),
            Avp::utf8_string(AVP_ORIGIN_REALM, true, &self.config.origin_realm),
        ]
    }

    fn base_answer_avps(&self, result_code: u32, session_id: Option<Avp>) -> Vec<Avp> {
        let mut avps = Vec::with_capacity(5);
        if let Some(session_id) = session_id {
            avps.push(session_id);
        }
        avps.push(Avp::unsigned32(AVP_RESULT_CODE, true, result_code));
        avps.extend(self.identity_avps());
        avps.push(Avp::unsigned32(
            AVP_AUTH_SESSION_STATE,
            true,
            AUTH_SESSION_STATE_NO_STATE_MAINTAINED,
        ));
        avps
    }

    /// Does `req` carry the Origin-Host/Origin-Realm a CER must present?
    /// Negotiating an Application-Id list beyond "do we speak S13" is out
    /// of scope; presence of the two identity AVPs is all this checks.
    pub fn cer_is_valid(req: &Message) -> bool {
        req.find(AVP_ORIGIN_HOST).is_some() && req.find(AVP_ORIGIN_REALM).is_some()
    }

    pub fn build_cea(&self, req: &Message) -> Message {
        let header = req.header.answer_to();
        let mut avps = self.base_answer_avps(RESULT_DIAMETER_SUCCESS, req.find(AVP_SESSION_ID).cloned());
        avps.push(Avp::utf8_string(AVP_PRODUCT_NAME, false, &self.config.product_name));
        avps.push(Avp::unsigned32(AVP_VENDOR_ID, true, self.config.vendor_id));
        avps.push(Avp::unsigned32(AVP_AUTH_APPLICATION_ID, true, APPLICATION_ID_S13));
        Message::new(header, avps)
    }

    /// The CEA sent when a CER is missing Origin-Host/Origin-Realm: a
    /// DIAMETER_UNABLE_TO_COMPLY answer, after which the peer closes.
    pub fn build_cea_failure(&self, req: &Message) -> Message {
        let header = req.header.answer_to();
        let avps = self.base_answer_avps(RESULT_DIAMETER_UNABLE_TO_COMPLY, req.find(AVP_SESSION_ID).cloned());
        Message::new(header, avps)
    }

    pub fn build_dwa(&self, req: &Message) -> Message {
        let header = req.header.answer_to();
        let avps = self.base_answer_avps(RESULT_DIAMETER_SUCCESS, req.find(AVP_SESSION_ID).cloned());
        Message::new(header, avps)
    }

    /// Server-initiated DWR: a fresh request with its own correlation IDs.
    pub fn build_dwr(&self) -> Message {
        let id = self.next_id();
        let header = eir_diameter::DiameterHeader::request(
            COMMAND_DEVICE_WATCHDOG,
            APPLICATION_ID_S13,
            id,
            id,
        );
        Message::new(header, self.identity_avps())
    }

    pub fn build_dpa(&self, req: &Message) -> Message {
        let header = req.header.answer_to();
        let avps = self.base_answer_avps(RESULT_DIAMETER_SUCCESS, req.find(AVP_SESSION_ID).cloned());
        Message::new(header, avps)
    }

    pub async fn handle_identity_check(&self, req: &Message) -> Message {
        let header = req.header.answer_to();
        let session_id = req.find(AVP_SESSION_ID).cloned();

        let imei = match extract_imei(req) {
            Some(imei) => imei,
            None => {
                warn!("ME-Identity-Check-Request missing Terminal-Information/IMEI");
                self.record_audit(None, None, Some(RESULT_DIAMETER_INVALID_AVP_VALUE));
                return Message::new(
                    header,
                    self.base_answer_avps(RESULT_DIAMETER_INVALID_AVP_VALUE, session_id),
                );
            }
        };

        let load = self.load.snapshot();
        let result = self.engine.check_tac(imei.as_bytes(), load).await;
        let (result_code, colour) = match result {
            Ok(r) => (RESULT_DIAMETER_SUCCESS, Some(r.colour)),
            Err(DecisionError::Unknown)
                if self.config.engine.default_policy_unknown_is_whitelisted =>
            {
                (RESULT_DIAMETER_SUCCESS, Some(Colour::White))
            }
            Err(err @ (DecisionError::InvalidValue
            | DecisionError::InvalidParameter
            | DecisionError::InvalidLength
            | DecisionError::InvalidColor)) => {
                warn!("ME-Identity-Check for {imei} rejected: {err}");
                (RESULT_DIAMETER_INVALID_AVP_VALUE, None)
            }
            Err(err) => {
                warn!("ME-Identity-Check for {imei} failed: {err}");
                (RESULT_DIAMETER_UNABLE_TO_COMPLY, None)
            }
        };

        self.record_audit(Some(imei), colour, Some(result_code));

        let mut avps = self.base_answer_avps(result_code, session_id);
        if let Some(colour) = colour {
            avps.push(Avp::vendor_unsigned32(
                AVP_EQUIPMENT_STATUS,
                VENDOR_ID_3GPP,
                true,
                colour.equipment_status_avp(),
            ));
        }
        Message::new(header, avps)
    }

    fn record_audit(&self, imei: Option<String>, status: Option<Colour>, result_code: Option<u32>) {
        self.audit.record(AuditRecord {
            imei: imei.unwrap_or_default(),
            status,
            check_time: Utc::now(),
            origin: self.config.origin_host.clone(),
            session_id: None,
            request_source: RequestSource::Diameter,
            result_code,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eir_core::audit::InProcessAuditSink;
    use eir_core::EngineConfig;

    fn handler() -> S13Handler {
        let engine = Arc::new(DecisionEngine::new(
            Arc::new(InMemoryRangeStore::new()),
            EngineConfig::default(),
        ));
        let (sink, _rx) = InProcessAuditSink::new(8);
        S13Handler::new(
            engine,
            Arc::new(sink),
            Arc::new(Config::default()),
            LoadMonitor::new(1024),
        )
    }

    fn terminal_information(imei: &str) -> Avp {
        Avp::grouped(
            AVP_TERMINAL_INFORMATION,
            true,
            &[Avp::utf8_string(AVP_IMEI, true, imei)],
        )
    }

    #[test]
    fn cer_is_valid_requires_origin_host_and_realm() {
        let req_header = eir_diameter::DiameterHeader::request(
            COMMAND_CAPABILITIES_EXCHANGE,
            APPLICATION_ID_S13,
            1,
            1,
        );
        let complete = Message::new(
            req_header,
            vec![
                Avp::utf8_string(AVP_ORIGIN_HOST, true, "peer.local"),
                Avp::utf8_string(AVP_ORIGIN_REALM, true, "local"),
            ],
        );
        assert!(S13Handler::cer_is_valid(&complete));

        let missing_realm = Message::new(
            req_header,
            vec![Avp::utf8_string(AVP_ORIGIN_HOST, true, "peer.local")],
        );
        assert!(!S13Handler::cer_is_valid(&missing_realm));
    }

    #[test]
    fn build_cea_failure_reports_unable_to_comply() {
        let handler = handler();
        let req_header = eir_diameter::DiameterHeader::request(
            COMMAND_CAPABILITIES_EXCHANGE,
            APPLICATION_ID_S13,
            5,
            6,
        );
        let req = Message::new(req_header, vec![]);
        let cea = handler.build_cea_failure(&req);
        assert_eq!(
            cea.find(AVP_RESULT_CODE).unwrap().as_u32().unwrap(),
            RESULT_DIAMETER_UNABLE_TO_COMPLY
        );
        assert_eq!(cea.header.hop_by_hop_id, 5);
        assert_eq!(cea.header.end_to_end_id, 6);
    }

    #[tokio::test]
    async fn missing_terminal_information_yields_invalid_avp_value() {
        let handler = handler();
        let req_header = eir_diameter::DiameterHeader::request(
            COMMAND_ME_IDENTITY_CHECK,
            APPLICATION_ID_S13,
            1,
            2,
        );
        let req = Message::new(req_header, vec![]);
        let answer = handler.handle_identity_check(&req).await;
        let code = answer.find(AVP_RESULT_CODE).unwrap().as_u32().unwrap();
        assert_eq!(code, RESULT_DIAMETER_INVALID_AVP_VALUE);
    }

    #[tokio::test]
    async fn matching_range_yields_success_and_equipment_status() {
        let handler = handler();
        handler
            .engine
            .insert_tac(b"123456789012345", Some(b"123456789012345"), Colour::White)
            .await
            .unwrap();

        let req_header = eir_diameter::DiameterHeader::request(
            COMMAND_ME_IDENTITY_CHECK,
            APPLICATION_ID_S13,
            7,
            8,
        );
        let req = Message::new(req_header, vec![terminal_information("123456789012345")]);
        let answer = handler.handle_identity_check(&req).await;

        assert_eq!(answer.header.hop_by_hop_id, 7);
        assert_eq!(answer.header.end_to_end_id, 8);
        assert_eq!(
            answer.find(AVP_RESULT_CODE).unwrap().as_u32().unwrap(),
            RESULT_DIAMETER_SUCCESS
        );
        let status = answer
            .find_vendor(AVP_EQUIPMENT_STATUS, VENDOR_ID_3GPP)
            .unwrap()
            .as_u32()
            .unwrap();
        assert_eq!(status, EQUIPMENT_STATUS_WHITELISTED);
    }

    #[tokio::test]
    async fn malformed_imei_yields_invalid_avp_value() {
        let handler = handler();
        let req_header = eir_diameter::DiameterHeader::request(
            COMMAND_ME_IDENTITY_CHECK,
            APPLICATION_ID_S13,
            3,
            4,
        );
        let req = Message::new(req_header, vec![terminal_information("not-digits")]);
        let answer = handler.handle_identity_check(&req).await;
        assert_eq!(
            answer.find(AVP_RESULT_CODE).unwrap().as_u32().unwrap(),
            RESULT_DIAMETER_INVALID_AVP_VALUE
        );
    }

    #[tokio::test]
    async fn unmatched_imei_defaults_to_whitelisted_per_policy() {
        let handler = handler();
        let req_header = eir_diameter::DiameterHeader::request(
            COMMAND_ME_IDENTITY_CHECK,
            APPLICATION_ID_S13,
            1,
            1,
        );
        let req = Message::new(req_header, vec![terminal_information("999999999999999")]);
        let answer = handler.handle_identity_check(&req).await;
        assert_eq!(
            answer.find(AVP_RESULT_CODE).unwrap().as_u32().unwrap(),
            RESULT_DIAMETER_SUCCESS
        );
    }
}
