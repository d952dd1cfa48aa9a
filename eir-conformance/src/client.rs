use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::StatusCode;

use crate::types::*;

pub struct EirClient {
    client: reqwest::Client,
    base_url: String,
}

impl EirClient {
    pub fn new(host: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            base_url: format!("http://{host}"),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn health(&self) -> Result<StatusCode> {
        let resp = self
            .client
            .get(self.url("/health"))
            .send()
            .await
            .context("GET /health")?;
        Ok(resp.status())
    }

    pub async fn equipment_status(&self, pei: &str) -> Result<(StatusCode, Option<StatusBody>)> {
        let resp = self
            .client
            .get(self.url("/n5g-eir-eic/v1/equipment-status"))
            .query(&[("pei", pei)])
            .send()
            .await
            .context("GET /n5g-eir-eic/v1/equipment-status")?;
        let status = resp.status();
        if status.is_success() {
            Ok((status, Some(resp.json().await.context("parsing equipment-status JSON")?)))
        } else {
            Ok((status, None))
        }
    }

    pub async fn check_imei(&self, imei: &str) -> Result<(StatusCode, Option<StatusBody>)> {
        let resp = self
            .client
            .get(self.url(&format!("/api/v1/check-imei/{imei}")))
            .send()
            .await
            .context("GET /api/v1/check-imei")?;
        let status = resp.status();
        if status.is_success() {
            Ok((status, Some(resp.json().await.context("parsing check-imei JSON")?)))
        } else {
            Ok((status, None))
        }
    }

    pub async fn check_tac(&self, imei: &str) -> Result<(StatusCode, Option<StatusBody>)> {
        let resp = self
            .client
            .get(self.url(&format!("/api/v1/check-tac/{imei}")))
            .send()
            .await
            .context("GET /api/v1/check-tac")?;
        let status = resp.status();
        if status.is_success() {
            Ok((status, Some(resp.json().await.context("parsing check-tac JSON")?)))
        } else {
            Ok((status, None))
        }
    }

    pub async fn insert_tac(&self, start: &str, end: Option<&str>, color: &str) -> Result<StatusCode> {
        let resp = self
            .client
            .post(self.url("/api/v1/insert-tac"))
            .json(&InsertTacBody {
                start_range_tac: start.to_string(),
                end_range_tac: end.map(str::to_string),
                color: color.to_string(),
            })
            .send()
            .await
            .context("POST /api/v1/insert-tac")?;
        Ok(resp.status())
    }

    pub async fn insert_imei(&self, imei: &str, color: &str) -> Result<StatusCode> {
        let resp = self
            .client
            .post(self.url("/api/v1/insert-imei"))
            .json(&InsertImeiBody {
                imei: imei.to_string(),
                color: color.to_string(),
            })
            .send()
            .await
            .context("POST /api/v1/insert-imei")?;
        Ok(resp.status())
    }

    pub async fn remove_tac(&self, key: &str) -> Result<StatusCode> {
        let resp = self
            .client
            .delete(self.url(&format!("/api/v1/tac/{key}")))
            .send()
            .await
            .context("DELETE /api/v1/tac")?;
        Ok(resp.status())
    }

    pub async fn remove_imei(&self, imei: &str) -> Result<StatusCode> {
        let resp = self
            .client
            .delete(self.url(&format!("/api/v1/imei/{imei}")))
            .send()
            .await
            .context("DELETE /api/v1/imei")?;
        Ok(resp.status())
    }

    pub async fn insert_tac_raw(&self, start: &str, end: Option<&str>, color: &str) -> Result<(StatusCode, ProblemDetails)> {
        let resp = self
            .client
            .post(self.url("/api/v1/insert-tac"))
            .json(&InsertTacBody {
                start_range_tac: start.to_string(),
                end_range_tac: end.map(str::to_string),
                color: color.to_string(),
            })
            .send()
            .await
            .context("POST /api/v1/insert-tac")?;
        let status = resp.status();
        let problem = resp.json().await.context("parsing RFC 7807 body")?;
        Ok((status, problem))
    }

    pub async fn list_tac(&self) -> Result<Vec<TacRangeBody>> {
        let resp = self
            .client
            .get(self.url("/api/v1/tac"))
            .send()
            .await
            .context("GET /api/v1/tac")?;
        let status = resp.status();
        if !status.is_success() {
            bail!("GET /api/v1/tac returned {status}");
        }
        resp.json().await.context("parsing tac list JSON")
    }

    pub async fn wait_for_ready(&self, timeout: Duration) -> Result<()> {
        let start = tokio::time::Instant::now();
        loop {
            if start.elapsed() > timeout {
                bail!("daemon did not become ready within {}s", timeout.as_secs());
            }
            match self.health().await {
                Ok(status) if status.is_success() => return Ok(()),
                _ => tokio::time::sleep(Duration::from_millis(200)).await,
            }
        }
    }
}
