//! Coordinator HTTP Client
//!
//! Typed wrapper over the coordinator's wire protocol, used by every worker.
//! All calls go through retry helpers with exponential backoff and jitter to
//! ride out transient network blips; sustained unreachability surfaces as an
//! error the caller decides about.

use crate::coordinator::protocol::{
    AckResponse, CompleteRequest, ENDPOINT_COMPLETE, ENDPOINT_PROGRESS, ENDPOINT_REGISTER,
    ENDPOINT_STORE_ENTRIES, ENDPOINT_WORK, ProgressRequest, RegisterRequest, StoreEntriesRequest,
    StoreEntriesResponse,
};
use crate::coordinator::types::{WorkId, WorkUnit};
use crate::storage::types::AddressedEntry;

use anyhow::Result;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_millis(2000);
const RETRY_ATTEMPTS: usize = 3;

pub struct CoordinatorClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl CoordinatorClient {
    /// `base_url` like `http://127.0.0.1:6000`, no trailing slash.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    pub async fn register(&self, worker_id: &str, address: &str) -> Result<()> {
        let payload = RegisterRequest {
            worker_id: worker_id.to_string(),
            address: address.to_string(),
        };
        let response = self
            .post_with_retry(format!("{}{}", self.base_url, ENDPOINT_REGISTER), &payload)
            .await?;

        let ack: AckResponse = response.json().await?;
        if !ack.success {
            return Err(anyhow::anyhow!(
                "registration rejected: {}",
                ack.error.unwrap_or_default()
            ));
        }
        Ok(())
    }

    /// `None` when the coordinator answers 204 (empty queue).
    pub async fn request_work(&self, worker_id: &str) -> Result<Option<WorkUnit>> {
        let url = format!(
            "{}{}?worker_id={}",
            self.base_url, ENDPOINT_WORK, worker_id
        );
        let response = self.get_with_retry(url).await?;

        if response.status() == reqwest::StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "work request failed: {}",
                response.status()
            ));
        }

        let unit: WorkUnit = response.json().await?;
        Ok(Some(unit))
    }

    pub async fn report_progress(
        &self,
        worker_id: &str,
        work_id: &WorkId,
        entries_processed: u64,
        processing_rate: f64,
    ) -> Result<()> {
        let payload = ProgressRequest {
            worker_id: worker_id.to_string(),
            work_id: work_id.clone(),
            entries_processed,
            processing_rate,
        };
        let response = self
            .post_with_retry(format!("{}{}", self.base_url, ENDPOINT_PROGRESS), &payload)
            .await?;

        let ack: AckResponse = response.json().await?;
        if !ack.success {
            return Err(anyhow::anyhow!(
                "progress rejected: {}",
                ack.error.unwrap_or_default()
            ));
        }
        Ok(())
    }

    pub async fn complete_work(
        &self,
        worker_id: &str,
        work_id: &WorkId,
        success: bool,
        final_count: u64,
        errors: Vec<String>,
    ) -> Result<()> {
        let payload = CompleteRequest {
            worker_id: worker_id.to_string(),
            work_id: work_id.clone(),
            success,
            final_count,
            errors,
        };
        let response = self
            .post_with_retry(format!("{}{}", self.base_url, ENDPOINT_COMPLETE), &payload)
            .await?;

        let ack: AckResponse = response.json().await?;
        if !ack.success {
            return Err(anyhow::anyhow!(
                "completion rejected: {}",
                ack.error.unwrap_or_default()
            ));
        }
        Ok(())
    }

    /// Fallback persistence path: ships a batch to the coordinator's
    /// `/store_entries` endpoint. Returns how many entries were new.
    pub async fn store_entries(
        &self,
        worker_id: &str,
        entries: &[AddressedEntry],
    ) -> Result<usize> {
        let payload = StoreEntriesRequest {
            worker_id: worker_id.to_string(),
            entries: entries.to_vec(),
        };
        let response = self
            .post_with_retry(
                format!("{}{}", self.base_url, ENDPOINT_STORE_ENTRIES),
                &payload,
            )
            .await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "store_entries failed: {}",
                response.status()
            ));
        }

        let stored: StoreEntriesResponse = response.json().await?;
        Ok(stored.stored)
    }

    // --- HTTP Helpers with Backoff ---

    async fn post_with_retry<T: serde::Serialize>(
        &self,
        url: String,
        payload: &T,
    ) -> Result<reqwest::Response> {
        let mut delay_ms = 150u64;

        for attempt in 0..RETRY_ATTEMPTS {
            let response = self
                .http_client
                .post(url.clone())
                .json(payload)
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await;

            match response {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    if attempt + 1 == RETRY_ATTEMPTS {
                        return Err(anyhow::anyhow!(e));
                    }
                    // Simple jitter to prevent thundering herd
                    let jitter = rand::random::<u64>() % 50;
                    tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                    delay_ms = (delay_ms * 2).min(1200);
                }
            }
        }

        Err(anyhow::anyhow!("Retry attempts exhausted"))
    }

    async fn get_with_retry(&self, url: String) -> Result<reqwest::Response> {
        let mut delay_ms = 150u64;

        for attempt in 0..RETRY_ATTEMPTS {
            let response = self
                .http_client
                .get(url.clone())
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await;

            match response {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    if attempt + 1 == RETRY_ATTEMPTS {
                        return Err(anyhow::anyhow!(e));
                    }
                    let jitter = rand::random::<u64>() % 50;
                    tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                    delay_ms = (delay_ms * 2).min(1200);
                }
            }
        }

        Err(anyhow::anyhow!("Retry attempts exhausted"))
    }
}
