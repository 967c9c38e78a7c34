//! # Collector Delivery
//!
//! Posts switch-event batches to the remote collector as JSON. Batches
//! that fail to send are kept and retried on the next flush until they
//! outlive the retry deadline; a heartbeat record goes out whenever a
//! flush has nothing else to say, so the collector can tell a quiet
//! gateway from a dead one.

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::CollectorConfig;
use crate::events::SwitchEvent;

/// One record in the collector's envelope format
#[derive(Debug, Clone, Serialize)]
pub struct CollectorRecord {
    pub timestamp: i64,
    #[serde(rename = "deviceId")]
    pub device_id: String,
    #[serde(rename = "deviceType")]
    pub device_type: String,
    pub version: String,
    pub payload: serde_json::Value,
}

/// HTTP client for the collector endpoint
#[derive(Debug)]
pub struct CloudLogger {
    client: reqwest::Client,
    url: String,
    device_id: String,
    device_type: String,
    version: String,
    retry_limit_ms: i64,
    chunk_size: usize,
    /// Records that failed to send and are awaiting retry
    unsent: Vec<CollectorRecord>,
}

impl CloudLogger {
    pub fn new(config: &CollectorConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.endpoint_url.clone(),
            device_id: config.device_id.clone(),
            device_type: config.device_type.clone(),
            version: config.version.clone(),
            retry_limit_ms: config.retry_limit_ms as i64,
            chunk_size: config.send_chunk_size,
            unsent: Vec::new(),
        }
    }

    /// Send new events plus any pending retries; heartbeat when idle
    ///
    /// Never fails the caller: delivery errors are logged and the
    /// affected records kept for the next flush. Records older than the
    /// retry deadline are dropped before sending.
    pub async fn send_log(&mut self, events: &[SwitchEvent]) {
        let now = Utc::now().timestamp_millis();

        let mut pending = std::mem::take(&mut self.unsent);
        pending.extend(events.iter().map(|e| self.button_push_record(e)));
        pending.retain(|record| {
            let fresh = now - record.timestamp < self.retry_limit_ms;
            if !fresh {
                warn!(
                    timestamp = record.timestamp,
                    "dropping record past the retry deadline"
                );
            }
            fresh
        });

        if pending.is_empty() {
            debug!("no events to send, sending heartbeat");
            let heartbeat = vec![self.heartbeat_record(now)];
            self.post_chunked(heartbeat).await;
            return;
        }

        info!(records = pending.len(), "sending events to collector");
        self.unsent = self.post_chunked(pending).await;
    }

    /// Records currently queued for retry
    pub fn pending(&self) -> usize {
        self.unsent.len()
    }

    /// POST records in chunks, returning the ones that failed
    async fn post_chunked(&self, records: Vec<CollectorRecord>) -> Vec<CollectorRecord> {
        let mut failed = Vec::new();
        for chunk in records.chunks(self.chunk_size) {
            let response = self.client.post(&self.url).json(&chunk).send().await;
            match response.and_then(|r| r.error_for_status()) {
                Ok(response) => {
                    debug!(status = %response.status(), "collector accepted batch");
                }
                Err(e) => {
                    warn!("collector delivery failed: {e}");
                    failed.extend_from_slice(chunk);
                }
            }
        }
        failed
    }

    fn button_push_record(&self, event: &SwitchEvent) -> CollectorRecord {
        CollectorRecord {
            timestamp: event.timestamp,
            device_id: self.device_id.clone(),
            device_type: self.device_type.clone(),
            version: self.version.clone(),
            payload: json!({
                "type": "buttonPush",
                "data": {
                    "originatorId": event.originator_id,
                    "switchId": event.button_pressed,
                    "count": event.count,
                },
            }),
        }
    }

    fn heartbeat_record(&self, now: i64) -> CollectorRecord {
        CollectorRecord {
            timestamp: now,
            device_id: self.device_id.clone(),
            device_type: self.device_type.clone(),
            version: self.version.clone(),
            payload: json!({ "type": "heartbeat" }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Button;

    fn test_logger() -> CloudLogger {
        CloudLogger::new(&CollectorConfig {
            endpoint_url: "https://collector.example.com/api/v1/events".to_string(),
            device_id: "gateway-01".to_string(),
            device_type: "enocean-gateway".to_string(),
            version: "0.1.0".to_string(),
            send_interval_ms: 10_000,
            retry_limit_ms: 600_000,
            send_chunk_size: 50,
        })
    }

    #[test]
    fn test_button_push_record_envelope() {
        let logger = test_logger();
        let record = logger.button_push_record(&SwitchEvent {
            timestamp: 1_700_000_000_000,
            originator_id: "002e5c72".to_string(),
            button_pressed: Button::B1,
            count: 3,
        });

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["timestamp"], 1_700_000_000_000_i64);
        assert_eq!(json["deviceId"], "gateway-01");
        assert_eq!(json["deviceType"], "enocean-gateway");
        assert_eq!(json["version"], "0.1.0");
        assert_eq!(json["payload"]["type"], "buttonPush");
        assert_eq!(json["payload"]["data"]["originatorId"], "002e5c72");
        assert_eq!(json["payload"]["data"]["switchId"], "B1");
        assert_eq!(json["payload"]["data"]["count"], 3);
    }

    #[test]
    fn test_heartbeat_record_envelope() {
        let logger = test_logger();
        let record = logger.heartbeat_record(1_700_000_000_000);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["payload"]["type"], "heartbeat");
        assert_eq!(json["deviceId"], "gateway-01");
        assert!(json["payload"].get("data").is_none());
    }

    #[tokio::test]
    async fn test_failed_delivery_is_requeued() {
        // Unroutable endpoint: the POST fails, the record must survive
        // for the next flush.
        let mut logger = test_logger();
        logger.url = "http://127.0.0.1:9/events".to_string();

        logger
            .send_log(&[SwitchEvent {
                timestamp: Utc::now().timestamp_millis(),
                originator_id: "002e5c72".to_string(),
                button_pressed: Button::A0,
                count: 0,
            }])
            .await;

        assert_eq!(logger.pending(), 1);
    }

    #[tokio::test]
    async fn test_expired_records_are_dropped() {
        let mut logger = test_logger();
        logger.url = "http://127.0.0.1:9/events".to_string();

        // Already past the retry deadline; never sent, never requeued.
        logger
            .send_log(&[SwitchEvent {
                timestamp: Utc::now().timestamp_millis() - 601_000,
                originator_id: "002e5c72".to_string(),
                button_pressed: Button::A0,
                count: 0,
            }])
            .await;

        assert_eq!(logger.pending(), 0);
    }
}
