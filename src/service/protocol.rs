//! Wire types of the inpainting service (ComfyUI naming).

use serde_json::Value;

use crate::foundation::error::{ParallaxError, ParallaxResult};

/// Body of `POST /prompt`.
#[derive(Clone, Debug, serde::Serialize)]
pub struct JobSubmission {
    /// Job graph.
    #[serde(rename = "prompt")]
    pub job: Value,
    /// Id the completion stream was opened with.
    pub client_id: String,
}

/// Response to a job submission.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct SubmitResponse {
    /// Correlator echoed by the completion stream.
    #[serde(rename = "prompt_id", alias = "job_id")]
    pub job_id: String,
    /// Queue position, when reported.
    #[serde(default)]
    pub number: Option<u64>,
}

/// One frame read from the completion stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WireFrame {
    Text(String),
    /// Preview image bytes; never carries control information.
    Binary(Vec<u8>),
}

/// Decoded completion-stream event.
#[derive(Clone, Debug, PartialEq)]
pub enum ServiceEvent {
    Status {
        queue_remaining: Option<u64>,
    },
    Progress {
        value: u64,
        max: u64,
        node: Option<String>,
        job_id: Option<String>,
    },
    /// `node = None` marks the end of the job identified by `job_id`.
    Executing {
        node: Option<String>,
        job_id: Option<String>,
    },
    /// Any other message type; ignored by the client.
    Other(String),
}

#[derive(serde::Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

#[derive(serde::Deserialize)]
struct ProgressData {
    value: u64,
    max: u64,
    #[serde(default)]
    node: Option<String>,
    #[serde(default, rename = "prompt_id", alias = "job_id")]
    job_id: Option<String>,
}

#[derive(serde::Deserialize)]
struct ExecutingData {
    #[serde(default)]
    node: Option<String>,
    #[serde(default, rename = "prompt_id", alias = "job_id")]
    job_id: Option<String>,
}

impl ServiceEvent {
    /// Decode a text frame.
    pub fn parse(text: &str) -> ParallaxResult<Self> {
        let raw: RawEvent = serde_json::from_str(text)
            .map_err(|e| ParallaxError::protocol(format!("malformed event: {e}")))?;
        let event = match raw.kind.as_str() {
            "status" => Self::Status {
                queue_remaining: raw
                    .data
                    .pointer("/status/exec_info/queue_remaining")
                    .and_then(Value::as_u64),
            },
            "progress" => {
                let d: ProgressData = serde_json::from_value(raw.data)
                    .map_err(|e| ParallaxError::protocol(format!("malformed progress event: {e}")))?;
                Self::Progress {
                    value: d.value,
                    max: d.max,
                    node: d.node,
                    job_id: d.job_id,
                }
            }
            "executing" => {
                let d: ExecutingData = serde_json::from_value(raw.data)
                    .map_err(|e| ParallaxError::protocol(format!("malformed executing event: {e}")))?;
                Self::Executing {
                    node: d.node,
                    job_id: d.job_id,
                }
            }
            _ => Self::Other(raw.kind),
        };
        Ok(event)
    }

    /// `true` only for `executing` with no node and a matching job id.
    pub fn is_terminal_for(&self, job_id: &str) -> bool {
        matches!(
            self,
            Self::Executing { node: None, job_id: Some(id) } if id == job_id
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/service/protocol.rs"]
mod tests;
