use std::time::{Duration, Instant};

use crate::extend::progress::ProgressSink;
use crate::foundation::error::{ParallaxError, ParallaxResult};
use crate::project::config::ServiceConfig;
use crate::service::protocol::{JobSubmission, ServiceEvent, SubmitResponse, WireFrame};
use crate::service::workflow::Workflow;

/// Completion stream opened for one client id.
pub trait EventStream {
    /// Next frame, or `None` once the stream has closed.
    fn next_frame(&mut self) -> ParallaxResult<Option<WireFrame>>;
}

/// Connection seam between the client state machine and the network.
pub trait ServiceTransport {
    /// Open the completion stream for `client_id`.
    fn connect(&mut self, client_id: &str) -> ParallaxResult<Box<dyn EventStream>>;
    /// Queue one job.
    fn submit(&mut self, submission: &JobSubmission) -> ParallaxResult<SubmitResponse>;
}

/// Lifecycle of one job submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientState {
    Disconnected,
    Connecting { attempt: u32 },
    Connected,
    AwaitingResult { job_id: String },
    Done { job_id: String },
}

/// Fixed connect-attempt budget with a fixed delay between attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(cfg: &ServiceConfig) -> Self {
        Self {
            max_attempts: cfg.max_connect_attempts.max(1),
            delay: Duration::from_millis(cfg.retry_delay_ms),
        }
    }
}

/// Outcome of a completed job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobOutcome {
    /// Correlator the service assigned.
    pub job_id: String,
    /// Connect attempts it took to reach the service.
    pub connect_attempts: u32,
}

/// Anything that can run one inpainting job to completion.
pub trait InpaintService {
    /// Submit `workflow` and block until the service reports it finished.
    fn run_job(&mut self, workflow: &Workflow, progress: &mut dyn ProgressSink) -> ParallaxResult<JobOutcome>;
}

/// Submits one job at a time and waits for its terminal event.
pub struct InpaintingServiceClient<T> {
    transport: T,
    client_id: String,
    retry: RetryPolicy,
    state: ClientState,
}

impl<T: ServiceTransport> InpaintingServiceClient<T> {
    /// Create a disconnected client with a fresh random client id.
    pub fn new(transport: T, retry: RetryPolicy) -> Self {
        Self {
            transport,
            client_id: uuid::Uuid::new_v4().to_string(),
            retry,
            state: ClientState::Disconnected,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn connect(&mut self) -> ParallaxResult<(Box<dyn EventStream>, u32)> {
        let mut last_error = String::new();
        for attempt in 1..=self.retry.max_attempts {
            self.state = ClientState::Connecting { attempt };
            match self.transport.connect(&self.client_id) {
                Ok(stream) => {
                    self.state = ClientState::Connected;
                    tracing::debug!(attempt, client_id = %self.client_id, "connected to service");
                    return Ok((stream, attempt));
                }
                Err(e) => {
                    tracing::warn!(attempt, max = self.retry.max_attempts, "service connect failed: {e}");
                    last_error = e.to_string();
                    if attempt < self.retry.max_attempts {
                        std::thread::sleep(self.retry.delay);
                    }
                }
            }
        }
        self.state = ClientState::Disconnected;
        Err(ParallaxError::Connection {
            attempts: self.retry.max_attempts,
            reason: last_error,
        })
    }
}

impl<T: ServiceTransport> InpaintService for InpaintingServiceClient<T> {
    #[tracing::instrument(skip_all, fields(client_id = %self.client_id))]
    fn run_job(&mut self, workflow: &Workflow, progress: &mut dyn ProgressSink) -> ParallaxResult<JobOutcome> {
        let started = Instant::now();
        let (mut stream, connect_attempts) = self.connect()?;

        let submission = JobSubmission {
            job: workflow.to_value(),
            client_id: self.client_id.clone(),
        };
        let response = match self.transport.submit(&submission) {
            Ok(r) => r,
            Err(e) => {
                self.state = ClientState::Disconnected;
                return Err(e);
            }
        };
        let job_id = response.job_id;
        tracing::debug!(%job_id, queue_number = ?response.number, "job queued");
        self.state = ClientState::AwaitingResult {
            job_id: job_id.clone(),
        };

        if let Err(e) = await_completion(stream.as_mut(), workflow, &job_id, progress) {
            self.state = ClientState::Disconnected;
            return Err(e);
        }

        tracing::info!(%job_id, elapsed_ms = started.elapsed().as_millis() as u64, "job complete");
        self.state = ClientState::Done {
            job_id: job_id.clone(),
        };
        Ok(JobOutcome {
            job_id,
            connect_attempts,
        })
    }
}

fn await_completion(
    stream: &mut dyn EventStream,
    workflow: &Workflow,
    job_id: &str,
    progress: &mut dyn ProgressSink,
) -> ParallaxResult<()> {
    loop {
        let text = match stream.next_frame()? {
            None => {
                return Err(ParallaxError::Disconnected {
                    job_id: job_id.to_string(),
                });
            }
            Some(WireFrame::Binary(_)) => continue,
            Some(WireFrame::Text(text)) => text,
        };
        let event = ServiceEvent::parse(&text)?;
        if event.is_terminal_for(job_id) {
            return Ok(());
        }
        match event {
            ServiceEvent::Status { queue_remaining } => progress.on_status(queue_remaining),
            ServiceEvent::Progress {
                value,
                max,
                node,
                job_id: id,
            } if id.as_deref().is_none_or(|v| v == job_id) => {
                let name = node.map_or_else(|| "Unknown".to_string(), |n| workflow.node_name(&n));
                progress.on_progress(&name, value, max);
            }
            ServiceEvent::Executing {
                node: Some(node),
                job_id: id,
            } if id.as_deref().is_none_or(|v| v == job_id) => {
                progress.on_executing(&workflow.node_name(&node));
            }
            _ => {}
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/service/client.rs"]
mod tests;
