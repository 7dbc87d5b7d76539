use std::net::TcpStream;
use std::time::Duration;

use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use crate::foundation::error::{ParallaxError, ParallaxResult};
use crate::project::config::ServiceConfig;
use crate::service::client::{EventStream, ServiceTransport};
use crate::service::protocol::{JobSubmission, SubmitResponse, WireFrame};

/// HTTP + WebSocket transport for a ComfyUI-compatible server.
pub struct ComfyTransport {
    host: String,
    port: u16,
    agent: ureq::Agent,
}

impl ComfyTransport {
    pub fn new(cfg: &ServiceConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout_read(Duration::from_secs(30))
            .timeout_write(Duration::from_secs(30))
            .build();
        Self {
            host: cfg.host.clone(),
            port: cfg.port,
            agent,
        }
    }

    /// `http://host:port/prompt`
    pub fn submit_url(&self) -> String {
        format!("http://{}:{}/prompt", self.host, self.port)
    }

    /// `ws://host:port/ws?clientId=<id>`
    pub fn stream_url(&self, client_id: &str) -> String {
        format!("ws://{}:{}/ws?clientId={client_id}", self.host, self.port)
    }
}

impl ServiceTransport for ComfyTransport {
    fn connect(&mut self, client_id: &str) -> ParallaxResult<Box<dyn EventStream>> {
        let url = self.stream_url(client_id);
        let (socket, _response) = tungstenite::connect(url.as_str()).map_err(|e| ParallaxError::Connection {
            attempts: 1,
            reason: format!("{url}: {e}"),
        })?;
        Ok(Box::new(WsEventStream { socket }))
    }

    fn submit(&mut self, submission: &JobSubmission) -> ParallaxResult<SubmitResponse> {
        let url = self.submit_url();
        let response = match self.agent.post(&url).send_json(submission) {
            Ok(resp) => resp,
            Err(ureq::Error::Status(code, resp)) => {
                let text = resp.into_string().unwrap_or_default();
                return Err(ParallaxError::protocol(format!(
                    "job rejected with HTTP {code}: {text}"
                )));
            }
            Err(e) => {
                return Err(ParallaxError::Connection {
                    attempts: 1,
                    reason: format!("{url}: {e}"),
                });
            }
        };
        response
            .into_json::<SubmitResponse>()
            .map_err(|e| ParallaxError::protocol(format!("unreadable submit response: {e}")))
    }
}

struct WsEventStream {
    socket: WebSocket<MaybeTlsStream<TcpStream>>,
}

impl EventStream for WsEventStream {
    fn next_frame(&mut self) -> ParallaxResult<Option<WireFrame>> {
        loop {
            match self.socket.read() {
                Ok(Message::Text(text)) => return Ok(Some(WireFrame::Text(text))),
                Ok(Message::Binary(bytes)) => return Ok(Some(WireFrame::Binary(bytes))),
                Ok(Message::Close(_)) => return Ok(None),
                Ok(_) => continue,
                Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                    return Ok(None);
                }
                Err(tungstenite::Error::Io(e)) => {
                    tracing::debug!("completion stream io error: {e}");
                    return Ok(None);
                }
                Err(e) => return Err(ParallaxError::protocol(format!("completion stream: {e}"))),
            }
        }
    }
}

impl Drop for WsEventStream {
    fn drop(&mut self) {
        let _ = self.socket.close(None);
        let _ = self.socket.flush();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/service/transport.rs"]
mod tests;
