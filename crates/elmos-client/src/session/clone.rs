use elmos_common::types::Outcome;
use tracing::instrument;

use super::StreamMessage;
use crate::proto::{self, CloneRequest};
use crate::transport::Transport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneProgress {
    /// Percent complete, 0-100.
    pub progress: u8,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloneEvent {
    Progress(CloneProgress),
}

impl StreamMessage for proto::CloneProgress {
    type Event = CloneEvent;

    fn into_event(self) -> Option<CloneEvent> {
        Some(CloneEvent::Progress(CloneProgress {
            progress: self.progress.clamp(0, 100) as u8,
            message: self.message,
        }))
    }
}

/// Callbacks for a kernel source checkout stream.
pub trait CloneHandler {
    fn on_progress(&mut self, _progress: CloneProgress) {}
}

pub struct CloneSession<'a> {
    transport: &'a dyn Transport,
}

impl<'a> CloneSession<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    #[instrument(skip(self, handler), fields(version = %request.version))]
    pub async fn run<H: CloneHandler>(&self, request: CloneRequest, handler: &mut H) -> Outcome {
        super::run("Clone", self.transport.clone_kernel(request), |event| match event {
            CloneEvent::Progress(progress) => handler.on_progress(progress),
        })
        .await
    }
}
