use bytes::Bytes;
use elmos_common::types::Outcome;
use tracing::instrument;

use super::StreamMessage;
use crate::proto::{qemu_output, QemuOutput, QemuRunRequest};
use crate::transport::Transport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QemuEvent {
    Started {
        pid: i32,
        version: String,
        command: String,
    },
    /// Raw console bytes. May split escape sequences and UTF-8 characters.
    Console(Bytes),
    Stopped {
        exit_code: i32,
        uptime_ms: u64,
    },
    /// Reported by the server; the stream stays open.
    Error(String),
}

impl StreamMessage for QemuOutput {
    type Event = QemuEvent;

    fn into_event(self) -> Option<QemuEvent> {
        let event = match self.event? {
            qemu_output::Event::Started(started) => QemuEvent::Started {
                pid: started.pid,
                version: started.qemu_version,
                command: started.command,
            },
            qemu_output::Event::Console(output) => QemuEvent::Console(output.data),
            qemu_output::Event::Stopped(stopped) => QemuEvent::Stopped {
                exit_code: stopped.exit_code,
                uptime_ms: u64::try_from(stopped.uptime_ms).unwrap_or(0),
            },
            qemu_output::Event::Error(error) => QemuEvent::Error(error.message),
        };
        Some(event)
    }

    fn is_terminal(event: &QemuEvent) -> bool {
        matches!(event, QemuEvent::Stopped { .. })
    }
}

/// Callbacks for a QEMU run stream.
pub trait QemuHandler {
    fn on_started(&mut self, _pid: i32, _version: &str, _command: &str) {}

    fn on_console(&mut self, _data: Bytes) {}

    fn on_stopped(&mut self, _exit_code: i32, _uptime_ms: u64) {}

    fn on_error(&mut self, _message: &str) {}
}

pub struct QemuSession<'a> {
    transport: &'a dyn Transport,
}

impl<'a> QemuSession<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    #[instrument(
        skip(self, handler),
        fields(memory_mb = request.memory_mb, cpus = request.cpus, graphical = request.graphical)
    )]
    pub async fn run<H: QemuHandler>(&self, request: QemuRunRequest, handler: &mut H) -> Outcome {
        super::run("QEMU run", self.transport.qemu_run(request), |event| match event {
            QemuEvent::Started {
                pid,
                version,
                command,
            } => handler.on_started(pid, &version, &command),
            QemuEvent::Console(data) => handler.on_console(data),
            QemuEvent::Stopped {
                exit_code,
                uptime_ms,
            } => handler.on_stopped(exit_code, uptime_ms),
            QemuEvent::Error(message) => handler.on_error(&message),
        })
        .await
    }
}
