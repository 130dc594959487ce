//! In-memory transport that replays scripted replies and records requests.

#![allow(dead_code)]

use std::collections::VecDeque;

use async_trait::async_trait;
use elmos_client::proto::{
    build_progress, qemu_output, BuildComplete, BuildProgress, BuildRequest, BuildStage,
    CleanRequest, CleanResponse, CloneProgress, CloneRequest, ConfigureRequest,
    ConfigureResponse, ConsoleOutput, ListVersionsRequest, ListVersionsResponse, LogMessage,
    QemuError, QemuInputRequest, QemuInputResponse, QemuOutput, QemuRunRequest, QemuStarted,
    QemuStopRequest, QemuStopResponse, QemuStopped,
};
use elmos_client::transport::{ChannelState, EventStream, Transport};
use elmos_common::error::{ElmosError, Result};
use futures::{stream, StreamExt};
use parking_lot::Mutex;

/// A request the transport received.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Build(BuildRequest),
    Clone(CloneRequest),
    Configure(ConfigureRequest),
    Clean(CleanRequest),
    ListVersions(ListVersionsRequest),
    QemuRun(QemuRunRequest),
    QemuStop,
    QemuInput(QemuInputRequest),
}

type Streamed<M> = Result<Vec<Result<M>>>;

struct Script<T>(Mutex<VecDeque<T>>);

impl<T> Default for Script<T> {
    fn default() -> Self {
        Script(Mutex::new(VecDeque::new()))
    }
}

impl<T> Script<T> {
    fn push(&self, reply: T) {
        self.0.lock().push_back(reply);
    }

    fn next(&self, method: &str) -> Result<T> {
        self.0
            .lock()
            .pop_front()
            .ok_or_else(|| ElmosError::Transport(format!("no scripted reply for {method}")))
    }
}

fn streamed<M: Send + 'static>(reply: Result<Streamed<M>>) -> Result<EventStream<M>> {
    let items = reply??;
    Ok(stream::iter(items).boxed())
}

#[derive(Default)]
pub struct ScriptedTransport {
    state: Mutex<ChannelState>,
    calls: Mutex<Vec<Call>>,
    builds: Script<Streamed<BuildProgress>>,
    clones: Script<Streamed<CloneProgress>>,
    runs: Script<Streamed<QemuOutput>>,
    configures: Script<Result<ConfigureResponse>>,
    cleans: Script<Result<CleanResponse>>,
    versions: Script<Result<ListVersionsResponse>>,
    stops: Script<Result<QemuStopResponse>>,
    inputs: Script<Result<QemuInputResponse>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_state(&self, state: ChannelState) {
        *self.state.lock() = state;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn script_build(&self, reply: Streamed<BuildProgress>) {
        self.builds.push(reply);
    }

    pub fn script_clone(&self, reply: Streamed<CloneProgress>) {
        self.clones.push(reply);
    }

    pub fn script_qemu_run(&self, reply: Streamed<QemuOutput>) {
        self.runs.push(reply);
    }

    pub fn script_configure(&self, reply: Result<ConfigureResponse>) {
        self.configures.push(reply);
    }

    pub fn script_clean(&self, reply: Result<CleanResponse>) {
        self.cleans.push(reply);
    }

    pub fn script_list_versions(&self, reply: Result<ListVersionsResponse>) {
        self.versions.push(reply);
    }

    pub fn script_qemu_stop(&self, reply: Result<QemuStopResponse>) {
        self.stops.push(reply);
    }

    pub fn script_qemu_input(&self, reply: Result<QemuInputResponse>) {
        self.inputs.push(reply);
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn state(&self) -> ChannelState {
        *self.state.lock()
    }

    async fn build(&self, request: BuildRequest) -> Result<EventStream<BuildProgress>> {
        self.record(Call::Build(request));
        streamed(self.builds.next("Build"))
    }

    async fn clone_kernel(&self, request: CloneRequest) -> Result<EventStream<CloneProgress>> {
        self.record(Call::Clone(request));
        streamed(self.clones.next("Clone"))
    }

    async fn configure(&self, request: ConfigureRequest) -> Result<ConfigureResponse> {
        self.record(Call::Configure(request));
        self.configures.next("Configure")?
    }

    async fn clean(&self, request: CleanRequest) -> Result<CleanResponse> {
        self.record(Call::Clean(request));
        self.cleans.next("Clean")?
    }

    async fn list_versions(&self, request: ListVersionsRequest) -> Result<ListVersionsResponse> {
        self.record(Call::ListVersions(request));
        self.versions.next("ListVersions")?
    }

    async fn qemu_run(&self, request: QemuRunRequest) -> Result<EventStream<QemuOutput>> {
        self.record(Call::QemuRun(request));
        streamed(self.runs.next("Run"))
    }

    async fn qemu_stop(&self, _request: QemuStopRequest) -> Result<QemuStopResponse> {
        self.record(Call::QemuStop);
        self.stops.next("Stop")?
    }

    async fn qemu_send_input(&self, request: QemuInputRequest) -> Result<QemuInputResponse> {
        self.record(Call::QemuInput(request));
        self.inputs.next("SendInput")?
    }
}

pub fn stage(name: &str, progress: i32) -> BuildProgress {
    BuildProgress {
        event: Some(build_progress::Event::Stage(BuildStage {
            name: name.to_string(),
            progress,
            current_file: 0,
            total_files: 0,
        })),
    }
}

pub fn log(level: i32, message: &str) -> BuildProgress {
    BuildProgress {
        event: Some(build_progress::Event::Log(LogMessage {
            level,
            message: message.to_string(),
            timestamp_ms: 0,
        })),
    }
}

pub fn complete(success: bool, duration_ms: i64) -> BuildProgress {
    BuildProgress {
        event: Some(build_progress::Event::Complete(BuildComplete {
            success,
            duration_ms,
            image_path: String::new(),
        })),
    }
}

pub fn started(pid: i32) -> QemuOutput {
    QemuOutput {
        event: Some(qemu_output::Event::Started(QemuStarted {
            pid,
            qemu_version: "8.2.0".to_string(),
            command: "qemu-system-x86_64".to_string(),
        })),
    }
}

pub fn console(data: &'static [u8]) -> QemuOutput {
    QemuOutput {
        event: Some(qemu_output::Event::Console(ConsoleOutput {
            data: bytes::Bytes::from_static(data),
            timestamp_ms: 0,
        })),
    }
}

pub fn stopped(exit_code: i32, uptime_ms: i64) -> QemuOutput {
    QemuOutput {
        event: Some(qemu_output::Event::Stopped(QemuStopped {
            exit_code,
            uptime_ms,
        })),
    }
}

pub fn qemu_error(message: &str) -> QemuOutput {
    QemuOutput {
        event: Some(qemu_output::Event::Error(QemuError {
            message: message.to_string(),
        })),
    }
}
