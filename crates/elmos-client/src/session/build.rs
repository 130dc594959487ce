use std::path::PathBuf;

use elmos_common::types::{LogLevel, Outcome};
use tracing::instrument;

use super::StreamMessage;
use crate::proto::{build_progress, BuildProgress, BuildRequest};
use crate::transport::Transport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildStage {
    pub name: String,
    /// Percent complete, 0-100.
    pub progress: u8,
    pub current_file: u32,
    pub total_files: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub level: LogLevel,
    pub message: String,
    pub timestamp_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    pub message: String,
    pub location: Option<SourceLocation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub success: bool,
    pub duration_ms: u64,
    pub image_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    Stage(BuildStage),
    Log(LogLine),
    CompileError(CompileError),
    Complete(BuildSummary),
}

fn count(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

impl StreamMessage for BuildProgress {
    type Event = BuildEvent;

    fn into_event(self) -> Option<BuildEvent> {
        let event = match self.event? {
            build_progress::Event::Stage(stage) => BuildEvent::Stage(BuildStage {
                name: stage.name,
                progress: stage.progress.clamp(0, 100) as u8,
                current_file: count(stage.current_file),
                total_files: count(stage.total_files),
            }),
            build_progress::Event::Log(log) => BuildEvent::Log(LogLine {
                level: LogLevel::from_wire(log.level),
                message: log.message,
                timestamp_ms: log.timestamp_ms,
            }),
            build_progress::Event::Error(error) => {
                let location = (!error.file.is_empty()).then(|| SourceLocation {
                    file: error.file,
                    line: u32::try_from(error.line).ok().filter(|line| *line > 0),
                });
                BuildEvent::CompileError(CompileError {
                    message: error.message,
                    location,
                })
            }
            build_progress::Event::Complete(complete) => BuildEvent::Complete(BuildSummary {
                success: complete.success,
                duration_ms: u64::try_from(complete.duration_ms).unwrap_or(0),
                image_path: (!complete.image_path.is_empty())
                    .then(|| PathBuf::from(complete.image_path)),
            }),
        };
        Some(event)
    }

    fn is_terminal(event: &BuildEvent) -> bool {
        matches!(event, BuildEvent::Complete(_))
    }
}

/// Callbacks for a kernel build stream. Unhandled tags default to no-ops.
pub trait BuildHandler {
    fn on_stage(&mut self, _stage: BuildStage) {}

    fn on_log(&mut self, _line: LogLine) {}

    fn on_compile_error(&mut self, _error: CompileError) {}

    fn on_complete(&mut self, _summary: BuildSummary) {}
}

pub struct BuildSession<'a> {
    transport: &'a dyn Transport,
}

impl<'a> BuildSession<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    #[instrument(skip(self, handler), fields(arch = %request.arch, jobs = request.jobs))]
    pub async fn run<H: BuildHandler>(&self, request: BuildRequest, handler: &mut H) -> Outcome {
        super::run("Build", self.transport.build(request), |event| match event {
            BuildEvent::Stage(stage) => handler.on_stage(stage),
            BuildEvent::Log(line) => handler.on_log(line),
            BuildEvent::CompileError(error) => handler.on_compile_error(error),
            BuildEvent::Complete(summary) => handler.on_complete(summary),
        })
        .await
    }
}
