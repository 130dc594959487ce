use bytes::Bytes;

use crate::session::build::{BuildStage, BuildSummary, CompileError, LogLine};
use crate::session::clone::CloneProgress;

/// Events republished by the client to its subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A build entered a new stage or advanced within one
    BuildStageChanged(BuildStage),

    /// A build log line arrived
    BuildLogReceived(LogLine),

    /// The compiler reported an error
    BuildErrorReceived(CompileError),

    /// The build finished; the last build notification of the call
    BuildCompleted(BuildSummary),

    /// Kernel checkout progress
    CloneProgress(CloneProgress),

    /// QEMU process started
    QemuStarted {
        pid: i32,
        version: String,
        command: String,
    },

    /// Raw console bytes from the guest
    QemuConsoleOutput(Bytes),

    /// QEMU exited; the last QEMU notification of the call
    QemuStopped { exit_code: i32, uptime_ms: u64 },

    /// QEMU reported an error without stopping
    QemuError(String),

    /// An operation failed
    ErrorOccurred(String),
}
