mod address;
mod grpc;

use async_trait::async_trait;
use elmos_common::error::{ElmosError, Result};
use futures::stream::BoxStream;

use crate::proto::{
    BuildProgress, BuildRequest, CleanRequest, CleanResponse, CloneProgress, CloneRequest,
    ConfigureRequest, ConfigureResponse, ListVersionsRequest, ListVersionsResponse,
    QemuInputRequest, QemuInputResponse, QemuOutput, QemuRunRequest, QemuStopRequest,
    QemuStopResponse,
};

pub use address::Address;
pub use grpc::GrpcTransport;

/// Ordered messages of one server-streaming call. The stream ends with `None`
/// on success or yields one `Err` carrying the final status on failure.
pub type EventStream<M> = BoxStream<'static, std::result::Result<M, ElmosError>>;

/// Connectivity of the underlying channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelState {
    /// No call has needed the connection yet.
    #[default]
    Idle,
    Connecting,
    Ready,
    TransientFailure,
}

impl ChannelState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ChannelState::Ready | ChannelState::Idle)
    }
}

/// Request/response RPC mechanism to the backend.
///
/// One implementation is shared by every call a client makes. Calls may run
/// concurrently; each returned stream has a single reader.
#[async_trait]
pub trait Transport: Send + Sync {
    fn state(&self) -> ChannelState;

    async fn build(&self, request: BuildRequest) -> Result<EventStream<BuildProgress>>;

    async fn clone_kernel(&self, request: CloneRequest) -> Result<EventStream<CloneProgress>>;

    async fn configure(&self, request: ConfigureRequest) -> Result<ConfigureResponse>;

    async fn clean(&self, request: CleanRequest) -> Result<CleanResponse>;

    async fn list_versions(&self, request: ListVersionsRequest) -> Result<ListVersionsResponse>;

    async fn qemu_run(&self, request: QemuRunRequest) -> Result<EventStream<QemuOutput>>;

    async fn qemu_stop(&self, request: QemuStopRequest) -> Result<QemuStopResponse>;

    async fn qemu_send_input(&self, request: QemuInputRequest) -> Result<QemuInputResponse>;
}
