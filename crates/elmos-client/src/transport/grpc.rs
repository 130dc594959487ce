use std::sync::Arc;

use async_trait::async_trait;
use elmos_common::error::{ElmosError, Result};
use futures::StreamExt;
use parking_lot::Mutex;
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Status};
use tracing::{debug, info, instrument, warn};

use super::{Address, ChannelState, EventStream, Transport};
use crate::proto::kernel_service_client::KernelServiceClient;
use crate::proto::qemu_service_client::QemuServiceClient;
use crate::proto::{
    BuildProgress, BuildRequest, CleanRequest, CleanResponse, CloneProgress, CloneRequest,
    ConfigureRequest, ConfigureResponse, ListVersionsRequest, ListVersionsResponse,
    QemuInputRequest, QemuInputResponse, QemuOutput, QemuRunRequest, QemuStopRequest,
    QemuStopResponse,
};

/// `tonic` transport over one shared HTTP/2 channel.
///
/// The channel connects on first use. Connection failures surface as the
/// failing call's status and are not retried here.
#[derive(Clone)]
pub struct GrpcTransport {
    address: Address,
    channel: Channel,
    state: Arc<Mutex<ChannelState>>,
}

impl GrpcTransport {
    /// Build a lazily connecting transport. Must be called inside a Tokio runtime.
    #[instrument]
    pub fn connect_lazy(address: &str) -> Result<Self> {
        let address = Address::parse(address)?;
        let channel = Self::channel_for(&address)?;
        info!("Created gRPC channel for {}", address);

        Ok(Self {
            address,
            channel,
            state: Arc::new(Mutex::new(ChannelState::Idle)),
        })
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    fn channel_for(address: &Address) -> Result<Channel> {
        match address {
            Address::Tcp(authority) => {
                let endpoint = Endpoint::from_shared(format!("http://{authority}")).map_err(|e| {
                    ElmosError::InvalidAddress {
                        address: address.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                Ok(endpoint.connect_lazy())
            }
            #[cfg(unix)]
            Address::Unix(path) => {
                use hyper_util::rt::TokioIo;
                use tokio::net::UnixStream;
                use tonic::transport::Uri;

                let path = path.clone();
                // The URI is required by the endpoint but never dialed
                let channel = Endpoint::from_static("http://[::]:50051").connect_with_connector_lazy(
                    tower::service_fn(move |_: Uri| {
                        let path = path.clone();
                        async move {
                            let stream = UnixStream::connect(path).await?;
                            Ok::<_, std::io::Error>(TokioIo::new(stream))
                        }
                    }),
                );
                Ok(channel)
            }
            #[cfg(not(unix))]
            Address::Unix(_) => Err(ElmosError::InvalidAddress {
                address: address.to_string(),
                reason: "unix sockets are not supported on this platform".to_string(),
            }),
        }
    }

    fn begin_call(&self, method: &str) {
        debug!("Calling {}", method);
        let mut state = self.state.lock();
        if *state != ChannelState::Ready {
            *state = ChannelState::Connecting;
        }
    }

    fn settle<T>(&self, method: &str, result: std::result::Result<T, Status>) -> Result<T> {
        match result {
            Ok(value) => {
                record(&self.state, None);
                Ok(value)
            }
            Err(status) => {
                warn!("{} failed: {:?} {}", method, status.code(), status.message());
                record(&self.state, Some(&status));
                Err(status_error(status))
            }
        }
    }

    fn events<M: Send + 'static>(&self, streaming: tonic::Streaming<M>) -> EventStream<M> {
        let state = Arc::clone(&self.state);
        streaming
            .map(move |item| {
                item.map_err(|status| {
                    record(&state, Some(&status));
                    status_error(status)
                })
            })
            .boxed()
    }
}

fn record(state: &Mutex<ChannelState>, status: Option<&Status>) {
    let next = match status {
        Some(status) if status.code() == Code::Unavailable => ChannelState::TransientFailure,
        _ => ChannelState::Ready,
    };
    *state.lock() = next;
}

fn status_error(status: Status) -> ElmosError {
    if status.message().is_empty() {
        ElmosError::Transport(status.code().to_string())
    } else {
        ElmosError::Transport(status.message().to_string())
    }
}

#[async_trait]
impl Transport for GrpcTransport {
    fn state(&self) -> ChannelState {
        *self.state.lock()
    }

    async fn build(&self, request: BuildRequest) -> Result<EventStream<BuildProgress>> {
        self.begin_call("KernelService/Build");
        let result = KernelServiceClient::new(self.channel.clone()).build(request).await;
        let response = self.settle("KernelService/Build", result)?;
        Ok(self.events(response.into_inner()))
    }

    async fn clone_kernel(&self, request: CloneRequest) -> Result<EventStream<CloneProgress>> {
        self.begin_call("KernelService/Clone");
        let result = KernelServiceClient::new(self.channel.clone())
            .clone_kernel(request)
            .await;
        let response = self.settle("KernelService/Clone", result)?;
        Ok(self.events(response.into_inner()))
    }

    async fn configure(&self, request: ConfigureRequest) -> Result<ConfigureResponse> {
        self.begin_call("KernelService/Configure");
        let result = KernelServiceClient::new(self.channel.clone())
            .configure(request)
            .await;
        self.settle("KernelService/Configure", result)
            .map(tonic::Response::into_inner)
    }

    async fn clean(&self, request: CleanRequest) -> Result<CleanResponse> {
        self.begin_call("KernelService/Clean");
        let result = KernelServiceClient::new(self.channel.clone()).clean(request).await;
        self.settle("KernelService/Clean", result)
            .map(tonic::Response::into_inner)
    }

    async fn list_versions(&self, request: ListVersionsRequest) -> Result<ListVersionsResponse> {
        self.begin_call("KernelService/ListVersions");
        let result = KernelServiceClient::new(self.channel.clone())
            .list_versions(request)
            .await;
        self.settle("KernelService/ListVersions", result)
            .map(tonic::Response::into_inner)
    }

    async fn qemu_run(&self, request: QemuRunRequest) -> Result<EventStream<QemuOutput>> {
        self.begin_call("QEMUService/Run");
        let result = QemuServiceClient::new(self.channel.clone()).run(request).await;
        let response = self.settle("QEMUService/Run", result)?;
        Ok(self.events(response.into_inner()))
    }

    async fn qemu_stop(&self, request: QemuStopRequest) -> Result<QemuStopResponse> {
        self.begin_call("QEMUService/Stop");
        let result = QemuServiceClient::new(self.channel.clone()).stop(request).await;
        self.settle("QEMUService/Stop", result)
            .map(tonic::Response::into_inner)
    }

    async fn qemu_send_input(&self, request: QemuInputRequest) -> Result<QemuInputResponse> {
        self.begin_call("QEMUService/SendInput");
        let result = QemuServiceClient::new(self.channel.clone())
            .send_input(request)
            .await;
        self.settle("QEMUService/SendInput", result)
            .map(tonic::Response::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_follows_status_codes() {
        let state = Mutex::new(ChannelState::Connecting);

        record(&state, Some(&Status::unavailable("connection refused")));
        assert_eq!(*state.lock(), ChannelState::TransientFailure);

        // The server answered, even if it rejected the call
        record(&state, Some(&Status::invalid_argument("unknown config type")));
        assert_eq!(*state.lock(), ChannelState::Ready);

        record(&state, None);
        assert_eq!(*state.lock(), ChannelState::Ready);
    }

    #[test]
    fn test_status_error_falls_back_to_code() {
        assert_eq!(
            status_error(Status::unavailable("connection refused")),
            ElmosError::Transport("connection refused".to_string())
        );
        assert_eq!(
            status_error(Status::new(Code::Internal, "")),
            ElmosError::Transport(Code::Internal.to_string())
        );
    }

    #[tokio::test]
    async fn test_lazy_channel_starts_idle() {
        let transport = GrpcTransport::connect_lazy("tcp://127.0.0.1:1").unwrap();
        assert_eq!(transport.state(), ChannelState::Idle);
        assert_eq!(transport.address(), &Address::Tcp("127.0.0.1:1".to_string()));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_transport_error() {
        let transport = GrpcTransport::connect_lazy("tcp://127.0.0.1:1").unwrap();
        let result = transport
            .list_versions(ListVersionsRequest { limit: 5 })
            .await;

        assert!(matches!(result, Err(ElmosError::Transport(_))));
        assert_ne!(transport.state(), ChannelState::Idle);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_missing_unix_socket_is_a_transport_error() {
        let transport = GrpcTransport::connect_lazy("unix:///nonexistent/elmos.sock").unwrap();
        let result = transport
            .configure(ConfigureRequest {
                config_type: "defconfig".to_string(),
            })
            .await;

        assert!(matches!(result, Err(ElmosError::Transport(_))));
    }
}
