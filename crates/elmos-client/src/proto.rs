//! Wire schemas and service stubs for the `elmos.v1` gRPC package.
//!
//! Declared by hand in the shape `prost-build` and `tonic-build` emit, so the
//! crate builds without `protoc`.

#![allow(missing_docs)]

use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::Channel;

// ---------------------------------------------------------------------------
// KernelService messages
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BuildRequest {
    #[prost(string, repeated, tag = "1")]
    pub targets: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(int32, tag = "2")]
    pub jobs: i32,
    #[prost(string, tag = "3")]
    pub arch: ::prost::alloc::string::String,
    #[prost(bool, tag = "4")]
    pub verbose: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BuildProgress {
    #[prost(oneof = "build_progress::Event", tags = "1, 2, 3, 4")]
    pub event: ::core::option::Option<build_progress::Event>,
}

pub mod build_progress {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Event {
        #[prost(message, tag = "1")]
        Stage(super::BuildStage),
        #[prost(message, tag = "2")]
        Log(super::LogMessage),
        #[prost(message, tag = "3")]
        Error(super::BuildError),
        #[prost(message, tag = "4")]
        Complete(super::BuildComplete),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BuildStage {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    #[prost(int32, tag = "2")]
    pub progress: i32,
    #[prost(int32, tag = "3")]
    pub current_file: i32,
    #[prost(int32, tag = "4")]
    pub total_files: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LogMessage {
    #[prost(int32, tag = "1")]
    pub level: i32,
    #[prost(string, tag = "2")]
    pub message: ::prost::alloc::string::String,
    #[prost(int64, tag = "3")]
    pub timestamp_ms: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BuildError {
    #[prost(string, tag = "1")]
    pub message: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub file: ::prost::alloc::string::String,
    #[prost(int32, tag = "3")]
    pub line: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BuildComplete {
    #[prost(bool, tag = "1")]
    pub success: bool,
    #[prost(int64, tag = "2")]
    pub duration_ms: i64,
    #[prost(string, tag = "3")]
    pub image_path: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CloneRequest {
    #[prost(string, tag = "1")]
    pub version: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CloneProgress {
    #[prost(int32, tag = "1")]
    pub progress: i32,
    #[prost(string, tag = "2")]
    pub message: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ConfigureRequest {
    #[prost(string, tag = "1")]
    pub config_type: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ConfigureResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
    #[prost(string, tag = "2")]
    pub error_message: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CleanRequest {
    #[prost(bool, tag = "1")]
    pub deep_clean: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CleanResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
    #[prost(string, tag = "2")]
    pub message: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListVersionsRequest {
    #[prost(int32, tag = "1")]
    pub limit: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListVersionsResponse {
    #[prost(string, repeated, tag = "1")]
    pub versions: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}

// ---------------------------------------------------------------------------
// QEMUService messages
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QemuRunRequest {
    #[prost(bool, tag = "1")]
    pub graphical: bool,
    #[prost(bool, tag = "2")]
    pub debug: bool,
    #[prost(int32, tag = "3")]
    pub memory_mb: i32,
    #[prost(int32, tag = "4")]
    pub cpus: i32,
    #[prost(string, repeated, tag = "5")]
    pub extra_args: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(string, tag = "6")]
    pub kernel_cmdline: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QemuOutput {
    #[prost(oneof = "qemu_output::Event", tags = "1, 2, 3, 4")]
    pub event: ::core::option::Option<qemu_output::Event>,
}

pub mod qemu_output {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Event {
        #[prost(message, tag = "1")]
        Started(super::QemuStarted),
        #[prost(message, tag = "2")]
        Console(super::ConsoleOutput),
        #[prost(message, tag = "3")]
        Stopped(super::QemuStopped),
        #[prost(message, tag = "4")]
        Error(super::QemuError),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QemuStarted {
    #[prost(int32, tag = "1")]
    pub pid: i32,
    #[prost(string, tag = "2")]
    pub qemu_version: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub command: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ConsoleOutput {
    #[prost(bytes = "bytes", tag = "1")]
    pub data: ::prost::bytes::Bytes,
    #[prost(int64, tag = "2")]
    pub timestamp_ms: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QemuStopped {
    #[prost(int32, tag = "1")]
    pub exit_code: i32,
    #[prost(int64, tag = "2")]
    pub uptime_ms: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QemuError {
    #[prost(string, tag = "1")]
    pub message: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QemuStopRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QemuStopResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
    #[prost(string, tag = "2")]
    pub message: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QemuInputRequest {
    #[prost(bytes = "bytes", tag = "1")]
    pub data: ::prost::bytes::Bytes,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QemuInputResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
}

// ---------------------------------------------------------------------------
// Application-level acknowledgement carried by unary responses
// ---------------------------------------------------------------------------

/// Unary responses that carry their own success flag.
pub trait Acknowledgement {
    fn success(&self) -> bool;

    /// Server-provided explanation, if the schema has one and it is set.
    fn message(&self) -> Option<&str> {
        None
    }
}

fn non_empty(message: &str) -> Option<&str> {
    Some(message).filter(|m| !m.is_empty())
}

impl Acknowledgement for ConfigureResponse {
    fn success(&self) -> bool {
        self.success
    }

    fn message(&self) -> Option<&str> {
        non_empty(&self.error_message)
    }
}

impl Acknowledgement for CleanResponse {
    fn success(&self) -> bool {
        self.success
    }

    fn message(&self) -> Option<&str> {
        non_empty(&self.message)
    }
}

impl Acknowledgement for QemuStopResponse {
    fn success(&self) -> bool {
        self.success
    }

    fn message(&self) -> Option<&str> {
        non_empty(&self.message)
    }
}

impl Acknowledgement for QemuInputResponse {
    fn success(&self) -> bool {
        self.success
    }
}

// ---------------------------------------------------------------------------
// Client stubs
// ---------------------------------------------------------------------------

fn not_ready(e: tonic::transport::Error) -> tonic::Status {
    tonic::Status::unavailable(format!("Service was not ready: {e}"))
}

pub mod kernel_service_client {
    use super::*;

    #[derive(Debug, Clone)]
    pub struct KernelServiceClient {
        inner: tonic::client::Grpc<Channel>,
    }

    impl KernelServiceClient {
        pub fn new(channel: Channel) -> Self {
            Self {
                inner: tonic::client::Grpc::new(channel),
            }
        }

        pub async fn build(
            &mut self,
            request: BuildRequest,
        ) -> Result<tonic::Response<tonic::Streaming<BuildProgress>>, tonic::Status> {
            self.inner.ready().await.map_err(not_ready)?;
            let path = PathAndQuery::from_static("/elmos.v1.KernelService/Build");
            self.inner
                .server_streaming(tonic::Request::new(request), path, ProstCodec::default())
                .await
        }

        pub async fn clone_kernel(
            &mut self,
            request: CloneRequest,
        ) -> Result<tonic::Response<tonic::Streaming<CloneProgress>>, tonic::Status> {
            self.inner.ready().await.map_err(not_ready)?;
            let path = PathAndQuery::from_static("/elmos.v1.KernelService/Clone");
            self.inner
                .server_streaming(tonic::Request::new(request), path, ProstCodec::default())
                .await
        }

        pub async fn configure(
            &mut self,
            request: ConfigureRequest,
        ) -> Result<tonic::Response<ConfigureResponse>, tonic::Status> {
            self.inner.ready().await.map_err(not_ready)?;
            let path = PathAndQuery::from_static("/elmos.v1.KernelService/Configure");
            self.inner
                .unary(tonic::Request::new(request), path, ProstCodec::default())
                .await
        }

        pub async fn clean(
            &mut self,
            request: CleanRequest,
        ) -> Result<tonic::Response<CleanResponse>, tonic::Status> {
            self.inner.ready().await.map_err(not_ready)?;
            let path = PathAndQuery::from_static("/elmos.v1.KernelService/Clean");
            self.inner
                .unary(tonic::Request::new(request), path, ProstCodec::default())
                .await
        }

        pub async fn list_versions(
            &mut self,
            request: ListVersionsRequest,
        ) -> Result<tonic::Response<ListVersionsResponse>, tonic::Status> {
            self.inner.ready().await.map_err(not_ready)?;
            let path = PathAndQuery::from_static("/elmos.v1.KernelService/ListVersions");
            self.inner
                .unary(tonic::Request::new(request), path, ProstCodec::default())
                .await
        }
    }
}

pub mod qemu_service_client {
    use super::*;

    #[derive(Debug, Clone)]
    pub struct QemuServiceClient {
        inner: tonic::client::Grpc<Channel>,
    }

    impl QemuServiceClient {
        pub fn new(channel: Channel) -> Self {
            Self {
                inner: tonic::client::Grpc::new(channel),
            }
        }

        pub async fn run(
            &mut self,
            request: QemuRunRequest,
        ) -> Result<tonic::Response<tonic::Streaming<QemuOutput>>, tonic::Status> {
            self.inner.ready().await.map_err(not_ready)?;
            let path = PathAndQuery::from_static("/elmos.v1.QEMUService/Run");
            self.inner
                .server_streaming(tonic::Request::new(request), path, ProstCodec::default())
                .await
        }

        pub async fn stop(
            &mut self,
            request: QemuStopRequest,
        ) -> Result<tonic::Response<QemuStopResponse>, tonic::Status> {
            self.inner.ready().await.map_err(not_ready)?;
            let path = PathAndQuery::from_static("/elmos.v1.QEMUService/Stop");
            self.inner
                .unary(tonic::Request::new(request), path, ProstCodec::default())
                .await
        }

        pub async fn send_input(
            &mut self,
            request: QemuInputRequest,
        ) -> Result<tonic::Response<QemuInputResponse>, tonic::Status> {
            self.inner.ready().await.map_err(not_ready)?;
            let path = PathAndQuery::from_static("/elmos.v1.QEMUService/SendInput");
            self.inner
                .unary(tonic::Request::new(request), path, ProstCodec::default())
                .await
        }
    }
}
