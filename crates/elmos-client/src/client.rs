//! The facade the presentation layer talks to.

use std::sync::Arc;

use bytes::Bytes;
use elmos_common::error::{ElmosError, Result};
use elmos_common::types::Outcome;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{error, info, instrument};

use crate::config::ClientConfig;
use crate::events::{EventBus, Notification};
use crate::proto::{
    BuildRequest, CleanRequest, CloneRequest, ConfigureRequest, ListVersionsRequest,
    QemuInputRequest, QemuRunRequest, QemuStopRequest,
};
use crate::session::{acknowledge, BuildSession, CloneSession, QemuSession};
use crate::transport::{GrpcTransport, Transport};

/// Parameters of a kernel build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Make targets, e.g. `bzImage`. Empty means the server's default.
    pub targets: Vec<String>,
    /// Parallel jobs. 0 lets the server decide.
    pub jobs: u32,
    pub arch: String,
    pub verbose: bool,
}

impl From<BuildOptions> for BuildRequest {
    fn from(options: BuildOptions) -> Self {
        BuildRequest {
            targets: options.targets,
            jobs: wire_int(options.jobs),
            arch: options.arch,
            verbose: options.verbose,
        }
    }
}

/// Parameters of a QEMU run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QemuRunOptions {
    pub graphical: bool,
    /// Wait for a debugger before booting.
    pub debug: bool,
    pub memory_mb: u32,
    /// 0 lets the server decide.
    pub cpus: u32,
    pub extra_args: Vec<String>,
    pub kernel_cmdline: String,
}

impl Default for QemuRunOptions {
    fn default() -> Self {
        Self {
            graphical: false,
            debug: false,
            memory_mb: 256,
            cpus: 2,
            extra_args: Vec::new(),
            kernel_cmdline: String::new(),
        }
    }
}

impl From<QemuRunOptions> for QemuRunRequest {
    fn from(options: QemuRunOptions) -> Self {
        QemuRunRequest {
            graphical: options.graphical,
            debug: options.debug,
            memory_mb: wire_int(options.memory_mb),
            cpus: wire_int(options.cpus),
            extra_args: options.extra_args,
            kernel_cmdline: options.kernel_cmdline,
        }
    }
}

fn wire_int(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

struct Inner {
    transport: Option<Arc<dyn Transport>>,
    bus: EventBus,
    last_error: Mutex<Option<String>>,
}

/// Handle to the backend. Cloning is cheap and clones share state.
///
/// Every operation returns `false` (or an empty list) on failure, after
/// recording [`last_error`](Client::last_error) and publishing
/// [`Notification::ErrorOccurred`].
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

impl Client {
    /// Create a client with a lazily connecting gRPC channel.
    ///
    /// An unusable address does not fail construction. The client is left
    /// without a transport and the reason is kept as the last error.
    #[instrument(skip_all, fields(address = %config.address))]
    pub fn connect(config: &ClientConfig) -> Self {
        match GrpcTransport::connect_lazy(&config.address) {
            Ok(transport) => {
                info!("Client created for {}", transport.address());
                Self::with_transport(Arc::new(transport))
            }
            Err(e) => {
                error!("Failed to create channel: {}", e);
                let client = Self::unattached();
                *client.inner.last_error.lock() = Some(e.to_string());
                client
            }
        }
    }

    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self::from_parts(Some(transport))
    }

    /// A client with no transport. Every operation fails as not initialized.
    pub fn unattached() -> Self {
        Self::from_parts(None)
    }

    fn from_parts(transport: Option<Arc<dyn Transport>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                bus: EventBus::new(),
                last_error: Mutex::new(None),
            }),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.inner
            .transport
            .as_ref()
            .is_some_and(|transport| transport.state().is_connected())
    }

    /// Description of the most recent failure.
    pub fn last_error(&self) -> Option<String> {
        self.inner.last_error.lock().clone()
    }

    /// Receive every notification published from now on, in order.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<Notification> {
        self.inner.bus.subscribe()
    }

    pub fn notifications(&self) -> UnboundedReceiverStream<Notification> {
        UnboundedReceiverStream::new(self.subscribe())
    }

    #[instrument(skip(self))]
    pub async fn build(&self, options: BuildOptions) -> bool {
        let Some(transport) = self.transport() else {
            return false;
        };
        let mut publisher = self.inner.bus.publisher();
        let outcome = BuildSession::new(transport.as_ref())
            .run(options.into(), &mut publisher)
            .await;
        self.conclude("Build", outcome)
    }

    #[instrument(skip(self))]
    pub async fn clone_kernel(&self, version: &str) -> bool {
        let Some(transport) = self.transport() else {
            return false;
        };
        let request = CloneRequest {
            version: version.to_string(),
        };
        let mut publisher = self.inner.bus.publisher();
        let outcome = CloneSession::new(transport.as_ref())
            .run(request, &mut publisher)
            .await;
        self.conclude("Clone", outcome)
    }

    #[instrument(skip(self))]
    pub async fn configure(&self, config_type: &str) -> bool {
        let Some(transport) = self.transport() else {
            return false;
        };
        let request = ConfigureRequest {
            config_type: config_type.to_string(),
        };
        let result = transport.configure(request).await;
        self.check("Configure", acknowledge("Configure", result))
            .is_some()
    }

    #[instrument(skip(self))]
    pub async fn clean_artifacts(&self, deep_clean: bool) -> bool {
        let Some(transport) = self.transport() else {
            return false;
        };
        let result = transport.clean(CleanRequest { deep_clean }).await;
        self.check("Clean", acknowledge("Clean", result)).is_some()
    }

    /// Available kernel versions, at most `limit` of them.
    #[instrument(skip(self))]
    pub async fn list_versions(&self, limit: usize) -> Vec<String> {
        let Some(transport) = self.transport() else {
            return Vec::new();
        };
        let request = ListVersionsRequest {
            limit: i32::try_from(limit).unwrap_or(i32::MAX),
        };
        match self.check("ListVersions", transport.list_versions(request).await) {
            Some(response) => {
                let mut versions = response.versions;
                versions.truncate(limit);
                versions
            }
            None => Vec::new(),
        }
    }

    #[instrument(skip(self))]
    pub async fn qemu_run(&self, options: QemuRunOptions) -> bool {
        let Some(transport) = self.transport() else {
            return false;
        };
        let mut publisher = self.inner.bus.publisher();
        let outcome = QemuSession::new(transport.as_ref())
            .run(options.into(), &mut publisher)
            .await;
        self.conclude("QEMU run", outcome)
    }

    #[instrument(skip(self))]
    pub async fn qemu_stop(&self) -> bool {
        let Some(transport) = self.transport() else {
            return false;
        };
        let result = transport.qemu_stop(QemuStopRequest {}).await;
        self.check("Stop QEMU", acknowledge("Stop QEMU", result))
            .is_some()
    }

    #[instrument(skip_all)]
    pub async fn qemu_send_input(&self, data: impl Into<Bytes>) -> bool {
        let Some(transport) = self.transport() else {
            return false;
        };
        let request = QemuInputRequest { data: data.into() };
        let result = transport.qemu_send_input(request).await;
        self.check("Send input", acknowledge("Send input", result))
            .is_some()
    }

    /// Run [`build`](Client::build) on its own task.
    pub fn spawn_build(&self, options: BuildOptions) -> JoinHandle<bool> {
        let client = self.clone();
        tokio::spawn(async move { client.build(options).await })
    }

    pub fn spawn_clone_kernel(&self, version: impl Into<String>) -> JoinHandle<bool> {
        let client = self.clone();
        let version = version.into();
        tokio::spawn(async move { client.clone_kernel(&version).await })
    }

    pub fn spawn_qemu_run(&self, options: QemuRunOptions) -> JoinHandle<bool> {
        let client = self.clone();
        tokio::spawn(async move { client.qemu_run(options).await })
    }

    fn transport(&self) -> Option<Arc<dyn Transport>> {
        match &self.inner.transport {
            Some(transport) => Some(Arc::clone(transport)),
            None => {
                self.fail(ElmosError::NotInitialized.to_string());
                None
            }
        }
    }

    fn conclude(&self, operation: &str, outcome: Outcome) -> bool {
        match outcome {
            Outcome::Ok => true,
            Outcome::Failed(reason) => {
                self.fail(format!("{operation} failed: {reason}"));
                false
            }
        }
    }

    fn check<T>(&self, operation: &str, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(ElmosError::Application(message)) => {
                self.fail(message);
                None
            }
            Err(e) => {
                self.fail(format!("{operation} failed: {e}"));
                None
            }
        }
    }

    fn fail(&self, message: String) {
        error!("{}", message);
        *self.inner.last_error.lock() = Some(message.clone());
        self.inner.bus.publish(Notification::ErrorOccurred(message));
    }
}
