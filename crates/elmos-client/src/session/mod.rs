//! Consumption of server-streaming calls.
//!
//! [`run`] drives one call to completion. It decodes each wire message into
//! the family's event enum, hands events to a callback in arrival order, and
//! resolves to exactly one [`Outcome`]. The `build`, `clone` and `qemu`
//! modules bind it to their schemas and expose per-tag handler traits.

pub mod build;
pub mod clone;
pub mod qemu;

use std::fmt;
use std::future::Future;

use elmos_common::error::{ElmosError, Result};
use elmos_common::types::Outcome;
use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::proto::Acknowledgement;
use crate::transport::EventStream;

pub use build::{BuildEvent, BuildHandler, BuildSession};
pub use clone::{CloneEvent, CloneHandler, CloneSession};
pub use qemu::{QemuEvent, QemuHandler, QemuSession};

/// A wire message received on a server-streaming call.
pub trait StreamMessage: Send + 'static {
    type Event: fmt::Debug + Send;

    /// Decode the message's discriminant. `None` when the tag is unset or
    /// unknown to this client; such messages are skipped.
    fn into_event(self) -> Option<Self::Event>;

    /// Whether `event` ends the call. Nothing after it is delivered.
    fn is_terminal(_event: &Self::Event) -> bool {
        false
    }
}

/// Run one streaming call and feed its events to `handler`.
///
/// `open` performs the call. If it fails, `handler` is never invoked. Events
/// already handed out stay valid when the stream later breaks. The returned
/// outcome is produced after the last `handler` invocation.
pub async fn run<M, F, H>(call: &'static str, open: F, mut handler: H) -> Outcome
where
    M: StreamMessage,
    F: Future<Output = Result<EventStream<M>>>,
    H: FnMut(M::Event),
{
    info!("Starting {} stream", call);
    let mut stream = match open.await {
        Ok(stream) => stream,
        Err(e) => {
            warn!("{} call could not be opened: {}", call, e);
            return Outcome::Failed(e.to_string());
        }
    };

    let mut delivered = 0usize;
    let mut terminated = false;
    while let Some(item) = stream.next().await {
        let message = match item {
            Ok(message) => message,
            Err(e) => {
                warn!("{} stream failed after {} events: {}", call, delivered, e);
                return Outcome::Failed(e.to_string());
            }
        };

        let Some(event) = message.into_event() else {
            debug!("{} stream: skipping message with unrecognized tag", call);
            continue;
        };

        if terminated {
            debug!("{} stream: discarding {:?} after terminal event", call, event);
            continue;
        }

        terminated = M::is_terminal(&event);
        handler(event);
        delivered += 1;
    }

    info!("{} stream finished after {} events", call, delivered);
    Outcome::Ok
}

/// Fold the application-level flag of a unary response into its result.
///
/// Fails when the transport failed or when the server reported
/// `success = false`.
pub fn acknowledge<R: Acknowledgement>(call: &str, result: Result<R>) -> Result<R> {
    let response = result?;
    if response.success() {
        return Ok(response);
    }
    let message = response
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{call} failed: server reported failure"));
    Err(ElmosError::Application(message))
}
