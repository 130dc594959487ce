use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, instrument, trace};

use super::types::Notification;
use crate::session::build::{BuildHandler, BuildStage, BuildSummary, CompileError, LogLine};
use crate::session::clone::{CloneHandler, CloneProgress};
use crate::session::qemu::QemuHandler;

/// Fan-out of client notifications to any number of subscribers.
///
/// Every subscriber owns an unbounded queue and receives each notification
/// published after it subscribed, in publish order. Nothing is dropped for a
/// slow subscriber. Queues of dropped receivers are pruned on publish.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<Notification>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<Notification> {
        let (notification_tx, notification_rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(notification_tx);
        notification_rx
    }

    /// Deliver a notification to every live subscriber. Returns how many
    /// received it.
    #[instrument(skip(self), level = "trace")]
    pub fn publish(&self, notification: Notification) -> usize {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(notification.clone()).is_ok());
        if subscribers.is_empty() {
            trace!("No subscribers for {:?}", notification);
        }
        subscribers.len()
    }

    /// Handler that republishes session callbacks on this bus.
    pub fn publisher(&self) -> Publisher {
        Publisher { bus: self.clone() }
    }
}

/// Session handler translating callbacks into [`Notification`]s.
#[derive(Debug, Clone)]
pub struct Publisher {
    bus: EventBus,
}

impl BuildHandler for Publisher {
    fn on_stage(&mut self, stage: BuildStage) {
        debug!("Build stage {} at {}%", stage.name, stage.progress);
        self.bus.publish(Notification::BuildStageChanged(stage));
    }

    fn on_log(&mut self, line: LogLine) {
        self.bus.publish(Notification::BuildLogReceived(line));
    }

    fn on_compile_error(&mut self, error: CompileError) {
        self.bus.publish(Notification::BuildErrorReceived(error));
    }

    fn on_complete(&mut self, summary: BuildSummary) {
        debug!("Build complete, success={}", summary.success);
        self.bus.publish(Notification::BuildCompleted(summary));
    }
}

impl CloneHandler for Publisher {
    fn on_progress(&mut self, progress: CloneProgress) {
        self.bus.publish(Notification::CloneProgress(progress));
    }
}

impl QemuHandler for Publisher {
    fn on_started(&mut self, pid: i32, version: &str, command: &str) {
        debug!("QEMU started with pid {}", pid);
        self.bus.publish(Notification::QemuStarted {
            pid,
            version: version.to_string(),
            command: command.to_string(),
        });
    }

    fn on_console(&mut self, data: Bytes) {
        self.bus.publish(Notification::QemuConsoleOutput(data));
    }

    fn on_stopped(&mut self, exit_code: i32, uptime_ms: u64) {
        debug!("QEMU stopped with exit code {}", exit_code);
        self.bus.publish(Notification::QemuStopped {
            exit_code,
            uptime_ms,
        });
    }

    fn on_error(&mut self, message: &str) {
        self.bus.publish(Notification::QemuError(message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elmos_common::types::LogLevel;

    #[tokio::test]
    async fn test_notification_fan_out() {
        let bus = EventBus::new();
        let mut receiver1 = bus.subscribe();
        let mut receiver2 = bus.subscribe();

        assert_eq!(bus.publish(Notification::QemuError("kvm unavailable".into())), 2);

        let expected = Notification::QemuError("kvm unavailable".into());
        assert_eq!(receiver1.recv().await.unwrap(), expected);
        assert_eq!(receiver2.recv().await.unwrap(), expected);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(Notification::ErrorOccurred("lost".into())), 0);
    }

    #[test]
    fn test_dropped_receivers_are_pruned() {
        let bus = EventBus::new();
        let kept = bus.subscribe();
        drop(bus.subscribe());

        assert_eq!(bus.publish(Notification::QemuError("first".into())), 1);
        drop(kept);
        assert_eq!(bus.publish(Notification::QemuError("second".into())), 0);
    }

    #[tokio::test]
    async fn test_publisher_preserves_order() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();
        let mut publisher = bus.publisher();

        publisher.on_log(LogLine {
            level: LogLevel::Info,
            message: "CC init/main.o".into(),
            timestamp_ms: 1,
        });
        publisher.on_console(Bytes::from_static(b"login: "));
        publisher.on_stopped(0, 1500);

        assert!(matches!(
            receiver.recv().await.unwrap(),
            Notification::BuildLogReceived(LogLine { timestamp_ms: 1, .. })
        ));
        assert_eq!(
            receiver.recv().await.unwrap(),
            Notification::QemuConsoleOutput(Bytes::from_static(b"login: "))
        );
        assert_eq!(
            receiver.recv().await.unwrap(),
            Notification::QemuStopped {
                exit_code: 0,
                uptime_ms: 1500
            }
        );
    }

    #[test]
    fn test_slow_subscriber_loses_nothing() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();
        for i in 0..1000 {
            bus.publish(Notification::QemuError(format!("e{i}")));
        }

        for i in 0..1000 {
            assert_eq!(
                receiver.try_recv().unwrap(),
                Notification::QemuError(format!("e{i}"))
            );
        }
        assert!(receiver.try_recv().is_err());
    }
}
