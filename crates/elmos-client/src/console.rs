//! Console driver for a QEMU run.
//!
//! [`QemuConsole`] consumes the client's QEMU notifications, decodes guest
//! output through its own [`TerminalDecoder`] and writes styled runs to a
//! [`ConsoleSink`]. It also gates and echoes user input.

use elmos_ansi::TerminalDecoder;
use elmos_common::traits::ConsoleSink;
use elmos_common::types::{Color, Style, StyledRun};
use tracing::{debug, instrument};

use crate::client::Client;
use crate::events::Notification;

fn banner(foreground: Color) -> Style {
    Style {
        foreground,
        background: Color::Black,
        bold: false,
    }
}

pub struct QemuConsole<S: ConsoleSink> {
    decoder: TerminalDecoder,
    sink: S,
    input_enabled: bool,
}

impl<S: ConsoleSink> QemuConsole<S> {
    pub fn new(sink: S) -> Self {
        Self {
            decoder: TerminalDecoder::new(),
            sink,
            input_enabled: false,
        }
    }

    /// Prepare for a new run: clear the display, reset decoding and accept input.
    pub fn begin(&mut self) {
        self.sink.clear();
        self.decoder.reset();
        self.input_enabled = true;
    }

    pub fn input_enabled(&self) -> bool {
        self.input_enabled
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Apply one client notification. Non-QEMU notifications are ignored.
    pub fn handle(&mut self, notification: &Notification) {
        match notification {
            Notification::QemuStarted { pid, version, .. } => {
                self.decoder.reset();
                self.input_enabled = true;
                let style = banner(Color::Green);
                self.write("=== QEMU Started ===\n", style);
                self.write(format!("Version: {version}\n"), style);
                self.write(format!("PID: {pid}\n\n"), style);
            }
            Notification::QemuConsoleOutput(data) => {
                for run in self.decoder.decode(data) {
                    self.sink.append(run);
                }
            }
            Notification::QemuStopped {
                exit_code,
                uptime_ms,
            } => {
                self.input_enabled = false;
                let style = banner(Color::Yellow);
                self.write("\n=== QEMU Stopped ===\n", style);
                self.write(format!("Exit code: {exit_code}\n"), style);
                self.write(
                    format!("Uptime: {:.2}s\n", *uptime_ms as f64 / 1000.0),
                    style,
                );
            }
            Notification::QemuError(message) => {
                self.write(format!("[ERROR] {message}\n"), banner(Color::Red));
            }
            _ => {}
        }
    }

    /// Send one line of input to the guest and echo it.
    ///
    /// Returns `false` without sending when input is disabled or the line is
    /// empty.
    #[instrument(skip(self, client))]
    pub async fn submit(&mut self, client: &Client, line: &str) -> bool {
        if !self.input_enabled || line.is_empty() {
            debug!("Input not sent");
            return false;
        }

        let text = format!("{line}\n");
        let sent = client.qemu_send_input(text.clone().into_bytes()).await;
        let style = self.decoder.style();
        self.write(text, style);
        sent
    }

    /// Ask the server to stop the VM and stop accepting input.
    pub async fn stop(&mut self, client: &Client) -> bool {
        let stopped = client.qemu_stop().await;
        self.input_enabled = false;
        stopped
    }

    fn write(&mut self, text: impl Into<String>, style: Style) {
        self.sink.append(StyledRun::new(text, style));
    }
}
