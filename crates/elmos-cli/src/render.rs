use std::io::{self, Write};

use crossterm::queue;
use crossterm::style::{
    Attribute, Color as TermColor, Print, ResetColor, SetAttribute, SetBackgroundColor,
    SetForegroundColor,
};
use elmos_client::Notification;
use elmos_common::traits::ConsoleSink;
use elmos_common::types::{Color, Style, StyledRun};
use tracing::warn;

fn term_color(color: Color) -> TermColor {
    match color {
        Color::Default => TermColor::Reset,
        Color::Black => TermColor::Black,
        Color::Red => TermColor::DarkRed,
        Color::Green => TermColor::DarkGreen,
        Color::Yellow => TermColor::DarkYellow,
        Color::Blue => TermColor::DarkBlue,
        Color::Magenta => TermColor::DarkMagenta,
        Color::Cyan => TermColor::DarkCyan,
        Color::White => TermColor::Grey,
    }
}

/// Writes styled runs to a terminal using crossterm color commands.
pub struct TerminalSink<W: Write + Send> {
    out: W,
}

impl TerminalSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write + Send> TerminalSink<W> {
    pub fn write_styled(&mut self, text: &str, style: Style) -> io::Result<()> {
        queue!(
            self.out,
            SetForegroundColor(term_color(style.foreground)),
            SetBackgroundColor(term_color(style.background))
        )?;
        if style.bold {
            queue!(self.out, SetAttribute(Attribute::Bold))?;
        }
        queue!(self.out, Print(text), SetAttribute(Attribute::Reset), ResetColor)?;
        self.out.flush()
    }

    pub fn line(&mut self, text: &str, foreground: Color) -> io::Result<()> {
        self.write_styled(&format!("{text}\n"), Style::fg(foreground))
    }

    /// Print a build or clone notification. QEMU notifications are left to
    /// the console driver and failures to the caller.
    pub fn notification(&mut self, notification: &Notification) -> io::Result<()> {
        match notification {
            Notification::BuildStageChanged(stage) => {
                let files = if stage.total_files > 0 {
                    format!(" ({}/{})", stage.current_file, stage.total_files)
                } else {
                    String::new()
                };
                self.line(
                    &format!("[{:>3}%] {}{}", stage.progress, stage.name, files),
                    Color::Cyan,
                )
            }
            Notification::BuildLogReceived(line) => self.line(
                &format!("[{}] {}", line.level, line.message),
                line.level.color(),
            ),
            Notification::BuildErrorReceived(error) => {
                let text = match &error.location {
                    Some(location) => match location.line {
                        Some(line) => format!("{}:{}: {}", location.file, line, error.message),
                        None => format!("{}: {}", location.file, error.message),
                    },
                    None => error.message.clone(),
                };
                self.line(&text, Color::Red)
            }
            Notification::BuildCompleted(summary) => {
                let seconds = summary.duration_ms as f64 / 1000.0;
                if summary.success {
                    self.line(&format!("Build succeeded in {seconds:.2}s"), Color::Green)?;
                    if let Some(image) = &summary.image_path {
                        self.line(&format!("Image: {}", image.display()), Color::Green)?;
                    }
                    Ok(())
                } else {
                    self.line(&format!("Build failed after {seconds:.2}s"), Color::Red)
                }
            }
            Notification::CloneProgress(progress) => self.line(
                &format!("[{:>3}%] {}", progress.progress, progress.message),
                Color::Cyan,
            ),
            _ => Ok(()),
        }
    }
}

impl<W: Write + Send> ConsoleSink for TerminalSink<W> {
    fn append(&mut self, run: StyledRun) {
        if let Err(e) = self.write_styled(&run.text, run.style) {
            warn!("Failed to write console output: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elmos_client::session::build::{BuildStage, CompileError, SourceLocation};

    fn rendered(notification: &Notification) -> String {
        let mut sink = TerminalSink { out: Vec::new() };
        sink.notification(notification).unwrap();
        String::from_utf8(sink.out).unwrap()
    }

    #[test]
    fn test_stage_line() {
        let text = rendered(&Notification::BuildStageChanged(BuildStage {
            name: "vmlinux".into(),
            progress: 7,
            current_file: 3,
            total_files: 900,
        }));
        assert!(text.contains("[  7%] vmlinux (3/900)\n"));
    }

    #[test]
    fn test_compile_error_location() {
        let text = rendered(&Notification::BuildErrorReceived(CompileError {
            message: "expected ';'".into(),
            location: Some(SourceLocation {
                file: "init/main.c".into(),
                line: Some(12),
            }),
        }));
        assert!(text.contains("init/main.c:12: expected ';'\n"));
    }

    #[test]
    fn test_qemu_notifications_are_not_rendered() {
        assert!(rendered(&Notification::QemuError("kvm unavailable".into())).is_empty());
    }
}
