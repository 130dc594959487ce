mod support;

use std::sync::Arc;

use elmos_client::proto::{QemuInputResponse, QemuStopResponse};
use elmos_client::{Client, Notification, QemuConsole, QemuRunOptions, Transport};
use elmos_common::types::{Color, Style, StyledRun};
use support::{console, started, stopped, Call, ScriptedTransport};

fn client_with(transport: &Arc<ScriptedTransport>) -> Client {
    Client::with_transport(Arc::clone(transport) as Arc<dyn Transport>)
}

#[tokio::test]
async fn test_session_renders_console_output() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.script_qemu_run(Ok(vec![
        Ok(started(7)),
        Ok(console(b"\x1b[32mOK\x1b[")),
        Ok(console(b"0m\n")),
        Ok(stopped(0, 250)),
    ]));
    let client = client_with(&transport);
    let mut receiver = client.subscribe();
    let mut view = QemuConsole::new(Vec::new());

    view.begin();
    assert!(client.qemu_run(QemuRunOptions::default()).await);
    while let Ok(notification) = receiver.try_recv() {
        view.handle(&notification);
    }

    let runs = view.into_sink();
    let body: Vec<&StyledRun> = runs
        .iter()
        .filter(|run| run.style.background != Color::Black)
        .collect();
    assert_eq!(
        body,
        vec![
            &StyledRun::new("OK", Style::fg(Color::Green)),
            &StyledRun::new("\n", Style::default()),
        ]
    );
    assert_eq!(runs.first().map(|run| run.text.as_str()), Some("=== QEMU Started ===\n"));
    assert_eq!(runs.last().map(|run| run.text.as_str()), Some("Uptime: 0.25s\n"));
}

#[tokio::test]
async fn test_long_run_keeps_every_chunk_for_a_late_reader() {
    let mut script = vec![Ok(started(3)), Ok(console(b"\x1b[31m"))];
    script.extend((0..1000).map(|_| Ok(console(b"x"))));
    script.push(Ok(console(b"\x1b[0mdone")));
    script.push(Ok(stopped(0, 1000)));

    let transport = Arc::new(ScriptedTransport::new());
    transport.script_qemu_run(Ok(script));
    let client = client_with(&transport);
    let mut receiver = client.subscribe();

    // Nothing is read until the whole run has been published
    assert!(client.spawn_qemu_run(QemuRunOptions::default()).await.unwrap());

    let mut view = QemuConsole::new(Vec::new());
    view.begin();
    while let Ok(notification) = receiver.try_recv() {
        view.handle(&notification);
    }

    let runs = view.into_sink();
    assert_eq!(runs.first().map(|run| run.text.as_str()), Some("=== QEMU Started ===\n"));
    let red: String = runs
        .iter()
        .filter(|run| run.style == Style::fg(Color::Red))
        .map(|run| run.text.as_str())
        .collect();
    assert_eq!(red, "x".repeat(1000));
    assert!(runs.contains(&StyledRun::new("done", Style::default())));
    assert_eq!(runs.last().map(|run| run.text.as_str()), Some("Uptime: 1.00s\n"));
}

#[tokio::test]
async fn test_submit_sends_line_and_echoes_it() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.script_qemu_input(Ok(QemuInputResponse { success: true }));
    let client = client_with(&transport);
    let mut view = QemuConsole::new(Vec::new());

    view.begin();
    view.handle(&Notification::QemuConsoleOutput(bytes::Bytes::from_static(
        b"\x1b[33m# ",
    )));
    assert!(view.submit(&client, "uname -r").await);

    assert!(matches!(
        &transport.calls()[..],
        [Call::QemuInput(request)] if &request.data[..] == b"uname -r\n"
    ));
    assert_eq!(
        view.sink().last(),
        Some(&StyledRun::new("uname -r\n", Style::fg(Color::Yellow)))
    );
}

#[tokio::test]
async fn test_input_refused_when_disabled_or_empty() {
    let transport = Arc::new(ScriptedTransport::new());
    let client = client_with(&transport);
    let mut view = QemuConsole::new(Vec::new());

    assert!(!view.submit(&client, "ls").await);

    view.begin();
    assert!(!view.submit(&client, "").await);

    view.handle(&Notification::QemuStopped {
        exit_code: 0,
        uptime_ms: 10,
    });
    assert!(!view.submit(&client, "ls").await);

    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn test_stop_disables_input() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.script_qemu_stop(Ok(QemuStopResponse {
        success: true,
        message: "stopped".into(),
    }));
    let client = client_with(&transport);
    let mut view = QemuConsole::new(Vec::new());

    view.begin();
    assert!(view.stop(&client).await);
    assert!(!view.input_enabled());
    assert_eq!(transport.calls(), vec![Call::QemuStop]);
}
