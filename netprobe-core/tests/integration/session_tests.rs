//! Sessions over a byte stream, with a fake device on the other end

use std::time::Duration;

use netprobe_core::testing::IoChannel;
use netprobe_core::{
    DeviceClient, OsFamily, PAGER_DISABLE_COMMAND, PromptMatcher, Session, SessionError,
    SessionOptions,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio::sync::mpsc;

use super::IOSXE_BANNER;

/// Answers each line with echo, body and prompt; hangs up on `exit`, stays
/// silent on `sleep`, answers `slow` only after 500 ms
async fn fake_device(io: DuplexStream, seen: mpsc::UnboundedSender<String>) {
    let (reader, mut writer) = tokio::io::split(io);
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let _ = seen.send(line.clone());
        let body = match line.as_str() {
            "exit" => break,
            "sleep" => continue,
            "slow" => {
                tokio::time::sleep(Duration::from_millis(500)).await;
                "LATE REPLY".to_string()
            }
            "show version" => IOSXE_BANNER.to_string(),
            "show clock" => "*12:00:00.000 UTC Mon Oct 19 2026".to_string(),
            "show long" => "x".repeat(4096),
            _ => String::new(),
        };
        let reply = format!("{line}\r\n{body}\r\nedge-sw1#");
        if writer.write_all(reply.as_bytes()).await.is_err() {
            break;
        }
    }
}

async fn open(batch_size: usize) -> (Session, mpsc::UnboundedReceiver<String>) {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(fake_device(server, tx));
    let options = SessionOptions {
        timeout: Duration::from_millis(300),
        batch_size,
        prompt: PromptMatcher::default(),
    };
    let session = Session::open("edge-sw1", Box::new(IoChannel::new(client)), options)
        .await
        .unwrap();
    (session, rx)
}

#[tokio::test]
async fn test_priming_then_command() {
    let (mut session, mut seen) = open(10_000).await;

    let output = session.run("show clock").await.unwrap();
    assert!(output.starts_with("show clock\n"));
    assert!(output.contains("12:00:00.000 UTC"));
    assert!(output.ends_with("edge-sw1#"));
    assert!(!output.contains('\r'));

    assert_eq!(seen.recv().await.as_deref(), Some(""));
    assert_eq!(seen.recv().await.as_deref(), Some(PAGER_DISABLE_COMMAND));
    assert_eq!(seen.recv().await.as_deref(), Some("show clock"));
}

#[tokio::test]
async fn test_small_batches_reassemble_long_output() {
    let (mut session, _seen) = open(7).await;
    let output = session.run("show long").await.unwrap();
    assert!(output.contains(&"x".repeat(4096)));
}

#[tokio::test]
async fn test_silent_device_times_out_and_session_recovers() {
    let (mut session, _seen) = open(10_000).await;

    let err = session.run("sleep").await.unwrap_err();
    assert!(err.is_timeout());
    assert!(matches!(err, SessionError::Timeout { ref command, .. } if command == "sleep"));

    let output = session.run("show clock").await.unwrap();
    assert!(output.contains("UTC"));
}

#[tokio::test]
async fn test_late_reply_does_not_leak_into_next_command() {
    let (mut session, _seen) = open(10_000).await;

    assert!(session.run("slow").await.unwrap_err().is_timeout());
    // let the late reply land before the next command
    tokio::time::sleep(Duration::from_millis(400)).await;

    let output = session.run("show clock").await.unwrap();
    assert!(output.starts_with("show clock\n"), "got {output:?}");
    assert!(!output.contains("LATE REPLY"));
    assert!(output.contains("12:00:00.000 UTC"));
}

#[tokio::test]
async fn test_hang_up_is_end_of_stream() {
    let (mut session, _seen) = open(10_000).await;
    let err = session.run("exit").await.unwrap_err();
    assert!(err.is_end_of_stream());
    assert_eq!(err.to_string(), "EOF");
}

#[tokio::test]
async fn test_closed_session_rejects_commands() {
    let (mut session, _seen) = open(10_000).await;
    session.close().await;
    session.close().await;
    assert!(session.is_closed());
    assert!(session.run("show clock").await.unwrap_err().is_end_of_stream());
}

#[tokio::test]
async fn test_identification_over_stream() {
    let (mut session, _seen) = open(10_000).await;
    let client = DeviceClient::identify(&mut session, false).await.unwrap();
    assert_eq!(client.os_family(), OsFamily::IosXe);
    assert_eq!(client.target(), "edge-sw1");
}
