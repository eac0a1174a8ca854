#![cfg(all(unix, feature = "cli"))]

use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Child, Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use padrelay_frame::{encode, FrameReader, FrameWriter};
use padrelay_transport::RelayStream;

const WORKED_STATE: &str = r#"{"W":1,"N":1,"LjoyX":152,"LjoyY":252,"RjoyY":102,"RT":233}"#;

fn padrelay() -> Command {
    Command::new(env!("CARGO_BIN_EXE_padrelay"))
}

fn unique_temp_path(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "padrelay-cli-{tag}-{}-{}.json",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ))
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("ephemeral bind should work")
        .local_addr()
        .expect("local addr should exist")
        .port()
}

fn wait_for_connect(port: u16, timeout: Duration) -> RelayStream {
    let start = Instant::now();
    loop {
        match RelayStream::connect(format!("127.0.0.1:{port}")) {
            Ok(stream) => return stream,
            Err(err) => {
                assert!(start.elapsed() < timeout, "relay never came up: {err}");
                thread::sleep(Duration::from_millis(25));
            }
        }
    }
}

fn stop(mut child: Child) -> Output {
    let _ = child.kill();
    child.wait_with_output().expect("child output should be readable")
}

#[test]
fn format_prints_worked_example_as_json() {
    let output = padrelay()
        .args(["format", "--format", "json", "--state", WORKED_STATE])
        .output()
        .expect("format should run");

    assert!(output.status.success());
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(value["hex"], "A9 98 FC 66 E9 95");
    assert_eq!(value["output_size"], 6);
    assert_eq!(value["legacy_sentinels"], true);
}

#[test]
fn format_raw_writes_packet_bytes() {
    let output = padrelay()
        .args(["format", "--format", "raw", "--state", "{}"])
        .output()
        .expect("format should run");

    assert!(output.status.success());
    assert_eq!(output.stdout, vec![0xA8, 0, 0, 0, 0, 0x15]);
}

#[test]
fn format_uses_custom_config_and_reports_unknown_fields() {
    let path = unique_temp_path("custom");
    std::fs::write(
        &path,
        r#"{"output_size": 3, "bytes": [
            {"type": "const", "value": 170},
            {"type": "field", "field": "Turbo"},
            {"type": "bits", "bits": [{"pos": 1, "field": "START"}]}
        ]}"#,
    )
    .expect("config should be writable");

    let output = padrelay()
        .args(["format", "--format", "json", "--config"])
        .arg(&path)
        .args(["--state", r#"{"START":1}"#])
        .output()
        .expect("format should run");
    let _ = std::fs::remove_file(&path);

    assert!(output.status.success());
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(value["hex"], "AA 00 02");
    assert_eq!(value["unknown_fields"][0], "Turbo");
}

#[test]
fn format_rejects_bad_state_with_data_invalid() {
    let output = padrelay()
        .args(["format", "--state", r#"{"LjoyX": 999}"#])
        .output()
        .expect("format should run");
    assert_eq!(output.status.code(), Some(60));
}

#[test]
fn serve_rejects_invalid_config() {
    let path = unique_temp_path("invalid");
    std::fs::write(&path, r#"{"output_size": 0}"#).expect("config should be writable");

    let output = padrelay()
        .args(["serve", "--no-device", "--port", "0", "--config"])
        .arg(&path)
        .output()
        .expect("serve should run");
    let _ = std::fs::remove_file(&path);

    assert_eq!(output.status.code(), Some(60));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("schema"), "stderr was: {stderr}");
}

#[test]
fn serve_without_device_logs_packets() {
    let port = free_port();
    let child = padrelay()
        .args(["serve", "--no-device", "--log-level", "debug", "--port"])
        .arg(port.to_string())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .expect("serve should start");

    let stream = wait_for_connect(port, Duration::from_secs(5));
    let mut writer = FrameWriter::new(stream);
    writer.send(b"{}\n").expect("frame should send");
    thread::sleep(Duration::from_millis(300));

    let output = stop(child);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("A8 00 00 00 00 15"), "stderr was: {stderr}");
    assert!(stderr.contains("serving log-only"), "stderr was: {stderr}");
}

#[test]
fn serve_logs_dropped_frames_with_peer_and_details() {
    let port = free_port();
    let child = padrelay()
        .args(["serve", "--no-device", "--max-packet-size", "16", "--port"])
        .arg(port.to_string())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .expect("serve should start");

    let mut stream = wait_for_connect(port, Duration::from_secs(5));

    let mut corrupt = encode(br#"{"N":1}"#).expect("frame should encode").to_vec();
    corrupt[6] ^= 0x01;
    stream.write_all(&corrupt).expect("corrupt frame should send");

    let mut oversize = 100u32.to_be_bytes().to_vec();
    oversize.extend_from_slice(&[b' '; 100]);
    stream.write_all(&oversize).expect("oversize frame should send");

    let mut writer = FrameWriter::new(stream);
    writer.send(b"not json!!").expect("frame should send");
    thread::sleep(Duration::from_millis(300));

    let output = stop(child);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let line_with = |needle: &str| {
        stderr
            .lines()
            .find(|line| line.contains(needle))
            .unwrap_or_else(|| panic!("no `{needle}` line in stderr: {stderr}"))
            .to_string()
    };

    let corrupt_line = line_with("checksum mismatch");
    assert!(corrupt_line.contains("peer=127.0.0.1:"), "{corrupt_line}");
    assert!(corrupt_line.contains("size=7"), "{corrupt_line}");
    assert!(corrupt_line.contains("expected=0x"), "{corrupt_line}");
    assert!(corrupt_line.contains("actual=0x"), "{corrupt_line}");

    let oversize_line = line_with("skipped oversize frame");
    assert!(oversize_line.contains("peer=127.0.0.1:"), "{oversize_line}");
    assert!(oversize_line.contains("size=100"), "{oversize_line}");
    assert!(oversize_line.contains("max=20"), "{oversize_line}");

    let decode_line = line_with("dropping record");
    assert!(decode_line.contains("peer=127.0.0.1:"), "{decode_line}");
    assert!(decode_line.contains("size=10"), "{decode_line}");
}

#[test]
fn simulate_reconnects_after_relay_drops_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("listener should bind");
    let addr = listener.local_addr().expect("local addr should exist");
    listener
        .set_nonblocking(true)
        .expect("nonblocking should apply");

    let child = padrelay()
        .args(["simulate", "--hz", "50", "--reconnect", "--reconnect-delay", "100ms"])
        .arg(addr.to_string())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .expect("simulate should start");

    for connection in 0..2 {
        let deadline = Instant::now() + Duration::from_secs(10);
        let stream = loop {
            match listener.accept() {
                Ok((stream, _)) => break stream,
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    assert!(Instant::now() < deadline, "no connection #{connection}");
                    thread::sleep(Duration::from_millis(20));
                }
                Err(err) => panic!("accept failed: {err}"),
            }
        };
        stream
            .set_nonblocking(false)
            .expect("blocking mode should apply");
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("timeout should apply");

        let mut reader = FrameReader::new(stream);
        reader.read_frame().expect("frame should verify");
    }

    let output = stop(child);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("reconnecting"), "stderr was: {stderr}");
}

#[test]
fn simulate_sends_the_requested_number_of_frames() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("listener should bind");
    let addr = listener.local_addr().expect("local addr should exist");

    let child = padrelay()
        .args(["simulate", "--hz", "200", "--count", "3"])
        .arg(addr.to_string())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("simulate should start");

    let (stream, _) = listener.accept().expect("simulator should connect");
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .expect("timeout should apply");
    let mut reader = FrameReader::new(stream);

    for _ in 0..3 {
        let payload = reader.read_frame().expect("frame should verify");
        assert_eq!(payload.last(), Some(&b'\n'));
        let record: serde_json::Value =
            serde_json::from_slice(&payload).expect("payload should be JSON");
        assert!(record["ts"].as_i64().is_some_and(|ts| ts > 0));
        assert!(record.get("LjoyX").is_some());
    }

    let mut rest = Vec::new();
    let _ = reader.into_inner().read_to_end(&mut rest);
    assert!(rest.is_empty());

    let output = child.wait_with_output().expect("simulate should exit");
    assert!(output.status.success());
}

#[test]
fn simulate_reports_refused_connection() {
    let port = free_port();
    let output = padrelay()
        .args(["simulate", &format!("127.0.0.1:{port}"), "--count", "1"])
        .output()
        .expect("simulate should run");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn version_prints_package_version() {
    let output = padrelay()
        .arg("version")
        .output()
        .expect("version should run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), format!("padrelay {}", env!("CARGO_PKG_VERSION")));
}
