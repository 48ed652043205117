//! Session tests driving `ModemSession` against an in-memory fake modem

use crate::client::{
    ChannelOpener, ModemError, ModemSession, Phase, SendError, SessionConfig, SmsMessage,
    SmsTransmitter,
};
use crate::pdu::Encoder;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{
    AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream, ReadBuf, duplex,
};
use tokio::task::JoinHandle;
use tokio::time::Instant;

const READ_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    /// A full line received by the modem, terminator included
    Received(String),
    /// The modem answered with OK
    Acked,
}

#[derive(Debug, Default)]
struct ModemLog {
    events: Vec<Event>,
    received_at: Vec<Instant>,
    closed: bool,
}

impl ModemLog {
    fn lines(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Received(line) => Some(line.clone()),
                Event::Acked => None,
            })
            .collect()
    }

    fn acks(&self) -> usize {
        self.events.iter().filter(|e| **e == Event::Acked).count()
    }
}

/// How the fake modem misbehaves
#[derive(Debug, Clone, Copy, Default)]
struct Script {
    /// Never acknowledge the Nth PDU body (1-based)
    silent_on_submission: Option<usize>,
    /// Answer ERROR instead of OK to this command line
    error_on: Option<&'static str>,
}

/// Reads lines like a modem in PDU mode and answers them.
async fn run_modem(mut io: DuplexStream, script: Script, log: Arc<Mutex<ModemLog>>) {
    let mut pending = Vec::new();
    let mut buf = [0u8; 256];
    let mut submissions = 0;

    loop {
        let n = match io.read(&mut buf).await {
            Ok(0) | Err(_) => {
                log.lock().unwrap().closed = true;
                return;
            }
            Ok(n) => n,
        };
        pending.extend_from_slice(&buf[..n]);

        while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw).into_owned();
            let command = line.trim_end_matches(['\r', '\n']);

            let reply: Option<&[u8]> = if script.error_on == Some(command) {
                Some(b"\r\nERROR\r\n".as_slice())
            } else if command.starts_with("AT+CMGS=") {
                Some(b"\r\n> ".as_slice())
            } else if command.ends_with('\u{1a}') {
                submissions += 1;
                if script.silent_on_submission == Some(submissions) {
                    None
                } else {
                    Some(b"\r\n+CMGS: 7\r\n\r\nOK\r\n".as_slice())
                }
            } else {
                Some(b"\r\nOK\r\n".as_slice())
            };

            {
                let mut log = log.lock().unwrap();
                log.events.push(Event::Received(line.clone()));
                log.received_at.push(Instant::now());
            }

            if let Some(reply) = reply {
                if io.write_all(reply).await.is_err() {
                    return;
                }
                if reply.ends_with(b"OK\r\n") {
                    log.lock().unwrap().events.push(Event::Acked);
                }
            }
        }
    }
}

/// Hands out the host side of an in-memory channel
struct FakeOpener {
    channel: Mutex<Option<DuplexStream>>,
    opens: Arc<AtomicUsize>,
}

impl ChannelOpener for FakeOpener {
    type Channel = DuplexStream;

    async fn open(&self) -> io::Result<DuplexStream> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.channel
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such device"))
    }

    fn read_timeout(&self) -> Duration {
        READ_TIMEOUT
    }
}

/// Modem line that takes writes but fails every read, as after a cable pull
struct DroppedLine {
    log: Arc<Mutex<ModemLog>>,
}

impl AsyncRead for DroppedLine {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::other("line dropped")))
    }
}

impl AsyncWrite for DroppedLine {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let line = String::from_utf8_lossy(buf).into_owned();
        let mut log = self.log.lock().unwrap();
        log.events.push(Event::Received(line));
        log.received_at.push(Instant::now());
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.log.lock().unwrap().closed = true;
        Poll::Ready(Ok(()))
    }
}

struct DroppedLineOpener {
    log: Arc<Mutex<ModemLog>>,
}

impl ChannelOpener for DroppedLineOpener {
    type Channel = DroppedLine;

    async fn open(&self) -> io::Result<DroppedLine> {
        Ok(DroppedLine {
            log: self.log.clone(),
        })
    }

    fn read_timeout(&self) -> Duration {
        READ_TIMEOUT
    }
}

struct Harness {
    session: ModemSession<FakeOpener>,
    log: Arc<Mutex<ModemLog>>,
    opens: Arc<AtomicUsize>,
    modem: Option<JoinHandle<()>>,
}

impl Harness {
    fn new(script: Script) -> Self {
        let (host, device) = duplex(1024);
        let log = Arc::new(Mutex::new(ModemLog::default()));
        let modem = tokio::spawn(run_modem(device, script, log.clone()));
        Self::with_channel(Some(host), log, Some(modem))
    }

    /// Opener that fails like an absent device
    fn absent_device() -> Self {
        Self::with_channel(None, Arc::new(Mutex::new(ModemLog::default())), None)
    }

    fn with_channel(
        channel: Option<DuplexStream>,
        log: Arc<Mutex<ModemLog>>,
        modem: Option<JoinHandle<()>>,
    ) -> Self {
        let opens = Arc::new(AtomicUsize::new(0));
        let opener = FakeOpener {
            channel: Mutex::new(channel),
            opens: opens.clone(),
        };
        let session = ModemSession::new(opener).with_encoder(Encoder::new().with_reference(1));
        Self {
            session,
            log,
            opens,
            modem,
        }
    }

    fn configured(mut self, config: SessionConfig) -> Self {
        self.session = self.session.with_config(config);
        self
    }

    async fn send(&mut self, to: &str, text: &str) -> Result<(), SendError> {
        let result = self.session.send_sms(&SmsMessage::new(to, text)).await;
        if let Some(modem) = self.modem.take() {
            if self.opens.load(Ordering::SeqCst) > 0 {
                modem.await.unwrap();
            } else {
                // The channel was never handed out, so the modem never sees EOF
                modem.abort();
            }
        }
        result
    }
}

#[tokio::test(start_paused = true)]
async fn test_single_segment_message() {
    let mut harness = Harness::new(Script::default());

    harness.send("+15551234567", "Hi").await.unwrap();

    let log = harness.log.lock().unwrap();
    assert_eq!(
        log.lines(),
        vec![
            "AT\r\n",
            "AT+CMGF=0\r\n",
            "AT+CMGS=16\r\n",
            "0011000B915155214365F70000AA02C834\u{1a}\r\n",
        ]
    );
    assert_eq!(log.acks(), 3);
    assert!(log.closed);
    assert_eq!(harness.opens.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_two_segments_are_strictly_sequential() {
    let mut harness = Harness::new(Script::default());
    let text = "x".repeat(200);

    harness.send("+15551234567", &text).await.unwrap();

    let log = harness.log.lock().unwrap();
    assert_eq!(log.acks(), 4);

    let shape: Vec<&str> = log
        .events
        .iter()
        .map(|e| match e {
            Event::Received(line) if line == "AT\r\n" => "at",
            Event::Received(line) if line == "AT+CMGF=0\r\n" => "cmgf",
            Event::Received(line) if line.starts_with("AT+CMGS=") => "header",
            Event::Received(line) if line.ends_with("\u{1a}\r\n") => "body",
            Event::Received(_) => "other",
            Event::Acked => "ok",
        })
        .collect();
    assert_eq!(
        shape,
        vec![
            "at", "ok", "cmgf", "ok", "header", "body", "ok", "header", "body", "ok"
        ]
    );

    let lines = log.lines();
    assert!(lines[3].starts_with("0051000B915155214365F70000AAA0050003010201"));
    assert!(lines[5].starts_with("0051000B915155214365F70000AA36050003010202"));
}

#[tokio::test(start_paused = true)]
async fn test_body_waits_for_prompt_delay() {
    let mut harness = Harness::new(Script::default());

    harness.send("+15551234567", "Hi").await.unwrap();

    let log = harness.log.lock().unwrap();
    let header_at = log.received_at[2];
    let body_at = log.received_at[3];
    assert!(body_at - header_at >= Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn test_empty_address_is_usage_error() {
    let mut harness = Harness::new(Script::default());

    let err = harness.send("", "Hi").await.unwrap_err();

    assert!(matches!(err, SendError::Usage(_)));
    assert_eq!(harness.opens.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_empty_text_is_usage_error() {
    let mut harness = Harness::new(Script::default());

    let err = harness.send("+15551234567", "").await.unwrap_err();

    assert!(matches!(err, SendError::Usage(_)));
    assert_eq!(harness.opens.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_open_failure_aborts_before_any_write() {
    let mut harness = Harness::absent_device();

    let err = harness.send("+15551234567", "Hi").await.unwrap_err();

    assert_eq!(err.phase(), Some(Phase::Open));
    assert!(matches!(
        err,
        SendError::Aborted {
            source: ModemError::Channel(_),
            ..
        }
    ));
    assert_eq!(harness.opens.load(Ordering::SeqCst), 1);
    assert!(harness.log.lock().unwrap().events.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_second_segment_timeout_still_releases_channel() {
    let mut harness = Harness::new(Script {
        silent_on_submission: Some(2),
        ..Script::default()
    });
    let text = "x".repeat(200);

    let started = Instant::now();
    let err = harness.send("+15551234567", &text).await.unwrap_err();

    assert_eq!(err.phase(), Some(Phase::Submission { index: 1 }));
    assert!(err.is_timeout());
    assert!(started.elapsed() >= Duration::from_secs(5));

    let log = harness.log.lock().unwrap();
    // No retry: each line was sent exactly once
    assert_eq!(log.lines().len(), 6);
    assert_eq!(log.acks(), 3);
    assert!(log.closed);
}

#[tokio::test(start_paused = true)]
async fn test_mode_select_error_response_times_out() {
    let mut harness = Harness::new(Script {
        error_on: Some("AT+CMGF=0"),
        ..Script::default()
    });

    let err = harness.send("+15551234567", "Hi").await.unwrap_err();

    assert_eq!(err.phase(), Some(Phase::ModeSelect));
    assert!(err.is_timeout());
    assert_eq!(harness.log.lock().unwrap().lines(), vec!["AT\r\n", "AT+CMGF=0\r\n"]);
}

#[tokio::test(start_paused = true)]
async fn test_encoding_failure_after_initialization() {
    let mut harness = Harness::new(Script::default());

    let err = harness.send("not a number", "Hi").await.unwrap_err();

    assert_eq!(err.phase(), Some(Phase::Encoding));
    assert!(matches!(
        err,
        SendError::Aborted {
            source: ModemError::Encoding(_),
            ..
        }
    ));
    let log = harness.log.lock().unwrap();
    assert_eq!(log.lines(), vec!["AT\r\n", "AT+CMGF=0\r\n"]);
    assert!(log.closed);
}

#[tokio::test(start_paused = true)]
async fn test_write_failure_is_channel_error() {
    let (host, device) = duplex(64);
    drop(device);
    let mut harness =
        Harness::with_channel(Some(host), Arc::new(Mutex::new(ModemLog::default())), None);

    let err = harness.send("+15551234567", "Hi").await.unwrap_err();

    assert_eq!(err.phase(), Some(Phase::Initialization));
    assert!(matches!(
        err,
        SendError::Aborted {
            source: ModemError::Channel(_),
            ..
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_custom_ack_timeout() {
    let mut harness = Harness::new(Script {
        silent_on_submission: Some(1),
        ..Script::default()
    })
    .configured(SessionConfig::default().with_ack_timeout(Duration::from_secs(2)));

    let started = Instant::now();
    let err = harness.send("+15551234567", "Hi").await.unwrap_err();

    assert_eq!(err.phase(), Some(Phase::Submission { index: 0 }));
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(2));
    assert!(elapsed < Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn test_read_failure_is_channel_error_and_releases_channel() {
    let log = Arc::new(Mutex::new(ModemLog::default()));
    let mut session = ModemSession::new(DroppedLineOpener { log: log.clone() });

    let started = Instant::now();
    let err = session
        .send_sms(&SmsMessage::new("+15551234567", "Hi"))
        .await
        .unwrap_err();

    assert_eq!(err.phase(), Some(Phase::Initialization));
    assert!(!err.is_timeout());
    assert!(matches!(
        err,
        SendError::Aborted {
            source: ModemError::Channel(_),
            ..
        }
    ));
    assert!(started.elapsed() < Duration::from_secs(5));

    let log = log.lock().unwrap();
    assert_eq!(log.lines(), vec!["AT\r\n"]);
    assert!(log.closed);
}
