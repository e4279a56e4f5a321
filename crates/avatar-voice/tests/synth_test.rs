//! Tests for the ElevenLabs synthesizer against a throwaway local HTTP server.

use avatar_voice::{
    ArtifactLayout, ElevenLabsSynthesizer, SpeechSynthesizer, SynthesisConfig, VoiceError,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serves exactly one request with the given status line and body, returning
/// the raw request text.
async fn one_shot_server(status_line: &'static str, body: &'static [u8]) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];

        let header_end = loop {
            let n = socket.read(&mut buf).await.unwrap();
            assert!(n > 0, "client closed before sending headers");
            request.extend_from_slice(&buf[..n]);
            if let Some(pos) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let headers = String::from_utf8_lossy(&request[..header_end]).to_lowercase();
        let content_length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        while request.len() < header_end + content_length {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let head = format!(
            "HTTP/1.1 {}\r\ncontent-type: audio/mpeg\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
            status_line,
            body.len()
        );
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all(body).await.unwrap();
        socket.shutdown().await.ok();

        String::from_utf8_lossy(&request).into_owned()
    });

    (format!("http://{}", addr), handle)
}

fn config(base_url: String) -> SynthesisConfig {
    SynthesisConfig {
        base_url,
        ..SynthesisConfig::new("test-key", "voice-123")
    }
}

#[tokio::test]
async fn test_synthesize_writes_mp3_artifact() {
    let temp = tempfile::tempdir().unwrap();
    let layout = ArtifactLayout::rooted_at(temp.path().join("media"));
    let (base_url, server) = one_shot_server("200 OK", b"ID3-audio-bytes").await;

    let synth = ElevenLabsSynthesizer::new(config(base_url), layout.clone()).unwrap();
    let audio = synth.synthesize("Hello there", "job-a").await.unwrap();

    assert_eq!(audio.url, "/media/tts/job-a.mp3");
    assert_eq!(audio.path, layout.audio_path("job-a"));
    assert_eq!(std::fs::read(&audio.path).unwrap(), b"ID3-audio-bytes");

    let request = server.await.unwrap();
    let lower = request.to_lowercase();
    assert!(request.starts_with("POST /v1/text-to-speech/voice-123 "), "got: {}", request);
    assert!(lower.contains("xi-api-key: test-key"));
    assert!(lower.contains("accept: audio/mpeg"));

    let body_start = request.find("\r\n\r\n").unwrap() + 4;
    let body: serde_json::Value = serde_json::from_str(&request[body_start..]).unwrap();
    assert_eq!(body["text"], "Hello there");
    assert_eq!(body["model_id"], "eleven_multilingual_v2");
    assert_eq!(body["voice_settings"]["use_speaker_boost"], true);
    assert!((body["voice_settings"]["stability"].as_f64().unwrap() - 0.8).abs() < 1e-6);
}

#[tokio::test]
async fn test_synthesize_remote_rejection() {
    let temp = tempfile::tempdir().unwrap();
    let layout = ArtifactLayout::rooted_at(temp.path().join("media"));
    let (base_url, server) =
        one_shot_server("401 Unauthorized", b"{\"detail\":\"invalid_api_key\"}").await;

    let synth = ElevenLabsSynthesizer::new(config(base_url), layout.clone()).unwrap();
    let result = synth.synthesize("Hello", "job-b").await;

    match result {
        Err(VoiceError::RemoteService { status, body, .. }) => {
            assert_eq!(status, Some(401));
            assert!(body.contains("invalid_api_key"));
        }
        other => panic!("expected RemoteService error, got {:?}", other),
    }
    assert!(!layout.audio_path("job-b").exists());
    server.await.unwrap();
}

#[tokio::test]
async fn test_synthesize_missing_voice_id_makes_no_request() {
    let temp = tempfile::tempdir().unwrap();
    let synth = ElevenLabsSynthesizer::new(
        SynthesisConfig::new("test-key", ""),
        ArtifactLayout::rooted_at(temp.path()),
    )
    .unwrap();

    let result = synth.synthesize("Hello", "job-c").await;
    assert!(
        matches!(result, Err(VoiceError::Configuration(_))),
        "got {:?}",
        result
    );
}

#[tokio::test]
async fn test_synthesize_unreachable_provider() {
    let temp = tempfile::tempdir().unwrap();
    // Bind and drop to obtain a port nothing is listening on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let synth = ElevenLabsSynthesizer::new(
        config(format!("http://{}", addr)),
        ArtifactLayout::rooted_at(temp.path()),
    )
    .unwrap();

    let result = synth.synthesize("Hello", "job-d").await;
    assert!(
        matches!(result, Err(VoiceError::RemoteService { status: None, .. })),
        "got {:?}",
        result
    );
}
