use crate::artifacts::ArtifactLayout;
use crate::config::ToolsConfig;
use crate::error::VoiceError;
use crate::process::run_tool;
use async_trait::async_trait;
use avatar_types::{Lipsync, MouthCue, MouthShape};
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// How far, in seconds, the last cue may end from the reported audio duration.
pub const COVERAGE_TOLERANCE: f64 = 0.05;

/// Analyses speech audio and produces a time-aligned mouth-shape track.
#[async_trait]
pub trait VisemeExtractor: Send + Sync {
    async fn extract(&self, audio: &Path, key: &str) -> Result<Lipsync, VoiceError>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RhubarbOutput {
    #[serde(default)]
    metadata: Option<RhubarbMetadata>,
    mouth_cues: Vec<RhubarbCue>,
}

#[derive(Deserialize)]
struct RhubarbMetadata {
    #[serde(default)]
    duration: Option<f64>,
}

#[derive(Deserialize)]
struct RhubarbCue {
    start: f64,
    end: f64,
    value: String,
}

/// Decodes Rhubarb's JSON export into a validated [`Lipsync`] track.
pub fn parse_rhubarb_json(json: &str) -> Result<Lipsync, VoiceError> {
    let output: RhubarbOutput =
        serde_json::from_str(json).map_err(|e| VoiceError::parse("rhubarb output", e))?;

    let cues = output
        .mouth_cues
        .into_iter()
        .map(|cue| {
            let shape: MouthShape = cue
                .value
                .parse()
                .map_err(|e| VoiceError::parse("rhubarb output", e))?;
            Ok(MouthCue::new(cue.start, cue.end, shape))
        })
        .collect::<Result<Vec<_>, VoiceError>>()?;

    let mut lipsync = Lipsync::new(cues);
    lipsync
        .validate()
        .map_err(|e| VoiceError::parse("rhubarb output", e))?;

    if let Some(duration) = output.metadata.and_then(|m| m.duration) {
        if !lipsync.covers(duration, COVERAGE_TOLERANCE) {
            return Err(VoiceError::parse(
                "rhubarb output",
                format!(
                    "cues end at {:.3}s but the audio lasts {:.3}s",
                    lipsync.end(),
                    duration
                ),
            ));
        }
        lipsync = lipsync.with_duration(duration);
    }
    Ok(lipsync)
}

/// Rhubarb Lip Sync adapter.
///
/// The JSON track is written to `<lipsync_dir>/<key>.json` and kept there as a
/// public artifact.
#[derive(Debug, Clone)]
pub struct RhubarbExtractor {
    binary: PathBuf,
    recognizer: String,
    layout: ArtifactLayout,
}

impl RhubarbExtractor {
    pub fn new(binary: impl Into<PathBuf>, recognizer: impl Into<String>, layout: ArtifactLayout) -> Self {
        Self {
            binary: binary.into(),
            recognizer: recognizer.into(),
            layout,
        }
    }

    pub fn from_config(config: &ToolsConfig, layout: ArtifactLayout) -> Self {
        Self::new(&config.rhubarb_path, config.recognizer.clone(), layout)
    }

    fn arguments(&self, audio: &Path, output: &Path) -> Vec<OsString> {
        vec![
            "-r".into(),
            self.recognizer.clone().into(),
            "-f".into(),
            "json".into(),
            "-o".into(),
            output.into(),
            audio.into(),
        ]
    }
}

#[async_trait]
impl VisemeExtractor for RhubarbExtractor {
    async fn extract(&self, audio: &Path, key: &str) -> Result<Lipsync, VoiceError> {
        let output = self.layout.lipsync_path(key);
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| VoiceError::io(parent, e))?;
        }

        run_tool("rhubarb", &self.binary, self.arguments(audio, &output)).await?;

        let json = tokio::fs::read_to_string(&output)
            .await
            .map_err(|e| VoiceError::io(&output, e))?;
        let lipsync = parse_rhubarb_json(&json)?;

        tracing::debug!(key, cues = lipsync.cues.len(), "extracted mouth cues");
        Ok(lipsync)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "metadata": { "soundFile": "/tmp/abc.wav", "duration": 0.9 },
        "mouthCues": [
            { "start": 0.00, "end": 0.40, "value": "A" },
            { "start": 0.40, "end": 0.90, "value": "X" }
        ]
    }"#;

    #[test]
    fn parses_rhubarb_export() {
        let lipsync = parse_rhubarb_json(SAMPLE).expect("valid export");
        assert_eq!(lipsync.duration, Some(0.9));
        assert_eq!(
            lipsync.cues,
            vec![
                MouthCue::new(0.0, 0.4, MouthShape::A),
                MouthCue::new(0.4, 0.9, MouthShape::X),
            ]
        );
        assert!(lipsync.covers(0.9, 0.01));
    }

    #[test]
    fn metadata_is_optional() {
        let lipsync =
            parse_rhubarb_json(r#"{"mouthCues":[{"start":0,"end":0.2,"value":"X"}]}"#).unwrap();
        assert_eq!(lipsync.duration, None);
        assert_eq!(lipsync.cues.len(), 1);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = parse_rhubarb_json("not json").unwrap_err();
        assert!(matches!(err, VoiceError::Parse { .. }), "got {:?}", err);
    }

    #[test]
    fn unknown_shape_is_a_parse_error() {
        let err =
            parse_rhubarb_json(r#"{"mouthCues":[{"start":0,"end":0.2,"value":"Q"}]}"#).unwrap_err();
        match err {
            VoiceError::Parse { reason, .. } => assert!(reason.contains("Q")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn empty_cue_list_is_a_parse_error() {
        let err = parse_rhubarb_json(r#"{"mouthCues":[]}"#).unwrap_err();
        assert!(matches!(err, VoiceError::Parse { .. }));
    }

    #[test]
    fn inverted_cue_is_a_parse_error() {
        let err = parse_rhubarb_json(
            r#"{"mouthCues":[{"start":0,"end":0.5,"value":"A"},{"start":0.5,"end":0.4,"value":"B"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, VoiceError::Parse { .. }));
    }

    #[test]
    fn truncated_track_is_a_parse_error() {
        let err = parse_rhubarb_json(
            r#"{"metadata":{"duration":5.0},"mouthCues":[{"start":0,"end":0.9,"value":"A"}]}"#,
        )
        .unwrap_err();
        match err {
            VoiceError::Parse { reason, .. } => {
                assert!(reason.contains("0.900"), "got {}", reason);
                assert!(reason.contains("5.000"), "got {}", reason);
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn end_within_tolerance_of_duration_is_accepted() {
        let lipsync = parse_rhubarb_json(
            r#"{"metadata":{"duration":0.92},"mouthCues":[{"start":0,"end":0.9,"value":"X"}]}"#,
        )
        .unwrap();
        assert_eq!(lipsync.duration, Some(0.92));
    }

    #[test]
    fn arguments_request_json_output() {
        let extractor = RhubarbExtractor::from_config(
            &ToolsConfig::default(),
            ArtifactLayout::rooted_at("media"),
        );
        let args: Vec<String> = extractor
            .arguments(Path::new("in.wav"), Path::new("out.json"))
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            ["-r", "phonetic", "-f", "json", "-o", "out.json", "in.wav"]
        );
    }
}
