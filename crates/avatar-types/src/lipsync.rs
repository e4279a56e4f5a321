//! Mouth-shape cue sequences.
//!
//! A [`Lipsync`] track is an ordered list of [`MouthCue`]s that together cover
//! the spoken audio from `0` to its duration. Shapes follow the Preston Blair
//! set used by Rhubarb Lip Sync: `A`–`F` are the basic shapes, `G` and `H` are
//! the extended ones, and `X` is the idle/rest mouth.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum allowed distance (seconds) between one cue's end and the next
/// cue's start before the track is considered to have a gap.
pub const CUE_EPSILON: f64 = 0.001;

/// Symbolic mouth shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouthShape {
    /// Closed mouth (P, B, M).
    A,
    /// Slightly open, clenched teeth (most consonants).
    B,
    /// Open mouth (EH, AE).
    C,
    /// Wide open mouth (AA).
    D,
    /// Slightly rounded (AO, ER).
    E,
    /// Puckered lips (UW, OW, W).
    F,
    /// Teeth on lower lip (F, V).
    G,
    /// Tongue raised (long L).
    H,
    /// Idle / rest position.
    X,
}

impl MouthShape {
    /// Returns the single-letter code for this shape.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
            Self::F => "F",
            Self::G => "G",
            Self::H => "H",
            Self::X => "X",
        }
    }
}

impl fmt::Display for MouthShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known mouth-shape code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mouth shape: {0:?}")]
pub struct ParseMouthShapeError(pub String);

impl FromStr for MouthShape {
    type Err = ParseMouthShapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            "E" => Ok(Self::E),
            "F" => Ok(Self::F),
            "G" => Ok(Self::G),
            "H" => Ok(Self::H),
            "X" => Ok(Self::X),
            other => Err(ParseMouthShapeError(other.to_string())),
        }
    }
}

/// One time interval paired with a mouth shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MouthCue {
    /// Start of the interval, in seconds from the beginning of the audio.
    pub start: f64,
    /// End of the interval, in seconds.
    pub end: f64,
    /// Mouth shape held during the interval.
    pub shape: MouthShape,
}

impl MouthCue {
    pub fn new(start: f64, end: f64, shape: MouthShape) -> Self {
        Self { start, end, shape }
    }
}

/// Reasons a cue sequence is not a well-formed lip-sync track.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LipsyncError {
    #[error("cue sequence is empty")]
    Empty,

    #[error("cue {index} has a non-finite or negative timestamp")]
    InvalidTimestamp { index: usize },

    #[error("cue {index} ends before it starts ({start} > {end})")]
    Inverted { index: usize, start: f64, end: f64 },

    #[error("cue {index} starts before the previous cue ({start} < {previous})")]
    Unordered {
        index: usize,
        start: f64,
        previous: f64,
    },

    #[error("gap before cue {index}: previous cue ends at {previous_end}, next starts at {start}")]
    Gap {
        index: usize,
        previous_end: f64,
        start: f64,
    },
}

/// A complete, time-aligned lip-sync track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lipsync {
    /// Duration of the analysed audio in seconds, when the extractor reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Ordered cues covering the audio without gaps.
    pub cues: Vec<MouthCue>,
}

impl Lipsync {
    pub fn new(cues: Vec<MouthCue>) -> Self {
        Self {
            duration: None,
            cues,
        }
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// End time of the last cue, or `0.0` for an empty track.
    pub fn end(&self) -> f64 {
        self.cues.last().map_or(0.0, |cue| cue.end)
    }

    /// Checks that the track is non-empty, ordered, and contiguous from zero.
    pub fn validate(&self) -> Result<(), LipsyncError> {
        if self.cues.is_empty() {
            return Err(LipsyncError::Empty);
        }

        let mut previous_end = 0.0_f64;
        let mut previous_start = 0.0_f64;
        for (index, cue) in self.cues.iter().enumerate() {
            if !cue.start.is_finite() || !cue.end.is_finite() || cue.start < 0.0 {
                return Err(LipsyncError::InvalidTimestamp { index });
            }
            if cue.end < cue.start {
                return Err(LipsyncError::Inverted {
                    index,
                    start: cue.start,
                    end: cue.end,
                });
            }
            if cue.start < previous_start {
                return Err(LipsyncError::Unordered {
                    index,
                    start: cue.start,
                    previous: previous_start,
                });
            }
            if (cue.start - previous_end).abs() > CUE_EPSILON {
                return Err(LipsyncError::Gap {
                    index,
                    previous_end,
                    start: cue.start,
                });
            }
            previous_start = cue.start;
            previous_end = cue.end;
        }
        Ok(())
    }

    /// Returns `true` if the last cue ends within `tolerance` seconds of
    /// `duration`.
    pub fn covers(&self, duration: f64, tolerance: f64) -> bool {
        !self.cues.is_empty() && (self.end() - duration).abs() <= tolerance
    }
}
