//! Audio format descriptors shared by transcribers, synthesizers and the
//! telephony media stream.

use serde::{Deserialize, Serialize};

/// Sample rate used by phone networks (and Twilio media streams).
pub const TELEPHONE_SAMPLING_RATE: u32 = 8000;

/// Audio encodings understood by the providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioEncoding {
    /// 16-bit signed little-endian PCM
    #[default]
    Linear16,
    /// G.711 mu-law, 8 bits per sample
    Mulaw,
}

impl AudioEncoding {
    /// Wire name used in provider query strings.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linear16 => "linear16",
            Self::Mulaw => "mulaw",
        }
    }

    /// Bytes needed to carry one sample.
    #[inline]
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            Self::Linear16 => 2,
            Self::Mulaw => 1,
        }
    }
}

impl std::fmt::Display for AudioEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AudioEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linear16" | "pcm" | "pcm16" => Ok(Self::Linear16),
            "mulaw" | "ulaw" | "mu-law" => Ok(Self::Mulaw),
            other => Err(format!("Unsupported audio encoding: {other}")),
        }
    }
}

/// Returns true when the format can be written to a phone call as-is.
pub fn is_telephone_format(encoding: AudioEncoding, sampling_rate: u32) -> bool {
    encoding == AudioEncoding::Mulaw && sampling_rate == TELEPHONE_SAMPLING_RATE
}
