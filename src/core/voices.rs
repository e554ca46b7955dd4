//! Static voice catalog.
//!
//! Voice ids come from a fixed provider catalog; an id outside this list is a
//! request-level validation failure before any side effect happens.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a narration voice from the provider catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceId {
    Alloy,
    Ash,
    Coral,
    Echo,
    Fable,
    Onyx,
    Nova,
    Sage,
    Shimmer,
}

impl VoiceId {
    pub const ALL: [VoiceId; 9] = [
        VoiceId::Alloy,
        VoiceId::Ash,
        VoiceId::Coral,
        VoiceId::Echo,
        VoiceId::Fable,
        VoiceId::Onyx,
        VoiceId::Nova,
        VoiceId::Sage,
        VoiceId::Shimmer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceId::Alloy => "alloy",
            VoiceId::Ash => "ash",
            VoiceId::Coral => "coral",
            VoiceId::Echo => "echo",
            VoiceId::Fable => "fable",
            VoiceId::Onyx => "onyx",
            VoiceId::Nova => "nova",
            VoiceId::Sage => "sage",
            VoiceId::Shimmer => "shimmer",
        }
    }
}

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoiceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "alloy" => Ok(VoiceId::Alloy),
            "ash" => Ok(VoiceId::Ash),
            "coral" => Ok(VoiceId::Coral),
            "echo" => Ok(VoiceId::Echo),
            "fable" => Ok(VoiceId::Fable),
            "onyx" => Ok(VoiceId::Onyx),
            "nova" => Ok(VoiceId::Nova),
            "sage" => Ok(VoiceId::Sage),
            "shimmer" => Ok(VoiceId::Shimmer),
            other => Err(format!("unknown voice: {other}")),
        }
    }
}

/// Catalog entry exposed to collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceInfo {
    pub id: VoiceId,
    pub display_name: &'static str,
    pub category: &'static str,
}

/// The full static catalog.
pub fn voice_catalog() -> Vec<VoiceInfo> {
    vec![
        VoiceInfo { id: VoiceId::Alloy, display_name: "Alloy", category: "Clear & Professional" },
        VoiceInfo { id: VoiceId::Ash, display_name: "Ash", category: "Warm & Friendly" },
        VoiceInfo { id: VoiceId::Coral, display_name: "Coral", category: "Bright & Energetic" },
        VoiceInfo { id: VoiceId::Echo, display_name: "Echo", category: "Deep & Authoritative" },
        VoiceInfo { id: VoiceId::Fable, display_name: "Fable", category: "Storytelling & Expressive" },
        VoiceInfo { id: VoiceId::Onyx, display_name: "Onyx", category: "Strong & Confident" },
        VoiceInfo { id: VoiceId::Nova, display_name: "Nova", category: "Fresh & Modern" },
        VoiceInfo { id: VoiceId::Sage, display_name: "Sage", category: "Excited & Firm" },
        VoiceInfo { id: VoiceId::Shimmer, display_name: "Shimmer", category: "Gentle & Soothing" },
    ]
}

/// Fixed narration used for per-voice reference samples. Synthesized once per
/// voice and memoized in object storage under a stable key.
pub const REFERENCE_TEXT: &str = "This narration serves as a reference for the selected voice. \
It demonstrates pacing, warmth and clarity across a few varied sentences, so a listener can \
judge how longer passages will sound. Choose the voice that feels most natural for an extended \
listening session.";
