//! Audio variants: named treatments defining pacing and background blend.
//!
//! Every variant other than `standard` is a mix variant: its tracks reuse an
//! existing voice-only recording and are blended with a background asset by
//! the external mixing worker.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Standard,
    Sleep,
    Meditation,
    Energy,
}

/// Volume and background defaults for one variant.
#[derive(Debug, Clone, Copy)]
pub struct MixProfile {
    /// Narration volume, 0-100.
    pub voice_volume: u8,
    /// Background volume, 0-100.
    pub bg_volume: u8,
    pub description: &'static str,
    /// Variant-keyed default background asset; `None` falls through to the
    /// single global default configured on the dispatcher.
    pub background: Option<&'static str>,
}

const OCEAN_WAVES: &str =
    "https://media.resona.audio/site-assets/audio/mixing-tracks/ocean-waves-1.mp3";

/// Applied when a variant has no dedicated profile entry: an even blend.
const DEFAULT_MIX_PROFILE: MixProfile = MixProfile {
    voice_volume: 50,
    bg_volume: 50,
    description: "50% voice, 50% background",
    background: Some(OCEAN_WAVES),
};

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Standard => "standard",
            Variant::Sleep => "sleep",
            Variant::Meditation => "meditation",
            Variant::Energy => "energy",
        }
    }

    /// Whether tracks of this variant require background mixing.
    pub fn is_mix(&self) -> bool {
        !matches!(self, Variant::Standard)
    }

    /// Static volume/background profile for this variant.
    pub fn mix_profile(&self) -> MixProfile {
        match self {
            Variant::Standard => MixProfile {
                voice_volume: 100,
                bg_volume: 0,
                description: "Voice only narration",
                background: None,
            },
            Variant::Sleep => MixProfile {
                voice_volume: 10,
                bg_volume: 90,
                description: "10% voice, 90% background",
                background: Some(OCEAN_WAVES),
            },
            Variant::Energy => MixProfile {
                voice_volume: 80,
                bg_volume: 20,
                description: "80% voice, 20% background",
                background: Some(OCEAN_WAVES),
            },
            Variant::Meditation => DEFAULT_MIX_PROFILE,
        }
    }

    /// Default display name for a lazily created audio set.
    pub fn default_set_name(&self) -> String {
        let s = self.as_str();
        let mut name = String::with_capacity(s.len() + 8);
        name.push(s.as_bytes()[0].to_ascii_uppercase() as char);
        name.push_str(&s[1..]);
        name.push_str(" Version");
        name
    }

    /// Rewrite text pacing before synthesis. Sleep and meditation lengthen
    /// pauses with ellipsis markers the provider renders as silence; energy
    /// tightens clause pauses; standard is the identity.
    pub fn apply_pacing(&self, text: &str) -> String {
        match self {
            Variant::Standard => text.to_string(),
            Variant::Sleep => text
                .replace(". ", ". ... ")
                .replace("? ", "? ... ")
                .replace("! ", "! ... ")
                .replace("; ", "... ")
                .replace(", ", "... "),
            Variant::Meditation => text
                .replace(". ", ". ........ ")
                .replace("? ", "? ........ ")
                .replace("! ", "! ........ ")
                .replace("; ", "........ ")
                .replace(", ", "........ "),
            Variant::Energy => text.replace("; ", ", "),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(Variant::Standard),
            "sleep" => Ok(Variant::Sleep),
            "meditation" => Ok(Variant::Meditation),
            "energy" => Ok(Variant::Energy),
            other => Err(format!("unknown variant: {other}")),
        }
    }
}

impl Default for Variant {
    fn default() -> Self {
        Variant::Standard
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_is_not_mix() {
        assert!(!Variant::Standard.is_mix());
        assert!(Variant::Sleep.is_mix());
        assert!(Variant::Meditation.is_mix());
        assert!(Variant::Energy.is_mix());
    }

    #[test]
    fn test_profiles_are_complementary() {
        for variant in [Variant::Sleep, Variant::Meditation, Variant::Energy] {
            let p = variant.mix_profile();
            assert_eq!(p.voice_volume as u16 + p.bg_volume as u16, 100);
            assert!(p.background.is_some());
        }
    }

    #[test]
    fn test_standard_profile_has_no_background() {
        let p = Variant::Standard.mix_profile();
        assert_eq!(p.voice_volume, 100);
        assert!(p.background.is_none());
    }

    #[test]
    fn test_standard_pacing_is_identity() {
        let text = "First. Second, third; fourth!";
        assert_eq!(Variant::Standard.apply_pacing(text), text);
    }

    #[test]
    fn test_sleep_and_meditation_lengthen_text() {
        let text = "One sentence. Two, clauses here. A third one!";
        assert!(Variant::Sleep.apply_pacing(text).len() > text.len());
        assert!(Variant::Meditation.apply_pacing(text).len() > Variant::Sleep.apply_pacing(text).len());
    }

    #[test]
    fn test_energy_never_lengthens() {
        let text = "Quick thought; another one. Done!";
        assert!(Variant::Energy.apply_pacing(text).len() <= text.len());
    }

    #[test]
    fn test_default_set_name() {
        assert_eq!(Variant::Sleep.default_set_name(), "Sleep Version");
        assert_eq!(Variant::Standard.default_set_name(), "Standard Version");
    }

    #[test]
    fn test_parse_round_trip() {
        for v in [Variant::Standard, Variant::Sleep, Variant::Meditation, Variant::Energy] {
            assert_eq!(v.as_str().parse::<Variant>().unwrap(), v);
        }
    }
}
