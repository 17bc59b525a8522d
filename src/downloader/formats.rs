// Format catalog - fixed quality presets mapped to yt-dlp selector expressions
//
// One preset applies to the whole session, not to individual queue
// entries. The audio preset is the only one that triggers audio
// extraction; everything else is merged and remuxed into MKV.

use serde::Serialize;

/// Container every video preset is remuxed into after merging.
pub const MERGE_CONTAINER: &str = "mkv";

/// Audio codec / bitrate for the audio-only preset.
pub const AUDIO_CODEC: &str = "mp3";
pub const AUDIO_QUALITY: &str = "192K";

const AUDIO_SELECTOR: &str = "bestaudio/best";

/// One entry of the static catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormatPreset {
    pub label: &'static str,
    pub selector: &'static str,
}

/// Post-processing directive derived from the chosen preset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Postprocessing {
    /// Merge separate video/audio streams and remux into `container`
    RemuxVideo { container: &'static str },
    /// Extract the audio track and transcode it
    ExtractAudio {
        codec: &'static str,
        quality: &'static str,
    },
}

const CATALOG: &[FormatPreset] = &[
    FormatPreset {
        label: "Best Quality",
        selector: "bestvideo+bestaudio/best",
    },
    FormatPreset {
        label: "1080p",
        selector: "bestvideo[height<=1080]+bestaudio/best[height<=1080]",
    },
    FormatPreset {
        label: "720p",
        selector: "bestvideo[height<=720]+bestaudio/best[height<=720]",
    },
    FormatPreset {
        label: "480p",
        selector: "bestvideo[height<=480]+bestaudio/best[height<=480]",
    },
    FormatPreset {
        label: "360p",
        selector: "bestvideo[height<=360]+bestaudio/best[height<=360]",
    },
    FormatPreset {
        label: "240p",
        selector: "bestvideo[height<=240]+bestaudio/best[height<=240]",
    },
    FormatPreset {
        label: "Audio Only (MP3)",
        selector: AUDIO_SELECTOR,
    },
];

/// The full catalog, in the order the selector widget shows it.
pub fn catalog() -> &'static [FormatPreset] {
    CATALOG
}

/// Look a preset up by its display label.
pub fn find(label: &str) -> Option<&'static FormatPreset> {
    CATALOG.iter().find(|p| p.label == label)
}

impl FormatPreset {
    pub fn is_audio_only(&self) -> bool {
        self.selector == AUDIO_SELECTOR
    }

    pub fn postprocessing(&self) -> Postprocessing {
        if self.is_audio_only() {
            Postprocessing::ExtractAudio {
                codec: AUDIO_CODEC,
                quality: AUDIO_QUALITY,
            }
        } else {
            Postprocessing::RemuxVideo {
                container: MERGE_CONTAINER,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_has_seven_presets() {
        assert_eq!(catalog().len(), 7);
    }

    #[test]
    fn test_labels_are_unique() {
        for (i, a) in catalog().iter().enumerate() {
            for b in &catalog()[i + 1..] {
                assert_ne!(a.label, b.label);
            }
        }
    }

    #[test]
    fn test_find_known_label() {
        let preset = find("720p").expect("720p preset");
        assert_eq!(
            preset.selector,
            "bestvideo[height<=720]+bestaudio/best[height<=720]"
        );
    }

    #[test]
    fn test_find_unknown_label() {
        assert!(find("4K HDR").is_none());
    }

    #[test]
    fn test_audio_preset_extracts_audio() {
        let audio = find("Audio Only (MP3)").unwrap();
        assert!(audio.is_audio_only());
        assert_eq!(
            audio.postprocessing(),
            Postprocessing::ExtractAudio {
                codec: "mp3",
                quality: "192K"
            }
        );
    }

    #[test]
    fn test_every_other_preset_remuxes_to_mkv() {
        for preset in catalog().iter().filter(|p| !p.is_audio_only()) {
            assert_eq!(
                preset.postprocessing(),
                Postprocessing::RemuxVideo { container: "mkv" },
                "preset {}",
                preset.label
            );
        }
    }
}
