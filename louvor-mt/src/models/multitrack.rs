//! Multitrack descriptor: the stems attached to one song

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Instrument category assigned to a stem
///
/// Declaration order is the classification precedence (see
/// [`crate::services::instrument_classifier`]); `Outros` is the catch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Instrument {
    Vocal,
    Guitarra,
    Baixo,
    Bateria,
    Teclado,
    Violino,
    Saxofone,
    Flauta,
    Outros,
}

impl Instrument {
    pub const ALL: [Instrument; 9] = [
        Instrument::Vocal,
        Instrument::Guitarra,
        Instrument::Baixo,
        Instrument::Bateria,
        Instrument::Teclado,
        Instrument::Violino,
        Instrument::Saxofone,
        Instrument::Flauta,
        Instrument::Outros,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Instrument::Vocal => "vocal",
            Instrument::Guitarra => "guitarra",
            Instrument::Baixo => "baixo",
            Instrument::Bateria => "bateria",
            Instrument::Teclado => "teclado",
            Instrument::Violino => "violino",
            Instrument::Saxofone => "saxofone",
            Instrument::Flauta => "flauta",
            Instrument::Outros => "outros",
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_volume() -> f64 {
    1.0
}

/// One stem in durable storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultitrackTrack {
    /// Stem name without extension, as found in the archive
    pub name: String,

    /// Original file name inside the archive
    pub file_name: String,

    /// Path of the stored copy, relative to the stem storage root
    pub file_path: String,

    pub instrument: Instrument,

    /// Mixer volume, 0.0 - 1.0
    #[serde(default = "default_volume")]
    pub volume: f64,

    #[serde(rename = "mute", default)]
    pub muted: bool,

    #[serde(default)]
    pub solo: bool,
}

impl MultitrackTrack {
    /// Fresh track with mixer defaults (full volume, not muted, not solo)
    pub fn new(name: String, file_name: String, file_path: String, instrument: Instrument) -> Self {
        Self {
            name,
            file_name,
            file_path,
            instrument,
            volume: default_volume(),
            muted: false,
            solo: false,
        }
    }
}

/// All stems uploaded for one song
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultitrackDescriptor {
    /// Name of the uploaded archive
    pub archive_file_name: String,

    /// Where the archive was buffered during ingestion (informational only,
    /// the file no longer exists)
    #[serde(default)]
    pub archive_file_path: String,

    /// Tracks in archive order
    #[serde(default)]
    pub tracks: Vec<MultitrackTrack>,

    pub uploaded_at: DateTime<Utc>,
}

impl MultitrackDescriptor {
    pub fn total_tracks(&self) -> usize {
        self.tracks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_instrument_serializes_lowercase() {
        for instrument in Instrument::ALL {
            let value = serde_json::to_value(instrument).unwrap();
            assert_eq!(value, json!(instrument.as_str()));
        }
    }

    #[test]
    fn test_track_wire_shape() {
        let track = MultitrackTrack::new(
            "vocal_lead".to_string(),
            "vocal_lead.wav".to_string(),
            "0b6f/track_1_vocal.wav".to_string(),
            Instrument::Vocal,
        );

        let value = serde_json::to_value(&track).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "vocal_lead",
                "fileName": "vocal_lead.wav",
                "filePath": "0b6f/track_1_vocal.wav",
                "instrument": "vocal",
                "volume": 1.0,
                "mute": false,
                "solo": false,
            })
        );
    }

    #[test]
    fn test_track_missing_mixer_fields_use_defaults() {
        let track: MultitrackTrack = serde_json::from_value(json!({
            "name": "bass",
            "fileName": "bass.mp3",
            "filePath": "x/track_1_baixo.mp3",
            "instrument": "baixo",
        }))
        .unwrap();

        assert_eq!(track.volume, 1.0);
        assert!(!track.muted);
        assert!(!track.solo);
    }
}
