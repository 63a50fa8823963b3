//! Song records and their composite fields
//!
//! Composite fields (`tags`, `instruments`, `links`, `multitrack`) are stored
//! as JSON text; see [`crate::db::codec`] for the read/write rule.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use super::MultitrackDescriptor;

/// Ordered tag list without duplicates
///
/// Insertion order is kept; re-adding an existing tag is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TagSet(Vec<String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag, returning false if it was already present
    pub fn insert(&mut self, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        if self.0.contains(&tag) {
            return false;
        }
        self.0.push(tag);
        true
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for tag in iter {
            set.insert(tag);
        }
        set
    }
}

impl<'de> Deserialize<'de> for TagSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tags = Vec::<String>::deserialize(deserializer)?;
        Ok(tags.into_iter().collect())
    }
}

/// One instrument used in a song arrangement
///
/// Extra keys written by other clients are preserved on round-trip. Older rows
/// stored plain strings (`["violão", "baixo"]`); those read as descriptors with
/// only `name` set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentDescriptor {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub part: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl InstrumentDescriptor {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            part: None,
            extra: BTreeMap::new(),
        }
    }
}

#[derive(Deserialize)]
struct InstrumentObject {
    name: String,
    #[serde(default)]
    part: Option<String>,
    #[serde(flatten)]
    extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredInstrument {
    Plain(String),
    Object(InstrumentObject),
}

impl<'de> Deserialize<'de> for InstrumentDescriptor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match StoredInstrument::deserialize(deserializer)? {
            StoredInstrument::Plain(name) => InstrumentDescriptor::named(name),
            StoredInstrument::Object(obj) => InstrumentDescriptor {
                name: obj.name,
                part: obj.part,
                extra: obj.extra,
            },
        })
    }
}

/// Ordered instrument list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstrumentList(pub Vec<InstrumentDescriptor>);

impl InstrumentList {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Link kind (e.g. "youtube", "cifra", "spotify") to URL
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkMap(pub BTreeMap<String, String>);

impl LinkMap {
    pub fn get(&self, kind: &str) -> Option<&str> {
        self.0.get(kind).map(String::as_str)
    }

    pub fn insert(&mut self, kind: impl Into<String>, url: impl Into<String>) {
        self.0.insert(kind.into(), url.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn default_true() -> bool {
    true
}

/// Stored song
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongRecord {
    pub id: String,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub original_key: Option<String>,
    pub bpm: Option<i64>,
    /// Free-form duration as entered ("4:35")
    pub duration: Option<String>,
    pub genre: Option<String>,
    pub difficulty: Option<String>,
    pub lyrics: Option<String>,
    pub notes: Option<String>,
    pub tags: TagSet,
    pub instruments: InstrumentList,
    pub links: LinkMap,
    pub multitrack: Option<MultitrackDescriptor>,
    pub ministry_id: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
    pub times_played: i64,
    pub last_played: Option<DateTime<Utc>>,
    pub rating: Option<f64>,
    pub rating_count: i64,
}

/// Song as submitted for insertion
///
/// Everything except `id` and `title` may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSong {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub original_key: Option<String>,
    #[serde(default)]
    pub bpm: Option<i64>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub lyrics: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: TagSet,
    #[serde(default)]
    pub instruments: InstrumentList,
    #[serde(default)]
    pub links: LinkMap,
    #[serde(default)]
    pub multitrack: Option<MultitrackDescriptor>,
    #[serde(default)]
    pub ministry_id: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

impl NewSong {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    /// Build the record that will be stored, stamping `created_at`
    pub fn into_record(self, created_at: DateTime<Utc>) -> SongRecord {
        SongRecord {
            id: self.id,
            title: self.title,
            artist: self.artist,
            album: self.album,
            original_key: self.original_key,
            bpm: self.bpm,
            duration: self.duration,
            genre: self.genre,
            difficulty: self.difficulty,
            lyrics: self.lyrics,
            notes: self.notes,
            tags: self.tags,
            instruments: self.instruments,
            links: self.links,
            multitrack: self.multitrack,
            ministry_id: self.ministry_id,
            created_by: self.created_by,
            created_at,
            is_active: true,
            times_played: 0,
            last_played: None,
            rating: None,
            rating_count: 0,
        }
    }
}

/// Replacement values for every mutable field of a song
///
/// `id`, `createdBy` and `createdAt` are not part of an update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongUpdate {
    pub title: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub original_key: Option<String>,
    #[serde(default)]
    pub bpm: Option<i64>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub lyrics: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: TagSet,
    #[serde(default)]
    pub instruments: InstrumentList,
    #[serde(default)]
    pub links: LinkMap,
    #[serde(default)]
    pub multitrack: Option<MultitrackDescriptor>,
    #[serde(default)]
    pub ministry_id: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub times_played: i64,
    #[serde(default)]
    pub last_played: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub rating_count: i64,
}

impl From<&SongRecord> for SongUpdate {
    /// Start an update from the current state of a record
    fn from(song: &SongRecord) -> Self {
        Self {
            title: song.title.clone(),
            artist: song.artist.clone(),
            album: song.album.clone(),
            original_key: song.original_key.clone(),
            bpm: song.bpm,
            duration: song.duration.clone(),
            genre: song.genre.clone(),
            difficulty: song.difficulty.clone(),
            lyrics: song.lyrics.clone(),
            notes: song.notes.clone(),
            tags: song.tags.clone(),
            instruments: song.instruments.clone(),
            links: song.links.clone(),
            multitrack: song.multitrack.clone(),
            ministry_id: song.ministry_id.clone(),
            is_active: song.is_active,
            times_played: song.times_played,
            last_played: song.last_played,
            rating: song.rating,
            rating_count: song.rating_count,
        }
    }
}
