//! Song repository
//!
//! Song ids are supplied by the caller. Composite fields go through
//! [`super::codec`] in both directions so callers only ever see typed values.

use chrono::{DateTime, Utc};
use louvor_common::{time, Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::codec;
use crate::models::{MultitrackDescriptor, NewSong, SongRecord, SongUpdate};

const SONG_COLUMNS: &str = r#"
    id, title, artist, album, original_key, bpm, duration, genre, difficulty,
    lyrics, notes, tags, instruments, links, multitrack, ministry_id,
    created_by, created_at, is_active, times_played, last_played,
    rating, rating_count
"#;

/// Durable store for song records
///
/// Cheap to clone; all clones share the same connection.
#[derive(Clone)]
pub struct SongRepository {
    pool: SqlitePool,
}

impl SongRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert a new song
    ///
    /// Fails with [`Error::DuplicateKey`] if the id is taken. Returns the
    /// record as stored.
    pub async fn insert(&self, song: NewSong) -> Result<SongRecord> {
        if song.id.trim().is_empty() {
            return Err(Error::InvalidInput("Song id is required".to_string()));
        }
        if song.title.trim().is_empty() {
            return Err(Error::InvalidInput("Song title is required".to_string()));
        }

        let record = song.into_record(time::now());
        let tags = codec::encode(&record.tags, "tags")?;
        let instruments = codec::encode(&record.instruments, "instruments")?;
        let links = codec::encode(&record.links, "links")?;
        let multitrack = codec::encode(&record.multitrack, "multitrack")?;

        let result = sqlx::query(
            r#"
            INSERT INTO songs (
                id, title, artist, album, original_key, bpm, duration, genre,
                difficulty, lyrics, notes, tags, instruments, links, multitrack,
                ministry_id, created_by, created_at, is_active, times_played,
                last_played, rating, rating_count
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.title)
        .bind(&record.artist)
        .bind(&record.album)
        .bind(&record.original_key)
        .bind(record.bpm)
        .bind(&record.duration)
        .bind(&record.genre)
        .bind(&record.difficulty)
        .bind(&record.lyrics)
        .bind(&record.notes)
        .bind(&tags)
        .bind(&instruments)
        .bind(&links)
        .bind(&multitrack)
        .bind(&record.ministry_id)
        .bind(&record.created_by)
        .bind(time::to_storage(&record.created_at))
        .bind(record.is_active)
        .bind(record.times_played)
        .bind(record.last_played.as_ref().map(time::to_storage))
        .bind(record.rating)
        .bind(record.rating_count)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {}
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                return Err(Error::DuplicateKey(format!("Song already exists: {}", record.id)));
            }
            Err(e) => return Err(Error::Database(e)),
        }

        tracing::info!(song_id = %record.id, title = %record.title, "Song inserted");

        self.get_by_id(&record.id)
            .await?
            .ok_or_else(|| Error::Internal(format!("Song vanished after insert: {}", record.id)))
    }

    /// All songs, newest first
    pub async fn get_all(&self) -> Result<Vec<SongRecord>> {
        let query = format!(
            "SELECT {} FROM songs ORDER BY created_at DESC, rowid DESC",
            SONG_COLUMNS
        );
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        rows.iter().map(song_from_row).collect()
    }

    /// Songs belonging to one ministry, newest first
    pub async fn list_by_ministry(&self, ministry_id: &str) -> Result<Vec<SongRecord>> {
        let query = format!(
            "SELECT {} FROM songs WHERE ministry_id = ? ORDER BY created_at DESC, rowid DESC",
            SONG_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(ministry_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(song_from_row).collect()
    }

    /// Load one song; `None` if the id is unknown
    pub async fn get_by_id(&self, id: &str) -> Result<Option<SongRecord>> {
        let query = format!("SELECT {} FROM songs WHERE id = ?", SONG_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(song_from_row).transpose()
    }

    /// Overwrite every mutable field of a song
    ///
    /// An unknown id is not an error: nothing is written and `Ok(false)` is
    /// returned. `Ok(true)` means a row was updated.
    pub async fn update(&self, id: &str, fields: &SongUpdate) -> Result<bool> {
        if fields.title.trim().is_empty() {
            return Err(Error::InvalidInput("Song title is required".to_string()));
        }

        let tags = codec::encode(&fields.tags, "tags")?;
        let instruments = codec::encode(&fields.instruments, "instruments")?;
        let links = codec::encode(&fields.links, "links")?;
        let multitrack = codec::encode(&fields.multitrack, "multitrack")?;

        let result = sqlx::query(
            r#"
            UPDATE songs SET
                title = ?, artist = ?, album = ?, original_key = ?, bpm = ?,
                duration = ?, genre = ?, difficulty = ?, lyrics = ?, notes = ?,
                tags = ?, instruments = ?, links = ?, multitrack = ?,
                ministry_id = ?, is_active = ?, times_played = ?,
                last_played = ?, rating = ?, rating_count = ?
            WHERE id = ?
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.artist)
        .bind(&fields.album)
        .bind(&fields.original_key)
        .bind(fields.bpm)
        .bind(&fields.duration)
        .bind(&fields.genre)
        .bind(&fields.difficulty)
        .bind(&fields.lyrics)
        .bind(&fields.notes)
        .bind(&tags)
        .bind(&instruments)
        .bind(&links)
        .bind(&multitrack)
        .bind(&fields.ministry_id)
        .bind(fields.is_active)
        .bind(fields.times_played)
        .bind(fields.last_played.as_ref().map(time::to_storage))
        .bind(fields.rating)
        .bind(fields.rating_count)
        .bind(id)
        .execute(&self.pool)
        .await?;

        let matched = result.rows_affected() > 0;
        if matched {
            tracing::info!(song_id = %id, "Song updated");
        } else {
            tracing::debug!(song_id = %id, "Update matched no song");
        }

        Ok(matched)
    }

    /// Soft delete (`false`) or restore (`true`) a song
    pub async fn set_active(&self, id: &str, active: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE songs SET is_active = ? WHERE id = ?")
            .bind(active)
            .bind(id)
            .execute(&self.pool)
            .await?;

        let matched = result.rows_affected() > 0;
        if matched {
            tracing::info!(song_id = %id, active, "Song active flag changed");
        }
        Ok(matched)
    }

    /// Count one more play and stamp `last_played`
    pub async fn record_play(&self, id: &str, at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE songs SET times_played = times_played + 1, last_played = ? WHERE id = ?",
        )
        .bind(time::to_storage(&at))
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replace only the multitrack descriptor of a song
    ///
    /// Call this only after the stems it references have been fully written.
    pub async fn attach_multitrack(&self, id: &str, descriptor: &MultitrackDescriptor) -> Result<bool> {
        let multitrack = codec::encode(&Some(descriptor), "multitrack")?;

        let result = sqlx::query("UPDATE songs SET multitrack = ? WHERE id = ?")
            .bind(&multitrack)
            .bind(id)
            .execute(&self.pool)
            .await?;

        let matched = result.rows_affected() > 0;
        if matched {
            tracing::info!(
                song_id = %id,
                tracks = descriptor.total_tracks(),
                "Multitrack attached to song"
            );
        }
        Ok(matched)
    }
}

fn song_from_row(row: &SqliteRow) -> Result<SongRecord> {
    let tags: Option<String> = row.try_get("tags")?;
    let instruments: Option<String> = row.try_get("instruments")?;
    let links: Option<String> = row.try_get("links")?;
    let multitrack: Option<String> = row.try_get("multitrack")?;
    let created_at: String = row.try_get("created_at")?;
    let last_played: Option<String> = row.try_get("last_played")?;

    Ok(SongRecord {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        artist: row.try_get("artist")?,
        album: row.try_get("album")?,
        original_key: row.try_get("original_key")?,
        bpm: row.try_get("bpm")?,
        duration: row.try_get("duration")?,
        genre: row.try_get("genre")?,
        difficulty: row.try_get("difficulty")?,
        lyrics: row.try_get("lyrics")?,
        notes: row.try_get("notes")?,
        tags: codec::decode(tags.as_deref(), "tags")?,
        instruments: codec::decode(instruments.as_deref(), "instruments")?,
        links: codec::decode(links.as_deref(), "links")?,
        multitrack: codec::decode(multitrack.as_deref(), "multitrack")?,
        ministry_id: row.try_get("ministry_id")?,
        created_by: row.try_get("created_by")?,
        created_at: time::parse_stored(&created_at, "created_at")?,
        is_active: row.try_get("is_active")?,
        times_played: row.try_get("times_played")?,
        last_played: time::parse_stored_opt(last_played.as_deref(), "last_played")?,
        rating: row.try_get("rating")?,
        rating_count: row.try_get("rating_count")?,
    })
}
