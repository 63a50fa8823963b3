//! Multitrack ingestion pipeline tests
//!
//! Runs intake → extract → scan → classify → relocate against a temp root
//! folder and checks what is left on disk afterwards.

mod helpers;

use std::collections::HashSet;
use std::fs;
use std::io::Cursor;

use helpers::{build_zip, wav_bytes, AudioConfig, ZipEntry};
use louvor_common::config::MultitrackSettings;
use louvor_mt::models::Instrument;
use louvor_mt::services::{IngestError, MultitrackIngestor};
use tempfile::TempDir;

fn ingestor(dir: &TempDir) -> MultitrackIngestor {
    MultitrackIngestor::new(
        dir.path().join("multitracks"),
        dir.path().join("tmp"),
        &MultitrackSettings::default(),
    )
}

fn entries(dir: &std::path::Path) -> usize {
    fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

fn ingest_bytes(
    ingestor: &MultitrackIngestor,
    name: &str,
    bytes: Vec<u8>,
) -> Result<louvor_mt::services::IngestOutcome, IngestError> {
    let archive = ingestor.intake().accept(Cursor::new(bytes), name, Some("application/zip"))?;
    ingestor.ingest(archive)
}

#[test]
fn test_band_archive_scenario() {
    let dir = TempDir::new().unwrap();
    let ingestor = ingestor(&dir);
    let wav = wav_bytes(&AudioConfig::default());

    let bytes = build_zip(&[
        ZipEntry::file("vocal_lead.wav", wav.clone()),
        ZipEntry::file("guitar_main.wav", wav.clone()),
        ZipEntry::file("drums.wav", wav.clone()),
    ]);

    let outcome = ingest_bytes(&ingestor, "band.zip", bytes).unwrap();
    let descriptor = &outcome.descriptor;

    assert_eq!(descriptor.total_tracks(), 3);
    assert_eq!(descriptor.archive_file_name, "band.zip");

    let instruments: Vec<Instrument> = descriptor.tracks.iter().map(|t| t.instrument).collect();
    assert_eq!(
        instruments,
        vec![Instrument::Vocal, Instrument::Guitarra, Instrument::Bateria]
    );

    let stored: Vec<String> = descriptor
        .tracks
        .iter()
        .map(|t| t.file_path.rsplit('/').next().unwrap().to_string())
        .collect();
    assert_eq!(
        stored,
        vec!["track_1_vocal.wav", "track_2_guitarra.wav", "track_3_bateria.wav"]
    );

    // All three under one new directory, byte-identical to the input
    let storage = dir.path().join("multitracks");
    assert_eq!(entries(&storage), 1);
    let stem_dir = storage.join(outcome.directory_id.to_string());
    assert_eq!(entries(&stem_dir), 3);
    for track in &descriptor.tracks {
        assert_eq!(fs::read(storage.join(&track.file_path)).unwrap(), wav);
        assert_eq!(track.volume, 1.0);
        assert!(!track.muted);
        assert!(!track.solo);
    }

    assert_eq!(descriptor.tracks[0].name, "vocal_lead");
    assert_eq!(descriptor.tracks[0].file_name, "vocal_lead.wav");

    // Upload buffer and workspace are gone
    assert_eq!(entries(&dir.path().join("tmp")), 0);
}

#[test]
fn test_nested_folders_and_noise_files() {
    let dir = TempDir::new().unwrap();
    let ingestor = ingestor(&dir);

    let bytes = build_zip(&[
        ZipEntry::dir("Santo/"),
        ZipEntry::file("Santo/Click.wav", "c"),
        ZipEntry::dir("Santo/Cordas"),
        ZipEntry::file("Santo/Cordas/Violino 1.flac", "v"),
        ZipEntry::file("Santo/capa.jpg", "jpg"),
        ZipEntry::file("__MACOSX/Santo/._Click.wav", "junk"),
        ZipEntry::file("Santo/Baixo.MP3", "b"),
    ]);

    let outcome = ingest_bytes(&ingestor, "santo.zip", bytes).unwrap();
    let tracks = &outcome.descriptor.tracks;

    assert_eq!(tracks.len(), 3);
    assert_eq!(tracks[0].instrument, Instrument::Outros);
    assert_eq!(tracks[1].instrument, Instrument::Violino);
    assert!(tracks[1].file_path.ends_with("track_2_violino.flac"));
    assert_eq!(tracks[2].instrument, Instrument::Baixo);
    assert!(tracks[2].file_path.ends_with("track_3_baixo.mp3"));
}

#[test]
fn test_dot_underscore_stem_outside_macosx_is_ingested() {
    let dir = TempDir::new().unwrap();
    let ingestor = ingestor(&dir);

    let bytes = build_zip(&[
        ZipEntry::file("._intro_vocal.wav", "v"),
        ZipEntry::file("drums.wav", "d"),
    ]);

    let outcome = ingest_bytes(&ingestor, "intro.zip", bytes).unwrap();
    let tracks = &outcome.descriptor.tracks;

    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].name, "._intro_vocal");
    assert_eq!(tracks[0].instrument, Instrument::Vocal);
    assert_eq!(tracks[1].instrument, Instrument::Bateria);
}

#[test]
fn test_no_audio_found_leaves_nothing_behind() {
    let dir = TempDir::new().unwrap();
    let ingestor = ingestor(&dir);

    let bytes = build_zip(&[
        ZipEntry::file("letra.txt", "Santo, santo, santo"),
        ZipEntry::file("cifra.pdf", "%PDF"),
    ]);

    let err = ingest_bytes(&ingestor, "docs.zip", bytes).unwrap_err();

    assert!(matches!(err, IngestError::NoAudioFound));
    assert_eq!(err.to_string(), "No audio files found in archive");
    assert_eq!(entries(&dir.path().join("multitracks")), 0);
    assert_eq!(entries(&dir.path().join("tmp")), 0);
}

#[test]
fn test_path_traversal_rejected() {
    let dir = TempDir::new().unwrap();
    let ingestor = ingestor(&dir);

    let bytes = build_zip(&[
        ZipEntry::file("vocal.wav", "v"),
        ZipEntry::file("../../../outside.wav", "x"),
    ]);

    let err = ingest_bytes(&ingestor, "evil.zip", bytes).unwrap_err();

    assert!(matches!(err, IngestError::ArchiveCorrupt(_)), "got {:?}", err);
    assert!(!dir.path().join("outside.wav").exists());
    assert_eq!(entries(&dir.path().join("multitracks")), 0);
    assert_eq!(entries(&dir.path().join("tmp")), 0);
}

#[test]
fn test_corrupt_archive() {
    let dir = TempDir::new().unwrap();
    let ingestor = ingestor(&dir);

    let mut bytes = build_zip(&[ZipEntry::file("vocal.wav", "v")]);
    bytes.truncate(bytes.len() / 2);

    let err = ingest_bytes(&ingestor, "broken.zip", bytes).unwrap_err();
    assert!(matches!(err, IngestError::ArchiveCorrupt(_)));
    assert_eq!(entries(&dir.path().join("tmp")), 0);
}

#[test]
fn test_rejects_non_archive_upload() {
    let dir = TempDir::new().unwrap();
    let ingestor = ingestor(&dir);

    let err = ingestor
        .intake()
        .accept(Cursor::new(b"ID3".to_vec()), "song.mp3", Some("audio/mpeg"))
        .unwrap_err();

    assert!(matches!(err, IngestError::Validation(_)));
    assert_eq!(entries(&dir.path().join("tmp")), 0);
}

#[test]
fn test_oversized_upload_rejected() {
    let dir = TempDir::new().unwrap();
    let settings = MultitrackSettings {
        max_archive_bytes: 16,
        ..MultitrackSettings::default()
    };
    let ingestor = MultitrackIngestor::new(
        dir.path().join("multitracks"),
        dir.path().join("tmp"),
        &settings,
    );

    let bytes = build_zip(&[ZipEntry::file("vocal.wav", vec![0u8; 4096])]);
    let err = ingest_bytes(&ingestor, "big.zip", bytes).unwrap_err();

    assert!(matches!(err, IngestError::Validation(_)));
    assert_eq!(entries(&dir.path().join("tmp")), 0);
}

#[test]
fn test_stored_paths_unique_across_ingestions() {
    let dir = TempDir::new().unwrap();
    let ingestor = ingestor(&dir);

    let make = || {
        build_zip(&[
            ZipEntry::file("a/take.wav", "1"),
            ZipEntry::file("b/take.wav", "2"),
            ZipEntry::file("take.ogg", "3"),
        ])
    };

    let mut seen = HashSet::new();
    for _ in 0..3 {
        let outcome = ingest_bytes(&ingestor, "takes.zip", make()).unwrap();
        for track in outcome.descriptor.tracks {
            assert!(seen.insert(track.file_path.clone()), "duplicate path {}", track.file_path);
            assert!(dir.path().join("multitracks").join(&track.file_path).is_file());
        }
    }

    assert_eq!(seen.len(), 9);
    assert_eq!(entries(&dir.path().join("multitracks")), 3);
}

#[test]
fn test_sweep_keeps_fresh_storage() {
    let dir = TempDir::new().unwrap();
    let ingestor = ingestor(&dir);

    let bytes = build_zip(&[ZipEntry::file("vocal.wav", "v")]);
    ingest_bytes(&ingestor, "one.zip", bytes).unwrap();

    let report = ingestor.sweep_stale();
    assert!(report.removed.is_empty());
    assert_eq!(report.retained, 1);
    assert_eq!(entries(&dir.path().join("multitracks")), 1);
}
