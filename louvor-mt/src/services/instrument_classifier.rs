//! Stem name to instrument classification
//!
//! Substring matching against an ordered rule table. The first rule with a
//! matching keyword wins, so the table order decides ambiguous names: a stem
//! called `lead_guitar` is a vocal stem because vocal keywords come first.

use crate::models::Instrument;

/// Ordered (instrument, keywords) rules
const RULES: &[(Instrument, &[&str])] = &[
    (
        Instrument::Vocal,
        &["vocal", "voz", "vox", "voice", "lead", "backing", "coro", "choir", "cantor"],
    ),
    (
        Instrument::Guitarra,
        &["guitar", "guitarra", "gtr", "violao", "violão"],
    ),
    (Instrument::Baixo, &["bass", "baixo"]),
    (
        Instrument::Bateria,
        &[
            "drum", "bateria", "batera", "kick", "snare", "hihat", "hi-hat", "cymbal", "overhead",
            "perc",
        ],
    ),
    (
        Instrument::Teclado,
        &["key", "teclado", "piano", "synth", "organ", "orgao", "órgão", "pad", "rhodes"],
    ),
    (
        Instrument::Violino,
        &["violin", "violino", "viola", "cello", "string"],
    ),
    (Instrument::Saxofone, &["sax"]),
    (Instrument::Flauta, &["flute", "flauta"]),
];

/// Classify a stem by its name (without extension)
///
/// Never fails; unrecognized names are [`Instrument::Outros`].
pub fn classify(stem_name: &str) -> Instrument {
    let name = stem_name.to_lowercase();

    RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| name.contains(k)))
        .map(|(instrument, _)| *instrument)
        .unwrap_or(Instrument::Outros)
}
