//! Data models for louvor-mt

pub mod multitrack;
pub mod song;

pub use multitrack::{Instrument, MultitrackDescriptor, MultitrackTrack};
pub use song::{
    InstrumentDescriptor, InstrumentList, LinkMap, NewSong, SongRecord, SongUpdate, TagSet,
};
