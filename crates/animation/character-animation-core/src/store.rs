//! Track store: owns the sequence and memoizes a sorted copy of each track.

use std::cell::OnceCell;

use hashbrown::HashMap;

use crate::data::{Sequence, Track, TrackName};
use crate::error::Result;

/// Owns the current [`Sequence`] and a lazily filled sorted-track cache.
///
/// The cache is keyed by track name. It is rebuilt wholesale when the
/// sequence is replaced; there is no incremental invalidation.
#[derive(Debug)]
pub struct TrackStore {
    sequence: Sequence,
    sorted: HashMap<TrackName, OnceCell<Track>>,
}

fn empty_cache() -> HashMap<TrackName, OnceCell<Track>> {
    TrackName::ALL
        .iter()
        .map(|name| (*name, OnceCell::new()))
        .collect()
}

impl TrackStore {
    /// Validate and take ownership of a sequence.
    pub fn new(sequence: Sequence) -> Result<Self> {
        sequence.validate()?;
        Ok(Self {
            sequence,
            sorted: empty_cache(),
        })
    }

    /// Swap in a new sequence. On validation failure the current sequence is kept.
    pub fn replace(&mut self, sequence: Sequence) -> Result<()> {
        sequence.validate()?;
        self.sequence = sequence;
        self.sorted = empty_cache();
        Ok(())
    }

    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    /// Sorted events of `name`. Absent tracks read as empty tracks of the right kind.
    pub fn track(&self, name: TrackName) -> &Track {
        let cell = &self.sorted[&name];
        cell.get_or_init(|| {
            self.sequence
                .track(name)
                .map(Track::sorted)
                .unwrap_or_else(|| Track::empty(name.kind()))
        })
    }

    /// Number of tracks whose sorted view has been computed since the last replace.
    pub fn cached_tracks(&self) -> usize {
        self.sorted.values().filter(|c| c.get().is_some()).count()
    }

    #[inline]
    pub fn duration_sec(&self) -> f64 {
        self.sequence.duration_sec()
    }
}
