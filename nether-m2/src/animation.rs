//! Animation sequence table
//!
//! Legacy sequences carry absolute `(start, end)` windows on one shared
//! timeline. Modern sequences only carry a length, so the loader lays them
//! end to end with a fixed gap to build the same kind of timeline. A modern
//! sequence may also keep its keyframes in a companion `.anim` file, which
//! is opened here once and handed to the track decoder.

use crate::chunk::ChunkReader;
use crate::companion::{CompanionProvider, anim_file_name};
use crate::coords::remap_vec3;
use crate::error::Result;
use crate::header::{Bounds, FormatLayout, ModelHeader};
use crate::SEQUENCE_GAP;

/// Legacy sequence record width
pub const LEGACY_SEQUENCE_SIZE: usize = 68;

/// Modern sequence record width
pub const MODERN_SEQUENCE_SIZE: usize = 64;

/// Sequence flag bits
pub struct SequenceFlags;

impl SequenceFlags {
    /// Keyframes are embedded in the primary stream
    pub const EMBEDDED_DATA: u32 = 0x20;
    /// Keyframes are expected in a companion `.anim` file
    pub const EXTERNAL_EXPECTED: u32 = 0x40;
}

/// Where a sequence's keyframes were found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceStorage {
    Embedded,
    External,
    /// Companion file missing; the sequence has no keyframes
    Unavailable,
}

/// One animation sequence on the unified timeline
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationSequence {
    pub id: u16,
    pub sub_id: u16,
    pub flags: u32,
    /// Selection weight in `[0, 1]`
    pub probability: f32,
    pub start: u32,
    pub end: u32,
    pub move_speed: f32,
    pub blend_time: u32,
    pub bounds: Bounds,
    /// Next variation of the same id, -1 when none
    pub next_variation: i16,
    pub alias_next: u16,
    pub storage: SequenceStorage,
}

impl AnimationSequence {
    pub fn duration(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Whether `tick` falls inside `[start, end)`
    pub fn contains(&self, tick: u32) -> bool {
        (self.start..self.end).contains(&tick)
    }
}

/// Keyframe source for one sequence, consumed by the track decoder
#[derive(Debug)]
pub enum SequenceData {
    Embedded,
    External(Vec<u8>),
    Unavailable,
}

/// Decoded sequences plus the companion streams opened for them.
///
/// Streams are owned buffers and are released together when the table is
/// dropped or converted with [`SequenceTable::into_sequences`].
#[derive(Debug, Default)]
pub struct SequenceTable {
    sequences: Vec<AnimationSequence>,
    data: Vec<SequenceData>,
}

impl SequenceTable {
    pub(crate) fn read(
        primary: &ChunkReader<'_>,
        header: &ModelHeader,
        primary_name: &str,
        companions: &dyn CompanionProvider,
    ) -> Result<Self> {
        let sequences = match header.layout() {
            FormatLayout::Legacy => {
                primary.records(header.animations, LEGACY_SEQUENCE_SIZE, read_legacy)?
            }
            FormatLayout::Modern => {
                let lengths_and_records =
                    primary.records(header.animations, MODERN_SEQUENCE_SIZE, read_modern)?;
                assign_windows(lengths_and_records)
            }
        };

        let mut table = Self {
            data: Vec::with_capacity(sequences.len()),
            sequences,
        };

        for sequence in &mut table.sequences {
            let data = if header.layout() == FormatLayout::Modern
                && sequence.flags & SequenceFlags::EMBEDDED_DATA == 0
            {
                open_external(sequence, primary_name, companions)
            } else {
                SequenceData::Embedded
            };
            table.data.push(data);
        }

        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<(&AnimationSequence, &SequenceData)> {
        Some((self.sequences.get(index)?, self.data.get(index)?))
    }

    pub fn sequences(&self) -> &[AnimationSequence] {
        &self.sequences
    }

    /// Drop every companion stream and keep the metadata.
    pub fn into_sequences(self) -> Vec<AnimationSequence> {
        self.sequences
    }

    #[cfg(test)]
    pub(crate) fn from_parts(sequences: Vec<AnimationSequence>, data: Vec<SequenceData>) -> Self {
        Self { sequences, data }
    }
}

fn open_external(
    sequence: &mut AnimationSequence,
    primary_name: &str,
    companions: &dyn CompanionProvider,
) -> SequenceData {
    let name = anim_file_name(primary_name, sequence.id, sequence.sub_id);
    match companions.open(&name) {
        Ok(bytes) => {
            tracing::debug!("Opened {} ({} bytes)", name, bytes.len());
            sequence.storage = SequenceStorage::External;
            SequenceData::External(bytes)
        }
        Err(e) => {
            if sequence.flags & SequenceFlags::EXTERNAL_EXPECTED != 0 {
                tracing::error!(
                    "Animation {}-{} expects keyframes in {} but it could not be opened: {}",
                    sequence.id,
                    sequence.sub_id,
                    name,
                    e
                );
            } else {
                tracing::warn!("Could not open animation file {}: {}", name, e);
            }
            sequence.storage = SequenceStorage::Unavailable;
            SequenceData::Unavailable
        }
    }
}

/// Lay modern sequences end to end, `SEQUENCE_GAP` ticks apart.
fn assign_windows(records: Vec<(u32, AnimationSequence)>) -> Vec<AnimationSequence> {
    let mut cursor = 0u32;
    records
        .into_iter()
        .map(|(length, mut sequence)| {
            sequence.start = cursor;
            sequence.end = cursor.saturating_add(length);
            cursor = sequence.end.saturating_add(SEQUENCE_GAP);
            sequence
        })
        .collect()
}

fn read_probability(r: &mut ChunkReader<'_>) -> Result<f32> {
    let raw = r.read_u16()?;
    r.read_u16()?; // padding
    Ok(f32::from(raw) / 32767.0)
}

fn read_tail(r: &mut ChunkReader<'_>) -> Result<(Bounds, i16, u16)> {
    let min = remap_vec3(r.read_vec3()?);
    let max = remap_vec3(r.read_vec3()?);
    let radius = r.read_f32()?;
    Ok((Bounds { min, max, radius }, r.read_i16()?, r.read_u16()?))
}

fn read_legacy(r: &mut ChunkReader<'_>) -> Result<AnimationSequence> {
    let id = r.read_u16()?;
    let sub_id = r.read_u16()?;
    let start = r.read_u32()?;
    let end = r.read_u32()?;
    let move_speed = r.read_f32()?;
    let flags = r.read_u32()?;
    let probability = read_probability(r)?;
    r.skip(8)?; // replay range
    let blend_time = r.read_u32()?;
    let (bounds, next_variation, alias_next) = read_tail(r)?;

    Ok(AnimationSequence {
        id,
        sub_id,
        flags,
        probability,
        start,
        end,
        move_speed,
        blend_time,
        bounds,
        next_variation,
        alias_next,
        storage: SequenceStorage::Embedded,
    })
}

fn read_modern(r: &mut ChunkReader<'_>) -> Result<(u32, AnimationSequence)> {
    let id = r.read_u16()?;
    let sub_id = r.read_u16()?;
    let length = r.read_u32()?;
    let move_speed = r.read_f32()?;
    let flags = r.read_u32()?;
    let probability = read_probability(r)?;
    r.skip(8)?; // replay range
    let blend_time = r.read_u32()?;
    let (bounds, next_variation, alias_next) = read_tail(r)?;

    let sequence = AnimationSequence {
        id,
        sub_id,
        flags,
        probability,
        start: 0,
        end: 0,
        move_speed,
        blend_time,
        bounds,
        next_variation,
        alias_next,
        storage: SequenceStorage::Embedded,
    };
    Ok((length, sequence))
}
