//! Animated track decoding
//!
//! A track header names its keyframes indirectly. Legacy tracks point at a
//! single `(count, offset)` pair per array. Modern tracks point at a table
//! holding one pair per animation sequence, and each pair may live in the
//! primary stream or in that sequence's `.anim` companion. Both cases go
//! through the same two steps: [`resolve_table`] yields the pair list, then
//! each pair is resolved into elements against the right stream.

use glam::{Quat, Vec3};

use crate::animation::{SequenceData, SequenceTable};
use crate::chunk::{ChunkReader, ChunkRef};
use crate::error::Result;
use crate::header::FormatLayout;

/// Keyframe interpolation mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Interpolation {
    #[default]
    None,
    Linear,
    Hermite,
    Bezier,
    Unknown(i16),
}

impl Interpolation {
    pub fn from_raw(raw: i16) -> Self {
        match raw {
            0 => Self::None,
            1 => Self::Linear,
            2 => Self::Hermite,
            3 => Self::Bezier,
            other => Self::Unknown(other),
        }
    }
}

/// On-disk scalar encoding of track values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueEncoding {
    /// IEEE 754 single precision
    Float32,
    /// Signed 16-bit, folded around zero (compressed quaternions)
    Int16Normalized,
    /// Signed 32-bit integer widened to float
    Int32AsFloat,
    /// Signed 16-bit fraction of 32767 (alpha)
    Fixed16,
}

impl ValueEncoding {
    pub const fn scalar_size(self) -> usize {
        match self {
            Self::Float32 | Self::Int32AsFloat => 4,
            Self::Int16Normalized | Self::Fixed16 => 2,
        }
    }

    fn read(self, r: &mut ChunkReader<'_>) -> Result<f32> {
        Ok(match self {
            Self::Float32 => r.read_f32()?,
            Self::Int16Normalized => decode_int16_normalized(r.read_i16()?),
            Self::Int32AsFloat => r.read_i32()? as f32,
            Self::Fixed16 => decode_fixed16(r.read_i16()?),
        })
    }
}

/// `v > 0 ? v - 32767 : v + 32767`, scaled by 1/32767.
pub fn decode_int16_normalized(raw: i16) -> f32 {
    let v = i32::from(raw);
    let folded = if v > 0 { v - 32767 } else { v + 32767 };
    folded as f32 / 32767.0
}

pub fn decode_fixed16(raw: i16) -> f32 {
    f32::from(raw) / 32767.0
}

/// Element shape of a track
pub trait TrackValue: Copy {
    /// Scalars per element
    const ARITY: usize;

    fn from_components(c: &[f32]) -> Self;
}

impl TrackValue for f32 {
    const ARITY: usize = 1;

    fn from_components(c: &[f32]) -> Self {
        c[0]
    }
}

impl TrackValue for Vec3 {
    const ARITY: usize = 3;

    fn from_components(c: &[f32]) -> Self {
        Vec3::new(c[0], c[1], c[2])
    }
}

impl TrackValue for Quat {
    const ARITY: usize = 4;

    fn from_components(c: &[f32]) -> Self {
        Quat::from_xyzw(c[0], c[1], c[2], c[3])
    }
}

/// Keyframes on the unified timeline
#[derive(Debug, Clone, PartialEq)]
pub struct AnimatedTrack<T> {
    pub interpolation: Interpolation,
    /// Index into the global sequence table, if the track loops independently.
    ///
    /// On modern models these keys are resolved through the per-sequence
    /// tables like any other track, so a single-entry table reads from
    /// sequence 0's `.anim` file when that sequence is external and yields
    /// no keys when the file is unavailable.
    pub global_sequence: Option<u16>,
    pub timestamps: Vec<u32>,
    pub values: Vec<T>,
}

impl<T> Default for AnimatedTrack<T> {
    fn default() -> Self {
        Self {
            interpolation: Interpolation::None,
            global_sequence: None,
            timestamps: Vec::new(),
            values: Vec::new(),
        }
    }
}

impl<T> AnimatedTrack<T> {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Transform every value, keeping timestamps.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> AnimatedTrack<U> {
        AnimatedTrack {
            interpolation: self.interpolation,
            global_sequence: self.global_sequence,
            timestamps: self.timestamps,
            values: self.values.into_iter().map(f).collect(),
        }
    }
}

/// Raw track header as stored inside bone, color and light records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TrackHeader {
    interpolation: i16,
    global_sequence: i16,
    timestamps: ChunkRef,
    values: ChunkRef,
}

impl TrackHeader {
    fn read(r: &mut ChunkReader<'_>, layout: FormatLayout) -> Result<Self> {
        let interpolation = r.read_i16()?;
        let global_sequence = r.read_i16()?;
        if layout == FormatLayout::Legacy {
            // Interpolation ranges are superseded by sequence windows
            r.read_chunk_ref()?;
        }
        Ok(Self {
            interpolation,
            global_sequence,
            timestamps: r.read_chunk_ref()?,
            values: r.read_chunk_ref()?,
        })
    }
}

/// Shared state for every track read during one load
pub(crate) struct TrackContext<'a> {
    pub layout: FormatLayout,
    pub primary: &'a [u8],
    pub sequences: &'a SequenceTable,
}

/// Resolve a track reference into its `(count, offset)` pairs.
///
/// Legacy references are their own single-entry table.
pub(crate) fn resolve_table(
    primary: &ChunkReader<'_>,
    layout: FormatLayout,
    chunk: ChunkRef,
) -> Result<Vec<ChunkRef>> {
    match layout {
        FormatLayout::Legacy => Ok(vec![chunk]),
        FormatLayout::Modern => primary.records(chunk, ChunkRef::SIZE, |r| r.read_chunk_ref()),
    }
}

/// One pair of timestamp/value arrays and the stream they live in
struct Segment<'a> {
    stream: ChunkReader<'a>,
    base: u32,
    timestamps: ChunkRef,
    values: ChunkRef,
}

/// Decode the track whose header starts at the cursor.
///
/// The cursor ends exactly one header width further on. All keyframe reads
/// go through separate resolved readers.
pub(crate) fn read_track<T: TrackValue>(
    r: &mut ChunkReader<'_>,
    ctx: &TrackContext<'_>,
    encoding: ValueEncoding,
) -> Result<AnimatedTrack<T>> {
    let header = TrackHeader::read(r, ctx.layout)?;

    let mut track = AnimatedTrack {
        interpolation: Interpolation::from_raw(header.interpolation),
        global_sequence: u16::try_from(header.global_sequence).ok(),
        timestamps: Vec::new(),
        values: Vec::new(),
    };

    for segment in segments(ctx, &header)? {
        let count = segment.timestamps.count.min(segment.values.count);
        if segment.timestamps.count != segment.values.count {
            tracing::warn!(
                "Track has {} timestamps but {} values, keeping {}",
                segment.timestamps.count,
                segment.values.count,
                count
            );
        }

        let times = segment
            .stream
            .read_u32_array(ChunkRef::new(count, segment.timestamps.offset))?;
        track
            .timestamps
            .extend(times.into_iter().map(|t| t.saturating_add(segment.base)));

        let element_size = T::ARITY * encoding.scalar_size();
        let values = segment.stream.records(
            ChunkRef::new(count, segment.values.offset),
            element_size,
            |r| {
                let mut components = [0f32; 4];
                for c in components.iter_mut().take(T::ARITY) {
                    *c = encoding.read(r)?;
                }
                Ok(T::from_components(&components[..T::ARITY]))
            },
        )?;
        track.values.extend(values);
    }

    Ok(track)
}

fn segments<'a>(ctx: &TrackContext<'a>, header: &TrackHeader) -> Result<Vec<Segment<'a>>> {
    let primary = ChunkReader::new(ctx.primary);
    let timestamp_table = resolve_table(&primary, ctx.layout, header.timestamps)?;
    let value_table = resolve_table(&primary, ctx.layout, header.values)?;

    if ctx.layout == FormatLayout::Legacy {
        return Ok(vec![Segment {
            stream: ChunkReader::new(ctx.primary),
            base: 0,
            timestamps: timestamp_table[0],
            values: value_table[0],
        }]);
    }

    if timestamp_table.len() != value_table.len() {
        tracing::warn!(
            "Track tables disagree: {} timestamp entries, {} value entries",
            timestamp_table.len(),
            value_table.len()
        );
    }

    let mut out = Vec::with_capacity(timestamp_table.len());
    for (index, (timestamps, values)) in timestamp_table.into_iter().zip(value_table).enumerate() {
        let Some((sequence, data)) = ctx.sequences.get(index) else {
            break;
        };
        let stream = match data {
            SequenceData::Unavailable => continue,
            SequenceData::External(bytes) => ChunkReader::new(bytes),
            SequenceData::Embedded => ChunkReader::new(ctx.primary),
        };
        out.push(Segment {
            stream,
            base: sequence.start,
            timestamps,
            values,
        });
    }
    Ok(out)
}
