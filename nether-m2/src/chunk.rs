//! Byte-stream cursor and chunk reference resolution
//!
//! Every offset/count pair in an M2 stream goes through [`ChunkReader::resolve`],
//! which bounds-checks the whole element range before any byte is read.

use std::ops::Range;

use glam::{Vec2, Vec3};

use crate::error::{M2Error, Result};

/// `(count, offset)` pair locating an array inside a byte stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkRef {
    pub count: u32,
    pub offset: u32,
}

impl ChunkRef {
    /// Size of a chunk reference on disk
    pub const SIZE: usize = 8;

    pub const fn new(count: u32, offset: u32) -> Self {
        Self { count, offset }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Byte range covered by `count` elements of `element_size` bytes.
    pub(crate) fn byte_range(&self, element_size: usize, stream_len: usize) -> Result<Range<usize>> {
        if self.count == 0 {
            return Ok(0..0);
        }

        let corrupt = || M2Error::CorruptChunk {
            count: self.count,
            offset: self.offset,
            element_size,
            stream_len,
        };

        let start = self.offset as usize;
        let end = (self.count as usize)
            .checked_mul(element_size)
            .and_then(|len| start.checked_add(len))
            .ok_or_else(corrupt)?;

        if end > stream_len {
            return Err(corrupt());
        }
        Ok(start..end)
    }
}

/// Forward-reading cursor over an in-memory byte stream
#[derive(Debug, Clone)]
pub struct ChunkReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ChunkReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Move the cursor to an absolute offset (may equal the stream length).
    pub fn seek(&mut self, offset: usize) -> Result<()> {
        if offset > self.data.len() {
            return Err(M2Error::UnexpectedEof(offset));
        }
        self.pos = offset;
        Ok(())
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.seek(self.pos.saturating_add(n))
    }

    /// Run `f`, then put the cursor back where it was, even if `f` failed.
    pub fn scoped<R>(&mut self, f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        let saved = self.pos;
        let result = f(self);
        self.pos = saved;
        result
    }

    /// Sub-reader over exactly the bytes named by `chunk`.
    ///
    /// Resolution is relative to the start of this reader's stream, not
    /// its cursor, and leaves the cursor untouched.
    pub fn resolve(&self, chunk: ChunkRef, element_size: usize) -> Result<ChunkReader<'a>> {
        let range = chunk.byte_range(element_size, self.data.len())?;
        Ok(ChunkReader::new(&self.data[range]))
    }

    /// Decode `chunk.count` fixed-width records with `f`.
    ///
    /// Each record gets its own reader so a short decoder cannot shift the
    /// following records.
    pub fn records<T>(
        &self,
        chunk: ChunkRef,
        record_size: usize,
        mut f: impl FnMut(&mut ChunkReader<'a>) -> Result<T>,
    ) -> Result<Vec<T>> {
        let block = self.resolve(chunk, record_size)?;
        block
            .data
            .chunks_exact(record_size)
            .map(|record| f(&mut ChunkReader::new(record)))
            .collect()
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .ok_or(M2Error::UnexpectedEof(self.pos))?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.read_bytes(N)?);
        Ok(buf)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.read_array()?))
    }

    pub fn read_vec2(&mut self) -> Result<Vec2> {
        Ok(Vec2::new(self.read_f32()?, self.read_f32()?))
    }

    pub fn read_vec3(&mut self) -> Result<Vec3> {
        Ok(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    pub fn read_chunk_ref(&mut self) -> Result<ChunkRef> {
        Ok(ChunkRef::new(self.read_u32()?, self.read_u32()?))
    }

    /// Whole chunk as `u16` values (index buffers, lookup tables).
    pub fn read_u16_array(&self, chunk: ChunkRef) -> Result<Vec<u16>> {
        self.records(chunk, 2, |r| r.read_u16())
    }

    pub fn read_u32_array(&self, chunk: ChunkRef) -> Result<Vec<u32>> {
        self.records(chunk, 4, |r| r.read_u32())
    }

    /// NUL-trimmed string stored as a byte chunk.
    pub fn read_string(&self, chunk: ChunkRef) -> Result<String> {
        let bytes = self.resolve(chunk, 1)?.data;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }
}
