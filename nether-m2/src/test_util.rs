//! Little-endian byte builders shared by unit tests

use glam::Vec3;

use crate::animation::{AnimationSequence, SequenceStorage};
use crate::header::Bounds;

#[derive(Default)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> u32 {
        self.0.len() as u32
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.0.push(v);
        self
    }

    pub fn u16(&mut self, v: u16) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn i16(&mut self, v: i16) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn i32(&mut self, v: i32) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn f32(&mut self, v: f32) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn vec3(&mut self, v: [f32; 3]) -> &mut Self {
        v.iter().for_each(|&c| {
            self.f32(c);
        });
        self
    }

    pub fn chunk(&mut self, count: u32, offset: u32) -> &mut Self {
        self.u32(count).u32(offset)
    }

    pub fn zeros(&mut self, n: usize) -> &mut Self {
        self.0.resize(self.0.len() + n, 0);
        self
    }
}

/// Sequence with the given window, embedded storage
pub fn sequence(start: u32, end: u32) -> AnimationSequence {
    AnimationSequence {
        id: 0,
        sub_id: 0,
        flags: 0x20,
        probability: 1.0,
        start,
        end,
        move_speed: 0.0,
        blend_time: 150,
        bounds: Bounds {
            min: Vec3::ZERO,
            max: Vec3::ZERO,
            radius: 0.0,
        },
        next_variation: -1,
        alias_next: 0,
        storage: SequenceStorage::Embedded,
    }
}
