//! Synthetic M2 file builder for integration tests
//!
//! Produces byte-exact legacy and modern model files (plus `.skin` and
//! `.anim` companions) from a small description.

#![allow(dead_code)]

use std::collections::BTreeMap;

pub const MAGIC: &[u8; 4] = b"MD20";

/// Header fields the builder fills in
#[derive(Debug, Clone, Copy)]
pub enum Field {
    Name,
    GlobalSequences,
    Animations,
    Bones,
    Vertices,
    Views,
    Colors,
    Textures,
    RenderFlags,
    BoneLookup,
    TextureLookup,
    Lights,
}

impl Field {
    fn offset(self, modern: bool) -> usize {
        let legacy = match self {
            Field::Name => 0x08,
            Field::GlobalSequences => 0x14,
            Field::Animations => 0x1C,
            Field::Bones => 0x34,
            Field::Vertices => 0x44,
            Field::Views => 0x4C,
            Field::Colors => 0x54,
            Field::Textures => 0x5C,
            Field::RenderFlags => 0x84,
            Field::BoneLookup => 0x8C,
            Field::TextureLookup => 0x94,
            Field::Lights => 0x11C,
        };
        if !modern {
            return legacy;
        }
        match legacy {
            0x00..=0x2B => legacy,
            0x34..=0x4F => legacy - 0x08,
            0x54..=0x6B => legacy - 0x0C,
            _ => legacy - 0x14,
        }
    }
}

/// Little-endian append buffer
#[derive(Debug, Default, Clone)]
pub struct Writer {
    pub buf: Vec<u8>,
}

impl Writer {
    pub fn pos(&self) -> u32 {
        self.buf.len() as u32
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn u16(&mut self, v: u16) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn i16(&mut self, v: i16) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn i32(&mut self, v: i32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn f32(&mut self, v: f32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn vec3(&mut self, v: [f32; 3]) -> &mut Self {
        self.f32(v[0]).f32(v[1]).f32(v[2])
    }

    pub fn chunk(&mut self, count: u32, offset: u32) -> &mut Self {
        self.u32(count).u32(offset)
    }

    pub fn zeros(&mut self, n: usize) -> &mut Self {
        self.buf.resize(self.buf.len() + n, 0);
        self
    }

    pub fn patch_chunk(&mut self, at: usize, count: u32, offset: u32) {
        self.buf[at..at + 4].copy_from_slice(&count.to_le_bytes());
        self.buf[at + 4..at + 8].copy_from_slice(&offset.to_le_bytes());
    }

    pub fn patch_u32(&mut self, at: usize, v: u32) {
        self.buf[at..at + 4].copy_from_slice(&v.to_le_bytes());
    }
}

#[derive(Debug, Clone, Default)]
pub struct BoneSpec {
    pub parent: i16,
    pub pivot: [f32; 3],
    /// Keys per sequence index (legacy models use index 0 with absolute ticks)
    pub translation: BTreeMap<usize, Vec<(u32, [f32; 3])>>,
    /// Raw compressed quaternions per sequence index
    pub rotation: BTreeMap<usize, Vec<(u32, [i16; 4])>>,
}

#[derive(Debug, Clone)]
pub struct SequenceSpec {
    pub id: u16,
    pub sub_id: u16,
    /// Legacy: absolute window. Modern: `end - start` is the length.
    pub start: u32,
    pub end: u32,
    pub flags: u32,
    pub probability: u16,
}

impl SequenceSpec {
    pub fn embedded(id: u16, start: u32, end: u32) -> Self {
        Self {
            id,
            sub_id: 0,
            start,
            end,
            flags: 0x20,
            probability: 32767,
        }
    }

    pub fn external(id: u16, sub_id: u16, length: u32) -> Self {
        Self {
            id,
            sub_id,
            start: 0,
            end: length,
            flags: 0,
            probability: 32767,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SubmeshSpec {
    pub vertex_offset: u16,
    pub vertex_count: u16,
    pub triangle_offset: u16,
    pub triangle_count: u16,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct UnitSpec {
    pub submesh: u16,
    pub render_flags: u16,
    pub mode: u16,
    pub render_order: i16,
    pub flags: u16,
    pub texture: u16,
}

#[derive(Debug, Clone, Default)]
pub struct ModelSpec {
    pub version: u32,
    pub name: String,
    pub global_sequences: Vec<u32>,
    pub sequences: Vec<SequenceSpec>,
    pub bones: Vec<BoneSpec>,
    pub vertices: Vec<[f32; 3]>,
    /// Index buffer; triangle entries point into it
    pub indices: Vec<u16>,
    pub triangles: Vec<u16>,
    pub submeshes: Vec<SubmeshSpec>,
    pub units: Vec<UnitSpec>,
    /// `(flags, blend)`
    pub render_flags: Vec<(u16, u16)>,
    pub textures: Vec<String>,
    pub texture_lookup: Vec<u16>,
}

/// Built files: primary bytes plus companions keyed by suffix
#[derive(Debug, Default)]
pub struct BuiltModel {
    pub primary: Vec<u8>,
    pub skin: Option<Vec<u8>>,
    /// `(id, sub_id) -> bytes`
    pub anims: BTreeMap<(u16, u16), Vec<u8>>,
}

impl ModelSpec {
    pub fn is_modern(&self) -> bool {
        self.version == 0x108
    }

    pub fn build(&self) -> BuiltModel {
        let modern = self.is_modern();
        let header_size = if modern { 0x130 } else { 0x144 };
        let mut w = Writer::default();
        w.buf.extend_from_slice(MAGIC);
        w.u32(self.version);
        w.zeros(header_size - 8);

        let mut built = BuiltModel::default();
        let set = |w: &mut Writer, field: Field, count: usize, offset: u32| {
            w.patch_chunk(field.offset(modern), count as u32, offset);
        };

        // Name
        let name_ofs = w.pos();
        w.buf.extend_from_slice(self.name.as_bytes());
        w.u8(0);
        set(&mut w, Field::Name, self.name.len() + 1, name_ofs);

        // Global sequences
        let ofs = w.pos();
        for &g in &self.global_sequences {
            w.u32(g);
        }
        set(&mut w, Field::GlobalSequences, self.global_sequences.len(), ofs);

        // Sequences
        let ofs = w.pos();
        for s in &self.sequences {
            w.u16(s.id).u16(s.sub_id);
            if modern {
                w.u32(s.end - s.start);
            } else {
                w.u32(s.start).u32(s.end);
            }
            w.f32(1.0).u32(s.flags).u16(s.probability).u16(0);
            w.u32(0).u32(0).u32(150);
            w.vec3([0.0; 3]).vec3([0.0; 3]).f32(0.0);
            w.i16(-1).u16(0);
        }
        set(&mut w, Field::Animations, self.sequences.len(), ofs);

        // Bone keyframes, then bone records
        let mut bone_tracks = Vec::new();
        for bone in &self.bones {
            let translation = self.write_track(&mut w, &mut built, &bone.translation, |w, v| {
                w.vec3(*v);
            });
            let rotation = self.write_track(&mut w, &mut built, &bone.rotation, |w, q| {
                for &c in q {
                    w.i16(c);
                }
            });
            bone_tracks.push((translation, rotation));
        }
        let ofs = w.pos();
        for (bone, (translation, rotation)) in self.bones.iter().zip(&bone_tracks) {
            w.i32(-1).u32(0).i16(bone.parent).u16(0);
            if self.version != 0x100 {
                w.u16(0).u16(0);
            }
            self.write_track_header(&mut w, translation);
            self.write_track_header(&mut w, rotation);
            self.write_track_header(&mut w, &TrackRefs::default());
            w.vec3(bone.pivot);
        }
        set(&mut w, Field::Bones, self.bones.len(), ofs);

        // Vertices
        let ofs = w.pos();
        for &p in &self.vertices {
            w.vec3(p);
            w.u8(255).u8(0).u8(0).u8(0);
            w.u8(0).u8(0).u8(0).u8(0);
            w.vec3([0.0, 0.0, 1.0]);
            w.f32(0.0).f32(0.0);
            w.u32(0).u32(0);
        }
        set(&mut w, Field::Vertices, self.vertices.len(), ofs);

        // View
        if modern {
            let mut skin = Writer::default();
            skin.buf.extend_from_slice(b"SKIN");
            self.write_view(&mut skin);
            built.skin = Some(skin.buf);
            w.patch_u32(Field::Views.offset(true), 1);
        } else {
            let view_ofs = w.pos();
            self.write_view(&mut w);
            set(&mut w, Field::Views, 1, view_ofs);
        }

        // Render flags
        let ofs = w.pos();
        for &(flags, blend) in &self.render_flags {
            w.u16(flags).u16(blend);
        }
        set(&mut w, Field::RenderFlags, self.render_flags.len(), ofs);

        // Textures: names first, then definitions
        let mut names = Vec::new();
        for name in &self.textures {
            let at = w.pos();
            w.buf.extend_from_slice(name.as_bytes());
            w.u8(0);
            names.push((name.len() as u32 + 1, at));
        }
        let ofs = w.pos();
        for &(len, at) in &names {
            w.u32(0).u32(0).chunk(len, at);
        }
        set(&mut w, Field::Textures, names.len(), ofs);

        let ofs = w.pos();
        for &t in &self.texture_lookup {
            w.u16(t);
        }
        set(&mut w, Field::TextureLookup, self.texture_lookup.len(), ofs);

        built.primary = w.buf;
        built
    }

    /// View header at the cursor, its chunks right after it
    fn write_view(&self, w: &mut Writer) {
        let header_at = w.pos() as usize;
        w.zeros(44);

        let indices = w.pos();
        for &i in &self.indices {
            w.u16(i);
        }
        let triangles = w.pos();
        for &t in &self.triangles {
            w.u16(t);
        }
        let submeshes = w.pos();
        for s in &self.submeshes {
            w.u32(0)
                .u16(s.vertex_offset)
                .u16(s.vertex_count)
                .u16(s.triangle_offset)
                .u16(s.triangle_count)
                .u16(0)
                .u16(0)
                .u16(1)
                .u16(0);
            w.vec3([0.0; 3]);
            if self.version != 0x100 {
                w.vec3([0.0; 3]).f32(s.radius);
            }
        }
        let units = w.pos();
        for u in &self.units {
            w.u16(u.flags)
                .i16(u.render_order)
                .u16(u.submesh)
                .u16(u.submesh)
                .i16(-1)
                .u16(u.render_flags)
                .u16(0)
                .u16(u.mode)
                .u16(u.texture)
                .u16(0)
                .u16(0)
                .u16(0);
        }

        w.patch_chunk(header_at, self.indices.len() as u32, indices);
        w.patch_chunk(header_at + 8, self.triangles.len() as u32, triangles);
        w.patch_chunk(header_at + 24, self.submeshes.len() as u32, submeshes);
        w.patch_chunk(header_at + 32, self.units.len() as u32, units);
        w.patch_u32(header_at + 40, 64);
    }

    /// Write keyframes for one track and return the refs its header needs.
    fn write_track<T>(
        &self,
        w: &mut Writer,
        built: &mut BuiltModel,
        keys: &BTreeMap<usize, Vec<(u32, T)>>,
        mut put: impl FnMut(&mut Writer, &T),
    ) -> TrackRefs {
        if !self.is_modern() {
            let Some(list) = keys.get(&0) else {
                return TrackRefs::default();
            };
            let ts = w.pos();
            for (t, _) in list {
                w.u32(*t);
            }
            let vs = w.pos();
            for (_, v) in list {
                put(w, v);
            }
            return TrackRefs {
                timestamps: (list.len() as u32, ts),
                values: (list.len() as u32, vs),
            };
        }

        // One table entry per sequence, data in the primary or the .anim file
        let mut ts_entries = Vec::new();
        let mut val_entries = Vec::new();
        for (index, sequence) in self.sequences.iter().enumerate() {
            let list = keys.get(&index).map(Vec::as_slice).unwrap_or(&[]);
            let external = sequence.flags & 0x20 == 0;
            let target: &mut Vec<u8> = if external {
                built.anims.entry((sequence.id, sequence.sub_id)).or_default()
            } else {
                &mut w.buf
            };
            let mut local = Writer {
                buf: std::mem::take(target),
            };
            let ts = local.pos();
            for (t, _) in list {
                local.u32(*t);
            }
            let vs = local.pos();
            for (_, v) in list {
                put(&mut local, v);
            }
            *target = local.buf;
            ts_entries.push((list.len() as u32, ts));
            val_entries.push((list.len() as u32, vs));
        }

        let ts_table = w.pos();
        for &(c, o) in &ts_entries {
            w.chunk(c, o);
        }
        let val_table = w.pos();
        for &(c, o) in &val_entries {
            w.chunk(c, o);
        }
        TrackRefs {
            timestamps: (ts_entries.len() as u32, ts_table),
            values: (val_entries.len() as u32, val_table),
        }
    }

    fn write_track_header(&self, w: &mut Writer, refs: &TrackRefs) {
        w.i16(1).i16(-1);
        if !self.is_modern() {
            w.chunk(0, 0);
        }
        w.chunk(refs.timestamps.0, refs.timestamps.1);
        w.chunk(refs.values.0, refs.values.1);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TrackRefs {
    pub timestamps: (u32, u32),
    pub values: (u32, u32),
}

/// Two-bone, one-submesh legacy model with a single translation key
pub fn two_bone_legacy() -> ModelSpec {
    let mut root = BoneSpec {
        parent: -1,
        ..BoneSpec::default()
    };
    root.translation.insert(0, vec![(0, [1.0, 2.0, 3.0])]);
    let child = BoneSpec {
        parent: 0,
        pivot: [0.0, 0.0, 1.0],
        ..BoneSpec::default()
    };

    ModelSpec {
        version: 0x107,
        name: "TwoBone".to_string(),
        sequences: vec![SequenceSpec::embedded(0, 0, 1000)],
        bones: vec![root, child],
        vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        indices: vec![0, 1, 2, 3],
        triangles: vec![0, 1, 2, 0, 2, 3],
        submeshes: vec![SubmeshSpec {
            vertex_offset: 0,
            vertex_count: 4,
            triangle_offset: 0,
            triangle_count: 6,
            radius: 1.0,
        }],
        units: vec![UnitSpec {
            submesh: 0,
            render_flags: 0,
            mode: 0,
            render_order: 0,
            flags: 0x0010,
            texture: 0,
        }],
        render_flags: vec![(0, 0)],
        textures: vec!["Creature\\TwoBone\\Skin.blp".to_string()],
        texture_lookup: vec![0],
        ..ModelSpec::default()
    }
}
