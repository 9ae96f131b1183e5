use bytes::{BufMut, BytesMut};
use blockwright_nbt::{nbt_compound, NbtValue};
use blockwright_protocol_core::{write_varint, ChunkLightData, InternalPacket};

/// Total number of sections in a chunk (from y=-64 to y=320, 384 blocks / 16 = 24 sections).
pub const SECTION_COUNT: usize = 24;
/// Minimum Y coordinate.
pub const MIN_Y: i32 = -64;
/// Light sections bracket the block sections with one boundary section below
/// the floor and one above the world ceiling.
const LIGHT_SECTION_COUNT: usize = SECTION_COUNT + 2;

/// A 16x16x16 chunk section.
#[derive(Clone)]
pub struct ChunkSection {
    /// Block count (non-air) for the section.
    pub block_count: i16,
    /// Block state palette. Index 0 is always the default (air = 0).
    pub palette: Vec<i32>,
    /// If palette has 1 entry: single-valued (no data array needed).
    /// If palette has >1 entry: indices into palette, packed into longs.
    pub block_data: Option<Vec<i64>>,
    /// Bits per entry for the block data.
    pub bits_per_entry: u8,
}

impl ChunkSection {
    /// Create an empty (all air) section.
    pub fn empty() -> Self {
        Self {
            block_count: 0,
            palette: vec![0], // air
            block_data: None,
            bits_per_entry: 0,
        }
    }

    /// Create a single-value section (all blocks are the same state ID).
    pub fn single_value(state_id: i32) -> Self {
        Self {
            block_count: if state_id == 0 { 0 } else { 4096 },
            palette: vec![state_id],
            block_data: None,
            bits_per_entry: 0,
        }
    }

    /// Create a section with a mixed palette. blocks is [y][z][x] = 16*16*16 = 4096 entries.
    pub fn from_blocks(blocks: &[i32; 4096]) -> Self {
        let mut palette = Vec::new();
        let mut palette_map = std::collections::HashMap::new();
        let mut indices = [0u16; 4096];
        let mut block_count: i16 = 0;

        for (i, &state_id) in blocks.iter().enumerate() {
            if state_id != 0 {
                block_count += 1;
            }
            let idx = *palette_map.entry(state_id).or_insert_with(|| {
                let idx = palette.len();
                palette.push(state_id);
                idx
            });
            indices[i] = idx as u16;
        }

        if palette.len() == 1 {
            return Self::single_value(palette[0]);
        }

        let bits_per_entry = std::cmp::max(4, (palette.len() as f64).log2().ceil() as u8);
        let entries_per_long = 64 / bits_per_entry as usize;
        let longs_needed = (4096 + entries_per_long - 1) / entries_per_long;
        let mask = (1u64 << bits_per_entry) - 1;

        let mut data = vec![0i64; longs_needed];
        for (i, &idx) in indices.iter().enumerate() {
            let long_index = i / entries_per_long;
            let bit_index = (i % entries_per_long) * bits_per_entry as usize;
            data[long_index] |= ((idx as u64 & mask) << bit_index) as i64;
        }

        Self {
            block_count,
            palette,
            block_data: Some(data),
            bits_per_entry,
        }
    }

    /// Expand into a flat 4096-entry block-state array, in whatever
    /// representation this section currently uses.
    fn to_blocks(&self) -> [i32; 4096] {
        let mut out = [0i32; 4096];
        if self.palette.len() == 1 {
            out.fill(self.palette[0]);
            return out;
        }
        if let Some(ref data) = self.block_data {
            let entries_per_long = 64 / self.bits_per_entry as usize;
            let mask = (1u64 << self.bits_per_entry) - 1;
            for (i, slot) in out.iter_mut().enumerate() {
                let long_index = i / entries_per_long;
                let bit_index = (i % entries_per_long) * self.bits_per_entry as usize;
                let palette_idx = ((data[long_index] as u64 >> bit_index) & mask) as usize;
                *slot = self.palette.get(palette_idx).copied().unwrap_or(0);
            }
        }
        out
    }

    /// Read a single block state at local coordinates (each in 0..16).
    pub fn get_block(&self, x: usize, y: usize, z: usize) -> i32 {
        if self.palette.len() == 1 {
            return self.palette[0];
        }
        let Some(ref data) = self.block_data else {
            return 0;
        };
        let index = y * 256 + z * 16 + x;
        let entries_per_long = 64 / self.bits_per_entry as usize;
        let long_index = index / entries_per_long;
        let bit_index = (index % entries_per_long) * self.bits_per_entry as usize;
        let mask = (1u64 << self.bits_per_entry) - 1;
        let palette_idx = ((data[long_index] as u64 >> bit_index) & mask) as usize;
        self.palette.get(palette_idx).copied().unwrap_or(0)
    }

    /// Write a single block state at local coordinates, rebuilding the
    /// palette/bit-packing if the new state isn't already in it.
    pub fn set_block(&mut self, x: usize, y: usize, z: usize, state_id: i32) {
        let index = y * 256 + z * 16 + x;
        let mut blocks = self.to_blocks();
        if blocks[index] == state_id {
            return;
        }
        blocks[index] = state_id;
        *self = Self::from_blocks(&blocks);
    }

    /// Serialize this section for the chunk data packet.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.put_i16(self.block_count);

        // Block states — paletted container
        buf.put_u8(self.bits_per_entry);

        if self.bits_per_entry == 0 {
            // Single-valued: write the single palette entry, then 0 longs
            write_varint(buf, self.palette[0]);
            write_varint(buf, 0); // data array length = 0
        } else {
            // Indirect palette
            write_varint(buf, self.palette.len() as i32);
            for &entry in &self.palette {
                write_varint(buf, entry);
            }
            if let Some(ref data) = self.block_data {
                write_varint(buf, data.len() as i32);
                for &long in data {
                    buf.put_i64(long);
                }
            }
        }

        // Biomes — single-valued (plains = 0)
        buf.put_u8(0); // bits per entry = 0 (single value)
        write_varint(buf, 0); // palette entry: biome ID 0 (plains)
        write_varint(buf, 0); // data array length = 0
    }
}

/// A full chunk column (24 sections).
pub struct Chunk {
    pub sections: Vec<ChunkSection>,
}

impl Chunk {
    pub fn new() -> Self {
        Self {
            sections: (0..SECTION_COUNT).map(|_| ChunkSection::empty()).collect(),
        }
    }

    /// Serialize all sections into the chunk data byte array.
    pub fn serialize_sections(&self) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for section in &self.sections {
            section.write_to(&mut buf);
        }
        buf.to_vec()
    }

    /// World Y of the topmost non-air block in column (x,z), or `MIN_Y - 1`
    /// if the column is entirely air.
    fn surface_world_y(&self, x: usize, z: usize) -> i32 {
        for section_idx in (0..SECTION_COUNT).rev() {
            let section = &self.sections[section_idx];
            for local_y in (0..16).rev() {
                if section.get_block(x, local_y, z) != 0 {
                    return MIN_Y + (section_idx as i32) * 16 + local_y as i32;
                }
            }
        }
        MIN_Y - 1
    }

    /// Build a heightmap for MOTION_BLOCKING.
    /// Returns packed long array (256 entries, 9 bits each for 384 height range).
    pub fn compute_heightmap(&self) -> Vec<i64> {
        let mut heights = [0u16; 256]; // 16x16

        for x in 0..16 {
            for z in 0..16 {
                let world_y = self.surface_world_y(x, z);
                if world_y >= MIN_Y {
                    // Heightmap value = world_y - MIN_Y + 1 (1-indexed from bottom)
                    heights[z * 16 + x] = (world_y - MIN_Y + 1) as u16;
                }
            }
        }

        // Pack into longs: 9 bits per entry (for 384 range), 7 entries per long (7*9=63 bits)
        let bits_per_entry = 9;
        let entries_per_long = 64 / bits_per_entry;
        let longs_needed = (256 + entries_per_long - 1) / entries_per_long; // 37 longs
        let mask = (1u64 << bits_per_entry) - 1;

        let mut packed = vec![0i64; longs_needed];
        for (i, &h) in heights.iter().enumerate() {
            let long_index = i / entries_per_long;
            let bit_index = (i % entries_per_long) * bits_per_entry;
            packed[long_index] |= ((h as u64 & mask) << bit_index) as i64;
        }

        packed
    }

    /// Compute sky light for every light section (one boundary section below
    /// the floor, the 24 real sections, one boundary section above the
    /// ceiling). `sky_light(y) = max(0, 15 - max(0, h-y))` where h is the
    /// column's surface height (topmost non-air block's world y + 1). Block
    /// light is always zero: this world has no light-emitting blocks.
    fn build_light_data(&self) -> ChunkLightData {
        let mut surface_height = [0i32; 256];
        for x in 0..16 {
            for z in 0..16 {
                surface_height[z * 16 + x] = self.surface_world_y(x, z) + 1;
            }
        }

        let mask_longs = (LIGHT_SECTION_COUNT + 63) / 64;
        let mut sky_light_mask = vec![0i64; mask_longs];
        let mut block_light_mask = vec![0i64; mask_longs];
        let mut sky_light_arrays = Vec::with_capacity(LIGHT_SECTION_COUNT);
        let mut block_light_arrays = Vec::with_capacity(LIGHT_SECTION_COUNT);

        for light_section in 0..LIGHT_SECTION_COUNT {
            sky_light_mask[light_section / 64] |= 1i64 << (light_section % 64);
            block_light_mask[light_section / 64] |= 1i64 << (light_section % 64);
            block_light_arrays.push(vec![0u8; 2048]);

            let base_y = MIN_Y + (light_section as i32 - 1) * 16;
            let mut packed = vec![0u8; 2048];
            for local_y in 0..16usize {
                let y = base_y + local_y as i32;
                for z in 0..16usize {
                    for x in 0..16usize {
                        let h = surface_height[z * 16 + x];
                        let light = (15 - (h - y).max(0)).max(0) as u8;
                        let index = local_y * 256 + z * 16 + x;
                        if index % 2 == 0 {
                            packed[index / 2] |= light;
                        } else {
                            packed[index / 2] |= light << 4;
                        }
                    }
                }
            }
            sky_light_arrays.push(packed);
        }

        ChunkLightData {
            sky_light_mask,
            block_light_mask,
            empty_sky_light_mask: Vec::new(),
            empty_block_light_mask: Vec::new(),
            sky_light_arrays,
            block_light_arrays,
        }
    }

    /// Read a block state by world Y and chunk-local x/z (each 0..16).
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> i32 {
        let section_idx = ((y - MIN_Y) / 16) as usize;
        match self.sections.get(section_idx) {
            Some(section) => section.get_block(x as usize, ((y - MIN_Y) % 16) as usize, z as usize),
            None => 0,
        }
    }

    /// Write a block state by world Y and chunk-local x/z (each 0..16).
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, state_id: i32) {
        let section_idx = ((y - MIN_Y) / 16) as usize;
        if let Some(section) = self.sections.get_mut(section_idx) {
            section.set_block(x as usize, ((y - MIN_Y) % 16) as usize, z as usize, state_id);
        }
    }

    /// Build the full chunk data + light packet.
    pub fn to_packet(&self, chunk_x: i32, chunk_z: i32) -> InternalPacket {
        let data = self.serialize_sections();
        let heightmap_data = self.compute_heightmap();

        let heightmaps = nbt_compound! {
            "MOTION_BLOCKING" => NbtValue::LongArray(heightmap_data)
        };

        InternalPacket::ChunkDataAndUpdateLight {
            chunk_x,
            chunk_z,
            heightmaps,
            data,
            block_entities: Vec::new(),
            light_data: self.build_light_data(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_section_serialize() {
        let section = ChunkSection::empty();
        let mut buf = BytesMut::new();
        section.write_to(&mut buf);
        // Should have block_count(2) + bits_per_entry(1) + palette_varint + data_len_varint + biome data
        assert!(buf.len() > 0);
    }

    #[test]
    fn test_single_value_section() {
        let section = ChunkSection::single_value(1); // stone
        assert_eq!(section.block_count, 4096);
        assert_eq!(section.bits_per_entry, 0);
    }

    #[test]
    fn test_chunk_set_get_block_roundtrip() {
        let mut chunk = Chunk::new();
        assert_eq!(chunk.get_block(3, 0, 5), 0);
        chunk.set_block(3, 0, 5, 7);
        assert_eq!(chunk.get_block(3, 0, 5), 7);
        assert_eq!(chunk.get_block(0, 0, 0), 0);
    }

    #[test]
    fn test_chunk_set_block_on_single_value_section() {
        let mut chunk = Chunk::new();
        chunk.sections[0] = ChunkSection::single_value(1);
        chunk.set_block(0, -64, 0, 2);
        assert_eq!(chunk.get_block(0, -64, 0), 2);
        assert_eq!(chunk.get_block(1, -64, 0), 1);
    }

    #[test]
    fn test_heightmap_packing() {
        let mut chunk = Chunk::new();
        // Set section 4 (y=-64+64=0..15 → but we want the first non-empty)
        // Actually section index = (world_y - MIN_Y) / 16
        // For flat world: bedrock at y=-64 → section 0, local_y=0
        chunk.sections[0] = ChunkSection::single_value(1); // bedrock
        let heightmap = chunk.compute_heightmap();
        assert_eq!(heightmap.len(), 37); // ceil(256/7) = 37
    }

    #[test]
    fn sky_light_is_full_right_above_a_solid_floor() {
        let mut chunk = Chunk::new();
        chunk.sections[0] = ChunkSection::single_value(1); // solid floor, y -64..-49
        let light = chunk.build_light_data();

        assert_eq!(light.sky_light_mask.len(), 1);
        assert_eq!(light.sky_light_mask[0], (1i64 << LIGHT_SECTION_COUNT as i64) - 1);
        assert_eq!(light.sky_light_arrays.len(), LIGHT_SECTION_COUNT);
        assert_eq!(light.block_light_arrays[0], vec![0u8; 2048]);

        // Light section 2 covers y -48..-33, directly above the floor: the
        // lowest local_y (the block right above the surface) is fully lit.
        let arr = &light.sky_light_arrays[2];
        assert_eq!(arr[0] & 0x0F, 15);
    }

    #[test]
    fn sky_light_dims_one_level_per_block_of_overhead() {
        let mut chunk = Chunk::new();
        chunk.sections[0] = ChunkSection::single_value(1); // solid floor, y -64..-49
        let light = chunk.build_light_data();

        // Light section 1 covers y -64..-49, i.e. inside the solid floor
        // itself: local_y=15 is the surface block (state 1, non-air) and
        // doesn't matter for sky light, but the formula still applies per (x,z).
        let arr = &light.sky_light_arrays[2];
        // local_y=1 (y=-47) is one block above the fully-lit surface block.
        let index = 1 * 256;
        let byte = arr[index / 2];
        let value = if index % 2 == 0 { byte & 0x0F } else { byte >> 4 };
        assert_eq!(value, 14);
    }
}
