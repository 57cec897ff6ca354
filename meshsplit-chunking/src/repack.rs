//! Block-anchored delta packing of quantized vertex positions
//!
//! Positions are first quantized to 16 bits per axis over the mesh bounds.
//! The packer then walks the vertices in order, grouping them into fixed-size
//! blocks. The first vertex written to a block is its anchor; every vertex in
//! the block is stored as a 10-bit-per-axis offset from the anchor, biased by
//! 512, in one `u32` word (`x << 22 | y << 12 | z << 2`). A vertex whose offset
//! does not fit closes the block with zero padding and becomes the anchor of
//! the next one. The remap table records where each input vertex landed so
//! index buffers can be rewritten to the packed layout.

use meshsplit_core::{Bounded, Error, Point3f, Result, Vector3f};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BLOCK_SIZE: usize = 64;

const DELTA_BIAS: i32 = 512;
const DELTA_MASK: i32 = 0x3ff;
const QUANT_MAX: f32 = u16::MAX as f32;

/// Positions quantized to `0..=65535` per axis, with the parameters to undo it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantizedPositions {
    pub positions: Vec<[u16; 3]>,
    /// Position mapped to quantized zero
    pub origin: Point3f,
    /// World units per quantization step, per axis
    pub step: Vector3f,
}

impl QuantizedPositions {
    pub fn dequantize(&self, q: [u16; 3]) -> Point3f {
        Point3f::new(
            self.origin.x + q[0] as f32 * self.step.x,
            self.origin.y + q[1] as f32 * self.step.y,
            self.origin.z + q[2] as f32 * self.step.z,
        )
    }
}

/// Quantize positions onto their bounding box. Flat axes quantize to zero.
pub fn quantize_positions(vertices: &[Point3f]) -> QuantizedPositions {
    let (min, max) = vertices.bounding_box();
    let extent = max - min;
    let step = extent.map(|e| if e > 0.0 { e / QUANT_MAX } else { 0.0 });

    let positions = vertices
        .iter()
        .map(|v| {
            let mut q = [0u16; 3];
            for axis in 0..3 {
                if step[axis] > 0.0 {
                    let t = ((v[axis] - min[axis]) / step[axis]).round();
                    q[axis] = t.clamp(0.0, QUANT_MAX) as u16;
                }
            }
            q
        })
        .collect();

    QuantizedPositions {
        positions,
        origin: min,
        step,
    }
}

/// Packed vertex stream produced by [`DeltaPacker::pack`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedVertices {
    pub block_size: usize,
    /// One anchor per block
    pub anchors: Vec<[u16; 3]>,
    /// Packed words, including zero padding at the end of closed blocks
    pub packed: Vec<u32>,
    /// `remap[input vertex] = packed word index`
    pub remap: Vec<u32>,
}

impl PackedVertices {
    /// Number of packed words, padding included
    pub fn len(&self) -> usize {
        self.packed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packed.is_empty()
    }

    /// Words spent on padding
    pub fn padding(&self) -> usize {
        self.packed.len() - self.remap.len()
    }

    /// Packed words as raw bytes for upload or serialization
    pub fn packed_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.packed)
    }

    /// Reconstruct the quantized position stored at `packed_index`.
    ///
    /// Returns `None` past the end and for padding words, which hold no vertex.
    pub fn decode(&self, packed_index: usize) -> Option<[u16; 3]> {
        // remap is strictly increasing: vertices are written in input order
        self.remap.binary_search(&u32::try_from(packed_index).ok()?).ok()?;
        let word = *self.packed.get(packed_index)? as i32;
        let anchor = self.anchors.get(packed_index / self.block_size)?;
        let deltas = [(word >> 22) & DELTA_MASK, (word >> 12) & DELTA_MASK, (word >> 2) & DELTA_MASK];
        let mut out = [0u16; 3];
        for axis in 0..3 {
            out[axis] = (anchor[axis] as i32 + deltas[axis] - DELTA_BIAS) as u16;
        }
        Some(out)
    }

    /// Rewrite a 32-bit index buffer to point at packed words
    pub fn remap_indices_u32(&self, indices: &mut [u32]) -> Result<()> {
        remap_indices_u32(indices, &self.remap)
    }

    /// Rewrite a 16-bit index buffer to point at packed words
    pub fn remap_indices_u16(&self, indices: &mut [u16]) -> Result<()> {
        remap_indices_u16(indices, &self.remap)
    }
}

/// Block-anchored delta packer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaPacker {
    /// Words per block; each block has its own anchor
    pub block_size: usize,
    /// Upper bound on packed words, padding included
    pub max_output_len: Option<usize>,
}

impl Default for DeltaPacker {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            max_output_len: None,
        }
    }
}

impl DeltaPacker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_max_output_len(mut self, max_output_len: usize) -> Self {
        self.max_output_len = Some(max_output_len);
        self
    }

    pub fn pack(&self, positions: &[[u16; 3]]) -> Result<PackedVertices> {
        if self.block_size == 0 {
            return Err(Error::InvalidConfig("block_size must be at least 1".to_string()));
        }
        let capacity = self.max_output_len.unwrap_or(usize::MAX);
        let ensure_room = |len: usize| -> Result<()> {
            if len >= capacity {
                return Err(Error::CapacityExceeded {
                    required: len + 1,
                    capacity,
                });
            }
            Ok(())
        };

        let mut anchors: Vec<[u16; 3]> = Vec::new();
        let mut packed: Vec<u32> = Vec::with_capacity(positions.len());
        let mut remap: Vec<u32> = Vec::with_capacity(positions.len());

        for &v in positions {
            ensure_room(packed.len())?;
            if packed.len() % self.block_size == 0 {
                anchors.push(v);
            }

            let deltas = match block_deltas(v, anchors[anchors.len() - 1]) {
                Some(deltas) => deltas,
                None => {
                    while packed.len() % self.block_size != 0 {
                        ensure_room(packed.len())?;
                        packed.push(0);
                    }
                    ensure_room(packed.len())?;
                    anchors.push(v);
                    [DELTA_BIAS as u32; 3]
                }
            };

            remap.push(packed.len() as u32);
            packed.push(deltas[0] << 22 | deltas[1] << 12 | deltas[2] << 2);
        }

        Ok(PackedVertices {
            block_size: self.block_size,
            anchors,
            packed,
            remap,
        })
    }
}

/// Biased per-axis offsets of `v` from `anchor`, if all fit in 10 bits
fn block_deltas(v: [u16; 3], anchor: [u16; 3]) -> Option<[u32; 3]> {
    let mut out = [0u32; 3];
    for axis in 0..3 {
        let d = DELTA_BIAS + v[axis] as i32 - anchor[axis] as i32;
        if d & !DELTA_MASK != 0 {
            return None;
        }
        out[axis] = d as u32;
    }
    Some(out)
}

/// Rewrite `indices` through `remap`. On error `indices` is left untouched.
pub fn remap_indices_u32(indices: &mut [u32], remap: &[u32]) -> Result<()> {
    let remapped = indices
        .iter()
        .map(|&index| lookup(remap, index as usize))
        .collect::<Result<Vec<u32>>>()?;
    indices.copy_from_slice(&remapped);
    Ok(())
}

/// Rewrite 16-bit `indices` through `remap`, failing instead of truncating.
/// On error `indices` is left untouched.
pub fn remap_indices_u16(indices: &mut [u16], remap: &[u32]) -> Result<()> {
    let remapped = indices
        .iter()
        .map(|&index| {
            let target = lookup(remap, index as usize)?;
            u16::try_from(target).map_err(|_| Error::IndexOverflow {
                index: target as usize,
                max: u16::MAX as usize,
            })
        })
        .collect::<Result<Vec<u16>>>()?;
    indices.copy_from_slice(&remapped);
    Ok(())
}

fn lookup(remap: &[u32], index: usize) -> Result<u32> {
    remap.get(index).copied().ok_or_else(|| {
        Error::InvalidData(format!(
            "Index {} has no remap entry ({} entries)",
            index,
            remap.len()
        ))
    })
}
