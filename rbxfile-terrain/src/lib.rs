// Experimental scanner for legacy `ClusterGridV3` terrain blobs. The blob
// is a sequence of chunks; each chunk covers 16k cells and carries two
// run-length streams over them:
//
//   stream 0: cell shape; runs of empty cells (tag 0x28) or of one block
//             type + rotation packed into the tag byte
//   stream 1: cell material; runs of empty cells (tag 0x11) or of one
//             material id
//
// Run lengths are one byte, with 0xff escaping a big-endian u16 long form.
// The format is only partially understood; this reads the framing and the
// per-run payload bits and leaves interpretation to the caller.

use rbxfile_base::{err, Result};

#[cfg(test)]
mod test;

// Cells per chunk, per stream.
const CHUNK_CELLS: u32 = 0x4000;

const EMPTY_SHAPE_TAG: u8 = 0x28;
const EMPTY_MATERIAL_TAG: u8 = 0x11;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TerrainChunk {
    pub position: (i16, i16, i16),
    pub shapes: Vec<ShapeRun>,
    pub materials: Vec<MaterialRun>,
}

/// One run from the shape stream. `fill` is None for a run of empty cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShapeRun {
    pub cells: u32,
    pub fill: Option<Shape>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Shape {
    pub block: u8,
    pub rotation: u8,
}

/// One run from the material stream. `material` is None for empty cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaterialRun {
    pub cells: u32,
    pub material: Option<u8>,
}

/// Scan a cluster-grid blob into its chunks. Fails on truncation or when
/// a run claims more cells than its chunk has left.
pub fn scan(blob: &[u8]) -> Result<Vec<TerrainChunk>> {
    let mut rd = Scan { buf: blob, pos: 0 };
    let mut chunks = Vec::new();
    while !rd.is_empty() {
        chunks.push(read_chunk(&mut rd)?);
    }
    Ok(chunks)
}

fn read_chunk(rd: &mut Scan) -> Result<TerrainChunk> {
    let x = rd.read_i16()?;
    let y = rd.read_i16()?;
    let z = rd.read_i16()?;

    let mut shapes = Vec::new();
    let mut left = CHUNK_CELLS;
    while left > 0 {
        let tag = rd.read_u8()?;
        let cells = rd.read_run_length()?;
        if cells == 0 {
            return Err(err("zero-length terrain run"));
        }
        if cells > left {
            return Err(err("terrain shape run overruns its chunk"));
        }
        left -= cells;
        let fill = if tag == EMPTY_SHAPE_TAG {
            None
        } else {
            Some(Shape {
                // Bits 3..=5 carry the block type, bits 6..=7 the rotation.
                block: (tag & 0x38) >> 3,
                rotation: (tag & 0xc0) >> 6,
            })
        };
        shapes.push(ShapeRun { cells, fill });
    }

    let mut materials = Vec::new();
    let mut left = CHUNK_CELLS;
    while left > 0 {
        let tag = rd.read_u8()?;
        let cells = rd.read_run_length()?;
        if cells == 0 {
            return Err(err("zero-length terrain run"));
        }
        if cells > left {
            return Err(err("terrain material run overruns its chunk"));
        }
        left -= cells;
        let material = if tag == EMPTY_MATERIAL_TAG {
            None
        } else {
            Some(tag)
        };
        materials.push(MaterialRun { cells, material });
    }

    Ok(TerrainChunk {
        position: (x, y, z),
        shapes,
        materials,
    })
}

struct Scan<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Scan<'a> {
    fn is_empty(&self) -> bool {
        self.pos == self.buf.len()
    }

    fn read_u8(&mut self) -> Result<u8> {
        match self.buf.get(self.pos) {
            Some(&b) => {
                self.pos += 1;
                Ok(b)
            }
            None => Err(err("truncated terrain blob")),
        }
    }

    fn read_i16(&mut self) -> Result<i16> {
        let lo = self.read_u8()?;
        let hi = self.read_u8()?;
        Ok(i16::from_le_bytes([lo, hi]))
    }

    // A run length: one byte, or 0xff followed by a big-endian u16.
    fn read_run_length(&mut self) -> Result<u32> {
        let short = self.read_u8()?;
        if short != 0xff {
            return Ok(short as u32);
        }
        let hi = self.read_u8()?;
        let lo = self.read_u8()?;
        Ok(u16::from_be_bytes([hi, lo]) as u32)
    }
}
