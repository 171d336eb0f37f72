use crate::error::{DecodeError, Result};

// A moving read position over an immutable byte slice. Every record decoder
// runs one of these, either over the whole input or over a decompressed
// record payload.
pub(crate) struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Cursor { buf, pos: 0 }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub(crate) fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(DecodeError::UnexpectedEnd);
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub(crate) fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    // Look at the next four bytes without moving. The record tag check has
    // to leave the cursor alone on a mismatch so the caller can probe for
    // the next record type.
    pub(crate) fn peek4(&self) -> Option<[u8; 4]> {
        if self.remaining() < 4 {
            return None;
        }
        let mut tag = [0u8; 4];
        tag.copy_from_slice(&self.buf[self.pos..self.pos + 4]);
        Some(tag)
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8> {
        let bytes = self.take(1)?;
        Ok(bytes[0])
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        let mut word = [0u8; 4];
        word.copy_from_slice(bytes);
        Ok(u32::from_le_bytes(word))
    }

    pub(crate) fn read_u64(&mut self) -> Result<u64> {
        let bytes = self.take(8)?;
        let mut word = [0u8; 8];
        word.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(word))
    }

    // Plain IEEE-754 single, little-endian. Only full-form coordinate frame
    // rotations use this; every other float on disk is sign-rotated.
    pub(crate) fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    pub(crate) fn read_folded_i32(&mut self) -> Result<i32> {
        Ok(unfold_i32(self.read_u32()?.swap_bytes()))
    }

    pub(crate) fn read_rbx_f32(&mut self) -> Result<f32> {
        Ok(unrotate_f32(self.read_u32()?.swap_bytes()))
    }

    // Take n 32-bit words stored byte-column-major and hand them back in
    // contiguous little-endian layout.
    pub(crate) fn take_unmixed(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut col = self.take(n * 4)?.to_vec();
        unmix_words(&mut col)?;
        Ok(col)
    }
}

// Folded ints are zig-zag coded, stored big-endian: the low bit of the
// byte-swapped word carries the sign, the rest the magnitude.
pub(crate) fn unfold_i32(v: u32) -> i32 {
    ((v >> 1) as i32) ^ -((v & 1) as i32)
}

// On-disk floats rotate the IEEE sign bit down to bit 0, which lines the
// exponent bits up in the high bytes so the byte columns compress better.
pub(crate) fn unrotate_f32(v: u32) -> f32 {
    f32::from_bits(v.rotate_right(1))
}

// De-interleave a region holding n 32-bit words stored transposed: byte j of
// word i sits at offset i + j*n. Rewrites the region in place to the usual
// contiguous layout, byte j of word i at 4*i + j. The scratch copy keeps the
// transform safe when the caller is still reading from the same buffer.
pub(crate) fn unmix_words(bytes: &mut [u8]) -> Result<()> {
    if bytes.len() % 4 != 0 {
        return Err(DecodeError::BadLength);
    }
    let n = bytes.len() / 4;
    let src = bytes.to_vec();
    for i in 0..n {
        for j in 0..4 {
            bytes[i * 4 + j] = src[i + j * n];
        }
    }
    Ok(())
}
