use crate::cursor::Cursor;
use crate::error::{DecodeError, Result};

// Every record after the file header is framed the same way:
//
//   tag[4]            ASCII record type
//   compressed_len    u32 le
//   uncompressed_len  u32 le
//   reserved          u32 le, must be zero
//   payload           compressed_len bytes, LZ4 block format
//
// Equal lengths mean the payload was stored rather than compressed.

pub(crate) const INST: [u8; 4] = *b"INST";
pub(crate) const PROP: [u8; 4] = *b"PROP";
pub(crate) const PRNT: [u8; 4] = *b"PRNT";
pub(crate) const END: [u8; 4] = *b"END\0";

// Read one record with the given tag and return its decompressed payload.
// On a tag mismatch the cursor is left exactly where it was, so the caller
// can probe: property records are read until the tag stops matching.
pub(crate) fn read_record(cur: &mut Cursor, expected: [u8; 4]) -> Result<Vec<u8>> {
    let got = cur.peek4().ok_or(DecodeError::UnexpectedEnd)?;
    if got != expected {
        return Err(DecodeError::WrongTag { expected, got });
    }
    cur.skip(4)?;

    let compressed_len = cur.read_u32()? as usize;
    let uncompressed_len = cur.read_u32()? as usize;
    let reserved = cur.read_u32()?;
    if reserved != 0 {
        return Err(DecodeError::CorruptChunkHeader);
    }

    let payload = cur.take(compressed_len)?;
    if compressed_len == uncompressed_len {
        // Stored payload, nothing to inflate.
        return Ok(payload.to_vec());
    }
    let inflated = lz4_flex::block::decompress(payload, uncompressed_len)
        .map_err(|_| DecodeError::DecompressFailed)?;
    if inflated.len() != uncompressed_len {
        return Err(DecodeError::DecompressFailed);
    }
    Ok(inflated)
}
