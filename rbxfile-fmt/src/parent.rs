use crate::chunk;
use crate::cursor::Cursor;
use crate::error::{DecodeError, Result};
use crate::value::Ref;

// A PRNT record:
//
//   version     u8, must be zero
//   pair_count  u32 le, must equal the header's object count
//   children    pair_count interleaved folded deltas
//   parents     pair_count interleaved folded deltas
//
// Both columns are differential from zero. The pairs come back in disk
// order; a parent id of -1 is a root.
pub(crate) fn read_parent_record(cur: &mut Cursor, object_count: usize) -> Result<Vec<(Ref, Ref)>> {
    let payload = chunk::read_record(cur, chunk::PRNT)?;
    let mut rec = Cursor::new(&payload);

    let version = rec.read_u8()?;
    if version != 0 {
        return Err(DecodeError::UnsupportedPrntVersion(version));
    }
    let pairs = rec.read_u32()? as usize;
    if pairs != object_count {
        return Err(DecodeError::CountMismatch {
            expected: object_count as i64,
            got: pairs as i64,
        });
    }
    if rec.remaining() != pairs * 8 {
        return Err(DecodeError::CountMismatch {
            expected: (pairs * 8) as i64,
            got: rec.remaining() as i64,
        });
    }

    let child_col = rec.take_unmixed(pairs)?;
    let parent_col = rec.take_unmixed(pairs)?;
    let mut children = Cursor::new(&child_col);
    let mut parents = Cursor::new(&parent_col);

    let mut out = Vec::with_capacity(pairs);
    let mut child: i32 = 0;
    let mut parent: i32 = 0;
    for _ in 0..pairs {
        child = child.wrapping_add(children.read_folded_i32()?);
        parent = parent.wrapping_add(parents.read_folded_i32()?);
        out.push((Ref(child), Ref(parent)));
    }
    Ok(out)
}
