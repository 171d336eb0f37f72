use crate::chunk;
use crate::cursor::Cursor;
use crate::error::{DecodeError, Result};
use crate::prop::PropDef;
use crate::value::Ref;
use rbxfile_base::ByteStr;

/// One class declaration: a name, the referents of its instances, and the
/// property columns read for it so far (in disk order).
#[derive(Debug)]
pub struct ClassDef {
    pub(crate) type_id: u32,
    pub(crate) name: ByteStr,
    pub(crate) referents: Vec<Ref>,
    pub(crate) props: Vec<PropDef>,
    // One opaque byte per instance when the record carries them; no
    // documented meaning, preserved verbatim.
    pub(crate) instance_tags: Option<Vec<u8>>,
}

impl ClassDef {
    pub fn type_id(&self) -> u32 {
        self.type_id
    }
    pub fn name(&self) -> &ByteStr {
        &self.name
    }
    pub fn instance_count(&self) -> usize {
        self.referents.len()
    }
    pub fn referents(&self) -> &[Ref] {
        &self.referents
    }
    pub fn properties(&self) -> &[PropDef] {
        &self.props
    }
    pub fn instance_tags(&self) -> Option<&[u8]> {
        self.instance_tags.as_deref()
    }
}

// An INST record:
//
//   type_id         u32 le, must equal this record's index
//   name_len, name  u32 le + bytes
//   tagged          u8, nonzero when per-instance tag bytes follow
//   instance_count  u32 le
//   referents       instance_count interleaved folded deltas
//   tags            instance_count bytes, only when tagged
//
// The referent column is differential: each decoded delta is added to a
// running sum that starts at zero.
pub(crate) fn read_class_record(cur: &mut Cursor, expected_id: u32) -> Result<ClassDef> {
    let payload = chunk::read_record(cur, chunk::INST)?;
    let mut rec = Cursor::new(&payload);

    let type_id = rec.read_u32()?;
    if type_id != expected_id {
        return Err(DecodeError::CountMismatch {
            expected: expected_id as i64,
            got: type_id as i64,
        });
    }
    let name_len = rec.read_u32()? as usize;
    let name = ByteStr::from(rec.take(name_len)?);
    let tagged = rec.read_u8()?;
    let count = rec.read_u32()? as usize;

    let col = rec.take_unmixed(count)?;
    let mut deltas = Cursor::new(&col);
    let mut referents = Vec::with_capacity(count);
    let mut running: i32 = 0;
    for _ in 0..count {
        running = running.wrapping_add(deltas.read_folded_i32()?);
        referents.push(Ref(running));
    }

    let instance_tags = if tagged != 0 {
        Some(rec.take(count)?.to_vec())
    } else {
        None
    };

    Ok(ClassDef {
        type_id,
        name,
        referents,
        props: Vec::new(),
        instance_tags,
    })
}
