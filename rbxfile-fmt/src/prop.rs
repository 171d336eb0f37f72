use crate::chunk;
use crate::class::ClassDef;
use crate::cursor::Cursor;
use crate::error::{DecodeError, Result, Warning};
use crate::value::{CFrame, Color3, Ref, UDim, UDim2, Value, ValueKind, Vector2, Vector3};
use rbxfile_base::ByteStr;
use std::sync::Arc;
use tracing::warn;

/// One property column of a class: a name, a declared kind, and (until the
/// file is materialised) one value per instance of the owning class.
/// Columns stay in the order their records appeared on disk.
#[derive(Debug)]
pub struct PropDef {
    pub(crate) name: ByteStr,
    pub(crate) kind: ValueKind,
    pub(crate) values: Vec<Value>,
}

impl PropDef {
    pub fn name(&self) -> &ByteStr {
        &self.name
    }
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    // The synthesised parent column appended to every class.
    pub(crate) fn parent() -> PropDef {
        PropDef {
            name: ByteStr::from("Parent"),
            kind: ValueKind::Object,
            values: Vec::new(),
        }
    }
}

// A PROP record:
//
//   class_id        u32 le, index into the class table
//   name_len, name  u32 le + bytes
//   kind            u8 value-kind tag
//   values          instance_count values in a kind-specific batch layout
//
// Returns false when the next record is not a PROP, which ends the property
// loop without consuming anything.
pub(crate) fn read_prop_record(
    cur: &mut Cursor,
    classes: &mut [ClassDef],
    warnings: &mut Vec<Warning>,
) -> Result<bool> {
    let payload = match chunk::read_record(cur, chunk::PROP) {
        Ok(payload) => payload,
        Err(DecodeError::WrongTag { .. }) => return Ok(false),
        Err(e) => return Err(e),
    };
    let mut rec = Cursor::new(&payload);

    let class_id = rec.read_u32()?;
    let class = classes
        .get_mut(class_id as usize)
        .ok_or(DecodeError::UnknownClass(class_id))?;
    let name_len = rec.read_u32()? as usize;
    let name = ByteStr::from(rec.take(name_len)?);
    let tag = rec.read_u8()?;

    let kind = ValueKind::from_wire(tag);
    let n = class.instance_count();
    let values = read_values(kind, tag, &mut rec, n, &name, warnings)?;

    class.props.push(PropDef { name, kind, values });
    Ok(true)
}

// Most kinds interleave bytes across the whole batch, so values are always
// decoded a column at a time, never one by one.
fn read_values(
    kind: ValueKind,
    tag: u8,
    rec: &mut Cursor,
    n: usize,
    name: &ByteStr,
    warnings: &mut Vec<Warning>,
) -> Result<Vec<Value>> {
    match kind {
        ValueKind::String => read_strings(rec, n),
        ValueKind::Bool => read_bools(rec, n),
        ValueKind::Int32 => read_int32s(rec, n),
        ValueKind::Float32 => read_float32s(rec, n),
        ValueKind::Float64 => read_float64s(rec, n),
        ValueKind::UDim2 => read_udim2s(rec, n),
        ValueKind::BrickColor => Ok(swapped_words(rec, n)?
            .into_iter()
            .map(Value::BrickColor)
            .collect()),
        ValueKind::Color3 => read_color3s(rec, n),
        ValueKind::Vector2 => read_vector2s(rec, n),
        ValueKind::Vector3 => read_vector3s(rec, n),
        ValueKind::CFrame => read_cframes(rec, n, name, warnings),
        ValueKind::Token => Ok(swapped_words(rec, n)?.into_iter().map(Value::Token).collect()),
        ValueKind::Referent => read_referents(rec, n),
        // Ray, Faces, Axes, Vector3Int16 and the nameless tags have no
        // decodable layout; keep the raw column and move on.
        ValueKind::Ray
        | ValueKind::Faces
        | ValueKind::Axes
        | ValueKind::Vector3Int16
        | ValueKind::Object
        | ValueKind::Reserved(_) => read_reserved(rec, n, tag, name, warnings),
    }
}

fn expect_remaining(rec: &Cursor, bytes: usize) -> Result<()> {
    if rec.remaining() != bytes {
        return Err(DecodeError::CountMismatch {
            expected: bytes as i64,
            got: rec.remaining() as i64,
        });
    }
    Ok(())
}

// A stream of length-prefixed byte strings; the count is implied by the
// record length and cross-checked against the instance count.
fn read_strings(rec: &mut Cursor, n: usize) -> Result<Vec<Value>> {
    let mut out = Vec::with_capacity(n);
    while !rec.is_empty() {
        let len = rec.read_u32()? as usize;
        out.push(Value::String(ByteStr::from(rec.take(len)?)));
    }
    if out.len() != n {
        return Err(DecodeError::CountMismatch {
            expected: n as i64,
            got: out.len() as i64,
        });
    }
    Ok(out)
}

fn read_bools(rec: &mut Cursor, n: usize) -> Result<Vec<Value>> {
    expect_remaining(rec, n)?;
    Ok(rec.take(n)?.iter().map(|&b| Value::Bool(b != 0)).collect())
}

// One de-interleaved column of folded ints. Not differential; property
// int columns store each value directly.
fn folded_column(rec: &mut Cursor, n: usize) -> Result<Vec<i32>> {
    let col = rec.take_unmixed(n)?;
    let mut cur = Cursor::new(&col);
    let mut vals = Vec::with_capacity(n);
    for _ in 0..n {
        vals.push(cur.read_folded_i32()?);
    }
    Ok(vals)
}

fn rbx_float_column(rec: &mut Cursor, n: usize) -> Result<Vec<f32>> {
    let col = rec.take_unmixed(n)?;
    let mut cur = Cursor::new(&col);
    let mut vals = Vec::with_capacity(n);
    for _ in 0..n {
        vals.push(cur.read_rbx_f32()?);
    }
    Ok(vals)
}

// De-interleaved words whose bytes are stored big-endian (brick color
// codes and enum tokens).
fn swapped_words(rec: &mut Cursor, n: usize) -> Result<Vec<u32>> {
    expect_remaining(rec, n * 4)?;
    let col = rec.take_unmixed(n)?;
    let mut cur = Cursor::new(&col);
    let mut vals = Vec::with_capacity(n);
    for _ in 0..n {
        vals.push(cur.read_u32()?.swap_bytes());
    }
    Ok(vals)
}

fn read_int32s(rec: &mut Cursor, n: usize) -> Result<Vec<Value>> {
    expect_remaining(rec, n * 4)?;
    Ok(folded_column(rec, n)?.into_iter().map(Value::Int32).collect())
}

fn read_float32s(rec: &mut Cursor, n: usize) -> Result<Vec<Value>> {
    expect_remaining(rec, n * 4)?;
    Ok(rbx_float_column(rec, n)?
        .into_iter()
        .map(Value::Float32)
        .collect())
}

// Doubles are stored whole, little-endian, with no interleaving.
fn read_float64s(rec: &mut Cursor, n: usize) -> Result<Vec<Value>> {
    expect_remaining(rec, n * 8)?;
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        out.push(Value::Float64(f64::from_bits(rec.read_u64()?)));
    }
    Ok(out)
}

// Four equal columns: x scale, y scale, x offset, y offset.
fn read_udim2s(rec: &mut Cursor, n: usize) -> Result<Vec<Value>> {
    expect_remaining(rec, n * 16)?;
    let scale_x = rbx_float_column(rec, n)?;
    let scale_y = rbx_float_column(rec, n)?;
    let offset_x = folded_column(rec, n)?;
    let offset_y = folded_column(rec, n)?;
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        out.push(Value::UDim2(UDim2 {
            x: UDim {
                scale: scale_x[i],
                offset: offset_x[i],
            },
            y: UDim {
                scale: scale_y[i],
                offset: offset_y[i],
            },
        }));
    }
    Ok(out)
}

fn read_color3s(rec: &mut Cursor, n: usize) -> Result<Vec<Value>> {
    expect_remaining(rec, n * 12)?;
    let r = rbx_float_column(rec, n)?;
    let g = rbx_float_column(rec, n)?;
    let b = rbx_float_column(rec, n)?;
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        out.push(Value::Color3(Color3 {
            r: r[i],
            g: g[i],
            b: b[i],
        }));
    }
    Ok(out)
}

fn read_vector2s(rec: &mut Cursor, n: usize) -> Result<Vec<Value>> {
    expect_remaining(rec, n * 8)?;
    let x = rbx_float_column(rec, n)?;
    let y = rbx_float_column(rec, n)?;
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        out.push(Value::Vector2(Vector2 { x: x[i], y: y[i] }));
    }
    Ok(out)
}

fn read_vector3s(rec: &mut Cursor, n: usize) -> Result<Vec<Value>> {
    expect_remaining(rec, n * 12)?;
    let x = rbx_float_column(rec, n)?;
    let y = rbx_float_column(rec, n)?;
    let z = rbx_float_column(rec, n)?;
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        out.push(Value::Vector3(Vector3 {
            x: x[i],
            y: y[i],
            z: z[i],
        }));
    }
    Ok(out)
}

// Coordinate frames lead with one rotation header per instance: tag 0x00
// is a full row-major matrix of plain floats, tags 0x02..=0x23 are a
// shorthand for an axis-aligned orientation and consume no further bytes.
// The last 12*n bytes of the record are the three position columns.
fn read_cframes(
    rec: &mut Cursor,
    n: usize,
    name: &ByteStr,
    warnings: &mut Vec<Warning>,
) -> Result<Vec<Value>> {
    let rem = rec.remaining();
    let pos_bytes = n * 12;
    if rem < pos_bytes {
        return Err(DecodeError::BadLength);
    }
    let body = rec.take(rem)?;
    let (head, tail) = body.split_at(rem - pos_bytes);

    let mut rots = Cursor::new(head);
    let mut rotations = Vec::with_capacity(n);
    for _ in 0..n {
        let tag = rots.read_u8()?;
        match tag {
            0x00 => {
                let mut m = [0f32; 9];
                for slot in m.iter_mut() {
                    *slot = rots.read_f32()?;
                }
                rotations.push(m);
            }
            0x02..=0x23 => {
                let w = Warning::ShortRotation {
                    prop: name.clone(),
                    tag,
                };
                warn!(target: "rbxfile", "{}", w);
                warnings.push(w);
                rotations.push(CFrame::IDENTITY_ROTATION);
            }
            other => return Err(DecodeError::BadCFrameTag(other)),
        }
    }
    if !rots.is_empty() {
        return Err(DecodeError::BadLength);
    }

    let mut pos = Cursor::new(tail);
    let x = rbx_float_column(&mut pos, n)?;
    let y = rbx_float_column(&mut pos, n)?;
    let z = rbx_float_column(&mut pos, n)?;

    let mut out = Vec::with_capacity(n);
    for (i, rotation) in rotations.into_iter().enumerate() {
        out.push(Value::CFrame(CFrame {
            rotation,
            position: Vector3 {
                x: x[i],
                y: y[i],
                z: z[i],
            },
        }));
    }
    Ok(out)
}

// Referent columns are differential with a reset rule: a zero delta is a
// nil link and leaves the running id alone, so sparse links do not shift
// the ids of the links after them.
fn read_referents(rec: &mut Cursor, n: usize) -> Result<Vec<Value>> {
    expect_remaining(rec, n * 4)?;
    let col = rec.take_unmixed(n)?;
    let mut cur = Cursor::new(&col);
    let mut out = Vec::with_capacity(n);
    let mut running: i32 = 0;
    for _ in 0..n {
        let delta = cur.read_folded_i32()?;
        if delta == 0 {
            out.push(Value::Referent(Ref::NIL));
        } else {
            running = running.wrapping_add(delta);
            out.push(Value::Referent(Ref(running)));
        }
    }
    Ok(out)
}

// A column the format reserves or that we do not know: keep the raw bytes,
// say so once, and let every value of the column share them.
fn read_reserved(
    rec: &mut Cursor,
    n: usize,
    tag: u8,
    name: &ByteStr,
    warnings: &mut Vec<Warning>,
) -> Result<Vec<Value>> {
    let raw: Arc<[u8]> = Arc::from(rec.take(rec.remaining())?);
    let w = Warning::ReservedKind {
        prop: name.clone(),
        kind: tag,
    };
    warn!(target: "rbxfile", "{}", w);
    warnings.push(w);
    Ok((0..n)
        .map(|_| Value::Unknown {
            kind: tag,
            raw: raw.clone(),
        })
        .collect())
}
