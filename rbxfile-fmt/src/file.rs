use crate::class::{read_class_record, ClassDef};
use crate::chunk;
use crate::cursor::Cursor;
use crate::error::{DecodeError, Result, Warning};
use crate::parent::read_parent_record;
use crate::prop::{read_prop_record, PropDef};
use crate::value::{Ref, Value, ValueKind};

const MAGIC: &[u8; 8] = b"<roblox!";

/// One decoded instance: its class, its id, and one value per property
/// column of its class, in column order, with the synthesised parent link
/// last. Values live here, not on the property definitions, once a file
/// has been materialised.
#[derive(Debug)]
pub struct Instance {
    pub(crate) class_id: u32,
    pub(crate) referent: Ref,
    pub(crate) values: Vec<Value>,
}

impl Instance {
    pub fn class_id(&self) -> u32 {
        self.class_id
    }
    pub fn referent(&self) -> Ref {
        self.referent
    }
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// A fully decoded place file. Owns every class and instance; object links
/// are instance ids into `instances`, resolved to references through the
/// accessors here. Instances sit at the index of their referent.
#[derive(Debug)]
pub struct File {
    pub(crate) classes: Vec<ClassDef>,
    pub(crate) instances: Vec<Instance>,
    pub(crate) warnings: Vec<Warning>,
}

impl File {
    pub fn classes(&self) -> &[ClassDef] {
        &self.classes
    }
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn class_of(&self, inst: &Instance) -> &ClassDef {
        &self.classes[inst.class_id as usize]
    }

    pub fn instance(&self, r: Ref) -> Option<&Instance> {
        if r.0 < 0 {
            return None;
        }
        self.instances.get(r.0 as usize)
    }

    /// The instance an object-valued property points at, if any.
    pub fn target(&self, value: &Value) -> Option<&Instance> {
        match value {
            Value::Object(Some(r)) => self.instance(*r),
            _ => None,
        }
    }

    /// Property definitions of the instance's class zipped with the
    /// instance's values, in disk order, parent link last.
    pub fn props<'a>(
        &'a self,
        inst: &'a Instance,
    ) -> impl Iterator<Item = (&'a PropDef, &'a Value)> {
        self.class_of(inst).properties().iter().zip(&inst.values)
    }

    /// The parent instance, or None for roots. The parent link is the last
    /// value of every instance.
    pub fn parent(&self, inst: &Instance) -> Option<&Instance> {
        match inst.values.last() {
            Some(v) => self.target(v),
            None => None,
        }
    }

    /// The instance's `Name` string property, when it has one.
    pub fn name_of<'a>(&'a self, inst: &'a Instance) -> Option<&'a rbxfile_base::ByteStr> {
        self.props(inst).find_map(|(def, value)| {
            if def.name() == "Name" {
                match value {
                    Value::String(s) => Some(s),
                    _ => None,
                }
            } else {
                None
            }
        })
    }
}

/// Decode a byte image of a binary place/model file into an object graph.
///
/// The decoder is a pure function of the input slice: everything it returns
/// is owned by the `File`, and nothing in the `File` borrows `bytes`.
pub fn decode(bytes: &[u8]) -> Result<File> {
    let mut cur = Cursor::new(bytes);

    // 16-byte signature block: the magic, then 8 bytes we do not interpret.
    let magic = cur.take(8)?;
    if magic != MAGIC {
        return Err(DecodeError::BadMagic);
    }
    cur.skip(8)?;

    let type_count = cur.read_u32()?;
    let object_count = cur.read_u32()? as usize;
    cur.skip(8)?;

    let mut warnings = Vec::new();

    let mut classes = Vec::with_capacity(type_count as usize);
    for i in 0..type_count {
        classes.push(read_class_record(&mut cur, i)?);
    }

    // The header's object count and the per-class counts describe the same
    // instances; make sure they agree before allocating the arena.
    let declared: usize = classes.iter().map(|c| c.instance_count()).sum();
    if declared != object_count {
        return Err(DecodeError::CountMismatch {
            expected: object_count as i64,
            got: declared as i64,
        });
    }

    while read_prop_record(&mut cur, &mut classes, &mut warnings)? {}

    let pairs = read_parent_record(&mut cur, object_count)?;

    // The end marker has an empty payload; whatever trails it (usually a
    // plain-text `</roblox>`) is ignored.
    chunk::read_record(&mut cur, chunk::END)?;

    materialise(classes, pairs, object_count, warnings)
}

// Index of a referent in the instance arena, or an error when the id falls
// outside the file's referent space.
fn arena_index(r: Ref, object_count: usize) -> Result<usize> {
    if r.0 >= 0 && (r.0 as usize) < object_count {
        Ok(r.0 as usize)
    } else {
        Err(DecodeError::CountMismatch {
            expected: object_count as i64,
            got: r.0 as i64,
        })
    }
}

// An id decoded from a property column links to an instance when it is in
// range; -1 and anything else out of range is a nil link.
fn resolve_link(r: Ref, object_count: usize) -> Option<Ref> {
    if r.0 >= 0 && (r.0 as usize) < object_count {
        Some(r)
    } else {
        None
    }
}

// Fuse the class table, property columns and parent pairs into the final
// row-wise object graph: one instance per referent, each carrying its
// class's column values plus the parent link.
fn materialise(
    mut classes: Vec<ClassDef>,
    pairs: Vec<(Ref, Ref)>,
    object_count: usize,
    warnings: Vec<Warning>,
) -> Result<File> {
    // Parent lookup built once; the pair list is in arbitrary order and a
    // scan per instance would make big files quadratic.
    let mut parent_of = vec![Ref::NIL; object_count];
    let mut seen = vec![false; object_count];
    for (child, parent) in pairs {
        let i = arena_index(child, object_count)?;
        if !seen[i] {
            seen[i] = true;
            parent_of[i] = parent;
        }
    }

    let mut slots: Vec<Option<Instance>> = Vec::with_capacity(object_count);
    slots.resize_with(object_count, || None);

    for (class_id, class) in classes.iter_mut().enumerate() {
        let count = class.instance_count();

        // Pivot the column-major property values into per-instance rows,
        // resolving referent columns into object links on the way through.
        let mut rows: Vec<Vec<Value>> = Vec::with_capacity(count);
        rows.resize_with(count, || Vec::with_capacity(class.props.len() + 1));
        for prop in &mut class.props {
            let vals = std::mem::take(&mut prop.values);
            if vals.len() != count {
                return Err(DecodeError::CountMismatch {
                    expected: count as i64,
                    got: vals.len() as i64,
                });
            }
            let is_link = prop.kind == ValueKind::Referent;
            for (row, v) in rows.iter_mut().zip(vals) {
                let v = match (is_link, v) {
                    (true, Value::Referent(r)) => Value::Object(resolve_link(r, object_count)),
                    (_, v) => v,
                };
                row.push(v);
            }
            if is_link {
                prop.kind = ValueKind::Object;
            }
        }

        // Parent column: synthesised, always the last property.
        class.props.push(PropDef::parent());
        for (&r, mut row) in class.referents.iter().zip(rows) {
            let i = arena_index(r, object_count)?;
            row.push(Value::Object(resolve_link(parent_of[i], object_count)));
            if slots[i].is_some() {
                // Duplicate referent; some other slot would stay empty.
                return Err(DecodeError::CountMismatch {
                    expected: object_count as i64,
                    got: r.0 as i64,
                });
            }
            slots[i] = Some(Instance {
                class_id: class_id as u32,
                referent: r,
                values: row,
            });
        }
    }

    let instances: Vec<Instance> = slots.into_iter().flatten().collect();
    if instances.len() != object_count {
        return Err(DecodeError::CountMismatch {
            expected: object_count as i64,
            got: instances.len() as i64,
        });
    }

    Ok(File {
        classes,
        instances,
        warnings,
    })
}
