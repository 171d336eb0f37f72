// Decoder for the Roblox binary place/model container (magic `<roblox!`).
//
// The layout, top to bottom:
//
// - A 16-byte signature block, then a class count, an object count, and 8
//   bytes of padding.
// - One INST record per class: class name plus the referent (instance id)
//   of every instance of that class, differentially coded.
// - Any number of PROP records, each one property *column*: every value of
//   one property for every instance of one class, batch-coded per kind.
// - One PRNT record: (child, parent) referent pairs for the whole file.
// - An END record, then optionally a plain-text `</roblox>` trailer.
//
// Each record is a tagged frame with an LZ4 block payload. Inside the
// payloads the format leans hard on byte-columnar tricks so that LZ4 has
// something to chew on:
//
// - 32-bit arrays are stored transposed, all first bytes together, then
//   all second bytes, and so on (the de-interleave in cursor.rs inverts
//   this).
// - Signed ints are zig-zag folded and stored big-endian.
// - Floats have their sign bit rotated into the low bit so the exponent
//   lands in the leading byte columns.
// - Referent arrays store deltas, not ids.
//
// The file stores property values column-major; the API exposes them
// row-major, one value list per instance. The pivot happens once, after
// all records are read: property columns are scattered into instances,
// referent columns become object links, and every instance gets a
// synthesised `Parent` link as its final property. Object links are ids
// into the file's instance arena, which keeps the graph free of ownership
// cycles; `File::target` turns them into references on demand.

mod chunk;
mod class;
mod cursor;
mod error;
mod file;
mod parent;
mod prop;
mod value;


pub use class::ClassDef;
pub use error::{DecodeError, Result, Warning};
pub use file::{decode, File, Instance};
pub use prop::PropDef;
pub use value::{CFrame, Color3, Ref, UDim, UDim2, Value, ValueKind, Vector2, Vector3};

pub use rbxfile_base::ByteStr;
