// Umbrella crate: re-exports the decoder and its companion tools under one
// name. The binary target in this crate is the command-line front end; it
// is not assumed to be the only user of these libraries.

pub use rbxfile_base as base;
pub use rbxfile_fmt as fmt;
pub use rbxfile_terrain as terrain;
pub use rbxfile_xml as xml;

pub use rbxfile_fmt::{decode, DecodeError, File, Instance, Value, ValueKind};
