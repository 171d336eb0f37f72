mod bytestr;
mod error;

pub use bytestr::ByteStr;
pub use error::{err, Error, Result};
