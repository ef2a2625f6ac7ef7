//! Byte-oriented wire primitives shared by the full and delta codecs.

mod error;
mod reader;
mod writer;

pub use error::SerdeErr;
pub use reader::ByteReader;
pub use writer::ByteWriter;
