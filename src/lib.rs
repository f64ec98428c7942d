//! Decoder for Android binary XML (`AndroidManifest.xml` and compiled layouts inside an APK).
//!
//! ```
//! let doc = axml::decode(&[0x03, 0x00, 0x08, 0x00]);
//! assert!(doc.is_err());
//! ```
#![deny(unused_must_use)]
#![forbid(unsafe_code)]

pub use axml_parser::{
    AXML_MAGIC, AxmlParser, DEFAULT_MAX_DEPTH, DecoderSettings, decode, decode_many,
    decode_with_settings,
};
pub use chunk_header::{ChunkHeader, ChunkType};
pub use document::{ANDROID_NAMESPACE_URI, ManifestDocument};
pub use err::{AxmlError, DecodeResult, ErrorKind};
pub use model::{Attribute, CData, Element, Namespace};
pub use resource_map::ResourceMap;
pub use string_pool::{NO_ENTRY, StringPool, StringPoolFlags, StringPoolHeader, StyleSpan};
pub use value::{DataType, DimensionUnit, FractionUnit, ResourceValue, TypedValue};
pub use visitor::{Elements, Visitor};

mod axml_parser;
mod chunk_header;
mod document;
pub mod err;
mod model;
mod resource_map;
mod string_pool;
mod tree_builder;
mod utils;
mod value;
mod visitor;

#[cfg(test)]
mod tests;

#[cfg(test)]
use std::sync::Once;

#[cfg(test)]
static LOGGER_INIT: Once = Once::new();

// Rust runs the tests concurrently, so unless we synchronize logging access
// it will crash when attempting to run `cargo test` with some logging facilities.
#[cfg(test)]
pub fn ensure_env_logger_initialized() {
    use std::io::Write;

    LOGGER_INIT.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        builder
            .format(|buf, record| writeln!(buf, "[{}] - {}", record.level(), record.args()))
            .init();
    });
}
