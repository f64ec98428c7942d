use crate::chunk_header::Chunk;
use crate::err::DecodeResult;

use log::debug;
use serde::Serialize;

/// The `XmlResourceMap` chunk: Android resource ids for the leading string pool entries.
///
/// Entry `i` annotates string `i` (typically attribute names such as `versionCode`, which
/// resolve to `0x0101021b`). The map is usually shorter than the pool; strings past its end
/// have no resource id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceMap(Vec<u32>);

impl ResourceMap {
    pub(crate) fn from_chunk(chunk: &Chunk<'_>, string_count: usize) -> DecodeResult<Self> {
        let mut body = chunk.body;
        let count = body.remaining() / 4;
        if body.remaining() % 4 != 0 {
            debug!(
                "Resource map at {} has {} trailing bytes",
                chunk.header.offset,
                body.remaining() % 4
            );
        }

        let ids = body.u32_table(count, "resource map entries")?;
        if ids.len() > string_count {
            debug!(
                "Resource map has {} entries for a pool of {} strings",
                ids.len(),
                string_count
            );
        }

        Ok(ResourceMap(ids))
    }

    /// Resource id of the string at `index`, if the map covers it.
    pub fn get(&self, index: u32) -> Option<u32> {
        self.0.get(index as usize).copied()
    }

    pub fn ids(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
