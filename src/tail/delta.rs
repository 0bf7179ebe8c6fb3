use std::{
    fs::File,
    io::{Read, Seek, SeekFrom},
    path::Path,
};

use crate::{
    error::{Result, TailError},
    tail::offset::OffsetPair,
};

/// Text read from one delta region during a single tick.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextChunk {
    /// Byte offset the text was read from.
    pub offset: u64,
    pub text: String,
}

impl TextChunk {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Offset just past the last byte decoded into this chunk.
    pub fn end(&self) -> u64 {
        self.offset + self.text.len() as u64
    }
}

/// Reads appended regions of a file. The file is opened for every read and
/// closed before returning, so no handle outlives a tick.
///
/// `File::open` never asks for exclusive access, so writers are not blocked.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeltaReader;

impl DeltaReader {
    /// Everything from `offset` to the end of the file. An offset past the end
    /// (the file shrank since it was measured) yields an empty chunk.
    ///
    /// A character cut off at the end of the region (the writer flushed in the
    /// middle of it) is left out of the chunk; `TextChunk::end` then stops
    /// before it so the caller can read it again once complete.
    pub fn read_from(&self, path: &Path, offset: u64) -> Result<TextChunk> {
        self.read_region(path, offset, None)
    }

    /// Exactly the bytes between the two lengths of `pair`. Bytes appended
    /// after `pair.current` was measured are left for the next tick.
    pub fn read_between(&self, path: &Path, pair: OffsetPair) -> Result<TextChunk> {
        if pair.delta_len() == 0 {
            return Ok(TextChunk {
                offset: pair.previous,
                text: String::new(),
            });
        }
        self.read_region(path, pair.previous, Some(pair.delta_len()))
    }

    fn read_region(&self, path: &Path, offset: u64, limit: Option<u64>) -> Result<TextChunk> {
        let read_err = |source| TailError::Read {
            path: path.to_path_buf(),
            offset,
            source,
        };

        let mut file = File::open(path).map_err(read_err)?;
        file.seek(SeekFrom::Start(offset)).map_err(read_err)?;

        let mut bytes = Vec::new();
        match limit {
            Some(limit) => file.take(limit).read_to_end(&mut bytes),
            None => file.read_to_end(&mut bytes),
        }
        .map_err(read_err)?;

        let decode_err = |source| TailError::Decode {
            path: path.to_path_buf(),
            offset,
            source,
        };

        let valid = match std::str::from_utf8(&bytes) {
            Ok(text) => text.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(e) => return Err(decode_err(e)),
        };
        bytes.truncate(valid);
        let text = String::from_utf8(bytes).map_err(|e| decode_err(e.utf8_error()))?;

        Ok(TextChunk { offset, text })
    }
}
