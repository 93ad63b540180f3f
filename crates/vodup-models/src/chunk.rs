//! Chunk addressing and split math.
//!
//! A chunk is one contiguous byte range of a source file, addressed by
//! `(fileName, chunkIndex)`. Chunks live in the object store only between
//! upload and reassembly; the key format below is the contract shared by the
//! uploader, the API and the storage layer.

use serde::{Deserialize, Serialize};

/// Default chunk size: 4 MiB.
///
/// Sized to stay under the request-body ceiling of common hosting platforms
/// and proxies. The server derives its body limit from this constant; clients
/// may choose a smaller size but never a larger one.
pub const CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Marker embedded between file name and index in chunk keys.
///
/// Upload file names must never contain this marker, otherwise a final object
/// key could collide with a chunk key.
pub const CHUNK_KEY_MARKER: &str = ".chunk.";

/// Storage key for one chunk of a named file.
pub fn chunk_key(file_name: &str, chunk_index: u32) -> String {
    format!("{}{}{}", file_name, CHUNK_KEY_MARKER, chunk_index)
}

/// Number of chunks needed to cover `file_size` bytes.
///
/// Returns 0 for an empty file; callers reject empty uploads before this.
/// `chunk_size` must be at least 1, enforced where the size enters the
/// system.
pub fn chunk_count(file_size: u64, chunk_size: usize) -> u32 {
    let chunk_size = chunk_size as u64;
    ((file_size + chunk_size - 1) / chunk_size) as u32
}

/// Client-held description of one chunked upload.
///
/// Derived once at split time and threaded through every request of the
/// sequence; never persisted server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadDescriptor {
    /// Upload file name, derived once as `"{unix_millis}-{originalName}"`.
    pub file_name: String,
    /// Total size of the source file in bytes.
    pub file_size: u64,
    /// Chunk size the file was split with.
    pub chunk_size: usize,
    /// `ceil(file_size / chunk_size)`.
    pub total_chunks: u32,
}

impl UploadDescriptor {
    /// Build a descriptor for a file of `file_size` bytes.
    pub fn new(file_name: impl Into<String>, file_size: u64, chunk_size: usize) -> Self {
        Self {
            file_name: file_name.into(),
            file_size,
            chunk_size,
            total_chunks: chunk_count(file_size, chunk_size),
        }
    }

    /// Byte range `(offset, length)` of one chunk, or `None` past the end.
    ///
    /// Every chunk is exactly `chunk_size` bytes except the last, which
    /// carries the remainder.
    pub fn chunk_range(&self, chunk_index: u32) -> Option<(u64, usize)> {
        if chunk_index >= self.total_chunks {
            return None;
        }
        let offset = chunk_index as u64 * self.chunk_size as u64;
        let len = (self.file_size - offset).min(self.chunk_size as u64) as usize;
        Some((offset, len))
    }

    /// Storage key of one chunk of this upload.
    pub fn chunk_key(&self, chunk_index: u32) -> String {
        chunk_key(&self.file_name, chunk_index)
    }

    /// All chunk keys of this upload, in index order.
    pub fn chunk_keys(&self) -> Vec<String> {
        (0..self.total_chunks).map(|i| self.chunk_key(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_key_format() {
        assert_eq!(chunk_key("1700000000000-video.mp4", 0), "1700000000000-video.mp4.chunk.0");
        assert_eq!(chunk_key("a", 12), "a.chunk.12");
    }

    #[test]
    fn test_chunk_count() {
        assert_eq!(chunk_count(0, CHUNK_SIZE), 0);
        assert_eq!(chunk_count(1, CHUNK_SIZE), 1);
        assert_eq!(chunk_count(CHUNK_SIZE as u64, CHUNK_SIZE), 1);
        assert_eq!(chunk_count(CHUNK_SIZE as u64 + 1, CHUNK_SIZE), 2);
        // 10 MiB at 4 MiB chunks splits 4+4+2
        assert_eq!(chunk_count(10 * 1024 * 1024, CHUNK_SIZE), 3);
    }

    #[test]
    fn test_chunk_ranges() {
        let desc = UploadDescriptor::new("f", 10 * 1024 * 1024, CHUNK_SIZE);
        assert_eq!(desc.total_chunks, 3);
        assert_eq!(desc.chunk_range(0), Some((0, CHUNK_SIZE)));
        assert_eq!(desc.chunk_range(1), Some((CHUNK_SIZE as u64, CHUNK_SIZE)));
        assert_eq!(
            desc.chunk_range(2),
            Some((2 * CHUNK_SIZE as u64, 2 * 1024 * 1024))
        );
        assert_eq!(desc.chunk_range(3), None);
    }

    #[test]
    fn test_ranges_cover_file_exactly() {
        let desc = UploadDescriptor::new("f", 7_340_033, 1024 * 1024);
        let mut covered = 0u64;
        for i in 0..desc.total_chunks {
            let (offset, len) = desc.chunk_range(i).unwrap();
            assert_eq!(offset, covered);
            covered += len as u64;
        }
        assert_eq!(covered, desc.file_size);
    }

    #[test]
    fn test_chunk_keys_in_index_order() {
        let desc = UploadDescriptor::new("v.mp4", 3, 1);
        assert_eq!(
            desc.chunk_keys(),
            vec!["v.mp4.chunk.0", "v.mp4.chunk.1", "v.mp4.chunk.2"]
        );
    }
}
