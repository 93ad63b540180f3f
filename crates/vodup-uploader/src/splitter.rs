//! Client-side chunk splitting.

use std::io::SeekFrom;
use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::debug;

use vodup_models::{timestamped_file_name, UploadDescriptor};

use crate::error::{UploadError, UploadResult};

/// Splits a source file into fixed-size chunks.
///
/// The upload file name is derived once at open time and stays fixed for the
/// whole sequence. Chunks are read on demand, so only one chunk buffer is
/// resident at a time.
#[derive(Debug)]
pub struct ChunkSplitter {
    file: File,
    descriptor: UploadDescriptor,
}

impl ChunkSplitter {
    /// Open `path` and derive the upload descriptor for it.
    ///
    /// Empty files and a zero chunk size are rejected; a zero-chunk upload
    /// can never be reassembled, and the split math needs a positive divisor.
    pub async fn open(path: impl AsRef<Path>, chunk_size: usize) -> UploadResult<Self> {
        if chunk_size == 0 {
            return Err(UploadError::InvalidChunkSize);
        }
        let path = path.as_ref();
        let original_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| UploadError::InvalidPath(path.display().to_string()))?;

        let file = File::open(path).await?;
        let file_size = file.metadata().await?.len();
        if file_size == 0 {
            return Err(UploadError::EmptyFile(path.display().to_string()));
        }

        let descriptor =
            UploadDescriptor::new(timestamped_file_name(original_name), file_size, chunk_size);
        debug!(
            "Splitting {} ({} bytes) into {} chunks of {} bytes",
            original_name, file_size, descriptor.total_chunks, chunk_size
        );

        Ok(Self { file, descriptor })
    }

    pub fn descriptor(&self) -> &UploadDescriptor {
        &self.descriptor
    }

    /// Read the bytes of one chunk.
    pub async fn read_chunk(&mut self, chunk_index: u32) -> UploadResult<Vec<u8>> {
        let (offset, len) = self.descriptor.chunk_range(chunk_index).ok_or(
            UploadError::ChunkOutOfRange {
                chunk_index,
                total_chunks: self.descriptor.total_chunks,
            },
        )?;

        self.file.seek(SeekFrom::Start(offset)).await?;
        let mut buf = vec![0u8; len];
        self.file.read_exact(&mut buf).await?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn temp_file_with(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(bytes).unwrap();
        f.flush().unwrap();
        f
    }

    #[tokio::test]
    async fn test_split_covers_file_exactly() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 253) as u8).collect();
        let file = temp_file_with(&data);

        let mut splitter = ChunkSplitter::open(file.path(), 4096).await.unwrap();
        let descriptor = splitter.descriptor().clone();
        assert_eq!(descriptor.total_chunks, 3);
        assert_eq!(descriptor.file_size, 10_000);

        let mut reassembled = Vec::new();
        for i in 0..descriptor.total_chunks {
            let chunk = splitter.read_chunk(i).await.unwrap();
            let expected_len = if i == 2 { 10_000 - 2 * 4096 } else { 4096 };
            assert_eq!(chunk.len(), expected_len);
            reassembled.extend_from_slice(&chunk);
        }
        assert_eq!(reassembled, data);
    }

    #[tokio::test]
    async fn test_out_of_range_chunk() {
        let file = temp_file_with(b"abc");
        let mut splitter = ChunkSplitter::open(file.path(), 2).await.unwrap();
        assert_eq!(splitter.descriptor().total_chunks, 2);

        let err = splitter.read_chunk(2).await.unwrap_err();
        assert!(matches!(
            err,
            UploadError::ChunkOutOfRange {
                chunk_index: 2,
                total_chunks: 2
            }
        ));
    }

    #[tokio::test]
    async fn test_zero_chunk_size_rejected() {
        let file = temp_file_with(b"abc");
        let err = ChunkSplitter::open(file.path(), 0).await.unwrap_err();
        assert!(matches!(err, UploadError::InvalidChunkSize));
    }

    #[tokio::test]
    async fn test_empty_file_rejected() {
        let file = temp_file_with(b"");
        let err = ChunkSplitter::open(file.path(), 4096).await.unwrap_err();
        assert!(matches!(err, UploadError::EmptyFile(_)));
    }

    #[tokio::test]
    async fn test_file_name_is_timestamped_original() {
        let data = vec![1u8; 10];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, &data).unwrap();

        let splitter = ChunkSplitter::open(&path, 4).await.unwrap();
        assert!(splitter.descriptor().file_name.ends_with("-clip.mp4"));
    }
}
