//! TFRecord container framing.
//!
//! Each record is laid out as:
//!
//! ```text
//! u64  length            (little endian)
//! u32  masked_crc32c(length bytes)
//! [u8] payload           (length bytes)
//! u32  masked_crc32c(payload)
//! ```

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::encode::EncodedRecord;
use crate::error::ConvertError;

const MASK_DELTA: u32 = 0xa282_ead8;
const HEADER_LEN: u64 = 12;
const FOOTER_LEN: u64 = 4;

/// CRC32-C with the rotation and offset TensorFlow applies to stored checksums.
pub fn masked_crc32c(data: &[u8]) -> u32 {
    crc32c::crc32c(data).rotate_right(15).wrapping_add(MASK_DELTA)
}

/// Sequential writer for a TFRecord file.
///
/// Call [`TfRecordWriter::close`] to flush and sync. If the writer is
/// dropped without being closed (for example because an earlier step
/// failed), buffered data is still flushed on a best-effort basis.
pub struct TfRecordWriter {
    path: PathBuf,
    inner: Option<BufWriter<File>>,
    records: usize,
}

impl TfRecordWriter {
    /// Create or truncate `path`.
    pub fn create(path: &Path) -> Result<Self, ConvertError> {
        let file = File::create(path).map_err(|source| ConvertError::OutputOpen {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            inner: Some(BufWriter::new(file)),
            records: 0,
        })
    }

    /// Append one framed record.
    pub fn append(&mut self, record: &EncodedRecord) -> Result<(), ConvertError> {
        self.write_payload(record.as_bytes())
    }

    /// Append one framed record from raw payload bytes.
    pub fn write_payload(&mut self, payload: &[u8]) -> Result<(), ConvertError> {
        let out = self.inner.as_mut().ok_or_else(|| {
            ConvertError::Io(std::io::Error::other("record writer already closed"))
        })?;

        let len = (payload.len() as u64).to_le_bytes();
        out.write_all(&len)?;
        out.write_all(&masked_crc32c(&len).to_le_bytes())?;
        out.write_all(payload)?;
        out.write_all(&masked_crc32c(payload).to_le_bytes())?;

        self.records += 1;
        debug!(path = %self.path.display(), bytes = payload.len(), index = self.records, "appended record");
        Ok(())
    }

    /// Flush, sync and release the file. Returns the number of records written.
    pub fn close(mut self) -> Result<usize, ConvertError> {
        if let Some(out) = self.inner.take() {
            let file = out.into_inner().map_err(|err| ConvertError::Io(err.into_error()))?;
            file.sync_all()?;
        }
        Ok(self.records)
    }
}

impl Drop for TfRecordWriter {
    fn drop(&mut self) {
        if let Some(out) = self.inner.as_mut() {
            let _ = out.flush();
        }
    }
}

/// Sequential reader over the payloads of a TFRecord file.
///
/// Both checksums of every frame are verified.
pub struct TfRecordReader<R> {
    path: PathBuf,
    inner: R,
    offset: u64,
}

impl TfRecordReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, ConvertError> {
        let file = File::open(path).map_err(ConvertError::Io)?;
        Ok(Self::new(path, BufReader::new(file)))
    }
}

impl<R: Read> TfRecordReader<R> {
    /// Wrap any reader. `path` is only used in error messages.
    pub fn new(path: impl Into<PathBuf>, inner: R) -> Self {
        Self {
            path: path.into(),
            inner,
            offset: 0,
        }
    }

    /// Read the next payload, or `None` at a clean end of file.
    pub fn next_payload(&mut self) -> Result<Option<Vec<u8>>, ConvertError> {
        let mut header = [0u8; HEADER_LEN as usize];
        let got = read_full(&mut self.inner, &mut header)?;
        if got == 0 {
            return Ok(None);
        }
        if got < header.len() {
            return Err(self.corrupt("truncated record header"));
        }

        let (len_bytes, len_crc) = header.split_at(8);
        let expected = u32::from_le_bytes([len_crc[0], len_crc[1], len_crc[2], len_crc[3]]);
        if masked_crc32c(len_bytes) != expected {
            return Err(self.corrupt("length checksum mismatch"));
        }

        let len = u64::from_le_bytes([
            len_bytes[0],
            len_bytes[1],
            len_bytes[2],
            len_bytes[3],
            len_bytes[4],
            len_bytes[5],
            len_bytes[6],
            len_bytes[7],
        ]);
        let len = usize::try_from(len).map_err(|_| self.corrupt("record length too large"))?;

        let mut payload = Vec::new();
        (&mut self.inner)
            .take(len as u64)
            .read_to_end(&mut payload)?;
        if payload.len() < len {
            return Err(self.corrupt("truncated record payload"));
        }

        let mut footer = [0u8; FOOTER_LEN as usize];
        if read_full(&mut self.inner, &mut footer)? < footer.len() {
            return Err(self.corrupt("truncated record footer"));
        }
        if masked_crc32c(&payload) != u32::from_le_bytes(footer) {
            return Err(self.corrupt("payload checksum mismatch"));
        }

        self.offset += HEADER_LEN + len as u64 + FOOTER_LEN;
        Ok(Some(payload))
    }

    fn corrupt(&self, message: &str) -> ConvertError {
        ConvertError::CorruptRecord {
            path: self.path.clone(),
            offset: self.offset,
            message: message.to_string(),
        }
    }
}

impl<R: Read> Iterator for TfRecordReader<R> {
    type Item = Result<Vec<u8>, ConvertError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_payload().transpose()
    }
}

/// Read every payload of a TFRecord file.
pub fn read_tfrecord_file(path: &Path) -> Result<Vec<Vec<u8>>, ConvertError> {
    TfRecordReader::open(path)?.collect()
}

/// Remove a partially written container, ignoring a file that is already gone.
pub fn remove_partial(path: &Path) -> Result<(), ConvertError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(ConvertError::Io(err)),
    }
}

/// Fill `buf` as far as possible, returning how many bytes were read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, ConvertError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(ConvertError::Io(err)),
        }
    }
    Ok(filled)
}
