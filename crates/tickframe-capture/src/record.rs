use std::io::{ErrorKind, Read, Write};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{CaptureError, Result};

/// Record header: chunk length (2 bytes, little-endian).
pub const RECORD_HEADER_SIZE: usize = 2;

/// Longest chunk a single record can hold.
pub const MAX_RECORD_LEN: usize = u16::MAX as usize;

/// Appends serial chunks to a capture.
pub struct CaptureWriter<W> {
    inner: W,
    buf: BytesMut,
    records: u64,
    bytes: u64,
}

impl<W: Write> CaptureWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(RECORD_HEADER_SIZE + 256),
            records: 0,
            bytes: 0,
        }
    }

    /// Record one chunk as delivered by the byte source.
    ///
    /// Chunks longer than [`MAX_RECORD_LEN`] are stored as several
    /// consecutive records. An empty chunk produces one empty record.
    pub fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        if chunk.is_empty() {
            return self.write_record(chunk);
        }
        for piece in chunk.chunks(MAX_RECORD_LEN) {
            self.write_record(piece)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush().map_err(CaptureError::Io)
    }

    /// Records written so far.
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Chunk bytes written so far, excluding record headers.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    fn write_record(&mut self, piece: &[u8]) -> Result<()> {
        self.buf.clear();
        self.buf.reserve(RECORD_HEADER_SIZE + piece.len());
        self.buf.put_u16_le(piece.len() as u16);
        self.buf.put_slice(piece);
        self.inner.write_all(&self.buf)?;

        self.records += 1;
        self.bytes += piece.len() as u64;
        Ok(())
    }
}

/// Replays the chunks stored in a capture.
pub struct CaptureReader<R> {
    inner: R,
    records: u64,
    bytes: u64,
}

impl<R: Read> CaptureReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            records: 0,
            bytes: 0,
        }
    }

    /// Read the next recorded chunk.
    ///
    /// Returns `Ok(None)` when the capture ends on a record boundary.
    pub fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        let mut header = [0u8; RECORD_HEADER_SIZE];
        let got = self.fill(&mut header)?;
        if got == 0 {
            return Ok(None);
        }
        if got < RECORD_HEADER_SIZE {
            return Err(CaptureError::Truncated {
                expected: RECORD_HEADER_SIZE,
                got,
            });
        }

        let len = u16::from_le_bytes(header) as usize;
        let mut chunk = BytesMut::zeroed(len);
        let got = self.fill(&mut chunk)?;
        if got < len {
            tracing::warn!(expected = len, got, "capture ends inside a record");
            return Err(CaptureError::Truncated { expected: len, got });
        }

        self.records += 1;
        self.bytes += len as u64;
        Ok(Some(chunk.freeze()))
    }

    /// Records read so far.
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Chunk bytes read so far, excluding record headers.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    // Reads until `buf` is full or EOF; returns the count filled.
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0usize;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(CaptureError::Io(err)),
            }
        }
        Ok(filled)
    }
}

impl<R: Read> Iterator for CaptureReader<R> {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_chunk().transpose()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn capture(chunks: &[&[u8]]) -> Vec<u8> {
        let mut writer = CaptureWriter::new(Vec::new());
        for chunk in chunks {
            writer.write_chunk(chunk).unwrap();
        }
        writer.into_inner()
    }

    #[test]
    fn record_layout_is_length_prefixed_le() {
        let bytes = capture(&[&[0xAA, 0xBB, 0xCC]]);
        assert_eq!(bytes, vec![0x03, 0x00, 0xAA, 0xBB, 0xCC]);
    }

    #[test]
    fn replays_chunk_boundaries() {
        let bytes = capture(&[&[1, 2], &[], &[3, 4, 5]]);
        let reader = CaptureReader::new(Cursor::new(bytes));
        let chunks: Vec<Vec<u8>> = reader.map(|c| c.unwrap().to_vec()).collect();

        assert_eq!(chunks, vec![vec![1, 2], vec![], vec![3, 4, 5]]);
    }

    #[test]
    fn long_chunk_is_split_over_records() {
        let long = vec![0x5A; MAX_RECORD_LEN + 10];
        let mut writer = CaptureWriter::new(Vec::new());
        writer.write_chunk(&long).unwrap();
        assert_eq!(writer.records(), 2);
        assert_eq!(writer.bytes(), long.len() as u64);

        let mut reader = CaptureReader::new(Cursor::new(writer.into_inner()));
        assert_eq!(reader.next_chunk().unwrap().unwrap().len(), MAX_RECORD_LEN);
        assert_eq!(reader.next_chunk().unwrap().unwrap().len(), 10);
        assert!(reader.next_chunk().unwrap().is_none());
        assert_eq!(reader.records(), 2);
    }

    #[test]
    fn truncated_body_is_reported() {
        let mut bytes = capture(&[&[1, 2, 3, 4]]);
        bytes.truncate(4);

        let mut reader = CaptureReader::new(Cursor::new(bytes));
        let err = reader.next_chunk().unwrap_err();
        assert!(matches!(
            err,
            CaptureError::Truncated {
                expected: 4,
                got: 2
            }
        ));
    }

    #[test]
    fn truncated_header_is_reported() {
        let mut reader = CaptureReader::new(Cursor::new(vec![0x05]));
        let err = reader.next_chunk().unwrap_err();
        assert!(matches!(
            err,
            CaptureError::Truncated {
                expected: 2,
                got: 1
            }
        ));
    }

    #[test]
    fn empty_capture_has_no_chunks() {
        let mut reader = CaptureReader::new(Cursor::new(Vec::new()));
        assert!(reader.next_chunk().unwrap().is_none());
        assert_eq!(reader.bytes(), 0);
    }
}
