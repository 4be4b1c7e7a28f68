//! Little-endian byte helpers shared by every summary record.
//!
//! ```text
//! Summary record  ::= type_code:u8  payload
//! Nothing          ::= (no payload)
//! Categorical      ::= count:u32 categories:u32 [count_per_category:f64]*
//! Gaussian         ::= count:u32 mean:f64 variance:f64
//! BiGaussian       ::= count:u32 mean0:f64 mean1:f64 cov00:f64 cov01:f64 cov11:f64
//! SummarySet       ::= feature_count:u32 Summary record x feature_count
//! ```

use crate::error::SummaryError;

pub(crate) const U32_LEN: usize = 4;
pub(crate) const F64_LEN: usize = 8;

/// Cursor over a borrowed byte buffer that fails with
/// [`SummaryError::CorruptData`] instead of reading past the end.
pub(crate) struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes consumed so far.
    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    /// Bytes still available.
    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], SummaryError> {
        if self.remaining() < N {
            return Err(SummaryError::CorruptData {
                offset: self.pos,
                reason: format!("needed {N} bytes, {} left", self.remaining()),
            });
        }
        let bytes: [u8; N] = self.buf[self.pos..self.pos + N]
            .try_into()
            .map_err(|_| SummaryError::CorruptData {
                offset: self.pos,
                reason: format!("needed {N} bytes"),
            })?;
        self.pos += N;
        Ok(bytes)
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, SummaryError> {
        Ok(self.take::<1>()?[0])
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32, SummaryError> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    pub(crate) fn read_f64(&mut self) -> Result<f64, SummaryError> {
        Ok(f64::from_le_bytes(self.take()?))
    }

    /// Build a `CorruptData` error at the current position.
    pub(crate) fn corrupt(&self, reason: impl Into<String>) -> SummaryError {
        SummaryError::CorruptData {
            offset: self.pos,
            reason: reason.into(),
        }
    }
}

pub(crate) fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub(crate) fn put_f64(out: &mut Vec<u8>, value: f64) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Convert a row or feature count to the on-disk `u32`, saturating.
pub(crate) fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian() {
        let mut out = Vec::new();
        out.push(b'G');
        put_u32(&mut out, 7);
        put_f64(&mut out, -1.25);
        assert_eq!(out.len(), 1 + U32_LEN + F64_LEN);
        assert_eq!(&out[1..5], &[7, 0, 0, 0]);

        let mut reader = ByteReader::new(&out);
        assert_eq!(reader.read_u8().unwrap(), b'G');
        assert_eq!(reader.read_u32().unwrap(), 7);
        assert_eq!(reader.read_f64().unwrap().to_bits(), (-1.25f64).to_bits());
        assert_eq!(reader.position(), out.len());
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn short_read_reports_offset() {
        let buf = [1u8, 2, 3];
        let mut reader = ByteReader::new(&buf);
        reader.read_u8().unwrap();
        let err = reader.read_u32().unwrap_err();
        assert!(matches!(err, SummaryError::CorruptData { offset: 1, .. }));
        // A failed read does not advance.
        assert_eq!(reader.position(), 1);
    }

    #[test]
    fn count_saturates() {
        assert_eq!(count_u32(5), 5);
        assert_eq!(count_u32(usize::MAX), u32::MAX);
    }
}
