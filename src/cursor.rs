//! Bounds-checked cursor over a raw identification blob.
//!
//! Every read primitive re-validates against the slice length, so a length
//! field lying about its payload can never walk a read past the end of the
//! caller's buffer. Sub-cursors narrow the budget to a declared block length
//! after that length has been validated.

use crate::error::{EdidError, Result};

#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let b = *self.data.get(self.pos).ok_or(EdidError::Truncated {
            offset: self.pos,
            needed: 1,
        })?;
        self.pos += 1;
        Ok(b)
    }

    pub fn read_u16_le(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u24_le(&mut self) -> Result<u32> {
        let b = self.take(3)?;
        Ok(u32::from(b[0]) | (u32::from(b[1]) << 8) | (u32::from(b[2]) << 16))
    }

    /// Borrow the next `n` bytes and advance past them.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).ok_or(EdidError::Truncated {
            offset: self.pos,
            needed: n,
        })?;
        let slice = self.data.get(self.pos..end).ok_or(EdidError::Truncated {
            offset: self.pos,
            needed: n.saturating_sub(self.remaining()),
        })?;
        self.pos = end;
        Ok(slice)
    }

    /// Fixed-size variant of [`take`](Self::take).
    pub fn take_array<const N: usize>(&mut self) -> Result<&'a [u8; N]> {
        let slice = self.take(N)?;
        // take(N) already guarantees the length.
        slice.try_into().map_err(|_| EdidError::Truncated {
            offset: self.pos,
            needed: N,
        })
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    /// Validate a declared length against the remaining budget and return the
    /// sub-slice it covers, advancing past it. This is the only way a block
    /// walk is allowed to honor a length field.
    pub fn take_declared(&mut self, declared: usize) -> Result<&'a [u8]> {
        if declared > self.remaining() {
            return Err(EdidError::BadLength {
                offset: self.pos,
                declared,
                available: self.remaining(),
            });
        }
        self.take(declared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_and_advances() {
        let mut c = Cursor::new(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
        assert_eq!(c.read_u8().unwrap(), 0x01);
        assert_eq!(c.read_u16_le().unwrap(), 0x0302);
        assert_eq!(c.read_u24_le().unwrap(), 0x060504);
        assert!(c.is_empty());
    }

    #[test]
    fn truncated_read_reports_offset() {
        let mut c = Cursor::new(&[0xAA]);
        c.read_u8().unwrap();
        let err = c.read_u16_le().unwrap_err();
        assert_eq!(
            err,
            EdidError::Truncated {
                offset: 1,
                needed: 2
            }
        );
    }

    #[test]
    fn declared_length_beyond_budget_is_rejected() {
        let mut c = Cursor::new(&[0u8; 4]);
        let err = c.take_declared(9).unwrap_err();
        assert_eq!(
            err,
            EdidError::BadLength {
                offset: 0,
                declared: 9,
                available: 4
            }
        );
        // The cursor did not move, so a best-effort caller can still skip.
        assert_eq!(c.position(), 0);
    }
}
