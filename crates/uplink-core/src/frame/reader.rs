use super::error::CursorError;
use super::layout;
use crate::profile::Tag;

/// Forward-only reader over an untrusted frame.
///
/// Reads borrow from the backing slice; the position only ever moves
/// forward and out-of-range reads report [`CursorError::Underrun`] instead of
/// panicking.
///
/// # Examples
/// ```
/// use uplink_core::frame::ByteCursor;
///
/// let bytes = [0x01, 0x75, 0x64];
/// let mut cursor = ByteCursor::new(&bytes);
/// let tag = cursor.peek_tag().unwrap();
/// assert_eq!((tag.channel, tag.kind), (0x01, 0x75));
/// assert_eq!(cursor.advance(2).unwrap(), &[0x01, 0x75]);
/// assert_eq!(cursor.remaining(), 1);
/// assert!(cursor.advance(2).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.position)
    }

    pub fn require(&self, needed: usize) -> Result<(), CursorError> {
        let actual = self.remaining();
        if actual < needed {
            return Err(CursorError::Underrun { needed, actual });
        }
        Ok(())
    }

    /// Read the tag at the current position without consuming it.
    pub fn peek_tag(&self) -> Result<Tag, CursorError> {
        self.require(layout::TAG_LEN)?;
        let channel = self.byte_at(layout::CHANNEL_OFFSET)?;
        let kind = self.byte_at(layout::TYPE_OFFSET)?;
        Ok(Tag::new(channel, kind))
    }

    /// Consume `n` bytes and return them.
    pub fn advance(&mut self, n: usize) -> Result<&'a [u8], CursorError> {
        self.require(n)?;
        let end = self.position + n;
        let consumed = self
            .bytes
            .get(self.position..end)
            .ok_or(CursorError::Underrun {
                needed: n,
                actual: self.remaining(),
            })?;
        self.position = end;
        Ok(consumed)
    }

    fn byte_at(&self, offset: usize) -> Result<u8, CursorError> {
        self.bytes
            .get(self.position + offset)
            .copied()
            .ok_or(CursorError::Underrun {
                needed: offset + 1,
                actual: self.remaining(),
            })
    }
}
