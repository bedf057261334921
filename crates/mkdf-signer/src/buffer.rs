//! Fixed-capacity message buffer.

use mkdf_proto::MAX_MESSAGE_SIZE;

use crate::error::BufferError;

/// Bytes of the message being loaded for signing.
///
/// Appends that would exceed the capacity are rejected whole; nothing is
/// ever truncated.
#[derive(Clone)]
pub struct MessageBuffer {
    bytes: [u8; MAX_MESSAGE_SIZE],
    len: usize,
}

impl MessageBuffer {
    /// Capacity in bytes
    pub const CAPACITY: usize = MAX_MESSAGE_SIZE;

    /// Empty buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self { bytes: [0; MAX_MESSAGE_SIZE], len: 0 }
    }

    /// Append `data` after the buffered bytes.
    ///
    /// # Errors
    ///
    /// - `BufferError::Overflow` if the result would not fit. The buffer is
    ///   left unchanged.
    pub fn append(&mut self, data: &[u8]) -> Result<(), BufferError> {
        let overflow =
            BufferError::Overflow { len: self.len, extra: data.len(), capacity: Self::CAPACITY };

        let end = self.len.checked_add(data.len()).ok_or(overflow)?;
        let slot = self.bytes.get_mut(self.len..end).ok_or(overflow)?;
        slot.copy_from_slice(data);
        self.len = end;
        Ok(())
    }

    /// Discard and zero the buffered bytes.
    pub fn clear(&mut self) {
        self.bytes[..self.len].fill(0);
        self.len = 0;
    }

    /// Buffered bytes
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Number of buffered bytes
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether nothing is buffered
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for MessageBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for MessageBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MessageBuffer").field("len", &self.len).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn fills_to_capacity_exactly() {
        let mut buffer = MessageBuffer::new();
        let chunk = [0xab; 128];
        for _ in 0..MessageBuffer::CAPACITY / chunk.len() {
            buffer.append(&chunk).unwrap();
        }
        assert_eq!(buffer.len(), MessageBuffer::CAPACITY);

        assert_eq!(
            buffer.append(&[1]),
            Err(BufferError::Overflow { len: 4096, extra: 1, capacity: 4096 })
        );
        assert_eq!(buffer.len(), MessageBuffer::CAPACITY);
    }

    #[test]
    fn overflow_leaves_contents_intact() {
        let mut buffer = MessageBuffer::new();
        buffer.append(b"hello").unwrap();
        assert!(buffer.append(&[0u8; MessageBuffer::CAPACITY]).is_err());
        assert_eq!(buffer.as_slice(), b"hello");
    }

    #[test]
    fn clear_zeroes_previous_bytes() {
        let mut buffer = MessageBuffer::new();
        buffer.append(b"secret message").unwrap();
        buffer.clear();
        assert!(buffer.is_empty());
        assert!(buffer.bytes.iter().all(|b| *b == 0));
    }

    proptest! {
        #[test]
        fn appends_concatenate_or_reject(
            chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..600), 0..16),
        ) {
            let mut buffer = MessageBuffer::new();
            let mut expected = Vec::new();
            for chunk in &chunks {
                match buffer.append(chunk) {
                    Ok(()) => expected.extend_from_slice(chunk),
                    Err(_) => prop_assert!(expected.len() + chunk.len() > MessageBuffer::CAPACITY),
                }
            }
            prop_assert_eq!(buffer.as_slice(), &expected[..]);
        }
    }
}
