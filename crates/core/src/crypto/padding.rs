//! PKCS#7 padding.
//!
//! `pad` always appends between 1 and `block_size` bytes, each holding the
//! pad length, so an input that is already block-aligned still gains a full
//! block. That keeps `unpad` unambiguous for every input, including empty.

/// Failure to strip padding. Signals corrupted ciphertext or a wrong key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaddingError {
    /// Input is empty or not a multiple of the block size.
    #[error("padded data length {len} is not a positive multiple of {block_size}")]
    InvalidLength { len: usize, block_size: usize },

    /// Trailing bytes do not form a valid pad.
    #[error("invalid padding")]
    InvalidPadding,
}

/// Append PKCS#7 padding for `block_size`.
///
/// # Panics
///
/// Panics if `block_size` is 0 or greater than 255.
pub fn pad(data: &[u8], block_size: usize) -> Vec<u8> {
    assert!(
        (1..=255).contains(&block_size),
        "block size must be in 1..=255, got {block_size}"
    );

    let n = block_size - (data.len() % block_size);
    let mut padded = Vec::with_capacity(data.len() + n);
    padded.extend_from_slice(data);
    padded.resize(data.len() + n, n as u8);
    padded
}

/// Strip PKCS#7 padding, returning the original data.
pub fn unpad(padded: &[u8], block_size: usize) -> Result<&[u8], PaddingError> {
    if padded.is_empty() || block_size == 0 || padded.len() % block_size != 0 {
        return Err(PaddingError::InvalidLength {
            len: padded.len(),
            block_size,
        });
    }

    let n = usize::from(padded[padded.len() - 1]);
    if n == 0 || n > block_size {
        return Err(PaddingError::InvalidPadding);
    }

    let (data, pad_bytes) = padded.split_at(padded.len() - n);
    if pad_bytes.iter().any(|&b| usize::from(b) != n) {
        return Err(PaddingError::InvalidPadding);
    }

    Ok(data)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn pads_partial_block() {
        assert_eq!(pad(b"abc", 8), b"abc\x05\x05\x05\x05\x05".to_vec());
    }

    #[test]
    fn aligned_input_gets_full_extra_block() {
        let padded = pad(b"abcd", 4);
        assert_eq!(padded, b"abcd\x04\x04\x04\x04".to_vec());
    }

    #[test]
    fn empty_input_is_one_block_of_padding() {
        let padded = pad(b"", 16);
        assert_eq!(padded, vec![16u8; 16]);
        assert_eq!(unpad(&padded, 16).unwrap(), b"");
    }

    #[test]
    fn unpad_reverses_pad_for_all_lengths() {
        let source: Vec<u8> = (0u8..=64).collect();
        for block_size in [1usize, 8, 16, 32] {
            for len in 0..source.len() {
                let data = &source[..len];
                let padded = pad(data, block_size);
                assert_eq!(padded.len() % block_size, 0);
                assert_eq!(unpad(&padded, block_size).unwrap(), data);
            }
        }
    }

    #[test]
    fn rejects_zero_pad_byte() {
        let mut padded = pad(b"hello", 8);
        *padded.last_mut().unwrap() = 0;
        assert_eq!(unpad(&padded, 8), Err(PaddingError::InvalidPadding));
    }

    #[test]
    fn rejects_pad_longer_than_block() {
        let mut padded = pad(b"hello", 8);
        *padded.last_mut().unwrap() = 9;
        assert_eq!(unpad(&padded, 8), Err(PaddingError::InvalidPadding));
    }

    #[test]
    fn rejects_inconsistent_pad_bytes() {
        let mut padded = pad(b"hello", 8);
        padded[6] = 1;
        assert_eq!(unpad(&padded, 8), Err(PaddingError::InvalidPadding));
    }

    #[test]
    fn rejects_misaligned_and_empty_input() {
        assert_matches!(
            unpad(b"abc\x01", 8),
            Err(PaddingError::InvalidLength { len: 4, block_size: 8 })
        );
        assert_matches!(unpad(b"", 8), Err(PaddingError::InvalidLength { .. }));
    }
}
