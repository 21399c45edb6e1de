//! Base58 codec over the Bitcoin/Solana alphabet.
//!
//! Each leading zero byte maps to one leading `1` and back, so an all-zero
//! input of length `n` encodes to `n` ones.

use zeroize::Zeroizing;

use crate::{Error, Result};

const ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Reverse lookup: ASCII byte -> digit value, 0xFF for bytes outside the alphabet.
const DECODE_MAP: [u8; 128] = {
    let mut map = [0xFF_u8; 128];
    let mut i = 0;
    while i < ALPHABET.len() {
        map[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    map
};

/// Encode bytes as Base58 text.
pub fn encode(bytes: &[u8]) -> String {
    let zeros = bytes.iter().take_while(|&&b| b == 0).count();

    // Little-endian base-58 digits of the non-zero tail.
    let mut digits: Vec<u8> = Vec::with_capacity(bytes.len() * 138 / 100 + 1);
    for &byte in &bytes[zeros..] {
        let mut carry = byte as u32;
        for digit in digits.iter_mut() {
            carry += (*digit as u32) << 8;
            *digit = (carry % 58) as u8;
            carry /= 58;
        }
        while carry > 0 {
            digits.push((carry % 58) as u8);
            carry /= 58;
        }
    }

    let mut out = String::with_capacity(zeros + digits.len());
    out.extend(std::iter::repeat('1').take(zeros));
    out.extend(digits.iter().rev().map(|&d| ALPHABET[d as usize] as char));
    out
}

/// Decode Base58 text into bytes.
///
/// Rejects any character outside the alphabet (including `0`, `O`, `I`, `l`).
pub fn decode(text: &str) -> Result<Vec<u8>> {
    let zeros = text.bytes().take_while(|&c| c == ALPHABET[0]).count();

    // Little-endian base-256 bytes of the non-zero tail. Sized up front so
    // the buffer never reallocates; it may hold secret key digits.
    let mut bytes: Zeroizing<Vec<u8>> =
        Zeroizing::new(Vec::with_capacity(text.len() * 733 / 1000 + 1));
    for (position, c) in text.char_indices().skip(zeros) {
        let value = digit_value(c).ok_or_else(|| {
            Error::key_format(format!(
                "invalid base58 character '{c}' at position {position}"
            ))
        })?;

        let mut carry = value as u32;
        for byte in bytes.iter_mut() {
            carry += (*byte as u32) * 58;
            *byte = (carry & 0xFF) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            bytes.push((carry & 0xFF) as u8);
            carry >>= 8;
        }
    }

    let mut out = vec![0u8; zeros];
    out.extend(bytes.iter().rev());
    Ok(out)
}

fn digit_value(c: char) -> Option<u8> {
    let ascii = u32::from(c);
    if ascii >= 128 {
        return None;
    }
    match DECODE_MAP[ascii as usize] {
        0xFF => None,
        value => Some(value),
    }
}
