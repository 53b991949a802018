use crate::error::{Error, Result};
use smallvec::SmallVec;

/// UTF-16 code units of one scalar value: one unit in the BMP, two otherwise.
pub type CodeUnits = SmallVec<[u16; 2]>;

pub(crate) const MAX_UNIT_COUNT: usize = 2;

pub(crate) const MAX_SCALAR: u32 = 0x10FFFF;
const END_ONE_UNIT: u32 = 0x10000;
const SURROGATE_OFFSET: u32 = 0x10000;
const SURROGATE_SPAN: u32 = 0x400;
const HIGH_SURROGATE_START: u32 = 0xD800;
const HIGH_SURROGATE_END: u32 = 0xDBFF;
const LOW_SURROGATE_START: u32 = 0xDC00;
const LOW_SURROGATE_END: u32 = 0xDFFF;

pub(crate) fn is_surrogate(code: u32) -> bool {
    (HIGH_SURROGATE_START..=LOW_SURROGATE_END).contains(&code)
}

pub(crate) fn is_high_surrogate(unit: u16) -> bool {
    (HIGH_SURROGATE_START..=HIGH_SURROGATE_END).contains(&u32::from(unit))
}

pub(crate) fn is_low_surrogate(unit: u16) -> bool {
    (LOW_SURROGATE_START..=LOW_SURROGATE_END).contains(&u32::from(unit))
}

pub(crate) fn is_scalar(code: u32) -> bool {
    code <= MAX_SCALAR && !is_surrogate(code)
}

/// Number of UTF-16 code units needed for `code`, which must be a scalar value.
pub(crate) fn len(code: u32) -> usize {
    debug_assert!(is_scalar(code));
    if code < END_ONE_UNIT {
        1
    } else {
        2
    }
}

/// Returns the high/low surrogate pair for a supplementary-plane scalar,
/// or `None` if the scalar fits in one code unit or is not a scalar at all.
pub fn surrogate_pair(code: u32) -> Option<(u16, u16)> {
    if !is_scalar(code) || code < END_ONE_UNIT {
        return None;
    }
    let offset = code - SURROGATE_OFFSET;
    let high = offset / SURROGATE_SPAN + HIGH_SURROGATE_START;
    let low = offset % SURROGATE_SPAN + LOW_SURROGATE_START;
    Some((high as u16, low as u16))
}

/// Encodes `code` into `buf`, returning the number of units written.
pub(crate) fn encode_utf16(code: u32, buf: &mut [u16; MAX_UNIT_COUNT]) -> Result<usize> {
    if !is_scalar(code) {
        return Err(Error::InvalidScalar(code));
    }
    match (len(code), &mut buf[..]) {
        (1, [a, ..]) => {
            *a = code as u16;
        }
        (2, [a, b]) => {
            let (high, low) = surrogate_pair(code).ok_or(Error::InvalidScalar(code))?;
            *a = high;
            *b = low;
        }
        _ => unreachable!(),
    }
    Ok(len(code))
}

/// Encodes a scalar value as UTF-16 code units.
pub fn scalar_to_utf16(code: u32) -> Result<CodeUnits> {
    let mut buf = [0u16; MAX_UNIT_COUNT];
    let used = encode_utf16(code, &mut buf)?;
    Ok(buf[..used].iter().copied().collect())
}

#[inline]
fn combine_surrogates(high: u16, low: u16) -> u32 {
    let high = u32::from(high) - HIGH_SURROGATE_START;
    let low = u32::from(low) - LOW_SURROGATE_START;
    high * SURROGATE_SPAN + low + SURROGATE_OFFSET
}

/// Decodes exactly one scalar value from `units`.
///
/// Lone or misordered surrogates, empty input and trailing units are rejected.
pub fn decode_utf16_units(units: &[u16]) -> Result<u32> {
    match *units {
        [unit] if !is_surrogate(u32::from(unit)) => Ok(u32::from(unit)),
        [high, low] if is_high_surrogate(high) && is_low_surrogate(low) => {
            Ok(combine_surrogates(high, low))
        }
        [first, ..] => Err(Error::InvalidScalar(u32::from(first))),
        [] => Err(Error::InvalidScalar(0)),
    }
}

/// Encodes a scalar value as text.
///
/// `String` is UTF-8, so no surrogate arithmetic is involved here; use
/// [`scalar_to_utf16`] for the UTF-16 form.
pub fn scalar_to_text(code: u32) -> Result<String> {
    char::from_u32(code)
        .map(String::from)
        .ok_or(Error::InvalidScalar(code))
}

/// Parses a hexadecimal codepoint such as `1F600`, `00e9` or `0041`.
/// Anything but hex digits is malformed, including prefixes and whitespace.
pub fn hex_to_scalar(hex: &str) -> Result<u32> {
    if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::MalformedCodepoint(hex.to_owned()));
    }
    u32::from_str_radix(hex, 16).map_err(|_| Error::MalformedCodepoint(hex.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bmp_is_single_unit() {
        for code in (0..0xD800).chain(0xE000..=0xFFFF) {
            let units = scalar_to_utf16(code).unwrap();
            assert_eq!(&units[..], &[code as u16]);
            let text = scalar_to_text(code).unwrap();
            assert_eq!(text.encode_utf16().collect::<Vec<_>>(), vec![code as u16]);
        }
    }

    #[test]
    fn test_supplementary_round_trip() {
        for code in 0x10000..=MAX_SCALAR {
            let units = scalar_to_utf16(code).unwrap();
            assert_eq!(units.len(), 2);
            assert_eq!(decode_utf16_units(&units).unwrap(), code);
        }
    }

    #[test]
    fn test_grinning_face_pair() {
        assert_eq!(surrogate_pair(0x1F600), Some((0xD83D, 0xDE00)));
        assert_eq!(&scalar_to_utf16(0x1F600).unwrap()[..], &[0xD83D, 0xDE00]);
        assert_eq!(scalar_to_text(0x1F600).unwrap(), "\u{1F600}");
        assert_eq!(surrogate_pair(0x41), None);
    }

    #[test]
    fn test_pair_matches_std_encoder() {
        for code in [0x10000, 0x1F600, 0x2A6D6, 0x10FFFF] {
            let ch = char::from_u32(code).unwrap();
            let mut std_buf = [0u16; 2];
            assert_eq!(
                ch.encode_utf16(&mut std_buf),
                &scalar_to_utf16(code).unwrap()[..]
            );
        }
    }

    #[test]
    fn test_invalid_scalars() {
        for code in [0xD800, 0xDBFF, 0xDC00, 0xDFFF, 0x110000, u32::MAX] {
            assert!(matches!(scalar_to_text(code), Err(Error::InvalidScalar(c)) if c == code));
            assert!(matches!(scalar_to_utf16(code), Err(Error::InvalidScalar(c)) if c == code));
        }
    }

    #[test]
    fn test_decode_rejects_bad_units() {
        assert!(decode_utf16_units(&[]).is_err());
        assert!(decode_utf16_units(&[0xD83D]).is_err());
        assert!(decode_utf16_units(&[0xDE00, 0xD83D]).is_err());
        assert!(decode_utf16_units(&[0x41, 0x42]).is_err());
    }

    #[test]
    fn test_hex_to_scalar() {
        assert_eq!(hex_to_scalar("1F600").unwrap(), 0x1F600);
        assert_eq!(hex_to_scalar("1f600").unwrap(), 0x1F600);
        assert_eq!(hex_to_scalar("0041").unwrap(), 0x41);
        assert_eq!(hex_to_scalar("00e9").unwrap(), 0xE9);
        for bad in ["", "xyz", "0x41", "12 34", "+41", "FFFFFFFFF", "U+00E9", " 20AC "] {
            assert!(
                matches!(hex_to_scalar(bad), Err(Error::MalformedCodepoint(_))),
                "{:?} should be malformed",
                bad
            );
        }
    }
}
