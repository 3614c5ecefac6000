//! Punycode ([RFC 3492](https://tools.ietf.org/html/rfc3492)) codec.
//!
//! Works on raw `u32` code points so that out-of-range values and
//! surrogates are reported as errors instead of being unrepresentable.
//! Every arithmetic step is checked before it can wrap.

use crate::error::{EtnError, Result};

const BASE: u32 = 36;
const T_MIN: u32 = 1;
const T_MAX: u32 = 26;
const SKEW: u32 = 38;
const DAMP: u32 = 700;
const INITIAL_BIAS: u32 = 72;
const INITIAL_N: u32 = 0x80;
const DELIMITER: u8 = b'-';

const MAX_CODE_POINT: u32 = 0x10_FFFF;

#[inline]
fn is_basic(cp: u32) -> bool {
    cp < 0x80
}

/// Code points the encoder refuses: beyond Unicode or a high surrogate
#[inline]
fn is_invalid(cp: u32) -> bool {
    cp > MAX_CODE_POINT || (0xD800..=0xDBFF).contains(&cp)
}

#[inline]
fn threshold(k: u32, bias: u32) -> u32 {
    if k <= bias {
        T_MIN
    } else if k >= bias + T_MAX {
        T_MAX
    } else {
        k - bias
    }
}

#[inline]
fn adapt(mut delta: u32, num_points: u32, first_time: bool) -> u32 {
    delta /= if first_time { DAMP } else { 2 };
    delta += delta / num_points;

    let mut k = 0;
    while delta > ((BASE - T_MIN) * T_MAX) / 2 {
        delta /= BASE - T_MIN;
        k += BASE;
    }
    k + ((BASE - T_MIN + 1) * delta) / (delta + SKEW)
}

/// 0..=25 map to `a..=z`, 26..=35 to `0..=9`
#[inline]
fn encode_digit(d: u32) -> u8 {
    debug_assert!(d < BASE);
    if d < 26 {
        b'a' + d as u8
    } else {
        b'0' + (d - 26) as u8
    }
}

#[inline]
fn decode_digit(byte: u8) -> Option<u32> {
    match byte {
        b'a'..=b'z' => Some(u32::from(byte - b'a')),
        b'A'..=b'Z' => Some(u32::from(byte - b'A')),
        b'0'..=b'9' => Some(u32::from(byte - b'0') + 26),
        // Underscore is a valid ACE byte with digit value zero
        b'_' => Some(0),
        _ => None,
    }
}

#[inline]
fn is_ace_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_'
}

/// Output buffer that refuses to grow past a fixed capacity
struct Bounded<T> {
    buf: Vec<T>,
    capacity: usize,
}

impl<T> Bounded<T> {
    fn new(capacity: usize, hint: usize) -> Self {
        Self {
            buf: Vec::with_capacity(hint.min(capacity)),
            capacity,
        }
    }

    #[inline]
    fn check(&self) -> Result<()> {
        if self.buf.len() >= self.capacity {
            return Err(EtnError::NoBufs(self.capacity));
        }
        Ok(())
    }

    #[inline]
    fn push(&mut self, value: T) -> Result<()> {
        self.check()?;
        self.buf.push(value);
        Ok(())
    }

    #[inline]
    fn insert(&mut self, index: usize, value: T) -> Result<()> {
        self.check()?;
        self.buf.insert(index, value);
        Ok(())
    }
}

/// Encode code points to punycode with no output limit
pub fn encode(input: &[u32]) -> Result<String> {
    encode_with_capacity(input, usize::MAX)
}

/// Encode code points to punycode, producing at most `capacity` bytes.
///
/// Basic (ASCII) code points are copied verbatim, so their case survives;
/// generated digits are lowercase.
pub fn encode_with_capacity(input: &[u32], capacity: usize) -> Result<String> {
    let input_length = u32::try_from(input.len()).map_err(|_| EtnError::Overflow("input length"))?;

    let mut out = Bounded::new(capacity, input.len() * 2);

    for &cp in input {
        if is_basic(cp) {
            out.push(cp as u8)?;
        } else if is_invalid(cp) {
            return Err(EtnError::invalid(format!("code point U+{:04X}", cp)));
        }
    }

    // out.len() <= input_length, so this cannot truncate
    let basic_length = out.buf.len() as u32;
    let mut handled = basic_length;
    if basic_length > 0 {
        out.push(DELIMITER)?;
    }

    let mut n = INITIAL_N;
    let mut delta: u32 = 0;
    let mut bias = INITIAL_BIAS;

    while handled < input_length {
        // Smallest code point not yet handled; one exists while handled < len
        let m = input
            .iter()
            .copied()
            .filter(|&cp| cp >= n)
            .min()
            .unwrap_or(u32::MAX);

        if m - n > (u32::MAX - delta) / (handled + 1) {
            return Err(EtnError::Overflow("delta"));
        }
        delta += (m - n) * (handled + 1);
        n = m;

        for &cp in input {
            if cp < n {
                delta = delta.checked_add(1).ok_or(EtnError::Overflow("delta"))?;
            }
            if cp == n {
                let mut q = delta;
                let mut k = BASE;
                loop {
                    let t = threshold(k, bias);
                    if q < t {
                        break;
                    }
                    out.push(encode_digit(t + (q - t) % (BASE - t)))?;
                    q = (q - t) / (BASE - t);
                    k += BASE;
                }
                out.push(encode_digit(q))?;

                bias = adapt(delta, handled + 1, handled == basic_length);
                delta = 0;
                handled += 1;
            }
        }

        delta = delta.checked_add(1).ok_or(EtnError::Overflow("delta"))?;
        n += 1;
    }

    // Only ASCII bytes were pushed
    Ok(out.buf.into_iter().map(char::from).collect())
}

/// Decode punycode to code points with no output limit
pub fn decode(input: &str) -> Result<Vec<u32>> {
    decode_with_capacity(input, usize::MAX)
}

/// Decode punycode to code points, producing at most `capacity` of them
pub fn decode_with_capacity(input: &str, capacity: usize) -> Result<Vec<u32>> {
    let src = input.as_bytes();
    if src.is_empty() {
        return Err(EtnError::invalid("empty punycode"));
    }
    if let Some(&bad) = src.iter().find(|&&b| !is_ace_byte(b)) {
        return Err(EtnError::invalid(format!(
            "byte 0x{:02X} in punycode {:?}",
            bad, input
        )));
    }

    let mut out = Bounded::new(capacity, src.len());

    let start = match src.iter().rposition(|&b| b == DELIMITER) {
        Some(b) => {
            // A leading delimiter means no basic code points were encoded and
            // a trailing one means there were no non-basic ones
            if b == 0 || b == src.len() - 1 {
                return Err(EtnError::invalid(format!(
                    "misplaced delimiter in punycode {:?}",
                    input
                )));
            }
            if b > capacity {
                return Err(EtnError::NoBufs(capacity));
            }
            for &byte in &src[..b] {
                out.push(u32::from(byte))?;
            }
            b + 1
        }
        None => 0,
    };

    let mut n = INITIAL_N;
    let mut i: u32 = 0;
    let mut bias = INITIAL_BIAS;
    let mut pos = start;

    while pos < src.len() {
        let old_i = i;
        let mut w: u32 = 1;
        let mut k = BASE;
        loop {
            let Some(&byte) = src.get(pos) else {
                return Err(EtnError::invalid(format!(
                    "unterminated digit group in punycode {:?}",
                    input
                )));
            };
            pos += 1;

            let digit = decode_digit(byte).ok_or_else(|| {
                EtnError::invalid(format!("bad digit {:?} in punycode {:?}", byte as char, input))
            })?;
            if digit > (u32::MAX - i) / w {
                return Err(EtnError::Overflow("index"));
            }
            i += digit * w;

            let t = threshold(k, bias);
            if digit < t {
                break;
            }
            if w > u32::MAX / (BASE - t) {
                return Err(EtnError::Overflow("weight"));
            }
            w *= BASE - t;
            k += BASE;
        }

        let length = u32::try_from(out.buf.len())
            .ok()
            .filter(|&len| len < u32::MAX)
            .ok_or(EtnError::Overflow("output length"))?;

        bias = adapt(i - old_i, length + 1, old_i == 0);

        if i / (length + 1) > u32::MAX - n {
            return Err(EtnError::Overflow("code point"));
        }
        n += i / (length + 1);
        if is_invalid(n) {
            return Err(EtnError::invalid(format!("decoded code point U+{:04X}", n)));
        }
        i %= length + 1;

        out.insert(i as usize, n)?;
        i += 1;
    }

    Ok(out.buf)
}

/// Encode a Unicode string to punycode
pub fn encode_str(input: &str) -> Result<String> {
    let code_points: Vec<u32> = input.chars().map(u32::from).collect();
    encode(&code_points)
}

/// Decode punycode into a Unicode string
pub fn decode_to_string(input: &str) -> Result<String> {
    code_points_to_string(&decode(input)?)
}

/// Collect code points into UTF-8, rejecting anything `char` cannot hold
pub(crate) fn code_points_to_string(code_points: &[u32]) -> Result<String> {
    code_points
        .iter()
        .map(|&cp| {
            char::from_u32(cp)
                .ok_or_else(|| EtnError::invalid(format!("code point U+{:04X}", cp)))
        })
        .collect()
}
