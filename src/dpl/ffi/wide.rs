//! Conversions between Rust strings and the native `wchar_t` buffers.

use crate::dpl::common::error::{DplError, Result};

/// `wchar_t` is UTF-16 on Windows and UTF-32 elsewhere.
#[cfg(windows)]
pub type WChar = u16;
#[cfg(not(windows))]
pub type WChar = u32;

/// `_MAX_PATH` as used by the vendor records.
pub const MAX_PATH: usize = 260;

#[cfg(windows)]
fn encode(s: &str) -> Vec<WChar> {
    s.encode_utf16().collect()
}

#[cfg(not(windows))]
fn encode(s: &str) -> Vec<WChar> {
    s.chars().map(|c| c as WChar).collect()
}

#[cfg(windows)]
fn decode(units: &[WChar]) -> String {
    String::from_utf16_lossy(units)
}

#[cfg(not(windows))]
fn decode(units: &[WChar]) -> String {
    units
        .iter()
        .map(|&u| char::from_u32(u).unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Copies `s` into a fixed-size, NUL-terminated wide buffer.
///
/// The remainder of `dst` is zeroed. Fails if `s` does not fit with its terminator.
pub fn write_wide(dst: &mut [WChar], s: &str) -> Result<()> {
    let units = encode(s);
    if units.len() >= dst.len() {
        return Err(DplError::InvalidArgument(format!(
            "'{}' exceeds {} wide characters",
            s,
            dst.len() - 1
        )));
    }
    dst.fill(0);
    dst[..units.len()].copy_from_slice(&units);
    Ok(())
}

/// Reads a wide buffer up to its first NUL.
pub fn read_wide(src: &[WChar]) -> String {
    let len = src.iter().position(|&u| u == 0).unwrap_or(src.len());
    decode(&src[..len])
}

/// NUL-terminated wide string for passing as a `const wchar_t*` argument.
pub fn to_wide_nul(s: &str) -> Vec<WChar> {
    let mut units = encode(s);
    units.push(0);
    units
}

/// Reads a narrow, NUL-padded C string (e.g. the file header marker).
pub fn read_narrow(src: &[u8]) -> String {
    let len = src.iter().position(|&b| b == 0).unwrap_or(src.len());
    String::from_utf8_lossy(&src[..len]).into_owned()
}
