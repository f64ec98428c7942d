#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum Utf16LeDecodeError {
    OddLength,
    InvalidData,
}

/// Decode a UTF-16LE byte slice in full.
///
/// NUL code units are kept: AXML strings carry an explicit length and may embed them.
pub(crate) fn decode_utf16le_bytes(bytes: &[u8]) -> Result<String, Utf16LeDecodeError> {
    if !bytes.len().is_multiple_of(2) {
        return Err(Utf16LeDecodeError::OddLength);
    }

    let mut units = Vec::with_capacity(bytes.len() / 2);
    for chunk in bytes.chunks_exact(2) {
        units.push(u16::from_le_bytes([chunk[0], chunk[1]]));
    }

    decode_utf16_units(&units)
}

/// Decode UTF-16 code units, rejecting unpaired surrogates.
pub(crate) fn decode_utf16_units(units: &[u16]) -> Result<String, Utf16LeDecodeError> {
    // Manifests are overwhelmingly ASCII, which converts without surrogate handling.
    if units.iter().all(|&c| c <= 0x7F) {
        return Ok(units.iter().map(|&c| char::from(c as u8)).collect());
    }

    String::from_utf16(units).map_err(|_| Utf16LeDecodeError::InvalidData)
}
