//! MS-OVBA compression ([MS-OVBA] section 2.4.1).
//!
//! The `dir` stream and the source portion of every module stream are
//! wrapped in a "CompressedContainer": a signature byte followed by a
//! sequence of chunks, each holding up to 4096 decompressed bytes encoded
//! as literal bytes and back-referencing copy tokens.

use vba_core::{Error, Result};

/// Every compressed container starts with this signature byte.
const CONTAINER_SIGNATURE: u8 = 0x01;

/// Three-bit signature carried in bits 12..15 of every chunk header.
const CHUNK_SIGNATURE: u16 = 0b011;

/// Decompressed chunk size. Copy-token windows never cross a chunk boundary.
const CHUNK_SIZE: usize = 4096;

/// Decompress an MS-OVBA compressed container.
pub fn decompress(container: &[u8]) -> Result<Vec<u8>> {
    if container.is_empty() {
        return Err(Error::DecompressionError(
            "Compressed container is empty".to_string(),
        ));
    }
    if container[0] != CONTAINER_SIGNATURE {
        return Err(Error::DecompressionError(format!(
            "Invalid container signature byte 0x{:02X}",
            container[0]
        )));
    }

    let mut out = Vec::new();
    let mut pos = 1usize;

    while pos < container.len() {
        if pos + 2 > container.len() {
            return Err(Error::DecompressionError(
                "Truncated chunk header".to_string(),
            ));
        }
        let header = u16::from_le_bytes([container[pos], container[pos + 1]]);
        pos += 2;

        let signature = (header >> 12) & 0x07;
        if signature != CHUNK_SIGNATURE {
            return Err(Error::DecompressionError(format!(
                "Invalid chunk signature bits 0b{:03b}",
                signature
            )));
        }

        // The 12-bit size field stores the total chunk size minus 3,
        // header included, so the data portion is the field plus one.
        let data_len = (header & 0x0FFF) as usize + 1;
        let is_compressed = header & 0x8000 != 0;

        if pos + data_len > container.len() {
            return Err(Error::DecompressionError(
                "Chunk data extends past end of container".to_string(),
            ));
        }
        let chunk = &container[pos..pos + data_len];
        pos += data_len;

        if is_compressed {
            decompress_chunk(chunk, &mut out)?;
        } else {
            out.extend_from_slice(chunk);
        }
    }

    Ok(out)
}

/// Expand one compressed chunk, appending to `out`.
fn decompress_chunk(chunk: &[u8], out: &mut Vec<u8>) -> Result<()> {
    let chunk_start = out.len();
    let mut pos = 0usize;

    while pos < chunk.len() && out.len() - chunk_start < CHUNK_SIZE {
        let flags = chunk[pos];
        pos += 1;

        for bit in 0..8 {
            if pos >= chunk.len() {
                break;
            }
            let produced = out.len() - chunk_start;
            if produced >= CHUNK_SIZE {
                break;
            }

            if flags & (1 << bit) == 0 {
                out.push(chunk[pos]);
                pos += 1;
                continue;
            }

            if pos + 2 > chunk.len() {
                return Err(Error::DecompressionError(
                    "Truncated copy token".to_string(),
                ));
            }
            let token = u16::from_le_bytes([chunk[pos], chunk[pos + 1]]);
            pos += 2;

            let offset_bits = copy_token_offset_bits(produced);
            let length_bits = 16 - offset_bits;
            let length = (token & ((1 << length_bits) - 1)) as usize + 3;
            let offset = (token >> length_bits) as usize + 1;

            if offset > produced {
                return Err(Error::DecompressionError(format!(
                    "Copy token offset {} exceeds {} decompressed bytes",
                    offset, produced
                )));
            }

            // Copies may overlap their own output, so push byte by byte.
            for _ in 0..length {
                if out.len() - chunk_start >= CHUNK_SIZE {
                    break;
                }
                let byte = out[out.len() - offset];
                out.push(byte);
            }
        }
    }

    Ok(())
}

/// Compress bytes into an MS-OVBA compressed container.
///
/// Chunks that would grow past their decompressed size are stored raw and
/// zero-padded to the chunk size, as the format requires.
pub fn compress(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() / 2 + 16);
    out.push(CONTAINER_SIGNATURE);

    for chunk in data.chunks(CHUNK_SIZE) {
        let packed = compress_chunk(chunk);
        if packed.len() <= CHUNK_SIZE {
            let header = 0x8000 | (CHUNK_SIGNATURE << 12) | (packed.len() as u16 - 1);
            out.extend_from_slice(&header.to_le_bytes());
            out.extend_from_slice(&packed);
        } else {
            let header = (CHUNK_SIGNATURE << 12) | (CHUNK_SIZE as u16 - 1);
            out.extend_from_slice(&header.to_le_bytes());
            out.extend_from_slice(chunk);
            out.resize(out.len() + (CHUNK_SIZE - chunk.len()), 0x00);
        }
    }

    out
}

/// Encode one chunk as flag-byte groups of literals and copy tokens.
fn compress_chunk(chunk: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(chunk.len() + chunk.len() / 8 + 1);
    let mut cur = 0usize;

    while cur < chunk.len() {
        let flags_at = out.len();
        out.push(0u8);
        let mut flags = 0u8;

        for bit in 0..8 {
            if cur >= chunk.len() {
                break;
            }

            let offset_bits = copy_token_offset_bits(cur);
            let length_bits = 16 - offset_bits;
            let max_length = ((1usize << length_bits) - 1) + 3;

            let (offset, length) = longest_match(chunk, cur, max_length);
            if length >= 3 {
                let token =
                    (((offset - 1) as u16) << length_bits) | ((length - 3) as u16);
                out.extend_from_slice(&token.to_le_bytes());
                flags |= 1 << bit;
                cur += length;
            } else {
                out.push(chunk[cur]);
                cur += 1;
            }
        }

        out[flags_at] = flags;
    }

    out
}

/// Find the longest back-reference for position `cur`, nearest match
/// winning ties. Matches may overlap their own output.
fn longest_match(chunk: &[u8], cur: usize, max_length: usize) -> (usize, usize) {
    let remaining = chunk.len() - cur;
    let limit = max_length.min(remaining);

    let mut best_offset = 0usize;
    let mut best_length = 0usize;

    for offset in 1..=cur {
        let start = cur - offset;
        let mut length = 0usize;
        while length < limit && chunk[start + length] == chunk[cur + length] {
            length += 1;
        }
        if length > best_length {
            best_offset = offset;
            best_length = length;
            if best_length == limit {
                break;
            }
        }
    }

    (best_offset, best_length)
}

/// Number of offset bits in a copy token, derived from how many bytes of
/// the current chunk are already decompressed ([MS-OVBA] 2.4.1.3.19.1).
fn copy_token_offset_bits(decompressed: usize) -> u32 {
    let n = decompressed.saturating_sub(1);
    let bits = usize::BITS - n.leading_zeros();
    bits.clamp(4, 12)
}
