use crate::{Error, Result};

use ark_ec::AffineRepr;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize, Compress, Validate};
use rayon::prelude::*;

use std::{fmt, io::Write};

/// Determines if point compression should be used.
#[derive(Debug, Copy, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum UseCompression {
    Yes,
    No,
}

impl fmt::Display for UseCompression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            UseCompression::Yes => write!(f, "Yes"),
            UseCompression::No => write!(f, "No"),
        }
    }
}

impl From<UseCompression> for Compress {
    fn from(compressed: UseCompression) -> Self {
        match compressed {
            UseCompression::Yes => Compress::Yes,
            UseCompression::No => Compress::No,
        }
    }
}

impl UseCompression {
    /// The flag byte stored in a parameter file header.
    pub fn to_byte(self) -> u8 {
        match self {
            UseCompression::No => 0,
            UseCompression::Yes => 1,
        }
    }

    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(UseCompression::No),
            1 => Ok(UseCompression::Yes),
            other => Err(Error::corrupt(format!("unknown compression flag {}", other))),
        }
    }
}

/// Determines if points should be checked to be infinity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CheckForCorrectness {
    Full,
    OnlyNonZero,
    OnlyInGroup,
    No,
}

impl fmt::Display for CheckForCorrectness {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            CheckForCorrectness::Full => write!(f, "Full"),
            CheckForCorrectness::OnlyNonZero => write!(f, "OnlyNonZero"),
            CheckForCorrectness::OnlyInGroup => write!(f, "OnlyInGroup"),
            CheckForCorrectness::No => write!(f, "No"),
        }
    }
}

impl CheckForCorrectness {
    fn validate(self) -> Validate {
        match self {
            CheckForCorrectness::Full | CheckForCorrectness::OnlyInGroup => Validate::Yes,
            CheckForCorrectness::OnlyNonZero | CheckForCorrectness::No => Validate::No,
        }
    }

    fn non_zero(self) -> bool {
        matches!(self, CheckForCorrectness::Full | CheckForCorrectness::OnlyNonZero)
    }

    /// The same check without the point at infinity restriction, for
    /// sections that legitimately contain the identity.
    pub fn allowing_zero(self) -> Self {
        match self {
            CheckForCorrectness::Full | CheckForCorrectness::OnlyInGroup => CheckForCorrectness::OnlyInGroup,
            CheckForCorrectness::OnlyNonZero | CheckForCorrectness::No => CheckForCorrectness::No,
        }
    }
}

/// Returns the size in bytes of a single encoded group element.
pub fn buffer_size<C: AffineRepr>(compressed: UseCompression) -> usize {
    C::generator().serialized_size(compressed.into())
}

pub fn write_element<C: AffineRepr, W: Write>(writer: &mut W, element: &C, compressed: UseCompression) -> Result<()> {
    element.serialize_with_mode(writer, compressed.into())?;
    Ok(())
}

/// Writes the length of `elements` as a u64 followed by every element.
pub fn write_vec<C: AffineRepr, W: Write>(writer: &mut W, elements: &[C], compressed: UseCompression) -> Result<()> {
    (elements.len() as u64).serialize_uncompressed(&mut *writer)?;
    for element in elements {
        write_element(writer, element, compressed)?;
    }
    Ok(())
}

/// Reads a single element from the front of `reader`, advancing it.
/// Any failure is reported as a corrupt file.
pub fn read_element<C: AffineRepr>(
    reader: &mut &[u8],
    compressed: UseCompression,
    check_for_correctness: CheckForCorrectness,
) -> Result<C> {
    let size = buffer_size::<C>(compressed);
    if reader.len() < size {
        return Err(Error::corrupt(format!(
            "truncated group element: {} bytes left, {} needed",
            reader.len(),
            size
        )));
    }
    let (bytes, rest) = reader.split_at(size);
    let element = decode_element::<C>(bytes, compressed, check_for_correctness)?;
    *reader = rest;
    Ok(element)
}

/// Reads a u64 length prefix and that many elements.
pub fn read_vec<C: AffineRepr>(
    reader: &mut &[u8],
    compressed: UseCompression,
    check_for_correctness: CheckForCorrectness,
) -> Result<Vec<C>> {
    let length = read_u64(reader)?;
    read_elements(reader, length, compressed, check_for_correctness)
}

/// Like [`read_vec`], but the length prefix must equal `expected`.
pub fn read_vec_exact<C: AffineRepr>(
    reader: &mut &[u8],
    expected: usize,
    section: &str,
    compressed: UseCompression,
    check_for_correctness: CheckForCorrectness,
) -> Result<Vec<C>> {
    let length = read_u64(reader)?;
    if length != expected as u64 {
        return Err(Error::corrupt(format!(
            "section {} declares {} elements, expected {}",
            section, length, expected
        )));
    }
    read_elements(reader, length, compressed, check_for_correctness)
}

/// Reads `length` elements. The length is checked against the remaining
/// input before anything is allocated.
fn read_elements<C: AffineRepr>(
    reader: &mut &[u8],
    length: u64,
    compressed: UseCompression,
    check_for_correctness: CheckForCorrectness,
) -> Result<Vec<C>> {
    let size = buffer_size::<C>(compressed);
    let needed = (length as usize)
        .checked_mul(size)
        .filter(|_| length <= usize::MAX as u64)
        .ok_or_else(|| Error::corrupt(format!("element count {} overflows", length)))?;
    if reader.len() < needed {
        return Err(Error::corrupt(format!(
            "declared {} elements ({} bytes) but only {} bytes remain",
            length,
            needed,
            reader.len()
        )));
    }
    let (bytes, rest) = reader.split_at(needed);
    let elements = bytes
        .par_chunks(size)
        .map(|chunk| decode_element::<C>(chunk, compressed, check_for_correctness))
        .collect::<Result<Vec<_>>>()?;
    *reader = rest;
    Ok(elements)
}

pub fn read_u64(reader: &mut &[u8]) -> Result<u64> {
    u64::deserialize_uncompressed(&mut *reader).map_err(|e| Error::corrupt(format!("could not read length: {}", e)))
}

pub fn read_bytes<'a>(reader: &mut &'a [u8], length: usize) -> Result<&'a [u8]> {
    if reader.len() < length {
        return Err(Error::corrupt(format!(
            "expected {} bytes, only {} remain",
            length,
            reader.len()
        )));
    }
    let (bytes, rest) = reader.split_at(length);
    *reader = rest;
    Ok(bytes)
}

fn decode_element<C: AffineRepr>(
    mut bytes: &[u8],
    compressed: UseCompression,
    check_for_correctness: CheckForCorrectness,
) -> Result<C> {
    let element = C::deserialize_with_mode(&mut bytes, compressed.into(), check_for_correctness.validate())
        .map_err(|e| Error::corrupt(format!("invalid group element encoding: {}", e)))?;
    if check_for_correctness.non_zero() && element == C::zero() {
        return Err(Error::corrupt("unexpected point at infinity"));
    }
    Ok(element)
}
