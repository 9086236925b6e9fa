use derive_more::{Deref, From};
use std::fmt::{self, Write};

///
/// Binary
///
/// Short byte payload stored inline in a `Binary` column.
/// Display renders lower-case hex.
///

#[derive(Clone, Debug, Default, Deref, Eq, From, Hash, Ord, PartialEq, PartialOrd)]
pub struct Binary(Vec<u8>);

impl Binary {
    #[must_use]
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl fmt::Display for Binary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex(f, &self.0)
    }
}

///
/// LargeBinary
///
/// Byte payload stored out of line in a `LargeBinary` column.
///

#[derive(Clone, Debug, Default, Deref, Eq, From, Hash, Ord, PartialEq, PartialOrd)]
pub struct LargeBinary(Vec<u8>);

impl LargeBinary {
    #[must_use]
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl fmt::Display for LargeBinary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex(f, &self.0)
    }
}

fn write_hex(out: &mut impl Write, bytes: &[u8]) -> fmt::Result {
    for byte in bytes {
        write!(out, "{byte:02x}")?;
    }

    Ok(())
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_renders_lowercase_hex() {
        let binary = Binary::from(vec![0x00, 0xab, 0x7f]);

        assert_eq!(binary.to_string(), "00ab7f");
        assert_eq!(LargeBinary::new(Vec::new()).to_string(), "");
    }

    #[test]
    fn deref_exposes_the_bytes() {
        let binary = Binary::new(vec![1, 2, 3]);

        assert_eq!(binary.len(), 3);
        assert_eq!(binary.as_bytes(), &[1, 2, 3]);
    }
}
