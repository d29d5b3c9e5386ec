/// Size of the byte-addressable data memory.
pub const ADDRESS_SPACE_BYTES: usize = 1 << 16;

/// Byte-addressable data memory covering the full 16-bit address space.
///
/// Cells are signed 8-bit quantities; `LDB` sign-extends them back into a
/// register. Because addresses are `u16`, every address is in range and no
/// bounds failure mode exists. Word accesses are little-endian, low byte at
/// the lower address, and wrap at the top of the address space.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Memory {
    cells: Box<[u8]>,
}

impl Default for Memory {
    fn default() -> Self {
        Self {
            cells: vec![0; ADDRESS_SPACE_BYTES].into_boxed_slice(),
        }
    }
}

impl Memory {
    /// Creates a zeroed memory image.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads one byte.
    #[must_use]
    pub fn read_byte(&self, addr: u16) -> u8 {
        self.cells[usize::from(addr)]
    }

    /// Reads one byte as a signed cell.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn read_byte_signed(&self, addr: u16) -> i8 {
        self.cells[usize::from(addr)] as i8
    }

    /// Writes one byte.
    pub fn write_byte(&mut self, addr: u16, value: u8) {
        self.cells[usize::from(addr)] = value;
    }

    /// Reads a 16-bit word, low byte at `addr`.
    #[must_use]
    pub fn read_word(&self, addr: u16) -> u16 {
        let low = self.read_byte(addr);
        let high = self.read_byte(addr.wrapping_add(1));
        u16::from_le_bytes([low, high])
    }

    /// Writes a 16-bit word, low byte at `addr`.
    pub fn write_word(&mut self, addr: u16, value: u16) {
        let [low, high] = value.to_le_bytes();
        self.write_byte(addr, low);
        self.write_byte(addr.wrapping_add(1), high);
    }
}

#[cfg(test)]
mod tests {
    use super::{Memory, ADDRESS_SPACE_BYTES};

    #[test]
    fn memory_covers_the_full_address_space() {
        let mut memory = Memory::new();
        assert_eq!(ADDRESS_SPACE_BYTES, 65536);
        memory.write_byte(0, 0x11);
        memory.write_byte(u16::MAX, 0x22);
        assert_eq!(memory.read_byte(0), 0x11);
        assert_eq!(memory.read_byte(u16::MAX), 0x22);
    }

    #[test]
    fn words_are_little_endian() {
        let mut memory = Memory::new();
        memory.write_word(0x0100, 0xBEEF);
        assert_eq!(memory.read_byte(0x0100), 0xEF);
        assert_eq!(memory.read_byte(0x0101), 0xBE);
        assert_eq!(memory.read_word(0x0100), 0xBEEF);
    }

    #[test]
    fn word_access_wraps_at_the_top_of_memory() {
        let mut memory = Memory::new();
        memory.write_word(u16::MAX, 0x1234);
        assert_eq!(memory.read_byte(u16::MAX), 0x34);
        assert_eq!(memory.read_byte(0), 0x12);
        assert_eq!(memory.read_word(u16::MAX), 0x1234);
    }

    #[test]
    fn signed_byte_view_matches_cell_semantics() {
        let mut memory = Memory::new();
        memory.write_byte(0x0042, 0xFF);
        assert_eq!(memory.read_byte_signed(0x0042), -1);
    }
}
