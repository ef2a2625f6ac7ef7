use crate::serde::error::SerdeErr;

/// A cursor over an incoming sync payload. All multi-byte reads are
/// little-endian; running past the end of the buffer is a `SerdeErr`,
/// never a panic.
pub struct ByteReader<'b> {
    buffer: &'b [u8],
    cursor: usize,
}

impl<'b> ByteReader<'b> {
    pub fn new(buffer: &'b [u8]) -> Self {
        Self { buffer, cursor: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.cursor
    }

    pub fn read_u8(&mut self) -> Result<u8, SerdeErr> {
        let bytes = self.read_bytes(1)?;
        Ok(bytes[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, SerdeErr> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, SerdeErr> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_u64(&mut self) -> Result<u64, SerdeErr> {
        let bytes = self.read_bytes(8)?;
        Ok(u64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    pub fn read_bytes(&mut self, length: usize) -> Result<&'b [u8], SerdeErr> {
        if self.remaining() < length {
            return Err(SerdeErr::UnexpectedEnd);
        }
        let start = self.cursor;
        self.cursor += length;
        Ok(&self.buffer[start..self.cursor])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian() {
        let bytes = [0xAB, 0x02, 0x01, 0x06, 0x05, 0x04, 0x03];
        let mut reader = ByteReader::new(&bytes);
        assert_eq!(reader.read_u8().unwrap(), 0xAB);
        assert_eq!(reader.read_u16().unwrap(), 0x0102);
        assert_eq!(reader.read_u32().unwrap(), 0x03040506);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn truncated_read_is_an_error() {
        let bytes = [0x01, 0x02];
        let mut reader = ByteReader::new(&bytes);
        assert_eq!(reader.read_u32(), Err(SerdeErr::UnexpectedEnd));
        // a failed read consumes nothing
        assert_eq!(reader.remaining(), 2);
        assert_eq!(reader.read_u16().unwrap(), 0x0201);
    }
}
