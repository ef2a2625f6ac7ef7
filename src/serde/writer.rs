/// A growable little-endian byte buffer for outgoing sync payloads.
/// One writer is used per Component per tick; the transport takes the
/// finished buffer via `to_bytes`.
pub struct ByteWriter {
    buffer: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(64),
        }
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    pub fn bytes_written(&self) -> usize {
        self.buffer.len()
    }

    pub fn to_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

impl Default for ByteWriter {
    fn default() -> Self {
        Self::new()
    }
}
