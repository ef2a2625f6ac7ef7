use crate::{
    serde::{ByteReader, ByteWriter, SerdeErr},
    world::entity::{ComponentAddress, EntityId},
};

/// The wire type of a Value-category field, fixed at declaration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    U8,
    U16,
    U32,
    U64,
    I32,
    I64,
    F32,
    F64,
    String,
}

impl ValueKind {
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Bool => "Bool",
            ValueKind::U8 => "U8",
            ValueKind::U16 => "U16",
            ValueKind::U32 => "U32",
            ValueKind::U64 => "U64",
            ValueKind::I32 => "I32",
            ValueKind::I64 => "I64",
            ValueKind::F32 => "F32",
            ValueKind::F64 => "F64",
            ValueKind::String => "String",
        }
    }
}

/// A Value-category field's payload. One variant per `ValueKind`.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncValue {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    String(String),
}

impl SyncValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            SyncValue::Bool(_) => ValueKind::Bool,
            SyncValue::U8(_) => ValueKind::U8,
            SyncValue::U16(_) => ValueKind::U16,
            SyncValue::U32(_) => ValueKind::U32,
            SyncValue::U64(_) => ValueKind::U64,
            SyncValue::I32(_) => ValueKind::I32,
            SyncValue::I64(_) => ValueKind::I64,
            SyncValue::F32(_) => ValueKind::F32,
            SyncValue::F64(_) => ValueKind::F64,
            SyncValue::String(_) => ValueKind::String,
        }
    }

    /// The zero value a freshly constructed Replica holds for this kind.
    pub fn zeroed(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Bool => SyncValue::Bool(false),
            ValueKind::U8 => SyncValue::U8(0),
            ValueKind::U16 => SyncValue::U16(0),
            ValueKind::U32 => SyncValue::U32(0),
            ValueKind::U64 => SyncValue::U64(0),
            ValueKind::I32 => SyncValue::I32(0),
            ValueKind::I64 => SyncValue::I64(0),
            ValueKind::F32 => SyncValue::F32(0.0),
            ValueKind::F64 => SyncValue::F64(0.0),
            ValueKind::String => SyncValue::String(String::new()),
        }
    }

    /// Structural equality used by change detection. Floats compare by bit
    /// pattern, so re-assigning NaN is a no-op like any other value.
    pub fn sync_eq(&self, other: &SyncValue) -> bool {
        match (self, other) {
            (SyncValue::F32(a), SyncValue::F32(b)) => a.to_bits() == b.to_bits(),
            (SyncValue::F64(a), SyncValue::F64(b)) => a.to_bits() == b.to_bits(),
            (a, b) => a == b,
        }
    }

    pub fn ser(&self, writer: &mut ByteWriter) -> Result<(), SerdeErr> {
        match self {
            SyncValue::Bool(value) => writer.write_u8(u8::from(*value)),
            SyncValue::U8(value) => writer.write_u8(*value),
            SyncValue::U16(value) => writer.write_u16(*value),
            SyncValue::U32(value) => writer.write_u32(*value),
            SyncValue::U64(value) => writer.write_u64(*value),
            SyncValue::I32(value) => writer.write_u32(*value as u32),
            SyncValue::I64(value) => writer.write_u64(*value as u64),
            SyncValue::F32(value) => writer.write_u32(value.to_bits()),
            SyncValue::F64(value) => writer.write_u64(value.to_bits()),
            SyncValue::String(value) => {
                let length = value.len();
                let max = usize::from(u16::MAX);
                if length > max {
                    return Err(SerdeErr::StringTooLong { length, max });
                }
                writer.write_u16(length as u16);
                writer.write_bytes(value.as_bytes());
            }
        }
        Ok(())
    }

    pub fn de(kind: ValueKind, reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(match kind {
            ValueKind::Bool => SyncValue::Bool(reader.read_u8()? != 0),
            ValueKind::U8 => SyncValue::U8(reader.read_u8()?),
            ValueKind::U16 => SyncValue::U16(reader.read_u16()?),
            ValueKind::U32 => SyncValue::U32(reader.read_u32()?),
            ValueKind::U64 => SyncValue::U64(reader.read_u64()?),
            ValueKind::I32 => SyncValue::I32(reader.read_u32()? as i32),
            ValueKind::I64 => SyncValue::I64(reader.read_u64()? as i64),
            ValueKind::F32 => SyncValue::F32(f32::from_bits(reader.read_u32()?)),
            ValueKind::F64 => SyncValue::F64(f64::from_bits(reader.read_u64()?)),
            ValueKind::String => {
                let length = usize::from(reader.read_u16()?);
                let bytes = reader.read_bytes(length)?;
                let string = std::str::from_utf8(bytes).map_err(|_| SerdeErr::InvalidUtf8)?;
                SyncValue::String(string.to_string())
            }
        })
    }
}

/// What one field slot stores: a typed value, or a cached stable identifier
/// for a reference-category field. The identifier is the source of truth;
/// any resolved instance is re-derived from it on every read.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Value(SyncValue),
    Entity(EntityId),
    Component(ComponentAddress),
}
