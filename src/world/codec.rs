//! Full-snapshot and incremental-delta serialization of one Replica.
//!
//! Full mode writes every field in declaration order with no prefix and is
//! used for initial-state transfer. Delta mode writes the dirty mask as
//! 8 bytes little-endian, then only the dirty fields in ascending slot
//! order; fields absent from the mask keep their prior value on the
//! receiver. An outer aggregator composes these per-Component payloads
//! into one message per Entity per tick.

use crate::{
    serde::{ByteReader, ByteWriter, SerdeErr},
    world::{
        component::{
            dirty::DirtyMask,
            layout::FieldCategory,
            replica::Replica,
            value::{FieldValue, SyncValue},
        },
        entity::ComponentAddress,
    },
};

impl Replica {
    /// Writes every field's current value, dirty or not.
    pub fn serialize_all(&self, writer: &mut ByteWriter) -> Result<(), SerdeErr> {
        for def in self.layout().fields() {
            write_field(self.raw_field(def.slot()), writer)?;
        }
        Ok(())
    }

    /// Reads a full snapshot, applying every field through the normal
    /// write path (change detection, dirty marking, hooks).
    pub fn deserialize_all(&mut self, reader: &mut ByteReader) -> Result<(), SerdeErr> {
        let count = self.layout().field_count();
        for slot in 0..count {
            let value = read_field(self, slot, reader)?;
            self.store_and_notify(slot, value);
        }
        Ok(())
    }

    /// Writes the dirty mask, then only the dirty fields in ascending slot
    /// order. Returns the mask that was written so the caller can clear
    /// exactly those bits once the payload is handed to the transport.
    pub fn serialize_delta(&self, writer: &mut ByteWriter) -> Result<DirtyMask, SerdeErr> {
        let mask = self.dirty_mask();
        writer.write_u64(mask.to_bits());
        for def in self.layout().fields() {
            if mask.bit(def.slot()) {
                write_field(self.raw_field(def.slot()), writer)?;
            }
        }
        Ok(mask)
    }

    /// Reads a delta: mask first, then each listed field in ascending slot
    /// order. Unlisted fields keep their prior value. A mask bit with no
    /// declared slot means sender and receiver disagree on the layout.
    pub fn deserialize_delta(&mut self, reader: &mut ByteReader) -> Result<(), SerdeErr> {
        let bits = reader.read_u64()?;
        let stray = bits & !self.layout().slot_mask();
        if stray != 0 {
            return Err(SerdeErr::UnknownDirtyBit {
                slot: stray.trailing_zeros() as u8,
            });
        }
        let mask = DirtyMask::from_bits(bits);
        let count = self.layout().field_count();
        for slot in 0..count {
            if mask.bit(slot) {
                let value = read_field(self, slot, reader)?;
                self.store_and_notify(slot, value);
            }
        }
        Ok(())
    }
}

fn write_field(field: &FieldValue, writer: &mut ByteWriter) -> Result<(), SerdeErr> {
    match field {
        FieldValue::Value(value) => value.ser(writer)?,
        // reference categories serialize as their stable identifier,
        // never as a handle
        FieldValue::Entity(id) => writer.write_u32(*id),
        FieldValue::Component(address) => {
            writer.write_u32(address.entity_id);
            writer.write_u8(address.component_index);
        }
    }
    Ok(())
}

fn read_field(replica: &Replica, slot: u8, reader: &mut ByteReader) -> Result<FieldValue, SerdeErr> {
    let category = replica
        .layout()
        .field(slot)
        .map(|def| def.category())
        .ok_or(SerdeErr::UnknownDirtyBit { slot })?;
    Ok(match category {
        FieldCategory::Value(kind) => FieldValue::Value(SyncValue::de(kind, reader)?),
        FieldCategory::EntityRef => FieldValue::Entity(reader.read_u32()?),
        FieldCategory::ComponentRef => {
            let entity_id = reader.read_u32()?;
            let component_index = reader.read_u8()?;
            let address = ComponentAddress::new(entity_id, component_index);
            FieldValue::Component(if address.is_none() {
                ComponentAddress::NONE
            } else {
                address
            })
        }
    })
}
