use std::sync::Arc;

use crate::world::component::{
    dirty::MAX_SYNC_FIELDS,
    error::LayoutError,
    hooks::ChangeHook,
    replica::Replica,
    value::{FieldValue, ValueKind},
};

/// A synchronized field's category, which selects its accessor pair and
/// wire encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCategory {
    /// A plain value, compared structurally.
    Value(ValueKind),
    /// A reference to another networked entity, carried as its entity id.
    EntityRef,
    /// A reference to a component of another networked entity, carried as
    /// (entity id, component index).
    ComponentRef,
}

impl FieldCategory {
    pub fn name(&self) -> &'static str {
        match self {
            FieldCategory::Value(kind) => kind.name(),
            FieldCategory::EntityRef => "EntityRef",
            FieldCategory::ComponentRef => "ComponentRef",
        }
    }
}

/// Declared shape of a field. Only `Single` survives layout build; array
/// declarations are rejected as a configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    Single,
    Array,
}

/// One field's build-time record: slot index, category, optional bound hook.
#[derive(Clone)]
pub struct FieldDef {
    name: String,
    slot: u8,
    category: FieldCategory,
    hook: Option<ChangeHook>,
}

impl FieldDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slot(&self) -> u8 {
        self.slot
    }

    pub fn category(&self) -> FieldCategory {
        self.category
    }

    pub fn hook(&self) -> Option<&ChangeHook> {
        self.hook.as_ref()
    }
}

/// The immutable field table of one Component type. Built once per type at
/// setup time, then shared (`Arc`) by every Replica instance of that type,
/// authoritative and remote alike.
pub struct ReplicaLayout {
    type_name: String,
    fields: Vec<FieldDef>,
}

impl ReplicaLayout {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn field_count(&self) -> u8 {
        self.fields.len() as u8
    }

    pub fn field(&self, slot: u8) -> Option<&FieldDef> {
        self.fields.get(usize::from(slot))
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter()
    }

    pub fn slot_of(&self, name: &str) -> Option<u8> {
        self.fields
            .iter()
            .position(|field| field.name == name)
            .map(|index| index as u8)
    }

    /// Mask with a bit set for every declared slot. Incoming delta masks
    /// must be a subset of this.
    pub fn slot_mask(&self) -> u64 {
        let count = self.fields.len();
        if count == usize::from(MAX_SYNC_FIELDS) {
            u64::MAX
        } else {
            (1u64 << count) - 1
        }
    }
}

impl std::fmt::Debug for ReplicaLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicaLayout")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields.len())
            .finish()
    }
}

struct PendingField {
    name: String,
    category: FieldCategory,
    shape: FieldShape,
    hook_name: Option<String>,
}

struct HookCandidate {
    name: String,
    param: FieldCategory,
    func: ChangeHook,
}

/// Builds a `ReplicaLayout` from field declarations, standing in for the
/// code-generation step that supplies slot indices, categories and hook
/// bindings in the original system. Declaration order is slot order; a
/// derived type extends its base layout and continues numbering after the
/// base's highest slot.
pub struct LayoutBuilder {
    type_name: String,
    base: Vec<FieldDef>,
    pending: Vec<PendingField>,
    hooks: Vec<HookCandidate>,
}

impl LayoutBuilder {
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            base: Vec::new(),
            pending: Vec::new(),
            hooks: Vec::new(),
        }
    }

    /// Starts a derived type's layout: the base layout's fields (and bound
    /// hooks) carry over, and new slots continue after them. Base layouts
    /// must be built before derived ones.
    pub fn extending(type_name: &str, base: &ReplicaLayout) -> Self {
        Self {
            type_name: type_name.to_string(),
            base: base.fields.clone(),
            pending: Vec::new(),
            hooks: Vec::new(),
        }
    }

    pub fn field(self, name: &str, category: FieldCategory) -> Self {
        self.declare(name, category, FieldShape::Single, None)
    }

    pub fn array_field(self, name: &str, category: FieldCategory) -> Self {
        self.declare(name, category, FieldShape::Array, None)
    }

    pub fn hooked_field(self, name: &str, category: FieldCategory, hook_name: &str) -> Self {
        self.declare(name, category, FieldShape::Single, Some(hook_name.to_string()))
    }

    /// Registers a hook candidate. `param` is the declared type of both of
    /// the hook's (old_value, new_value) parameters; binding requires an
    /// exact match with the hooked field's declared type.
    pub fn hook<F>(mut self, name: &str, param: FieldCategory, func: F) -> Self
    where
        F: Fn(&mut Replica, &FieldValue, &FieldValue) + Send + Sync + 'static,
    {
        self.hooks.push(HookCandidate {
            name: name.to_string(),
            param,
            func: Arc::new(func),
        });
        self
    }

    fn declare(
        mut self,
        name: &str,
        category: FieldCategory,
        shape: FieldShape,
        hook_name: Option<String>,
    ) -> Self {
        self.pending.push(PendingField {
            name: name.to_string(),
            category,
            shape,
            hook_name,
        });
        self
    }

    pub fn build(self) -> Result<ReplicaLayout, LayoutError> {
        let total = self.base.len() + self.pending.len();
        if total > usize::from(MAX_SYNC_FIELDS) {
            return Err(LayoutError::TooManyFields {
                type_name: self.type_name,
                count: total,
            });
        }

        let mut fields = self.base;
        for pending in self.pending {
            if pending.shape == FieldShape::Array {
                return Err(LayoutError::UnsupportedFieldShape {
                    field: pending.name,
                });
            }
            if fields.iter().any(|field| field.name == pending.name) {
                return Err(LayoutError::DuplicateField {
                    type_name: self.type_name,
                    field: pending.name,
                });
            }

            let hook = match &pending.hook_name {
                Some(hook_name) => Some(Self::bind_hook(
                    &self.hooks,
                    &pending.name,
                    hook_name,
                    pending.category,
                )?),
                None => None,
            };

            let slot = fields.len() as u8;
            fields.push(FieldDef {
                name: pending.name,
                slot,
                category: pending.category,
                hook,
            });
        }

        Ok(ReplicaLayout {
            type_name: self.type_name,
            fields,
        })
    }

    fn bind_hook(
        hooks: &[HookCandidate],
        field: &str,
        hook_name: &str,
        declared: FieldCategory,
    ) -> Result<ChangeHook, LayoutError> {
        let named: Vec<&HookCandidate> = hooks
            .iter()
            .filter(|candidate| candidate.name == hook_name)
            .collect();
        if named.is_empty() {
            return Err(LayoutError::HookNotFound {
                field: field.to_string(),
                hook: hook_name.to_string(),
            });
        }

        let mut matching = named
            .iter()
            .filter(|candidate| candidate.param == declared);
        let Some(first) = matching.next() else {
            return Err(LayoutError::HookSignatureMismatch {
                field: field.to_string(),
                hook: hook_name.to_string(),
            });
        };
        if matching.next().is_some() {
            return Err(LayoutError::HookAmbiguous {
                field: field.to_string(),
                hook: hook_name.to_string(),
            });
        }

        Ok(first.func.clone())
    }
}
