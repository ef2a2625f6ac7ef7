use thiserror::Error;

/// Fatal configuration errors surfaced while building a `ReplicaLayout`,
/// before any runtime traffic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// More than 64 synchronized fields declared for one Component
    #[error("'{type_name}' declares {count} synchronized fields, more than the limit of 64. Consider splitting the type into multiple components")]
    TooManyFields { type_name: String, count: usize },

    /// Two fields share a name within one layout
    #[error("'{type_name}' declares field '{field}' more than once")]
    DuplicateField { type_name: String, field: String },

    /// Array/collection shapes are not synchronizable field declarations
    #[error("Field '{field}' has an array shape, which synchronized fields do not support")]
    UnsupportedFieldShape { field: String },

    /// No registered hook carries the requested name
    #[error("Could not find hook '{hook}' for field '{field}'. Hooks take (old_value, new_value) of the field's declared type")]
    HookNotFound { field: String, hook: String },

    /// A hook with the name exists, but its parameter type does not match
    /// the field's declared type exactly
    #[error("Wrong parameter type in hook '{hook}' for field '{field}'. Both hook parameters must have the field's exact declared type")]
    HookSignatureMismatch { field: String, hook: String },

    /// More than one registered hook matches both name and parameter type
    #[error("Hook '{hook}' for field '{field}' is ambiguous: multiple registered hooks match")]
    HookAmbiguous { field: String, hook: String },
}

/// Runtime accessor errors. These are programmer errors (bad slot, wrong
/// category) and never interrupt the data path silently.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplicaError {
    /// Slot index outside the layout's declared fields
    #[error("'{type_name}' has no field at slot {slot}")]
    UnknownSlot { type_name: String, slot: u8 },

    /// Field name not declared in the layout
    #[error("'{type_name}' has no field named '{field}'")]
    UnknownField { type_name: String, field: String },

    /// Accessor category does not match the field's declared category
    #[error("Field '{field}' is {declared}, not {requested}")]
    CategoryMismatch {
        field: String,
        declared: &'static str,
        requested: &'static str,
    },

    /// Value kind does not match the field's declared kind
    #[error("Field '{field}' holds {expected} values, got {found}")]
    KindMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
}
