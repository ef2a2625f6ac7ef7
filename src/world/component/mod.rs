pub mod dirty;
pub mod error;
pub mod hooks;
pub mod layout;
pub mod replica;
pub mod value;
