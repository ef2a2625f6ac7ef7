pub mod codec;
pub mod component;
pub mod config;
pub mod entity;
pub mod registry;
pub mod resolver;
