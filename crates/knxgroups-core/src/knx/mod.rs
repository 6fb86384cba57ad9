pub mod adapter;
pub mod address;
pub mod model;
pub mod namespace;
pub mod parsers;
pub mod xml_tags;
pub mod xml_utils;

pub use adapter::{load_project_data_bytes, InvalidPasswordError, PasswordRequiredError};
pub use model::*;
pub use namespace::NamespaceContext;
