pub mod crypto;
pub mod pagination;
pub mod token;
pub mod validation;
