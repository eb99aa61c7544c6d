pub mod crypto;
pub mod json_extract;
pub mod pdf;
pub mod text;
pub mod token;
