pub mod auth_dto;
pub mod document_dto;
pub mod tutor_dto;
