//! DTO mappers between the domain models and the `shared` wire types.

pub mod lesson_mapper;
pub mod student_mapper;
