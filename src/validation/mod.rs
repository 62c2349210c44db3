pub mod field_validator;
pub mod phone;
pub mod postal;

pub use field_validator::{FieldConstraint, FieldConstraintValidator, SanitizeReport};
pub use phone::PhoneNormalizer;
