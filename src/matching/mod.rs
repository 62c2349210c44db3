pub mod address;
pub mod caste;
pub mod education;
pub mod gender;
pub mod matcher;
