pub mod aliases;
pub mod profile;
