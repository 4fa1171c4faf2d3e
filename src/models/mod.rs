pub mod permission;
pub mod upload;
