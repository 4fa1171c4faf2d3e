pub mod capture;
pub mod monitor;
pub mod multipart;
pub mod permission;
pub mod upload;
