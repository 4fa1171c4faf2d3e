//! ECG capture digitization client
//!
//! This library provides the client side of the ecg-digitize system: it
//! packages a captured ECG image as a multipart upload, sends it to a remote
//! digitization service and interprets the service's structured answer.

pub mod config;
pub mod models;
pub mod services;
