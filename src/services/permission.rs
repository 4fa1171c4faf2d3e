use std::future::Future;

use crate::models::permission::PermissionStatus;

/// Platform camera-authorization API.
pub trait CameraAccess {
    fn current_status(&self) -> PermissionStatus;

    /// Prompt the user. Resolves to whether access was granted.
    fn request_access(&self) -> impl Future<Output = bool> + Send;
}

/// Proof that camera access was authorized when a capture started.
/// Only [`PermissionGate::authorize`] can create one.
#[derive(Debug)]
pub struct AuthorizedCapture {
    _private: (),
}

/// Decides whether the capture flow may open the camera.
pub struct PermissionGate<A> {
    access: A,
}

impl<A: CameraAccess> PermissionGate<A> {
    pub fn new(access: A) -> Self {
        Self { access }
    }

    pub fn status(&self) -> PermissionStatus {
        self.access.current_status()
    }

    /// Only an undetermined status can still be turned into a prompt.
    pub fn can_request(&self) -> bool {
        self.status() == PermissionStatus::NotDetermined
    }

    pub fn is_denied(&self) -> bool {
        self.status() == PermissionStatus::Denied
    }

    /// Resolve to whether the camera may be used, prompting only when the
    /// user has not decided yet.
    pub async fn request(&self) -> bool {
        match self.status() {
            PermissionStatus::Authorized => true,
            PermissionStatus::NotDetermined => {
                let granted = self.access.request_access().await;
                tracing::info!(granted, "Camera permission prompt answered");
                granted
            }
            status @ (PermissionStatus::Denied | PermissionStatus::Restricted) => {
                tracing::debug!(%status, "Camera permission unavailable, not prompting");
                false
            }
        }
    }

    pub async fn authorize(&self) -> Result<AuthorizedCapture, PermissionError> {
        if self.request().await {
            return Ok(AuthorizedCapture { _private: () });
        }
        match self.status() {
            PermissionStatus::Restricted => Err(PermissionError::Restricted),
            _ => Err(PermissionError::Denied),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PermissionError {
    #[error("Camera access denied; enable it in Settings")]
    Denied,

    #[error("Camera access is restricted on this device")]
    Restricted,
}
