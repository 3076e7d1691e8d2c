use log::debug;

use crate::actions::LoadRequest;

/// Loader-side guard against out-of-order dataset responses.
///
/// Loads are never cancelled, so a slow response for an older address can
/// arrive after a newer one was requested. The canonical key of each request
/// is its fencing token; only a response carrying the latest token is admitted.
#[derive(Debug, Clone, Default)]
pub struct LoadFence {
    latest: Option<String>,
}

impl LoadFence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a request as the newest one.
    pub fn issue(&mut self, request: &LoadRequest) {
        self.latest = Some(request.key.clone());
    }

    pub fn latest(&self) -> Option<&str> {
        self.latest.as_deref()
    }

    pub fn accepts(&self, key: &str) -> bool {
        self.latest.as_deref() == Some(key)
    }

    /// Passes `payload` through if `key` is still the latest token.
    pub fn admit<T>(&self, key: &str, payload: T) -> Option<T> {
        if self.accepts(key) {
            Some(payload)
        } else {
            debug!("discarding stale dataset response for {key}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(key: &str) -> LoadRequest {
        LoadRequest {
            key: key.to_string(),
            address: format!("/{key}/"),
        }
    }

    #[test]
    fn test_stale_response_discarded() {
        let mut fence = LoadFence::new();
        assert!(!fence.accepts("zika"));

        fence.issue(&request("zika"));
        fence.issue(&request("ebola"));

        assert_eq!(fence.admit("zika", 1), None);
        assert_eq!(fence.admit("ebola", 2), Some(2));
        assert_eq!(fence.latest(), Some("ebola"));
    }
}
