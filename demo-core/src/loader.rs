use core::time::Duration;

use instant::Instant;
use log::info;
use phylo_view::{LoadFence, LoadRequest};

/// Stand-in for the dataset fetcher: every request completes after a fixed
/// latency, and completions for superseded keys are dropped by the fence.
#[derive(Debug, Clone)]
pub struct DemoLoader {
    latency: Duration,
    fence: LoadFence,
    in_flight: Vec<(LoadRequest, Instant)>,
    discarded: usize,
}

impl DemoLoader {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            fence: LoadFence::new(),
            in_flight: Vec::new(),
            discarded: 0,
        }
    }

    pub fn set_latency(&mut self, latency: Duration) {
        self.latency = latency;
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    pub fn request(&mut self, request: LoadRequest, now: Instant) {
        info!("fetching {} ({} in flight)", request.key, self.in_flight.len());
        self.fence.issue(&request);
        self.in_flight.push((request, now + self.latency));
    }

    pub fn is_busy(&self) -> bool {
        !self.in_flight.is_empty()
    }

    /// Number of responses that arrived after a newer request.
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    /// Completes every due request and returns the key of the one admitted.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        let (due, pending): (Vec<_>, Vec<_>) = self
            .in_flight
            .drain(..)
            .partition(|(_, ready_at)| *ready_at <= now);
        self.in_flight = pending;

        let mut admitted = None;
        for (request, _) in due {
            match self.fence.admit(&request.key, request.key.clone()) {
                Some(key) => admitted = Some(key),
                None => self.discarded += 1,
            }
        }
        admitted
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
    fn test_completes_after_latency() {
        let t0 = Instant::now();
        let mut loader = DemoLoader::new(Duration::from_millis(300));
        loader.request(request("zika"), t0);
        assert_eq!(loader.poll(t0 + Duration::from_millis(100)), None);
        assert!(loader.is_busy());
        assert_eq!(
            loader.poll(t0 + Duration::from_millis(300)),
            Some("zika".to_string())
        );
        assert!(!loader.is_busy());
    }

    #[test]
    fn test_superseded_response_dropped() {
        let t0 = Instant::now();
        let mut loader = DemoLoader::new(Duration::from_millis(300));
        loader.request(request("zika"), t0);
        loader.set_latency(Duration::from_millis(600));
        loader.request(request("ebola"), t0 + Duration::from_millis(50));

        // zika lands first but ebola was requested after it
        assert_eq!(loader.poll(t0 + Duration::from_millis(400)), None);
        assert_eq!(loader.discarded(), 1);
        assert_eq!(
            loader.poll(t0 + Duration::from_millis(700)),
            Some("ebola".to_string())
        );
    }
}
