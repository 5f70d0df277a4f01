use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use tracing::{debug, warn};

use crate::app::{EventSender, SessionEvent};

use super::{EnvironmentBitmap, EnvironmentError};

const LOADER_THREAD_NAME: &str = "agentview-env-loader";

pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, EnvironmentError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HttpImageFetcher;

impl ImageFetcher for HttpImageFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, EnvironmentError> {
        let fetch_error = |source| EnvironmentError::Fetch {
            url: url.to_string(),
            source,
        };
        let response = reqwest::blocking::get(url)
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(fetch_error)?;
        let bytes = response.bytes().map_err(fetch_error)?;
        Ok(bytes.to_vec())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentRequest {
    Upload(PathBuf),
    Remote(String),
}

#[derive(Debug)]
pub struct LoadOutcome {
    pub request: EnvironmentRequest,
    pub result: Result<EnvironmentBitmap, EnvironmentError>,
}

pub struct EnvironmentLoader {
    fetcher: Arc<dyn ImageFetcher>,
    events: EventSender,
}

impl EnvironmentLoader {
    pub fn new(fetcher: Arc<dyn ImageFetcher>, events: EventSender) -> Self {
        Self { fetcher, events }
    }

    pub fn request(&self, request: EnvironmentRequest) {
        let fetcher = Arc::clone(&self.fetcher);
        let events = self.events.clone();
        debug!(request = ?request, "environment_load_requested");
        let spawned = thread::Builder::new()
            .name(LOADER_THREAD_NAME.to_string())
            .spawn(move || {
                let result = load_request(&request, fetcher.as_ref());
                if !events.send(SessionEvent::EnvironmentLoaded(LoadOutcome { request, result })) {
                    debug!("environment_load_dropped_session_gone");
                }
            });
        if let Err(error) = spawned {
            warn!(error = %error, "environment_loader_spawn_failed");
        }
    }
}

pub(crate) fn load_request(
    request: &EnvironmentRequest,
    fetcher: &dyn ImageFetcher,
) -> Result<EnvironmentBitmap, EnvironmentError> {
    let bytes = match request {
        EnvironmentRequest::Upload(path) => {
            fs::read(path).map_err(|source| EnvironmentError::ReadFile {
                path: path.clone(),
                source,
            })?
        }
        EnvironmentRequest::Remote(url) => fetcher.fetch(url)?,
    };
    EnvironmentBitmap::decode(&bytes)
}


#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::test_support::StaticFetcher;
    use super::*;
    use crate::app::EventQueue;
    use crate::environment::test_support::png_bytes;

    fn wait_for_outcome(queue: &EventQueue) -> LoadOutcome {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut events = Vec::new();
        while Instant::now() < deadline {
            queue.drain_into(&mut events);
            if let Some(event) = events.pop() {
                match event {
                    SessionEvent::EnvironmentLoaded(outcome) => return outcome,
                    other => panic!("unexpected event {other:?}"),
                }
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("loader did not report within deadline");
    }

    #[test]
    fn upload_reads_and_decodes_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("floor.png");
        fs::write(&path, png_bytes(4, 3, [1, 2, 3, 255])).expect("write png");

        let fetcher = StaticFetcher { bytes: Vec::new() };
        let bitmap = load_request(&EnvironmentRequest::Upload(path), &fetcher).expect("decode");
        assert_eq!((bitmap.width(), bitmap.height()), (4, 3));
    }

    #[test]
    fn missing_upload_reports_read_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let fetcher = StaticFetcher { bytes: Vec::new() };
        let result = load_request(
            &EnvironmentRequest::Upload(dir.path().join("missing.png")),
            &fetcher,
        );
        assert!(matches!(result, Err(EnvironmentError::ReadFile { .. })));
    }

    #[test]
    fn remote_request_decodes_fetched_bytes() {
        let fetcher = StaticFetcher {
            bytes: png_bytes(2, 2, [7, 7, 7, 255]),
        };
        let bitmap = load_request(
            &EnvironmentRequest::Remote("http://example.invalid/env.png".to_string()),
            &fetcher,
        )
        .expect("decode");
        assert_eq!(bitmap.pixel(1, 1), Some([7, 7, 7, 255]));
    }

    #[test]
    fn loader_posts_outcome_to_queue() {
        let queue = EventQueue::new();
        let loader = EnvironmentLoader::new(
            Arc::new(StaticFetcher {
                bytes: png_bytes(5, 5, [0, 0, 0, 255]),
            }),
            queue.sender(),
        );
        let request = EnvironmentRequest::Remote("http://example.invalid/a.png".to_string());
        loader.request(request.clone());

        let outcome = wait_for_outcome(&queue);
        assert_eq!(outcome.request, request);
        assert_eq!(outcome.result.expect("bitmap").width(), 5);
    }

    #[test]
    fn loader_reports_decode_failures_without_panicking() {
        let queue = EventQueue::new();
        let loader = EnvironmentLoader::new(
            Arc::new(StaticFetcher {
                bytes: b"<html>not found</html>".to_vec(),
            }),
            queue.sender(),
        );
        loader.request(EnvironmentRequest::Remote("http://example.invalid/b.png".to_string()));

        let outcome = wait_for_outcome(&queue);
        assert!(matches!(outcome.result, Err(EnvironmentError::Decode(_))));
    }
}
