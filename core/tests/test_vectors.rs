//! Verify settlement against JSON test vectors stored in `test-vectors/`.
//!
//! Each case lists upload progress to replay, the load event the transport
//! reports, and the expected observer calls and outcome. Progress and load
//! entries deserialize straight into the event types; resolved values are
//! compared as parsed JSON.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use xhr_core::{
    ControllerOptions, EventSink, HttpMethod, LoadEvent, Payload, ProgressEvent, RequestConfig,
    RequestController, RequestError, Transport,
};

/// Replays a fixed script of events as soon as the request is sent.
struct ReplayTransport {
    progress: Vec<ProgressEvent>,
    load: LoadEvent,
    events: Mutex<Option<EventSink>>,
}

impl Transport for ReplayTransport {
    fn open(&self, _method: HttpMethod, _url: &str) {}

    fn set_with_credentials(&self, _with_credentials: bool) {}

    fn set_request_header(&self, _name: &str, _value: &str) {}

    fn attach(&self, events: EventSink) {
        *self.events.lock() = Some(events);
    }

    fn send(&self, _payload: Payload) {
        let Some(events) = self.events.lock().clone() else {
            return;
        };
        for event in &self.progress {
            events.upload_progress(*event);
        }
        events.load(self.load.clone());
    }

    fn abort(&self) {}
}

#[tokio::test]
async fn outcome_test_vectors() {
    let raw = include_str!("../../test-vectors/outcomes.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let options = ControllerOptions {
        success_status: vectors["success_status"].as_u64().unwrap() as u16,
    };

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let load: LoadEvent = serde_json::from_value(case["load"].clone()).unwrap();
        let transport = Arc::new(ReplayTransport {
            progress: serde_json::from_value(case["progress"].clone()).unwrap(),
            load: load.clone(),
            events: Mutex::new(None),
        });
        let controller = RequestController::with_options(
            move || transport.clone() as Arc<dyn Transport>,
            options,
        );

        let percents = Arc::new(Mutex::new(Vec::new()));
        let recorded = percents.clone();
        let completions = Arc::new(AtomicUsize::new(0));
        let completed = completions.clone();
        let config = RequestConfig::new("http://localhost:3000/vectors")
            .on_progress(move |percent, _| recorded.lock().push(u64::from(percent)))
            .on_complete(move || {
                completed.fetch_add(1, Ordering::SeqCst);
            });

        let outcome = controller.execute(config).await;

        let expected_progress: Vec<u64> = case["expected_progress"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p.as_u64().unwrap())
            .collect();
        assert_eq!(*percents.lock(), expected_progress, "{name}: progress");
        assert_eq!(
            completions.load(Ordering::SeqCst) as u64,
            case["expected_complete"].as_u64().unwrap(),
            "{name}: completions"
        );

        let expected = &case["expected"];
        if let Some(resolved) = expected.get("resolved") {
            assert_eq!(&outcome.unwrap(), resolved, "{name}: resolved value");
            continue;
        }
        let err = outcome.unwrap_err();
        match expected["rejected"].as_str().unwrap() {
            "RequestFailed" => {
                let status = expected["status"].as_u64().unwrap() as u16;
                assert_eq!(err.status(), Some(status), "{name}: status");
                assert_eq!(
                    err.to_string(),
                    format!("HTTP {status}: {}", load.response_text),
                    "{name}: message"
                );
            }
            "DecodeFailed" => {
                assert!(matches!(err, RequestError::DecodeFailed(_)), "{name}: {err:?}");
            }
            other => panic!("{name}: unknown rejection kind {other}"),
        }
    }
}
