//! Scripted [`StudioBackend`] for controller tests.
//!
//! Responses are queued per endpoint and consumed in order. A predict
//! response can carry a delay, which under a paused tokio clock lets a test
//! decide exactly how much of the cosmetic timeline runs before the request
//! resolves. An empty queue answers like an unreachable service.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use sharp_data::{
    parse_json_body, parse_predict_response, OutputRootPath, OutputRootSelection, PredictRequest,
    PredictionResult, StudioBackend, StudioError, StudioResult, UNREACHABLE,
};

#[derive(Default)]
struct Script {
    predict: VecDeque<(Duration, StudioResult<PredictionResult>)>,
    output_root: VecDeque<StudioResult<String>>,
    select: VecDeque<StudioResult<OutputRootSelection>>,
    open: VecDeque<StudioResult<()>>,
    requests: Vec<PredictRequest>,
    output_root_calls: usize,
    select_calls: usize,
    open_calls: usize,
}

#[derive(Default)]
pub struct ScriptedBackend {
    script: Mutex<Script>,
}

fn unreachable_service<T>() -> StudioResult<T> {
    Err(StudioError::transport(None, UNREACHABLE))
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push_predict(&self, delay: Duration, result: StudioResult<PredictionResult>) {
        self.script().predict.push_back((delay, result));
    }

    /// Queue a raw HTTP answer, decoded the same way the real client does.
    pub fn push_predict_response(&self, delay: Duration, status: u16, body: &str) {
        self.push_predict(delay, parse_predict_response(status, body));
    }

    pub fn push_output_root(&self, status: u16, body: &str) {
        let result = parse_json_body::<OutputRootPath>(status, body).map(|root| root.path);
        self.script().output_root.push_back(result);
    }

    pub fn push_select(&self, status: u16, body: &str) {
        let result = parse_json_body::<OutputRootSelection>(status, body);
        self.script().select.push_back(result);
    }

    pub fn push_open(&self, result: StudioResult<()>) {
        self.script().open.push_back(result);
    }

    pub fn predict_calls(&self) -> usize {
        self.script().requests.len()
    }

    pub fn last_request(&self) -> Option<PredictRequest> {
        self.script().requests.last().cloned()
    }

    pub fn output_root_calls(&self) -> usize {
        self.script().output_root_calls
    }

    pub fn select_calls(&self) -> usize {
        self.script().select_calls
    }

    pub fn open_calls(&self) -> usize {
        self.script().open_calls
    }
}

impl StudioBackend for ScriptedBackend {
    fn predict(&self, request: PredictRequest) -> BoxFuture<'static, StudioResult<PredictionResult>> {
        let (delay, result) = {
            let mut script = self.script();
            script.requests.push(request);
            script
                .predict
                .pop_front()
                .unwrap_or_else(|| (Duration::ZERO, unreachable_service()))
        };
        // The delay counts from the call, not from the first poll.
        let delay = tokio::time::sleep(delay);
        async move {
            delay.await;
            result
        }
        .boxed()
    }

    fn output_root(&self) -> BoxFuture<'static, StudioResult<String>> {
        let mut script = self.script();
        script.output_root_calls += 1;
        let result = script.output_root.pop_front().unwrap_or_else(unreachable_service);
        futures::future::ready(result).boxed()
    }

    fn select_output_root(&self) -> BoxFuture<'static, StudioResult<OutputRootSelection>> {
        let mut script = self.script();
        script.select_calls += 1;
        let result = script.select.pop_front().unwrap_or_else(unreachable_service);
        futures::future::ready(result).boxed()
    }

    fn open_output_root(&self) -> BoxFuture<'static, StudioResult<()>> {
        let mut script = self.script();
        script.open_calls += 1;
        let result = script.open.pop_front().unwrap_or_else(unreachable_service);
        futures::future::ready(result).boxed()
    }
}
