//! In-memory transport for deterministic tests. Records every outbound request
//! and answers from per-route queues, or injects transport failures from a
//! behavior plan.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use bytes::Bytes;
use reqwest::Method;

use super::adapter::{
    RestBytes, RestError, RestErrorKind, RestFuture, RestRequest, RestResponse, RestResult,
    RestTransport,
};

#[derive(Clone, Debug, Default)]
pub enum MockBehavior {
    #[default]
    Pass,
    Delay(Duration),
    ConnectError(String),
    SendError(String),
    ReceiveError(String),
    TimeoutError(String),
}

impl MockBehavior {
    pub fn delay(ms: u64) -> Self {
        Self::Delay(Duration::from_millis(ms))
    }

    pub fn connect_error(reason: impl Into<String>) -> Self {
        Self::ConnectError(reason.into())
    }

    pub fn send_error(reason: impl Into<String>) -> Self {
        Self::SendError(reason.into())
    }

    pub fn receive_error(reason: impl Into<String>) -> Self {
        Self::ReceiveError(reason.into())
    }

    pub fn timeout_error(reason: impl Into<String>) -> Self {
        Self::TimeoutError(reason.into())
    }
}

#[derive(Clone, Debug, Default)]
pub struct MockBehaviorPlan {
    request: VecDeque<MockBehavior>,
}

impl MockBehaviorPlan {
    pub fn push(&mut self, behavior: MockBehavior) -> &mut Self {
        self.request.push_back(behavior);
        self
    }

    fn pop(&mut self) -> MockBehavior {
        self.request.pop_front().unwrap_or_default()
    }
}

#[derive(Clone, Debug)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(String, RestBytes)>,
    pub body: RestBytes,
}

impl MockResponse {
    pub fn new(status: u16, body: impl Into<RestBytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        let body: String = body.into();
        Self::new(status, body)
    }
}

#[derive(Clone, Debug)]
pub struct MockRestStateSnapshot {
    pub request_count: usize,
    pub last_url: Option<String>,
    pub last_status: Option<u16>,
    pub behavior_remaining: usize,
    pub last_error: Option<String>,
}

#[derive(Debug, Default)]
struct MockRestAdapterState {
    request_count: usize,
    last_url: Option<String>,
    last_status: Option<u16>,
    behavior_plan: MockBehaviorPlan,
    default_response_queue: VecDeque<MockResponse>,
    route_response_queues: HashMap<(Method, String), VecDeque<MockResponse>>,
    outbound_log: Vec<RestRequest>,
    last_error: Option<String>,
}

impl MockRestAdapterState {
    fn snapshot(&self) -> MockRestStateSnapshot {
        MockRestStateSnapshot {
            request_count: self.request_count,
            last_url: self.last_url.clone(),
            last_status: self.last_status,
            behavior_remaining: self.behavior_plan.request.len(),
            last_error: self.last_error.clone(),
        }
    }

    fn next_response(&mut self, request: &RestRequest) -> Option<MockResponse> {
        let route_key = (request.method.clone(), request.url.clone());
        if let Some(response) = self
            .route_response_queues
            .get_mut(&route_key)
            .and_then(VecDeque::pop_front)
        {
            return Some(response);
        }
        self.default_response_queue.pop_front()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MockRestAdapter {
    state: Arc<Mutex<MockRestAdapterState>>,
}

impl MockRestAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behavior_plan(behavior_plan: MockBehaviorPlan) -> Self {
        let state = MockRestAdapterState {
            behavior_plan,
            ..MockRestAdapterState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn with_behavior(behavior: MockBehavior) -> Self {
        let mut plan = MockBehaviorPlan::default();
        plan.push(behavior);
        Self::with_behavior_plan(plan)
    }

    pub fn snapshot(&self) -> MockRestStateSnapshot {
        self.state
            .lock()
            .expect("mock transport mutex poisoned while taking snapshot")
            .snapshot()
    }

    pub fn queue_response(&self, response: MockResponse) {
        self.state
            .lock()
            .expect("mock transport mutex poisoned while queueing response")
            .default_response_queue
            .push_back(response);
    }

    pub fn queue_response_for(&self, method: Method, url: impl Into<String>, response: MockResponse) {
        self.state
            .lock()
            .expect("mock transport mutex poisoned while queueing response by route")
            .route_response_queues
            .entry((method, url.into()))
            .or_default()
            .push_back(response);
    }

    pub fn queue_post_response(&self, url: impl Into<String>, response: MockResponse) {
        self.queue_response_for(Method::POST, url, response);
    }

    pub fn queue_get_response(&self, url: impl Into<String>, response: MockResponse) {
        self.queue_response_for(Method::GET, url, response);
    }

    /// Every request the transport has seen, oldest first.
    pub fn outbound(&self) -> Vec<RestRequest> {
        self.state
            .lock()
            .expect("mock transport mutex poisoned while reading outbound log")
            .outbound_log
            .clone()
    }

    pub fn last_request(&self) -> Option<RestRequest> {
        self.state
            .lock()
            .expect("mock transport mutex poisoned while reading outbound log")
            .outbound_log
            .last()
            .cloned()
    }

    fn fail(&self, kind: RestErrorKind, reason: String) -> RestError {
        let mut state = self
            .state
            .lock()
            .expect("mock transport mutex poisoned while recording error");
        state.last_error = Some(reason.clone());
        state.last_status = None;
        RestError::new(kind, None, reason)
    }
}

impl RestTransport for MockRestAdapter {
    fn execute(&self, request: RestRequest) -> RestFuture<RestResult<RestResponse>> {
        let adapter = self.clone();
        Box::pin(async move {
            let start = Instant::now();
            let behavior = {
                let mut state = adapter
                    .state
                    .lock()
                    .expect("mock transport mutex poisoned while recording request");
                state.request_count += 1;
                state.last_url = Some(request.url.clone());
                state.last_error = None;
                state.outbound_log.push(request.clone());
                state.behavior_plan.pop()
            };

            match behavior {
                MockBehavior::Pass => {}
                MockBehavior::Delay(duration) => tokio::time::sleep(duration).await,
                MockBehavior::ConnectError(reason) => {
                    return Err(adapter.fail(RestErrorKind::Connect, reason));
                }
                MockBehavior::SendError(reason) => {
                    return Err(adapter.fail(RestErrorKind::Send, reason));
                }
                MockBehavior::ReceiveError(reason) => {
                    return Err(adapter.fail(RestErrorKind::Receive, reason));
                }
                MockBehavior::TimeoutError(reason) => {
                    return Err(adapter.fail(RestErrorKind::Timeout, reason));
                }
            }

            let mut state = adapter
                .state
                .lock()
                .expect("mock transport mutex poisoned while selecting response");
            // An empty queue answers 200 with no body.
            let response = state
                .next_response(&request)
                .unwrap_or_else(|| MockResponse::new(200, Bytes::new()));
            state.last_status = Some(response.status);

            Ok(RestResponse {
                status: response.status,
                headers: response.headers,
                body: response.body,
                elapsed: start.elapsed(),
            })
        })
    }
}
