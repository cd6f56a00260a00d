//! Smoke-test client for the chair occupancy API: sends one request, prints
//! the status code and raw body, and lets transport failures propagate.

pub mod adapter;
pub mod cli;
pub mod config;
pub mod mock;
pub mod payload;
pub mod runner;

pub use reqwest::Method;

pub use adapter::{
    Client, ReqwestTransport, RestBytes, RestError, RestErrorKind, RestFuture, RestRequest,
    RestResponse, RestResult, RestTransport,
};
pub use config::RunnerConfig;
pub use mock::{MockBehavior, MockBehaviorPlan, MockResponse, MockRestAdapter, MockRestStateSnapshot};
pub use payload::ChairUpdate;
pub use runner::{Runner, report};
