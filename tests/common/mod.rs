#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use futures::future::BoxFuture;
use sweezy_net::net::{FetchRequest, FetchResponse, Transport, TransportError, TransportErrorKind};

/// One scripted outcome for a network attempt
pub enum Step {
    Respond { status: u16, body: String, delay: Duration },
    Fail(TransportErrorKind),
}

pub fn ok(body: &str) -> Step {
    Step::Respond {
        status: 200,
        body: body.to_string(),
        delay: Duration::ZERO,
    }
}

pub fn slow_ok(body: &str, delay: Duration) -> Step {
    Step::Respond {
        status: 200,
        body: body.to_string(),
        delay,
    }
}

pub fn status(code: u16) -> Step {
    Step::Respond {
        status: code,
        body: String::new(),
        delay: Duration::ZERO,
    }
}

pub fn fail(kind: TransportErrorKind) -> Step {
    Step::Fail(kind)
}

/// Transport that replays a fixed script and counts attempts
pub struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    calls: AtomicU32,
}

impl ScriptedTransport {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transport for ScriptedTransport {
    fn send<'a>(
        &'a self,
        request: &'a FetchRequest,
    ) -> BoxFuture<'a, Result<FetchResponse, TransportError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .expect("transport called more often than scripted");

        Box::pin(async move {
            match step {
                Step::Respond {
                    status,
                    body,
                    delay,
                } => {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    Ok(FetchResponse::new(status, request.url().clone(), body))
                }
                Step::Fail(kind) => Err(TransportError::new(kind, "simulated")),
            }
        })
    }
}
