use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use serde_json::Value;

use super::request::{ProviderResponse, Transport};
use super::{FetchError, FetchResult};

#[derive(Clone)]
struct Scripted {
    delay: Duration,
    outcome: FetchResult<ProviderResponse>,
}

#[derive(Default)]
struct ScriptState {
    scripts: HashMap<String, Scripted>,
    calls: Vec<String>,
    answered: Vec<String>,
}

/// In-memory provider keyed by the request's keyword or symbol. Unscripted subjects fail.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, subject: &str, delay: Duration, body: Value) {
        self.script(
            subject,
            delay,
            Ok(ProviderResponse {
                status: 200,
                body: body.to_string(),
            }),
        );
    }

    pub fn respond_status(&self, subject: &str, status: u16, body: &str) {
        self.script(
            subject,
            Duration::ZERO,
            Ok(ProviderResponse {
                status,
                body: body.to_string(),
            }),
        );
    }

    pub fn fail(&self, subject: &str, delay: Duration, err: FetchError) {
        self.script(subject, delay, Err(err));
    }

    /// Subjects requested so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Subjects whose scripted delay ran out and whose response was handed back.
    /// A request abandoned mid-delay never shows up here.
    pub fn answered(&self) -> Vec<String> {
        self.state.lock().unwrap().answered.clone()
    }

    fn script(&self, subject: &str, delay: Duration, outcome: FetchResult<ProviderResponse>) {
        self.state
            .lock()
            .unwrap()
            .scripts
            .insert(subject.to_string(), Scripted { delay, outcome });
    }
}

impl Transport for ScriptedTransport {
    fn get<'a>(
        &'a self,
        params: &'a [(&'static str, String)],
    ) -> BoxFuture<'a, FetchResult<ProviderResponse>> {
        let subject = params.get(1).map(|(_, value)| value.clone()).unwrap_or_default();
        let scripted = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(subject.clone());
            state.scripts.get(&subject).cloned()
        };

        Box::pin(async move {
            let Some(Scripted { delay, outcome }) = scripted else {
                return Err(FetchError::Unknown(format!("unscripted subject `{subject}`")));
            };
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            self.state.lock().unwrap().answered.push(subject);
            outcome
        })
    }
}
