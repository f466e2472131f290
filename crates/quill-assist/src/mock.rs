//! Mock assist backend for deterministic testing.
//!
//! Implements [`quill_core::AssistBackend`] without network access. Responses
//! are canned, per-input mappings can be registered, and every call is logged
//! for assertion.
//!
//! ## Usage
//!
//! ```rust
//! use quill_assist::mock::MockAssistBackend;
//! use quill_core::AssistBackend;
//!
//! # async fn example() {
//! let backend = MockAssistBackend::new().with_fixed_response("Short summary");
//!
//! let summary = backend.summarize("a long passage").await.unwrap();
//! assert_eq!(summary, "Short summary");
//! assert_eq!(backend.call_count("summarize"), 1);
//! # }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use quill_core::{AssistBackend, Error, Result};

/// Mock assist backend for testing.
#[derive(Clone)]
pub struct MockAssistBackend {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

#[derive(Debug, Clone)]
struct MockConfig {
    fixed_responses: HashMap<String, String>,
    default_response: String,
    fail_all: bool,
}

/// One recorded invocation of the mock.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: String,
    pub input: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            fixed_responses: HashMap::new(),
            default_response: "Mock assist response".to_string(),
            fail_all: false,
        }
    }
}

impl MockAssistBackend {
    /// Create a new mock backend with default configuration.
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the response returned for any unmapped input.
    pub fn with_fixed_response(mut self, response: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).default_response = response.into();
        self
    }

    /// Add a response mapping for a specific input text.
    pub fn with_response_mapping(
        mut self,
        input: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Arc::make_mut(&mut self.config)
            .fixed_responses
            .insert(input.into(), output.into());
        self
    }

    /// Make every call return `Error::Assist` for error-path testing.
    pub fn with_failures(mut self) -> Self {
        Arc::make_mut(&mut self.config).fail_all = true;
        self
    }

    /// Get all logged calls for assertion.
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// Clear the call log.
    pub fn clear_calls(&self) {
        self.call_log.lock().unwrap().clear()
    }

    /// Count calls to a specific operation.
    pub fn call_count(&self, operation: &str) -> usize {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    fn log_call(&self, operation: &str, input: &str) {
        self.call_log.lock().unwrap().push(MockCall {
            operation: operation.to_string(),
            input: input.to_string(),
        });
    }

    fn respond(&self, operation: &str, input: &str) -> Result<String> {
        self.log_call(operation, input);

        if self.config.fail_all {
            return Err(Error::Assist("simulated assist failure".to_string()));
        }

        if let Some(response) = self.config.fixed_responses.get(input) {
            return Ok(response.clone());
        }

        Ok(self.config.default_response.clone())
    }
}

impl Default for MockAssistBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssistBackend for MockAssistBackend {
    async fn summarize(&self, text: &str) -> Result<String> {
        self.respond("summarize", text)
    }

    async fn keypoints(&self, text: &str) -> Result<String> {
        self.respond("keypoints", text)
    }

    async fn stylize(&self, text: &str, _style: &str) -> Result<String> {
        self.respond("stylize", text)
    }

    async fn process_pdf(&self, filename: &str, _data: Vec<u8>) -> Result<String> {
        self.respond("process_pdf", filename)
    }

    async fn query_pdf(&self, collection_name: &str, question: &str) -> Result<String> {
        let _ = collection_name;
        self.respond("query_pdf", question)
    }

    async fn delete_pdf(&self, collection_name: &str) -> Result<()> {
        self.respond("delete_pdf", collection_name).map(|_| ())
    }
}
