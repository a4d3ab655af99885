use std::env;

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub synthesis_model: Option<String>,
    pub tag_model: Option<String>,
}

/// What the merge step does when a concurrent fan-out call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanoutPolicy {
    /// Any fan-out failure fails the whole batch with the first error.
    AbortOnFailure,
    /// Failed variants are dropped with a warning; the batch completes with
    /// whatever survived (always at least the determining result).
    KeepPartial,
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub fanout_policy: FanoutPolicy,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            api_key: None,
            api_base: None,
            synthesis_model: None,
            tag_model: None,
        }
    }
}

impl GeminiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let api_key = env::var("GEMINI_API_KEY")
            .or_else(|_| env::var("GOOGLE_API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());
        let api_base = env::var("GEMINI_API_BASE").ok();
        let synthesis_model = env::var("GEMINI_SYNTHESIS_MODEL").ok();
        let tag_model = env::var("GEMINI_TAG_MODEL").ok();

        GeminiConfig {
            api_key,
            api_base,
            synthesis_model,
            tag_model,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    pub fn with_synthesis_model(mut self, model: impl Into<String>) -> Self {
        self.synthesis_model = Some(model.into());
        self
    }

    pub fn with_tag_model(mut self, model: impl Into<String>) -> Self {
        self.tag_model = Some(model.into());
        self
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        OrchestratorConfig {
            fanout_policy: FanoutPolicy::AbortOnFailure,
        }
    }
}

impl OrchestratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fanout_policy(mut self, policy: FanoutPolicy) -> Self {
        self.fanout_policy = policy;
        self
    }
}
