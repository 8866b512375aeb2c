use std::str::FromStr;

use super::Config;

fn parse_env<T: FromStr>(key: &str) -> Option<T> {
    let v = std::env::var(key).ok()?;
    if let Ok(parsed) = v.parse::<T>() {
        Some(parsed)
    } else {
        tracing::warn!("ignoring invalid {key} value: {v}");
        None
    }
}

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("REAGENT_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("REAGENT_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("REAGENT_LLM_EMBEDDING_MODEL") {
            self.llm.embedding_model = v;
        }
        if let Some(secs) = parse_env::<u64>("REAGENT_TIMEOUT_LLM") {
            self.timeouts.llm_seconds = secs;
        }
        if let Some(secs) = parse_env::<u64>("REAGENT_TIMEOUT_EMBEDDING") {
            self.timeouts.embedding_seconds = secs;
        }
        if let Some(k) = parse_env::<usize>("REAGENT_INDEX_TOP_K") {
            self.index.top_k = k;
        }
        if let Some(n) = parse_env::<usize>("REAGENT_AGENT_MAX_ITERATIONS") {
            self.agent.max_iterations = n;
        }
        if let Some(verbose) = parse_env::<bool>("REAGENT_AGENT_VERBOSE") {
            self.agent.verbose = verbose;
        }
    }
}
