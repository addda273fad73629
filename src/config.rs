use serde::Deserialize;

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Knobs for the text-generation endpoint and the orchestration policy.
///
/// The model id, token budget and timeout are deliberately configuration:
/// the combined/per-group thresholds were tuned against one model's output
/// ceiling and should be revisited per deployment.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    pub api_base_url: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    /// Extra meals generated beyond each group's requested count, so the
    /// review step has options to discard.
    pub extra_meals: u32,
    pub per_group_meal_cap: u32,
    /// Above this many total meals, switch to per-group calls.
    pub combined_meal_threshold: u32,
    /// Above this many groups, switch to per-group calls.
    pub combined_group_threshold: usize,
}

impl GenerationConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let api_key = std::env::var("MEALFORGE_API_KEY")?;
        Ok(Self {
            api_base_url: std::env::var("MEALFORGE_API_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".into()),
            api_key,
            model: std::env::var("MEALFORGE_MODEL").unwrap_or_else(|_| "gpt-4-turbo".into()),
            max_tokens: env_parsed("MEALFORGE_MAX_TOKENS", 4096),
            request_timeout_secs: env_parsed("MEALFORGE_TIMEOUT_SECS", 60),
            max_retries: env_parsed("MEALFORGE_MAX_RETRIES", 3),
            backoff_base_ms: env_parsed("MEALFORGE_BACKOFF_BASE_MS", 1000),
            extra_meals: env_parsed("MEALFORGE_EXTRA_MEALS", 2),
            per_group_meal_cap: env_parsed("MEALFORGE_PER_GROUP_MEAL_CAP", 10),
            combined_meal_threshold: env_parsed("MEALFORGE_COMBINED_MEAL_THRESHOLD", 12),
            combined_group_threshold: env_parsed("MEALFORGE_COMBINED_GROUP_THRESHOLD", 3),
        })
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.openai.com/v1".into(),
            api_key: String::new(),
            model: "gpt-4-turbo".into(),
            max_tokens: 4096,
            request_timeout_secs: 60,
            max_retries: 3,
            backoff_base_ms: 1000,
            extra_meals: 2,
            per_group_meal_cap: 10,
            combined_meal_threshold: 12,
            combined_group_threshold: 3,
        }
    }
}
