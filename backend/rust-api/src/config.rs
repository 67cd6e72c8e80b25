use serde::Deserialize;
use std::env;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server_addr: String,
    pub mongo_uri: String,
    pub mongo_database: String,
    /// Generation cache is disabled when unset
    pub redis_uri: Option<String>,
    pub cache_ttl_secs: u64,
    pub llm: LlmConfig,
    pub quiz_num_questions: usize,
    pub scraper_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub temperature: f64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-pro".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            temperature: 0.0,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: "0.0.0.0:8000".to_string(),
            mongo_uri: "mongodb://localhost:27017".to_string(),
            mongo_database: "wikiquiz".to_string(),
            redis_uri: None,
            cache_ttl_secs: 86_400,
            llm: LlmConfig::default(),
            quiz_num_questions: 5,
            scraper_timeout_secs: 10,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // config/{env}.toml first, APP_* variables (e.g. APP_LLM__MODEL) override it
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", app_env)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        // Settings key wins, then the plain variable; blank values count as unset
        let lookup = |key: &str, var: &str| {
            settings
                .get_string(key)
                .ok()
                .or_else(|| env::var(var).ok())
                .filter(|value| !value.trim().is_empty())
        };

        let defaults = Config::default();

        let llm = LlmConfig {
            api_key: lookup("llm.api_key", "GOOGLE_API_KEY"),
            model: lookup("llm.model", "GEMINI_MODEL").unwrap_or(defaults.llm.model),
            base_url: lookup("llm.base_url", "GEMINI_BASE_URL")
                .unwrap_or(defaults.llm.base_url),
            temperature: parse_or(
                lookup("llm.temperature", "LLM_TEMPERATURE"),
                "llm.temperature",
                defaults.llm.temperature,
            )?,
        };

        let quiz_num_questions = parse_or(
            lookup("quiz.num_questions", "QUIZ_NUM_QUESTIONS"),
            "quiz.num_questions",
            defaults.quiz_num_questions,
        )?;
        if quiz_num_questions == 0 {
            return Err(config::ConfigError::Message(
                "quiz.num_questions must be at least 1".to_string(),
            ));
        }

        Ok(Config {
            server_addr: lookup("server.addr", "SERVER_ADDR").unwrap_or(defaults.server_addr),
            mongo_uri: lookup("database.mongo_uri", "MONGO_URI").unwrap_or(defaults.mongo_uri),
            mongo_database: lookup("database.mongo_database", "MONGO_DATABASE")
                .unwrap_or(defaults.mongo_database),
            redis_uri: lookup("redis.uri", "REDIS_URI"),
            cache_ttl_secs: parse_or(
                lookup("cache.ttl_secs", "QUIZ_CACHE_TTL_SECS"),
                "cache.ttl_secs",
                defaults.cache_ttl_secs,
            )?,
            llm,
            quiz_num_questions,
            scraper_timeout_secs: parse_or(
                lookup("scraper.timeout_secs", "SCRAPER_TIMEOUT_SECS"),
                "scraper.timeout_secs",
                defaults.scraper_timeout_secs,
            )?,
        })
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T, config::ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| config::ConfigError::Message(format!("invalid {key} {raw:?}: {e}"))),
        None => Ok(default),
    }
}
