use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_RESULTS_URL: &str = "https://www.base.gov.pt/Base4/pt/resultados/";
pub const DEFAULT_WARMUP_URL: &str = "https://www.base.gov.pt/Base4/pt/pesquisa/";
pub const DEFAULT_DETAIL_PAGE_URL: &str =
    "https://www.base.gov.pt/Base4/pt/detalhe/?type=contratos&id={id}";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    pub search: SearchConfig,
    pub districts: Vec<DistrictConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub search_url: String,
    pub detail_url: String,
    pub detail_page_url: String,
    pub warmup_url: Option<String>,
    pub api_version: String,
    pub user_agent: String,
    pub origin: String,
    pub timeout_seconds: u64,
    pub page_size: u32,
    pub max_pages: Option<u32>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_RESULTS_URL.to_string(),
            detail_url: DEFAULT_RESULTS_URL.to_string(),
            detail_page_url: DEFAULT_DETAIL_PAGE_URL.to_string(),
            warmup_url: Some(DEFAULT_WARMUP_URL.to_string()),
            api_version: "141.0".to_string(),
            user_agent:
                "Mozilla/5.0 (X11; Linux x86_64; rv:141.0) Gecko/20100101 Firefox/141.0"
                    .to_string(),
            origin: "https://www.base.gov.pt".to_string(),
            timeout_seconds: 30,
            page_size: 100,
            max_pages: None,
        }
    }
}

impl SourceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub search_interval_seconds: f64,
    pub search_jitter_seconds: f64,
    pub detail_interval_seconds: f64,
    pub detail_jitter_seconds: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            search_interval_seconds: 3.0,
            search_jitter_seconds: 0.7,
            detail_interval_seconds: 1.0,
            detail_jitter_seconds: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub backoff_factor_seconds: f64,
    pub max_backoff_seconds: f64,
    pub retry_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_factor_seconds: 2.0,
            max_backoff_seconds: 120.0,
            retry_statuses: vec![429, 500, 502, 503, 504],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistrictConfig {
    pub name: String,
    pub id: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "reporte_FINAL_Centro.csv".to_string(),
        }
    }
}

impl ScraperConfig {
    /// Loads and parses a TOML configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown names stay verbatim.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("source.search_url", &self.source.search_url)?;
        validation::validate_url("source.detail_url", &self.source.detail_url)?;
        if let Some(warmup) = &self.source.warmup_url {
            validation::validate_url("source.warmup_url", warmup)?;
        }
        if !self.source.detail_page_url.contains("{id}") {
            return Err(EtlError::InvalidConfigValueError {
                field: "source.detail_page_url".to_string(),
                value: self.source.detail_page_url.clone(),
                reason: "Template must contain an {id} placeholder".to_string(),
            });
        }
        validation::validate_positive_number(
            "source.timeout_seconds",
            self.source.timeout_seconds as usize,
            1,
        )?;
        validation::validate_seconds(
            "source.timeout_seconds",
            self.source.timeout_seconds as f64,
        )?;
        validation::validate_positive_number(
            "source.page_size",
            self.source.page_size as usize,
            1,
        )?;

        validation::validate_seconds(
            "rate_limit.search_interval_seconds",
            self.rate_limit.search_interval_seconds,
        )?;
        validation::validate_seconds(
            "rate_limit.search_jitter_seconds",
            self.rate_limit.search_jitter_seconds,
        )?;
        validation::validate_seconds(
            "rate_limit.detail_interval_seconds",
            self.rate_limit.detail_interval_seconds,
        )?;
        validation::validate_seconds(
            "rate_limit.detail_jitter_seconds",
            self.rate_limit.detail_jitter_seconds,
        )?;

        validation::validate_positive_number(
            "retry.max_attempts",
            self.retry.max_attempts as usize,
            1,
        )?;
        validation::validate_seconds(
            "retry.backoff_factor_seconds",
            self.retry.backoff_factor_seconds,
        )?;
        validation::validate_seconds("retry.max_backoff_seconds", self.retry.max_backoff_seconds)?;

        validation::validate_non_empty_list("search.keywords", &self.search.keywords)?;
        for keyword in &self.search.keywords {
            validation::validate_non_empty_string("search.keywords", keyword)?;
        }
        validation::validate_non_empty_list("districts", &self.districts)?;
        for district in &self.districts {
            validation::validate_non_empty_string("districts.name", &district.name)?;
        }

        validation::validate_path("output.path", &self.output.path)?;

        Ok(())
    }

    pub fn output_path(&self) -> &str {
        &self.output.path
    }

    /// Number of (keyword, district) discovery pairs.
    pub fn search_space_size(&self) -> usize {
        self.search.keywords.len() * self.districts.len()
    }
}

impl Validate for ScraperConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[search]
keywords = ["IoT", "Smart City"]

[[districts]]
name = "Aveiro"
id = 1

[[districts]]
name = "Castelo Branco"
id = 5
"#;

    #[test]
    fn test_parse_minimal_config_uses_defaults() {
        let config = ScraperConfig::from_toml_str(MINIMAL).unwrap();

        assert_eq!(config.source.search_url, DEFAULT_RESULTS_URL);
        assert_eq!(config.source.page_size, 100);
        assert_eq!(config.rate_limit.search_interval_seconds, 3.0);
        assert_eq!(config.rate_limit.detail_jitter_seconds, 0.3);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.retry_statuses, vec![429, 500, 502, 503, 504]);
        assert_eq!(config.output_path(), "reporte_FINAL_Centro.csv");
        assert_eq!(config.districts[1].name, "Castelo Branco");
        assert_eq!(config.search_space_size(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let content = format!(
            "{}\n[rate_limit]\nsearch_interval_seconds = 0.0\n\n[source]\npage_size = 25\n",
            MINIMAL
        );
        let config = ScraperConfig::from_toml_str(&content).unwrap();

        assert_eq!(config.rate_limit.search_interval_seconds, 0.0);
        assert_eq!(config.rate_limit.detail_interval_seconds, 1.0);
        assert_eq!(config.source.page_size, 25);
        assert_eq!(config.source.api_version, "141.0");
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("PROCUREMENT_TEST_OUTPUT", "/tmp/out.csv");

        let content = format!("{}\n[output]\npath = \"${{PROCUREMENT_TEST_OUTPUT}}\"\n", MINIMAL);
        let config = ScraperConfig::from_toml_str(&content).unwrap();
        assert_eq!(config.output_path(), "/tmp/out.csv");

        std::env::remove_var("PROCUREMENT_TEST_OUTPUT");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = ScraperConfig::from_toml_str(MINIMAL).unwrap();
        config.source.search_url = "not-a-url".to_string();
        assert!(config.validate().is_err());

        let mut config = ScraperConfig::from_toml_str(MINIMAL).unwrap();
        config.search.keywords.clear();
        assert!(config.validate().is_err());

        let mut config = ScraperConfig::from_toml_str(MINIMAL).unwrap();
        config.source.detail_page_url = "https://example.com/detail".to_string();
        assert!(config.validate().is_err());

        let mut config = ScraperConfig::from_toml_str(MINIMAL).unwrap();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = ScraperConfig::from_toml_str(MINIMAL).unwrap();
        config.rate_limit.detail_interval_seconds = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_out_of_range_durations() {
        let mut config = ScraperConfig::from_toml_str(MINIMAL).unwrap();
        config.rate_limit.search_interval_seconds = 1e20;
        assert!(config.validate().is_err());

        let mut config = ScraperConfig::from_toml_str(MINIMAL).unwrap();
        config.retry.max_backoff_seconds = 1e20;
        assert!(config.validate().is_err());

        let mut config = ScraperConfig::from_toml_str(MINIMAL).unwrap();
        config.source.timeout_seconds = 0;
        assert!(config.validate().is_err());

        let config = ScraperConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.source.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_missing_districts_is_parse_error() {
        let content = "[search]\nkeywords = [\"IoT\"]\n";
        assert!(ScraperConfig::from_toml_str(content).is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = ScraperConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.search.keywords, vec!["IoT", "Smart City"]);
    }
}
