use liga_api::client::DEFAULT_BASE_URL;
use log::LevelFilter;

pub const API_URL_VAR: &str = "LIGA_API_URL";
pub const LOG_LEVEL_VAR: &str = "LIGA_LOG";

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub api_url: String,
    pub full_screen: bool,
    pub log_level: Option<LevelFilter>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self { api_url: DEFAULT_BASE_URL.to_owned(), full_screen: false, log_level: None }
    }
}

impl AppSettings {
    /// Settings from the environment; `api_override` (from `--api`) wins over `LIGA_API_URL`.
    pub fn load(api_override: Option<String>) -> Self {
        let api_url = api_override.or_else(|| std::env::var(API_URL_VAR).ok());
        let log_level = std::env::var(LOG_LEVEL_VAR).ok();
        Self::from_values(api_url, log_level)
    }

    fn from_values(api_url: Option<String>, log_level: Option<String>) -> Self {
        let api_url = api_url
            .map(|url| url.trim().to_owned())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        let log_level = log_level.and_then(|level| match level.trim().parse() {
            Ok(level) => Some(level),
            Err(_) => {
                log::warn!("ignoring invalid {LOG_LEVEL_VAR} value: {level}");
                None
            }
        });
        Self { api_url, full_screen: false, log_level }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let settings = AppSettings::from_values(None, None);
        assert_eq!(settings.api_url, DEFAULT_BASE_URL);
        assert!(settings.log_level.is_none());
    }

    #[test]
    fn values_are_parsed() {
        let settings =
            AppSettings::from_values(Some(" http://liga:8080 ".into()), Some("debug".into()));
        assert_eq!(settings.api_url, "http://liga:8080");
        assert_eq!(settings.log_level, Some(LevelFilter::Debug));
    }

    #[test]
    fn bad_log_level_is_ignored() {
        let settings = AppSettings::from_values(Some(String::new()), Some("loud".into()));
        assert_eq!(settings.api_url, DEFAULT_BASE_URL);
        assert!(settings.log_level.is_none());
    }
}
