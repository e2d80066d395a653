use std::{collections::HashMap, fs, path::PathBuf, time::Duration};

use serde::Deserialize;

pub const CONFIG_FILE: &str = "console.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub api_url: String,
    pub state_dir: PathBuf,
    pub regions_path: Option<PathBuf>,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8000/api/".into(),
            state_dir: PathBuf::from(".fundi"),
            regions_path: None,
            request_timeout_secs: 20,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();
    if let Ok(raw) = fs::read_to_string(CONFIG_FILE) {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_file(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, toml::Value>>(raw) else {
        return;
    };

    if let Some(v) = file_cfg.get("api_url").and_then(toml::Value::as_str) {
        settings.api_url = v.to_string();
    }
    if let Some(v) = file_cfg.get("state_dir").and_then(toml::Value::as_str) {
        settings.state_dir = PathBuf::from(v);
    }
    if let Some(v) = file_cfg.get("regions_path").and_then(toml::Value::as_str) {
        settings.regions_path = Some(PathBuf::from(v));
    }
    if let Some(v) = file_cfg
        .get("request_timeout_secs")
        .and_then(toml::Value::as_integer)
        .and_then(|secs| u64::try_from(secs).ok())
    {
        settings.request_timeout_secs = v;
    }
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("FUNDI_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = var("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = var("APP__STATE_DIR") {
        settings.state_dir = PathBuf::from(v);
    }

    if let Some(v) = var("APP__REGIONS_PATH") {
        settings.regions_path = Some(PathBuf::from(v));
    }

    if let Some(v) = var("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn file_values_override_defaults() {
        let mut settings = Settings::default();
        apply_file(
            &mut settings,
            r#"
api_url = "https://fundi.example.com"
regions_path = "data/kenya.json"
request_timeout_secs = 45
"#,
        );

        assert_eq!(settings.api_url, "https://fundi.example.com");
        assert_eq!(settings.regions_path, Some(PathBuf::from("data/kenya.json")));
        assert_eq!(settings.request_timeout(), Duration::from_secs(45));
        assert_eq!(settings.state_dir, PathBuf::from(".fundi"));
    }

    #[test]
    fn env_wins_over_file_and_app_prefix_wins_over_plain() {
        let mut settings = Settings::default();
        apply_file(&mut settings, r#"api_url = "https://from-file.example.com""#);
        apply_env(
            &mut settings,
            env_of(&[
                ("FUNDI_API_URL", "https://plain.example.com"),
                ("APP__API_URL", "https://prefixed.example.com"),
                ("APP__REQUEST_TIMEOUT_SECS", "not-a-number"),
                ("APP__STATE_DIR", "/var/lib/fundi"),
            ]),
        );

        assert_eq!(settings.api_url, "https://prefixed.example.com");
        assert_eq!(settings.request_timeout_secs, 20);
        assert_eq!(settings.state_dir, PathBuf::from("/var/lib/fundi"));
    }

    #[test]
    fn unparsable_file_is_ignored() {
        let mut settings = Settings::default();
        apply_file(&mut settings, "api_url = [");
        assert_eq!(settings, Settings::default());
    }
}
