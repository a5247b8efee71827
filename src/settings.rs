use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable naming a directory with an overriding Settings.toml
pub const CONFIG_DIR_ENV: &str = "KEYTAP_CONFIG_DIR";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CeremonySettings {
    #[serde(default)]
    pub ceremony: CeremonyBehaviorSettings,
    #[serde(default)]
    pub support: SupportSettings,
    #[serde(default)]
    pub form: FormSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CeremonyBehaviorSettings {
    /// Render nothing instead of the unsupported-browser message
    #[serde(default)]
    pub silent_if_unsupported: bool,
    /// Give up on an unanswered platform call after this many seconds.
    /// Unset means wait forever.
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SupportSettings {
    /// Shown in the copy for device registration mismatches
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FormSettings {
    /// Action URL for the classic form-post delivery
    pub action_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl CeremonySettings {
    /// Load settings from configuration files and environment variables
    ///
    /// Installs an `env_logger` filtered by `logging.level` unless the host
    /// already installed a logger, in which case that logger is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Settings file cannot be read or parsed
    /// - TOML parsing fails
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        // .env values take part in the overrides below
        Self::load_env_file(Path::new(".env"));

        // Load base settings from TOML or defaults
        let mut settings = Self::load_base_settings(Path::new("Settings.toml"))?;

        // Apply environment variable overrides
        Self::apply_env_overrides(&mut settings);

        if let Err(e) = settings.init_logging() {
            log::debug!("Keeping the installed logger: {e}");
        }

        Ok(settings)
    }

    /// Logger builder using `logging.level` as its filter directives
    #[must_use]
    pub fn logger_builder(&self) -> env_logger::Builder {
        let mut builder = env_logger::Builder::new();
        builder.parse_filters(&self.logging.level);
        builder
    }

    /// Install the configured logger as the global logger
    ///
    /// # Errors
    ///
    /// Returns `SetLoggerError` if a logger is already installed.
    pub fn init_logging(&self) -> Result<(), log::SetLoggerError> {
        self.logger_builder().try_init()
    }

    /// Load base settings from TOML file(s) or use defaults
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `KEYTAP_CONFIG_DIR` (if specified and exists)
    /// 3. The given settings file (if exists)
    /// 4. Default settings
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Settings file cannot be read
    /// - TOML parsing fails
    pub fn load_base_settings(default_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        // 1. Start with default settings
        let mut settings = Self::default();

        // 2. Try the default settings file (lower priority)
        if default_path.exists() {
            settings = Self::from_toml_file(default_path)?;
            log::info!("✓ Loaded base settings from {}", default_path.display());
        }

        // 3. If KEYTAP_CONFIG_DIR is set and contains Settings.toml, it replaces the base settings
        if let Ok(config_dir) = std::env::var(CONFIG_DIR_ENV) {
            let override_path = Path::new(&config_dir).join("Settings.toml");
            if override_path.exists() {
                settings = Self::from_toml_file(&override_path)?;
                log::info!("✓ Overriding settings from {}", override_path.display());
            } else {
                log::info!(
                    "ℹ {CONFIG_DIR_ENV} set but no Settings.toml found at: {}",
                    override_path.display()
                );
            }
        }

        Ok(settings)
    }

    /// Parse a settings file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML
    pub fn from_toml_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let toml_content = fs::read_to_string(path)?;
        Ok(basic_toml::from_str(&toml_content)?)
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_ceremony_env_overrides(&mut settings.ceremony);
        Self::apply_support_env_overrides(&mut settings.support);
        Self::apply_form_env_overrides(&mut settings.form);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    fn apply_ceremony_env_overrides(ceremony_settings: &mut CeremonyBehaviorSettings) {
        if let Ok(silent) = std::env::var("KEYTAP_SILENT_IF_UNSUPPORTED") {
            ceremony_settings.silent_if_unsupported = silent.to_lowercase() == "true";
        }
        if let Ok(timeout) = std::env::var("KEYTAP_TIMEOUT_SECONDS") {
            match timeout.parse::<u64>() {
                Ok(0) => ceremony_settings.timeout_seconds = None,
                Ok(seconds) => ceremony_settings.timeout_seconds = Some(seconds),
                Err(_) => log::warn!("Ignoring invalid KEYTAP_TIMEOUT_SECONDS value: {timeout}"),
            }
        }
    }

    fn apply_support_env_overrides(support_settings: &mut SupportSettings) {
        if let Ok(email) = std::env::var("KEYTAP_SUPPORT_EMAIL") {
            support_settings.email = Some(email).filter(|e| !e.trim().is_empty());
        }
    }

    fn apply_form_env_overrides(form_settings: &mut FormSettings) {
        if let Ok(action_url) = std::env::var("KEYTAP_FORM_ACTION") {
            form_settings.action_url = Some(action_url).filter(|u| !u.trim().is_empty());
        }
    }

    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging_settings.level = log_level;
        }
    }

    /// Export `KEY=value` lines of a dotenv file into the process environment
    ///
    /// Blank lines and `#` comments are skipped. Variables already set in the
    /// environment win over the file.
    fn load_env_file(path: &Path) {
        let Ok(contents) = fs::read_to_string(path) else {
            return;
        };
        for (key, value) in parse_env_lines(&contents) {
            if std::env::var_os(key).is_none() {
                std::env::set_var(key, value);
            }
        }
    }

    /// Platform timeout, if one is configured
    #[must_use]
    pub fn platform_timeout(&self) -> Option<std::time::Duration> {
        self.ceremony
            .timeout_seconds
            .filter(|s| *s > 0)
            .map(std::time::Duration::from_secs)
    }
}

/// `KEY=value` pairs of a dotenv file, optional quotes stripped
fn parse_env_lines(contents: &str) -> Vec<(&str, &str)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let key = key.trim().trim_start_matches("export ").trim();
            let value = value.trim();
            let unquoted = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            (key, unquoted)
        })
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn clean_env_vars() {
        std::env::remove_var(CONFIG_DIR_ENV);
        std::env::remove_var("KEYTAP_SILENT_IF_UNSUPPORTED");
        std::env::remove_var("KEYTAP_TIMEOUT_SECONDS");
        std::env::remove_var("KEYTAP_SUPPORT_EMAIL");
        std::env::remove_var("KEYTAP_FORM_ACTION");
    }

    fn write_settings(dir: &Path, contents: &str) -> std::path::PathBuf {
        let path = dir.join("Settings.toml");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let settings = CeremonySettings::default();
        assert!(!settings.ceremony.silent_if_unsupported);
        assert_eq!(settings.ceremony.timeout_seconds, None);
        assert_eq!(settings.platform_timeout(), None);
        assert_eq!(settings.support.email, None);
        assert_eq!(settings.form.action_url, None);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    #[serial]
    fn test_load_from_file_with_partial_sections() {
        clean_env_vars();
        let dir = tempfile::tempdir().unwrap();
        let path = write_settings(
            dir.path(),
            r#"
[ceremony]
timeout_seconds = 30

[support]
email = "support@example.com"
"#,
        );

        let settings = CeremonySettings::load_base_settings(&path).unwrap();
        assert_eq!(
            settings.platform_timeout(),
            Some(std::time::Duration::from_secs(30))
        );
        assert_eq!(settings.support.email.as_deref(), Some("support@example.com"));
        // Missing sections fall back to defaults
        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.form.action_url, None);
    }

    #[test]
    #[serial]
    fn test_config_dir_takes_precedence() {
        clean_env_vars();
        let base_dir = tempfile::tempdir().unwrap();
        let base = write_settings(base_dir.path(), "[support]\nemail = \"base@example.com\"\n");

        let override_dir = tempfile::tempdir().unwrap();
        write_settings(
            override_dir.path(),
            "[support]\nemail = \"override@example.com\"\n",
        );
        std::env::set_var(CONFIG_DIR_ENV, override_dir.path());

        let settings = CeremonySettings::load_base_settings(&base).unwrap();
        assert_eq!(settings.support.email.as_deref(), Some("override@example.com"));

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_missing_file_uses_defaults() {
        clean_env_vars();
        let dir = tempfile::tempdir().unwrap();
        let settings =
            CeremonySettings::load_base_settings(&dir.path().join("Settings.toml")).unwrap();
        assert_eq!(settings.ceremony.timeout_seconds, None);
    }

    #[test]
    #[serial]
    fn test_invalid_toml_is_an_error() {
        clean_env_vars();
        let dir = tempfile::tempdir().unwrap();
        let path = write_settings(dir.path(), "[ceremony\ntimeout_seconds = ");
        assert!(CeremonySettings::load_base_settings(&path).is_err());
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clean_env_vars();
        let mut settings = CeremonySettings::default();

        std::env::set_var("KEYTAP_SILENT_IF_UNSUPPORTED", "TRUE");
        std::env::set_var("KEYTAP_TIMEOUT_SECONDS", "45");
        std::env::set_var("KEYTAP_SUPPORT_EMAIL", "help@example.com");
        std::env::set_var("KEYTAP_FORM_ACTION", "https://example.com/2fa/");

        CeremonySettings::apply_env_overrides(&mut settings);

        assert!(settings.ceremony.silent_if_unsupported);
        assert_eq!(settings.ceremony.timeout_seconds, Some(45));
        assert_eq!(settings.support.email.as_deref(), Some("help@example.com"));
        assert_eq!(
            settings.form.action_url.as_deref(),
            Some("https://example.com/2fa/")
        );

        clean_env_vars();
    }

    #[test]
    fn test_logging_level_drives_logger_filter() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_settings(dir.path(), "[logging]\nlevel = \"trace\"\n");
        let settings = CeremonySettings::from_toml_file(&path).unwrap();

        assert_eq!(settings.logging.level, "trace");
        assert_eq!(
            settings.logger_builder().build().filter(),
            log::LevelFilter::Trace
        );

        let quiet = CeremonySettings {
            logging: LoggingSettings {
                level: "warn".to_string(),
            },
            ..CeremonySettings::default()
        };
        assert_eq!(quiet.logger_builder().build().filter(), log::LevelFilter::Warn);
    }

    #[test]
    #[serial]
    fn test_load_keeps_logger_installed_by_host() {
        clean_env_vars();
        // Either this call or another test installed a logger already
        let _ = env_logger::builder().is_test(true).try_init();

        let settings = CeremonySettings::load().unwrap();
        assert!(settings.init_logging().is_err());
    }

    #[test]
    fn test_env_file_skips_comments_and_blank_lines() {
        let contents = "\
# KEYTAP_SUPPORT_EMAIL=commented@example.com

KEYTAP_FORM_ACTION = https://example.com/2fa/?a=b
export KEYTAP_TIMEOUT_SECONDS=\"15\"
=orphan
not a pair
";
        assert_eq!(
            parse_env_lines(contents),
            vec![
                ("KEYTAP_FORM_ACTION", "https://example.com/2fa/?a=b"),
                ("KEYTAP_TIMEOUT_SECONDS", "15"),
            ]
        );
    }

    #[test]
    #[serial]
    fn test_env_file_does_not_override_process_env() {
        clean_env_vars();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(
            &path,
            "KEYTAP_SUPPORT_EMAIL=file@example.com\nKEYTAP_FORM_ACTION=https://file.example.com/\n",
        )
        .unwrap();
        std::env::set_var("KEYTAP_SUPPORT_EMAIL", "process@example.com");

        CeremonySettings::load_env_file(&path);

        assert_eq!(
            std::env::var("KEYTAP_SUPPORT_EMAIL").unwrap(),
            "process@example.com"
        );
        assert_eq!(
            std::env::var("KEYTAP_FORM_ACTION").unwrap(),
            "https://file.example.com/"
        );

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_zero_or_invalid_timeout() {
        clean_env_vars();
        let mut settings = CeremonySettings::default();
        settings.ceremony.timeout_seconds = Some(10);

        std::env::set_var("KEYTAP_TIMEOUT_SECONDS", "soon");
        CeremonySettings::apply_env_overrides(&mut settings);
        assert_eq!(settings.ceremony.timeout_seconds, Some(10));

        std::env::set_var("KEYTAP_TIMEOUT_SECONDS", "0");
        CeremonySettings::apply_env_overrides(&mut settings);
        assert_eq!(settings.ceremony.timeout_seconds, None);

        clean_env_vars();
    }
}
