use std::{path::Path, time::Duration};

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Environment variable naming the instrument's VISA resource. Takes
/// precedence over every other source.
pub const RESOURCE_ENV: &str = "MSOX3000_IP";
pub const DEFAULT_RESOURCE: &str = "TCPIP0::172.16.2.13::INSTR";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// VISA resource string of the oscilloscope.
    pub resource: String,
    pub timeout_ms: u64,
    /// Pause after every command sent through the driver.
    pub wait_ms: u64,
    /// Model name (`MSOX3000`, `UXRxxx4A`, ...). Detected from `*IDN?` when absent.
    pub model: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            resource: DEFAULT_RESOURCE.to_string(),
            timeout_ms: 5000,
            wait_ms: 0,
            model: None,
        }
    }
}

impl Settings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
    pub fn wait(&self) -> Duration {
        Duration::from_millis(self.wait_ms)
    }
}

/// Layers defaults, an optional TOML file, `OSCOPE__*` variables and
/// finally [`RESOURCE_ENV`].
pub fn load_settings(config_path: Option<&Path>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder().add_source(Config::try_from(&Settings::default())?);

    if let Some(path) = config_path {
        if path.exists() {
            builder = builder.add_source(File::from(path));
        } else {
            return Err(ConfigError::Message(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
    } else if Path::new("oscope.toml").exists() {
        builder = builder.add_source(File::with_name("oscope.toml"));
    }

    builder = builder
        .add_source(
            Environment::with_prefix("OSCOPE")
                .separator("__")
                .try_parsing(true),
        )
        .set_override_option("resource", std::env::var(RESOURCE_ENV).ok())?;

    builder.build()?.try_deserialize::<Settings>()
}

pub fn load_settings_or_default(config_path: Option<&Path>) -> Settings {
    match load_settings(config_path) {
        Ok(settings) => {
            log::debug!("settings loaded: {:?}", settings);
            settings
        }
        Err(e) => {
            log::warn!("Failed to load settings ({}), using defaults", e);
            Settings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const OSCOPE_VARS: [&str; 4] = [
        RESOURCE_ENV,
        "OSCOPE__RESOURCE",
        "OSCOPE__TIMEOUT_MS",
        "OSCOPE__MODEL",
    ];

    /// Clears the variables it guards when dropped.
    struct ScopedEnv;

    impl ScopedEnv {
        fn set(vars: &[(&str, &str)]) -> Self {
            for (key, value) in vars {
                std::env::set_var(key, value);
            }
            ScopedEnv
        }
    }

    impl Drop for ScopedEnv {
        fn drop(&mut self) {
            for key in OSCOPE_VARS {
                std::env::remove_var(key);
            }
        }
    }

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.resource, "TCPIP0::172.16.2.13::INSTR");
        assert_eq!(s.timeout(), Duration::from_secs(5));
        assert_eq!(s.wait(), Duration::ZERO);
        assert!(s.model.is_none());
    }

    #[test]
    #[serial]
    fn file_layer_overrides_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("oscope.toml");
        std::fs::write(&path, "wait_ms = 250\nmodel = \"UXRxxx4A\"\n").unwrap();

        let s = load_settings(Some(&path)).unwrap();
        assert_eq!(s.wait(), Duration::from_millis(250));
        assert_eq!(s.model.as_deref(), Some("UXRxxx4A"));
        assert_eq!(s.timeout_ms, 5000);
    }

    #[test]
    #[serial]
    fn environment_overrides_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("oscope.toml");
        std::fs::write(
            &path,
            "resource = \"TCPIP0::10.9.9.9::INSTR\"\ntimeout_ms = 3000\nmodel = \"MSOX3000\"\n",
        )
        .unwrap();

        let _env = ScopedEnv::set(&[
            (RESOURCE_ENV, "TCPIP0::10.1.2.3::INSTR"),
            ("OSCOPE__TIMEOUT_MS", "1234"),
            ("OSCOPE__MODEL", "UXR"),
        ]);
        let s = load_settings(Some(&path)).unwrap();
        assert_eq!(
            s,
            Settings {
                resource: "TCPIP0::10.1.2.3::INSTR".to_string(),
                timeout_ms: 1234,
                wait_ms: 0,
                model: Some("UXR".to_string()),
            }
        );
    }

    #[test]
    #[serial]
    fn resource_variable_beats_oscope_prefix() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("oscope.toml");
        std::fs::write(&path, "").unwrap();

        let _env = ScopedEnv::set(&[
            (RESOURCE_ENV, "TCPIP0::scope.lab::SOCKET"),
            ("OSCOPE__RESOURCE", "ASRL1::INSTR"),
        ]);
        let s = load_settings(Some(&path)).unwrap();
        assert_eq!(s.resource, "TCPIP0::scope.lab::SOCKET");
    }

    #[test]
    #[serial]
    fn missing_file_falls_back_to_defaults() {
        let missing = Path::new("/nonexistent/oscope.toml");
        assert!(load_settings(Some(missing)).is_err());
        assert_eq!(load_settings_or_default(Some(missing)), Settings::default());
    }
}
