//! Application configuration, read once at startup from a YAML file with dotted-key lookups.

use std::{env, fs, path::PathBuf};

use serde_yaml::Value;
use thiserror::Error;
use tracing::info;

/// Default location on disk where the configuration is read from.
const DEFAULT_CONFIG_PATH: &str = "config.yml";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "CLUEQUIZ_CONFIG_PATH";
/// Environment variable that forces viewer mode on or off.
const VIEWER_ENV: &str = "CLUEQUIZ_VIEWER";

const DEFAULT_SERIAL_PORT: &str = "/dev/ttyUSB0";
const DEFAULT_SERIAL_BAUD: u32 = 9600;
const DEFAULT_MQTT_INPUT_PORT: u16 = 8883;
const DEFAULT_EFFECTS_PORT: u16 = 1883;
const DEFAULT_EFFECTS_TOPIC: &str = "cluequiz";
const DEFAULT_AUTOSAVE: &str = "autosave.yml";

/// Configuration problems. All of them abort startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("failed to read config `{path}`")]
    Read {
        /// Config path.
        path: PathBuf,
        #[source]
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// File is not valid YAML.
    #[error("failed to parse config")]
    Parse(#[from] serde_yaml::Error),
    /// A required key is absent.
    #[error("required config key `{0}` is missing")]
    MissingKey(String),
    /// A key holds a value of the wrong type or range.
    #[error("config key `{key}` must be {expected}")]
    InvalidValue {
        /// Dotted key.
        key: String,
        /// Description of the accepted values.
        expected: &'static str,
    },
    /// `clue-sets` is an empty list.
    #[error("at least one complete clue set is needed in `clue-sets`")]
    NoClueSets,
}

/// Serial buzzer device settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Device path.
    pub port: String,
    /// Baud rate.
    pub baud: u32,
}

/// Remote buzzer feed settings (client-certificate TLS).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttInputConfig {
    /// Broker host name.
    pub host: String,
    /// Broker TLS port.
    pub port: u16,
    /// Client certificate (PEM).
    pub certfile: PathBuf,
    /// Client private key (PEM).
    pub keyfile: PathBuf,
    /// Trust anchor for the broker certificate (PEM); the system trust store when absent.
    pub cafile: Option<PathBuf>,
}

/// Broker receiving round events for effects relays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectsConfig {
    /// Broker host name.
    pub host: String,
    /// Broker port (plain TCP).
    pub port: u16,
    /// Topic events are published to.
    pub topic: String,
}

/// Immutable runtime configuration, built once and passed to the components that need it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Serial buzzer device.
    pub serial: SerialConfig,
    /// Remote buzzer feed, when configured.
    pub mqtt_input: Option<MqttInputConfig>,
    /// Round-event publishing, when configured.
    pub effects: Option<EffectsConfig>,
    /// Let players answer the same clue more than once.
    pub ignore_responded: bool,
    /// Show answers right away, without a buzz phase.
    pub viewer: bool,
    /// Where committed state is saved.
    pub autosave: PathBuf,
    /// Category-set assets, played in order.
    pub clue_sets: Vec<PathBuf>,
}

impl AppConfig {
    /// Load the configuration from [`DEFAULT_CONFIG_PATH`] or its environment override.
    pub fn load() -> Result<Self, ConfigError> {
        let path = resolve_config_path();
        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

        let mut config = Self::from_yaml_str(&contents)?;
        if let Some(viewer) = env::var(VIEWER_ENV).ok().as_deref().map(parse_flag) {
            config.viewer = viewer;
        }

        info!(
            path = %path.display(),
            clue_sets = config.clue_sets.len(),
            viewer = config.viewer,
            mqtt_input = config.mqtt_input.is_some(),
            "loaded configuration"
        );
        Ok(config)
    }

    /// Build the configuration from YAML text.
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let raw = RawConfig(serde_yaml::from_str(contents)?);

        let serial = SerialConfig {
            port: raw
                .string("serial.port")?
                .unwrap_or_else(|| DEFAULT_SERIAL_PORT.into()),
            baud: raw.number("serial.baud")?.unwrap_or(DEFAULT_SERIAL_BAUD),
        };

        let mqtt_input = match raw.lookup("mqtt_input") {
            Some(value) if !value.is_null() => Some(MqttInputConfig {
                host: raw.required_string("mqtt_input.host")?,
                port: raw
                    .number("mqtt_input.port")?
                    .unwrap_or(DEFAULT_MQTT_INPUT_PORT),
                certfile: raw.required_string("mqtt_input.certfile")?.into(),
                keyfile: raw.required_string("mqtt_input.keyfile")?.into(),
                cafile: raw.string("mqtt_input.cafile")?.map(PathBuf::from),
            }),
            _ => None,
        };

        let effects = match raw.string("mqtt.host")? {
            Some(host) => Some(EffectsConfig {
                host,
                port: raw.number("mqtt.port")?.unwrap_or(DEFAULT_EFFECTS_PORT),
                topic: raw
                    .string("mqtt.topic")?
                    .unwrap_or_else(|| DEFAULT_EFFECTS_TOPIC.into()),
            }),
            None => None,
        };

        let clue_sets = raw
            .lookup("clue-sets")
            .ok_or_else(|| ConfigError::MissingKey("clue-sets".into()))?
            .as_sequence()
            .ok_or_else(|| invalid("clue-sets", "a list of paths"))?
            .iter()
            .map(|entry| {
                entry
                    .as_str()
                    .map(PathBuf::from)
                    .ok_or_else(|| invalid("clue-sets", "a list of paths"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if clue_sets.is_empty() {
            return Err(ConfigError::NoClueSets);
        }

        Ok(Self {
            serial,
            mqtt_input,
            effects,
            ignore_responded: raw.flag("ignore-responded")?.unwrap_or(false),
            viewer: raw.flag("viewer")?.unwrap_or(false),
            autosave: raw
                .string("autosave")?
                .unwrap_or_else(|| DEFAULT_AUTOSAVE.into())
                .into(),
            clue_sets,
        })
    }
}

/// Parsed YAML document queried with `parent.child` keys.
struct RawConfig(Value);

impl RawConfig {
    /// Resolve a dotted key, returning `None` when any segment is absent.
    fn lookup(&self, key: &str) -> Option<&Value> {
        key.split('.')
            .try_fold(&self.0, |parent, segment| parent.get(segment))
            .filter(|value| !value.is_null())
    }

    fn string(&self, key: &str) -> Result<Option<String>, ConfigError> {
        self.lookup(key)
            .map(|value| match value {
                Value::String(text) => Ok(text.clone()),
                Value::Number(number) => Ok(number.to_string()),
                _ => Err(invalid(key, "a string")),
            })
            .transpose()
    }

    fn required_string(&self, key: &str) -> Result<String, ConfigError> {
        self.string(key)?
            .ok_or_else(|| ConfigError::MissingKey(key.into()))
    }

    fn number<T: TryFrom<u64>>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        self.lookup(key)
            .map(|value| {
                value
                    .as_u64()
                    .and_then(|number| T::try_from(number).ok())
                    .ok_or_else(|| invalid(key, "a positive integer in range"))
            })
            .transpose()
    }

    fn flag(&self, key: &str) -> Result<Option<bool>, ConfigError> {
        self.lookup(key)
            .map(|value| value.as_bool().ok_or_else(|| invalid(key, "a boolean")))
            .transpose()
    }
}

fn invalid(key: &str, expected: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.into(),
        expected,
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "y" | "1"
    )
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = AppConfig::from_yaml_str("clue-sets: [sets/one.yml]\n").unwrap();

        assert_eq!(
            config.serial,
            SerialConfig {
                port: "/dev/ttyUSB0".into(),
                baud: 9600,
            }
        );
        assert_eq!(config.mqtt_input, None);
        assert_eq!(config.effects, None);
        assert!(!config.ignore_responded);
        assert!(!config.viewer);
        assert_eq!(config.autosave, PathBuf::from("autosave.yml"));
        assert_eq!(config.clue_sets, vec![PathBuf::from("sets/one.yml")]);
    }

    #[test]
    fn nested_keys_are_resolved() {
        let yaml = r#"
serial:
  port: /dev/ttyACM0
  baud: 115200
mqtt_input:
  host: broker.example
  certfile: client.crt
  keyfile: client.key
  cafile: ca.crt
mqtt:
  host: effects.local
  topic: show
ignore-responded: true
viewer: true
autosave: /tmp/quiz.yml
clue-sets:
  - a.yml
  - b.yml
"#;
        let config = AppConfig::from_yaml_str(yaml).unwrap();

        assert_eq!(config.serial.port, "/dev/ttyACM0");
        assert_eq!(config.serial.baud, 115_200);
        let input = config.mqtt_input.unwrap();
        assert_eq!(input.host, "broker.example");
        assert_eq!(input.port, 8883);
        assert_eq!(input.cafile, Some(PathBuf::from("ca.crt")));
        let effects = config.effects.unwrap();
        assert_eq!(effects.port, 1883);
        assert_eq!(effects.topic, "show");
        assert!(config.ignore_responded);
        assert!(config.viewer);
        assert_eq!(config.clue_sets.len(), 2);
    }

    #[test]
    fn clue_sets_are_required_and_non_empty() {
        assert!(matches!(
            AppConfig::from_yaml_str("viewer: false\n"),
            Err(ConfigError::MissingKey(key)) if key == "clue-sets"
        ));
        assert!(matches!(
            AppConfig::from_yaml_str("clue-sets: []\n"),
            Err(ConfigError::NoClueSets)
        ));
    }

    #[test]
    fn incomplete_mqtt_input_is_rejected() {
        let yaml = "mqtt_input:\n  host: broker\n  certfile: c.crt\nclue-sets: [a.yml]\n";
        assert!(matches!(
            AppConfig::from_yaml_str(yaml),
            Err(ConfigError::MissingKey(key)) if key == "mqtt_input.keyfile"
        ));
    }

    #[test]
    fn mqtt_input_without_cafile_uses_system_trust() {
        let yaml = "mqtt_input:\n  host: broker\n  certfile: c.crt\n  keyfile: c.key\n\
                    clue-sets: [a.yml]\n";
        let input = AppConfig::from_yaml_str(yaml).unwrap().mqtt_input.unwrap();
        assert_eq!(input.port, 8883);
        assert_eq!(input.keyfile, PathBuf::from("c.key"));
        assert_eq!(input.cafile, None);
    }

    #[test]
    fn wrongly_typed_values_are_rejected() {
        assert!(matches!(
            AppConfig::from_yaml_str("serial:\n  baud: fast\nclue-sets: [a.yml]\n"),
            Err(ConfigError::InvalidValue { key, .. }) if key == "serial.baud"
        ));
        assert!(matches!(
            AppConfig::from_yaml_str("ignore-responded: 3\nclue-sets: [a.yml]\n"),
            Err(ConfigError::InvalidValue { key, .. }) if key == "ignore-responded"
        ));
    }

    #[test]
    fn viewer_flags_accept_common_spellings() {
        assert!(parse_flag("True"));
        assert!(parse_flag("yes"));
        assert!(parse_flag("y"));
        assert!(!parse_flag("no"));
        assert!(!parse_flag(""));
    }
}
