//! 网关运行配置加载。

use std::env;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// MQTT 用户名/密码。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttCredentials {
    pub username: String,
    pub password: String,
}

/// MQTT 客户端标识策略：`prefix + name`，未配置名称时使用随机名称。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdPolicy {
    pub prefix: Option<String>,
    pub name: Option<String>,
}

impl ClientIdPolicy {
    pub fn client_id(&self) -> String {
        let prefix = self.prefix.as_deref().unwrap_or_default();
        match self.name.as_deref() {
            Some(name) => format!("{}{}", prefix, name),
            None => format!("{}gateway-{}", prefix, uuid::Uuid::new_v4().simple()),
        }
    }
}

/// 网关运行配置。
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub mqtt_keepalive_seconds: u16,
    pub mqtt_clean_session: bool,
    pub mqtt_client_id: ClientIdPolicy,
    pub mqtt_credentials: Option<MqttCredentials>,
    pub onboarding_topic: String,
    pub accept_prefix: Option<String>,
    pub database_url: Option<String>,
    pub inbound_queue: usize,
}

impl GatewayConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 从任意键值来源读取配置（测试时避免修改进程环境）。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let reader = Reader { lookup };
        let mqtt_host = reader
            .optional("GATEWAY_MQTT_HOST")
            .unwrap_or_else(|| "127.0.0.1".to_string());
        let mqtt_port = reader.u16_with_default("GATEWAY_MQTT_PORT", 1883)?;
        let mqtt_keepalive_seconds = reader.u16_with_default("GATEWAY_MQTT_KEEPALIVE_SECONDS", 60)?;
        // 0 关闭保活；其余取值 broker 客户端要求不少于 5 秒
        if (1..5).contains(&mqtt_keepalive_seconds) {
            return Err(ConfigError::Invalid(
                "GATEWAY_MQTT_KEEPALIVE_SECONDS".to_string(),
                mqtt_keepalive_seconds.to_string(),
            ));
        }
        let mqtt_clean_session = reader.bool_with_default("GATEWAY_MQTT_CLEAN_SESSION", true);
        let mqtt_client_id = ClientIdPolicy {
            prefix: reader.client_id_part("GATEWAY_MQTT_CLIENT_PREFIX")?,
            name: reader.client_id_part("GATEWAY_MQTT_CLIENT_NAME")?,
        };
        let mqtt_credentials = match (
            reader.optional("GATEWAY_MQTT_USERNAME"),
            reader.optional("GATEWAY_MQTT_PASSWORD"),
        ) {
            (Some(username), Some(password)) => Some(MqttCredentials { username, password }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("GATEWAY_MQTT_PASSWORD".to_string())),
            (None, Some(_)) => return Err(ConfigError::Missing("GATEWAY_MQTT_USERNAME".to_string())),
        };
        let onboarding_topic = reader
            .optional("GATEWAY_ONBOARDING_TOPIC")
            .unwrap_or_else(|| "start".to_string());
        if onboarding_topic.contains('/') {
            return Err(ConfigError::Invalid(
                "GATEWAY_ONBOARDING_TOPIC".to_string(),
                onboarding_topic,
            ));
        }
        let accept_prefix = reader.optional("GATEWAY_ACCEPT_PREFIX");
        let database_url = reader.optional("GATEWAY_DATABASE_URL");
        let inbound_queue = reader.usize_with_default("GATEWAY_INBOUND_QUEUE", 64)?;
        if inbound_queue == 0 {
            return Err(ConfigError::Invalid(
                "GATEWAY_INBOUND_QUEUE".to_string(),
                "0".to_string(),
            ));
        }

        Ok(Self {
            mqtt_host,
            mqtt_port,
            mqtt_keepalive_seconds,
            mqtt_clean_session,
            mqtt_client_id,
            mqtt_credentials,
            onboarding_topic,
            accept_prefix,
            database_url,
            inbound_queue,
        })
    }
}

struct Reader<F> {
    lookup: F,
}

impl<F> Reader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|value| !value.is_empty())
    }

    /// 客户端标识片段不能以空白开头。
    fn client_id_part(&self, key: &str) -> Result<Option<String>, ConfigError> {
        match self.optional(key) {
            Some(value) if value.starts_with(char::is_whitespace) => {
                Err(ConfigError::Invalid(key.to_string(), value))
            }
            value => Ok(value),
        }
    }

    fn u16_with_default(&self, key: &str, default: u16) -> Result<u16, ConfigError> {
        let Some(value) = self.optional(key) else {
            return Ok(default);
        };
        value
            .parse::<u16>()
            .map_err(|_| ConfigError::Invalid(key.to_string(), value))
    }

    fn usize_with_default(&self, key: &str, default: usize) -> Result<usize, ConfigError> {
        let Some(value) = self.optional(key) else {
            return Ok(default);
        };
        value
            .parse::<usize>()
            .map_err(|_| ConfigError::Invalid(key.to_string(), value))
    }

    fn bool_with_default(&self, key: &str, default: bool) -> bool {
        match self.optional(key) {
            Some(value) => matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "on"),
            None => default,
        }
    }
}
