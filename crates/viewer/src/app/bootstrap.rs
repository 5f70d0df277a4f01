use std::env;
use std::path::Path;

use agentview_engine::{
    BuiltInEnvironment, EnvironmentSource, LoopConfig, SessionConfig, AGENT_COUNT_ENV_VAR,
    AUTOCONNECT_ENV_VAR, DEFAULT_AGENT_COUNT, DEFAULT_WS_URL, ENVIRONMENT_ENV_VAR, WS_URL_ENV_VAR,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) session: SessionConfig,
}

pub(crate) fn build_app() -> AppWiring {
    init_tracing();
    info!(version = env!("CARGO_PKG_VERSION"), "=== Agent View Startup ===");

    let session = SessionConfig {
        agent_count: parse_agent_count(read_env_var(AGENT_COUNT_ENV_VAR).as_deref()),
        endpoint: parse_ws_url(read_env_var(WS_URL_ENV_VAR).as_deref()),
        initial_environment: parse_environment(read_env_var(ENVIRONMENT_ENV_VAR).as_deref()),
        autoconnect: parse_flag(
            AUTOCONNECT_ENV_VAR,
            read_env_var(AUTOCONNECT_ENV_VAR).as_deref(),
        ),
    };

    AppWiring {
        config: LoopConfig::default(),
        session,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn read_env_var(name: &'static str) -> Option<String> {
    match env::var(name) {
        Ok(value) => Some(value),
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!(
                env_var = name,
                error = %err,
                "unable to read env var; falling back to default"
            );
            None
        }
    }
}

fn parse_ws_url(raw: Option<&str>) -> String {
    let Some(value) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return DEFAULT_WS_URL.to_string();
    };
    if value.starts_with("ws://") || value.starts_with("wss://") {
        return value.to_string();
    }
    warn!(
        env_var = WS_URL_ENV_VAR,
        value,
        "websocket url must start with ws:// or wss://; falling back to default"
    );
    DEFAULT_WS_URL.to_string()
}

fn parse_agent_count(raw: Option<&str>) -> usize {
    let Some(value) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return DEFAULT_AGENT_COUNT;
    };
    match value.parse::<usize>() {
        Ok(count) => count,
        Err(_) => {
            warn!(
                env_var = AGENT_COUNT_ENV_VAR,
                value,
                "invalid agent count; falling back to default"
            );
            DEFAULT_AGENT_COUNT
        }
    }
}

fn parse_environment(raw: Option<&str>) -> EnvironmentSource {
    let default = || EnvironmentSource::BuiltIn(BuiltInEnvironment::DemoGrid.name().to_string());
    let Some(value) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return default();
    };
    if let Some(built_in) = BuiltInEnvironment::from_name(value) {
        return EnvironmentSource::BuiltIn(built_in.name().to_string());
    }
    let path = Path::new(value);
    if path.is_file() {
        return EnvironmentSource::Upload(path.to_path_buf());
    }
    warn!(
        env_var = ENVIRONMENT_ENV_VAR,
        value,
        "neither a built-in environment nor a readable file; falling back to default"
    );
    default()
}

fn parse_flag(name: &'static str, raw: Option<&str>) -> bool {
    let Some(value) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return false;
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            warn!(env_var = name, value, "invalid flag value; treating as off");
            false
        }
    }
}
