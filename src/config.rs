use chrono::TimeDelta;
use std::time::Duration;

/// Server configuration, read from the environment (a `.env` file is loaded
/// at startup). The change TTL has varied between deployments (5 minutes to
/// 2 hours), so it is a knob rather than a constant.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: String,
    pub port: u16,
    pub temp_change_ttl: TimeDelta,
    pub reaper_interval: Duration,
    pub seed_path: Option<String>,
}

impl Config {
    pub fn from_env() -> Config {
        Config {
            bind_address: std::env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env_parse("PORT", 5000),
            temp_change_ttl: TimeDelta::seconds(env_parse("TEMP_CHANGE_TTL_SECONDS", 7200)),
            reaper_interval: Duration::from_secs(env_parse("REAPER_INTERVAL_SECONDS", 300)),
            seed_path: std::env::var("SCHEDULE_SEED").ok(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_parse_falls_back_on_missing_or_garbage() {
        assert_eq!(env_parse("CAMPUSWAY_TEST_UNSET_VAR", 42u64), 42);
        unsafe {
            std::env::set_var("CAMPUSWAY_TEST_GARBAGE_VAR", "not-a-number");
        }
        assert_eq!(env_parse("CAMPUSWAY_TEST_GARBAGE_VAR", 7u64), 7);
    }
}
