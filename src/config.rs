use tracing::warn;

pub const ENV_LOG: &str = "MARKIMPORTD_LOG";
pub const ENV_PREVIEW_LIMIT: &str = "MARKIMPORTD_PREVIEW_LIMIT";
pub const ENV_MAX_SESSIONS: &str = "MARKIMPORTD_MAX_SESSIONS";

const DEFAULT_PREVIEW_LIMIT: usize = 250;
const DEFAULT_MAX_SESSIONS: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Most records echoed back by a preview. Summaries always count everything.
    pub preview_limit: usize,
    /// Open import sessions kept before the oldest is evicted.
    pub max_sessions: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preview_limit: DEFAULT_PREVIEW_LIMIT,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            preview_limit: read_positive(&lookup, ENV_PREVIEW_LIMIT, defaults.preview_limit),
            max_sessions: read_positive(&lookup, ENV_MAX_SESSIONS, defaults.max_sessions),
        }
    }
}

fn read_positive<F>(lookup: &F, key: &str, default: usize) -> usize
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse::<usize>() {
        Ok(v) if v > 0 => v,
        _ => {
            warn!(key, value = %raw, default, "ignoring invalid setting");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(Config::from_lookup(lookup_from(&[])), Config::default());
    }

    #[test]
    fn reads_overrides_and_rejects_junk() {
        let cfg = Config::from_lookup(lookup_from(&[
            (ENV_PREVIEW_LIMIT, " 10 "),
            (ENV_MAX_SESSIONS, "zero"),
        ]));
        assert_eq!(cfg.preview_limit, 10);
        assert_eq!(cfg.max_sessions, DEFAULT_MAX_SESSIONS);

        let cfg = Config::from_lookup(lookup_from(&[(ENV_MAX_SESSIONS, "0")]));
        assert_eq!(cfg.max_sessions, DEFAULT_MAX_SESSIONS);
    }
}
