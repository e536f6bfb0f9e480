use dotenv::dotenv;
use std::env;

use uuid::Uuid;

const INSTRUMENT_ID: &str = "INSTRUMENT_ID";
const SNAPSHOT_DEPTH: &str = "SNAPSHOT_DEPTH";

const DEFAULT_SNAPSHOT_DEPTH: usize = 20;

/// Engine configuration.
///
/// Both knobs have defaults, so `from_env` only overrides what the environment
/// provides. Unparseable values panic at startup rather than running with a
/// silently wrong configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Identity of the single instrument the engine manages.
    pub instrument_id: Uuid,
    /// Depth levels per side reported by default snapshots.
    pub snapshot_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            instrument_id: Uuid::new_v4(),
            snapshot_depth: DEFAULT_SNAPSHOT_DEPTH,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> EngineConfig {
        // Load .env file
        dotenv().ok();

        let instrument_id = env::var(INSTRUMENT_ID)
            .ok()
            .map(|s| {
                Uuid::parse_str(&s).unwrap_or_else(|_| panic!("failed to parse instrument: {}", s))
            })
            .unwrap_or_else(Uuid::new_v4);
        let snapshot_depth = env::var(SNAPSHOT_DEPTH)
            .ok()
            .map(|s| {
                s.parse::<usize>()
                    .unwrap_or_else(|_| panic!("failed to parse snapshot depth: {}", s))
            })
            .unwrap_or(DEFAULT_SNAPSHOT_DEPTH);

        EngineConfig {
            instrument_id,
            snapshot_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.snapshot_depth, DEFAULT_SNAPSHOT_DEPTH);
        assert!(!config.instrument_id.is_nil());
    }
}
