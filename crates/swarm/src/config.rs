use serde::{Deserialize, Serialize};

pub const STANDARD_AGENTS: usize = 3;
pub const ENHANCED_AGENTS: usize = 5;
pub const DEFAULT_THRESHOLD: f64 = 0.66;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Topology {
    #[default]
    Hierarchical,
    Flat,
    Mesh,
}

impl std::fmt::Display for Topology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Topology::Hierarchical => "hierarchical",
            Topology::Flat => "flat",
            Topology::Mesh => "mesh",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SwarmConfig {
    pub topology: Topology,
    pub consensus_threshold: f64,
    pub enhanced: bool,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            topology: Topology::Hierarchical,
            consensus_threshold: DEFAULT_THRESHOLD,
            enhanced: false,
        }
    }
}

impl SwarmConfig {
    pub fn agent_count(&self) -> usize {
        if self.enhanced {
            ENHANCED_AGENTS
        } else {
            STANDARD_AGENTS
        }
    }

    /// Smallest success count that meets the threshold, `ceil(T * N)`.
    pub fn required_successes(&self) -> usize {
        required_successes(self.consensus_threshold, self.agent_count())
    }
}

pub fn required_successes(threshold: f64, agents: usize) -> usize {
    // The epsilon absorbs float noise such as 0.6 * 5 = 3.0000000000000004.
    let raw = (threshold * agents as f64 - 1e-9).ceil();
    raw.max(0.0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_successes() {
        assert_eq!(required_successes(0.66, 3), 2);
        assert_eq!(required_successes(0.66, 5), 4);
        assert_eq!(required_successes(0.6, 5), 3);
        assert_eq!(required_successes(1.0, 3), 3);
        assert_eq!(required_successes(0.5, 4), 2);
    }

    #[test]
    fn test_agent_count() {
        let mut config = SwarmConfig::default();
        assert_eq!(config.agent_count(), 3);
        config.enhanced = true;
        assert_eq!(config.agent_count(), 5);
    }
}
