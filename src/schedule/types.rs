use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ClusterConfig;
use crate::error::SchedulerError;

/// Passing this as the centre count derives it from the number of relevant events
pub const AUTO_CENTERS: i64 = -1;

/// Where the first event of each cluster group lands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartPolicy {
    /// Slot of the earliest previous assignment among the relevant events
    First,
    /// Always the first slot
    Earliest,
    /// The slot holding the fewest events, earliest on ties
    Emptiest,
}

impl StartPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            StartPolicy::First => "first",
            StartPolicy::Earliest => "earliest",
            StartPolicy::Emptiest => "emptiest",
        }
    }
}

impl FromStr for StartPolicy {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(StartPolicy::First),
            "earliest" => Ok(StartPolicy::Earliest),
            "emptiest" => Ok(StartPolicy::Emptiest),
            other => Err(SchedulerError::UnknownStartPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for StartPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The assignment operations a caller can pick from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentStrategy {
    Random,
    StartTime,
    Cluster,
    AntiCluster,
}

impl AssignmentStrategy {
    pub fn objective(&self) -> Option<Objective> {
        match self {
            AssignmentStrategy::Cluster => Some(Objective::Cluster),
            AssignmentStrategy::AntiCluster => Some(Objective::AntiCluster),
            _ => None,
        }
    }
}

impl FromStr for AssignmentStrategy {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "random" | "rand" => Ok(AssignmentStrategy::Random),
            "start-time" | "start_time" | "start" => Ok(AssignmentStrategy::StartTime),
            "cluster" => Ok(AssignmentStrategy::Cluster),
            "anti-cluster" | "anti_cluster" | "anticluster" => Ok(AssignmentStrategy::AntiCluster),
            other => Err(SchedulerError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Whether groups gather similar events or spread them apart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    /// Minimise distance to the group centroid (k-means)
    Cluster,
    /// Maximise distance to the group centroid
    AntiCluster,
}

/// Parameters for a cluster / anti-cluster assignment
#[derive(Debug, Clone)]
pub struct ClusterRequest {
    /// Note key whose values describe each event
    pub attribute: String,
    /// Slots to advance between successive events of one group
    pub shift: usize,
    /// Start policy name, validated when the request runs
    pub start: String,
    /// Group count, or `AUTO_CENTERS`
    pub centers: i64,
    pub config: ClusterConfig,
}

impl ClusterRequest {
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            shift: 1,
            start: StartPolicy::Earliest.as_str().to_string(),
            centers: AUTO_CENTERS,
            config: ClusterConfig::default(),
        }
    }

    pub fn with_shift(mut self, shift: usize) -> Self {
        self.shift = shift;
        self
    }

    pub fn with_start(mut self, start: impl Into<String>) -> Self {
        self.start = start.into();
        self
    }

    pub fn with_centers(mut self, centers: i64) -> Self {
        self.centers = centers;
        self
    }

    pub fn with_config(mut self, config: ClusterConfig) -> Self {
        self.config = config;
        self
    }
}

/// Result of a cluster / anti-cluster run
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterOutcome {
    /// The start policy was not recognised; nothing was touched
    Rejected { start: String },
    Assigned(ClusterSummary),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClusterSummary {
    /// Events carrying the target attribute
    pub relevant: usize,
    /// Groups the model was fitted with
    pub groups: usize,
    /// Events that landed back in a bucket
    pub reloaded: usize,
}

impl ClusterOutcome {
    pub fn summary(&self) -> Option<&ClusterSummary> {
        match self {
            ClusterOutcome::Assigned(summary) => Some(summary),
            ClusterOutcome::Rejected { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_policy_names() {
        for policy in [StartPolicy::First, StartPolicy::Earliest, StartPolicy::Emptiest] {
            assert_eq!(policy.as_str().parse::<StartPolicy>().unwrap(), policy);
        }
        assert!(matches!(
            "Earliest".parse::<StartPolicy>(),
            Err(SchedulerError::UnknownStartPolicy(_))
        ));
    }

    #[test]
    fn test_strategy_aliases() {
        assert_eq!("rand".parse::<AssignmentStrategy>().unwrap(), AssignmentStrategy::Random);
        assert_eq!("start".parse::<AssignmentStrategy>().unwrap(), AssignmentStrategy::StartTime);
        assert_eq!("Anti-Cluster".parse::<AssignmentStrategy>().unwrap(), AssignmentStrategy::AntiCluster);
        assert_eq!(AssignmentStrategy::Cluster.objective(), Some(Objective::Cluster));
        assert_eq!(AssignmentStrategy::Random.objective(), None);
        assert!("greedy".parse::<AssignmentStrategy>().is_err());
    }

    #[test]
    fn test_request_defaults() {
        let request = ClusterRequest::new("topic");
        assert_eq!(request.shift, 1);
        assert_eq!(request.start, "earliest");
        assert_eq!(request.centers, AUTO_CENTERS);
    }
}
