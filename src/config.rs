/// Tuning knobs for the clustering model
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterConfig {
    /// Upper bound on assignment/update rounds per run
    pub max_iterations: usize,
    /// Number of independently seeded runs; the best-scoring one is kept
    pub restarts: usize,
    /// Stop once no centroid moves further than this (squared distance)
    pub tolerance: f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            max_iterations: 300,
            restarts: 10,
            tolerance: 1e-4,
        }
    }
}

impl ClusterConfig {
    /// Single-run configuration, mostly useful in tests
    pub fn single_run() -> Self {
        Self {
            restarts: 1,
            ..Self::default()
        }
    }
}
