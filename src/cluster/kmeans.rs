use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use tracing::debug;

use crate::config::ClusterConfig;
use crate::schedule::Objective;

/// Clustering with k-means++ seeding.
///
/// `Objective::Cluster` runs Lloyd iterations, each point joining its
/// nearest centroid. `Objective::AntiCluster` keeps group sizes balanced:
/// points first join the farthest seed with room left, then pairs are
/// exchanged between groups while that spreads the groups further.
/// Equal distances go to the higher centroid index.
#[derive(Debug, Clone)]
pub struct KMeans {
    k: usize,
    objective: Objective,
    config: ClusterConfig,
}

/// A fitted model
#[derive(Debug, Clone, Default)]
pub struct ClusterFit {
    pub centroids: Vec<Vec<f64>>,
    /// Group id per input point, all below `centroids.len()`
    pub labels: Vec<usize>,
    /// Sum of squared distances from each point to its centroid
    pub inertia: f64,
}

impl KMeans {
    pub fn new(k: usize, objective: Objective, config: ClusterConfig) -> Self {
        Self { k, objective, config }
    }

    /// Fits on `data` and returns the best of `config.restarts` runs:
    /// lowest inertia for clustering, highest for anti-clustering.
    /// `k` is clamped to the number of points.
    pub fn fit<R>(&self, data: &[Vec<f64>], rng: &mut R) -> ClusterFit
    where
        R: Rng + ?Sized,
    {
        if data.is_empty() || self.k == 0 {
            return ClusterFit::default();
        }
        let k = self.k.min(data.len());

        let mut best: Option<ClusterFit> = None;
        for run in 0..self.config.restarts.max(1) {
            let fit = self.fit_once(data, k, rng);
            debug!(run, inertia = fit.inertia, "Clustering run finished");
            let better = match &best {
                None => true,
                Some(current) => match self.objective {
                    Objective::Cluster => fit.inertia < current.inertia,
                    Objective::AntiCluster => fit.inertia > current.inertia,
                },
            };
            if better {
                best = Some(fit);
            }
        }
        best.unwrap_or_default()
    }

    fn fit_once<R>(&self, data: &[Vec<f64>], k: usize, rng: &mut R) -> ClusterFit
    where
        R: Rng + ?Sized,
    {
        let seeds = plus_plus_init(data, k, rng);
        match self.objective {
            Objective::Cluster => self.lloyd(data, seeds),
            Objective::AntiCluster => self.exchange(data, seeds),
        }
    }

    fn lloyd(&self, data: &[Vec<f64>], seeds: Vec<Vec<f64>>) -> ClusterFit {
        let mut centroids = seeds;
        let mut labels = nearest(data, &centroids);

        for _ in 0..self.config.max_iterations {
            let updated = update_centroids(data, &labels, &centroids);
            let movement = centroids
                .iter()
                .zip(&updated)
                .map(|(old, new)| distance_sq(old, new))
                .fold(0.0, f64::max);
            centroids = updated;

            let next_labels = nearest(data, &centroids);
            let stable = next_labels == labels;
            labels = next_labels;
            if stable || movement <= self.config.tolerance {
                break;
            }
        }

        finish(data, labels, centroids)
    }

    /// Balanced anti-clustering by pairwise exchange.
    ///
    /// With group sizes fixed, maximising the squared distance of every
    /// point to its group mean is the same as minimising
    /// `sum(|group_sum|^2 / group_size)`, which a swap changes in O(dim).
    fn exchange(&self, data: &[Vec<f64>], seeds: Vec<Vec<f64>>) -> ClusterFit {
        let k = seeds.len();
        let dim = data.first().map(Vec::len).unwrap_or(0);
        let mut labels = farthest_with_capacity(data, &seeds);

        let mut sizes = vec![0usize; k];
        let mut sums = vec![vec![0.0; dim]; k];
        for (point, &label) in data.iter().zip(&labels) {
            sizes[label] += 1;
            add_into(&mut sums[label], point, 1.0);
        }

        for _ in 0..self.config.max_iterations {
            let mut improved = false;
            for i in 0..data.len() {
                for j in (i + 1)..data.len() {
                    let (a, b) = (labels[i], labels[j]);
                    if a == b {
                        continue;
                    }
                    let before = norm_sq(&sums[a]) / sizes[a] as f64 + norm_sq(&sums[b]) / sizes[b] as f64;
                    let after_a: f64 = sums[a]
                        .iter()
                        .zip(&data[i])
                        .zip(&data[j])
                        .map(|((s, x), y)| (s - x + y).powi(2))
                        .sum();
                    let after_b: f64 = sums[b]
                        .iter()
                        .zip(&data[j])
                        .zip(&data[i])
                        .map(|((s, x), y)| (s - x + y).powi(2))
                        .sum();
                    let after = after_a / sizes[a] as f64 + after_b / sizes[b] as f64;

                    if after + 1e-12 < before {
                        add_into(&mut sums[a], &data[i], -1.0);
                        add_into(&mut sums[a], &data[j], 1.0);
                        add_into(&mut sums[b], &data[j], -1.0);
                        add_into(&mut sums[b], &data[i], 1.0);
                        labels.swap(i, j);
                        improved = true;
                    }
                }
            }
            if !improved {
                break;
            }
        }

        let centroids = update_centroids(data, &labels, &seeds);
        finish(data, labels, centroids)
    }
}

fn finish(data: &[Vec<f64>], labels: Vec<usize>, centroids: Vec<Vec<f64>>) -> ClusterFit {
    let inertia = data
        .iter()
        .zip(&labels)
        .map(|(point, &label)| distance_sq(point, &centroids[label]))
        .sum();

    ClusterFit {
        centroids,
        labels,
        inertia,
    }
}

/// Index of the nearest centroid per point
fn nearest(data: &[Vec<f64>], centroids: &[Vec<f64>]) -> Vec<usize> {
    data.iter()
        .map(|point| {
            let mut best_index = 0;
            let mut best_distance = distance_sq(point, &centroids[0]);
            for (index, centroid) in centroids.iter().enumerate().skip(1) {
                let distance = distance_sq(point, centroid);
                if distance <= best_distance {
                    best_index = index;
                    best_distance = distance;
                }
            }
            best_index
        })
        .collect()
}

/// Each point joins the farthest seed that still has room. The first
/// `n % k` groups hold one point more than the rest, so none is empty.
fn farthest_with_capacity(data: &[Vec<f64>], seeds: &[Vec<f64>]) -> Vec<usize> {
    let k = seeds.len();
    let mut room: Vec<usize> = (0..k)
        .map(|g| data.len() / k + usize::from(g < data.len() % k))
        .collect();

    data.iter()
        .map(|point| {
            let mut best: Option<(usize, f64)> = None;
            for (index, seed) in seeds.iter().enumerate() {
                if room[index] == 0 {
                    continue;
                }
                let distance = distance_sq(point, seed);
                if best.map_or(true, |(_, d)| distance >= d) {
                    best = Some((index, distance));
                }
            }
            // Capacities add up to the point count, so a group is always open
            let label = best.map(|(index, _)| index).unwrap_or(0);
            room[label] = room[label].saturating_sub(1);
            label
        })
        .collect()
}

fn add_into(target: &mut [f64], point: &[f64], sign: f64) {
    for (t, x) in target.iter_mut().zip(point) {
        *t += sign * x;
    }
}

fn norm_sq(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum()
}

/// k-means++ seeding: the first centroid is uniform, each further one is
/// drawn with probability proportional to its squared distance from the
/// closest centroid chosen so far.
fn plus_plus_init<R>(data: &[Vec<f64>], k: usize, rng: &mut R) -> Vec<Vec<f64>>
where
    R: Rng + ?Sized,
{
    let mut centroids = Vec::with_capacity(k);
    centroids.push(data[rng.gen_range(0..data.len())].clone());

    let mut closest: Vec<f64> = data.iter().map(|p| distance_sq(p, &centroids[0])).collect();
    while centroids.len() < k {
        // All-zero weights (duplicate points) fall back to a uniform pick
        let next = match WeightedIndex::new(&closest) {
            Ok(weights) => weights.sample(rng),
            Err(_) => rng.gen_range(0..data.len()),
        };
        let chosen = data[next].clone();
        for (d, point) in closest.iter_mut().zip(data) {
            *d = d.min(distance_sq(point, &chosen));
        }
        centroids.push(chosen);
    }
    centroids
}

/// Mean of each group; a group left empty keeps its previous centroid
fn update_centroids(data: &[Vec<f64>], labels: &[usize], previous: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let dim = data.first().map(Vec::len).unwrap_or(0);
    let mut sums = vec![vec![0.0; dim]; previous.len()];
    let mut counts = vec![0usize; previous.len()];

    for (point, &label) in data.iter().zip(labels) {
        for (sum, value) in sums[label].iter_mut().zip(point) {
            *sum += value;
        }
        counts[label] += 1;
    }

    sums.into_iter()
        .zip(counts)
        .zip(previous)
        .map(|((sum, count), old)| {
            if count == 0 {
                old.clone()
            } else {
                sum.into_iter().map(|s| s / count as f64).collect()
            }
        })
        .collect()
}

fn distance_sq(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}
