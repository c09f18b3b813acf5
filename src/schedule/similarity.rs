use rand::Rng;
use tracing::{info, warn};

use crate::calendar::Calendar;
use crate::cluster::{KMeans, TfIdfVectorizer};
use crate::error::{Result, SchedulerError};

use super::slot_utils::{calculate_slot_occupancy, emptiest_slot, round_robin_index};
use super::types::{ClusterOutcome, ClusterRequest, ClusterSummary, Objective, StartPolicy, AUTO_CENTERS};

impl Calendar {
    /// Groups events with similar `request.attribute` text and places each
    /// group round-robin from its start slot
    pub fn cluster<R>(&mut self, request: &ClusterRequest, rng: &mut R) -> Result<ClusterOutcome>
    where
        R: Rng + ?Sized,
    {
        self.assign_by_similarity(Objective::Cluster, request, rng)
    }

    /// Like `cluster`, but groups are built to be as dissimilar as possible
    pub fn anti_cluster<R>(&mut self, request: &ClusterRequest, rng: &mut R) -> Result<ClusterOutcome>
    where
        R: Rng + ?Sized,
    {
        self.assign_by_similarity(Objective::AntiCluster, request, rng)
    }

    /// Shared pipeline behind `cluster` and `anti_cluster`.
    ///
    /// Only loaded events carrying the attribute move. An unknown start
    /// policy is rejected before anything changes; a bad centre count or a
    /// calendar without slots is an error, also before anything changes.
    pub fn assign_by_similarity<R>(
        &mut self,
        objective: Objective,
        request: &ClusterRequest,
        rng: &mut R,
    ) -> Result<ClusterOutcome>
    where
        R: Rng + ?Sized,
    {
        let policy: StartPolicy = match request.start.parse() {
            Ok(policy) => policy,
            Err(err) => {
                warn!(calendar = %self.tag, start = %request.start, error = %err, "Rejected cluster request");
                return Ok(ClusterOutcome::Rejected {
                    start: request.start.clone(),
                });
            }
        };
        self.require_slots()?;
        if request.centers == 0 || request.centers < AUTO_CENTERS {
            return Err(SchedulerError::InvalidCenters(request.centers));
        }

        let attribute = request.attribute.as_str();
        let slot_count = self.time_slots().len();

        let relevant_count = self.events().filter(|e| e.has_note(attribute)).count();
        if relevant_count == 0 {
            info!(calendar = %self.tag, attribute, "No events carry the attribute, nothing to assign");
            return Ok(ClusterOutcome::Assigned(ClusterSummary::default()));
        }

        // Read before any event moves: "first" looks at the previous assignment
        let first_index = self
            .events()
            .filter(|e| e.has_note(attribute))
            .filter_map(|e| e.assigned_start_time.as_deref())
            .min()
            .and_then(|slot| self.slot_index(slot))
            .unwrap_or(0);
        // Every loaded event counts where it sits now, relevant ones included
        let loaded: Vec<usize> = self
            .buckets()
            .enumerate()
            .flat_map(|(index, (_, events))| events.iter().map(move |_| index))
            .collect();
        let mut occupancy = calculate_slot_occupancy(loaded, slot_count);

        let mut relevant = self.take_where(|e| e.has_note(attribute));
        let descriptions: Vec<String> = relevant
            .iter()
            .map(|e| e.note(attribute).unwrap_or_default().join(" "))
            .collect();

        let vectors = TfIdfVectorizer::english().fit_transform(&descriptions);
        let groups = resolve_centers(request.centers, relevant.len());
        let fit = KMeans::new(groups, objective, request.config.clone()).fit(&vectors, rng);

        let mut members: Vec<Vec<usize>> = vec![Vec::new(); groups];
        for (index, &label) in fit.labels.iter().enumerate() {
            members[label].push(index);
        }

        for group in members.iter().filter(|m| !m.is_empty()) {
            let start_index = match policy {
                StartPolicy::Earliest => 0,
                StartPolicy::First => first_index,
                StartPolicy::Emptiest => emptiest_slot(&occupancy),
            };
            for (position, &member) in group.iter().enumerate() {
                let slot_index = round_robin_index(start_index, position, request.shift, slot_count);
                relevant[member].assigned_start_time = Some(self.time_slots()[slot_index].clone());
                occupancy[slot_index] += 1;
            }
        }

        let reloaded = self.load(relevant);
        if reloaded != relevant_count {
            warn!(
                calendar = %self.tag,
                relevant = relevant_count,
                reloaded,
                "Reloaded event count differs from relevant events"
            );
        }

        info!(
            calendar = %self.tag,
            attribute,
            policy = %policy,
            objective = ?objective,
            groups,
            relevant = relevant_count,
            "Similarity assignment done"
        );
        Ok(ClusterOutcome::Assigned(ClusterSummary {
            relevant: relevant_count,
            groups,
            reloaded,
        }))
    }
}

/// Group count for `relevant` events: `ceil(sqrt(relevant))` for
/// `AUTO_CENTERS`, otherwise the requested count capped at `relevant`.
/// `relevant` must be positive.
pub fn resolve_centers(centers: i64, relevant: usize) -> usize {
    if centers == AUTO_CENTERS {
        return ((relevant as f64).sqrt().ceil() as usize).max(1);
    }
    let requested = centers.max(1) as usize;
    if requested > relevant {
        warn!(requested, relevant, "More groups requested than events, capping");
        return relevant;
    }
    requested
}
