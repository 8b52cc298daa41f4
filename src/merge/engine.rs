//! Equivalence-class grouping and model merging.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use crate::graph::{ModelTarget, TargetGraph};
use crate::target::TargetId;

use super::MergeError;

/// Result of a merge run: one synthesized model per equivalence class.
///
/// Consumers whose model sets are set-equal share the same
/// `Arc<ModelTarget>` instance.
#[derive(Clone, Debug, Default)]
pub struct MergedModels {
    by_consumer: BTreeMap<TargetId, Arc<ModelTarget>>,
}

impl MergedModels {
    /// The merged node servicing `consumer`, if it depends on any models.
    #[must_use]
    pub fn merged_for(&self, consumer: &TargetId) -> Option<&Arc<ModelTarget>> {
        self.by_consumer.get(consumer)
    }

    /// Consumer-to-merged-node mapping, in consumer order.
    #[must_use]
    pub const fn by_consumer(&self) -> &BTreeMap<TargetId, Arc<ModelTarget>> {
        &self.by_consumer
    }

    /// The distinct merged nodes, in identifier order.
    #[must_use]
    pub fn distinct(&self) -> Vec<Arc<ModelTarget>> {
        let unique: BTreeMap<&TargetId, &Arc<ModelTarget>> = self
            .by_consumer
            .values()
            .map(|merged| (merged.id(), merged))
            .collect();
        unique.into_values().map(Arc::clone).collect()
    }

    /// Whether no consumer depends on any model.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_consumer.is_empty()
    }
}

/// Merge each consumer's model set into one synthesized node.
///
/// Classes are keyed by the model-id set itself, so two consumers with
/// identical sets receive the identical merged instance, computed once.
/// Within a class, payloads fold in sorted identifier order starting from
/// a deep copy of the first model's payload; each subsequent payload is
/// checked for compatibility against the running accumulator before being
/// folded in. The merged node's identifier is a pure function of the
/// sorted constituent identifiers, and its dependencies are the
/// deduplicated union of the constituents' dependencies.
///
/// # Errors
///
/// Returns [`MergeError::IncompatibleModels`] on a payload conflict and
/// [`MergeError::UnknownModel`] when the index names a model absent from
/// the graph.
pub fn merge_models(
    graph: &TargetGraph,
    index: &BTreeMap<TargetId, BTreeSet<TargetId>>,
) -> Result<MergedModels, MergeError> {
    let mut classes: HashMap<BTreeSet<TargetId>, Arc<ModelTarget>> = HashMap::new();
    let mut by_consumer: BTreeMap<TargetId, Arc<ModelTarget>> = BTreeMap::new();

    for (consumer, model_set) in index {
        if model_set.is_empty() {
            continue;
        }
        let merged = match classes.entry(model_set.clone()) {
            Entry::Occupied(entry) => Arc::clone(entry.get()),
            Entry::Vacant(entry) => {
                let fresh = Arc::new(merge_class(graph, model_set)?);
                entry.insert(Arc::clone(&fresh));
                fresh
            }
        };
        by_consumer.insert(consumer.clone(), merged);
    }

    tracing::debug!(
        consumers = by_consumer.len(),
        classes = classes.len(),
        "merged model equivalence classes",
    );
    Ok(MergedModels { by_consumer })
}

/// Fold one equivalence class into a synthesized model node.
fn merge_class(
    graph: &TargetGraph,
    model_set: &BTreeSet<TargetId>,
) -> Result<ModelTarget, MergeError> {
    let mut models = Vec::with_capacity(model_set.len());
    for model_id in model_set {
        let model = graph
            .get(model_id)
            .and_then(|node| node.as_model())
            .ok_or_else(|| MergeError::UnknownModel {
                model: model_id.clone(),
            })?;
        models.push(model);
    }
    let Some((first, rest)) = models.split_first() else {
        return Err(MergeError::UnknownModel {
            model: TargetId::merged_from(model_set.iter()),
        });
    };

    // Deep copy, then fold the remaining payloads into the accumulator.
    let mut payload = first.args().clone();
    let mut folded: Vec<TargetId> = vec![first.id().clone()];
    let mut deps: BTreeSet<TargetId> = first.deps().iter().cloned().collect();
    for model in rest {
        if !payload.is_mergeable_with(model.args()) {
            return Err(MergeError::IncompatibleModels {
                merged: folded,
                model: model.id().clone(),
            });
        }
        payload = payload.merge_with(model.args());
        folded.push(model.id().clone());
        deps.extend(model.deps().iter().cloned());
    }

    Ok(ModelTarget::new(
        TargetId::merged_from(model_set.iter()),
        deps,
        payload,
    ))
}
