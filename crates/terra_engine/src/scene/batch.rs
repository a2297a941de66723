//! Per-pass batch map
//!
//! Visible objects are grouped by the identity of their model, so each
//! group pays for one vertex array bind however many materials its
//! instances carry. The map is rebuilt every pass and iterates in
//! first-seen order, which keeps draw order stable from frame to frame.

use std::collections::HashMap;

use crate::render::ModelId;

/// Objects sharing one model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityBatch {
    /// Shared model handle
    pub model: ModelId,
    /// Indices into the scene's object list
    pub instances: Vec<usize>,
}

/// Insertion-ordered map from model handle to object indices
#[derive(Debug, Default, Clone)]
pub struct EntityBatches {
    index: HashMap<ModelId, usize>,
    batches: Vec<EntityBatch>,
}

impl EntityBatches {
    /// Empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `object` to the batch for `model`
    pub fn insert(&mut self, model: ModelId, object: usize) {
        let slot = *self.index.entry(model).or_insert_with(|| {
            self.batches.push(EntityBatch { model, instances: Vec::new() });
            self.batches.len() - 1
        });
        self.batches[slot].instances.push(object);
    }

    /// Batches in first-seen order
    pub fn batches(&self) -> &[EntityBatch] {
        &self.batches
    }

    /// Number of batches
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    /// No batches
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Objects across all batches
    pub fn total_instances(&self) -> usize {
        self.batches.iter().map(|b| b.instances.len()).sum()
    }

    /// Batch sizes in iteration order
    pub fn sizes(&self) -> Vec<usize> {
        self.batches.iter().map(|b| b.instances.len()).collect()
    }

    /// Drop every batch, keeping allocations
    pub fn clear(&mut self) {
        self.index.clear();
        self.batches.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_by_model_in_first_seen_order() {
        let mut batches = EntityBatches::new();
        batches.insert(ModelId(2), 0);
        batches.insert(ModelId(1), 1);
        batches.insert(ModelId(2), 2);
        batches.insert(ModelId(2), 3);

        assert_eq!(batches.len(), 2);
        assert_eq!(batches.batches()[0].instances, vec![0, 2, 3]);
        assert_eq!(batches.batches()[1].model, ModelId(1));
        assert_eq!(batches.total_instances(), 4);

        batches.clear();
        assert!(batches.is_empty());
        batches.insert(ModelId(9), 0);
        assert_eq!(batches.sizes(), vec![1]);
    }
}
