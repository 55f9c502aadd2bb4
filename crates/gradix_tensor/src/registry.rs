use crate::Tensor;
use dashmap::DashMap;

/// Metadata snapshot taken when a tensor is tracked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryEntry {
    pub label: Option<String>,
    pub shape: Vec<usize>,
    pub requires_grad: bool,
}

/// A concurrent registry of tensor metadata keyed by tensor id, for
/// inspecting which values a training scope holds. Tracking copies the
/// metadata; it does not keep the tensor alive or observe later changes.
#[derive(Default)]
pub struct ValueRegistry {
    entries: DashMap<usize, RegistryEntry>,
}

impl ValueRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&self, tensor: &Tensor) {
        self.entries.insert(
            tensor.id(),
            RegistryEntry {
                label: tensor.label().map(str::to_string),
                shape: tensor.shape().to_vec(),
                requires_grad: tensor.requires_grad(),
            },
        );
    }

    pub fn untrack(&self, id: usize) -> Option<RegistryEntry> {
        self.entries.remove(&id).map(|(_, entry)| entry)
    }

    pub fn get(&self, id: usize) -> Option<RegistryEntry> {
        self.entries.get(&id).map(|entry| entry.clone())
    }

    pub fn contains(&self, id: usize) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Labels of every tracked tensor that carries one.
    pub fn labels(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter_map(|entry| entry.value().label.clone())
            .collect()
    }
}
