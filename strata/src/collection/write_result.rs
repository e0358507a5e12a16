use crate::collection::ObjectId;

/// The ids touched by a remove, in storage order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WriteResult {
    object_ids: Vec<ObjectId>,
}

impl WriteResult {
    pub fn new(object_ids: Vec<ObjectId>) -> Self {
        Self { object_ids }
    }

    pub fn affected_ids(&self) -> &Vec<ObjectId> {
        &self.object_ids
    }

    pub fn count(&self) -> usize {
        self.object_ids.len()
    }
}

impl IntoIterator for WriteResult {
    type Item = ObjectId;
    type IntoIter = std::vec::IntoIter<ObjectId>;

    fn into_iter(self) -> Self::IntoIter {
        self.object_ids.into_iter()
    }
}
