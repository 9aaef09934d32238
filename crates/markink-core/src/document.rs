//! The ordered annotation collection. Order is z-order.

use crate::objects::{AnnotationObject, GroupId, ObjectId, Stroke};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// The annotations of one document, serialized as `{"boxes": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationDocument {
    #[serde(rename = "boxes", default)]
    objects: Vec<AnnotationObject>,
}

impl AnnotationDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_objects(objects: Vec<AnnotationObject>) -> Self {
        Self { objects }
    }

    pub fn objects(&self) -> &[AnnotationObject] {
        &self.objects
    }

    /// Replace the whole collection, e.g. from a history snapshot.
    pub fn restore(&mut self, objects: Vec<AnnotationObject>) {
        self.objects = objects;
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Append an object on top.
    pub fn add(&mut self, object: AnnotationObject) {
        self.objects.push(object);
    }

    pub fn extend(&mut self, objects: impl IntoIterator<Item = AnnotationObject>) {
        self.objects.extend(objects);
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<AnnotationObject> {
        let index = self.index_of(id)?;
        Some(self.objects.remove(index))
    }

    /// Remove every object in `ids`. Returns how many were removed.
    pub fn remove_all(&mut self, ids: &[ObjectId]) -> usize {
        let before = self.objects.len();
        self.objects.retain(|o| !ids.contains(&o.id()));
        before - self.objects.len()
    }

    pub fn index_of(&self, id: ObjectId) -> Option<usize> {
        self.objects.iter().position(|o| o.id() == id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn get(&self, id: ObjectId) -> Option<&AnnotationObject> {
        self.objects.iter().find(|o| o.id() == id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut AnnotationObject> {
        self.objects.iter_mut().find(|o| o.id() == id)
    }

    /// Replace an object in place, keeping its z-order slot.
    pub fn replace(&mut self, object: AnnotationObject) -> bool {
        match self.get_mut(object.id()) {
            Some(slot) => {
                *slot = object;
                true
            }
            None => false,
        }
    }

    pub fn on_page(&self, page: usize) -> impl Iterator<Item = &AnnotationObject> {
        self.objects.iter().filter(move |o| o.page() == page)
    }

    pub fn strokes_on_page(&self, page: usize) -> impl Iterator<Item = &Stroke> {
        self.on_page(page).filter_map(AnnotationObject::as_stroke)
    }

    /// Members of a group, in z-order.
    pub fn group_members(&self, group: GroupId) -> Vec<ObjectId> {
        self.objects
            .iter()
            .filter(|o| o.group() == Some(group))
            .map(AnnotationObject::id)
            .collect()
    }

    /// Topmost non-stroke object on `page` hit by a page-local point.
    pub fn topmost_at(&self, page: usize, point: Point, tolerance: f64) -> Option<ObjectId> {
        self.objects
            .iter()
            .rev()
            .filter(|o| o.page() == page && !o.is_stroke())
            .find(|o| o.hit_test(point, tolerance))
            .map(AnnotationObject::id)
    }

    /// Strokes on `page` with at least one sample within `radius` of `point`.
    pub fn strokes_touching(&self, page: usize, point: Point, radius: f64) -> Vec<ObjectId> {
        self.strokes_on_page(page)
            .filter(|s| s.touches(point, radius))
            .map(|s| s.id)
            .collect()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
