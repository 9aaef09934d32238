//! Copy/paste of annotation objects.

use crate::objects::{AnnotationObject, GroupId};
use kurbo::Vec2;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use uuid::Uuid;

/// Holds copied objects between editor sessions or documents.
pub trait Clipboard {
    /// Replace the clipboard contents with deep copies of `objects`.
    fn copy(&mut self, objects: Vec<AnnotationObject>);

    /// The current contents, if any.
    fn contents(&self) -> Option<Vec<AnnotationObject>>;
}

/// In-process clipboard.
#[derive(Debug, Default)]
pub struct LocalClipboard {
    slot: Option<Vec<AnnotationObject>>,
}

impl Clipboard for LocalClipboard {
    fn copy(&mut self, objects: Vec<AnnotationObject>) {
        self.slot = if objects.is_empty() { None } else { Some(objects) };
    }

    fn contents(&self) -> Option<Vec<AnnotationObject>> {
        self.slot.clone()
    }
}

/// Lets several editors share one clipboard.
impl<C: Clipboard> Clipboard for Rc<RefCell<C>> {
    fn copy(&mut self, objects: Vec<AnnotationObject>) {
        self.borrow_mut().copy(objects);
    }

    fn contents(&self) -> Option<Vec<AnnotationObject>> {
        self.borrow().contents()
    }
}

/// Turn clipboard contents into pasteable clones.
///
/// Every clone gets a fresh id and is shifted by `offset` (strokes through their
/// offset). Clones that shared a group share a fresh group token.
pub fn prepare_paste(objects: &[AnnotationObject], offset: Vec2) -> Vec<AnnotationObject> {
    let mut groups: HashMap<GroupId, GroupId> = HashMap::new();
    objects
        .iter()
        .map(|original| {
            let mut clone = original.clone();
            clone.regenerate_id();
            clone.translate(offset);
            if let Some(group) = original.group() {
                let fresh = *groups.entry(group).or_insert_with(Uuid::new_v4);
                clone.set_group(Some(fresh));
            }
            clone
        })
        .collect()
}
