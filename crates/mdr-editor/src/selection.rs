//! Selection state. Visual only: it never mutates the scene.

use mdr_core::{ElementRef, Scene};
use smallvec::SmallVec;

/// Ordered set of selected elements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    members: SmallVec<[ElementRef; 4]>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a click. `hit` is the element under the pointer, if any.
    ///
    /// - shift + element: toggle membership, rest untouched
    /// - element already selected: keep the selection (so it can be dragged)
    /// - element not selected: select only it
    /// - empty canvas: clear, unless shift is held
    pub fn click(&mut self, hit: Option<ElementRef>, shift: bool) {
        match (hit, shift) {
            (Some(r), true) => self.toggle(r),
            (Some(r), false) => {
                if !self.contains(r) {
                    self.members.clear();
                    self.members.push(r);
                }
            }
            (None, false) => self.members.clear(),
            (None, true) => {}
        }
    }

    pub fn toggle(&mut self, r: ElementRef) {
        if let Some(pos) = self.members.iter().position(|m| *m == r) {
            self.members.remove(pos);
        } else {
            self.members.push(r);
        }
    }

    pub fn contains(&self, r: ElementRef) -> bool {
        self.members.contains(&r)
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }

    /// Replace the selection with the given elements, deduplicated.
    pub fn set<I: IntoIterator<Item = ElementRef>>(&mut self, refs: I) {
        self.members.clear();
        for r in refs {
            if !self.members.contains(&r) {
                self.members.push(r);
            }
        }
    }

    /// Select every element in the scene, in paint order.
    pub fn select_all(&mut self, scene: &Scene) {
        self.set(scene.element_refs());
    }

    /// Drop members whose address no longer exists.
    pub fn retain_valid(&mut self, scene: &Scene) {
        self.members.retain(|r| scene.contains(*r));
    }

    pub fn members(&self) -> &[ElementRef] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
