//! Ownership of the three selection groups and the per-image join lock.

use crate::compositor::CroppedRegion;
use crate::selection::{GroupId, Selection};

/// Authoritative text for one group.
///
/// Writers go through [`GroupText::set`]; the revision lets a view detect
/// external changes without watching the widget it renders into.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupText {
    text: String,
    revision: u64,
}

impl GroupText {
    pub fn get(&self) -> &str {
        &self.text
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replaces the text, bumping the revision only on change.
    pub fn set(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        if text == self.text {
            return false;
        }
        self.text = text;
        self.revision += 1;
        true
    }
}

#[derive(Clone, Debug)]
pub struct SelectionGroup {
    id: GroupId,
    selections: Vec<Selection>,
    cropped: Option<CroppedRegion>,
    text: GroupText,
}

impl SelectionGroup {
    fn new(id: GroupId) -> Self {
        Self {
            id,
            selections: Vec::new(),
            cropped: None,
            text: GroupText::default(),
        }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Selections not yet merged, in drawing order.
    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    pub fn cropped(&self) -> Option<&CroppedRegion> {
        self.cropped.as_ref()
    }

    /// Height of the cropped region, or zero before a merge.
    pub fn cropped_height(&self) -> f64 {
        self.cropped.as_ref().map_or(0.0, CroppedRegion::height)
    }

    pub fn text(&self) -> &GroupText {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }
}

/// Up to three ordered selection lists, the active group and the join flag.
#[derive(Clone, Debug)]
pub struct SelectionGroupStore {
    groups: [SelectionGroup; GroupId::COUNT],
    active: GroupId,
    joined: bool,
}

impl Default for SelectionGroupStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionGroupStore {
    pub fn new() -> Self {
        Self {
            groups: GroupId::ALL.map(SelectionGroup::new),
            active: GroupId::default(),
            joined: false,
        }
    }

    pub fn active(&self) -> GroupId {
        self.active
    }

    /// Switches the group new selections go to. Ignored once joined.
    pub fn set_active(&mut self, group: GroupId) -> bool {
        if self.joined {
            return false;
        }
        self.active = group;
        true
    }

    pub fn is_joined(&self) -> bool {
        self.joined
    }

    pub fn group(&self, id: GroupId) -> &SelectionGroup {
        &self.groups[id.index()]
    }

    pub fn groups(&self) -> impl Iterator<Item = &SelectionGroup> {
        self.groups.iter()
    }

    pub fn selection_count(&self) -> usize {
        self.groups.iter().map(|g| g.selections.len()).sum()
    }

    /// Groups holding at least one selection, in stacking priority order.
    pub fn populated(&self) -> Vec<GroupId> {
        self.groups
            .iter()
            .filter(|g| !g.is_empty())
            .map(SelectionGroup::id)
            .collect()
    }

    pub fn set_text(&mut self, group: GroupId, text: impl Into<String>) -> bool {
        self.groups[group.index()].text.set(text)
    }

    pub(crate) fn push(&mut self, selection: Selection) -> bool {
        if self.joined {
            return false;
        }
        self.groups[selection.group().index()].selections.push(selection);
        true
    }

    /// Every selection that has not been folded into a cropped region.
    pub(crate) fn pending_mut(&mut self) -> impl Iterator<Item = &mut Selection> {
        self.groups.iter_mut().flat_map(|g| g.selections.iter_mut())
    }

    /// Replaces each merged group's selections with its cropped region and
    /// locks the store.
    pub(crate) fn commit_merge(&mut self, regions: Vec<CroppedRegion>) {
        for group in &mut self.groups {
            group.selections.clear();
            group.cropped = None;
        }
        for region in regions {
            let index = region.group().index();
            self.groups[index].cropped = Some(region);
        }
        self.active = GroupId::default();
        self.joined = true;
    }

    /// Back to the freshly-loaded state.
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}
