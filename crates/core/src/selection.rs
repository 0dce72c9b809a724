//! Selections and the drag gesture that draws them.
//!
//! A gesture follows `Idle -> Drawing -> Idle`. Pointer-down starts a
//! zero-size candidate, moves resize it around the drag midpoint, and
//! pointer-up either commits it to the active group or discards it as a
//! misclick.

use crate::camera::{Camera, Viewport};
use crate::geometry::Solid;
use crate::projector::Projector;
use crate::store::SelectionGroupStore;
use glam::{DQuat, DVec2, DVec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Depth of every selection box, so it is a true solid for boolean ops.
pub const SELECTION_DEPTH: f64 = 0.1;

/// Largest per-channel offset applied to a group's tint on each draw.
const COLOR_JITTER: i16 = 24;

/// Identifier of one of the three selection groups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct GroupId(u8);

impl GroupId {
    pub const COUNT: usize = 3;

    /// All groups in stacking priority order.
    pub const ALL: [GroupId; GroupId::COUNT] = [GroupId(0), GroupId(1), GroupId(2)];

    pub fn new(id: u8) -> Option<Self> {
        (usize::from(id) < Self::COUNT).then_some(Self(id))
    }

    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    /// Base tint used when drawing this group's selections.
    pub fn color(self) -> [u8; 3] {
        match self.0 {
            0 => [229, 57, 53],
            1 => [30, 136, 229],
            _ => [67, 160, 71],
        }
    }
}

impl Default for GroupId {
    fn default() -> Self {
        GroupId(0)
    }
}

impl TryFrom<u8> for GroupId {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        GroupId::new(value).ok_or_else(|| format!("group id {value} out of range"))
    }
}

impl From<GroupId> for u8 {
    fn from(id: GroupId) -> Self {
        id.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SelectionId(u64);

/// One finalized rectangular selection.
#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
    id: SelectionId,
    group: GroupId,
    solid: Solid,
    color: [u8; 3],
}

impl Selection {
    pub(crate) fn new(id: u64, group: GroupId, solid: Solid, color: [u8; 3]) -> Self {
        Self {
            id: SelectionId(id),
            group,
            solid,
            color,
        }
    }

    pub fn id(&self) -> SelectionId {
        self.id
    }

    pub fn group(&self) -> GroupId {
        self.group
    }

    pub fn solid(&self) -> &Solid {
        &self.solid
    }

    pub fn color(&self) -> [u8; 3] {
        self.color
    }

    /// Rotation applied to this selection so far.
    pub fn orientation(&self) -> DQuat {
        self.solid.placement().rotation
    }

    pub(crate) fn rotate_about(&mut self, pivot: DVec3, rotation: DQuat) {
        self.solid.rotate_about(pivot, rotation);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Why a gesture was not started.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    NotPrimaryButton,
    OverUi,
    RotateMode,
    Joined,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureOutcome {
    /// A zero-size candidate was created.
    Started,
    /// The candidate was resized.
    Resized,
    /// The candidate was appended to its group.
    Committed(SelectionId),
    /// The candidate was below the minimum size and dropped.
    Discarded,
    /// The gesture was not started.
    Rejected(RejectReason),
    /// The event did not belong to any gesture.
    Ignored,
}

#[derive(Clone, Debug)]
struct Candidate {
    start: DVec3,
    current: DVec3,
    group: GroupId,
    color: [u8; 3],
}

impl Candidate {
    fn size(&self) -> DVec2 {
        (self.current - self.start).truncate().abs()
    }

    fn solid(&self) -> Solid {
        let center = (self.start + self.current) * 0.5;
        Solid::cuboid(center, self.size().extend(SELECTION_DEPTH))
    }
}

#[derive(Clone, Debug)]
enum DrawState {
    Idle,
    Drawing(Candidate),
}

/// Builds one candidate selection per drag gesture.
pub struct SelectionDrawer {
    projector: Projector,
    min_size: f64,
    state: DrawState,
    rng: StdRng,
    next_id: u64,
}

impl SelectionDrawer {
    pub fn new(projector: Projector, min_size: f64) -> Self {
        Self::with_rng(projector, min_size, StdRng::from_entropy())
    }

    /// Drawer with a fixed colour-jitter seed.
    pub fn seeded(projector: Projector, min_size: f64, seed: u64) -> Self {
        Self::with_rng(projector, min_size, StdRng::seed_from_u64(seed))
    }

    fn with_rng(projector: Projector, min_size: f64, rng: StdRng) -> Self {
        Self {
            projector,
            min_size,
            state: DrawState::Idle,
            rng,
            next_id: 0,
        }
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, DrawState::Drawing(_))
    }

    /// Solid and tint of the in-progress candidate, for previewing.
    pub fn candidate(&self) -> Option<(Solid, [u8; 3])> {
        match &self.state {
            DrawState::Drawing(candidate) => Some((candidate.solid(), candidate.color)),
            DrawState::Idle => None,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn pointer_down(
        &mut self,
        screen: DVec2,
        button: PointerButton,
        over_ui: bool,
        rotate_mode: bool,
        store: &SelectionGroupStore,
        camera: &Camera,
        viewport: Viewport,
    ) -> GestureOutcome {
        let rejected = if button != PointerButton::Primary {
            Some(RejectReason::NotPrimaryButton)
        } else if over_ui {
            Some(RejectReason::OverUi)
        } else if rotate_mode {
            Some(RejectReason::RotateMode)
        } else if store.is_joined() {
            Some(RejectReason::Joined)
        } else {
            None
        };
        if let Some(reason) = rejected {
            log::debug!("gesture rejected: {reason:?}");
            return GestureOutcome::Rejected(reason);
        }

        let start = self.projector.project(screen, viewport, camera);
        let group = store.active();
        let color = self.jitter(group.color());
        self.state = DrawState::Drawing(Candidate {
            start,
            current: start,
            group,
            color,
        });
        GestureOutcome::Started
    }

    pub fn pointer_move(
        &mut self,
        screen: DVec2,
        camera: &Camera,
        viewport: Viewport,
    ) -> GestureOutcome {
        let DrawState::Drawing(candidate) = &mut self.state else {
            return GestureOutcome::Ignored;
        };
        candidate.current = self.projector.project(screen, viewport, camera);
        GestureOutcome::Resized
    }

    pub fn pointer_up(&mut self, store: &mut SelectionGroupStore) -> GestureOutcome {
        let DrawState::Drawing(candidate) = std::mem::replace(&mut self.state, DrawState::Idle)
        else {
            return GestureOutcome::Ignored;
        };

        let size = candidate.size();
        if size.x < self.min_size || size.y < self.min_size {
            log::debug!("discarding {:.4}x{:.4} selection as a misclick", size.x, size.y);
            return GestureOutcome::Discarded;
        }

        let selection = Selection::new(
            self.next_id,
            candidate.group,
            candidate.solid(),
            candidate.color,
        );
        let id = selection.id();
        if !store.push(selection) {
            return GestureOutcome::Rejected(RejectReason::Joined);
        }
        self.next_id += 1;
        log::debug!("committed selection {:?} to group {}", id, candidate.group);
        GestureOutcome::Committed(id)
    }

    /// Drops any in-progress candidate.
    pub fn cancel(&mut self) {
        self.state = DrawState::Idle;
    }

    fn jitter(&mut self, base: [u8; 3]) -> [u8; 3] {
        base.map(|channel| {
            let offset = self.rng.gen_range(-COLOR_JITTER..=COLOR_JITTER);
            (i16::from(channel) + offset).clamp(0, 255) as u8
        })
    }
}
