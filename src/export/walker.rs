//! Selection walk: resolve roots into linkset plans.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::host::SceneGraph;
use crate::scene::{ObjectId, SceneObject};

/// Why an object was left out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    Avatar,
    Permissions,
    Missing,
    /// Root already listed, or a member of an earlier linkset.
    Duplicate,
}

impl SkipReason {
    pub fn message(self) -> &'static str {
        match self {
            Self::Avatar => "Avatars are not exported",
            Self::Permissions => "Insufficient permissions",
            Self::Missing => "Object no longer in scene",
            Self::Duplicate => "Already part of the export",
        }
    }
}

/// Object-level export filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PermissionFilter {
    pub follow_permissions: bool,
}

impl PermissionFilter {
    pub fn check(&self, object: &SceneObject) -> Result<(), SkipReason> {
        if object.is_avatar {
            return Err(SkipReason::Avatar);
        }
        if self.follow_permissions && !object.permissions.is_full() {
            return Err(SkipReason::Permissions);
        }
        Ok(())
    }
}

/// A root and its members, root first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinksetPlan {
    pub root: ObjectId,
    pub members: Vec<ObjectId>,
}

/// Output of a selection walk.
#[derive(Clone, Debug, Default)]
pub struct WalkResult {
    pub linksets: Vec<LinksetPlan>,
    pub total_linksets: u32,
    pub total_objects: u32,
    pub skipped: Vec<(ObjectId, SkipReason)>,
}

/// Resolves a selection into linksets to export.
pub struct SelectionWalker {
    filter: PermissionFilter,
}

impl SelectionWalker {
    pub fn new(filter: PermissionFilter) -> Self {
        Self { filter }
    }

    /// Walk `selection` and clear the host selection afterwards.
    ///
    /// Totals start at the selection's size and are decremented for every
    /// root that is filtered out. Null roots leave only the linkset total
    /// reduced.
    pub fn walk(&self, selection: &[ObjectId], scene: &mut dyn SceneGraph) -> WalkResult {
        let mut out = WalkResult { total_linksets: selection.len() as u32, ..Default::default() };

        let resolved: Vec<(ObjectId, Option<Vec<ObjectId>>)> = selection
            .iter()
            .map(|id| (*id, scene.object(id).map(|_| collect_members(id, &*scene))))
            .collect();
        out.total_objects = resolved
            .iter()
            .filter_map(|(_, m)| m.as_ref())
            .map(|m| m.len() as u32)
            .sum();

        let mut claimed: HashSet<ObjectId> = HashSet::new();
        for (root, members) in resolved {
            if claimed.contains(&root) {
                debug!("root {} already planned", root);
                out.total_linksets = out.total_linksets.saturating_sub(1);
                out.total_objects = out.total_objects.saturating_sub(members.map_or(0, |m| m.len() as u32));
                out.skipped.push((root, SkipReason::Duplicate));
                continue;
            }
            let Some(mut members) = members else {
                debug!("selected root {} is gone", root);
                out.total_linksets = out.total_linksets.saturating_sub(1);
                out.skipped.push((root, SkipReason::Missing));
                continue;
            };
            let verdict = scene
                .object(&root)
                .map_or(Err(SkipReason::Missing), |obj| self.filter.check(obj));
            if let Err(reason) = verdict {
                info!("skipping linkset {}: {}", root, reason.message());
                out.total_linksets = out.total_linksets.saturating_sub(1);
                out.total_objects = out.total_objects.saturating_sub(members.len() as u32);
                out.skipped.push((root, reason));
                continue;
            }
            // Members already exported with an earlier linkset.
            let before = members.len();
            members.retain(|id| !claimed.contains(id));
            out.total_objects = out.total_objects.saturating_sub((before - members.len()) as u32);
            claimed.extend(members.iter().copied());
            out.linksets.push(LinksetPlan { root, members });
        }

        scene.deselect_all();
        out
    }
}

/// Root followed by its non-avatar descendants, depth first.
fn collect_members(root: &ObjectId, scene: &dyn SceneGraph) -> Vec<ObjectId> {
    let mut members = vec![*root];
    let mut stack: Vec<ObjectId> = match scene.object(root) {
        Some(obj) => obj.children.iter().rev().copied().collect(),
        None => return members,
    };
    while let Some(id) = stack.pop() {
        let Some(obj) = scene.object(&id) else {
            // Resolved again at submission time.
            members.push(id);
            continue;
        };
        if obj.is_avatar || members.contains(&id) {
            continue;
        }
        members.push(id);
        stack.extend(obj.children.iter().rev().copied());
    }
    members
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryScene;
    use crate::scene::ObjectPermissions;
    use crate::util::Vec3;
    use uuid::Uuid;

    fn id(n: u128) -> ObjectId {
        Uuid::from_u128(n)
    }

    fn scene() -> MemoryScene {
        let mut scene = MemoryScene::new();
        let mut root = SceneObject::volume(id(1), 1);
        root.children = vec![id(2), id(3), id(4)];
        root.position = Vec3::new(10.0, 10.0, 10.0);
        scene.insert(root);

        let mut child = SceneObject::volume(id(2), 2);
        child.parent = Some(id(1));
        child.position = Vec3::new(12.0, 10.0, 10.0);
        scene.insert(child);

        let mut sitter = SceneObject::volume(id(3), 3);
        sitter.is_avatar = true;
        scene.insert(sitter);

        let mut locked = SceneObject::volume(id(10), 10);
        locked.permissions = ObjectPermissions { modify: true, copy: false, transfer: true };
        scene.insert(locked);
        scene
    }

    #[test]
    fn test_members_skip_avatars() {
        let mut scene = scene();
        let walker = SelectionWalker::new(PermissionFilter { follow_permissions: true });
        let out = walker.walk(&[id(1)], &mut scene);
        assert_eq!(out.linksets.len(), 1);
        // Missing child 4 stays in the plan; submission skips it.
        assert_eq!(out.linksets[0].members, vec![id(1), id(2), id(4)]);
        assert_eq!(out.total_objects, 3);
        assert!(scene.selection_cleared());
    }

    #[test]
    fn test_filtered_and_null_roots_reduce_totals() {
        let mut scene = scene();
        let walker = SelectionWalker::new(PermissionFilter { follow_permissions: true });
        let out = walker.walk(&[id(1), id(10), id(99)], &mut scene);
        assert_eq!(out.linksets.len(), 1);
        assert_eq!(out.total_linksets, 1);
        assert_eq!(out.total_objects, 3);
        assert_eq!(out.skipped, vec![(id(10), SkipReason::Permissions), (id(99), SkipReason::Missing)]);

        let lenient = SelectionWalker::new(PermissionFilter { follow_permissions: false });
        let out = lenient.walk(&[id(10), id(3)], &mut scene);
        assert_eq!(out.linksets.len(), 1);
        assert_eq!(out.skipped, vec![(id(3), SkipReason::Avatar)]);
    }

    #[test]
    fn test_repeated_and_nested_roots_planned_once() {
        let mut scene = scene();
        let walker = SelectionWalker::new(PermissionFilter { follow_permissions: true });
        let out = walker.walk(&[id(1), id(1), id(2)], &mut scene);
        assert_eq!(out.linksets.len(), 1);
        assert_eq!(out.total_linksets, 1);
        assert_eq!(out.total_objects, 3);
        assert_eq!(out.skipped, vec![(id(1), SkipReason::Duplicate), (id(2), SkipReason::Duplicate)]);

        // A child listed before its root keeps its own plan.
        let out = walker.walk(&[id(2), id(1)], &mut scene);
        assert_eq!(out.linksets.len(), 2);
        assert_eq!(out.linksets[1].members, vec![id(1), id(4)]);
        assert_eq!(out.total_objects, 3);
    }
}
