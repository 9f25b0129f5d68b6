//! Named bone hierarchy for a hand model.
//!
//! Bones live in an arena owned by [`BoneHierarchy`] and are addressed by
//! [`BoneId`].  Finger bones follow the `Finger_<finger><part>` naming
//! convention, e.g. `Finger_13` is the index fingertip.  Hierarchies may be
//! partially authored, so every lookup returns an `Option` and callers skip
//! missing bones instead of failing.
//!
//! # Example
//!
//! ```rust
//! use manus_perception::skeleton::{BoneHierarchy, lookup_fingertip};
//! use manus_types::{Finger, HandSide};
//!
//! let hand = BoneHierarchy::standard_hand(HandSide::Right);
//! let tip = lookup_fingertip(&hand, Finger::Index).unwrap();
//! assert_eq!(hand.name(tip), "Finger_13");
//! ```

use std::path::Path;

use manus_types::{Finger, FingerPart, HandSide, ManusError};
use serde::{Deserialize, Serialize};

use crate::math::{Quaternion, Transform3D, Vec3};

/// Handle to a bone inside a [`BoneHierarchy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoneId(usize);

#[derive(Debug, Clone)]
struct BoneNode {
    name: String,
    parent: Option<BoneId>,
    children: Vec<BoneId>,
    local: Transform3D,
}

/// Serialisable description of a hand model, as stored in asset files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelNode {
    pub name: String,
    #[serde(default)]
    pub transform: Transform3D,
    #[serde(default)]
    pub children: Vec<ModelNode>,
}

/// Name of the bone for `finger` / `part`.
pub fn bone_name(finger: Finger, part: FingerPart) -> String {
    format!("Finger_{}{}", finger.index(), part.index())
}

/// Find the bone for `finger` / `part` anywhere below the root.
pub fn lookup_bone(hierarchy: &BoneHierarchy, finger: Finger, part: FingerPart) -> Option<BoneId> {
    hierarchy.find_deep(hierarchy.root(), &bone_name(finger, part))
}

/// Find the fingertip bone of `finger`.
pub fn lookup_fingertip(hierarchy: &BoneHierarchy, finger: Finger) -> Option<BoneId> {
    lookup_bone(hierarchy, finger, FingerPart::Distal)
}

/// Tree of named bones, each carrying a transform relative to its parent.
/// The root bone is the wrist.
#[derive(Debug, Clone)]
pub struct BoneHierarchy {
    nodes: Vec<BoneNode>,
}

impl BoneHierarchy {
    /// A hierarchy containing only a root bone.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            nodes: vec![BoneNode {
                name: root_name.into(),
                parent: None,
                children: Vec::new(),
                local: Transform3D::identity(),
            }],
        }
    }

    /// Append a bone under `parent`.  Names need not be unique; lookups
    /// return the first match.
    pub fn add_child(
        &mut self,
        parent: BoneId,
        name: impl Into<String>,
        local: Transform3D,
    ) -> BoneId {
        let id = BoneId(self.nodes.len());
        self.nodes.push(BoneNode {
            name: name.into(),
            parent: Some(parent),
            children: Vec::new(),
            local,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn root(&self) -> BoneId {
        BoneId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn name(&self, id: BoneId) -> &str {
        &self.nodes[id.0].name
    }

    pub fn parent(&self, id: BoneId) -> Option<BoneId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: BoneId) -> &[BoneId] {
        &self.nodes[id.0].children
    }

    pub fn local(&self, id: BoneId) -> Transform3D {
        self.nodes[id.0].local
    }

    pub fn set_local(&mut self, id: BoneId, local: Transform3D) {
        self.nodes[id.0].local = local;
    }

    pub fn local_rotation(&self, id: BoneId) -> Quaternion {
        self.nodes[id.0].local.rotation
    }

    pub fn set_local_rotation(&mut self, id: BoneId, rotation: Quaternion) {
        self.nodes[id.0].local.rotation = rotation;
    }

    pub fn set_local_translation(&mut self, id: BoneId, translation: Vec3) {
        self.nodes[id.0].local.translation = translation;
    }

    /// Search below `from` for a bone called `name`.
    ///
    /// Direct children are checked first, then each child's subtree in
    /// order.  `from` itself never matches.
    pub fn find_deep(&self, from: BoneId, name: &str) -> Option<BoneId> {
        let children = self.children(from);
        if let Some(&hit) = children.iter().find(|&&c| self.name(c) == name) {
            return Some(hit);
        }
        children.iter().find_map(|&c| self.find_deep(c, name))
    }

    /// Resolve a `/`-separated path of direct child names, relative to the
    /// root, e.g. `"Palm/Finger_10/Finger_11"`.  An empty path is the root.
    pub fn find_named_node(&self, path: &str) -> Option<BoneId> {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(self.root(), |node, segment| {
                self.children(node)
                    .iter()
                    .copied()
                    .find(|&c| self.name(c) == segment)
            })
    }

    /// Like [`find_named_node`][Self::find_named_node], but reports a missing
    /// bone as [`ManusError::NodeNotFound`].
    pub fn resolve(&self, path: &str) -> Result<BoneId, ManusError> {
        self.find_named_node(path)
            .or_else(|| self.find_deep(self.root(), path))
            .ok_or_else(|| ManusError::NodeNotFound {
                path: path.to_string(),
            })
    }

    /// Transform of `id` relative to the hierarchy's parent space.
    pub fn world_transform(&self, id: BoneId) -> Transform3D {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            chain.push(parent);
            current = parent;
        }
        chain
            .iter()
            .rev()
            .fold(Transform3D::identity(), |acc, &bone| acc.compose(self.local(bone)))
    }

    pub fn world_position(&self, id: BoneId) -> Vec3 {
        self.world_transform(id).translation
    }

    /// Unit forward (+Z) axis of `id` in world space.
    pub fn world_forward(&self, id: BoneId) -> Vec3 {
        self.world_transform(id).rotation.forward().normalized()
    }

    /// Build a hierarchy from a model description.  The model's root node
    /// becomes the root bone.
    pub fn from_model(model: &ModelNode) -> Self {
        let mut hierarchy = Self::new(model.name.clone());
        hierarchy.set_local(hierarchy.root(), model.transform);
        let root = hierarchy.root();
        hierarchy.attach_children(root, &model.children);
        hierarchy
    }

    fn attach_children(&mut self, parent: BoneId, children: &[ModelNode]) {
        for child in children {
            let id = self.add_child(parent, child.name.clone(), child.transform);
            self.attach_children(id, &child.children);
        }
    }

    /// Parse a JSON hand model asset.
    pub fn from_json(json: &str) -> Result<Self, ManusError> {
        let model: ModelNode = serde_json::from_str(json)
            .map_err(|e| ManusError::Asset(format!("invalid hand model: {e}")))?;
        Ok(Self::from_model(&model))
    }

    /// Load a JSON hand model asset from disk.
    pub fn load(path: &Path) -> Result<Self, ManusError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ManusError::Asset(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_json(&raw)
    }

    /// Procedural hand: a `Hand` wrist root with five four-bone finger chains
    /// pointing along +Z.  The left hand mirrors finger spread along X.
    pub fn standard_hand(side: HandSide) -> Self {
        // Knuckle offsets from the wrist (metres, right hand) and bone length.
        const KNUCKLES: [(f32, f32); 5] = [
            (-0.035, 0.030),
            (-0.020, 0.090),
            (0.000, 0.095),
            (0.020, 0.090),
            (0.038, 0.080),
        ];
        const BONE_LENGTH: [f32; 5] = [0.030, 0.035, 0.040, 0.036, 0.028];

        let mirror = match side {
            HandSide::Right => 1.0,
            HandSide::Left => -1.0,
        };

        let mut hand = Self::new("Hand");
        for finger in Finger::ALL {
            let (x, z) = KNUCKLES[finger.index()];
            let mut parent = hand.root();
            for part in FingerPart::ALL {
                let offset = if part == FingerPart::Knuckle {
                    Vec3::new(x * mirror, 0.0, z)
                } else {
                    Vec3::new(0.0, 0.0, BONE_LENGTH[finger.index()])
                };
                parent = hand.add_child(
                    parent,
                    bone_name(finger, part),
                    Transform3D::new(offset, Quaternion::identity()),
                );
            }
        }
        hand
    }
}
