//! CPU-side scene description: a small node arena with transforms, meshes,
//! points and lights. Nothing in here touches the GPU, so the whole scene can
//! be built and animated in unit tests.

pub mod blackhole;
pub mod geometry;
pub mod runtime;
pub mod starfield;

use glam::{Mat4, Quat, Vec3};
use sceneconfig::Rgb;

pub use blackhole::BlackHoleRig;
pub use geometry::{Geometry, MeshData, Vertex};
pub use runtime::SceneRuntime;

/// Index of a node inside a [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Position, Euler rotation (XYZ order) and uniform scale of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: 1.0,
        }
    }
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn rotated(rotation: Vec3) -> Self {
        Self {
            rotation,
            ..Self::default()
        }
    }

    pub fn rotation_matrix(&self) -> Mat4 {
        Mat4::from_rotation_x(self.rotation.x)
            * Mat4::from_rotation_y(self.rotation.y)
            * Mat4::from_rotation_z(self.rotation.z)
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * self.rotation_matrix()
            * Mat4::from_scale(Vec3::splat(self.scale))
    }
}

/// How overlapping fragments combine with what is already in the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Blending {
    Normal,
    Additive,
}

/// Which faces of a mesh get rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Front,
    Back,
    Double,
}

/// Parameters of the procedural accretion disk shader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiskShading {
    pub inner_color: Rgb,
    pub outer_color: Rgb,
    pub mid_color: Option<Rgb>,
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub glow_speed: f32,
    pub glow_frequency: f32,
    pub doppler_strength: f32,
    pub falloff: f32,
}

/// Parameters of the thin lensing bands (Einstein ring and arcs).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LensingShading {
    pub color: Rgb,
    pub radius: f32,
    pub thickness: f32,
    pub doppler_strength: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shading {
    /// Flat color, unlit.
    Basic { color: Rgb },
    /// Lambert diffuse against the scene lights plus an emissive term.
    Standard { color: Rgb, emissive: Rgb },
    AccretionDisk(DiskShading),
    Lensing(LensingShading),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub shading: Shading,
    pub opacity: f32,
    pub blending: Blending,
    pub side: Side,
    pub depth_write: bool,
}

impl Material {
    pub fn basic(color: Rgb, opacity: f32) -> Self {
        Self {
            shading: Shading::Basic { color },
            opacity,
            blending: Blending::Normal,
            side: Side::Front,
            depth_write: true,
        }
    }

    /// Transparent glow layer: additive, both faces, no depth writes.
    pub fn additive(shading: Shading, opacity: f32) -> Self {
        Self {
            shading,
            opacity,
            blending: Blending::Additive,
            side: Side::Double,
            depth_write: false,
        }
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }
}

/// Unlit dots drawn one pixel wide.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    pub positions: Vec<[f32; 3]>,
    pub color: Rgb,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    Point { color: Rgb, intensity: f32 },
    Ambient { color: Rgb, intensity: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Group,
    Mesh {
        geometry: Geometry,
        material: Material,
    },
    /// The mesh keeps its local +Z axis pointed at the camera; only the
    /// rotation about that axis is taken from the transform.
    Billboard {
        geometry: Geometry,
        material: Material,
    },
    Points(PointCloud),
    Light(Light),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    pub kind: NodeKind,
    pub visible: bool,
    children: Vec<NodeId>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            transform: Transform::default(),
            kind,
            visible: true,
            children: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// World-space point light, flattened for uniform upload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLightInstance {
    pub position: Vec3,
    pub color: Rgb,
    pub intensity: f32,
}

#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
    roots: Vec<NodeId>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_root(&mut self, node: SceneNode) -> NodeId {
        let id = self.push(node);
        self.roots.push(id);
        id
    }

    /// Panics if `parent` does not belong to this graph.
    pub fn add_child(&mut self, parent: NodeId, node: SceneNode) -> NodeId {
        let id = self.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    fn push(&mut self, node: SceneNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &SceneNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut SceneNode {
        &mut self.nodes[id.0]
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index), node))
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.iter()
            .find(|(_, node)| node.name == name)
            .map(|(id, _)| id)
    }

    /// World matrix for every node, indexed by [`NodeId::index`].
    ///
    /// `eye` is the camera position and only matters for billboards.
    pub fn world_matrices(&self, eye: Vec3) -> Vec<Mat4> {
        let mut worlds = vec![Mat4::IDENTITY; self.nodes.len()];
        let mut stack: Vec<(NodeId, Mat4)> = self
            .roots
            .iter()
            .rev()
            .map(|root| (*root, Mat4::IDENTITY))
            .collect();

        while let Some((id, parent)) = stack.pop() {
            let node = &self.nodes[id.0];
            let world = match node.kind {
                NodeKind::Billboard { .. } => billboard_matrix(parent, &node.transform, eye),
                _ => parent * node.transform.matrix(),
            };
            worlds[id.0] = world;
            for child in node.children.iter().rev() {
                stack.push((*child, world));
            }
        }
        worlds
    }

    /// Effective visibility of every node: a node is drawn only when it and
    /// all of its ancestors are visible.
    pub fn visibility(&self) -> Vec<bool> {
        let mut visible = vec![false; self.nodes.len()];
        let mut stack: Vec<NodeId> = self.roots.clone();
        while let Some(current) = stack.pop() {
            let node = &self.nodes[current.0];
            if !node.visible {
                continue;
            }
            visible[current.0] = true;
            stack.extend(node.children.iter().copied());
        }
        visible
    }

    pub fn is_visible(&self, id: NodeId) -> bool {
        self.visibility()[id.0]
    }

    pub fn point_lights(&self, worlds: &[Mat4]) -> Vec<PointLightInstance> {
        self.iter()
            .filter_map(|(id, node)| match node.kind {
                NodeKind::Light(Light::Point { color, intensity }) if node.visible => {
                    Some(PointLightInstance {
                        position: worlds[id.0].transform_point3(Vec3::ZERO),
                        color,
                        intensity,
                    })
                }
                _ => None,
            })
            .collect()
    }

    /// Sum of every ambient light, premultiplied by intensity.
    pub fn ambient(&self) -> Vec3 {
        self.nodes
            .iter()
            .filter(|node| node.visible)
            .filter_map(|node| match node.kind {
                NodeKind::Light(Light::Ambient { color, intensity }) => {
                    Some(Vec3::from(color.to_array()) * intensity)
                }
                _ => None,
            })
            .fold(Vec3::ZERO, |acc, light| acc + light)
    }
}

fn billboard_matrix(parent: Mat4, transform: &Transform, eye: Vec3) -> Mat4 {
    let origin = parent.transform_point3(transform.position);
    let facing = (eye - origin).try_normalize().unwrap_or(Vec3::Z);
    let orientation = Quat::from_rotation_arc(Vec3::Z, facing);
    Mat4::from_translation(origin)
        * Mat4::from_quat(orientation)
        * Mat4::from_rotation_z(transform.rotation.z)
        * Mat4::from_scale(Vec3::splat(transform.scale))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(name: &str) -> SceneNode {
        SceneNode::new(name, NodeKind::Group)
    }

    #[test]
    fn child_inherits_parent_transform() {
        let mut graph = SceneGraph::new();
        let parent = graph.add_root(group("parent").with_transform(Transform::at(Vec3::X * 2.0)));
        let child = graph.add_child(parent, group("child").with_transform(Transform::at(Vec3::Y)));

        let worlds = graph.world_matrices(Vec3::Z);
        let origin = worlds[child.index()].transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(2.0, 1.0, 0.0)).length() < 1e-6);
        assert_eq!(graph.find("child"), Some(child));
    }

    #[test]
    fn euler_rotation_applies_x_last() {
        let transform = Transform::rotated(Vec3::new(std::f32::consts::FRAC_PI_2, 0.0, 0.0));
        // a ring in the XY plane tilted about X: +Y maps onto +Z
        let mapped = transform.matrix().transform_vector3(Vec3::Y);
        assert!((mapped - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn billboard_faces_the_eye() {
        let mut graph = SceneGraph::new();
        let ring = graph.add_root(SceneNode::new(
            "ring",
            NodeKind::Billboard {
                geometry: Geometry::Sphere {
                    radius: 1.0,
                    width_segments: 8,
                    height_segments: 6,
                },
                material: Material::basic(Rgb::WHITE, 1.0),
            },
        ));
        let eye = Vec3::new(10.0, 5.0, 0.0);
        let worlds = graph.world_matrices(eye);
        let normal = worlds[ring.index()].transform_vector3(Vec3::Z);
        assert!((normal.normalize() - eye.normalize()).length() < 1e-5);
    }

    #[test]
    fn hidden_parent_hides_children() {
        let mut graph = SceneGraph::new();
        let parent = graph.add_root(group("parent"));
        let child = graph.add_child(parent, group("child"));
        assert!(graph.is_visible(child));
        graph.node_mut(parent).visible = false;
        assert!(!graph.is_visible(child));
    }

    #[test]
    fn collects_lights_in_world_space() {
        let mut graph = SceneGraph::new();
        let rig = graph.add_root(group("rig").with_transform(Transform::at(Vec3::new(0.0, 1.0, 0.0))));
        graph.add_child(
            rig,
            SceneNode::new(
                "key",
                NodeKind::Light(Light::Point {
                    color: Rgb::WHITE,
                    intensity: 2.0,
                }),
            )
            .with_transform(Transform::at(Vec3::new(0.0, 2.0, 0.0))),
        );
        graph.add_root(SceneNode::new(
            "fill",
            NodeKind::Light(Light::Ambient {
                color: Rgb::WHITE,
                intensity: 0.1,
            }),
        ));

        let worlds = graph.world_matrices(Vec3::Z);
        let lights = graph.point_lights(&worlds);
        assert_eq!(lights.len(), 1);
        assert!((lights[0].position - Vec3::new(0.0, 3.0, 0.0)).length() < 1e-6);
        assert!((graph.ambient() - Vec3::splat(0.1)).length() < 1e-6);
    }
}
