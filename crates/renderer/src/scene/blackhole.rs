use std::f32::consts::TAU;

use glam::Vec3;
use sceneconfig::{DiskMaterial, SceneConfig};

use super::{
    starfield, Blending, DiskShading, Geometry, LensingShading, Light, Material, NodeId,
    NodeKind, SceneGraph, SceneNode, Shading, Side, Transform,
};
use crate::animation::Spin;
use crate::shading;

/// Share of the disk gradient that glows when the disk is lit instead of
/// shaded procedurally.
const STANDARD_EMISSIVE: f32 = 0.6;

/// Handles to every node the animator or the renderer needs by name.
#[derive(Debug, Clone, PartialEq)]
pub struct BlackHoleRig {
    pub group: NodeId,
    pub horizon: NodeId,
    pub disk: NodeId,
    pub glow: Option<NodeId>,
    pub einstein_ring: Option<NodeId>,
    pub arcs: Vec<NodeId>,
    pub shells: Vec<NodeId>,
    pub stars: NodeId,
    pub lights: Vec<NodeId>,
}

impl BlackHoleRig {
    /// Populates `graph` with the full scene and returns the rig plus the
    /// spins the animator should apply.
    pub fn build(graph: &mut SceneGraph, config: &SceneConfig, seed: u64) -> (Self, Vec<Spin>) {
        let mut spins = Vec::new();

        let stars = graph.add_root(SceneNode::new(
            "starfield",
            NodeKind::Points(starfield::build(&config.starfield, seed)),
        ));

        let lights = add_lights(graph, config);

        let size = config.black_hole.size;
        let group = graph.add_root(SceneNode::new("black-hole", NodeKind::Group));

        let hole = &config.black_hole;
        let horizon = graph.add_child(
            group,
            SceneNode::new(
                "event-horizon",
                NodeKind::Mesh {
                    geometry: Geometry::Sphere {
                        radius: size * hole.horizon_radius,
                        width_segments: hole.horizon_segments,
                        height_segments: hole.horizon_segments,
                    },
                    material: Material::basic(hole.horizon_color, hole.horizon_opacity),
                },
            ),
        );

        let disk_settings = &config.disk;
        let tilt = Vec3::new(disk_settings.tilt_degrees.to_radians(), 0.0, 0.0);
        let disk_shading = DiskShading {
            inner_color: disk_settings.inner_color,
            outer_color: disk_settings.outer_color,
            mid_color: disk_settings.mid_color,
            inner_radius: size * disk_settings.inner,
            outer_radius: size * disk_settings.outer,
            glow_speed: disk_settings.glow_speed,
            glow_frequency: disk_settings.glow_frequency,
            doppler_strength: disk_settings.doppler_strength,
            falloff: disk_settings.falloff,
        };
        let disk_material = match disk_settings.material {
            DiskMaterial::Shader => {
                Material::additive(Shading::AccretionDisk(disk_shading), 1.0)
            }
            DiskMaterial::Standard => {
                let midpoint = shading::gradient(
                    disk_shading.inner_color,
                    disk_shading.mid_color,
                    disk_shading.outer_color,
                    0.5,
                );
                let color = sceneconfig::Rgb::new(midpoint.x, midpoint.y, midpoint.z);
                Material {
                    shading: Shading::Standard {
                        color,
                        emissive: color.scaled(STANDARD_EMISSIVE),
                    },
                    opacity: 1.0,
                    blending: Blending::Normal,
                    side: Side::Double,
                    depth_write: true,
                }
            }
        };
        let disk = graph.add_child(
            group,
            SceneNode::new(
                "accretion-disk",
                NodeKind::Mesh {
                    geometry: Geometry::full_ring(
                        disk_shading.inner_radius,
                        disk_shading.outer_radius,
                        disk_settings.segments,
                    ),
                    material: disk_material,
                },
            )
            .with_transform(Transform::rotated(tilt)),
        );
        spins.push(Spin::about_z(disk, disk_settings.spin));

        let glow = config.glow.enabled.then(|| {
            let settings = &config.glow;
            let id = graph.add_child(
                group,
                SceneNode::new(
                    "glow-ring",
                    NodeKind::Mesh {
                        geometry: Geometry::full_ring(
                            size * settings.inner,
                            size * settings.outer,
                            settings.segments,
                        ),
                        material: Material::additive(
                            Shading::Basic {
                                color: settings.color,
                            },
                            settings.opacity,
                        ),
                    },
                )
                .with_transform(Transform::rotated(tilt)),
            );
            spins.push(Spin::about_z(id, settings.spin));
            id
        });

        let ring_settings = &config.lensing.einstein_ring;
        let einstein_ring = ring_settings.enabled.then(|| {
            let radius = size * ring_settings.radius;
            let thickness = size * ring_settings.thickness;
            let id = graph.add_child(
                group,
                SceneNode::new(
                    "einstein-ring",
                    NodeKind::Billboard {
                        geometry: Geometry::full_ring(
                            radius - thickness * 0.5,
                            radius + thickness * 0.5,
                            ring_settings.segments,
                        ),
                        material: Material::additive(
                            Shading::Lensing(LensingShading {
                                color: ring_settings.color,
                                radius,
                                thickness,
                                doppler_strength: disk_settings.doppler_strength,
                            }),
                            ring_settings.opacity,
                        ),
                    },
                ),
            );
            spins.push(Spin::about_z(id, ring_settings.spin));
            id
        });

        let arc_settings = &config.lensing.arcs;
        let arcs = (0..arc_settings.count)
            .map(|index| {
                let radius = size * arc_settings.radius;
                let thickness = size * arc_settings.thickness;
                let span = arc_settings.span_degrees.to_radians();
                let heading = TAU * index as f32 / arc_settings.count as f32;
                let id = graph.add_child(
                    group,
                    SceneNode::new(
                        format!("lensing-arc-{index}"),
                        NodeKind::Mesh {
                            geometry: Geometry::Ring {
                                inner: radius - thickness * 0.5,
                                outer: radius + thickness * 0.5,
                                theta_segments: arc_settings.segments,
                                theta_start: -span * 0.5,
                                theta_length: span,
                            },
                            material: Material::additive(
                                Shading::Lensing(LensingShading {
                                    color: arc_settings.color,
                                    radius,
                                    thickness,
                                    doppler_strength: 0.0,
                                }),
                                arc_settings.opacity,
                            ),
                        },
                    )
                    .with_transform(Transform::rotated(Vec3::new(
                        arc_settings.tilt_degrees.to_radians(),
                        heading,
                        0.0,
                    ))),
                );
                spins.push(Spin::about_z(id, arc_settings.spin));
                id
            })
            .collect();

        let shell_settings = &config.shells;
        let shells = (0..shell_settings.count)
            .map(|index| {
                let radius = size * (shell_settings.base_radius + shell_settings.step * index as f32);
                graph.add_child(
                    group,
                    SceneNode::new(
                        format!("glow-shell-{index}"),
                        NodeKind::Mesh {
                            geometry: Geometry::Sphere {
                                radius,
                                width_segments: shell_settings.segments,
                                height_segments: (shell_settings.segments / 2).max(2),
                            },
                            material: Material::additive(
                                Shading::Basic {
                                    color: shell_settings.color,
                                },
                                shell_settings.opacity,
                            )
                            .with_side(Side::Back),
                        },
                    ),
                )
            })
            .collect();

        let rig = Self {
            group,
            horizon,
            disk,
            glow,
            einstein_ring,
            arcs,
            shells,
            stars,
            lights,
        };
        (rig, spins)
    }
}

fn add_lights(graph: &mut SceneGraph, config: &SceneConfig) -> Vec<NodeId> {
    let mut lights: Vec<NodeId> = config
        .lights
        .iter()
        .enumerate()
        .map(|(index, light)| {
            graph.add_root(
                SceneNode::new(
                    format!("point-light-{index}"),
                    NodeKind::Light(Light::Point {
                        color: light.color,
                        intensity: light.intensity,
                    }),
                )
                .with_transform(Transform::at(Vec3::from(light.position))),
            )
        })
        .collect();

    lights.push(graph.add_root(SceneNode::new(
        "ambient-light",
        NodeKind::Light(Light::Ambient {
            color: config.ambient_light.color,
            intensity: config.ambient_light.intensity,
        }),
    )));
    lights
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(config: &SceneConfig) -> (SceneGraph, BlackHoleRig, Vec<Spin>) {
        let mut graph = SceneGraph::new();
        let (rig, spins) = BlackHoleRig::build(&mut graph, config, 3);
        (graph, rig, spins)
    }

    #[test]
    fn default_scene_has_every_layer() {
        let (graph, rig, spins) = build(&SceneConfig::default());
        assert!(rig.glow.is_some());
        assert!(rig.einstein_ring.is_some());
        assert_eq!(rig.arcs.len(), 2);
        assert_eq!(rig.shells.len(), 2);
        // two point lights plus the ambient one
        assert_eq!(rig.lights.len(), 3);
        // disk, glow, ring, two arcs
        assert_eq!(spins.len(), 5);
        assert_eq!(graph.find("accretion-disk"), Some(rig.disk));
        assert_eq!(graph.node(rig.group).children().len(), 1 + 1 + 1 + 1 + 2 + 2);
    }

    #[test]
    fn radii_scale_with_size() {
        let (graph, rig, _) = build(&SceneConfig::default());
        match &graph.node(rig.horizon).kind {
            NodeKind::Mesh {
                geometry: Geometry::Sphere { radius, .. },
                material,
            } => {
                assert!((radius - 1.5).abs() < 1e-6);
                assert!((material.opacity - 0.95).abs() < 1e-6);
                assert_eq!(material.blending, Blending::Normal);
            }
            other => panic!("unexpected horizon node {other:?}"),
        }
        match &graph.node(rig.disk).kind {
            NodeKind::Mesh {
                geometry: Geometry::Ring { inner, outer, theta_segments, .. },
                material,
            } => {
                assert!((inner - 1.8).abs() < 1e-6);
                assert!((outer - 5.4).abs() < 1e-5);
                assert_eq!(*theta_segments, 180);
                assert_eq!(material.blending, Blending::Additive);
                assert_eq!(material.side, Side::Double);
            }
            other => panic!("unexpected disk node {other:?}"),
        }
    }

    #[test]
    fn disk_is_tilted_sixty_degrees() {
        let (graph, rig, spins) = build(&SceneConfig::default());
        let rotation = graph.node(rig.disk).transform.rotation;
        assert!((rotation.x - std::f32::consts::FRAC_PI_3).abs() < 1e-6);
        let disk_spin = spins.iter().find(|spin| spin.node == rig.disk).expect("disk spin");
        assert!((disk_spin.rate - 0.06).abs() < 1e-6);
        let glow_spin = spins
            .iter()
            .find(|spin| Some(spin.node) == rig.glow)
            .expect("glow spin");
        assert!(glow_spin.rate < 0.0);
    }

    #[test]
    fn optional_layers_can_be_disabled() {
        let mut config = SceneConfig::default();
        config.glow.enabled = false;
        config.lensing.einstein_ring.enabled = false;
        config.lensing.arcs.count = 0;
        config.shells.count = 0;
        let (_, rig, spins) = build(&config);
        assert!(rig.glow.is_none());
        assert!(rig.einstein_ring.is_none());
        assert!(rig.arcs.is_empty());
        assert!(rig.shells.is_empty());
        assert_eq!(spins.len(), 1);
    }

    #[test]
    fn standard_disk_is_lit_and_opaque() {
        let mut config = SceneConfig::default();
        config.disk.material = DiskMaterial::Standard;
        let (graph, rig, _) = build(&config);
        match &graph.node(rig.disk).kind {
            NodeKind::Mesh { material, .. } => {
                assert!(matches!(material.shading, Shading::Standard { .. }));
                assert!(material.depth_write);
            }
            other => panic!("unexpected disk node {other:?}"),
        }
    }
}
