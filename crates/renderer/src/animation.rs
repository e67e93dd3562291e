use std::f32::consts::TAU;
use std::time::Duration;

use glam::Vec3;
use sceneconfig::DriftSettings;

use crate::scene::{NodeId, SceneGraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Constant angular velocity applied to one Euler component of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spin {
    pub node: NodeId,
    pub axis: Axis,
    /// Radians per second.
    pub rate: f32,
}

impl Spin {
    pub fn about_z(node: NodeId, rate: f32) -> Self {
        Self {
            node,
            axis: Axis::Z,
            rate,
        }
    }
}

/// Per-frame updater: shader time, node spins and the camera drift.
///
/// Every quantity is linear in the elapsed time, so stepping twice by `dt`
/// lands where stepping once by `2 * dt` does.
#[derive(Debug, Clone)]
pub struct Animator {
    time: f32,
    time_scale: f32,
    spins: Vec<Spin>,
    drift: Option<DriftSettings>,
}

impl Animator {
    pub fn new(time_scale: f32, spins: Vec<Spin>, drift: &DriftSettings) -> Self {
        Self {
            time: 0.0,
            time_scale: time_scale.max(0.0),
            spins,
            drift: drift.enabled.then(|| drift.clone()),
        }
    }

    /// Shader time; never decreases.
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn spins(&self) -> &[Spin] {
        &self.spins
    }

    pub fn set_drift(&mut self, drift: Option<DriftSettings>) {
        self.drift = drift;
    }

    pub fn advance(&mut self, graph: &mut SceneGraph, dt: Duration) {
        let seconds = dt.as_secs_f32();
        self.time += self.time_scale * seconds;

        for spin in &self.spins {
            let rotation = &mut graph.node_mut(spin.node).transform.rotation;
            let angle = match spin.axis {
                Axis::X => &mut rotation.x,
                Axis::Y => &mut rotation.y,
                Axis::Z => &mut rotation.z,
            };
            *angle = (*angle + spin.rate * seconds).rem_euclid(TAU);
        }
    }

    /// Offset added to the orbit eye.
    pub fn drift_offset(&self) -> Vec3 {
        match &self.drift {
            Some(drift) => Vec3::new(
                (self.time * drift.frequency[0]).sin() * drift.amplitude[0],
                (self.time * drift.frequency[1]).sin() * drift.amplitude[1],
                0.0,
            ),
            None => Vec3::ZERO,
        }
    }
}
