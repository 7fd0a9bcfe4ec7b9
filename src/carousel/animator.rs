//! Per-frame motion of the carousel.

use cgmath::Rad;
use instant::Instant;

use crate::{
    carousel::builder::CarouselNodes,
    data_structures::scene_graph::{Node, NodeId, SceneGraph},
    error::SceneError,
};

/// Time shift of the first horse group against the second, in seconds.
pub const PHASE_SHIFT: f32 = 1.05;
/// Angular frequency of the horses' bobbing.
pub const BOB_FREQUENCY: f32 = 3.0;

/// Monotonic seconds since the carousel started turning.
///
/// Reads 0 until [`Clock::start`]; starting again keeps the first instant.
#[derive(Clone, Copy, Debug, Default)]
pub struct Clock {
    start: Option<Instant>,
}

impl Clock {
    pub fn start(&mut self) {
        self.start.get_or_insert_with(Instant::now);
    }

    pub fn elapsed(&self) -> f32 {
        self.start
            .map_or(0.0, |start| start.elapsed().as_secs_f32())
    }
}

/// Rotation of the carousel about Y: half a radian per second, clockwise
/// seen from above.
pub fn carousel_angle(t: f32) -> Rad<f32> {
    Rad(-t / 2.0)
}

/// Vertical offset of a horse group, in `[0, 1]`.
pub fn horse_offset(t: f32) -> f32 {
    ((t * BOB_FREQUENCY).sin() + 1.0) / 2.0
}

/// The three animated values at time `t`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub carousel: Rad<f32>,
    pub horses1: f32,
    pub horses2: f32,
}

impl Pose {
    pub fn at(t: f32) -> Self {
        Self {
            carousel: carousel_angle(t),
            horses1: horse_offset(t + PHASE_SHIFT),
            horses2: horse_offset(t),
        }
    }
}

/// Writes the carousel rotation and both horse offsets; leaves every other
/// node field alone.
#[derive(Clone, Copy, Debug)]
pub struct Animator {
    nodes: CarouselNodes,
}

impl Animator {
    pub fn new(nodes: CarouselNodes) -> Self {
        Self { nodes }
    }

    pub fn apply(&self, graph: &mut SceneGraph, t: f32) -> Result<Pose, SceneError> {
        let pose = Pose::at(t);
        node(graph, self.nodes.carousel)?.rotation.y = pose.carousel;
        node(graph, self.nodes.horses1)?.position.y = pose.horses1;
        node(graph, self.nodes.horses2)?.position.y = pose.horses2;
        Ok(pose)
    }
}

fn node(graph: &mut SceneGraph, id: NodeId) -> Result<&mut Node, SceneError> {
    graph.node_mut(id).ok_or(SceneError::UnknownNode(id.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn pose_at_start() {
        let pose = Pose::at(0.0);
        assert_eq!(pose.carousel, Rad(0.0));
        assert_relative_eq!(pose.horses1, 0.4957963, epsilon = 1e-5);
        assert_relative_eq!(pose.horses2, 0.5);
    }

    #[test]
    fn clock_stands_still_until_started() {
        let mut clock = Clock::default();
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert_eq!(clock.elapsed(), 0.0);

        clock.start();
        std::thread::sleep(std::time::Duration::from_millis(20));
        let first = clock.elapsed();
        assert!(first >= 0.019);
        clock.start();
        assert!(clock.elapsed() >= first);
    }

    #[test]
    fn offsets_stay_in_unit_range() {
        for step in 0..2000 {
            let t = step as f32 * 0.037;
            let pose = Pose::at(t);
            assert!((0.0..=1.0).contains(&pose.horses1));
            assert!((0.0..=1.0).contains(&pose.horses2));
        }
    }
}
