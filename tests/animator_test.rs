use approx::assert_relative_eq;
use carousel::carousel::{
    animator::{Animator, PHASE_SHIFT, Pose, carousel_angle, horse_offset},
    builder::{BuiltScene, SceneBuilder},
};

#[test]
fn first_frame_pose() {
    let BuiltScene { mut scene, nodes } = SceneBuilder::new().build().unwrap();
    let pose = Animator::new(nodes).apply(&mut scene.graph, 0.0).unwrap();
    assert_eq!(pose.carousel.0, 0.0);
    assert_relative_eq!(pose.horses1, (3.15f32.sin() + 1.0) / 2.0, epsilon = 1e-6);
    assert_relative_eq!(pose.horses1, 0.49580, epsilon = 1e-5);
    assert_relative_eq!(pose.horses2, 0.5);

    let graph = &scene.graph;
    assert_eq!(graph.node(nodes.carousel).unwrap().rotation.y.0, 0.0);
    assert_eq!(graph.node(nodes.horses1).unwrap().position.y, pose.horses1);
    assert_eq!(graph.node(nodes.horses2).unwrap().position.y, pose.horses2);
}

#[test]
fn first_group_leads_by_the_phase_shift() {
    for step in 0..500 {
        let t = step as f32 * 0.05;
        let pose = Pose::at(t);
        assert_relative_eq!(pose.horses1, horse_offset(t + PHASE_SHIFT), epsilon = 1e-6);
        assert_relative_eq!(Pose::at(t + PHASE_SHIFT).horses2, pose.horses1, epsilon = 1e-4);
    }
}

#[test]
fn rotation_never_increases_and_repeats_every_4_pi() {
    let mut previous = carousel_angle(0.0).0;
    for step in 1..1000 {
        let t = step as f32 * 0.1;
        let angle = carousel_angle(t).0;
        assert!(angle <= previous);
        previous = angle;
    }
    let period = 4.0 * std::f32::consts::PI;
    let t = 2.5_f32;
    let wrapped = |a: f32| a.rem_euclid(2.0 * std::f32::consts::PI);
    assert_relative_eq!(
        wrapped(carousel_angle(t).0),
        wrapped(carousel_angle(t + period).0),
        epsilon = 1e-4
    );
}

#[test]
fn bobbing_period_is_two_thirds_pi() {
    let period = 2.0 * std::f32::consts::PI / 3.0;
    for t in [0.0_f32, 0.3, 1.7, 12.0] {
        assert_relative_eq!(horse_offset(t), horse_offset(t + period), epsilon = 1e-4);
    }
}

#[test]
fn animation_touches_only_three_fields() {
    let BuiltScene { mut scene, nodes } = SceneBuilder::new().build().unwrap();
    let before = scene.graph.clone();
    Animator::new(nodes).apply(&mut scene.graph, 7.3).unwrap();

    let animated = [nodes.carousel, nodes.horses1, nodes.horses2];
    for id in scene.graph.descendants(scene.graph.root()) {
        let (old, new) = (before.node(id).unwrap(), scene.graph.node(id).unwrap());
        assert_eq!(old.scale, new.scale);
        assert_eq!(old.rotation.x, new.rotation.x);
        assert_eq!(old.rotation.z, new.rotation.z);
        if !animated.contains(&id) {
            assert_eq!(old.position, new.position);
            assert_eq!(old.rotation, new.rotation);
        }
    }
    let carousel = scene.graph.node(nodes.carousel).unwrap();
    assert_eq!(carousel.position, before.node(nodes.carousel).unwrap().position);
}
