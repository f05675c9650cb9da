//! End-to-end run of the headless vignette: build, animate, resize, stop.

use glam::Vec3;
use vignette::animation::{limb_pose, star_offset, sway_delta};
use vignette::vignette::STAR_COUNT;
use vignette::{StarMotion, Vignette, VignetteConfig, VignetteState};

fn seeded(seed: u64) -> VignetteConfig {
    VignetteConfig {
        seed: Some(seed),
        ..Default::default()
    }
}

#[test]
fn sixty_frames_of_idle_animation() {
    let mut vignette = Vignette::new(&seeded(11)).unwrap();
    let initial: Vec<Vec3> = vignette.rig().stars.iter().map(|s| s.base).collect();

    vignette.start();
    let frames: Vec<f64> = (0..60).map(|i| i as f64 / 60.0).collect();
    for &t in &frames {
        assert!(vignette.tick(t));
    }

    let scene = vignette.scene();
    let rig = vignette.rig();
    let last = *frames.last().unwrap();

    // Limbs hold the pose of the last tick
    let pose = limb_pose(last);
    let angle = |node| scene.transform(node).unwrap().rotation.x;
    assert!((angle(rig.left_arm) - pose.left_arm).abs() < 1e-6);
    assert!((angle(rig.right_arm) - pose.right_arm).abs() < 1e-6);
    assert!((angle(rig.left_leg) - pose.left_leg).abs() < 1e-6);
    assert!((angle(rig.right_leg) - pose.right_leg).abs() < 1e-6);
    assert!(
        (angle(rig.left_arm) + angle(rig.right_arm) - 2.0 * sway_delta(last)).abs() < 1e-5
    );

    // Yaw follows the tick count, not the clock
    let yaw = scene.transform(rig.figure).unwrap().rotation.y;
    assert!((yaw - 0.6).abs() < 1e-4);

    // Stars accumulate every tick's offset
    assert_eq!(rig.stars.len(), STAR_COUNT);
    for (i, star) in rig.stars.iter().enumerate() {
        let expected = frames
            .iter()
            .fold(initial[i], |p, &t| p + star_offset(t, i));
        let actual = scene.transform(star.node).unwrap().position;
        assert!((actual - expected).length() < 1e-3, "star {i}");
    }

    // Every renderable resolves to a registered mesh and material
    for item in scene.draw_list() {
        assert!(scene.mesh(item.renderable.mesh).is_some());
        assert!(scene.material(item.renderable.material).is_some());
        assert!(item.world.is_finite());
    }
}

#[test]
fn lifecycle_round_trip() {
    let mut vignette = Vignette::new(&VignetteConfig {
        star_motion: StarMotion::Anchored,
        ..seeded(2)
    })
    .unwrap();

    assert!(!vignette.tick(0.0));
    vignette.start();
    vignette.resize(1920, 1080);
    assert!(vignette.tick(0.25));
    vignette.resize(0, 0);
    assert!((vignette.camera().projection.aspect - 1920.0 / 1080.0).abs() < 1e-6);

    vignette.stop();
    assert_eq!(vignette.state(), VignetteState::Stopped);
    assert!(!vignette.update());
    assert_eq!(vignette.animator().ticks(), 1);

    let star = vignette.rig().stars[3];
    let position = vignette.scene().transform(star.node).unwrap().position;
    assert!((position - (star.base + star_offset(0.25, 3))).length() < 1e-5);
}

#[test]
fn seeds_reproduce_the_sky() {
    let a = Vignette::new(&seeded(99)).unwrap();
    let b = Vignette::new(&seeded(99)).unwrap();
    assert_eq!(a.rig().stars, b.rig().stars);

    let scale = |v: &Vignette, i: usize| v.scene().transform(v.rig().stars[i].node).unwrap().scale;
    for i in 0..STAR_COUNT {
        assert_eq!(scale(&a, i), scale(&b, i));
    }
}
