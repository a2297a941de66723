use super::fixtures::{plain_config, reference_scene, water_tile, Harness, WINDOW};
use crate::config::EngineConfig;
use crate::foundation::math::{Vec3, Vec4};
use crate::render::api::GraphicsDevice;
use crate::render::RenderError;
use crate::scene::{Camera, FramePhase};

#[test]
fn test_water_passes_mirror_the_camera() {
    let mut harness = Harness::new();
    let mut renderer = harness.renderer(&plain_config());
    let mut scene = reference_scene(&mut harness);
    scene.water_tiles.push(water_tile(2.0));
    let camera = Camera::new(Vec3::new(3.0, 10.0, 4.0)).with_orientation(20.0, 35.0);
    let before = camera;

    renderer.begin_frame(1.0 / 60.0).unwrap();
    let reports = renderer
        .prepare_water(&mut harness.device, &scene, &camera)
        .unwrap()
        .unwrap();
    renderer.end_frame();

    assert_eq!(camera, before);
    assert_eq!(reports.reflection.camera_position, Vec3::new(3.0, -6.0, 4.0));
    assert_eq!(reports.reflection.camera_pitch, -20.0);
    assert_eq!(reports.reflection.clip_plane, Some(Vec4::new(0.0, 1.0, 0.0, -2.0)));
    assert_eq!(reports.refraction.camera_position, camera.position);
    assert_eq!(reports.refraction.camera_pitch, 20.0);
    assert_eq!(reports.refraction.clip_plane, Some(Vec4::new(0.0, -1.0, 0.0, 2.0)));
    assert_eq!(
        renderer.executed_phases(),
        [FramePhase::WaterReflection, FramePhase::WaterRefraction]
    );
    assert_eq!(harness.device.bound_framebuffer(), None);
    assert_eq!(harness.device.viewport(), WINDOW);
}

#[test]
fn test_no_water_skips_the_passes() {
    let mut harness = Harness::new();
    let mut renderer = harness.renderer(&plain_config());
    let scene = reference_scene(&mut harness);

    harness.device.clear_commands();
    renderer.begin_frame(1.0 / 60.0).unwrap();
    let reports = renderer
        .prepare_water(&mut harness.device, &scene, &Camera::default())
        .unwrap();
    renderer.end_frame();

    assert!(reports.is_none());
    assert!(renderer.executed_phases().is_empty());
    assert_eq!(harness.device.draw_calls(), 0);
}

#[test]
fn test_clip_bias_shifts_both_planes() {
    let mut harness = Harness::new();
    let mut config = plain_config();
    config.water.clip_bias = 0.5;
    let mut renderer = harness.renderer(&config);
    let mut scene = reference_scene(&mut harness);
    scene.water_tiles.push(water_tile(0.0));

    let reports = renderer
        .prepare_water(&mut harness.device, &scene, &Camera::new(Vec3::new(0.0, 4.0, 0.0)))
        .unwrap()
        .unwrap();

    assert_eq!(reports.reflection.clip_plane, Some(Vec4::new(0.0, 1.0, 0.0, 0.5)));
    assert_eq!(reports.refraction.clip_plane, Some(Vec4::new(0.0, -1.0, 0.0, 0.5)));
}

#[test]
fn test_standalone_passes_leave_frames_usable() {
    let mut harness = Harness::new();
    let mut renderer = harness.renderer(&EngineConfig::default().with_skybox(false));
    let mut scene = reference_scene(&mut harness);
    scene.water_tiles.push(water_tile(-1.0));
    let camera = Camera::default();

    for _ in 0..2 {
        assert!(renderer.prepare_water(&mut harness.device, &scene, &camera).unwrap().is_some());
    }
    renderer
        .render_shadow_map(&mut harness.device, &scene, Vec3::new(0.0, 0.0, -20.0), &camera)
        .unwrap();
    assert_eq!(renderer.phase(), FramePhase::Idle);
    assert!(renderer.executed_phases().is_empty());
    assert!(matches!(
        renderer.enter_phase(FramePhase::MainPass),
        Err(RenderError::FrameNotStarted(FramePhase::MainPass))
    ));

    renderer.begin_frame(1.0 / 60.0).unwrap();
    renderer
        .render_shadow_map(&mut harness.device, &scene, Vec3::new(0.0, 0.0, -20.0), &camera)
        .unwrap();
    renderer.prepare_water(&mut harness.device, &scene, &camera).unwrap();
    renderer.enter_phase(FramePhase::MainPass).unwrap();
    renderer.end_frame();
    assert_eq!(
        renderer.executed_phases(),
        [
            FramePhase::ShadowPass,
            FramePhase::WaterReflection,
            FramePhase::WaterRefraction,
            FramePhase::MainPass
        ]
    );
}

#[test]
fn test_shadow_pass_after_water_is_rejected() {
    let mut harness = Harness::new();
    let mut renderer = harness.renderer(&EngineConfig::default().with_skybox(false));
    let mut scene = reference_scene(&mut harness);
    scene.water_tiles.push(water_tile(-1.0));
    let camera = Camera::default();

    renderer.begin_frame(1.0 / 60.0).unwrap();
    renderer.prepare_water(&mut harness.device, &scene, &camera).unwrap();
    let result = renderer.render_shadow_map(&mut harness.device, &scene, Vec3::new(0.0, 0.0, -20.0), &camera);
    renderer.end_frame();

    assert!(matches!(
        result,
        Err(RenderError::PassOrder {
            from: FramePhase::WaterRefraction,
            to: FramePhase::ShadowPass
        })
    ));
    assert_eq!(renderer.phase(), FramePhase::Idle);
}

#[test]
fn test_shadow_map_space_is_deterministic() {
    let mut harness = Harness::new();
    let mut renderer = harness.renderer(&EngineConfig::default().with_skybox(false));
    let scene = reference_scene(&mut harness);
    let camera = Camera::new(Vec3::new(0.0, 3.0, 0.0)).with_orientation(10.0, 15.0);
    let focal_point = Vec3::new(0.0, 0.0, -25.0);

    let mut matrices = Vec::new();
    for _ in 0..2 {
        renderer.begin_frame(1.0 / 60.0).unwrap();
        let stats = renderer
            .render_shadow_map(&mut harness.device, &scene, focal_point, &camera)
            .unwrap();
        renderer.end_frame();
        assert_eq!(stats.draw_calls, 5);
        assert_eq!(stats.model_binds, 2);
        matrices.push(renderer.to_shadow_map_space());
    }

    assert_eq!(matrices[0], matrices[1]);
    assert!(renderer.shadow_map_texture().is_some());
    assert_eq!(harness.device.bound_framebuffer(), None);
}

#[test]
fn test_shadows_disabled_is_a_no_op() {
    let mut harness = Harness::new();
    let mut renderer = harness.renderer(&plain_config());
    let scene = reference_scene(&mut harness);

    renderer.begin_frame(1.0 / 60.0).unwrap();
    let stats = renderer
        .render_shadow_map(&mut harness.device, &scene, Vec3::zeros(), &Camera::default())
        .unwrap();
    renderer.end_frame();

    assert_eq!(stats.draw_calls, 0);
    assert!(renderer.executed_phases().is_empty());
    assert!(renderer.shadow_map_texture().is_none());
}
