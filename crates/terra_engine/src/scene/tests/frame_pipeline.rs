use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::fixtures::{plain_config, point_light, reference_scene, sun, water_tile, Harness, WINDOW};
use crate::config::EngineConfig;
use crate::foundation::math::{Vec2, Vec3, Vec4};
use crate::render::api::{Capability, GraphicsDevice, UniformValue, VertexArrayId};
use crate::render::backends::DeviceCommand;
use crate::render::systems::GuiTexture;
use crate::render::{HeadlessSurface, Model, ModelId, RenderError};
use crate::scene::{
    Camera, FramePhase, Frustum, Material, RenderableObject, Scene, SceneLights, SceneRenderer, TexturedModel,
    VisibilityQuery,
};

#[test]
fn test_reference_scene_batches_by_model() {
    let mut harness = Harness::new();
    let mut renderer = harness.renderer(&plain_config());
    let scene = reference_scene(&mut harness);

    harness.device.clear_commands();
    let report = renderer
        .render_scene(&mut harness.device, &scene, &Camera::default(), None)
        .unwrap();

    assert_eq!(report.visible_objects, 5);
    assert_eq!(report.batch_sizes, vec![3, 2]);
    assert_eq!(report.terrain_tiles, 1);
    assert_eq!(report.active_lights, 2);
    assert_eq!(report.entities.model_binds, 2);
    assert_eq!(report.entities.draw_calls, 5);
    assert_eq!(report.terrain.draw_calls, 1);
    assert_eq!(report.skybox.draw_calls, 0);
    assert_eq!(report.draw_calls(), harness.device.draw_calls());
    assert_eq!(
        harness.device.count(|c| matches!(c, DeviceCommand::BindVertexArray(Some(_)))),
        3
    );
}

#[test]
fn test_materials_share_their_model_batch() {
    let mut harness = Harness::new();
    let mut scene = Scene::new(SceneLights::new(sun()));
    let materials = [
        harness.material(),
        Material::new(harness.texture).with_transparency().shared(),
        harness.material(),
    ];
    for (i, material) in materials.into_iter().enumerate() {
        let position = Vec3::new(i as f32 * 3.0 - 3.0, 0.0, -20.0);
        scene.add_object(RenderableObject::new(
            TexturedModel::new(harness.first_model, material),
            position,
        ));
    }

    let mut renderer = harness.renderer(&plain_config());
    harness.device.clear_commands();
    let report = renderer
        .render_scene(&mut harness.device, &scene, &Camera::default(), None)
        .unwrap();

    assert_eq!(report.batch_sizes, vec![3]);
    assert_eq!(report.entities.model_binds, 1);
    assert_eq!(report.entities.draw_calls, 3);
    assert_eq!(
        harness.device.count(|c| matches!(c, DeviceCommand::BindVertexArray(Some(_)))),
        1
    );
    assert_eq!(harness.count(&DeviceCommand::BindTexture(0, Some(harness.texture))), 3);
    assert_eq!(harness.count(&DeviceCommand::Disable(Capability::CullFace)), 1);
    assert!(harness.device.is_enabled(Capability::CullFace));

    let mut shadows = harness.renderer(&EngineConfig::default().with_skybox(false));
    let stats = shadows
        .render_shadow_map(&mut harness.device, &scene, Vec3::new(0.0, 0.0, -20.0), &Camera::default())
        .unwrap();
    assert_eq!(stats.model_binds, 1);
    assert_eq!(stats.draw_calls, 3);
}

#[test]
fn test_clip_plane_filters_objects() {
    let mut harness = Harness::new();
    let mut renderer = harness.renderer(&plain_config());
    let mut scene = Scene::new(SceneLights::new(sun()));
    let model = TexturedModel::new(harness.first_model, harness.material());
    scene.add_object(RenderableObject::new(model, Vec3::new(0.0, -5.0, -10.0)));
    let camera = Camera::default();

    harness.device.clear_commands();
    let above = renderer
        .render_scene(&mut harness.device, &scene, &camera, Some(Vec4::new(0.0, 1.0, 0.0, 0.0)))
        .unwrap();
    assert_eq!(above.visible_objects, 0);
    assert_eq!(harness.count(&DeviceCommand::Enable(Capability::ClipDistance0)), 1);
    assert_eq!(harness.count(&DeviceCommand::Disable(Capability::ClipDistance0)), 1);
    assert!(!harness.device.is_enabled(Capability::ClipDistance0));

    let below = renderer
        .render_scene(&mut harness.device, &scene, &camera, Some(Vec4::new(0.0, -1.0, 0.0, 0.0)))
        .unwrap();
    assert_eq!(below.visible_objects, 1);

    harness.device.clear_commands();
    let unclipped = renderer.render_scene(&mut harness.device, &scene, &camera, None).unwrap();
    assert_eq!(unclipped.visible_objects, 1);
    assert_eq!(harness.count(&DeviceCommand::Enable(Capability::ClipDistance0)), 0);
}

#[test]
fn test_fewer_lights_pad_remaining_slots() {
    let mut harness = Harness::new();
    let mut renderer = harness.renderer(&plain_config());
    let mut scene = reference_scene(&mut harness);
    let camera = Camera::default();

    scene.lights.push(point_light(-2.0)).unwrap();
    scene.lights.push(point_light(2.0)).unwrap();
    renderer.render_scene(&mut harness.device, &scene, &camera, None).unwrap();
    let entity = harness.device.program_named("entity").unwrap();
    assert_eq!(harness.device.uniform_value(entity, "activeLights"), Some(UniformValue::Int(4)));

    scene.lights.clear_local();
    scene.lights.push(point_light(-5.0)).unwrap();
    scene.lights.push(point_light(5.0)).unwrap();
    let report = renderer.render_scene(&mut harness.device, &scene, &camera, None).unwrap();

    assert_eq!(report.active_lights, 2);
    assert_eq!(harness.device.uniform_value(entity, "activeLights"), Some(UniformValue::Int(2)));
    for slot in 2..4 {
        assert_eq!(
            harness.device.uniform_value(entity, &format!("lightColour[{slot}]")),
            Some(UniformValue::Vec3(Vec3::zeros()))
        );
    }
}

#[test]
fn test_batches_match_visible_keys() {
    let mut harness = Harness::new();
    let mut renderer = harness.renderer(&plain_config());
    let materials = [harness.material(), harness.material()];
    let models = [harness.first_model, harness.second_model];
    let mut rng = StdRng::seed_from_u64(0x7e11a);

    for _ in 0..8 {
        let mut scene = Scene::new(SceneLights::new(sun()));
        for _ in 0..rng.gen_range(0..40) {
            let model = TexturedModel::new(
                models[rng.gen_range(0..2)],
                materials[rng.gen_range(0..2)].clone(),
            );
            let position = Vec3::new(
                rng.gen_range(-80.0..80.0),
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-250.0..50.0),
            );
            let mut object = RenderableObject::new(model, position);
            object.renderable = rng.gen_bool(0.9);
            scene.add_object(object);
        }
        let camera = Camera::new(Vec3::new(0.0, 2.0, 0.0)).with_orientation(0.0, rng.gen_range(-30.0..30.0));

        let report = renderer.render_scene(&mut harness.device, &scene, &camera, None).unwrap();

        let frustum = Frustum::from_matrix(&(renderer.projection() * camera.view_matrix()));
        let query = VisibilityQuery {
            camera_position: camera.position,
            frustum: Some(&frustum),
            test_radius: renderer.config().render.frustum_test_radius,
            clip_plane: None,
        };
        let mut keys = Vec::new();
        let mut visible = 0;
        for object in scene.objects.iter().filter(|o| query.is_visible(o)) {
            visible += 1;
            if !keys.contains(&object.batch_key()) {
                keys.push(object.batch_key());
            }
        }

        assert_eq!(report.visible_objects, visible);
        assert_eq!(report.batch_sizes.iter().sum::<usize>(), visible);
        assert_eq!(report.batch_sizes.len(), keys.len());
        assert!(report.batch_sizes.iter().all(|size| *size > 0));
        assert_eq!(report.entities.model_binds, keys.len());
        assert_eq!(report.entities.draw_calls, visible);
    }
}

#[test]
fn test_framebuffer_binds_pair_up() {
    let mut harness = Harness::new();
    let config = EngineConfig::default().with_skybox(false).with_post_processing(true);
    let mut manager = harness.manager(&config);
    let mut scene = reference_scene(&mut harness);
    scene.water_tiles.push(water_tile(-1.0));
    let window = HeadlessSurface::new(WINDOW.width, WINDOW.height);

    harness.device.clear_commands();
    let report = manager
        .render_frame(&mut harness.device, &window, &scene, &Camera::new(Vec3::new(0.0, 5.0, 0.0)))
        .unwrap();

    assert_eq!(
        report.phases,
        vec![
            FramePhase::ShadowPass,
            FramePhase::WaterReflection,
            FramePhase::WaterRefraction,
            FramePhase::MainPass,
            FramePhase::PostProcess,
        ]
    );
    let binds: Vec<bool> = harness
        .device
        .commands()
        .iter()
        .filter_map(|c| match c {
            DeviceCommand::BindFramebuffer(target) => Some(target.is_some()),
            _ => None,
        })
        .collect();
    assert_eq!(binds.len(), 8);
    for pair in binds.chunks(2) {
        assert_eq!(pair, [true, false]);
    }
    assert_eq!(harness.device.bound_framebuffer(), None);
    assert_eq!(harness.device.viewport(), WINDOW);
}

#[test]
fn test_frame_restores_gl_state() {
    let mut harness = Harness::new();
    let config = EngineConfig::default().with_skybox(false).with_post_processing(true);
    let mut manager = harness.manager(&config);
    let mut scene = reference_scene(&mut harness);
    let leaves = TexturedModel::new(
        harness.first_model,
        Material::new(harness.texture).with_transparency().shared(),
    );
    scene.add_object(RenderableObject::new(leaves, Vec3::new(2.0, 0.0, -12.0)));
    scene.water_tiles.push(water_tile(-1.0));
    scene
        .guis
        .push(GuiTexture::new(harness.texture, Vec2::new(-0.7, 0.7), Vec2::new(0.2, 0.2)));
    let window = HeadlessSurface::new(WINDOW.width, WINDOW.height);

    harness.device.clear_commands();
    let report = manager
        .render_frame(&mut harness.device, &window, &scene, &Camera::new(Vec3::new(0.0, 5.0, 0.0)))
        .unwrap();

    assert_eq!(report.phases.last(), Some(&FramePhase::GuiOverlay));
    assert_eq!(report.gui.draw_calls, 1);
    assert_eq!(report.water.draw_calls, 1);
    assert!(harness.count(&DeviceCommand::Disable(Capability::CullFace)) >= 1);
    assert!(harness.device.is_enabled(Capability::CullFace));
    assert!(harness.device.is_enabled(Capability::DepthTest));
    assert!(!harness.device.is_enabled(Capability::Blend));
    assert!(!harness.device.is_enabled(Capability::ClipDistance0));
    assert_eq!(harness.device.active_program(), None);
    assert_eq!(harness.device.bound_framebuffer(), None);
    assert_eq!(manager.renderer().phase(), FramePhase::Idle);
}

#[test]
fn test_program_nesting_is_an_error() {
    let mut harness = Harness::new();
    let mut renderer = harness.renderer(&plain_config());
    let scene = reference_scene(&mut harness);

    let terrain = harness.device.program_named("terrain").unwrap();
    harness.device.use_program(Some(terrain));
    let result = renderer.render_scene(&mut harness.device, &scene, &Camera::default(), None);
    assert!(matches!(result, Err(RenderError::ProgramAlreadyActive { .. })));
    harness.device.use_program(None);
}

#[test]
fn test_invalid_model_is_reported() {
    let mut harness = Harness::new();
    let mut renderer = harness.renderer(&plain_config());
    let mut scene = Scene::new(SceneLights::new(sun()));
    let broken = Model::new(ModelId(99), VertexArrayId(0), 0, true);
    scene.add_object(RenderableObject::new(
        TexturedModel::new(broken, harness.material()),
        Vec3::new(0.0, 0.0, -10.0),
    ));

    let result = renderer.render_scene(&mut harness.device, &scene, &Camera::default(), None);
    assert!(matches!(result, Err(RenderError::InvalidModel(_))));
    assert_eq!(harness.device.active_program(), None);
    assert!(!harness.device.is_enabled(Capability::ClipDistance0));
}

fn last_vertex_array(harness: &Harness) -> Option<Option<VertexArrayId>> {
    harness.device.commands().iter().rev().find_map(|c| match c {
        DeviceCommand::BindVertexArray(vao) => Some(*vao),
        _ => None,
    })
}

#[test]
fn test_invalid_model_after_a_valid_batch_unbinds() {
    let mut harness = Harness::new();
    let mut renderer = harness.renderer(&plain_config());
    let mut scene = Scene::new(SceneLights::new(sun()));
    scene.add_object(RenderableObject::new(
        TexturedModel::new(harness.first_model, harness.material()),
        Vec3::new(0.0, 0.0, -10.0),
    ));
    let broken = Model::new(ModelId(99), VertexArrayId(0), 0, true);
    scene.add_object(RenderableObject::new(
        TexturedModel::new(broken, harness.material()),
        Vec3::new(0.0, 0.0, -12.0),
    ));

    harness.device.clear_commands();
    let result = renderer.render_scene(&mut harness.device, &scene, &Camera::default(), None);

    assert!(matches!(result, Err(RenderError::InvalidModel(_))));
    assert_eq!(harness.device.draw_calls(), 1);
    assert_eq!(last_vertex_array(&harness), Some(None));
    assert_eq!(harness.device.active_program(), None);
}

#[test]
fn test_invalid_terrain_unbinds() {
    let mut harness = Harness::new();
    let mut renderer = harness.renderer(&plain_config());
    let mut scene = Scene::new(SceneLights::new(sun()));
    let terrain = harness.terrain();
    let mut broken = terrain.clone();
    broken.model = Model::new(ModelId(98), VertexArrayId(0), 0, true);
    scene.terrains.push(terrain);
    scene.terrains.push(broken);

    harness.device.clear_commands();
    let result = renderer.render_scene(&mut harness.device, &scene, &Camera::default(), None);

    assert!(matches!(result, Err(RenderError::InvalidModel(_))));
    assert_eq!(harness.device.draw_calls(), 1);
    assert_eq!(last_vertex_array(&harness), Some(None));
    assert_eq!(harness.device.active_program(), None);
}

#[test]
fn test_incomplete_framebuffer_aborts_construction() {
    let mut harness = Harness::new();
    harness.device.fail_next_framebuffer("GL_FRAMEBUFFER_INCOMPLETE_ATTACHMENT");
    let result = SceneRenderer::new(
        &mut harness.device,
        &mut harness.loader,
        &plain_config(),
        WINDOW,
        Default::default(),
    );
    assert!(matches!(result, Err(RenderError::IncompleteFramebuffer { .. })));
}

#[test]
fn test_dispose_releases_everything() {
    let mut harness = Harness::new();
    let config = EngineConfig::default().with_post_processing(true);
    let mut manager = harness.manager(&config);
    let mut scene = reference_scene(&mut harness);
    scene.water_tiles.push(water_tile(-1.0));
    let window = HeadlessSurface::new(WINDOW.width, WINDOW.height);
    manager
        .render_frame(&mut harness.device, &window, &scene, &Camera::default())
        .unwrap();

    manager.dispose(&mut harness.device);
    manager.dispose(&mut harness.device);
    harness.loader.dispose_all(&mut harness.device);
    assert_eq!(harness.device.live_objects(), 0);
}
