//! # Terrain Scene
//!
//! The demo scene: a heightmap terrain with trees, a crate that follows mouse
//! picks, an imported house, a lamp marker and a skybox. Each frame is drawn
//! once per render context.
//!
//! ## Shaders
//!
//! - **Lighting**: Phong with a directional light and a camera spot light,
//!   used for trees, terrain and the crate
//! - **Model**: textured meshes of the imported house under the directional light
//! - **Lamp**: flat white, for the light marker
//! - **Skybox**: cubemap sampling with a translation-free view

use crate::application::{AppError, Application};
use crate::assets::ImageData;
use crate::core::config::AssetConfig;
use crate::engine::Engine;
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};
use crate::input::{KeyCode, MouseButton};
use crate::render::primitives::geometry::{
    create_cube, create_cylinder, create_ground, create_lamp_cube, create_sphere, terrain_height,
};
use crate::render::primitives::mesh::{MODEL_UNIFORM, SHININESS_UNIFORM};
use crate::render::skybox::SKYBOX_SAMPLER;
use crate::render::{
    Camera, DirectionalLight, FlatMesh, GlContext, Mesh, Model, ShaderSources, Skybox, SpotLight,
    TextureType,
};

const PROJECTION_UNIFORM: &str = "projection";
const VIEW_UNIFORM: &str = "view";
const VIEW_POSITION_UNIFORM: &str = "viewPos";
const DIRECTIONAL_LIGHT: &str = "dirLight";
const SPOT_LIGHT: &str = "spotLight";

/// Trunk cylinder: faces, height, radius
const TRUNK: (u32, f32, f32) = (32, 4.0, 1.15);
/// Crown sphere: sides, radius
const CROWN: (u32, f32) = (32, 1.0);

/// Tree sites on the terrain as `(x, z)`
const TREE_SITES: [(f32, f32); 10] = [
    (0.0, 0.0),
    (20.0, -15.0),
    (-15.5, -2.5),
    (-20.8, -12.3),
    (17.4, -30.5),
    (-1.7, -7.5),
    (11.3, -20.5),
    (15.5, -2.5),
    (13.5, -10.5),
    (-8.3, -1.5),
];

const HOUSE_SITE: (f32, f32) = (-6.0, -18.0);
const LAMP_SCALE: f32 = 0.2;

/// Skybox faces in +X, -X, +Y, -Y, +Z, -Z order, under the texture directory
const SKYBOX_FACES: [&str; 6] = [
    "skybox/right.jpg",
    "skybox/left.jpg",
    "skybox/top.jpg",
    "skybox/bottom.jpg",
    "skybox/front.jpg",
    "skybox/back.jpg",
];

type CameraMove = fn(&mut Camera, f32);

const CAMERA_KEYS: [(KeyCode, CameraMove); 6] = [
    (KeyCode::W, Camera::move_forward),
    (KeyCode::S, Camera::move_backward),
    (KeyCode::A, Camera::move_left),
    (KeyCode::D, Camera::move_right),
    (KeyCode::Q, Camera::move_forward_z),
    (KeyCode::E, Camera::move_backward_z),
];

/// Program indices in the GL context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderSet {
    /// Phong lighting program
    pub lighting: usize,
    /// Imported model program
    pub model: usize,
    /// Lamp marker program
    pub lamp: usize,
    /// Skybox program
    pub skybox: usize,
}

impl ShaderSet {
    /// Compile the four scene programs from the shader directory
    pub fn load(gl: &mut GlContext, assets: &AssetConfig) -> Result<Self, AppError> {
        let mut add = |vertex: &str, fragment: &str| -> Result<usize, AppError> {
            let sources = ShaderSources::from_files(assets.shader_path(vertex), assets.shader_path(fragment))?;
            Ok(gl.add_shader_program(&sources)?)
        };

        Ok(Self {
            lighting: add("phong-diffuse-specular.vert", "scenelighting.frag")?,
            model: add("model.vert", "model.frag")?,
            lamp: add("transform3d-simplified.vert", "white.frag")?,
            skybox: add("skybox.vert", "skybox.frag")?,
        })
    }

    /// Register the uniforms every program is drawn with
    pub fn register_uniforms(&self, gl: &mut GlContext) -> Result<(), AppError> {
        let transforms = [MODEL_UNIFORM, VIEW_UNIFORM, PROJECTION_UNIFORM];
        let material = [
            "material.diffuse",
            "material.specular",
            SHININESS_UNIFORM,
        ];

        gl.set_current_shader(self.lighting)?;
        for name in transforms.iter().chain(&material).chain(&[VIEW_POSITION_UNIFORM]) {
            gl.add_uniform(name)?;
        }
        DirectionalLight::register_uniforms(gl, DIRECTIONAL_LIGHT)?;
        SpotLight::register_uniforms(gl, SPOT_LIGHT)?;

        gl.set_current_shader(self.model)?;
        for name in transforms.iter().chain(&material).chain(&[VIEW_POSITION_UNIFORM]) {
            gl.add_uniform(name)?;
        }
        DirectionalLight::register_uniforms(gl, DIRECTIONAL_LIGHT)?;

        gl.set_current_shader(self.lamp)?;
        for name in transforms {
            gl.add_uniform(name)?;
        }

        gl.set_current_shader(self.skybox)?;
        for name in [VIEW_UNIFORM, PROJECTION_UNIFORM, SKYBOX_SAMPLER] {
            gl.add_uniform(name)?;
        }
        Ok(())
    }
}

/// GPU resources of the scene, dropped in [`Application::cleanup`]
pub struct SceneResources {
    /// Textured crate placed at the last pick
    pub crate_cube: FlatMesh,
    /// Light marker
    pub lamp: FlatMesh,
    /// Heightmap terrain
    pub ground: Mesh,
    /// Tree trunk
    pub trunk: Mesh,
    /// Tree crown
    pub crown: Mesh,
    /// Imported house
    pub house: Model,
    /// Sky
    pub skybox: Skybox,
}

/// Trunk and crown positions for the sites that lie on the terrain
///
/// Sites off the heightmap are skipped.
pub fn tree_layout(heightmap: &ImageData, sites: &[(f32, f32)]) -> (Vec<Vec3>, Vec<Vec3>) {
    let (_, trunk_height, _) = TRUNK;
    let (_, crown_radius) = CROWN;

    sites
        .iter()
        .filter_map(|&(x, z)| {
            let Some(ground) = terrain_height(heightmap, x, z) else {
                log::debug!("Tree site ({}, {}) is off the terrain", x, z);
                return None;
            };
            let trunk = Vec3::new(x, ground + trunk_height * 0.5, z);
            let crown = Vec3::new(x, ground + trunk_height + crown_radius * 0.5, z);
            Some((trunk, crown))
        })
        .unzip()
}

/// Cursor position (window coordinates, origin top-left) to framebuffer
/// pixels with the origin at the bottom-left
pub fn cursor_to_framebuffer(cursor: (f64, f64), window_size: (u32, u32), framebuffer_size: (u32, u32)) -> (f32, f32) {
    let scale_x = framebuffer_size.0 as f32 / window_size.0.max(1) as f32;
    let scale_y = framebuffer_size.1 as f32 / window_size.1.max(1) as f32;
    let x = cursor.0 as f32 * scale_x;
    let y = framebuffer_size.1 as f32 - cursor.1 as f32 * scale_y;
    (x, y)
}

/// The terrain demo
pub struct TerrainScene {
    shaders: Option<ShaderSet>,
    resources: Option<SceneResources>,
    directional_light: DirectionalLight,
    spot_light: SpotLight,
    light_position: Vec3,
    picked_position: Vec3,
    house_position: Vec3,
    trunk_positions: Vec<Vec3>,
    crown_positions: Vec<Vec3>,
}

impl Default for TerrainScene {
    fn default() -> Self {
        Self::new()
    }
}

impl TerrainScene {
    /// Create an empty scene; resources load in [`Application::initialize`]
    pub fn new() -> Self {
        Self {
            shaders: None,
            resources: None,
            directional_light: DirectionalLight::default(),
            spot_light: SpotLight::default(),
            light_position: Vec3::new(0.0, 0.0, 5.0),
            picked_position: Vec3::zeros(),
            house_position: Vec3::new(HOUSE_SITE.0, 0.0, HOUSE_SITE.1),
            trunk_positions: Vec::new(),
            crown_positions: Vec::new(),
        }
    }

    /// Place trees and the house on a heightmap
    pub fn seat_on_terrain(&mut self, heightmap: &ImageData) {
        let (trunks, crowns) = tree_layout(heightmap, &TREE_SITES);
        log::info!("Planted {} of {} trees", trunks.len(), TREE_SITES.len());
        self.trunk_positions = trunks;
        self.crown_positions = crowns;

        let (x, z) = HOUSE_SITE;
        self.house_position.y = terrain_height(heightmap, x, z).unwrap_or(0.0);
    }

    /// Where the crate is drawn
    pub fn picked_position(&self) -> Vec3 {
        self.picked_position
    }

    /// Clear and draw every render context, leaving the cursor where it started
    pub fn draw_frame(
        &self,
        gl: &mut GlContext,
        shaders: &ShaderSet,
        resources: &SceneResources,
        clear_color: [f32; 4],
    ) -> Result<(), AppError> {
        gl.clear_color(clear_color);
        gl.clear();

        for _ in 0..gl.render_context_count() {
            self.draw_render_context(gl, shaders, resources)?;
            gl.next_render_context();
        }
        Ok(())
    }

    fn draw_render_context(
        &self,
        gl: &mut GlContext,
        shaders: &ShaderSet,
        resources: &SceneResources,
    ) -> Result<(), AppError> {
        gl.set_viewport()?;
        gl.set_depth_test(true);

        gl.use_shader(shaders.lighting)?;
        gl.set_camera_position(VIEW_POSITION_UNIFORM)?;
        self.directional_light.apply(gl, DIRECTIONAL_LIGHT)?;

        let camera = &gl.current_render_context()?.camera;
        let mut spot_light = self.spot_light.clone();
        spot_light.follow(camera.position, camera.front);
        spot_light.apply(gl, SPOT_LIGHT)?;

        gl.set_view_uniform(VIEW_UNIFORM)?;
        gl.set_projection_uniform(PROJECTION_UNIFORM)?;

        let trunks = resources
            .trunk
            .draw_instanced(gl, self.trunk_positions.len(), &self.trunk_positions)?;
        let crowns = resources
            .crown
            .draw_instanced(gl, self.crown_positions.len(), &self.crown_positions)?;
        log::trace!(
            "Render context {}: {} trunks, {} crowns visible",
            gl.current_render_context_index(),
            trunks,
            crowns
        );

        gl.set_matrix4(MODEL_UNIFORM, &Mat4::identity())?;
        resources.ground.draw(gl)?;

        gl.set_matrix4(MODEL_UNIFORM, &Mat4::translation(&self.picked_position))?;
        resources.crate_cube.draw(gl)?;

        gl.use_shader(shaders.model)?;
        gl.set_camera_position(VIEW_POSITION_UNIFORM)?;
        self.directional_light.apply(gl, DIRECTIONAL_LIGHT)?;
        gl.set_view_uniform(VIEW_UNIFORM)?;
        gl.set_projection_uniform(PROJECTION_UNIFORM)?;
        resources
            .house
            .draw_visible(gl, &Mat4::translation(&self.house_position))?;

        gl.use_shader(shaders.lamp)?;
        let lamp = Mat4::translation(&self.light_position) * Mat4::new_scaling(LAMP_SCALE);
        gl.set_matrix4(MODEL_UNIFORM, &lamp)?;
        gl.set_view_uniform(VIEW_UNIFORM)?;
        gl.set_projection_uniform(PROJECTION_UNIFORM)?;
        resources.lamp.draw(gl)?;

        resources.skybox.draw(gl)?;
        Ok(())
    }

    fn load_resources(&mut self, engine: &mut Engine, shaders: &ShaderSet) -> Result<SceneResources, AppError> {
        let assets = engine.config().assets.clone();
        let device = engine.device();
        let textures = engine.textures_mut();

        let container = textures.load(assets.texture_path("container.png"), TextureType::Diffuse)?;
        let container_specular =
            textures.load(assets.texture_path("container_specular.png"), TextureType::Specular)?;
        let grass = textures.load(assets.texture_path("grassplain.png"), TextureType::Diffuse)?;
        let bark = textures.load(assets.texture_path("tree.png"), TextureType::Diffuse)?;
        let black = textures.load(assets.texture_path("black.png"), TextureType::Specular)?;

        let heightmap = ImageData::from_file(assets.texture_path("height.png"))?;
        self.seat_on_terrain(&heightmap);

        let mut crate_cube = create_cube(&device)?;
        crate_cube.add_texture(container);
        crate_cube.add_texture(container_specular);

        let (faces, height, radius) = TRUNK;
        let mut trunk = create_cylinder(&device, faces, height, radius)?;
        trunk.add_texture(bark);

        let (sides, radius) = CROWN;
        let mut crown = create_sphere(&device, sides, radius)?;
        crown.add_texture(grass);
        crown.add_texture(black);

        let mut ground = create_ground(&device, &heightmap)?;
        ground.add_texture(grass);

        let house = Model::load(&device, textures, assets.model_path("house.obj"))?;
        let skybox_faces = SKYBOX_FACES.map(|face| assets.texture_path(face));
        let skybox = Skybox::from_files(&device, &skybox_faces, shaders.skybox)?;

        Ok(SceneResources {
            crate_cube,
            lamp: create_lamp_cube(&device)?,
            ground,
            trunk,
            crown,
            house,
            skybox,
        })
    }

    fn pick(&mut self, engine: &Engine) -> Result<(), AppError> {
        let (x, y) = cursor_to_framebuffer(
            engine.input().cursor_position(),
            engine.window().size(),
            engine.window().framebuffer_size(),
        );
        match engine.gl().render_context(0)?.cast_ray(x, y) {
            Some(point) => {
                log::debug!("Picked ground at {:?}", point);
                self.picked_position = point;
            }
            None => log::debug!("Pick at ({}, {}) missed the ground", x, y),
        }
        Ok(())
    }
}

impl Application for TerrainScene {
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
        log::info!("Loading terrain scene...");
        let assets = engine.config().assets.clone();

        let shaders = ShaderSet::load(engine.gl_mut(), &assets)?;
        shaders.register_uniforms(engine.gl_mut())?;

        self.resources = Some(self.load_resources(engine, &shaders)?);
        self.shaders = Some(shaders);

        log::info!(
            "Terrain scene ready: {} shaders, {} textures",
            engine.gl().shader_count(),
            engine.textures_mut().len()
        );
        Ok(())
    }

    fn update(&mut self, engine: &mut Engine, delta_time: f32) -> Result<(), AppError> {
        let moves: Vec<CameraMove> = CAMERA_KEYS
            .iter()
            .filter(|(key, _)| engine.input().is_key_down(*key))
            .map(|&(_, movement)| movement)
            .collect();

        let camera = &mut engine.gl_mut().current_render_context_mut()?.camera;
        for movement in moves {
            movement(camera, delta_time);
        }

        if engine.input().was_mouse_button_pressed(MouseButton::Left) {
            self.pick(engine)?;
        }
        Ok(())
    }

    fn render(&mut self, engine: &mut Engine) -> Result<(), AppError> {
        let (Some(shaders), Some(resources)) = (self.shaders.as_ref(), self.resources.as_ref()) else {
            return Err(AppError::Custom("terrain scene rendered before initialize".to_string()));
        };
        let clear_color = engine.config().render.clear_color;
        self.draw_frame(engine.gl_mut(), shaders, resources, clear_color)
    }

    fn cleanup(&mut self, engine: &mut Engine) {
        log::info!("Releasing terrain scene resources");
        self.resources = None;
        self.shaders = None;
        engine.textures_mut().clear();
    }
}
