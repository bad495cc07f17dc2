//! Scene graph: entities and lights. Built once at setup; the packer rewrites the uniform
//! ranges every frame.

use glam::{Mat4, Quat, Vec3};

use crate::cbuffer::UniformRange;
use crate::light::point_light_radius;
use crate::registry::{ModelIdx, ProgramIdx};

#[derive(Debug, Clone)]
pub struct Entity {
    world: Mat4,
    pub model: ModelIdx,
    pub program: ProgramIdx,
    /// Range of this entity's block in the entity buffer, valid for the current frame.
    pub params: UniformRange,
}

impl Entity {
    pub fn new(world: Mat4, model: ModelIdx, program: ProgramIdx) -> Self {
        Self {
            world,
            model,
            program,
            params: UniformRange::default(),
        }
    }

    pub fn world(&self) -> &Mat4 {
        &self.world
    }
}

/// `translate * scale * rotate`: the model is rotated by `degrees` about `axis` first, then
/// scaled, then placed at `position`.
pub fn transform(position: Vec3, scale: Vec3, axis: Vec3, degrees: f32) -> Mat4 {
    Mat4::from_translation(position)
        * Mat4::from_scale(scale)
        * Mat4::from_quat(Quat::from_axis_angle(axis.normalize_or_zero(), degrees.to_radians()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightKind {
    Directional,
    Point,
}

impl LightKind {
    /// Tag written into the global block; the shaders switch on it.
    pub fn tag(self) -> u32 {
        match self {
            Self::Directional => 0,
            Self::Point => 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Light {
    pub kind: LightKind,
    color: Vec3,
    pub direction: Vec3,
    pub position: Vec3,
    radius: f32,
    /// Range of this light's volume block in the light-volume buffer. Point lights only.
    pub volume_params: UniformRange,
}

impl Light {
    /// A zero `direction` falls back to straight down.
    pub fn directional(color: Vec3, direction: Vec3) -> Self {
        let direction = direction.try_normalize().unwrap_or_else(|| {
            log::warn!("directional light with zero direction, pointing it down");
            Vec3::NEG_Y
        });
        Self::new(LightKind::Directional, color, direction, Vec3::ZERO)
    }

    pub fn point(color: Vec3, position: Vec3) -> Self {
        Self::new(LightKind::Point, color, Vec3::NEG_Y, position)
    }

    fn new(kind: LightKind, color: Vec3, direction: Vec3, position: Vec3) -> Self {
        Self {
            kind,
            color,
            direction,
            position,
            radius: point_light_radius(color),
            volume_params: UniformRange::default(),
        }
    }

    pub fn color(&self) -> Vec3 {
        self.color
    }

    pub fn set_color(&mut self, color: Vec3) {
        self.color = color;
        self.radius = point_light_radius(color);
    }

    /// Influence radius derived from the color.
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// World matrix of the light volume: unit sphere scaled to the radius at the light position.
    pub fn volume_world(&self) -> Mat4 {
        Mat4::from_translation(self.position) * Mat4::from_scale(Vec3::splat(self.radius))
    }
}

#[derive(Debug, Default)]
pub struct Scene {
    pub entities: Vec<Entity>,
    pub lights: Vec<Light>,
    /// Global block range in the entity buffer, valid for the current frame.
    pub global_params: UniformRange,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entity(&mut self, entity: Entity) -> usize {
        self.entities.push(entity);
        self.entities.len() - 1
    }

    pub fn add_light(&mut self, light: Light) -> usize {
        self.lights.push(light);
        self.lights.len() - 1
    }

    pub fn light_mut(&mut self, index: usize) -> Option<&mut Light> {
        self.lights.get_mut(index)
    }

    pub fn has_directional_light(&self) -> bool {
        self.lights.iter().any(|l| l.kind == LightKind::Directional)
    }

    pub fn point_lights(&self) -> impl Iterator<Item = (usize, &Light)> {
        self.lights.iter().enumerate().filter(|(_, l)| l.kind == LightKind::Point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn color_change_recomputes_radius() {
        let mut light = Light::point(Vec3::splat(0.2), Vec3::ZERO);
        let dim = light.radius();
        light.set_color(Vec3::ONE);
        assert!(light.radius() > dim);
        assert_relative_eq!(light.radius(), point_light_radius(Vec3::ONE));
    }

    #[test]
    fn volume_world_scales_the_unit_sphere() {
        let light = Light::point(Vec3::ONE, Vec3::new(1.0, 2.0, 3.0));
        let r = light.radius();
        let p = light.volume_world().transform_point3(Vec3::X);
        assert_relative_eq!(p.x, 1.0 + r, epsilon = 1e-4);
        assert_relative_eq!(p.y, 2.0, epsilon = 1e-4);
    }

    #[test]
    fn tilted_floor_faces_up() {
        let floor = transform(Vec3::new(0.0, -5.0, 0.0), Vec3::new(100.0, 1.0, 100.0), Vec3::X, -88.0);
        let normal = floor.transform_vector3(Vec3::X).cross(floor.transform_vector3(Vec3::Y)).normalize();
        assert!(normal.y > 0.99);
        // Scaled after rotating, so the floor spans X and Z.
        assert!(floor.transform_vector3(Vec3::Y).z.abs() > 90.0);
    }

    #[test]
    fn directional_lights_are_detected() {
        let mut scene = Scene::new();
        scene.add_light(Light::point(Vec3::ONE, Vec3::ZERO));
        assert!(!scene.has_directional_light());
        scene.add_light(Light::directional(Vec3::ONE, Vec3::new(0.0, -2.0, 0.0)));
        assert!(scene.has_directional_light());
        assert_eq!(scene.point_lights().count(), 1);
        assert_relative_eq!(scene.lights[1].direction.length(), 1.0);
    }

    #[test]
    fn zero_direction_points_down() {
        let light = Light::directional(Vec3::ONE, Vec3::ZERO);
        assert_eq!(light.direction, Vec3::NEG_Y);
        let tilted = Light::directional(Vec3::ONE, Vec3::new(0.0, -2.0, 0.0));
        assert_relative_eq!(tilted.direction.length(), 1.0);
    }
}
