use glam::{Mat4, Vec3};

/// World-space ray; `direction` is unit length.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Right-handed perspective camera looking down its local -Z.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view, degrees.
    pub fov_y_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    target: Vec3,
    up: Vec3,
}

impl PerspectiveCamera {
    pub const QUILT_FOV_DEGREES: f32 = 40.0;
    pub const QUILT_NEAR: f32 = 0.1;
    pub const QUILT_FAR: f32 = 2000.0;

    pub fn new(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov_y_degrees,
            aspect,
            near,
            far,
            position: Vec3::ZERO,
            target: Vec3::NEG_Z,
            up: Vec3::Y,
        }
    }

    /// Camera used for every quilt tile.
    pub fn for_quilt_tile(tile_width: u32, tile_height: u32) -> Self {
        Self::new(
            Self::QUILT_FOV_DEGREES,
            tile_width as f32 / tile_height.max(1) as f32,
            Self::QUILT_NEAR,
            Self::QUILT_FAR,
        )
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    /// Unit vector the camera looks along.
    pub fn forward(&self) -> Vec3 {
        let dir = (self.target - self.position).normalize_or_zero();
        if dir == Vec3::ZERO { Vec3::NEG_Z } else { dir }
    }

    /// Signed distance of `p` in front of the camera along its view axis.
    pub fn view_depth(&self, p: Vec3) -> f32 {
        (p - self.position).dot(self.forward())
    }

    /// Primary ray through the center of pixel `(x, y)`; `y = 0` is the top row.
    pub fn ray_for_pixel(&self, x: u32, y: u32, width: u32, height: u32) -> Ray {
        self.pixel_rays(width, height).ray(x, y)
    }

    /// Precomputed ray generator for a `width x height` target.
    pub fn pixel_rays(&self, width: u32, height: u32) -> PixelRays {
        let tan_half = (self.fov_y_degrees.to_radians() * 0.5).tan();
        PixelRays {
            origin: self.position,
            world_from_camera: self.view_matrix().inverse(),
            half_extent: (tan_half * self.aspect, tan_half),
            inv_size: (1.0 / width.max(1) as f32, 1.0 / height.max(1) as f32),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PixelRays {
    origin: Vec3,
    world_from_camera: Mat4,
    half_extent: (f32, f32),
    inv_size: (f32, f32),
}

impl PixelRays {
    pub fn ray(&self, x: u32, y: u32) -> Ray {
        let ndc_x = 2.0 * (x as f32 + 0.5) * self.inv_size.0 - 1.0;
        let ndc_y = 1.0 - 2.0 * (y as f32 + 0.5) * self.inv_size.1;
        let camera_dir = Vec3::new(ndc_x * self.half_extent.0, ndc_y * self.half_extent.1, -1.0);
        Ray {
            origin: self.origin,
            direction: self
                .world_from_camera
                .transform_vector3(camera_dir)
                .normalize(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/camera.rs"]
mod tests;
