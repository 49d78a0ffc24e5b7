//! Projection updates driven by surface resizes.

use serde::{Deserialize, Serialize};

use crate::camera::RenderCamera;
use crate::engine::RenderEngine;
use crate::error::{ArError, ArResult};
use crate::math::Mat4;
use crate::sdk::TrackingSdk;

/// Physical camera parameters reported by the tracking SDK.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraParameters {
    /// Vertical field of view in degrees.
    pub fov: f32,
    /// Width / height ratio of the camera feed.
    pub aspect: f32,
}

impl CameraParameters {
    /// Create camera parameters.
    #[must_use]
    pub const fn new(fov: f32, aspect: f32) -> Self {
        Self { fov, aspect }
    }

    /// Reject parameters that cannot produce a projection.
    ///
    /// # Errors
    ///
    /// Returns [`ArError::MissingCameraParameters`] for non-finite values, a
    /// field of view outside `(0, 180)` or a non-positive aspect.
    pub fn validate(&self) -> ArResult<()> {
        if !self.fov.is_finite() || self.fov <= 0.0 || self.fov >= 180.0 {
            return Err(ArError::MissingCameraParameters(format!(
                "field of view {} out of range",
                self.fov
            )));
        }
        if !self.aspect.is_finite() || self.aspect <= 0.0 {
            return Err(ArError::MissingCameraParameters(format!(
                "aspect {} out of range",
                self.aspect
            )));
        }
        Ok(())
    }
}

/// Size of the render surface in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Viewport {
    /// Create a viewport.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Convert a pixel position (origin top-left) to normalized device
    /// coordinates (origin center, Y up). `None` for an empty viewport.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Surface sizes are far below f32 precision limits
    pub fn normalize(&self, px: f32, py: f32) -> Option<NormalizedTouch> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        let x = (px / self.width as f32) * 2.0 - 1.0;
        let y = -(py / self.height as f32) * 2.0 + 1.0;
        Some(NormalizedTouch::new(x, y))
    }
}

/// A touch position in normalized device coordinates, both axes in `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedTouch {
    /// Horizontal position, -1 left to 1 right.
    pub x: f32,
    /// Vertical position, -1 bottom to 1 top.
    pub y: f32,
}

impl NormalizedTouch {
    /// Create a normalized touch.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// The viewport center.
    #[must_use]
    pub const fn center() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Perspective projection applied to the render camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// Vertical field of view in degrees.
    pub fov: f32,
    /// Width / height ratio.
    pub aspect: f32,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
    /// Projection matrix.
    pub matrix: Mat4,
}

impl Projection {
    /// Build the projection for the given camera parameters and clip range.
    #[must_use]
    pub fn new(params: CameraParameters, near: f32, far: f32) -> Self {
        Self {
            fov: params.fov,
            aspect: params.aspect,
            near,
            far,
            matrix: Mat4::perspective(params.fov.to_radians(), params.aspect, near, far),
        }
    }
}

/// Keeps the camera projection and engine surface in step with the feed.
#[derive(Debug, Clone)]
pub struct ProjectionUpdater {
    near: f32,
    far: f32,
    resize_count: u64,
}

impl ProjectionUpdater {
    /// Create an updater using the engine's clip range.
    #[must_use]
    pub fn new(near: f32, far: f32) -> Self {
        Self {
            near,
            far,
            resize_count: 0,
        }
    }

    /// Handle a surface resize.
    ///
    /// Fetches the current camera parameters, writes the projection to
    /// `camera` and resizes the engine surface to `viewport`.
    ///
    /// # Errors
    ///
    /// Returns [`ArError::MissingCameraParameters`] when the SDK has no valid
    /// parameters; the caller cannot render without a projection.
    pub fn on_resize<S, E>(
        &mut self,
        viewport: Viewport,
        sdk: &S,
        engine: &mut E,
        camera: &mut RenderCamera,
    ) -> ArResult<Projection>
    where
        S: TrackingSdk + ?Sized,
        E: RenderEngine + ?Sized,
    {
        let params = sdk.camera_parameters().ok_or_else(|| {
            ArError::MissingCameraParameters("tracking SDK returned no parameters".to_string())
        })?;
        params.validate()?;

        let projection = Projection::new(params, self.near, self.far);
        camera.set_projection(projection);
        engine.resize_surface(viewport);
        self.resize_count += 1;

        tracing::debug!(
            "Projection updated: fov={} aspect={} surface={}x{}",
            projection.fov,
            projection.aspect,
            viewport.width,
            viewport.height
        );
        Ok(projection)
    }

    /// Number of resizes handled.
    #[must_use]
    pub fn resize_count(&self) -> u64 {
        self.resize_count
    }
}
