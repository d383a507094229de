use glam::DVec3;

const SURFACE_SCALE: f64 = 0.05;

pub const DEFAULT_DERIVATIVE_DELTA: f64 = 0.001;

pub fn deg2rad(angle: f64) -> f64 {
    angle * std::f64::consts::PI / 180.0
}

pub fn elliptic_radius(a: f64, b: f64, angle: f64) -> f64 {
    (a * b) / (a.powi(2) * angle.sin().powi(2) + b.powi(2) * angle.cos().powi(2)).sqrt()
}

/// A closed-form surface `(u, v) -> (x, y, z)`.
///
/// Tangents are forward differences. The difference is taken with `delta` in
/// parameter units but divided by `delta` converted to radians, so the
/// returned vectors are scaled by `180 / PI` relative to the true partials.
pub trait ParametricSurface {
    fn position(&self, u: f64, v: f64) -> DVec3;

    fn tangent_u(&self, u: f64, v: f64, delta: f64) -> DVec3 {
        (self.position(u + delta, v) - self.position(u, v)) / deg2rad(delta)
    }

    fn tangent_v(&self, u: f64, v: f64, delta: f64) -> DVec3 {
        (self.position(u, v + delta) - self.position(u, v)) / deg2rad(delta)
    }

    fn normal(&self, u: f64, v: f64, delta: f64) -> DVec3 {
        self.tangent_u(u, v, delta).cross(self.tangent_v(u, v, delta))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeConstants {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipticTorus {
    pub shape: ShapeConstants,
}

impl EllipticTorus {
    pub fn new(shape: ShapeConstants) -> Self {
        Self { shape }
    }

    fn radial(&self, v: f64) -> f64 {
        elliptic_radius(self.shape.a, self.shape.b, v)
    }

    fn spread(&self) -> f64 {
        self.shape.d.powi(2) - self.shape.c.powi(2)
    }

    fn ring(&self, u: f64, v: f64) -> f64 {
        let f = self.radial(v);
        SURFACE_SCALE * (f * (1.0 + u.cos() + self.spread() * ((1.0 - u.cos()) / f)))
    }

    pub fn x(&self, u: f64, v: f64) -> f64 {
        self.ring(u, v) * v.cos()
    }

    pub fn y(&self, u: f64, v: f64) -> f64 {
        self.ring(u, v) * v.sin()
    }

    pub fn z(&self, u: f64, v: f64) -> f64 {
        let f = self.radial(v);
        SURFACE_SCALE * (f - self.spread() / f) * u.sin()
    }
}

impl ParametricSurface for EllipticTorus {
    fn position(&self, u: f64, v: f64) -> DVec3 {
        DVec3::new(self.x(u, v), self.y(u, v), self.z(u, v))
    }
}
