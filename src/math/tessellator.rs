use crate::error::DomainError;
use crate::math::mesh::Mesh;
use crate::math::surface::ParametricSurface;

pub const MAX_VERTICES: usize = 4_000_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterDomain {
    pub u_from: f64,
    pub u_to: f64,
    pub v_from: f64,
    pub v_to: f64,
    pub step: f64,
}

impl ParameterDomain {
    pub fn validate(&self) -> Result<(), DomainError> {
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(DomainError::NonPositiveStep(self.step));
        }
        let bounds = [self.u_from, self.u_to, self.v_from, self.v_to];
        if bounds.iter().any(|b| !b.is_finite()) {
            return Err(DomainError::NonFiniteBound);
        }
        if self.u_from > self.u_to {
            return Err(DomainError::EmptyRange { axis: 'u' });
        }
        if self.v_from > self.v_to {
            return Err(DomainError::EmptyRange { axis: 'v' });
        }
        for (axis, from, to) in [('u', self.u_from, self.u_to), ('v', self.v_from, self.v_to)] {
            if from + self.step == from || to + self.step == to {
                return Err(DomainError::StepTooSmall { axis, step: self.step });
            }
        }

        // +1 on each axis covers a boundary sample the running sum may add
        let per_axis = |from: f64, to: f64| ((to - from) / self.step).floor() + 2.0;
        let count = 2.0 * per_axis(self.u_from, self.u_to) * per_axis(self.v_from, self.v_to);
        if count > MAX_VERTICES as f64 {
            return Err(DomainError::TooManyVertices {
                count,
                limit: MAX_VERTICES,
            });
        }
        Ok(())
    }

    pub fn axis_samples(from: f64, to: f64, step: f64) -> Vec<f64> {
        let mut samples = Vec::new();
        let mut t = from;
        while t <= to {
            samples.push(t);
            t += step;
        }
        samples
    }

    pub fn u_samples(&self) -> Vec<f64> {
        Self::axis_samples(self.u_from, self.u_to, self.step)
    }

    pub fn v_samples(&self) -> Vec<f64> {
        Self::axis_samples(self.v_from, self.v_to, self.step)
    }

    pub fn expected_vertex_count(&self) -> usize {
        2 * self.u_samples().len() * self.v_samples().len()
    }

    pub fn texcoord(&self, u: f64, v: f64) -> [f32; 2] {
        [(u / self.u_to) as f32, (v / self.v_to) as f32]
    }
}

pub struct Tessellator<'a, S: ParametricSurface> {
    surface: &'a S,
    derivative_delta: f64,
}

impl<'a, S: ParametricSurface> Tessellator<'a, S> {
    pub fn new(surface: &'a S, derivative_delta: f64) -> Self {
        Self {
            surface,
            derivative_delta,
        }
    }

    pub fn tessellate(&self, domain: &ParameterDomain) -> Result<Mesh, DomainError> {
        domain.validate()?;

        let u_samples = domain.u_samples();
        let v_samples = domain.v_samples();
        let mut mesh = Mesh::with_capacity(domain.expected_vertex_count());

        for &u0 in &u_samples {
            let u1 = u0 + domain.step;
            for &v0 in &v_samples {
                self.emit(&mut mesh, domain, u0, v0);
                self.emit(&mut mesh, domain, u1, v0);
            }
        }

        Ok(mesh)
    }

    fn emit(&self, mesh: &mut Mesh, domain: &ParameterDomain, u: f64, v: f64) {
        let p = self.surface.position(u, v);
        let n = self.surface.normal(u, v, self.derivative_delta);
        mesh.push(
            [p.x as f32, p.z as f32, p.y as f32],
            n.as_vec3().to_array(),
            domain.texcoord(u, v),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::surface::{EllipticTorus, ShapeConstants, DEFAULT_DERIVATIVE_DELTA};
    use std::f64::consts::TAU;

    fn torus() -> EllipticTorus {
        EllipticTorus::new(ShapeConstants {
            a: 2.0,
            b: 3.0,
            c: 2.0,
            d: 4.0,
        })
    }

    fn full_turn(step: f64) -> ParameterDomain {
        ParameterDomain {
            u_from: 0.0,
            u_to: TAU,
            v_from: 0.0,
            v_to: TAU,
            step,
        }
    }

    #[test]
    fn half_step_full_turn_vertex_count() {
        let surface = torus();
        let domain = full_turn(0.5);
        let mesh = Tessellator::new(&surface, DEFAULT_DERIVATIVE_DELTA)
            .tessellate(&domain)
            .unwrap();

        let per_axis = (TAU / 0.5).ceil() as u32;
        assert_eq!(per_axis, 13);
        assert_eq!(mesh.vertex_count(), per_axis * per_axis * 2);
        assert_eq!(mesh.vertex_count() as usize, domain.expected_vertex_count());
        assert_eq!(mesh.normals.len(), mesh.vertices.len());
        assert_eq!(mesh.texcoords.len() / 2, mesh.vertex_count() as usize);
    }

    #[test]
    fn inclusive_upper_bound_is_sampled() {
        assert_eq!(ParameterDomain::axis_samples(0.0, 1.0, 0.25), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(ParameterDomain::axis_samples(0.0, 0.9, 0.5), vec![0.0, 0.5]);
    }

    #[test]
    fn rectangular_domain_counts_each_axis() {
        let surface = torus();
        let domain = ParameterDomain {
            u_from: 0.0,
            u_to: 1.0,
            v_from: 0.0,
            v_to: 2.0,
            step: 0.5,
        };
        let mesh = Tessellator::new(&surface, 0.001).tessellate(&domain).unwrap();
        assert_eq!(mesh.vertex_count(), 2 * 3 * 5);
    }

    #[test]
    fn first_pair_spans_one_step_in_u() {
        let surface = torus();
        let domain = full_turn(0.5);
        let mesh = Tessellator::new(&surface, 0.001).tessellate(&domain).unwrap();

        let p0 = surface.position(0.0, 0.0);
        let p1 = surface.position(0.5, 0.0);
        assert_eq!(&mesh.vertices[0..3], &[p0.x as f32, p0.z as f32, p0.y as f32]);
        assert_eq!(&mesh.vertices[3..6], &[p1.x as f32, p1.z as f32, p1.y as f32]);

        // the next pair advances v, not u
        let p2 = surface.position(0.0, 0.5);
        assert_eq!(&mesh.vertices[6..9], &[p2.x as f32, p2.z as f32, p2.y as f32]);
    }

    #[test]
    fn normals_and_texcoords_follow_samples() {
        let surface = torus();
        let domain = full_turn(0.5);
        let mesh = Tessellator::new(&surface, 0.001).tessellate(&domain).unwrap();

        let n1 = surface.normal(0.5, 0.0, 0.001).as_vec3().to_array();
        assert_eq!(&mesh.normals[3..6], &n1);

        assert_eq!(&mesh.texcoords[0..2], &[0.0, 0.0]);
        assert_eq!(&mesh.texcoords[2..4], &[(0.5 / TAU) as f32, 0.0]);
    }

    #[test]
    fn rebuild_is_deterministic() {
        let surface = torus();
        let domain = full_turn(0.5);
        let tess = Tessellator::new(&surface, 0.001);
        assert_eq!(tess.tessellate(&domain).unwrap(), tess.tessellate(&domain).unwrap());
    }

    #[test]
    fn rejects_bad_domains() {
        let surface = torus();
        let tess = Tessellator::new(&surface, 0.001);

        assert_eq!(tess.tessellate(&full_turn(0.0)), Err(DomainError::NonPositiveStep(0.0)));
        assert_eq!(tess.tessellate(&full_turn(-0.1)), Err(DomainError::NonPositiveStep(-0.1)));

        let reversed = ParameterDomain {
            v_from: 3.0,
            v_to: 1.0,
            ..full_turn(0.5)
        };
        assert_eq!(tess.tessellate(&reversed), Err(DomainError::EmptyRange { axis: 'v' }));

        let infinite = ParameterDomain {
            u_to: f64::INFINITY,
            ..full_turn(0.5)
        };
        assert_eq!(tess.tessellate(&infinite), Err(DomainError::NonFiniteBound));
    }

    #[test]
    fn rejects_domains_too_dense_to_allocate() {
        let dense = ParameterDomain {
            u_from: 0.0,
            u_to: 1000.0,
            v_from: 0.0,
            v_to: 1000.0,
            step: 0.005,
        };
        assert!(matches!(
            dense.validate(),
            Err(DomainError::TooManyVertices { limit: MAX_VERTICES, .. })
        ));

        let surface = torus();
        let tess = Tessellator::new(&surface, 0.001);
        assert!(tess.tessellate(&dense).is_err());
    }

    #[test]
    fn rejects_step_lost_in_bound_magnitude() {
        let far = ParameterDomain {
            u_from: 1e17,
            u_to: 1e17,
            v_from: 0.0,
            v_to: 1.0,
            step: 1.0,
        };
        assert_eq!(far.validate(), Err(DomainError::StepTooSmall { axis: 'u', step: 1.0 }));

        let far_end = ParameterDomain {
            v_to: 1e17,
            ..full_turn(1.0)
        };
        assert_eq!(far_end.validate(), Err(DomainError::StepTooSmall { axis: 'v', step: 1.0 }));
    }

    #[test]
    fn default_domain_stays_under_vertex_limit() {
        assert_eq!(full_turn(0.005).validate(), Ok(()));
    }
}
