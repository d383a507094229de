use glam::Vec3;

use crate::config::InteractionConfig;

pub const LIGHT_PHASE_STEP: f64 = 0.1;
const LIGHT_SWEEP_RADIUS: f64 = 2.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParametricPoint {
    pub u: f64,
    pub v: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKey {
    LightBackward,
    LightForward,
    PointUp,
    PointDown,
    PointLeft,
    PointRight,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InteractionState {
    pub point: ParametricPoint,
    pub light_phase: f64,
    step: f64,
}

impl InteractionState {
    pub fn new(config: &InteractionConfig, step: f64) -> Self {
        Self {
            point: ParametricPoint {
                u: config.point_u,
                v: config.point_v,
            },
            light_phase: config.light_phase,
            step,
        }
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn set_step(&mut self, step: f64) {
        self.step = step;
    }

    pub fn handle_key(&mut self, key: InteractionKey) -> bool {
        match key {
            InteractionKey::LightBackward => self.light_phase -= LIGHT_PHASE_STEP,
            InteractionKey::LightForward => self.light_phase += LIGHT_PHASE_STEP,
            InteractionKey::PointUp => self.point.v += self.step,
            InteractionKey::PointDown => self.point.v -= self.step,
            InteractionKey::PointRight => self.point.u += self.step,
            InteractionKey::PointLeft => self.point.u -= self.step,
        }
        log::debug!(
            "{:?}: point=({:.3}, {:.3}) light_phase={:.2}",
            key,
            self.point.u,
            self.point.v,
            self.light_phase
        );
        true
    }

    pub fn light_world_position(&self) -> Vec3 {
        let p = self.light_phase.sin() * LIGHT_SWEEP_RADIUS;
        Vec3::new(p as f32, 10.0, (-10.0 + p * p) as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> InteractionState {
        InteractionState::new(&InteractionConfig::default(), 0.1)
    }

    #[test]
    fn arrow_right_advances_light_phase() {
        let mut s = state();
        assert!(s.handle_key(InteractionKey::LightForward));
        assert_eq!(s.light_phase, 0.1);

        let p = (0.1f64).sin() * 2.5;
        let light = s.light_world_position();
        assert_eq!(light, Vec3::new(p as f32, 10.0, (-10.0 + p * p) as f32));
    }

    #[test]
    fn arrow_left_reverses_light_phase() {
        let mut s = state();
        s.handle_key(InteractionKey::LightBackward);
        s.handle_key(InteractionKey::LightBackward);
        assert!((s.light_phase + 0.2).abs() < 1e-12);
    }

    #[test]
    fn light_starts_at_sweep_center() {
        assert_eq!(state().light_world_position(), Vec3::new(0.0, 10.0, -10.0));
    }

    #[test]
    fn wasd_moves_point_by_step() {
        let mut s = state();
        let start = s.point;

        s.handle_key(InteractionKey::PointUp);
        assert_eq!(s.point.v, start.v + 0.1);
        assert_eq!(s.point.u, start.u);

        s.handle_key(InteractionKey::PointRight);
        assert_eq!(s.point.u, start.u + 0.1);

        s.handle_key(InteractionKey::PointDown);
        s.handle_key(InteractionKey::PointLeft);
        assert!((s.point.u - start.u).abs() < 1e-9);
        assert!((s.point.v - start.v).abs() < 1e-9);
    }

    #[test]
    fn point_is_not_clamped() {
        let config = InteractionConfig {
            point_u: 0.0,
            point_v: 0.0,
            light_phase: 0.0,
        };
        let mut s = InteractionState::new(&config, 0.5);
        for _ in 0..40 {
            s.handle_key(InteractionKey::PointDown);
        }
        assert_eq!(s.point.v, -20.0);
    }
}
