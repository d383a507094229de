use glam::{Mat4, Quat, Vec2, Vec3};

pub struct Trackball {
    rotation: Quat,
    drag_anchor: Option<Vec3>,
    viewport: Vec2,
}

impl Default for Trackball {
    fn default() -> Self {
        Self {
            rotation: Quat::IDENTITY,
            drag_anchor: None,
            viewport: Vec2::new(1.0, 1.0),
        }
    }
}

impl Trackball {
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width.max(1.0), height.max(1.0));
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_quat(self.rotation)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_anchor.is_some()
    }

    pub fn begin_drag(&mut self, cursor: Vec2) {
        self.drag_anchor = Some(self.project_to_sphere(cursor));
    }

    pub fn drag_to(&mut self, cursor: Vec2) -> bool {
        let Some(from) = self.drag_anchor else {
            return false;
        };
        let to = self.project_to_sphere(cursor);

        let axis = from.cross(to);
        if axis.length_squared() < 1e-12 {
            return false;
        }
        let angle = from.dot(to).clamp(-1.0, 1.0).acos();

        self.rotation = (Quat::from_axis_angle(axis.normalize(), angle) * self.rotation).normalize();
        self.drag_anchor = Some(to);
        true
    }

    pub fn end_drag(&mut self) {
        self.drag_anchor = None;
    }

    pub fn reset(&mut self) {
        self.rotation = Quat::IDENTITY;
        self.drag_anchor = None;
    }

    fn project_to_sphere(&self, cursor: Vec2) -> Vec3 {
        let radius = self.viewport.min_element() / 2.0;
        let x = (cursor.x - self.viewport.x / 2.0) / radius;
        let y = (self.viewport.y / 2.0 - cursor.y) / radius;

        let d2 = x * x + y * y;
        if d2 <= 1.0 {
            Vec3::new(x, y, (1.0 - d2).sqrt())
        } else {
            Vec3::new(x, y, 0.0).normalize()
        }
    }
}
