use super::path_commands::PathCommand;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Aabb {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    fn from_point(x: f64, y: f64) -> Self {
        Self { min_x: x, min_y: y, max_x: x, max_y: y }
    }

    fn union_point(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn union(&mut self, other: &Aabb) {
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }
}

/// Sweeps endpoints and control points of a command sequence into an AABB.
pub fn command_bounds(commands: &[PathCommand]) -> Option<Aabb> {
    let mut aabb: Option<Aabb> = None;
    let mut push = |aabb: &mut Option<Aabb>, x: f64, y: f64| match aabb {
        Some(b) => b.union_point(x, y),
        None => *aabb = Some(Aabb::from_point(x, y)),
    };

    for command in commands {
        match *command {
            PathCommand::MoveTo(x, y) | PathCommand::LineTo(x, y) => push(&mut aabb, x, y),
            PathCommand::QuadTo(cx, cy, x, y) => {
                push(&mut aabb, cx, cy);
                push(&mut aabb, x, y);
            }
            PathCommand::CubicTo(c1x, c1y, c2x, c2y, x, y) => {
                push(&mut aabb, c1x, c1y);
                push(&mut aabb, c2x, c2y);
                push(&mut aabb, x, y);
            }
            PathCommand::Arc(x, y, rx, ry) => {
                push(&mut aabb, x - rx, y - ry);
                push(&mut aabb, x + rx, y + ry);
            }
            PathCommand::Close => {}
        }
    }

    aabb
}
