// World objects and axis-aligned hit boxes.
// Coordinates: x grows to the right (screen pixels), y is altitude above the
// ground line (0 = standing). Boxes are centred on x and rest on y.

pub const PLAYER_SIZE: (f64, f64) = (40.0, 60.0);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Obstacle,
    Item,
    GoldenItem,
    Bomb,
}

impl EntityKind {
    pub fn size(self) -> (f64, f64) {
        match self {
            EntityKind::Obstacle => (40.0, 40.0),
            EntityKind::Item => (30.0, 30.0),
            EntityKind::GoldenItem => (45.0, 45.0),
            EntityKind::Bomb => (30.0, 30.0),
        }
    }

    pub fn is_pickup(self) -> bool {
        matches!(self, EntityKind::Item | EntityKind::GoldenItem)
    }

    pub fn is_hazard(self) -> bool {
        matches!(self, EntityKind::Obstacle | EntityKind::Bomb)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f64, // centre
    pub y: f64, // bottom
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, (w, h): (f64, f64)) -> Self {
        Self { x, y, w, h }
    }

    /// Same centre and bottom edge, scaled extents.
    pub fn scaled(self, factor: f64) -> Self {
        let extra_h = self.h * (factor - 1.0);
        Self {
            x: self.x,
            y: self.y - extra_h / 2.0,
            w: self.w * factor,
            h: self.h * factor,
        }
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        (self.x - other.x).abs() * 2.0 < self.w + other.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Entity {
    pub kind: EntityKind,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
}

impl Entity {
    pub fn new(kind: EntityKind, x: f64, y: f64, vx: f64, vy: f64) -> Self {
        Self { kind, x, y, vx, vy }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.kind.size())
    }

    pub fn step(&mut self, dt: f64) {
        self.x += self.vx * dt;
        self.y += self.vy * dt;
    }

    /// Left the visible play area (bombs also vanish on hitting the ground).
    pub fn is_gone(&self) -> bool {
        if self.x < -100.0 || self.x > 1100.0 || self.y < -50.0 {
            return true;
        }
        self.kind == EntityKind::Bomb && self.y <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_requires_both_axes() {
        let a = Rect::new(100.0, 0.0, (40.0, 60.0));
        assert!(a.overlaps(&Rect::new(130.0, 10.0, (30.0, 30.0))));
        assert!(!a.overlaps(&Rect::new(200.0, 10.0, (30.0, 30.0))));
        assert!(!a.overlaps(&Rect::new(100.0, 70.0, (30.0, 30.0))));
    }

    #[test]
    fn scaled_box_reaches_further() {
        let a = Rect::new(100.0, 0.0, (40.0, 60.0));
        let item = Rect::new(140.0, 30.0, (30.0, 30.0));
        assert!(!a.overlaps(&item));
        assert!(a.scaled(1.5).overlaps(&item));
    }

    #[test]
    fn bombs_vanish_on_ground() {
        let mut b = Entity::new(EntityKind::Bomb, 300.0, 5.0, 0.0, -100.0);
        assert!(!b.is_gone());
        b.step(0.1);
        assert!(b.is_gone());
        let item = Entity::new(EntityKind::Item, 300.0, -10.0, 0.0, 0.0);
        assert!(!item.is_gone());
    }
}
