//! Position providers for attached endpoints.
//!
//! The channel never stores coordinates itself; every send asks each
//! endpoint's provider for its current position, so a mobility model external
//! to this crate can move endpoints between transmissions and the link budget
//! picks the movement up automatically.

use std::cell::Cell;

use crate::geometry::Position;

/// Source of an endpoint's current position, queried once per send per link.
pub trait PositionProvider {
    fn position(&self) -> Position;
}

/// A position fixed for the whole run.
#[derive(Debug, Clone, Copy)]
pub struct ConstantPosition(pub Position);

impl ConstantPosition {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        ConstantPosition(Position::new(x, y, z))
    }
}

impl PositionProvider for ConstantPosition {
    fn position(&self) -> Position {
        self.0
    }
}

/// A `Cell` works directly as a provider: scenario code keeps an
/// `Rc<Cell<Position>>`, hands a clone to `attach`, and updates the cell to
/// move the endpoint mid-run.
impl PositionProvider for Cell<Position> {
    fn position(&self) -> Position {
        self.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn constant_position_never_moves() {
        let p = ConstantPosition::new(1.0, 2.0, 3.0);
        assert_eq!(p.position(), Position::new(1.0, 2.0, 3.0));
        assert_eq!(p.position(), p.position());
    }

    #[test]
    fn cell_position_tracks_updates() {
        let shared = Rc::new(Cell::new(Position::new(0.0, 0.0, 0.0)));
        let provider: Rc<dyn PositionProvider> = shared.clone();
        assert_eq!(provider.position(), Position::new(0.0, 0.0, 0.0));
        shared.set(Position::new(5.0, -1.0, 0.0));
        assert_eq!(provider.position(), Position::new(5.0, -1.0, 0.0));
    }
}
