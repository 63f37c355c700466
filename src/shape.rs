//! Piece geometry: base shapes, rotation, bounds.

/// One cell offset relative to the anchor: (row, col).
pub type Offset = (i32, i32);

/// Base shapes offered in the tray.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Mono,
    Domino,
    Line3,
    Line4,
    Line5,
    Square,
    Corner,
    L,
    Z,
    T,
    Plus,
    LongL,
    LongS,
}

impl ShapeKind {
    pub const ALL: [Self; 13] = [
        Self::Mono,
        Self::Domino,
        Self::Line3,
        Self::Line4,
        Self::Line5,
        Self::Square,
        Self::Corner,
        Self::L,
        Self::Z,
        Self::T,
        Self::Plus,
        Self::LongL,
        Self::LongS,
    ];

    /// Offsets of the unrotated shape.
    pub fn offsets(&self) -> &'static [Offset] {
        match self {
            Self::Mono => &[(0, 0)],
            Self::Domino => &[(0, 0), (0, 1)],
            Self::Line3 => &[(0, 0), (0, 1), (0, 2)],
            Self::Line4 => &[(0, 0), (0, 1), (0, 2), (0, 3)],
            Self::Line5 => &[(0, 0), (0, 1), (0, 2), (0, 3), (0, 4)],
            Self::Square => &[(0, 0), (0, 1), (1, 0), (1, 1)],
            Self::Corner => &[(0, 0), (1, 0), (1, 1)],
            Self::L => &[(0, 0), (1, 0), (2, 0), (2, 1)],
            Self::Z => &[(0, 0), (0, 1), (1, 1), (1, 2)],
            Self::T => &[(0, 0), (0, 1), (0, 2), (1, 1)],
            Self::Plus => &[(0, 1), (1, 0), (1, 1), (1, 2), (2, 1)],
            Self::LongL => &[(0, 0), (1, 0), (2, 0), (3, 0), (3, 1)],
            Self::LongS => &[(0, 0), (1, 0), (1, 1), (2, 1), (3, 1)],
        }
    }

    pub fn shape(&self) -> Shape {
        Shape::new(self.offsets())
    }
}

/// A normalized set of cell offsets: min row and min col are 0, cells sorted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    cells: Vec<Offset>,
}

impl Shape {
    pub fn new(offsets: &[Offset]) -> Self {
        Self {
            cells: normalize(offsets.to_vec()),
        }
    }

    #[inline]
    pub fn cells(&self) -> &[Offset] {
        &self.cells
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Rotate a quarter turn `times` times ((r, c) -> (c, -r) per step).
    /// Negative counts rotate the other way.
    pub fn rotated(&self, times: i32) -> Self {
        let mut cells = self.cells.clone();
        for _ in 0..times.rem_euclid(4) {
            cells = normalize(cells.into_iter().map(|(r, c)| (c, -r)).collect());
        }
        Self { cells }
    }

    /// (height, width) of the bounding box.
    pub fn bounds(&self) -> (usize, usize) {
        let (max_r, max_c) = self
            .cells
            .iter()
            .fold((0, 0), |(ar, ac), &(r, c)| (ar.max(r), ac.max(c)));
        (max_r as usize + 1, max_c as usize + 1)
    }

    #[cfg(test)]
    pub fn contains(&self, offset: Offset) -> bool {
        self.cells.binary_search(&offset).is_ok()
    }
}

fn normalize(mut cells: Vec<Offset>) -> Vec<Offset> {
    let min_r = cells.iter().map(|v| v.0).min().unwrap_or(0);
    let min_c = cells.iter().map(|v| v.1).min().unwrap_or(0);
    for cell in &mut cells {
        cell.0 -= min_r;
        cell.1 -= min_c;
    }
    cells.sort_unstable();
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_has_period_four() {
        for kind in ShapeKind::ALL {
            let base = kind.shape();
            for k in -4..8 {
                assert_eq!(base.rotated(k + 4), base.rotated(k), "{kind:?} k={k}");
            }
        }
    }

    #[test]
    fn rotated_shapes_stay_normalized() {
        for kind in ShapeKind::ALL {
            for k in 0..4 {
                let s = kind.shape().rotated(k);
                assert_eq!(s.cells().iter().map(|v| v.0).min(), Some(0));
                assert_eq!(s.cells().iter().map(|v| v.1).min(), Some(0));
                assert_eq!(s.len(), kind.offsets().len());
            }
        }
    }

    #[test]
    fn quarter_turn_of_line_is_vertical() {
        let line = ShapeKind::Line3.shape();
        assert_eq!(line.bounds(), (1, 3));
        let turned = line.rotated(1);
        assert_eq!(turned.bounds(), (3, 1));
        assert_eq!(turned.cells(), &[(0, 0), (1, 0), (2, 0)]);
    }

    #[test]
    fn left_and_right_turns_cancel() {
        let l = ShapeKind::L.shape();
        assert_eq!(l.rotated(1).rotated(3), l);
        assert_eq!(l.rotated(-1), l.rotated(3));
    }

    #[test]
    fn symmetric_shapes_have_fewer_orientations() {
        let plus = ShapeKind::Plus.shape();
        assert_eq!(plus.rotated(1), plus);
        let square = ShapeKind::Square.shape();
        assert_eq!(square.rotated(3), square);
        let z = ShapeKind::Z.shape();
        assert_ne!(z.rotated(1), z);
        assert_eq!(z.rotated(2), z);
    }

    #[test]
    fn bounds_of_long_l() {
        assert_eq!(ShapeKind::LongL.shape().bounds(), (4, 2));
        assert_eq!(ShapeKind::LongL.shape().rotated(1).bounds(), (2, 4));
    }
}
