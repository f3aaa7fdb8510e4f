use crate::math::space::{cross, from_columns, inverse, point, Point, Rational};

use num_traits::{One, Signed, Zero};

/// A straight segment between two nodes
///
/// Equality ignores the direction of the segment. The direction is only used when an element
/// hands out its sides, in which case it is counter-clockwise with respect to that element.
#[derive(Debug, Clone, Eq)]
pub struct Side {
    pub a: Point,
    pub b: Point,
}

impl PartialEq for Side {
    fn eq(&self, other: &Self) -> bool {
        (self.a == other.a && self.b == other.b) || (self.a == other.b && self.b == other.a)
    }
}

impl Side {
    pub fn new(a: Point, b: Point) -> Self {
        Self { a, b }
    }

    pub fn direction(&self) -> Point {
        &self.b - &self.a
    }

    /// `(dy, -dx)`: points away from the element when the side is traversed counter-clockwise.
    /// Its length equals the length of the side.
    pub fn outward_normal_unscaled(&self) -> Point {
        let d = self.direction();
        point(d[1].clone(), -d[0].clone())
    }

    /// The point `(1 - t)/2 a + (1 + t)/2 b` for `t` in `[-1, 1]`
    pub fn point_at(&self, t: &Rational) -> Point {
        let two = Rational::one() + Rational::one();
        let wa = (Rational::one() - t) / &two;
        let wb = (Rational::one() + t) / &two;
        self.a.map(|c| c * &wa) + self.b.map(|c| c * &wb)
    }

    pub fn is_parallel_to(&self, other: &Side) -> bool {
        cross(&self.direction(), &other.direction()).is_zero()
    }

    /// Check if two closed segments share at least one point
    pub fn intersects(&self, other: &Side) -> bool {
        let (a1, b1, a2, b2) = (&self.a, &self.b, &other.a, &other.b);

        if !self.is_parallel_to(other) {
            // solve a1 + s (b1 - a1) = a2 + t (b2 - a2)
            let mat = from_columns(&(b1 - a1), &(a2 - b2));
            let mat_inv = match inverse(&mat) {
                Some(m) => m,
                None => return false,
            };
            let st = &mat_inv * (a2 - a1);
            return in_unit_interval(&st[0]) && in_unit_interval(&st[1]);
        }

        let line_dir = b1 - a1;
        match (
            line_parameter(a1, &line_dir, a2),
            line_parameter(a1, &line_dir, b2),
        ) {
            (Some(t), Some(s)) => {
                in_unit_interval(&t)
                    || in_unit_interval(&s)
                    || (!t.is_positive() && s >= Rational::one())
                    || (!s.is_positive() && t >= Rational::one())
            }
            _ => false,
        }
    }
}

fn in_unit_interval(r: &Rational) -> bool {
    !r.is_negative() && *r <= Rational::one()
}

// the parameter `t` with `origin + t dir == p`, if `p` lies on the line
fn line_parameter(origin: &Point, dir: &Point, p: &Point) -> Option<Rational> {
    assert!(
        !(dir[0].is_zero() && dir[1].is_zero()),
        "Cannot parameterize a line with a zero direction!"
    );
    let rhs = p - origin;

    if dir[0].is_zero() {
        rhs[0].is_zero().then(|| &rhs[1] / &dir[1])
    } else if dir[1].is_zero() {
        rhs[1].is_zero().then(|| &rhs[0] / &dir[0])
    } else {
        let t0 = &rhs[0] / &dir[0];
        let t1 = &rhs[1] / &dir[1];
        (t0 == t1).then(|| t0)
    }
}
