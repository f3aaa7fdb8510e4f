use super::side::Side;
use crate::math::affine_map::AffineMap;
use crate::math::space::{frac, from_columns, int, scale, Point, Rational, ReferenceShape};

use num_traits::{One, Signed, Zero};

/// A Finite Element in real space
///
/// Nodes are listed counter-clockwise. Local side `i` runs from node `i` to node `i + 1`.
///
/// ```text
///   Triangle                 Parallelogram
///
///   n2                        n3 ---- s2 ---- n2
///   | \                        |               |
///   s2  s1                    s3              s1
///   |     \                    |               |
///   n0 -s0- n1                n0 ---- s0 ---- n1
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Triangle([Point; 3]),
    Parallelogram([Point; 4]),
}

impl Element {
    /// Construct a triangle. Panics if the nodes are collinear or clockwise.
    pub fn triangle(nodes: [Point; 3]) -> Self {
        let element = Self::Triangle(nodes);
        element.assert_positive_orientation();
        element
    }

    /// Construct a parallelogram. Panics if opposite sides are not parallel, or if the nodes are
    /// degenerate or clockwise.
    pub fn parallelogram(nodes: [Point; 4]) -> Self {
        assert!(
            &nodes[0] + &nodes[2] == &nodes[1] + &nodes[3],
            "Opposite sides of a parallelogram must be parallel and of equal length: {:?}",
            nodes
        );
        let element = Self::Parallelogram(nodes);
        element.assert_positive_orientation();
        element
    }

    /// Construct a triangle from 3 nodes or a parallelogram from 4
    pub fn from_nodes(nodes: Vec<Point>) -> Self {
        match nodes.len() {
            3 => Self::triangle(to_array(nodes)),
            4 => Self::parallelogram(to_array(nodes)),
            n => panic!("Elements must have 3 or 4 nodes; got {}!", n),
        }
    }

    fn assert_positive_orientation(&self) {
        let det = self.reference_map().det();
        assert!(
            det.is_positive(),
            "Element nodes must be non-degenerate and counter-clockwise: {:?}",
            self.nodes()
        );
    }

    pub fn reference_shape(&self) -> ReferenceShape {
        match self {
            Self::Triangle(_) => ReferenceShape::Triangle,
            Self::Parallelogram(_) => ReferenceShape::Square,
        }
    }

    pub fn nodes(&self) -> &[Point] {
        match self {
            Self::Triangle(nodes) => &nodes[..],
            Self::Parallelogram(nodes) => &nodes[..],
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes().len()
    }

    pub fn num_sides(&self) -> usize {
        self.nodes().len()
    }

    pub fn node(&self, idx: usize) -> &Point {
        assert!(idx < self.num_nodes(), "Element has no node {}!", idx);
        &self.nodes()[idx]
    }

    /// Local side `idx`, directed counter-clockwise
    pub fn side(&self, idx: usize) -> Side {
        assert!(idx < self.num_sides(), "Element has no side {}!", idx);
        let n = self.num_nodes();
        Side::new(self.nodes()[idx].clone(), self.nodes()[(idx + 1) % n].clone())
    }

    pub fn sides(&self) -> impl Iterator<Item = Side> + '_ {
        (0..self.num_sides()).map(move |i| self.side(i))
    }

    /// The affine map from the reference shape onto this element
    ///
    /// * Triangle: `(0,0), (1,0), (0,1)` are sent to `n0, n1, n2`
    /// * Parallelogram: `(-1,-1), (1,-1), (1,1), (-1,1)` are sent to `n0, n1, n2, n3`
    pub fn reference_map(&self) -> AffineMap {
        match self {
            Self::Triangle([n0, n1, n2]) => {
                AffineMap::new(from_columns(&(n1 - n0), &(n2 - n0)), n0.clone())
            }
            Self::Parallelogram([n0, n1, n2, n3]) => {
                let half = frac(1, 2);
                AffineMap::new(
                    from_columns(&scale(&(n1 - n0), &half), &scale(&(n3 - n0), &half)),
                    scale(&(n0 + n2), &half),
                )
            }
        }
    }

    /// `|det A|` scaled by the area of the reference shape
    pub fn area(&self) -> Rational {
        self.reference_map().det().abs() * self.reference_shape().area()
    }

    /// Coordinates of a real-space point in the reference shape
    pub fn local_coordinates(&self, x: &Point) -> Point {
        self.reference_map().inverse().apply(x)
    }

    /// Membership test on the closed element
    pub fn contains_point(&self, x: &Point) -> bool {
        self.reference_shape().contains(&self.local_coordinates(x))
    }

    // ----------------------------------------------------------------------------------------------------
    // Intersections
    // ----------------------------------------------------------------------------------------------------

    /// Check if the two closed elements share at least one point
    pub fn are_intersecting(&self, other: &Element) -> bool {
        self.nodes().iter().any(|n| other.contains_point(n))
            || other.nodes().iter().any(|n| self.contains_point(n))
            || self
                .sides()
                .any(|s1| other.sides().any(|s2| s1.intersects(&s2)))
    }

    /// Check if the two elements touch in exactly one common node, and nowhere else
    pub fn is_intersection_one_node(&self, other: &Element) -> bool {
        let mut common = None;
        for (i, n1) in self.nodes().iter().enumerate() {
            for (j, n2) in other.nodes().iter().enumerate() {
                if n1 == n2 {
                    if common.is_some() {
                        return false;
                    }
                    common = Some((i, j));
                }
            }
        }

        let (node_idx_1, node_idx_2) = match common {
            Some(pair) => pair,
            None => return false,
        };

        let (nn1, nn2) = (self.num_nodes(), other.num_nodes());
        let (prev_1, next_1) = ((node_idx_1 + nn1 - 1) % nn1, (node_idx_1 + 1) % nn1);
        let (prev_2, next_2) = ((node_idx_2 + nn2 - 1) % nn2, (node_idx_2 + 1) % nn2);

        if other.contains_point(self.node(prev_1))
            || other.contains_point(self.node(next_1))
            || self.contains_point(other.node(prev_2))
            || self.contains_point(other.node(next_2))
        {
            return false;
        }

        // the segments between the common node's neighbours must not cut through the sides of
        // the other element that meet at the common node
        let chord_1 = Side::new(self.node(prev_1).clone(), self.node(next_1).clone());
        let chord_2 = Side::new(other.node(prev_2).clone(), other.node(next_2).clone());

        !(chord_1.intersects(&other.side(prev_2))
            || chord_1.intersects(&other.side(node_idx_2))
            || chord_2.intersects(&self.side(prev_1))
            || chord_2.intersects(&self.side(node_idx_1)))
    }

    /// Check if the two elements share a full side, traversed in opposite directions
    pub fn is_intersection_one_side(&self, other: &Element) -> bool {
        for i in 0..self.num_sides() {
            let side_1 = self.side(i);
            for j in 0..other.num_sides() {
                if side_1 == other.side(j) {
                    return self.node(i) != other.node(j);
                }
            }
        }
        false
    }

    // ----------------------------------------------------------------------------------------------------
    // Subdivision
    // ----------------------------------------------------------------------------------------------------

    /// Split the element into smaller elements of the same kind that all have `x` as a node
    ///
    /// * `x` at a node: the element itself
    /// * `x` on a side: two elements
    /// * `x` in the interior: three triangles or four parallelograms
    ///
    /// Panics if `x` is outside the element.
    pub fn subdivide(&self, x: &Point) -> Vec<Element> {
        assert!(
            self.contains_point(x),
            "Cannot subdivide an element around the point {:?} outside of it!",
            x
        );

        if self.nodes().contains(x) {
            return vec![self.clone()];
        }

        let local = self.local_coordinates(x);
        match self {
            Self::Triangle(nodes) => subdivide_triangle(nodes, x, &local),
            Self::Parallelogram(nodes) => subdivide_parallelogram(nodes, x, &local),
        }
    }
}

fn subdivide_triangle(n: &[Point; 3], x: &Point, local: &Point) -> Vec<Element> {
    let (xl, yl) = (&local[0], &local[1]);
    let on_side = if yl.is_zero() {
        Some(0)
    } else if xl.is_zero() {
        Some(2)
    } else if xl + yl == Rational::one() {
        Some(1)
    } else {
        None
    };

    let tri = |a: &Point, b: &Point| Element::triangle([a.clone(), x.clone(), b.clone()]);
    match on_side {
        Some(s) => vec![
            tri(&n[s], &n[(s + 2) % 3]),
            tri(&n[(s + 2) % 3], &n[(s + 1) % 3]),
        ],
        None => vec![tri(&n[0], &n[2]), tri(&n[1], &n[0]), tri(&n[2], &n[1])],
    }
}

fn subdivide_parallelogram(n: &[Point; 4], x: &Point, local: &Point) -> Vec<Element> {
    let (xl, yl) = (&local[0], &local[1]);
    let one = Rational::one();
    let on_side = if *yl == -&one {
        Some(0)
    } else if *xl == one {
        Some(1)
    } else if *yl == one {
        Some(2)
    } else if *xl == -&one {
        Some(3)
    } else {
        None
    };

    let quad = |a: &Point, b: &Point, c: &Point, d: &Point| {
        Element::parallelogram([a.clone(), b.clone(), c.clone(), d.clone()])
    };

    match on_side {
        Some(s) => {
            // split parallel to the two sides adjacent to side s
            let q = x + (&n[(s + 2) % 4] - &n[(s + 1) % 4]);
            vec![
                quad(&n[s], x, &q, &n[(s + 3) % 4]),
                quad(&q, x, &n[(s + 1) % 4], &n[(s + 2) % 4]),
            ]
        }
        None => {
            let tx = (xl + int(1)) / int(2);
            let ty = (yl + int(1)) / int(2);
            let d01 = &n[1] - &n[0];
            let d03 = &n[3] - &n[0];

            let p0 = &n[0] + scale(&d01, &tx);
            let p1 = &n[1] + scale(&d03, &ty);
            let p2 = &n[3] + scale(&d01, &tx);
            let p3 = &n[0] + scale(&d03, &ty);

            vec![
                quad(&p0, x, &p3, &n[0]),
                quad(&p1, x, &p0, &n[1]),
                quad(&p2, x, &p1, &n[2]),
                quad(&p3, x, &p2, &n[3]),
            ]
        }
    }
}

fn to_array<const N: usize>(nodes: Vec<Point>) -> [Point; N] {
    let len = nodes.len();
    nodes
        .try_into()
        .unwrap_or_else(|_| panic!("Expected {} nodes; got {}!", N, len))
}
