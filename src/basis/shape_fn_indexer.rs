use super::descriptor::ShapeFnDescriptor;
use super::{FemContext, PolySpace};
use crate::math::space::ReferenceShape;

/// Ordering of the shape functions on one reference shape for a fixed order and polynomial space
///
/// Local indices run over the nodal modes first, then the side modes (grouped by side, then
/// `k = 2..=p`), then the interior modes:
///
/// | shape | space | interior modes (column-major in `k`) |
/// |-------|-------|--------------------------------------|
/// | Triangle | Product | `0 <= k, l <= p-2` |
/// | Triangle | Trunk | `k + l <= p-3` |
/// | Square | Product | `2 <= k, l <= p` |
/// | Square | Trunk | `2 <= k, l` and `k + l <= p` |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeFnIndexer {
    p: u32,
    space: PolySpace,
}

impl ShapeFnIndexer {
    pub fn new(p: u32, space: PolySpace) -> Self {
        assert!(p >= 1, "Polynomial order must be at least 1; got {}!", p);
        Self { p, space }
    }

    pub fn from_context(ctx: &FemContext) -> Self {
        Self::new(ctx.p, ctx.space)
    }

    pub fn p(&self) -> u32 {
        self.p
    }

    pub fn space(&self) -> PolySpace {
        self.space
    }

    pub fn num_nodal(&self, shape: ReferenceShape) -> usize {
        shape.num_nodes()
    }

    pub fn num_side(&self, shape: ReferenceShape) -> usize {
        shape.num_nodes() * self.modes_per_side()
    }

    pub fn num_interior(&self, shape: ReferenceShape) -> usize {
        let p = self.p as usize;
        match (shape, self.space) {
            (_, PolySpace::Product) => (p - 1) * (p - 1),
            (ReferenceShape::Triangle, PolySpace::Trunk) if p >= 3 => (p - 1) * (p - 2) / 2,
            (ReferenceShape::Square, PolySpace::Trunk) if p >= 4 => (p - 2) * (p - 3) / 2,
            (_, PolySpace::Trunk) => 0,
        }
    }

    pub fn num_shape_fns(&self, shape: ReferenceShape) -> usize {
        self.num_nodal(shape) + self.num_side(shape) + self.num_interior(shape)
    }

    /// Number of modes `k = 2..=p` on each side
    pub fn modes_per_side(&self) -> usize {
        (self.p - 1) as usize
    }

    pub fn descriptor(&self, shape: ReferenceShape, idx: usize) -> ShapeFnDescriptor {
        assert!(
            idx < self.num_shape_fns(shape),
            "Shape function {} does not exist on a {:?} (p = {}, {} space)!",
            idx,
            shape,
            self.p,
            self.space
        );

        let num_nodal = self.num_nodal(shape);
        if idx < num_nodal {
            return ShapeFnDescriptor::Nodal(idx);
        }

        let side_idx = idx - num_nodal;
        if side_idx < self.num_side(shape) {
            let modes = self.modes_per_side();
            return ShapeFnDescriptor::Side {
                side: side_idx / modes,
                k: (side_idx % modes) as u32 + 2,
            };
        }

        let (k, l) = self.interior_descriptor(shape, side_idx - self.num_side(shape));
        ShapeFnDescriptor::Interior { k, l }
    }

    pub fn index(&self, shape: ReferenceShape, desc: &ShapeFnDescriptor) -> usize {
        assert!(
            self.contains(shape, desc),
            "{} is not a shape function of a {:?} (p = {}, {} space)!",
            desc,
            shape,
            self.p,
            self.space
        );

        match *desc {
            ShapeFnDescriptor::Nodal(node) => node,
            ShapeFnDescriptor::Side { side, k } => {
                self.num_nodal(shape) + side * self.modes_per_side() + (k - 2) as usize
            }
            ShapeFnDescriptor::Interior { k, l } => {
                self.num_nodal(shape) + self.num_side(shape) + self.interior_index(shape, k, l)
            }
        }
    }

    /// The `(k, l)` pair of the `idx`'th interior mode
    pub fn interior_descriptor(&self, shape: ReferenceShape, idx: usize) -> (u32, u32) {
        assert!(
            idx < self.num_interior(shape),
            "Interior mode {} does not exist on a {:?} (p = {}, {} space)!",
            idx,
            shape,
            self.p,
            self.space
        );
        let p = self.p as usize;

        match (shape, self.space) {
            (ReferenceShape::Triangle, PolySpace::Product) => {
                ((idx / (p - 1)) as u32, (idx % (p - 1)) as u32)
            }
            (ReferenceShape::Square, PolySpace::Product) => {
                ((idx / (p - 1)) as u32 + 2, (idx % (p - 1)) as u32 + 2)
            }
            (ReferenceShape::Triangle, PolySpace::Trunk) => trunk_column(idx, p - 2, 0),
            (ReferenceShape::Square, PolySpace::Trunk) => trunk_column(idx, p - 3, 2),
        }
    }

    /// The position of the interior mode `(k, l)` among the interior modes
    pub fn interior_index(&self, shape: ReferenceShape, k: u32, l: u32) -> usize {
        assert!(
            self.contains_interior(shape, k, l),
            "Interior mode ({}, {}) does not exist on a {:?} (p = {}, {} space)!",
            k,
            l,
            shape,
            self.p,
            self.space
        );
        let p = self.p as usize;
        let (k, l) = (k as usize, l as usize);

        match (shape, self.space) {
            (ReferenceShape::Triangle, PolySpace::Product) => k * (p - 1) + l,
            (ReferenceShape::Square, PolySpace::Product) => (k - 2) * (p - 1) + l - 2,
            (ReferenceShape::Triangle, PolySpace::Trunk) => trunk_offset(k, p - 2) + l,
            (ReferenceShape::Square, PolySpace::Trunk) => trunk_offset(k - 2, p - 3) + l - 2,
        }
    }

    /// Check if a descriptor belongs to this shape, order and polynomial space
    pub fn contains(&self, shape: ReferenceShape, desc: &ShapeFnDescriptor) -> bool {
        match *desc {
            ShapeFnDescriptor::Nodal(node) => node < shape.num_nodes(),
            ShapeFnDescriptor::Side { side, k } => {
                side < shape.num_nodes() && (2..=self.p).contains(&k)
            }
            ShapeFnDescriptor::Interior { k, l } => self.contains_interior(shape, k, l),
        }
    }

    fn contains_interior(&self, shape: ReferenceShape, k: u32, l: u32) -> bool {
        let (p, k, l) = (self.p as i64, k as i64, l as i64);
        match (shape, self.space) {
            (ReferenceShape::Triangle, PolySpace::Product) => k <= p - 2 && l <= p - 2,
            (ReferenceShape::Triangle, PolySpace::Trunk) => k + l <= p - 3,
            (ReferenceShape::Square, PolySpace::Product) => (2..=p).contains(&k) && (2..=p).contains(&l),
            (ReferenceShape::Square, PolySpace::Trunk) => k >= 2 && l >= 2 && k + l <= p,
        }
    }

    /// All descriptors of a shape in local index order
    pub fn descriptors(&self, shape: ReferenceShape) -> impl Iterator<Item = ShapeFnDescriptor> + '_ {
        (0..self.num_shape_fns(shape)).map(move |idx| self.descriptor(shape, idx))
    }
}

// number of modes in the columns before column `col`, where column `i` has `first_height - i` modes
fn trunk_offset(col: usize, first_height: usize) -> usize {
    col * first_height - col * col.saturating_sub(1) / 2
}

// invert `trunk_offset`: find the column holding the `idx`'th mode
fn trunk_column(idx: usize, first_height: usize, first_degree: u32) -> (u32, u32) {
    let mut col_start = 0;
    for col in 0..first_height {
        let height = first_height - col;
        if idx < col_start + height {
            return (col as u32 + first_degree, (idx - col_start) as u32 + first_degree);
        }
        col_start += height;
    }
    unreachable!("interior index was checked against the number of interior modes")
}
