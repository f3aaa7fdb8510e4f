use super::descriptor::{BasisFnDescriptor, ShapeFnDescriptor};
use super::shape_fn_factory::ShapeFnFactory;
use super::shape_fn_indexer::ShapeFnIndexer;
use super::FemContext;
use crate::domain::mesh::Mesh;
use crate::math::polynomial::{Polynomial2D, Var};
use crate::math::space::Rational;

use log::debug;

/// Check if a shape function has to be negated on an element to stay continuous across a side
///
/// Both elements of a shared side traverse it counter-clockwise, so they see it in opposite
/// directions. Side modes with odd `k` are odd in the side parameter; the element whose neighbor
/// across the side has the larger index negates them. Boundary sides are never reversed.
pub fn is_reversed(mesh: &Mesh, elem_id: usize, desc: &ShapeFnDescriptor) -> bool {
    match desc.side_mode() {
        Some((local_side, k)) if k % 2 == 1 => mesh
            .adjacent_element(elem_id, local_side)
            .map_or(false, |neighbor| elem_id < neighbor),
        _ => false,
    }
}

/// Apply the orientation of [is_reversed] to a value
pub fn oriented(value: Rational, reversed: bool) -> Rational {
    if reversed {
        -value
    } else {
        value
    }
}

/// One shape function of an element, together with its global index and orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalBasisFn {
    pub local: usize,
    pub desc: ShapeFnDescriptor,
    pub global: usize,
    pub reversed: bool,
}

/// Bijection between global basis function indices `[0, N)` and [BasisFnDescriptor]s
///
/// Layout:
/// * `[0, V)`: nodal functions, by global node index
/// * `[V, V + S(p-1))`: side functions, by global side index and then `k = 2..=p`
/// * the rest: interior functions, by element and then the element's interior mode order
#[derive(Debug, Clone)]
pub struct BasisFnIndexer<'m> {
    mesh: &'m Mesh,
    sfi: ShapeFnIndexer,
    num_nodal: usize,
    num_side: usize,
    /// `interior_offsets[e]`: number of interior functions on the elements before `e`
    interior_offsets: Vec<usize>,
}

impl<'m> BasisFnIndexer<'m> {
    pub fn new(ctx: &FemContext<'m>) -> Self {
        let mesh = ctx.mesh;
        let sfi = ShapeFnIndexer::from_context(ctx);

        let mut interior_offsets = Vec::with_capacity(mesh.num_elements() + 1);
        interior_offsets.push(0);
        for element in mesh.elements() {
            let prev = interior_offsets[interior_offsets.len() - 1];
            interior_offsets.push(prev + sfi.num_interior(element.reference_shape()));
        }

        let indexer = Self {
            mesh,
            sfi,
            num_nodal: mesh.num_nodes(),
            num_side: mesh.num_sides() * sfi.modes_per_side(),
            interior_offsets,
        };

        debug!(
            "Indexed {} basis functions (p = {}, {} space): {} nodal, {} side, {} interior",
            indexer.num_basis_fns(),
            sfi.p(),
            sfi.space(),
            indexer.num_nodal,
            indexer.num_side,
            indexer.num_interior()
        );

        indexer
    }

    pub fn mesh(&self) -> &'m Mesh {
        self.mesh
    }

    pub fn shape_fn_indexer(&self) -> &ShapeFnIndexer {
        &self.sfi
    }

    pub fn num_basis_fns(&self) -> usize {
        self.num_nodal + self.num_side + self.num_interior()
    }

    fn num_interior(&self) -> usize {
        self.interior_offsets[self.interior_offsets.len() - 1]
    }

    pub fn num_elements(&self) -> usize {
        self.mesh.num_elements()
    }

    pub fn num_shape_fns(&self, elem_id: usize) -> usize {
        self.sfi
            .num_shape_fns(self.mesh.element(elem_id).reference_shape())
    }

    pub fn shape_fn_descriptor(&self, elem_id: usize, local: usize) -> ShapeFnDescriptor {
        self.sfi
            .descriptor(self.mesh.element(elem_id).reference_shape(), local)
    }

    /// The global index of an element's local shape function
    pub fn basis_fn_index(&self, elem_id: usize, local: usize) -> usize {
        self.index(&self.descriptor_of(elem_id, local))
    }

    /// The global descriptor of an element's local shape function
    pub fn descriptor_of(&self, elem_id: usize, local: usize) -> BasisFnDescriptor {
        match self.shape_fn_descriptor(elem_id, local) {
            ShapeFnDescriptor::Nodal(node) => {
                BasisFnDescriptor::Nodal(self.mesh.global_node_index(elem_id, node))
            }
            ShapeFnDescriptor::Side { side, k } => BasisFnDescriptor::Side {
                side: self.mesh.global_side_index(elem_id, side),
                k,
            },
            ShapeFnDescriptor::Interior { k, l } => BasisFnDescriptor::Interior {
                elem: elem_id,
                k,
                l,
            },
        }
    }

    /// Every shape function of an element with its global index and orientation
    pub fn local_basis_fns(&self, elem_id: usize) -> Vec<LocalBasisFn> {
        (0..self.num_shape_fns(elem_id))
            .map(|local| {
                let desc = self.shape_fn_descriptor(elem_id, local);
                LocalBasisFn {
                    local,
                    desc,
                    global: self.basis_fn_index(elem_id, local),
                    reversed: is_reversed(self.mesh, elem_id, &desc),
                }
            })
            .collect()
    }

    pub fn index(&self, desc: &BasisFnDescriptor) -> usize {
        assert!(
            self.contains(desc),
            "{} is not a basis function of this Mesh (p = {}, {} space)!",
            desc,
            self.sfi.p(),
            self.sfi.space()
        );

        match *desc {
            BasisFnDescriptor::Nodal(node) => node,
            BasisFnDescriptor::Side { side, k } => {
                self.num_nodal + side * self.sfi.modes_per_side() + (k - 2) as usize
            }
            BasisFnDescriptor::Interior { elem, k, l } => {
                let shape = self.mesh.element(elem).reference_shape();
                self.num_nodal
                    + self.num_side
                    + self.interior_offsets[elem]
                    + self.sfi.interior_index(shape, k, l)
            }
        }
    }

    pub fn descriptor(&self, idx: usize) -> BasisFnDescriptor {
        assert!(
            idx < self.num_basis_fns(),
            "Basis function {} does not exist; there are only {}!",
            idx,
            self.num_basis_fns()
        );

        if idx < self.num_nodal {
            return BasisFnDescriptor::Nodal(idx);
        }

        let side_idx = idx - self.num_nodal;
        if side_idx < self.num_side {
            let modes = self.sfi.modes_per_side();
            return BasisFnDescriptor::Side {
                side: side_idx / modes,
                k: (side_idx % modes) as u32 + 2,
            };
        }

        let interior_idx = side_idx - self.num_side;
        let elem = self.interior_offsets.partition_point(|offset| *offset <= interior_idx) - 1;
        let shape = self.mesh.element(elem).reference_shape();
        let (k, l) = self
            .sfi
            .interior_descriptor(shape, interior_idx - self.interior_offsets[elem]);
        BasisFnDescriptor::Interior { elem, k, l }
    }

    /// Check if a descriptor is part of this layout
    pub fn contains(&self, desc: &BasisFnDescriptor) -> bool {
        match *desc {
            BasisFnDescriptor::Nodal(node) => node < self.mesh.num_nodes(),
            BasisFnDescriptor::Side { side, k } => {
                side < self.mesh.num_sides() && (2..=self.sfi.p()).contains(&k)
            }
            BasisFnDescriptor::Interior { elem, k, l } => {
                elem < self.mesh.num_elements()
                    && self.sfi.contains(
                        self.mesh.element(elem).reference_shape(),
                        &ShapeFnDescriptor::Interior { k, l },
                    )
            }
        }
    }

    /// An element's local shape function with the side orientation applied
    pub fn shape_fn(&self, elem_id: usize, local: usize, factory: &ShapeFnFactory) -> Polynomial2D {
        let desc = self.shape_fn_descriptor(elem_id, local);
        let shape = self.mesh.element(elem_id).reference_shape();
        let f = factory.shape_fn(shape, &desc);
        if is_reversed(self.mesh, elem_id, &desc) {
            -f
        } else {
            f.clone()
        }
    }

    /// A partial derivative of an element's local shape function with the side orientation applied
    pub fn shape_fn_derivative(
        &self,
        elem_id: usize,
        local: usize,
        var: Var,
        factory: &ShapeFnFactory,
    ) -> Polynomial2D {
        let desc = self.shape_fn_descriptor(elem_id, local);
        let shape = self.mesh.element(elem_id).reference_shape();
        let df = factory.shape_fn_derivative(shape, &desc, var);
        if is_reversed(self.mesh, elem_id, &desc) {
            -df
        } else {
            df.clone()
        }
    }
}
