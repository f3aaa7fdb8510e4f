use std::fmt;

/// Identifies one shape function on a reference shape, independent of any Mesh
///
/// Sides are indexed locally (side `i` runs from node `i` to node `i + 1`). `k >= 2` is the
/// polynomial order of a side mode; `(k, l)` index an interior mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShapeFnDescriptor {
    Nodal(usize),
    Side { side: usize, k: u32 },
    Interior { k: u32, l: u32 },
}

/// Identifies one global basis function (degree of freedom) of a Mesh
///
/// Shape functions of neighboring elements which describe the same node or side map onto the same
/// descriptor. Interior descriptors always belong to exactly one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BasisFnDescriptor {
    Nodal(usize),
    Side { side: usize, k: u32 },
    Interior { elem: usize, k: u32, l: u32 },
}

impl ShapeFnDescriptor {
    /// The side mode order, if this is a side mode
    pub fn side_mode(&self) -> Option<(usize, u32)> {
        match self {
            Self::Side { side, k } => Some((*side, *k)),
            _ => None,
        }
    }
}

impl fmt::Display for ShapeFnDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Nodal(node) => write!(f, "Nodal({})", node),
            Self::Side { side, k } => write!(f, "Side({}, k={})", side, k),
            Self::Interior { k, l } => write!(f, "Interior(k={}, l={})", k, l),
        }
    }
}

impl fmt::Display for BasisFnDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Nodal(node) => write!(f, "Nodal({})", node),
            Self::Side { side, k } => write!(f, "Side({}, k={})", side, k),
            Self::Interior { elem, k, l } => write!(f, "Interior(elem={}, k={}, l={})", elem, k, l),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_modes() {
        assert_eq!(ShapeFnDescriptor::Side { side: 2, k: 3 }.side_mode(), Some((2, 3)));
        assert_eq!(ShapeFnDescriptor::Nodal(1).side_mode(), None);
        assert_eq!(ShapeFnDescriptor::Interior { k: 0, l: 1 }.side_mode(), None);
    }

    #[test]
    fn ordering_and_display() {
        let mut descs = vec![
            ShapeFnDescriptor::Interior { k: 0, l: 0 },
            ShapeFnDescriptor::Side { side: 1, k: 2 },
            ShapeFnDescriptor::Nodal(2),
        ];
        descs.sort();
        assert_eq!(descs[0], ShapeFnDescriptor::Nodal(2));
        assert_eq!(descs[2].to_string(), "Interior(k=0, l=0)");
        assert_eq!(
            BasisFnDescriptor::Interior { elem: 3, k: 2, l: 2 }.to_string(),
            "Interior(elem=3, k=2, l=2)"
        );
    }
}
