/// A Finite Element in real space (Triangle or Parallelogram)
pub mod element;
/// Reading meshes from the line based text format
pub mod io;
/// A line segment between two nodes
pub mod side;

use element::Element;
use io::{parse_mesh, MeshParseError};

use crate::math::space::{Point, Rational};

use itertools::Itertools;
use log::info;
use num_traits::Zero;
use smallvec::SmallVec;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[cfg(feature = "json_export")]
use crate::math::space::{parse_rational, point};
#[cfg(feature = "json_export")]
use json::{object, JsonValue};
#[cfg(feature = "json_export")]
use std::fs::read_to_string;
#[cfg(feature = "json_export")]
use std::io::BufWriter;

/// Per-element lists are at most 4 long (parallelograms)
type ElemList<T> = SmallVec<[T; 4]>;

/// A conforming mesh of triangles and parallelograms
///
/// Sides are numbered in the order they are first encountered while walking over the elements
/// (and their sides) in order. Two elements are adjacent exactly when they share a global side.
///
/// Construction panics if the mesh is not conforming: two elements may only meet at a single
/// common node or along a single full side.
#[derive(Debug, Clone)]
pub struct Mesh {
    nodes: Vec<Point>,
    elements: Vec<Element>,
    elem_nodes: Vec<ElemList<usize>>,
    elem_sides: Vec<ElemList<usize>>,
    adjacency: Vec<ElemList<Option<usize>>>,
    side_nodes: Vec<[usize; 2]>,
    contains_triangle: bool,
    contains_parallelogram: bool,
}

impl Mesh {
    /// Build a mesh from node coordinates and per-element (counter-clockwise) node index lists
    pub fn new(nodes: Vec<Point>, element_nodes: Vec<Vec<usize>>) -> Self {
        let elements: Vec<Element> = element_nodes
            .iter()
            .enumerate()
            .map(|(elem_id, node_ids)| {
                let points = node_ids
                    .iter()
                    .map(|node_id| {
                        assert!(
                            *node_id < nodes.len(),
                            "Element {} refers to node {}, but the mesh only has {} nodes!",
                            elem_id,
                            node_id,
                            nodes.len()
                        );
                        nodes[*node_id].clone()
                    })
                    .collect();
                Element::from_nodes(points)
            })
            .collect();

        let elem_nodes: Vec<ElemList<usize>> = element_nodes
            .into_iter()
            .map(|node_ids| node_ids.into_iter().collect())
            .collect();

        let contains_triangle = elements
            .iter()
            .any(|e| matches!(e, Element::Triangle(_)));
        let contains_parallelogram = elements
            .iter()
            .any(|e| matches!(e, Element::Parallelogram(_)));

        let mut mesh = Self {
            nodes,
            elements,
            elem_nodes,
            elem_sides: Vec::new(),
            adjacency: Vec::new(),
            side_nodes: Vec::new(),
            contains_triangle,
            contains_parallelogram,
        };

        mesh.assign_side_indices();
        mesh.assign_adjacency();
        mesh.validate_conformity();

        info!(
            "Built Mesh with {} nodes, {} sides and {} elements (triangles: {}, parallelograms: {})",
            mesh.nodes.len(),
            mesh.side_nodes.len(),
            mesh.elements.len(),
            mesh.contains_triangle,
            mesh.contains_parallelogram
        );

        mesh
    }

    /// Read a mesh in the line based text format (see [parse_mesh])
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MeshParseError> {
        let file = File::open(path.as_ref())?;
        let (nodes, elements) = parse_mesh(BufReader::new(file))?;
        Ok(Self::new(nodes, elements))
    }

    /// Read a mesh in the line based text format from any buffered reader
    pub fn from_reader(input: impl std::io::BufRead) -> Result<Self, MeshParseError> {
        let (nodes, elements) = parse_mesh(input)?;
        Ok(Self::new(nodes, elements))
    }

    /// Write the mesh to a JSON file with the following format
    ///
    /// ```JSON
    /// {
    ///     "Nodes": [["-1", "1"], ["-1", "0"], ["0", "1"]],
    ///     "Elements": [[0, 1, 2]]
    /// }
    /// ```
    ///
    /// Coordinates are stored as exact rational literals
    #[cfg(feature = "json_export")]
    pub fn export_to_json(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let f = File::create(path.as_ref())?;
        let mut w = BufWriter::new(&f);

        let mesh_object = object! {
            "Nodes": JsonValue::from(self.nodes.iter().map(|p| {
                JsonValue::from(vec![p[0].to_string(), p[1].to_string()])
            }).collect::<Vec<_>>()),
            "Elements": JsonValue::from(self.elem_nodes.iter().map(|node_ids| {
                JsonValue::from(node_ids.to_vec())
            }).collect::<Vec<_>>()),
        };

        mesh_object.write_pretty(&mut w, 4)?;

        Ok(())
    }

    /// Read a mesh written by [Mesh::export_to_json]
    #[cfg(feature = "json_export")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, MeshParseError> {
        let contents = read_to_string(path.as_ref())?;
        let mesh_json = json::parse(&contents)?;
        let (nodes, elements) = parse_json_mesh(&mesh_json)?;
        Ok(Self::new(nodes, elements))
    }

    // ----------------------------------------------------------------------------------------------------
    // Topology
    // ----------------------------------------------------------------------------------------------------

    fn assign_side_indices(&mut self) {
        let mut side_ids: BTreeMap<[usize; 2], usize> = BTreeMap::new();
        let mut elem_sides = Vec::with_capacity(self.elem_nodes.len());

        for node_ids in self.elem_nodes.iter() {
            let n = node_ids.len();
            let mut sides = ElemList::new();
            for i in 0..n {
                let (a, b) = (node_ids[i], node_ids[(i + 1) % n]);
                let next_id = side_ids.len();
                let side_id = match side_ids.entry([a.min(b), a.max(b)]) {
                    Entry::Occupied(entry) => *entry.get(),
                    Entry::Vacant(entry) => {
                        self.side_nodes.push([a, b]);
                        *entry.insert(next_id)
                    }
                };
                sides.push(side_id);
            }
            elem_sides.push(sides);
        }

        self.elem_sides = elem_sides;
    }

    fn assign_adjacency(&mut self) {
        let mut first_owner: BTreeMap<usize, usize> = BTreeMap::new();
        self.adjacency = self
            .elem_sides
            .iter()
            .map(|sides| smallvec::smallvec![None; sides.len()])
            .collect();

        for elem_id in 0..self.elem_sides.len() {
            for local_side in 0..self.elem_sides[elem_id].len() {
                let side_id = self.elem_sides[elem_id][local_side];
                match first_owner.entry(side_id) {
                    Entry::Vacant(entry) => {
                        entry.insert(elem_id);
                    }
                    Entry::Occupied(entry) => {
                        let neighbor = *entry.get();
                        let neighbor_local = self.local_side_index(neighbor, side_id);
                        assert!(
                            self.adjacency[neighbor][neighbor_local].is_none(),
                            "Side {} is shared by more than two elements!",
                            side_id
                        );
                        self.adjacency[neighbor][neighbor_local] = Some(elem_id);
                        self.adjacency[elem_id][local_side] = Some(neighbor);
                    }
                }
            }
        }
    }

    fn validate_conformity(&self) {
        for (i, j) in (0..self.elements.len()).tuple_combinations() {
            let (e1, e2) = (&self.elements[i], &self.elements[j]);
            assert!(
                !e1.are_intersecting(e2)
                    || e1.is_intersection_one_node(e2)
                    || e1.is_intersection_one_side(e2),
                "Elements {} and {} overlap; the Mesh is not conforming!",
                i,
                j
            );
        }
    }

    // ----------------------------------------------------------------------------------------------------
    // General Data Retrieval
    // ----------------------------------------------------------------------------------------------------

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_sides(&self) -> usize {
        self.side_nodes.len()
    }

    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    pub fn nodes(&self) -> &[Point] {
        &self.nodes
    }

    pub fn node(&self, node_id: usize) -> &Point {
        assert!(node_id < self.nodes.len(), "Node {} doesn't exist!", node_id);
        &self.nodes[node_id]
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn element(&self, elem_id: usize) -> &Element {
        assert!(elem_id < self.elements.len(), "Element {} doesn't exist!", elem_id);
        &self.elements[elem_id]
    }

    /// Global index of an element's local node
    pub fn global_node_index(&self, elem_id: usize, local_node: usize) -> usize {
        let node_ids = &self.elem_nodes[self.checked_elem(elem_id)];
        assert!(
            local_node < node_ids.len(),
            "Element {} has no local node {}!",
            elem_id,
            local_node
        );
        node_ids[local_node]
    }

    /// Global index of an element's local side
    pub fn global_side_index(&self, elem_id: usize, local_side: usize) -> usize {
        let side_ids = &self.elem_sides[self.checked_elem(elem_id)];
        assert!(
            local_side < side_ids.len(),
            "Element {} has no local side {}!",
            elem_id,
            local_side
        );
        side_ids[local_side]
    }

    /// The element on the other side of an element's local side (`None` on the mesh boundary)
    pub fn adjacent_element(&self, elem_id: usize, local_side: usize) -> Option<usize> {
        let neighbors = &self.adjacency[self.checked_elem(elem_id)];
        assert!(
            local_side < neighbors.len(),
            "Element {} has no local side {}!",
            elem_id,
            local_side
        );
        neighbors[local_side]
    }

    /// The two global nodes of a side, in the direction of the first element that referenced it
    pub fn side_nodes(&self, side_id: usize) -> [usize; 2] {
        assert!(side_id < self.side_nodes.len(), "Side {} doesn't exist!", side_id);
        self.side_nodes[side_id]
    }

    pub fn contains_triangle(&self) -> bool {
        self.contains_triangle
    }

    pub fn contains_parallelogram(&self) -> bool {
        self.contains_parallelogram
    }

    /// Index of the first element containing the point. Panics if the point is outside the Mesh.
    pub fn element_containing_point(&self, x: &Point) -> usize {
        self.elements
            .iter()
            .position(|element| element.contains_point(x))
            .unwrap_or_else(|| panic!("Point {:?} is outside the Mesh!", x))
    }

    /// All `(element, local side)` pairs without a neighboring element
    pub fn boundary(&self) -> Vec<(usize, usize)> {
        self.adjacency
            .iter()
            .enumerate()
            .flat_map(|(elem_id, neighbors)| {
                neighbors
                    .iter()
                    .enumerate()
                    .filter(|(_, neighbor)| neighbor.is_none())
                    .map(move |(local_side, _)| (elem_id, local_side))
            })
            .collect()
    }

    /// Check if an element's local side lies on the mesh boundary
    pub fn is_boundary_side(&self, elem_id: usize, local_side: usize) -> bool {
        self.adjacent_element(elem_id, local_side).is_none()
    }

    /// Total area covered by the Mesh
    pub fn area(&self) -> Rational {
        self.elements
            .iter()
            .fold(Rational::zero(), |acc, element| acc + element.area())
    }

    fn checked_elem(&self, elem_id: usize) -> usize {
        assert!(elem_id < self.elements.len(), "Element {} doesn't exist!", elem_id);
        elem_id
    }

    fn local_side_index(&self, elem_id: usize, side_id: usize) -> usize {
        self.elem_sides[elem_id]
            .iter()
            .position(|s| *s == side_id)
            .unwrap_or_else(|| panic!("Element {} does not have side {}!", elem_id, side_id))
    }
}

// ----------------------------------------------------------------------------------------------------
// JSON parsing
// ----------------------------------------------------------------------------------------------------

#[cfg(feature = "json_export")]
fn parse_json_mesh(mesh_json: &JsonValue) -> Result<io::RawMesh, MeshParseError> {
    let structure = |msg: &str| MeshParseError::JsonStructure(msg.to_string());

    if !mesh_json["Nodes"].is_array() {
        return Err(structure("Nodes must be an Array!"));
    }
    if !mesh_json["Elements"].is_array() {
        return Err(structure("Elements must be an Array!"));
    }

    let nodes = mesh_json["Nodes"]
        .members()
        .map(|json_node| {
            if !json_node.is_array() || json_node.members().count() != 2 {
                return Err(structure("Nodes must be arrays of length 2!"));
            }
            let coordinate = |c: &JsonValue| {
                let literal = c
                    .as_str()
                    .ok_or_else(|| structure("Node coordinates must be rational literal strings!"))?;
                parse_rational(literal).map_err(|source| MeshParseError::Coordinate {
                    line_number: 0,
                    source,
                })
            };
            Ok(point(coordinate(&json_node[0])?, coordinate(&json_node[1])?))
        })
        .collect::<Result<Vec<Point>, _>>()?;

    let elements = mesh_json["Elements"]
        .members()
        .map(|json_element| {
            if !json_element.is_array() {
                return Err(structure("Elements must be arrays of node indices!"));
            }
            json_element
                .members()
                .map(|id| {
                    id.as_usize()
                        .ok_or_else(|| structure("Node indices must be non-negative integers!"))
                })
                .collect::<Result<Vec<usize>, _>>()
        })
        .collect::<Result<Vec<Vec<usize>>, _>>()?;

    io::validate_raw_mesh(&nodes, &elements)?;
    Ok((nodes, elements))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::math::space::{frac, int, point};

    pub(crate) fn fixture_nodes() -> Vec<Point> {
        vec![
            point(int(-1), int(1)),
            point(int(-1), int(0)),
            point(int(0), int(1)),
            point(int(0), int(0)),
            point(int(-1), int(-1)),
            point(int(0), int(-1)),
            point(frac(1, 2), int(-1)),
            point(int(1), frac(-1, 2)),
            point(int(1), int(0)),
            point(int(1), frac(1, 2)),
            point(frac(1, 2), int(0)),
            point(frac(1, 2), frac(-1, 2)),
        ]
    }

    pub(crate) fn fixture_elements() -> Vec<Vec<usize>> {
        vec![
            vec![0, 1, 2],
            vec![1, 3, 2],
            vec![1, 4, 5, 3],
            vec![11, 10, 3],
            vec![3, 5, 11],
            vec![6, 11, 5],
            vec![6, 7, 8, 11],
            vec![9, 10, 11, 8],
        ]
    }

    /// The 8 element mixed Mesh used throughout the tests
    pub(crate) fn fixture_mesh() -> Mesh {
        Mesh::new(fixture_nodes(), fixture_elements())
    }

    /// The 2 element Mesh: a triangle sharing a side with a parallelogram
    pub(crate) fn two_element_mesh() -> Mesh {
        Mesh::new(
            vec![
                point(int(1), int(0)),
                point(int(2), int(1)),
                point(int(2), int(3)),
                point(int(0), int(3)),
                point(int(1), int(2)),
            ],
            vec![vec![2, 3, 4], vec![1, 2, 4, 0]],
        )
    }

    /// 2 parallelograms and 2 triangles around the origin
    pub(crate) fn four_element_mesh() -> Mesh {
        Mesh::new(
            vec![
                point(int(0), int(-1)),
                point(int(1), int(-1)),
                point(int(1), int(0)),
                point(int(0), int(1)),
                point(int(-1), int(1)),
                point(int(-1), int(0)),
                point(int(0), int(0)),
            ],
            vec![vec![0, 1, 2, 6], vec![2, 3, 6], vec![3, 4, 5, 6], vec![6, 5, 0]],
        )
    }

    #[test]
    fn counts() {
        let mesh = fixture_mesh();
        assert_eq!(mesh.num_nodes(), 12);
        assert_eq!(mesh.num_sides(), 19);
        assert_eq!(mesh.num_elements(), 8);
        assert!(mesh.contains_triangle());
        assert!(mesh.contains_parallelogram());
    }

    #[test]
    fn global_node_indices() {
        let mesh = fixture_mesh();
        for (elem_id, node_ids) in fixture_elements().iter().enumerate() {
            for (local, node_id) in node_ids.iter().enumerate() {
                assert_eq!(mesh.global_node_index(elem_id, local), *node_id);
            }
        }
    }

    #[test]
    fn global_side_indices() {
        let mesh = fixture_mesh();
        let expected = [
            ((1, 0), 3),
            ((1, 1), 4),
            ((1, 2), 1),
            ((4, 0), 7),
            ((4, 1), 11),
            ((4, 2), 10),
            ((7, 0), 17),
            ((7, 1), 8),
            ((7, 2), 16),
            ((7, 3), 18),
        ];
        for ((elem_id, local), side_id) in expected {
            assert_eq!(mesh.global_side_index(elem_id, local), side_id);
        }
        assert_eq!(mesh.side_nodes(0), [0, 1]);
        assert_eq!(mesh.side_nodes(1), [1, 2]);
        assert_eq!(mesh.side_nodes(3), [1, 3]);
    }

    #[test]
    fn elements() {
        let mesh = fixture_mesh();
        let nodes = fixture_nodes();
        for (elem_id, node_ids) in fixture_elements().into_iter().enumerate() {
            let points = node_ids.iter().map(|id| nodes[*id].clone()).collect();
            assert_eq!(mesh.element(elem_id), &Element::from_nodes(points));
        }
    }

    #[test]
    fn adjacency() {
        let mesh = fixture_mesh();
        let expected = [
            ((0, 0), None),
            ((0, 1), Some(1)),
            ((0, 2), None),
            ((4, 0), Some(2)),
            ((4, 1), Some(5)),
            ((4, 2), Some(3)),
            ((6, 0), None),
            ((6, 1), None),
            ((6, 2), Some(7)),
            ((6, 3), Some(5)),
        ];
        for ((elem_id, local), neighbor) in expected {
            assert_eq!(mesh.adjacent_element(elem_id, local), neighbor);
        }
    }

    #[test]
    fn point_location() {
        let mesh = fixture_mesh();
        assert_eq!(mesh.element_containing_point(&point(frac(3, 4), int(0))), 7);
        assert_eq!(mesh.element_containing_point(&point(int(0), frac(-1, 2))), 2);
        assert_eq!(mesh.element_containing_point(&point(frac(1, 2), frac(-1, 2))), 3);
    }

    #[test]
    #[should_panic]
    fn point_outside_mesh() {
        fixture_mesh().element_containing_point(&point(int(2), int(2)));
    }

    #[test]
    fn boundary() {
        let mesh = fixture_mesh();
        assert_eq!(
            mesh.boundary(),
            vec![
                (0, 0),
                (0, 2),
                (1, 1),
                (2, 0),
                (2, 1),
                (3, 1),
                (5, 2),
                (6, 0),
                (6, 1),
                (7, 0),
                (7, 3)
            ]
        );
        assert!(mesh.is_boundary_side(0, 0));
        assert!(!mesh.is_boundary_side(0, 1));
    }

    #[test]
    fn area() {
        assert_eq!(fixture_mesh().area(), int(3));
        assert_eq!(four_element_mesh().area(), int(3));
        assert_eq!(two_element_mesh().area(), int(3));
    }

    #[test]
    #[should_panic]
    fn overlapping_elements() {
        let mut nodes = fixture_nodes();
        let mut elements = fixture_elements();
        let s = nodes.len();
        nodes.push(point(frac(-3, 4), frac(3, 4)));
        elements.push(vec![2, 0, s]);
        Mesh::new(nodes, elements);
    }

    #[test]
    #[should_panic]
    fn partially_shared_side() {
        let mut nodes = fixture_nodes();
        let mut elements = fixture_elements();
        let s = nodes.len();
        nodes.push(point(frac(-1, 2), int(0)));
        nodes.push(point(frac(-1, 2), int(-1)));
        elements.remove(2);
        elements.push(vec![s + 1, s, 1, 4]);
        elements.push(vec![s, s + 1, 5, 3]);
        Mesh::new(nodes, elements);
    }

    #[test]
    fn from_text() {
        let input = "n 0 0\nn 1 0\nn 1 1\nn 0 1\ne 0 1 2\ne 0 2 3\n";
        let mesh = Mesh::from_reader(input.as_bytes()).unwrap();
        assert_eq!(mesh.num_elements(), 2);
        assert_eq!(mesh.num_sides(), 5);
        assert_eq!(mesh.adjacent_element(0, 2), Some(1));
        assert_eq!(mesh.area(), int(1));
        assert!(!mesh.contains_parallelogram());
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            Mesh::from_file("./no/such/mesh.txt"),
            Err(MeshParseError::Io(_))
        ));
    }

    #[cfg(feature = "json_export")]
    #[test]
    fn json_round_trip() {
        let mesh = fixture_mesh();
        let path = std::env::temp_dir().join("pfem_2d_fixture_mesh.json");
        mesh.export_to_json(&path).unwrap();

        let copy = Mesh::from_json_file(&path).unwrap();
        assert_eq!(copy.nodes(), mesh.nodes());
        assert_eq!(copy.elements(), mesh.elements());
        assert_eq!(copy.boundary(), mesh.boundary());
    }

    #[cfg(feature = "json_export")]
    #[test]
    fn malformed_json_mesh() {
        let bad = json::parse(r#"{"Nodes": [["0", "0"]], "Elements": [[0, 1]]}"#).unwrap();
        assert!(parse_json_mesh(&bad).is_err());

        let bad = json::parse(r#"{"Nodes": [[0, 0]], "Elements": []}"#).unwrap();
        assert!(matches!(
            parse_json_mesh(&bad),
            Err(MeshParseError::JsonStructure(_))
        ));
    }
}
