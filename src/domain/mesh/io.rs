use crate::math::space::{parse_rational, point, Point, RationalParseError};

use std::io::BufRead;
use thiserror::Error;

/// Problems encountered while reading a mesh description
#[derive(Debug, Error)]
pub enum MeshParseError {
    #[error("unable to read mesh: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line_number}: expected 'n <x> <y>' or 'e <i0> <i1> <i2> [<i3>]', found '{line}'")]
    UnknownLine { line_number: usize, line: String },
    #[error("line {line_number}: invalid node coordinate")]
    Coordinate {
        line_number: usize,
        #[source]
        source: RationalParseError,
    },
    #[error("line {line_number}: '{token}' is not a node index")]
    NodeIndex { line_number: usize, token: String },
    #[error("element {element} has {count} nodes; elements must have 3 or 4")]
    ElementArity { element: usize, count: usize },
    #[error("element {element} refers to node {node}, but there are only {num_nodes} nodes")]
    MissingNode {
        element: usize,
        node: usize,
        num_nodes: usize,
    },
    #[error("invalid JSON mesh: {0}")]
    Json(#[from] json::Error),
    #[error("invalid JSON mesh structure: {0}")]
    JsonStructure(String),
}

/// Node coordinates and per-element node index lists, as read from a mesh description
pub type RawMesh = (Vec<Point>, Vec<Vec<usize>>);

/// Parse the line based mesh format
///
/// ```text
/// n -1 -1
/// n 1/3 -1
/// n 1/3 10
/// n -1 10
/// e 0 1 2 3
/// ```
///
/// `n <x> <y>` declares the next node with exact rational coordinates. `e <i0> <i1> <i2> [<i3>]`
/// declares a triangle or parallelogram by its counter-clockwise node indices. Blank lines are
/// skipped; anything else is an error.
pub fn parse_mesh(input: impl BufRead) -> Result<RawMesh, MeshParseError> {
    let mut nodes = Vec::new();
    let mut elements = Vec::new();

    for (line_idx, line) in input.lines().enumerate() {
        let line = line?;
        let line_number = line_idx + 1;
        let tokens: Vec<&str> = line.split_whitespace().collect();

        match tokens.as_slice() {
            [] => continue,
            ["n", x, y] => {
                let coordinate = |literal: &str| {
                    parse_rational(literal)
                        .map_err(|source| MeshParseError::Coordinate { line_number, source })
                };
                nodes.push(point(coordinate(*x)?, coordinate(*y)?));
            }
            ["e", indices @ ..] if !indices.is_empty() => {
                let node_ids = indices
                    .iter()
                    .map(|token| {
                        token.parse::<usize>().map_err(|_| MeshParseError::NodeIndex {
                            line_number,
                            token: token.to_string(),
                        })
                    })
                    .collect::<Result<Vec<usize>, _>>()?;
                elements.push(node_ids);
            }
            _ => {
                return Err(MeshParseError::UnknownLine {
                    line_number,
                    line: line.clone(),
                })
            }
        }
    }

    validate_raw_mesh(&nodes, &elements)?;
    Ok((nodes, elements))
}

/// Check element arities and node references of a raw mesh
pub fn validate_raw_mesh(nodes: &[Point], elements: &[Vec<usize>]) -> Result<(), MeshParseError> {
    for (element, node_ids) in elements.iter().enumerate() {
        if !(3..=4).contains(&node_ids.len()) {
            return Err(MeshParseError::ElementArity {
                element,
                count: node_ids.len(),
            });
        }
        if let Some(node) = node_ids.iter().find(|id| **id >= nodes.len()) {
            return Err(MeshParseError::MissingNode {
                element,
                node: *node,
                num_nodes: nodes.len(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::space::{frac, int};

    #[test]
    fn mesh_file() {
        let input = "n -1 -1\nn 1/3 -1\nn 1/3 10\n\nn -1 10\n  n -1/3 101/10  \ne 0 1 2 3\ne 2 4 3\n";
        let (nodes, elements) = parse_mesh(input.as_bytes()).unwrap();

        assert_eq!(
            nodes,
            vec![
                point(int(-1), int(-1)),
                point(frac(1, 3), int(-1)),
                point(frac(1, 3), int(10)),
                point(int(-1), int(10)),
                point(frac(-1, 3), frac(101, 10)),
            ]
        );
        assert_eq!(elements, vec![vec![0, 1, 2, 3], vec![2, 4, 3]]);
    }

    #[test]
    fn malformed_lines() {
        assert!(matches!(
            parse_mesh("n 1 2\nq 1 2\n".as_bytes()),
            Err(MeshParseError::UnknownLine { line_number: 2, .. })
        ));
        assert!(matches!(
            parse_mesh("n 1\n".as_bytes()),
            Err(MeshParseError::UnknownLine { line_number: 1, .. })
        ));
        assert!(matches!(
            parse_mesh("n 1 x\n".as_bytes()),
            Err(MeshParseError::Coordinate { line_number: 1, .. })
        ));
        assert!(matches!(
            parse_mesh("n 1 1/0\n".as_bytes()),
            Err(MeshParseError::Coordinate { .. })
        ));
        assert!(matches!(
            parse_mesh("e 0 -1 2\n".as_bytes()),
            Err(MeshParseError::NodeIndex { .. })
        ));
        assert!(matches!(parse_mesh("e\n".as_bytes()), Err(MeshParseError::UnknownLine { .. })));
    }

    #[test]
    fn invalid_element_definitions() {
        assert!(matches!(
            parse_mesh("n 0 0\nn 1 0\ne 0 1\n".as_bytes()),
            Err(MeshParseError::ElementArity { element: 0, count: 2 })
        ));
        assert!(matches!(
            parse_mesh("n 0 0\nn 1 0\nn 0 1\ne 0 1 3\n".as_bytes()),
            Err(MeshParseError::MissingNode { element: 0, node: 3, num_nodes: 3 })
        ));
    }
}
