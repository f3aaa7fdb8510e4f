/// The geometric and topological structure of a problem domain
pub mod mesh;

pub use mesh::{element::Element, side::Side, Mesh};
