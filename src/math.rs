/// Exact rational scalars, points, and 2x2 matrices
pub mod space;
/// Exact univariate and bivariate polynomials
pub mod polynomial;
/// Invertible affine maps of the plane
pub mod affine_map;
/// Gauss-Legendre quadrature on intervals and reference elements
pub mod quadrature;
