use super::descriptor::ShapeFnDescriptor;
use super::shape_fn_factory::ShapeFnFactory;
use crate::math::space::{Point, Rational, ReferenceShape};

use log::debug;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};

type PointKey = (Rational, Rational);
type PointValues = BTreeMap<PointKey, Rational>;

/// Evaluates shape functions at points of a reference shape, remembering every value it computes
///
/// Useful when a discrete solution is sampled repeatedly at the same points (e.g. on a plotting
/// grid); [ShapeFnEvaluator::pre_evaluate] fills the cache for a whole batch of points at once.
pub struct ShapeFnEvaluator<'f> {
    factory: &'f ShapeFnFactory,
    triangle: HashMap<ShapeFnDescriptor, PointValues>,
    square: HashMap<ShapeFnDescriptor, PointValues>,
}

impl<'f> ShapeFnEvaluator<'f> {
    pub fn new(factory: &'f ShapeFnFactory) -> Self {
        Self {
            factory,
            triangle: HashMap::new(),
            square: HashMap::new(),
        }
    }

    pub fn factory(&self) -> &'f ShapeFnFactory {
        self.factory
    }

    /// Value of a shape function at a point in reference coordinates
    pub fn evaluate(&mut self, shape: ReferenceShape, desc: &ShapeFnDescriptor, x: &Point) -> Rational {
        let factory = self.factory;
        self.cache_mut(shape)
            .entry(*desc)
            .or_default()
            .entry(point_key(x))
            .or_insert_with(|| factory.shape_fn(shape, desc).evaluate(x))
            .clone()
    }

    /// Evaluate every built shape function of a reference shape at each of the points
    pub fn pre_evaluate(&mut self, shape: ReferenceShape, points: &[Point]) {
        let factory = self.factory;
        let keys: Vec<PointKey> = points.iter().map(point_key).collect();

        let values: Vec<(ShapeFnDescriptor, Vec<Rational>)> = factory
            .shape_fns(shape)
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|(desc, f)| (*desc, points.iter().map(|x| f.evaluate(x)).collect()))
            .collect();

        debug!(
            "Pre-evaluated {} shape functions on the reference {:?} at {} points",
            values.len(),
            shape,
            points.len()
        );

        let cache = self.cache_mut(shape);
        for (desc, desc_values) in values {
            cache
                .entry(desc)
                .or_default()
                .extend(keys.iter().cloned().zip(desc_values));
        }
    }

    /// Number of cached values for a reference shape
    pub fn num_cached(&self, shape: ReferenceShape) -> usize {
        let cache = match shape {
            ReferenceShape::Triangle => &self.triangle,
            ReferenceShape::Square => &self.square,
        };
        cache.values().map(|values| values.len()).sum()
    }

    fn cache_mut(&mut self, shape: ReferenceShape) -> &mut HashMap<ShapeFnDescriptor, PointValues> {
        match shape {
            ReferenceShape::Triangle => &mut self.triangle,
            ReferenceShape::Square => &mut self.square,
        }
    }
}

fn point_key(x: &Point) -> PointKey {
    (x[0].clone(), x[1].clone())
}
