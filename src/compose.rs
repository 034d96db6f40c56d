//! Composition driver
//!
//! Samples one element per layer, in layer order. Repeated combinations
//! across editions are allowed.

use rand::Rng;
use tracing::debug;

use crate::catalog::{Element, Layer, LayerCatalog, RarityWeights};
use crate::error::Result;
use crate::metadata::Attribute;
use crate::sampler::WeightedPool;

/// Element chosen for one layer
#[derive(Debug, Clone, Copy)]
pub struct LayerChoice<'a> {
    pub layer: &'a Layer,
    pub element: &'a Element,
}

/// Result of composing one edition
#[derive(Debug, Clone)]
pub struct Composition<'a> {
    pub edition: u32,
    /// One per layer, in layer order
    pub attributes: Vec<Attribute>,
    /// Parallel to `attributes`
    pub choices: Vec<LayerChoice<'a>>,
}

/// Holds one weighted pool per catalog layer
#[derive(Debug, Clone)]
pub struct Composer<'a> {
    layers: &'a [Layer],
    pools: Vec<WeightedPool<'a>>,
}

impl<'a> Composer<'a> {
    /// Fails with `EmptyPool` if any layer has no elements.
    pub fn new(catalog: &'a LayerCatalog, weights: &RarityWeights) -> Result<Self> {
        let layers = catalog.layers();
        let pools = layers
            .iter()
            .map(|layer| WeightedPool::new(&layer.name, &layer.elements, weights))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { layers, pools })
    }

    pub fn compose<R: Rng + ?Sized>(&self, edition: u32, rng: &mut R) -> Composition<'a> {
        let mut attributes = Vec::with_capacity(self.layers.len());
        let mut choices = Vec::with_capacity(self.layers.len());

        for (layer, pool) in self.layers.iter().zip(&self.pools) {
            let element = pool.sample(rng);
            debug!(
                "#{} layer '{}': {} ({})",
                edition, layer.name, element.name, element.tier
            );
            attributes.push(Attribute::new(&layer.name, &element.name));
            choices.push(LayerChoice { layer, element });
        }

        Composition {
            edition,
            attributes,
            choices,
        }
    }

    pub fn pools(&self) -> impl Iterator<Item = (&'a Layer, &WeightedPool<'a>)> + '_ {
        self.layers.iter().zip(self.pools.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RarityTier;
    use crate::config::{Position, Size};
    use crate::error::LayermintError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::path::PathBuf;

    fn layer(id: u32, name: &str, elements: &[(&str, RarityTier)]) -> Layer {
        Layer {
            id,
            name: name.to_string(),
            source_dir: PathBuf::from(name),
            position: Position::default(),
            size: Size { width: 8, height: 8 },
            elements: elements
                .iter()
                .enumerate()
                .map(|(i, (n, t))| Element {
                    id: i + 1,
                    name: n.to_string(),
                    file_name: format!("{}{}.png", n, t.suffix()),
                    path: PathBuf::from(name).join(format!("{}{}.png", n, t.suffix())),
                    tier: *t,
                })
                .collect(),
        }
    }

    fn sample_catalog() -> LayerCatalog {
        LayerCatalog::new(vec![
            layer(2, "hat", &[("hat1", RarityTier::Original), ("hat2", RarityTier::Rare)]),
            layer(1, "background", &[("bg1", RarityTier::Original), ("bg2", RarityTier::Original)]),
        ])
    }

    #[test]
    fn test_one_attribute_per_layer_in_order() {
        let catalog = sample_catalog();
        let composer = Composer::new(&catalog, &RarityWeights::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        let items: Vec<_> = (1..=25).map(|n| composer.compose(n, &mut rng)).collect();
        assert_eq!(items.len(), 25);

        for (i, item) in items.iter().enumerate() {
            assert_eq!(item.edition, i as u32 + 1);
            let traits: Vec<_> = item.attributes.iter().map(|a| a.trait_type.as_str()).collect();
            assert_eq!(traits, vec!["background", "hat"]);
            for (attr, choice) in item.attributes.iter().zip(&item.choices) {
                assert_eq!(attr.value, choice.element.name);
                assert_eq!(attr.trait_type, choice.layer.name);
            }
        }
    }

    #[test]
    fn test_repeated_combinations_allowed() {
        let catalog = LayerCatalog::new(vec![layer(1, "only", &[("solo", RarityTier::Original)])]);
        let composer = Composer::new(&catalog, &RarityWeights::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        let a = composer.compose(1, &mut rng);
        let b = composer.compose(2, &mut rng);
        assert_eq!(a.attributes, b.attributes);
    }

    #[test]
    fn test_empty_layer_is_fatal() {
        let catalog = LayerCatalog::new(vec![
            layer(1, "background", &[("bg1", RarityTier::Original)]),
            layer(2, "hat", &[]),
        ]);
        match Composer::new(&catalog, &RarityWeights::default()) {
            Err(LayermintError::EmptyPool { layer }) => assert_eq!(layer, "hat"),
            other => panic!("expected EmptyPool, got {:?}", other.map(|_| ())),
        }
    }
}
