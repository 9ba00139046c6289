use crate::activation::ActivationFn;
use crate::error::{check_len, Error, Result};
use crate::matrix::{Matrix, MatrixBase};
use crate::net::{validate_topology, Layer, Model};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const FORMAT_VERSION: u32 = 1;

/// Learned parameters of a [`Model`], without any batch-width dependent cache.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedModel {
    pub format_version: u32,
    pub layer_sizes: Vec<usize>,
    pub activations: Vec<ActivationFn>,
    pub layers: Vec<SavedLayer>,
}

/// Row-major `(n_l, n_{l-1})` weights and `n_l` biases.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedLayer {
    #[serde(with = "serialize_vec")]
    pub weights: Vec<f32>,
    #[serde(with = "serialize_vec")]
    pub biases: Vec<f32>,
}

impl Model {
    pub fn to_saved(&self) -> SavedModel {
        SavedModel {
            format_version: FORMAT_VERSION,
            layer_sizes: self.layer_sizes().to_vec(),
            activations: self.layers().iter().map(Layer::activation_fn).collect(),
            layers: self
                .layers()
                .iter()
                .map(|l| SavedLayer {
                    weights: l.weights().iter_row_major().collect(),
                    biases: l.biases().iter_row_major().collect(),
                })
                .collect(),
        }
    }

    /// Rebuilds a model from `saved` with caches sized for `batch_width`.
    pub fn from_saved(saved: &SavedModel, batch_width: usize) -> Result<Model> {
        if saved.format_version != FORMAT_VERSION {
            return Err(Error::Serialization(format!(
                "unsupported format version {}, expected {FORMAT_VERSION}",
                saved.format_version
            )));
        }
        validate_topology(&saved.activations, &saved.layer_sizes, batch_width)?;
        check_len("SavedModel layers", saved.activations.len(), saved.layers.len())?;
        let layers = saved
            .layers
            .iter()
            .zip(&saved.activations)
            .zip(saved.layer_sizes.windows(2))
            .map(|((layer, &activation_fn), sizes)| -> Result<Layer> {
                let (input_size, output_size) = (sizes[0], sizes[1]);
                let weights = Matrix::from_vec(output_size, input_size, layer.weights.clone())?;
                let biases = Matrix::from_vec(output_size, 1, layer.biases.clone())?;
                Ok(Layer::new(
                    input_size,
                    output_size,
                    activation_fn,
                    weights,
                    biases,
                    batch_width,
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(layer_sizes = ?saved.layer_sizes, batch_width, "loaded model");
        Ok(Model::from_layers(layers, batch_width))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_saved())?)
    }

    pub fn from_json(json: &str, batch_width: usize) -> Result<Model> {
        let saved: SavedModel = serde_json::from_str(json)?;
        Model::from_saved(&saved, batch_width)
    }
}

/// f32 buffers as base64 of their big-endian bytes.
mod serialize_vec {
    use serde::de::{Error, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt::Formatter;

    struct F32VecVisitor;

    impl<'de> Visitor<'de> for F32VecVisitor {
        type Value = Vec<f32>;

        fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
            formatter.write_str("a base64-encoded string of big-endian f32 values")
        }

        fn visit_str<E: Error>(self, v: &str) -> Result<Self::Value, E> {
            let data = base64::decode(v).map_err(|e| E::custom(e.to_string()))?;
            if data.len() % 4 != 0 {
                return Err(E::custom("byte length not a multiple of 4"));
            }
            Ok(data
                .chunks_exact(4)
                .map(|c| f32::from_be_bytes([c[0], c[1], c[2], c[3]]))
                .collect())
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f32>, D::Error> {
        deserializer.deserialize_str(F32VecVisitor)
    }

    pub fn serialize<S: Serializer>(value: &[f32], serializer: S) -> Result<S::Ok, S::Error> {
        let bytes: Vec<u8> = value.iter().flat_map(|f| f.to_be_bytes()).collect();
        serializer.serialize_str(&base64::encode(bytes))
    }
}

#[cfg(test)]
mod test {
    use super::{SavedLayer, SavedModel, FORMAT_VERSION};
    use crate::activation::ActivationFn;
    use crate::error::Error;
    use crate::matrix::{Matrix, MatrixBase};
    use crate::net::initializer::{InitScheme, RandomInitializer};
    use crate::net::{Model, ModelBuilder};

    fn model() -> Model {
        ModelBuilder::new(3)
            .with_batch_width(4)
            .with_initializer(RandomInitializer::seed_from_u64(InitScheme::HeNormal, 42))
            .with_layer(5, ActivationFn::LeakyReLU)
            .with_layer(2, ActivationFn::Identity)
            .build()
            .unwrap()
    }

    #[test]
    fn test_encoding() {
        let layer = SavedLayer {
            weights: vec![1.0, -2.5],
            biases: vec![],
        };
        let json = serde_json::to_string(&layer).unwrap();
        assert_eq!(json, r#"{"weights":"P4AAAMAgAAA=","biases":""}"#);
        let back: SavedLayer = serde_json::from_str(&json).unwrap();
        assert_eq!(back, layer);
        assert!(serde_json::from_str::<SavedLayer>(r#"{"weights":"AAA=","biases":""}"#).is_err());
    }

    #[test]
    fn test_json_round_trip_is_exact() {
        let mut original = model();
        original.layer_mut(1).unwrap().biases_mut()[0] = 0.1;
        let json = original.to_json().unwrap();
        let mut restored = Model::from_json(&json, 1).unwrap();
        assert_eq!(restored.batch_width(), 1);
        assert_eq!(restored.layer_sizes(), original.layer_sizes());
        for (a, b) in original.layers().iter().zip(restored.layers()) {
            assert_eq!(a.activation_fn(), b.activation_fn());
            let bits = |m: &Matrix| m.as_slice().iter().map(|x| x.to_bits()).collect::<Vec<_>>();
            assert_eq!(bits(a.weights()), bits(b.weights()));
            assert_eq!(bits(a.biases()), bits(b.biases()));
        }
        let input = Matrix::column_vector(&[0.3, -1.0, 2.0]);
        assert_eq!(restored.predict(&input).unwrap().dims().rows(), 2);
        assert_eq!(restored.to_saved(), original.to_saved());
    }

    #[test]
    fn test_invalid_saved_model() {
        let saved = model().to_saved();

        let mut bad = saved.clone();
        bad.format_version = FORMAT_VERSION + 1;
        assert!(matches!(Model::from_saved(&bad, 1), Err(Error::Serialization(_))));

        let mut bad = saved.clone();
        bad.layers[0].weights.pop();
        assert!(matches!(Model::from_saved(&bad, 1), Err(Error::LengthMismatch { .. })));

        let mut bad = saved.clone();
        bad.activations.pop();
        assert!(matches!(Model::from_saved(&bad, 1), Err(Error::InvalidConfig(_))));

        let mut bad: SavedModel = saved.clone();
        bad.layers.pop();
        assert!(Model::from_saved(&bad, 1).is_err());

        assert!(Model::from_saved(&saved, 0).is_err());
        assert!(matches!(Model::from_json("{", 1), Err(Error::Serialization(_))));
    }
}
