//! Saving and loading layer weights.
//!
//! [`JsonDirectoryStore`] writes one `<layer index>.json` file per weight
//! matrix. Each file records the matrix shape and its values in row-major
//! order, so the format does not depend on the in-memory layout.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ensure_non_empty, Error, Result};
use crate::Matrix;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Storage for an ordered list of layer weight matrices.
pub trait LayerStore {
    fn save(&self, thetas: &[Matrix]) -> Result<()>;
    fn load(&self) -> Result<Vec<Matrix>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SerializedLayer {
    rows: usize,
    cols: usize,
    /// Row-major (rows, cols).
    weights: Vec<f64>,
}

impl From<&Matrix> for SerializedLayer {
    fn from(theta: &Matrix) -> Self {
        Self {
            rows: theta.nrows(),
            cols: theta.ncols(),
            weights: theta.iter().copied().collect(),
        }
    }
}

impl SerializedLayer {
    fn into_matrix(self, index: usize) -> Result<Matrix> {
        let expected = self
            .rows
            .checked_mul(self.cols)
            .ok_or_else(|| Error::Shape(format!("layer {index} shape overflows")))?;
        if self.weights.len() != expected {
            return Err(Error::Shape(format!(
                "layer {index} has {} weights, expected {} x {}",
                self.weights.len(),
                self.rows,
                self.cols
            )));
        }
        Matrix::from_shape_vec((self.rows, self.cols), self.weights)
            .map_err(|e| Error::Shape(format!("layer {index}: {e}")))
    }
}

/// A directory of `0.json`, `1.json`, ... files, one per layer.
///
/// JSON cannot represent NaN or infinity, so non-finite weights fail to load
/// with [`Error::Serialization`].
#[derive(Debug, Clone)]
pub struct JsonDirectoryStore {
    directory: PathBuf,
}

impl JsonDirectoryStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn layer_path(&self, index: usize) -> PathBuf {
        self.directory.join(format!("{index}.json"))
    }

    fn count_layers(&self) -> Result<usize> {
        let mut count = 0;
        for entry in fs::read_dir(&self.directory)? {
            let path = entry?.path();
            let is_layer = path.extension().is_some_and(|ext| ext == "json")
                && path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .is_some_and(|stem| stem.parse::<usize>().is_ok());
            if is_layer {
                count += 1;
            }
        }
        Ok(count)
    }
}

impl LayerStore for JsonDirectoryStore {
    fn save(&self, thetas: &[Matrix]) -> Result<()> {
        fs::create_dir_all(&self.directory)?;
        for (index, theta) in thetas.iter().enumerate() {
            let json = serde_json::to_string_pretty(&SerializedLayer::from(theta))?;
            fs::write(self.layer_path(index), json)?;
        }

        // drop layers left over from a deeper network
        let mut index = thetas.len();
        while self.layer_path(index).exists() {
            fs::remove_file(self.layer_path(index))?;
            index += 1;
        }

        debug!(directory = %self.directory.display(), layers = thetas.len(), "saved network layers");
        Ok(())
    }

    fn load(&self) -> Result<Vec<Matrix>> {
        let count = self.count_layers()?;
        ensure_non_empty(count, "stored network layers")?;

        let mut thetas = Vec::with_capacity(count);
        for index in 0..count {
            let json = fs::read_to_string(self.layer_path(index))?;
            let layer: SerializedLayer = serde_json::from_str(&json)?;
            thetas.push(layer.into_matrix(index)?);
        }
        Ok(thetas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neural_network::NeuralNetwork;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_save_and_load_network() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirectoryStore::new(dir.path().join("net"));
        let network = NeuralNetwork::empty(&[3, 4, 2])
            .unwrap()
            .randomly_initialize(&mut StdRng::seed_from_u64(8));

        network.save_to(&store).unwrap();
        assert!(store.directory().join("0.json").exists());
        assert!(store.directory().join("1.json").exists());

        let loaded = NeuralNetwork::load_from(&store).unwrap();
        assert_eq!(loaded, network);
    }

    #[test]
    fn test_row_major_layout() {
        let theta = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let layer = SerializedLayer::from(&theta);
        assert_eq!(layer.weights, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let transposed = theta.t().to_owned();
        assert_eq!(SerializedLayer::from(&transposed).weights, vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn test_overwrite_with_shallower_network() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirectoryStore::new(dir.path());
        NeuralNetwork::empty(&[2, 3, 3, 1]).unwrap().save_to(&store).unwrap();

        let shallow = NeuralNetwork::empty(&[2, 1]).unwrap();
        shallow.save_to(&store).unwrap();
        assert!(!dir.path().join("1.json").exists());
        assert_eq!(NeuralNetwork::load_from(&store).unwrap(), shallow);
    }

    #[test]
    fn test_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirectoryStore::new(dir.path());
        assert!(matches!(store.load(), Err(Error::Empty(_))));

        fs::write(dir.path().join("0.json"), r#"{"rows":2,"cols":2,"weights":[1.0]}"#).unwrap();
        assert!(matches!(store.load(), Err(Error::Shape(_))));

        fs::write(dir.path().join("0.json"), r#"{"rows":1,"cols":1,"weights":[null]}"#).unwrap();
        assert!(matches!(store.load(), Err(Error::Serialization(_))));

        fs::write(dir.path().join("0.json"), "not json").unwrap();
        assert!(matches!(store.load(), Err(Error::Serialization(_))));
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirectoryStore::new(dir.path().join("absent"));
        assert!(matches!(store.load(), Err(Error::Io(_))));
    }

    #[test]
    fn test_mismatched_layer_chain_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirectoryStore::new(dir.path());
        store
            .save(&[Matrix::zeros((3, 3)), Matrix::zeros((1, 2))])
            .unwrap();
        assert!(NeuralNetwork::load_from(&store).is_err());
    }
}
