//! Burn Dataset Integration for PlantVillage
//!
//! This module implements Burn's Dataset trait and Batcher for loading leaf
//! images and turning them into training batches with one-hot targets.

use std::path::{Path, PathBuf};

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::prelude::*;
use image::imageops::FilterType;
use image::ImageReader;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::loader::ImageFolder;
use crate::utils::error::{PipelineError, Result};
use crate::{IMAGE_SIZE, NUM_CLASSES};

/// A single leaf image ready for Burn
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LeafItem {
    /// Image data as flattened CHW float array [3 * H * W], values in [0, 1]
    pub image: Vec<f32>,
    /// Class label
    pub label: usize,
    /// Image path (for debugging/logging)
    pub path: String,
}

impl LeafItem {
    /// Create a new item by loading and preprocessing an image
    ///
    /// The image is decoded as RGB, resized to `image_size`² with
    /// nearest-neighbour sampling and rescaled by 1/255.
    pub fn from_path(path: &Path, label: usize, image_size: usize) -> Result<Self> {
        let load_err = |e: String| PipelineError::ImageLoad(path.to_path_buf(), e);

        let img = ImageReader::open(path)
            .map_err(|e| load_err(e.to_string()))?
            .with_guessed_format()
            .map_err(|e| load_err(e.to_string()))?
            .decode()
            .map_err(|e| load_err(e.to_string()))?
            .resize_exact(image_size as u32, image_size as u32, FilterType::Nearest)
            .to_rgb8();

        let (width, height) = (image_size, image_size);
        let plane = height * width;
        let mut image = vec![0.0f32; 3 * plane];

        // Convert to CHW format and rescale to [0, 1]
        for (x, y, pixel) in img.enumerate_pixels() {
            let offset = y as usize * width + x as usize;
            image[offset] = pixel[0] as f32 / 255.0;
            image[plane + offset] = pixel[1] as f32 / 255.0;
            image[2 * plane + offset] = pixel[2] as f32 / 255.0;
        }

        Ok(Self {
            image,
            label,
            path: path.to_string_lossy().to_string(),
        })
    }
}

/// Leaf image dataset implementing Burn's Dataset trait
///
/// Images are decoded on demand; nothing is cached between epochs.
#[derive(Debug, Clone)]
pub struct LeafDataset {
    /// List of (image_path, label) pairs
    samples: Vec<(PathBuf, usize)>,
    /// Target image size
    image_size: usize,
}

impl LeafDataset {
    /// Create a new dataset from a list of samples
    pub fn new(samples: Vec<(PathBuf, usize)>, image_size: usize) -> Self {
        Self {
            samples,
            image_size,
        }
    }

    /// Create from an image-folder split
    pub fn from_folder(folder: &ImageFolder, image_size: usize) -> Self {
        Self::new(folder.pairs(), image_size)
    }

    /// Target image side length
    pub fn image_size(&self) -> usize {
        self.image_size
    }

    /// Ground-truth labels in dataset order
    pub fn labels(&self) -> Vec<usize> {
        self.samples.iter().map(|(_, label)| *label).collect()
    }

    /// Decode the items at `indices`, in order, in parallel
    ///
    /// Unlike [`Dataset::get`], a corrupt image is reported as an error.
    pub fn load_batch(&self, indices: &[usize]) -> Result<Vec<LeafItem>> {
        indices
            .par_iter()
            .map(|&idx| {
                let (path, label) = self.samples.get(idx).ok_or_else(|| {
                    PipelineError::Dataset(format!(
                        "Sample index {} out of range for {} samples",
                        idx,
                        self.samples.len()
                    ))
                })?;
                LeafItem::from_path(path, *label, self.image_size)
            })
            .collect()
    }
}

impl Dataset<LeafItem> for LeafDataset {
    fn get(&self, index: usize) -> Option<LeafItem> {
        let (path, label) = self.samples.get(index)?;
        LeafItem::from_path(path, *label, self.image_size).ok()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

/// A batch of leaf images
#[derive(Clone, Debug)]
pub struct LeafBatch<B: Backend> {
    /// Batch of images with shape [batch_size, 3, height, width]
    pub images: Tensor<B, 4>,
    /// One-hot targets with shape [batch_size, num_classes]
    pub targets: Tensor<B, 2>,
    /// Class indices with shape [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

/// Batcher for creating leaf batches with one-hot targets
#[derive(Clone, Debug)]
pub struct LeafBatcher {
    image_size: usize,
    num_classes: usize,
}

impl Default for LeafBatcher {
    fn default() -> Self {
        Self::new(IMAGE_SIZE, NUM_CLASSES)
    }
}

impl LeafBatcher {
    /// Create a batcher for the given image size and class count
    pub fn new(image_size: usize, num_classes: usize) -> Self {
        Self {
            image_size,
            num_classes,
        }
    }
}

impl<B: Backend> Batcher<B, LeafItem, LeafBatch<B>> for LeafBatcher {
    fn batch(&self, items: Vec<LeafItem>, device: &B::Device) -> LeafBatch<B> {
        let batch_size = items.len();
        let (channels, height, width) = (3, self.image_size, self.image_size);

        let images_data: Vec<f32> = items.iter().flat_map(|item| item.image.iter().copied()).collect();
        let images = Tensor::<B, 4>::from_floats(
            TensorData::new(images_data, [batch_size, channels, height, width]),
            device,
        );

        let mut onehot = vec![0.0f32; batch_size * self.num_classes];
        for (row, item) in items.iter().enumerate() {
            if item.label < self.num_classes {
                onehot[row * self.num_classes + item.label] = 1.0;
            }
        }
        let targets = Tensor::<B, 2>::from_floats(
            TensorData::new(onehot, [batch_size, self.num_classes]),
            device,
        );

        let labels_data: Vec<i64> = items.iter().map(|item| item.label as i64).collect();
        let labels =
            Tensor::<B, 1, Int>::from_data(TensorData::new(labels_data, [batch_size]), device);

        LeafBatch {
            images,
            targets,
            labels,
        }
    }
}

/// Produces the batch index lists for each epoch
///
/// Exactly `steps` batches are produced per epoch. When `steps` needs more
/// batches than one pass over the data yields, iteration wraps around and
/// starts a new pass (reshuffled when shuffling is on). The last batch of a
/// pass may be partial.
#[derive(Debug, Clone)]
pub struct EpochSampler {
    len: usize,
    batch_size: usize,
    steps: usize,
    shuffle: bool,
    rng: ChaCha8Rng,
}

impl EpochSampler {
    pub fn new(len: usize, batch_size: usize, steps: usize, shuffle: bool, seed: u64) -> Self {
        Self {
            len,
            batch_size: batch_size.max(1),
            steps,
            shuffle,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Batches per epoch
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Index lists for the next epoch
    pub fn next_epoch(&mut self) -> Vec<Vec<usize>> {
        let mut batches = Vec::with_capacity(self.steps);
        if self.len == 0 {
            return batches;
        }

        while batches.len() < self.steps {
            let mut order: Vec<usize> = (0..self.len).collect();
            if self.shuffle {
                order.shuffle(&mut self.rng);
            }
            for chunk in order.chunks(self.batch_size) {
                if batches.len() == self.steps {
                    break;
                }
                batches.push(chunk.to_vec());
            }
        }

        batches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    type TestBackend = NdArray;

    fn write_png(dir: &Path, name: &str, color: [u8; 3], size: u32) -> PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(size, size, Rgb(color)).save(&path).unwrap();
        path
    }

    #[test]
    fn test_item_is_resized_and_rescaled() {
        let dir = TempDir::new().unwrap();
        let path = write_png(dir.path(), "leaf.png", [255, 0, 51], 37);

        let item = LeafItem::from_path(&path, 4, IMAGE_SIZE).unwrap();

        let plane = IMAGE_SIZE * IMAGE_SIZE;
        assert_eq!(item.image.len(), 3 * plane);
        assert!(item.image.iter().all(|v| (0.0..=1.0).contains(v)));
        assert_eq!(item.image[0], 1.0);
        assert_eq!(item.image[plane], 0.0);
        assert!((item.image[2 * plane] - 0.2).abs() < 1e-6);
        assert_eq!(item.label, 4);
    }

    #[test]
    fn test_corrupt_image_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();

        let result = LeafItem::from_path(&path, 0, IMAGE_SIZE);
        assert!(matches!(result, Err(PipelineError::ImageLoad(_, _))));

        let dataset = LeafDataset::new(vec![(path, 0)], IMAGE_SIZE);
        assert!(dataset.get(0).is_none());
        assert!(dataset.load_batch(&[0]).is_err());
    }

    #[test]
    fn test_load_batch_keeps_order() {
        let dir = TempDir::new().unwrap();
        let a = write_png(dir.path(), "a.png", [10, 10, 10], 8);
        let b = write_png(dir.path(), "b.png", [20, 20, 20], 8);
        let dataset = LeafDataset::new(vec![(a, 3), (b, 7)], 8);

        let items = dataset.load_batch(&[1, 0, 1]).unwrap();

        let labels: Vec<usize> = items.iter().map(|i| i.label).collect();
        assert_eq!(labels, vec![7, 3, 7]);
        assert_eq!(dataset.labels(), vec![3, 7]);
        assert!(dataset.load_batch(&[5]).is_err());
    }

    #[test]
    fn test_batcher_one_hot_targets() {
        let device = Default::default();
        let items: Vec<LeafItem> = [0usize, 15, 3]
            .iter()
            .map(|&label| LeafItem {
                image: vec![0.5; 3 * 4 * 4],
                label,
                path: String::new(),
            })
            .collect();

        let batcher = LeafBatcher::new(4, NUM_CLASSES);
        let batch: LeafBatch<TestBackend> = batcher.batch(items, &device);

        assert_eq!(batch.images.dims(), [3, 3, 4, 4]);
        assert_eq!(batch.targets.dims(), [3, NUM_CLASSES]);
        assert_eq!(batch.labels.dims(), [3]);

        let row_sums = batch.targets.clone().sum_dim(1).into_data().to_vec::<f32>().unwrap();
        assert_eq!(row_sums, vec![1.0, 1.0, 1.0]);

        let argmax = batch.targets.argmax(1).reshape([3]).into_data().convert::<i64>().to_vec::<i64>().unwrap();
        assert_eq!(argmax, vec![0, 15, 3]);
    }

    #[test]
    fn test_sampler_covers_every_sample_once() {
        let mut sampler = EpochSampler::new(10, 4, 3, true, 42);
        let batches = sampler.next_epoch();

        assert_eq!(batches.len(), 3);
        assert_eq!(batches[2].len(), 2);
        let mut seen: Vec<usize> = batches.concat();
        seen.sort();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_sampler_reshuffles_between_epochs() {
        let mut sampler = EpochSampler::new(64, 64, 1, true, 7);
        let first = sampler.next_epoch();
        let second = sampler.next_epoch();
        assert_ne!(first, second);

        let mut fixed = EpochSampler::new(5, 2, 3, false, 7);
        assert_eq!(fixed.next_epoch(), vec![vec![0, 1], vec![2, 3], vec![4]]);
    }

    #[test]
    fn test_sampler_wraps_when_steps_exceed_data() {
        let mut sampler = EpochSampler::new(3, 2, 4, false, 0);
        assert_eq!(
            sampler.next_epoch(),
            vec![vec![0, 1], vec![2], vec![0, 1], vec![2]]
        );

        let mut empty = EpochSampler::new(0, 2, 4, true, 0);
        assert!(empty.next_epoch().is_empty());
    }
}
