//! CNN Model Architecture for Leaf Disease Classification
//!
//! Four valid-padded 3×3 convolutions, each followed by ReLU and a 2×2
//! max-pool, then a 512-unit hidden layer and a linear output layer. The
//! output layer has no activation; the loss is computed from its logits.

use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        Linear, LinearConfig, Relu,
    },
    tensor::{backend::Backend, Tensor},
};

/// Filters of the four convolutional blocks
pub const CONV_FILTERS: [usize; 4] = [32, 64, 128, 128];

/// Width of the hidden dense layer
pub const HIDDEN_UNITS: usize = 512;

/// Configuration for the SimpleCnn model
#[derive(Config, Debug)]
pub struct SimpleCnnConfig {
    /// Number of output classes
    #[config(default = "16")]
    pub num_classes: usize,

    /// Input image size (square RGB images)
    #[config(default = "100")]
    pub image_size: usize,

    /// Number of input channels (3 for RGB)
    #[config(default = "3")]
    pub in_channels: usize,
}

impl SimpleCnnConfig {
    /// Side length of the feature map after the last pooling layer
    pub fn feature_size(&self) -> usize {
        CONV_FILTERS
            .iter()
            .fold(self.image_size, |size, _| size.saturating_sub(2) / 2)
    }

    /// Number of features entering the dense layers
    pub fn flatten_size(&self) -> usize {
        let side = self.feature_size();
        CONV_FILTERS[CONV_FILTERS.len() - 1] * side * side
    }

    /// Create the model on the given device
    pub fn init<B: Backend>(&self, device: &B::Device) -> SimpleCnn<B> {
        let conv = |in_ch: usize, out_ch: usize| Conv2dConfig::new([in_ch, out_ch], [3, 3]).init(device);

        SimpleCnn {
            conv1: conv(self.in_channels, CONV_FILTERS[0]),
            conv2: conv(CONV_FILTERS[0], CONV_FILTERS[1]),
            conv3: conv(CONV_FILTERS[1], CONV_FILTERS[2]),
            conv4: conv(CONV_FILTERS[2], CONV_FILTERS[3]),
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
            fc1: LinearConfig::new(self.flatten_size(), HIDDEN_UNITS).init(device),
            fc2: LinearConfig::new(HIDDEN_UNITS, self.num_classes).init(device),
            activation: Relu::new(),
            num_classes: self.num_classes,
        }
    }
}

/// Sequential leaf classifier
///
/// Architecture (100×100 input):
/// - conv 3→32, pool: 98 → 49
/// - conv 32→64, pool: 47 → 23
/// - conv 64→128, pool: 21 → 10
/// - conv 128→128, pool: 8 → 4
/// - flatten 2048 → dense 512 (ReLU) → dense 16 (logits)
#[derive(Module, Debug)]
pub struct SimpleCnn<B: Backend> {
    pub conv1: Conv2d<B>,
    pub conv2: Conv2d<B>,
    pub conv3: Conv2d<B>,
    pub conv4: Conv2d<B>,
    pub pool: MaxPool2d,
    pub fc1: Linear<B>,
    pub fc2: Linear<B>,
    activation: Relu,
    num_classes: usize,
}

impl<B: Backend> SimpleCnn<B> {
    /// Forward pass through the network
    ///
    /// # Arguments
    /// * `x` - Input tensor of shape [batch_size, 3, height, width]
    ///
    /// # Returns
    /// * Logits tensor of shape [batch_size, num_classes]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.block(&self.conv1, x);
        let x = self.block(&self.conv2, x);
        let x = self.block(&self.conv3, x);
        let x = self.block(&self.conv4, x);

        // Flatten: [B, C, H, W] -> [B, C*H*W]
        let [batch_size, channels, height, width] = x.dims();
        let x = x.reshape([batch_size, channels * height * width]);

        let x = self.activation.forward(self.fc1.forward(x));
        self.fc2.forward(x)
    }

    /// Forward pass with softmax for inference
    pub fn forward_softmax(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        burn::tensor::activation::softmax(self.forward(x), 1)
    }

    /// Get the number of output classes
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn block(&self, conv: &Conv2d<B>, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.pool.forward(self.activation.forward(conv.forward(x)))
    }
}
