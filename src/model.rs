//! Character-level recurrent language model.

use std::{fs, path::Path};

use burn::{
    module::Module,
    nn::{
        gru::{Gru, GruConfig},
        loss::CrossEntropyLossConfig,
        Embedding, EmbeddingConfig, Initializer, Linear, LinearConfig,
    },
    optim::{adaptor::OptimizerAdaptor, Adam, AdamConfig, GradientsParams, Optimizer},
    prelude::Backend,
    tensor::{backend::AutodiffBackend, ElementConversion, Int, Tensor, TensorData},
};
use serde::{Deserialize, Serialize};

use crate::{CharId, Result};

/// Configuration for the recurrent model architecture.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelConfig {
    pub hidden_size: usize,
    pub layers: usize,
    pub alphabet_size: usize,
}

impl ModelConfig {
    pub fn new(hidden_size: usize, layers: usize, alphabet_size: usize) -> Self {
        Self {
            hidden_size,
            layers,
            alphabet_size,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let config_path = path.with_extension("json");
        let config_json = fs::read_to_string(&config_path)?;
        serde_json::from_str(&config_json).map_err(|e| crate::Error::Burn(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let config_path = path.with_extension("json");
        let config_json =
            serde_json::to_string_pretty(self).map_err(|e| crate::Error::Burn(e.to_string()))?;
        fs::write(&config_path, config_json)?;
        Ok(())
    }
}

/// Recurrent state threaded through a sequence: one `[1, hidden]` tensor per
/// GRU layer. Created fresh per line or per generation call, never carried
/// across sequences.
pub type Hidden<B> = Vec<Tensor<B, 2>>;

/// The language model: embedding lookup, stacked GRU cells, and a linear
/// decoder projecting the top hidden state to per-character logits.
///
/// Used for both inference and training:
/// - For inference, use `Model<B>` directly with any `Backend`
/// - For training, wrap it in a [`Trainer`] which adds optimizer and gradient
///   support (only `AutodiffBackend` tensors can call `.backward()`)
#[derive(Module, Debug)]
pub struct Model<B: Backend> {
    embedding: Embedding<B>,
    grus: Vec<Gru<B>>,
    decoder: Linear<B>,
    hidden_size: usize,
    alphabet_size: usize,
}

impl<B: Backend> Model<B> {
    pub fn new(config: &ModelConfig, device: &B::Device) -> Self {
        let emb_init = Initializer::Normal {
            mean: 0.0,
            std: 0.02,
        };
        let embedding = EmbeddingConfig::new(config.alphabet_size, config.hidden_size)
            .with_initializer(emb_init)
            .init(device);

        let mut grus = Vec::with_capacity(config.layers);
        for _ in 0..config.layers {
            grus.push(GruConfig::new(config.hidden_size, config.hidden_size, true).init(device));
        }

        let init = Initializer::XavierUniform { gain: 1.0 };
        let decoder = LinearConfig::new(config.hidden_size, config.alphabet_size)
            .with_initializer(init)
            .init(device);

        Self {
            embedding,
            grus,
            decoder,
            hidden_size: config.hidden_size,
            alphabet_size: config.alphabet_size,
        }
    }

    pub fn load(path: &Path, device: &B::Device) -> Result<Self> {
        let config = ModelConfig::load(path)?;

        eprintln!(
            "Loading model: {} layers, hidden_size={}",
            config.layers, config.hidden_size
        );

        let model = Self::new(&config, device);

        model
            .load_file(
                path,
                &burn::record::DefaultFileRecorder::<burn::record::FullPrecisionSettings>::new(),
                device,
            )
            .map_err(|e| crate::Error::Burn(e.to_string()))
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    pub fn alphabet_size(&self) -> usize {
        self.alphabet_size
    }

    /// Fresh zero recurrent state for the start of a sequence.
    pub fn init_hidden(&self, device: &B::Device) -> Hidden<B> {
        (0..self.grus.len())
            .map(|_| Tensor::zeros([1, self.hidden_size], device))
            .collect()
    }

    /// Full-line forward pass: `[1, seq_len]` -> `[1, seq_len, alphabet_size]`.
    /// Recurrent state starts at zero and the GRU scan runs left-to-right,
    /// so each position's logits depend only on the characters before it.
    pub fn forward(&self, ids: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let mut x = self.embedding.forward(ids);
        for gru in &self.grus {
            x = gru.forward(x, None);
        }
        self.decoder.forward(x)
    }

    /// Single-character forward pass threading explicit recurrent state.
    /// Returns logits over the alphabet and the updated state; the caller
    /// owns the state for the duration of one sequence.
    pub fn step(
        &self,
        id: CharId,
        hidden: Hidden<B>,
        device: &B::Device,
    ) -> (Tensor<B, 1>, Hidden<B>) {
        let input: Tensor<B, 2, Int> =
            Tensor::from_data(TensorData::new(vec![id as i32], [1, 1]), device);

        let mut x = self.embedding.forward(input);
        let mut next = Vec::with_capacity(self.grus.len());
        for (gru, state) in self.grus.iter().zip(hidden) {
            x = gru.forward(x, Some(state));
            next.push(x.clone().reshape([1, self.hidden_size]));
        }

        let logits = self.decoder.forward(x);
        (logits.reshape([self.alphabet_size]), next)
    }
}

/// Wraps a [`Model`] with an Adam optimizer for training.
///
/// `Model<B: Backend>` runs on any backend; `Trainer<B: AutodiffBackend>`
/// requires one that tracks gradients, so inference code never carries
/// optimizer state.
pub struct Trainer<B: AutodiffBackend> {
    pub model: Model<B>,
    pub optimizer: OptimizerAdaptor<Adam, Model<B>, B>,
    pub config: ModelConfig,
}

impl<B: AutodiffBackend> Trainer<B> {
    pub fn new(config: ModelConfig, device: &B::Device) -> Self {
        eprintln!(
            "Creating model: {} layers, hidden_size={}, alphabet={}",
            config.layers, config.hidden_size, config.alphabet_size
        );
        let model = Model::new(&config, device);
        let optimizer = AdamConfig::new().init();

        Self {
            model,
            optimizer,
            config,
        }
    }

    /// One training step over one line: forward, mean cross-entropy over all
    /// positions, backward, optimizer step. Returns mean loss per character.
    pub fn train_step(
        &mut self,
        input: Tensor<B, 2, Int>,
        target: Tensor<B, 1, Int>,
        lr: f64,
        device: &B::Device,
    ) -> f32 {
        let [_batch, seq_len] = input.dims();

        let logits = self.model.forward(input);
        let logits = logits.reshape([seq_len, self.config.alphabet_size]);

        let loss = CrossEntropyLossConfig::new()
            .init(device)
            .forward(logits, target);

        let loss_val: f32 = loss.clone().into_scalar().elem();

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.model);
        self.model = self.optimizer.step(lr, self.model.clone(), grads);

        loss_val
    }

    /// Save model weights and config
    pub fn save(&self, path: &Path) -> Result<()> {
        self.config.save(path)?;
        self.model
            .clone()
            .save_file(
                path,
                &burn::record::DefaultFileRecorder::<burn::record::FullPrecisionSettings>::new(),
            )
            .map_err(|e| crate::Error::Burn(e.to_string()))?;
        Ok(())
    }
}
