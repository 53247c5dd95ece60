use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, Autodiff, NdArray, Wgpu},
    module::AutodiffModule,
    tensor::{backend::AutodiffBackend, Int, Tensor, TensorData},
};
use rand::Rng;

use crate::{
    alphabet::{self, CharId},
    corpus,
    model::{ModelConfig, Trainer},
    sample, Result,
};

// Canonical model hyperparameters (sized for line-oriented corpora like
// the Shakespeare dataset)
const HIDDEN_SIZE: usize = 100;
const LAYERS: usize = 3;

// Training hyperparameters
const BATCH_SIZE: usize = 32;
const LEARNING_RATE: f64 = 1e-3;

// Progress report: one freshly sampled excerpt per batch
const SAMPLE_SEED: &str = "Wh";
const SAMPLE_LEN: usize = 100;
const SAMPLE_TEMPERATURE: f32 = 0.8;

pub fn train(input: &Path, backend: crate::Backend, max_epochs: usize) -> Result<()> {
    #[cfg(debug_assertions)]
    eprintln!("Warning: running in debug mode, use --release for faster training");

    // Ctrl-C flips a flag; the run loop notices it between lines, saves once,
    // and exits cleanly
    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let flag = interrupted.clone();
        ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
            .map_err(|e| crate::Error::Signal(e.to_string()))?;
    }

    let lines = corpus::load_lines(input)?;
    eprintln!("Loaded {} lines from {}", lines.len(), input.display());

    let config = ModelConfig::new(HIDDEN_SIZE, LAYERS, alphabet::ALPHABET_SIZE);
    let ckpt = checkpoint_path(input);

    match backend {
        crate::Backend::Wgpu => {
            let device = WgpuDevice::default();
            eprintln!("Using wgpu device: {:?}", device);
            train_loop::<Autodiff<Wgpu<f32, i32>>>(
                config,
                &lines,
                &ckpt,
                device,
                max_epochs,
                &interrupted,
            )
        }
        crate::Backend::Cpu => {
            let device = NdArrayDevice::default();
            eprintln!("Using CPU device: {:?}", device);
            train_loop::<Autodiff<NdArray<f32>>>(
                config,
                &lines,
                &ckpt,
                device,
                max_epochs,
                &interrupted,
            )
        }
    }
}

fn train_loop<B: AutodiffBackend>(
    config: ModelConfig,
    lines: &[String],
    ckpt: &Path,
    device: B::Device,
    max_epochs: usize,
    interrupted: &AtomicBool,
) -> Result<()> {
    let mut trainer: Trainer<B> = Trainer::new(config, &device);
    let mut rng = rand::thread_rng();

    eprintln!("Training for {} epochs...", max_epochs);
    let start = Instant::now();

    'run: for epoch in 1..=max_epochs {
        for batch in corpus::shuffled_batches(lines, BATCH_SIZE, &mut rng) {
            let mut batch_loss = 0.0;
            let mut counted = 0;

            for line in batch {
                if interrupted.load(Ordering::Relaxed) {
                    break 'run;
                }

                let ids = alphabet::encode(line)?;
                if ids.len() < 2 {
                    // Nothing to predict without an input/target pair
                    continue;
                }

                batch_loss += train_line(&mut trainer, &ids, &device);
                counted += 1;
            }

            if counted == 0 {
                continue;
            }

            println!(
                "[({} {}%) {:.4}]",
                epoch,
                epoch * 100 / max_epochs,
                batch_loss / counted as f32
            );

            let excerpt = sample_excerpt(&trainer, &device, &mut rng)?;
            println!("{}\n", excerpt);
        }
    }

    if interrupted.load(Ordering::Relaxed) {
        eprintln!("Interrupted, saving before quit...");
    } else {
        eprintln!(
            "Training complete in {:.1}s, saving...",
            start.elapsed().as_secs_f32()
        );
    }

    trainer.save(ckpt)?;
    eprintln!("Saved model to {}", ckpt.display());

    Ok(())
}

/// One gradient step on one line: the input is every character but the last,
/// the target the same sequence shifted left by one.
fn train_line<B: AutodiffBackend>(
    trainer: &mut Trainer<B>,
    ids: &[CharId],
    device: &B::Device,
) -> f32 {
    let (input, target) = split_line(ids);
    let seq_len = input.len();

    let input: Tensor<B, 2, Int> =
        Tensor::from_data(TensorData::new(input, [1, seq_len]), device);
    let target: Tensor<B, 1, Int> = Tensor::from_data(TensorData::new(target, [seq_len]), device);

    trainer.train_step(input, target, LEARNING_RATE, device)
}

fn split_line(ids: &[CharId]) -> (Vec<i32>, Vec<i32>) {
    let input = ids[..ids.len() - 1].iter().map(|&c| c as i32).collect();
    let target = ids[1..].iter().map(|&c| c as i32).collect();
    (input, target)
}

fn sample_excerpt<B: AutodiffBackend, R: Rng>(
    trainer: &Trainer<B>,
    device: &B::Device,
    rng: &mut R,
) -> Result<String> {
    let model = trainer.model.clone().valid();
    sample::generate(
        &model,
        SAMPLE_SEED,
        SAMPLE_LEN,
        SAMPLE_TEMPERATURE,
        device,
        rng,
    )
}

/// Checkpoint lands in the current working directory, named after the corpus:
/// `data/shakespeare.txt` -> `shakespeare.mpk`. Overwrites any prior save.
fn checkpoint_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or(input.as_os_str());
    PathBuf::from(stem).with_extension("mpk")
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{ndarray::NdArrayDevice, Autodiff, NdArray};

    type TestBackend = Autodiff<NdArray<f32>>;

    #[test]
    fn line_splits_into_shifted_pairs() {
        let ids = alphabet::encode("Who is there?").unwrap();
        let (input, target) = split_line(&ids);

        // 13 characters train over exactly 12 positions
        assert_eq!(input.len(), 12);
        assert_eq!(target.len(), 12);

        let input_text: String = input
            .iter()
            .map(|&i| char::from_u32(i as u32).unwrap())
            .collect();
        let target_text: String = target
            .iter()
            .map(|&i| char::from_u32(i as u32).unwrap())
            .collect();
        assert_eq!(input_text, "Who is there");
        assert_eq!(target_text, "ho is there?");
    }

    #[test]
    fn repeated_steps_on_one_line_reduce_loss() {
        let device = NdArrayDevice::default();
        let config = ModelConfig::new(32, 2, alphabet::ALPHABET_SIZE);
        let mut trainer: Trainer<TestBackend> = Trainer::new(config, &device);

        let ids = alphabet::encode("the quick brown fox").unwrap();
        let first = train_line(&mut trainer, &ids, &device);
        let mut last = first;
        for _ in 0..5 {
            last = train_line(&mut trainer, &ids, &device);
        }

        assert!(
            last < first,
            "loss did not fall while memorizing one line: {} -> {}",
            first,
            last
        );
    }

    #[test]
    fn checkpoint_named_after_corpus() {
        assert_eq!(
            checkpoint_path(Path::new("shakespeare.txt")),
            PathBuf::from("shakespeare.mpk")
        );
        assert_eq!(
            checkpoint_path(Path::new("data/hamlet.txt")),
            PathBuf::from("hamlet.mpk")
        );
    }
}
