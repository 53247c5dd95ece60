use burn::prelude::Backend;
use rand::Rng;

use crate::{alphabet, model::Model, CharId, Result};

/// Generate text from a seed string.
///
/// The seed primes the recurrent state: every seed character but the last is
/// fed through the model with its logits discarded. From the last seed
/// character on, each drawn character is fed back as the next input, for
/// exactly `length` draws. The result is the seed followed by the generated
/// characters, so its length is `seed.len() + length`.
pub fn generate<B: Backend, R: Rng>(
    model: &Model<B>,
    seed: &str,
    length: usize,
    temperature: f32,
    device: &B::Device,
    rng: &mut R,
) -> Result<String> {
    if seed.is_empty() {
        return Err(crate::Error::Sampling("seed must not be empty".to_string()));
    }

    let seed_ids = alphabet::encode(seed)?;

    // Build up hidden state on the seed, discarding outputs
    let mut hidden = model.init_hidden(device);
    for &id in &seed_ids[..seed_ids.len() - 1] {
        let (_, next) = model.step(id, hidden, device);
        hidden = next;
    }

    let mut out = String::with_capacity(seed.len() + length);
    out.push_str(seed);

    let mut input = seed_ids[seed_ids.len() - 1];
    for _ in 0..length {
        let (logits, next) = model.step(input, hidden, device);
        hidden = next;

        let logits = logits.into_data().to_vec::<f32>().unwrap();
        let id = sample_id(&logits, temperature, rng);
        out.push(alphabet::decode(id)?);
        input = id;
    }

    Ok(out)
}

/// Draw one character id from temperature-scaled logits.
///
/// Logits are divided by the temperature and exponentiated, then treated as
/// unnormalized categorical weights. The max logit is subtracted before the
/// exp; that rescales every weight by the same factor, so the distribution is
/// unchanged but the exp can no longer overflow. As temperature approaches
/// zero the draw converges to the argmax; non-positive temperature is treated
/// as fully greedy.
pub fn sample_id<R: Rng>(logits: &[f32], temperature: f32, rng: &mut R) -> CharId {
    if temperature <= 0.0 {
        return argmax(logits) as CharId;
    }

    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let weights: Vec<f32> = logits
        .iter()
        .map(|&l| ((l - max) / temperature).exp())
        .collect();
    let total: f32 = weights.iter().sum();

    let mut r = rng.gen::<f32>() * total;
    for (i, &w) in weights.iter().enumerate() {
        r -= w;
        if r <= 0.0 {
            return i as CharId;
        }
    }

    // Floating point slop can leave r marginally above zero
    (weights.len() - 1) as CharId
}

fn argmax(logits: &[f32]) -> usize {
    let mut max_idx = 0;
    let mut max_val = logits[0];
    for (i, &val) in logits.iter().enumerate() {
        if val > max_val {
            max_val = val;
            max_idx = i;
        }
    }
    max_idx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::ALPHABET_SIZE;
    use crate::model::ModelConfig;
    use burn::backend::{ndarray::NdArrayDevice, NdArray};

    type TestBackend = NdArray<f32>;

    fn tiny_model() -> (Model<TestBackend>, NdArrayDevice) {
        let device = NdArrayDevice::default();
        let config = ModelConfig::new(16, 2, ALPHABET_SIZE);
        (Model::new(&config, &device), device)
    }

    #[test]
    fn output_is_seed_plus_generated_length() {
        let (model, device) = tiny_model();
        let mut rng = rand::thread_rng();

        let out = generate(&model, "Wh", 100, 0.8, &device, &mut rng).unwrap();
        assert_eq!(out.len(), 102);
        assert!(out.starts_with("Wh"));
    }

    #[test]
    fn zero_length_returns_seed() {
        let (model, device) = tiny_model();
        let mut rng = rand::thread_rng();

        let out = generate(&model, "Hello", 0, 0.8, &device, &mut rng).unwrap();
        assert_eq!(out, "Hello");
    }

    #[test]
    fn empty_seed_is_an_error() {
        let (model, device) = tiny_model();
        let mut rng = rand::thread_rng();

        assert!(generate(&model, "", 10, 0.8, &device, &mut rng).is_err());
    }

    #[test]
    fn near_zero_temperature_is_greedy() {
        let logits = vec![0.1, 2.5, -1.0, 0.3];
        let mut rng = rand::thread_rng();

        for _ in 0..50 {
            assert_eq!(sample_id(&logits, 1e-4, &mut rng), 1);
        }
    }

    #[test]
    fn zero_temperature_picks_argmax() {
        let logits = vec![-3.0, 0.5, 4.2, 4.1];
        let mut rng = rand::thread_rng();
        assert_eq!(sample_id(&logits, 0.0, &mut rng), 2);
    }
}
