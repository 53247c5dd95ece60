#![recursion_limit = "256"]

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod generate;

#[derive(Parser)]
#[command(name = "scrawl")]
#[command(about = "A character-level recurrent language model", long_about = None)]
struct Opts {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum Backend {
    #[default]
    Gpu,
    Cpu,
}

impl From<Backend> for scrawl::Backend {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::Gpu => scrawl::Backend::Wgpu,
            Backend::Cpu => scrawl::Backend::Cpu,
        }
    }
}

#[derive(Subcommand)]
enum Cmd {
    /// Train a model on a line-oriented text corpus
    Train {
        /// Input text file
        input: PathBuf,

        /// Backend to use for training
        #[arg(long, default_value = "gpu")]
        backend: Backend,

        /// Number of training epochs
        #[arg(long, default_value = "100")]
        epochs: usize,
    },

    /// Sample text from a trained model
    Generate {
        /// Model checkpoint file
        model: PathBuf,

        /// Seed text that primes the model
        #[arg(long, default_value = "Wh")]
        seed: String,

        /// Number of characters to generate
        #[arg(long, default_value = "100")]
        length: usize,

        /// Sampling temperature (lower = more deterministic)
        #[arg(long, default_value = "0.8")]
        temperature: f32,

        /// Backend to use for inference
        #[arg(long, default_value = "gpu")]
        backend: Backend,
    },
}

fn main() {
    let opts = Opts::parse();

    match opts.command {
        Cmd::Train {
            input,
            backend,
            epochs,
        } => {
            scrawl::train(&input, backend.into(), epochs).expect("training failed");
        }
        Cmd::Generate {
            model,
            seed,
            length,
            temperature,
            backend,
        } => {
            generate::generate(&model, &seed, length, temperature, backend.into())
                .expect("generation failed");
        }
    }
}
