use std::path::Path;

use burn::backend::ndarray::NdArrayDevice;
use burn::backend::wgpu::WgpuDevice;
use burn::backend::{NdArray, Wgpu};
use burn::prelude::Backend;

use scrawl::model::Model;

pub fn generate(
    model_path: &Path,
    seed: &str,
    length: usize,
    temperature: f32,
    backend: scrawl::Backend,
) -> scrawl::Result<()> {
    match backend {
        scrawl::Backend::Wgpu => {
            let device = WgpuDevice::default();
            eprintln!("Using wgpu device: {:?}", device);
            run::<Wgpu<f32, i32>>(model_path, seed, length, temperature, device)
        }
        scrawl::Backend::Cpu => {
            let device = NdArrayDevice::default();
            eprintln!("Using CPU device: {:?}", device);
            run::<NdArray<f32>>(model_path, seed, length, temperature, device)
        }
    }
}

fn run<B: Backend>(
    model_path: &Path,
    seed: &str,
    length: usize,
    temperature: f32,
    device: B::Device,
) -> scrawl::Result<()> {
    let model = Model::<B>::load(model_path, &device)?;
    let mut rng = rand::thread_rng();

    let text = scrawl::generate(&model, seed, length, temperature, &device, &mut rng)?;
    println!("{}", text);

    Ok(())
}
