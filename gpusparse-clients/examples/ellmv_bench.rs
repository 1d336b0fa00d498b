use gpusparse_clients::init::pentadiagonal_ell;
use gpusparse_clients::{testing_ellmv, testing_gthrz, Arguments, GpuDevice, Handle};
use gpusparse_core::device::TransferStats;
use gpusparse_core::{IndexBase, Matrix, Operation, Scalar};
use std::time::Instant;

#[tokio::main]
async fn main() {
    // Initialize logging based on RUST_LOG environment variable
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .filter_module("wgpu", log::LevelFilter::Off)
        .init();

    let gpu_device = GpuDevice::new().await.expect("Failed to create GPU device");

    // 1. Random instances, checked and timed
    let runs = [
        Arguments::new().with_sizes(10_000, 10_000, 16).with_scalars(2.0, 1.0),
        Arguments::new()
            .with_sizes(10_000, 8_000, 16)
            .with_scalars(1.0, 0.0)
            .with_trans(Operation::TRANSPOSE),
        Arguments::new()
            .with_sizes(100_000, 100_000, 8)
            .with_scalars(3.0, -1.0)
            .with_base(IndexBase::One),
    ];
    for arg in runs.iter().map(|a| a.clone().with_timing(20)) {
        log::info!(
            "ellmv {}x{} width {} trans {:?} alpha {} beta {}",
            arg.m,
            arg.n,
            arg.ell_width,
            arg.trans,
            arg.alpha,
            arg.beta
        );
        if let Err(e) = testing_ellmv(&gpu_device, &arg).await {
            log::error!("ellmv run failed: {}", e);
        }
    }

    let gather = Arguments::new()
        .with_sizes(1_000_000, 1, 1)
        .with_nnz(100_000)
        .with_timing(20);
    if let Err(e) = testing_gthrz(&gpu_device, &gather).await {
        log::error!("gthrz run failed: {}", e);
    }

    // 2. A structured matrix through the convenience API
    let n = 500;
    log::info!("Applying a {}x{} pentadiagonal matrix 100 times...", n, n);
    let a = pentadiagonal_ell(n, IndexBase::Zero).expect("Failed to build pentadiagonal matrix");
    log::info!("  nnz {} (density {:.4})", a.nnz(), a.density());

    gpu_device.reset_transfer_stats();
    let start_time = Instant::now();

    let handle = Handle::new(&gpu_device);
    let a_gpu = gpu_device
        .create_ell_matrix(&a)
        .expect("Failed to create GPU matrix");
    let x = gpu_device
        .create_vector("x", &vec![1.0f32; n])
        .expect("Failed to create x");
    let mut y = gpu_device
        .create_empty_vector::<f32>("y", n)
        .expect("Failed to create y");
    for _ in 0..100 {
        a_gpu
            .ellmv(&handle, Operation::NONE, Scalar::Host(1.0), &x, Scalar::Host(0.0), &mut y)
            .await
            .expect("ellmv failed");
    }
    let y_host = y.read_contents().await.expect("Failed to read y");
    let duration = start_time.elapsed();

    let TransferStats {
        bytes_to_gpu,
        bytes_from_gpu,
    } = gpu_device.get_transfer_stats();
    log::info!("GPU Transfer Stats:");
    log::info!("  Bytes CPU -> GPU: {}", bytes_to_gpu);
    log::info!("  Bytes GPU -> CPU: {}", bytes_from_gpu);
    log::info!("  Time elapsed: {:?}", duration);
    log::info!("  Row sums (first 4): {:?}", &y_host[..4.min(n)]);
}
