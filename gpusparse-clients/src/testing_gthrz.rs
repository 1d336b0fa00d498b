use crate::arguments::Arguments;
use crate::check::{expect_status, unit_check};
use crate::error::ClientError;
use crate::host::host_gthrz;
use crate::init::{random_unique_indices, random_vector, seeded_rng};
use crate::timing::{gthrz_byte_count, Throughput, WARMUP_CALLS};
use gpusparse_core::level1::gthrz;
use gpusparse_core::{GpuDevice, Handle, IndexBase, PointerMode, Status};
use std::time::Instant;

const SAFE_SIZE: usize = 100;

/// Drives every argument check of `gthrz`.
pub async fn testing_gthrz_bad_arg(device: &GpuDevice) -> Result<(), ClientError> {
    let safe = SAFE_SIZE as i32;
    let base = IndexBase::Zero;
    let handle = Handle::new(device);
    let x_ind = device.create_vector("bad_arg x_ind", &[0i32; SAFE_SIZE])?;
    let mut x_val = device.create_vector("bad_arg x_val", &[0.0f32; SAFE_SIZE])?;
    let mut y = device.create_vector("bad_arg y", &[0.0f32; SAFE_SIZE])?;

    expect_status(
        &gthrz(None, safe, Some(&mut y), Some(&mut x_val), Some(&x_ind), base).await,
        Status::InvalidHandle,
    )?;
    expect_status(
        &gthrz(Some(&handle), safe, None, Some(&mut x_val), Some(&x_ind), base).await,
        Status::InvalidPointer,
    )?;
    expect_status(
        &gthrz(Some(&handle), safe, Some(&mut y), None, Some(&x_ind), base).await,
        Status::InvalidPointer,
    )?;
    expect_status(
        &gthrz(Some(&handle), safe, Some(&mut y), Some(&mut x_val), None, base).await,
        Status::InvalidPointer,
    )?;
    expect_status(
        &gthrz(Some(&handle), -1, Some(&mut y), Some(&mut x_val), Some(&x_ind), base).await,
        Status::InvalidSize,
    )?;
    expect_status(
        &gthrz(Some(&handle), safe + 1, Some(&mut y), Some(&mut x_val), Some(&x_ind), base).await,
        Status::InvalidSize,
    )?;
    expect_status(
        &gthrz(Some(&handle), 0, None, None, None, base).await,
        Status::Success,
    )?;
    log::debug!("gthrz bad argument checks passed");
    Ok(())
}

/// Validates `gthrz` on `arg.nnz` random unique indices into a vector of
/// `arg.m` entries. The result must not depend on the pointer mode.
pub async fn testing_gthrz(
    device: &GpuDevice,
    arg: &Arguments,
) -> Result<Option<Throughput>, ClientError> {
    let handle = Handle::new(device);
    let base = arg.base;

    if arg.nnz <= 0 {
        let x_ind = device.create_vector("safe x_ind", &[0i32; SAFE_SIZE])?;
        let mut x_val = device.create_vector("safe x_val", &[0.0f32; SAFE_SIZE])?;
        let mut y = device.create_vector("safe y", &[0.0f32; SAFE_SIZE])?;
        let expected = if arg.nnz < 0 {
            Status::InvalidSize
        } else {
            Status::Success
        };
        let result = gthrz(
            Some(&handle),
            arg.nnz,
            Some(&mut y),
            Some(&mut x_val),
            Some(&x_ind),
            base,
        )
        .await;
        expect_status(&result, expected)?;
        return Ok(None);
    }

    let nnz = arg.nnz as usize;
    let m = usize::try_from(arg.m)
        .map_err(|_| ClientError::InvalidArgument(format!("negative vector length {}", arg.m)))?;

    let mut rng = seeded_rng(arg.seed);
    let hx_ind = random_unique_indices(&mut rng, nnz, m, base)?;
    let hy = random_vector(&mut rng, m);

    let dx_ind = device.create_vector("x_ind", &hx_ind)?;
    let mut dx_val_1 = device.create_empty_vector::<f32>("x_val_1", nnz)?;
    let mut dy_1 = device.create_vector("y_1", &hy)?;

    if arg.unit_check {
        let mut dx_val_2 = device.create_empty_vector::<f32>("x_val_2", nnz)?;
        let mut dy_2 = device.create_empty_vector::<f32>("y_2", m)?;
        dy_2.copy_from(&dy_1)?;

        gthrz(
            Some(&handle),
            arg.nnz,
            Some(&mut dy_1),
            Some(&mut dx_val_1),
            Some(&dx_ind),
            base,
        )
        .await?;
        let device_handle = handle.with_pointer_mode(PointerMode::Device);
        gthrz(
            Some(&device_handle),
            arg.nnz,
            Some(&mut dy_2),
            Some(&mut dx_val_2),
            Some(&dx_ind),
            base,
        )
        .await?;

        let mut hy_gold = hy.clone();
        let mut hx_val_gold = vec![0.0f32; nnz];
        host_gthrz(nnz, &mut hy_gold, &mut hx_val_gold, &hx_ind, base);

        unit_check(&hx_val_gold, &dx_val_1.read_contents().await?)?;
        unit_check(&hx_val_gold, &dx_val_2.read_contents().await?)?;
        unit_check(&hy_gold, &dy_1.read_contents().await?)?;
        unit_check(&hy_gold, &dy_2.read_contents().await?)?;
        log::debug!("gthrz nnz={} verified", nnz);
    }

    if !arg.timing {
        return Ok(None);
    }
    if arg.iters == 0 {
        return Err(ClientError::InvalidArgument(
            "timing needs at least one iteration".to_string(),
        ));
    }

    for _ in 0..WARMUP_CALLS {
        gthrz(Some(&handle), arg.nnz, Some(&mut dy_1), Some(&mut dx_val_1), Some(&dx_ind), base)
            .await?;
    }
    handle.synchronize()?;

    let start = Instant::now();
    for _ in 0..arg.iters {
        gthrz(Some(&handle), arg.nnz, Some(&mut dy_1), Some(&mut dx_val_1), Some(&dx_ind), base)
            .await?;
    }
    handle.synchronize()?;

    let throughput =
        Throughput::from_run(nnz as u64, gthrz_byte_count(nnz), start.elapsed(), arg.iters);

    log::info!(
        "{:<12}{:<12}{:<12}{:<12}{:<12}",
        "nnz",
        "GB/s",
        "usec",
        "iter",
        "verified"
    );
    log::info!(
        "{:<12}{:<12.2}{:<12.2}{:<12}{:<12}",
        nnz,
        throughput.gbytes_per_second(),
        throughput.usec_per_call(),
        arg.iters,
        if arg.unit_check { "yes" } else { "no" }
    );
    Ok(Some(throughput))
}
