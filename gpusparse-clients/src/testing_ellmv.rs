use crate::arguments::Arguments;
use crate::check::{expect_status, near_check, unit_check};
use crate::error::ClientError;
use crate::host::host_ellmv;
use crate::init::{random_ell_matrix, random_vector, seeded_rng};
use crate::timing::{ellmv_byte_count, Throughput, WARMUP_CALLS};
use gpusparse_core::level2::ellmv;
use gpusparse_core::{
    EllMatrixGpu, GpuDevice, GpuVector, Handle, MatDescr, Matrix, MatrixType, Operation,
    PointerMode, Scalar, SparseError, Status,
};
use std::time::Instant;

/// Length of every buffer used where only argument checking is exercised.
const SAFE_SIZE: usize = 100;

/// Every argument of an `ellmv` call except the output vector.
#[derive(Debug, Clone, Copy)]
struct EllmvCall<'a> {
    handle: Option<&'a Handle>,
    trans: Operation,
    m: i32,
    n: i32,
    alpha: Option<Scalar<'a>>,
    descr: Option<&'a MatDescr>,
    ell_val: Option<&'a GpuVector<f32>>,
    ell_col_ind: Option<&'a GpuVector<i32>>,
    ell_width: i32,
    x: Option<&'a GpuVector<f32>>,
    beta: Option<Scalar<'a>>,
}

impl EllmvCall<'_> {
    async fn run(self, y: Option<&mut GpuVector<f32>>) -> Result<(), SparseError> {
        ellmv(
            self.handle,
            self.trans,
            self.m,
            self.n,
            self.alpha,
            self.descr,
            self.ell_val,
            self.ell_col_ind,
            self.ell_width,
            self.x,
            self.beta,
            y,
        )
        .await
    }

    async fn assert_status(
        self,
        y: Option<&mut GpuVector<f32>>,
        status: Status,
    ) -> Result<(), ClientError> {
        expect_status(&self.run(y).await, status)
    }
}

/// Drives every argument check of `ellmv` with a tiny fixed instance.
pub async fn testing_ellmv_bad_arg(device: &GpuDevice) -> Result<(), ClientError> {
    let safe = SAFE_SIZE as i32;
    let handle = Handle::new(device);
    let device_handle = handle.with_pointer_mode(PointerMode::Device);
    let descr = MatDescr::new();
    let mut symmetric = MatDescr::new();
    symmetric.set_matrix_type(MatrixType::Symmetric);

    let ell_val = device.create_vector("bad_arg ell_val", &[1.0f32; SAFE_SIZE])?;
    let ell_col_ind = device.create_vector("bad_arg ell_col_ind", &[0i32; SAFE_SIZE])?;
    let x = device.create_vector("bad_arg x", &[1.0f32; SAFE_SIZE])?;
    let mut y = device.create_vector("bad_arg y", &[1.0f32; SAFE_SIZE])?;

    let valid = EllmvCall {
        handle: Some(&handle),
        trans: Operation::NONE,
        m: safe,
        n: safe,
        alpha: Some(Scalar::Host(1.0)),
        descr: Some(&descr),
        ell_val: Some(&ell_val),
        ell_col_ind: Some(&ell_col_ind),
        ell_width: 1,
        x: Some(&x),
        beta: Some(Scalar::Host(1.0)),
    };

    let cases = [
        (EllmvCall { handle: None, m: -1, ..valid }, Status::InvalidHandle),
        (EllmvCall { descr: None, ..valid }, Status::InvalidPointer),
        (EllmvCall { trans: Operation::from_raw(0), m: -1, ..valid }, Status::InvalidValue),
        (EllmvCall { descr: Some(&symmetric), m: -1, ..valid }, Status::NotImplemented),
        (EllmvCall { m: -1, ..valid }, Status::InvalidSize),
        (EllmvCall { n: -1, ..valid }, Status::InvalidSize),
        (EllmvCall { ell_width: -1, ..valid }, Status::InvalidSize),
        (EllmvCall { m: 0, ..valid }, Status::InvalidSize),
        (EllmvCall { n: 0, ..valid }, Status::InvalidSize),
        (EllmvCall { alpha: None, ..valid }, Status::InvalidPointer),
        (EllmvCall { beta: None, ..valid }, Status::InvalidPointer),
        (EllmvCall { ell_val: None, ..valid }, Status::InvalidPointer),
        (EllmvCall { ell_col_ind: None, ..valid }, Status::InvalidPointer),
        (EllmvCall { x: None, ..valid }, Status::InvalidPointer),
        (EllmvCall { handle: Some(&device_handle), ..valid }, Status::InvalidPointer),
        (EllmvCall { m: safe + 1, ..valid }, Status::InvalidSize),
        (EllmvCall { n: safe + 1, ..valid }, Status::InvalidSize),
    ];
    for (call, status) in cases {
        call.assert_status(Some(&mut y), status).await?;
    }
    valid.assert_status(None, Status::InvalidPointer).await?;

    // Quick returns report success before any pointer is looked at.
    let empty = EllmvCall {
        alpha: None,
        beta: None,
        ell_val: None,
        ell_col_ind: None,
        x: None,
        ..valid
    };
    EllmvCall { m: 0, n: 0, ell_width: 0, ..empty }
        .assert_status(None, Status::Success)
        .await?;
    EllmvCall { ell_width: 0, ..empty }
        .assert_status(None, Status::Success)
        .await?;
    EllmvCall {
        alpha: Some(Scalar::Host(0.0)),
        beta: Some(Scalar::Host(1.0)),
        ..empty
    }
    .assert_status(None, Status::Success)
    .await?;

    valid.assert_status(Some(&mut y), Status::Success).await?;
    log::debug!("ellmv bad argument checks passed");
    Ok(())
}

/// Runs one ELL product on an already uploaded matrix.
async fn run_ellmv(
    handle: &Handle,
    arg: &Arguments,
    a: &EllMatrixGpu,
    alpha: Scalar<'_>,
    x: &GpuVector<f32>,
    beta: Scalar<'_>,
    y: &mut GpuVector<f32>,
) -> Result<(), SparseError> {
    ellmv(
        Some(handle),
        arg.trans,
        arg.m,
        arg.n,
        Some(alpha),
        Some(a.descr()),
        Some(a.values()),
        Some(a.col_indices()),
        arg.ell_width,
        Some(x),
        Some(beta),
        Some(y),
    )
    .await
}

/// Validates `ellmv` on a random instance described by `arg`.
///
/// With `unit_check`, the product is computed once with host scalars and once
/// with device scalars into separate outputs; both must match the CPU
/// reference. With `timing`, returns the measured throughput.
pub async fn testing_ellmv(
    device: &GpuDevice,
    arg: &Arguments,
) -> Result<Option<Throughput>, ClientError> {
    let handle = Handle::new(device);

    if arg.m <= 0 || arg.n <= 0 || arg.ell_width <= 0 {
        let descr = MatDescr::with_base(arg.base);
        let ell_val = device.create_vector("safe ell_val", &[0.0f32; SAFE_SIZE])?;
        let ell_col_ind = device.create_vector("safe ell_col_ind", &[0i32; SAFE_SIZE])?;
        let x = device.create_vector("safe x", &[0.0f32; SAFE_SIZE])?;
        let mut y = device.create_vector("safe y", &[0.0f32; SAFE_SIZE])?;

        let invalid = arg.m < 0
            || arg.n < 0
            || arg.ell_width < 0
            || ((arg.m == 0 || arg.n == 0) && arg.ell_width != 0);
        let expected = if invalid {
            Status::InvalidSize
        } else {
            Status::Success
        };
        let call = EllmvCall {
            handle: Some(&handle),
            trans: arg.trans,
            m: arg.m,
            n: arg.n,
            alpha: Some(Scalar::Host(arg.alpha)),
            descr: Some(&descr),
            ell_val: Some(&ell_val),
            ell_col_ind: Some(&ell_col_ind),
            ell_width: arg.ell_width,
            x: Some(&x),
            beta: Some(Scalar::Host(arg.beta)),
        };
        call.assert_status(Some(&mut y), expected).await?;
        return Ok(None);
    }

    let (m, n, ell_width) = (arg.m as usize, arg.n as usize, arg.ell_width as usize);
    let (x_len, y_len) = if arg.trans.is_transposed() { (m, n) } else { (n, m) };

    let mut rng = seeded_rng(arg.seed);
    let a = random_ell_matrix(&mut rng, m, n, ell_width, arg.base)?;
    let hx = random_vector(&mut rng, x_len);
    let hy = random_vector(&mut rng, y_len);

    let a_gpu = device.create_ell_matrix(&a)?;
    let dx = device.create_vector("x", &hx)?;
    let mut dy_1 = device.create_vector("y_1", &hy)?;

    if arg.unit_check {
        let mut dy_2 = device.create_empty_vector::<f32>("y_2", y_len)?;
        dy_2.copy_from(&dy_1)?;
        let d_alpha = device.create_scalar(arg.alpha);
        let d_beta = device.create_scalar(arg.beta);

        run_ellmv(
            &handle,
            arg,
            &a_gpu,
            Scalar::Host(arg.alpha),
            &dx,
            Scalar::Host(arg.beta),
            &mut dy_1,
        )
        .await?;
        let device_handle = handle.with_pointer_mode(PointerMode::Device);
        run_ellmv(
            &device_handle,
            arg,
            &a_gpu,
            Scalar::Device(&d_alpha),
            &dx,
            Scalar::Device(&d_beta),
            &mut dy_2,
        )
        .await?;

        let mut hy_gold = hy.clone();
        host_ellmv(
            arg.trans,
            m,
            n,
            arg.alpha,
            a.values(),
            a.col_indices(),
            ell_width,
            &hx,
            arg.beta,
            &mut hy_gold,
            arg.base,
        );

        let hy_1 = dy_1.read_contents().await?;
        let hy_2 = dy_2.read_contents().await?;
        // Integer data sums exactly in any order; fractional scalars do not.
        if arg.alpha.fract() == 0.0 && arg.beta.fract() == 0.0 {
            unit_check(&hy_gold, &hy_1)?;
            unit_check(&hy_gold, &hy_2)?;
        } else {
            near_check(&hy_gold, &hy_1, 1e-5)?;
            near_check(&hy_gold, &hy_2, 1e-5)?;
        }
        log::debug!("ellmv {}x{} (width {}) verified", m, n, ell_width);
    }

    if !arg.timing {
        return Ok(None);
    }
    if arg.iters == 0 {
        return Err(ClientError::InvalidArgument(
            "timing needs at least one iteration".to_string(),
        ));
    }

    let alpha = Scalar::Host(arg.alpha);
    let beta = Scalar::Host(arg.beta);
    for _ in 0..WARMUP_CALLS {
        run_ellmv(&handle, arg, &a_gpu, alpha, &dx, beta, &mut dy_1).await?;
    }
    handle.synchronize()?;

    let start = Instant::now();
    for _ in 0..arg.iters {
        run_ellmv(&handle, arg, &a_gpu, alpha, &dx, beta, &mut dy_1).await?;
    }
    handle.synchronize()?;
    let elapsed = start.elapsed();

    let nnz = a.nnz();
    let throughput = Throughput::from_run(
        nnz as u64,
        ellmv_byte_count(nnz, x_len, y_len, arg.beta != 0.0),
        elapsed,
        arg.iters,
    );

    log::info!(
        "{:<8}{:<8}{:<8}{:<12}{:<12}{:<12}{:<8}{:<10}",
        "M",
        "N",
        "width",
        "nnz",
        "GB/s",
        "usec",
        "iter",
        "verified"
    );
    log::info!(
        "{:<8}{:<8}{:<8}{:<12}{:<12.2}{:<12.2}{:<8}{:<10}",
        m,
        n,
        ell_width,
        nnz,
        throughput.gbytes_per_second(),
        throughput.usec_per_call(),
        arg.iters,
        if arg.unit_check { "yes" } else { "no" }
    );
    Ok(Some(throughput))
}
