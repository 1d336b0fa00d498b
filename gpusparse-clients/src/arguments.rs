use gpusparse_core::{IndexBase, Operation};

/// One benchmark/validation instance, as a front end would describe it.
///
/// Sizes are signed so that negative values can be passed through to the
/// library's own argument checks.
#[derive(Debug, Clone, PartialEq)]
pub struct Arguments {
    pub m: i32,
    pub n: i32,
    pub ell_width: i32,
    /// Entries gathered by `gthrz`.
    pub nnz: i32,
    pub alpha: f32,
    pub beta: f32,
    pub trans: Operation,
    pub base: IndexBase,
    /// Timed calls after the warm-up.
    pub iters: usize,
    pub seed: u64,
    pub unit_check: bool,
    pub timing: bool,
}

impl Default for Arguments {
    fn default() -> Self {
        Self {
            m: 128,
            n: 128,
            ell_width: 8,
            nnz: 64,
            alpha: 1.0,
            beta: 0.0,
            trans: Operation::NONE,
            base: IndexBase::Zero,
            iters: 10,
            seed: 12345,
            unit_check: true,
            timing: false,
        }
    }
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sizes(mut self, m: i32, n: i32, ell_width: i32) -> Self {
        self.m = m;
        self.n = n;
        self.ell_width = ell_width;
        self
    }

    pub fn with_nnz(mut self, nnz: i32) -> Self {
        self.nnz = nnz;
        self
    }

    pub fn with_scalars(mut self, alpha: f32, beta: f32) -> Self {
        self.alpha = alpha;
        self.beta = beta;
        self
    }

    pub fn with_trans(mut self, trans: Operation) -> Self {
        self.trans = trans;
        self
    }

    pub fn with_base(mut self, base: IndexBase) -> Self {
        self.base = base;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Enables timing with `iters` measured calls.
    pub fn with_timing(mut self, iters: usize) -> Self {
        self.timing = true;
        self.iters = iters;
        self
    }

    pub fn with_unit_check(mut self, unit_check: bool) -> Self {
        self.unit_check = unit_check;
        self
    }
}
