//! CPU model of an SM80 GEMM kernel.
//!
//! Compilation checks the constraints the device compiler enforces. Launches
//! walk the swizzled grid, stage operand tiles through a `stages`-deep
//! shared-memory ring, convert operands as the math operation does and
//! accumulate one instruction-K chunk at a time.

use rayon::prelude::*;
use tracing::{debug, info};
use crate::backend::{Backend, CompiledKernel, GemmArguments};
use crate::core::layout::Layout;
use crate::core::math::{OpcodeClass, OperandPrecision};
use crate::core::operation::GemmOperationUniversal;
use crate::core::problem::{GemmMode, ProblemSize};
use crate::core::shape::GemmShape;
use crate::core::swizzle::SwizzlingFunctor;
use crate::core::tensor::TensorDescription;
use crate::doctor::{DeviceQuery, EmulatedDevice};
use crate::error::{Result, TestbedError};

const MAX_ACCESS_BITS: u64 = 128;

#[derive(Debug, Clone, Default)]
pub struct EmulatedBackend {
    device: EmulatedDevice,
}

impl EmulatedBackend {
    pub fn new(device: EmulatedDevice) -> Self {
        Self { device }
    }

    pub fn emulated_device(&self) -> &EmulatedDevice {
        &self.device
    }
}

fn reject(op: &GemmOperationUniversal, reason: String) -> TestbedError {
    TestbedError::Compile {
        name: op.procedural_name(),
        reason,
    }
}

/// Bytes of shared memory the multistage mainloop needs.
pub fn shared_memory_bytes(op: &GemmOperationUniversal) -> usize {
    let td = &op.tile_description;
    let tb = td.threadblock_shape;
    let a_bits = tb.m as usize * tb.k as usize * op.a.element.size_bits() as usize;
    let b_bits = tb.k as usize * tb.n as usize * op.b.element.size_bits() as usize;
    td.stages as usize * (a_bits + b_bits) / 8
}

impl Backend for EmulatedBackend {
    fn device(&self) -> &dyn DeviceQuery {
        &self.device
    }

    fn compile(&self, op: &GemmOperationUniversal) -> Result<CompiledKernel> {
        let td = &op.tile_description;
        let math = &td.math_instruction;
        let cc = self.device.compute_capability;

        if op.arch > cc {
            return Err(reject(op, format!("kernel targets sm{} but the device is sm{}", op.arch, cc)));
        }
        if op.arch < math.minimum_arch() {
            return Err(reject(
                op,
                format!(
                    "{} {:?} needs sm{} or newer",
                    math.opcode_class.short_name(),
                    math.math_operation,
                    math.minimum_arch()
                ),
            ));
        }

        if !td.threadblock_shape.is_positive() {
            return Err(reject(op, format!("threadblock shape {} has a zero extent", td.threadblock_shape)));
        }
        if !math.instruction_shape.is_positive() {
            return Err(reject(op, format!("instruction shape {} has a zero extent", math.instruction_shape)));
        }
        let min_stages = if math.opcode_class == OpcodeClass::TensorOp && op.arch >= 80 { 2 } else { 1 };
        if td.stages < min_stages {
            return Err(reject(op, format!("{} stages, the mainloop needs at least {}", td.stages, min_stages)));
        }

        let warp_shape = td
            .warp_shape()
            .filter(|_| td.threadblock_shape.is_divisible_by(td.warp_count))
            .ok_or_else(|| {
                reject(
                    op,
                    format!("threadblock {} is not divisible by warp count {}", td.threadblock_shape, td.warp_count),
                )
            })?;
        if math.opcode_class == OpcodeClass::TensorOp && !warp_shape.is_divisible_by(math.instruction_shape) {
            return Err(reject(
                op,
                format!("warp tile {} is not divisible by instruction {}", warp_shape, math.instruction_shape),
            ));
        }

        let threads = td.threads_per_block();
        if threads > self.device.max_threads_per_block as u64 {
            return Err(reject(
                op,
                format!("{} threads per block exceeds {}", threads, self.device.max_threads_per_block),
            ));
        }

        if op.a.element != math.element_a || op.b.element != math.element_b {
            return Err(reject(
                op,
                format!(
                    "operands are {}/{} but the math instruction takes {}/{}",
                    op.a.element.short_name(),
                    op.b.element.short_name(),
                    math.element_a.short_name(),
                    math.element_b.short_name()
                ),
            ));
        }
        if op.epilogue_functor.element_accumulator() != math.element_accumulator {
            return Err(reject(op, "epilogue accumulator differs from the math instruction".to_string()));
        }
        if op.epilogue_functor.element_output() != op.c.element {
            return Err(reject(op, "epilogue output element differs from operand C".to_string()));
        }
        if op.epilogue_functor.alignment() != op.c.alignment {
            return Err(reject(
                op,
                format!(
                    "epilogue alignment {} differs from operand C alignment {}",
                    op.epilogue_functor.alignment(),
                    op.c.alignment
                ),
            ));
        }

        for (label, tensor) in [("A", &op.a), ("B", &op.b), ("C", &op.c)] {
            let bits = tensor.access_bits();
            if bits == 0 || bits > MAX_ACCESS_BITS || MAX_ACCESS_BITS % bits != 0 {
                return Err(reject(
                    op,
                    format!("operand {} alignment {} is not a valid vector access ({} bits)", label, tensor.alignment, bits),
                ));
            }
        }

        let smem = shared_memory_bytes(op);
        if smem > self.device.max_shared_memory {
            return Err(reject(
                op,
                format!("needs {} bytes of shared memory, the device has {}", smem, self.device.max_shared_memory),
            ));
        }

        let kernel = CompiledKernel {
            name: op.procedural_name(),
            operation: *op,
            target_arch: cc,
            warp_shape,
            threads_per_block: threads as u32,
            shared_memory_bytes: smem,
            operand_precision: math.operand_precision(),
        };
        info!(kernel = %kernel.name, smem, threads, "compiled");
        Ok(kernel)
    }

    fn launch(&self, kernel: &CompiledKernel, args: GemmArguments<'_>) -> Result<()> {
        if kernel.target_arch != self.device.compute_capability {
            return Err(TestbedError::InvalidArguments(format!(
                "kernel built for sm{} launched on sm{}",
                kernel.target_arch, self.device.compute_capability
            )));
        }
        let op = &kernel.operation;
        let p = args.problem;
        can_implement(kernel, p)?;
        if args.batch_count == 0 {
            return Err(TestbedError::InvalidArguments("batch count must be at least 1".to_string()));
        }

        let batches = GemmArguments::tensor_batches(args.mode, args.batch_count);
        check_len("A", args.a.len(), batches * p.m * p.k)?;
        check_len("B", args.b.len(), batches * p.k * p.n)?;
        check_len("C", args.c.len(), batches * p.m * p.n)?;
        check_len("D", args.d.len(), batches * p.m * p.n)?;
        check_len(
            "workspace",
            args.workspace.len(),
            GemmArguments::workspace_len(args.mode, p, args.batch_count),
        )?;

        let ctx = TileContext::new(kernel, p, args.a, args.b);
        let tb = op.tile_description.threadblock_shape;
        let swizzle = op.swizzling_functor;

        debug!(kernel = %kernel.name, mode = ?args.mode, problem = %p, batch = args.batch_count, "launch");

        match args.mode {
            GemmMode::Gemm | GemmMode::Batched => {
                let tiled = SwizzlingFunctor::tiled_shape(p.m, p.n, tb, batches);
                let jobs: Vec<TileJob> = swizzle
                    .tiles(tiled)
                    .into_iter()
                    .map(|tile| TileJob {
                        tile,
                        batch: tile.k as usize,
                        k_begin: 0,
                        k_end: p.k,
                    })
                    .collect();
                let results = ctx.run(&jobs);

                let ldc = op.c.layout.leading_dim(p.m, p.n);
                let batch_stride = p.m * p.n;
                for (job, acc) in jobs.iter().zip(results) {
                    let base = job.batch * batch_stride;
                    ctx.for_each_output(job, |row, col, idx| {
                        let out = base + op.c.layout.offset(row, col, ldc);
                        args.d[out] = op.epilogue_functor.apply(args.alpha, acc[idx], args.beta, args.c[out]);
                    });
                }
            }
            GemmMode::GemmSplitKParallel => {
                let slices = args.batch_count;
                let per_slice = split_k_extent(p.k, slices, op.a.alignment.max(op.b.alignment) as usize);
                let tiled = SwizzlingFunctor::tiled_shape(p.m, p.n, tb, slices);
                let jobs: Vec<TileJob> = swizzle
                    .tiles(tiled)
                    .into_iter()
                    .map(|tile| {
                        let k_begin = (tile.k as usize * per_slice).min(p.k);
                        TileJob {
                            tile,
                            batch: 0,
                            k_begin,
                            k_end: (k_begin + per_slice).min(p.k),
                        }
                    })
                    .collect();
                let results = ctx.run(&jobs);

                // Partials land in a row-major workspace, one m x n plane per slice.
                let plane = p.m * p.n;
                let acc_kind = op.epilogue_functor.element_accumulator();
                for (job, acc) in jobs.iter().zip(results) {
                    let base = job.tile.k as usize * plane;
                    ctx.for_each_output(job, |row, col, idx| {
                        args.workspace[base + row * p.n + col] = acc_kind.round(acc[idx]);
                    });
                }

                let ldc = op.c.layout.leading_dim(p.m, p.n);
                for row in 0..p.m {
                    for col in 0..p.n {
                        let mut sum = 0.0f32;
                        for slice in 0..slices {
                            sum += args.workspace[slice * plane + row * p.n + col];
                        }
                        let out = op.c.layout.offset(row, col, ldc);
                        args.d[out] = op.epilogue_functor.apply(args.alpha, sum, args.beta, args.c[out]);
                    }
                }
            }
        }
        Ok(())
    }
}

fn check_len(label: &str, got: usize, needed: usize) -> Result<()> {
    if got < needed {
        return Err(TestbedError::InvalidArguments(format!(
            "tensor {} holds {} elements, {} needed",
            label, got, needed
        )));
    }
    Ok(())
}

/// Contiguous extent of each operand must be a multiple of its vector width.
fn can_implement(kernel: &CompiledKernel, p: ProblemSize) -> Result<()> {
    let op = &kernel.operation;
    let contiguous = |t: &TensorDescription, rows: usize, cols: usize| match t.layout {
        Layout::RowMajor => cols,
        Layout::ColumnMajor => rows,
    };
    for (label, tensor, rows, cols) in [
        ("A", &op.a, p.m, p.k),
        ("B", &op.b, p.k, p.n),
        ("C", &op.c, p.m, p.n),
    ] {
        let extent = contiguous(tensor, rows, cols);
        if extent % tensor.alignment.max(1) as usize != 0 {
            return Err(TestbedError::NotImplementable {
                name: kernel.name.clone(),
                problem: p.to_string(),
                reason: format!(
                    "operand {} contiguous extent {} is not a multiple of alignment {}",
                    label, extent, tensor.alignment
                ),
            });
        }
    }
    Ok(())
}

/// K extent of each split-k slice, rounded up to the operand alignment.
pub fn split_k_extent(k: usize, slices: usize, align: usize) -> usize {
    let per = k.div_ceil(slices.max(1));
    per.div_ceil(align.max(1)) * align.max(1)
}

#[derive(Debug, Clone, Copy)]
struct TileJob {
    tile: GemmShape,
    batch: usize,
    k_begin: usize,
    k_end: usize,
}

/// Read-only view shared by every threadblock of one launch.
struct TileContext<'a> {
    tb_m: usize,
    tb_n: usize,
    tb_k: usize,
    inst_k: usize,
    stages: usize,
    precision: OperandPrecision,
    problem: ProblemSize,
    a_layout: Layout,
    b_layout: Layout,
    lda: usize,
    ldb: usize,
    a: &'a [f32],
    b: &'a [f32],
}

impl<'a> TileContext<'a> {
    fn new(kernel: &CompiledKernel, problem: ProblemSize, a: &'a [f32], b: &'a [f32]) -> Self {
        let op = &kernel.operation;
        let td = &op.tile_description;
        let tb = td.threadblock_shape;
        Self {
            tb_m: tb.m as usize,
            tb_n: tb.n as usize,
            tb_k: tb.k as usize,
            inst_k: td.math_instruction.instruction_shape.k.max(1) as usize,
            stages: td.stages.max(1) as usize,
            precision: kernel.operand_precision,
            problem,
            a_layout: op.a.layout,
            b_layout: op.b.layout,
            lda: op.a.layout.leading_dim(problem.m, problem.k),
            ldb: op.b.layout.leading_dim(problem.k, problem.n),
            a,
            b,
        }
    }

    fn run(&self, jobs: &[TileJob]) -> Vec<Vec<f32>> {
        jobs.par_iter().map(|job| self.run_tile(job)).collect()
    }

    /// Calls `f(row, col, acc_index)` for every in-bounds element of the tile.
    fn for_each_output(&self, job: &TileJob, mut f: impl FnMut(usize, usize, usize)) {
        let row0 = job.tile.m as usize * self.tb_m;
        let col0 = job.tile.n as usize * self.tb_n;
        let rows = self.tb_m.min(self.problem.m.saturating_sub(row0));
        let cols = self.tb_n.min(self.problem.n.saturating_sub(col0));
        for i in 0..rows {
            for j in 0..cols {
                f(row0 + i, col0 + j, i * self.tb_n + j);
            }
        }
    }

    fn run_tile(&self, job: &TileJob) -> Vec<f32> {
        let mut acc = vec![0.0f32; self.tb_m * self.tb_n];
        let k_len = job.k_end.saturating_sub(job.k_begin);
        let k_tiles = k_len.div_ceil(self.tb_k);
        if k_tiles == 0 {
            return acc;
        }

        let mut ring = SharedRing::new(self, self.stages);
        // Prologue fills all but one stage; each mainloop iteration issues
        // the load `stages - 1` tiles ahead of the one it consumes.
        for kt in 0..(self.stages - 1).min(k_tiles) {
            ring.load(self, job, kt);
        }
        for kt in 0..k_tiles {
            let ahead = kt + self.stages - 1;
            if ahead < k_tiles {
                ring.load(self, job, ahead);
            }
            let k_extent = self.tb_k.min(job.k_end - (job.k_begin + kt * self.tb_k));
            ring.mma(self, kt, k_extent, &mut acc);
        }
        acc
    }
}

/// `stages` shared-memory slots holding converted A (`tb_m x tb_k`) and
/// B (`tb_k x tb_n`) tiles, both row-major.
struct SharedRing {
    a: Vec<Vec<f32>>,
    b: Vec<Vec<f32>>,
    a_small: Vec<Vec<f32>>,
    b_small: Vec<Vec<f32>>,
}

impl SharedRing {
    fn new(ctx: &TileContext<'_>, stages: usize) -> Self {
        let a_len = ctx.tb_m * ctx.tb_k;
        let b_len = ctx.tb_k * ctx.tb_n;
        let split = ctx.precision == OperandPrecision::SplitTf32;
        let slots = |len: usize, used: bool| -> Vec<Vec<f32>> {
            if used { (0..stages).map(|_| vec![0.0; len]).collect() } else { Vec::new() }
        };
        Self {
            a: slots(a_len, true),
            b: slots(b_len, true),
            a_small: slots(a_len, split),
            b_small: slots(b_len, split),
        }
    }

    /// Global-to-shared copy of k-tile `kt` with out-of-bounds elements zeroed.
    fn load(&mut self, ctx: &TileContext<'_>, job: &TileJob, kt: usize) {
        let slot = kt % ctx.stages;
        let p = ctx.problem;
        let row0 = job.tile.m as usize * ctx.tb_m;
        let col0 = job.tile.n as usize * ctx.tb_n;
        let k0 = job.k_begin + kt * ctx.tb_k;
        let a_base = job.batch * p.m * p.k;
        let b_base = job.batch * p.k * p.n;

        for i in 0..ctx.tb_m {
            for kk in 0..ctx.tb_k {
                let (row, k) = (row0 + i, k0 + kk);
                let v = if row < p.m && k < job.k_end {
                    ctx.a[a_base + ctx.a_layout.offset(row, k, ctx.lda)]
                } else {
                    0.0
                };
                let dst = i * ctx.tb_k + kk;
                self.store(ctx.precision, true, slot, dst, v);
            }
        }
        for kk in 0..ctx.tb_k {
            for j in 0..ctx.tb_n {
                let (k, col) = (k0 + kk, col0 + j);
                let v = if k < job.k_end && col < p.n {
                    ctx.b[b_base + ctx.b_layout.offset(k, col, ctx.ldb)]
                } else {
                    0.0
                };
                let dst = kk * ctx.tb_n + j;
                self.store(ctx.precision, false, slot, dst, v);
            }
        }
    }

    #[inline]
    fn store(&mut self, precision: OperandPrecision, is_a: bool, slot: usize, dst: usize, v: f32) {
        let (big, small) = if is_a {
            (&mut self.a, &mut self.a_small)
        } else {
            (&mut self.b, &mut self.b_small)
        };
        match precision {
            OperandPrecision::Native => big[slot][dst] = v,
            OperandPrecision::Rounded(kind) => big[slot][dst] = kind.round(v),
            OperandPrecision::SplitTf32 => {
                let (hi, lo) = crate::core::element::split_tf32(v);
                big[slot][dst] = hi;
                small[slot][dst] = lo;
            }
        }
    }

    /// Accumulates one k-tile, one instruction-K dot product at a time.
    fn mma(&self, ctx: &TileContext<'_>, kt: usize, k_extent: usize, acc: &mut [f32]) {
        let slot = kt % ctx.stages;
        let a = &self.a[slot];
        let b = &self.b[slot];
        let split = ctx.precision == OperandPrecision::SplitTf32;

        for i in 0..ctx.tb_m {
            let a_row = &a[i * ctx.tb_k..(i + 1) * ctx.tb_k];
            let acc_row = &mut acc[i * ctx.tb_n..(i + 1) * ctx.tb_n];
            let mut k0 = 0;
            while k0 < k_extent {
                let k1 = (k0 + ctx.inst_k).min(k_extent);
                for (j, out) in acc_row.iter_mut().enumerate() {
                    let mut partial = 0.0f32;
                    for kk in k0..k1 {
                        let (ab, bb) = (a_row[kk], b[kk * ctx.tb_n + j]);
                        if split {
                            let a_s = self.a_small[slot][i * ctx.tb_k + kk];
                            let b_s = self.b_small[slot][kk * ctx.tb_n + j];
                            // Small cross terms first, then the dominant product.
                            partial += a_s * bb + ab * b_s;
                        }
                        partial += ab * bb;
                    }
                    *out += partial;
                }
                k0 = k1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::element::ElementKind;
    use crate::core::problem::ProblemSize;
    use crate::scenarios;

    fn naive(p: ProblemSize, op: &GemmOperationUniversal, a: &[f32], b: &[f32], c: &[f32], alpha: f32, beta: f32) -> Vec<f32> {
        let lda = op.a.layout.leading_dim(p.m, p.k);
        let ldb = op.b.layout.leading_dim(p.k, p.n);
        let ldc = op.c.layout.leading_dim(p.m, p.n);
        let mut d = vec![0.0; p.m * p.n];
        for i in 0..p.m {
            for j in 0..p.n {
                let mut sum = 0.0f64;
                for kk in 0..p.k {
                    sum += a[op.a.layout.offset(i, kk, lda)] as f64 * b[op.b.layout.offset(kk, j, ldb)] as f64;
                }
                let idx = op.c.layout.offset(i, j, ldc);
                d[idx] = (alpha as f64 * sum + beta as f64 * c[idx] as f64) as f32;
            }
        }
        d
    }

    fn ints(len: usize, seed: usize) -> Vec<f32> {
        (0..len).map(|i| ((i * 7 + seed * 3) % 17) as f32 - 8.0).collect()
    }

    fn launch(op: &GemmOperationUniversal, mode: GemmMode, p: ProblemSize, batch: usize, beta: f32) -> (Vec<f32>, Vec<f32>) {
        let backend = EmulatedBackend::default();
        let kernel = backend.compile(op).unwrap();
        let batches = GemmArguments::tensor_batches(mode, batch);
        let a = ints(batches * p.m * p.k, 1);
        let b = ints(batches * p.k * p.n, 2);
        let c = ints(batches * p.m * p.n, 3);
        let mut d = vec![0.0; batches * p.m * p.n];
        let mut ws = vec![0.0; GemmArguments::workspace_len(mode, p, batch)];
        backend
            .launch(
                &kernel,
                GemmArguments {
                    mode,
                    problem: p,
                    batch_count: batch,
                    alpha: 1.0,
                    beta,
                    a: &a,
                    b: &b,
                    c: &c,
                    d: &mut d,
                    workspace: &mut ws,
                },
            )
            .unwrap();
        let expected = naive(p, op, &a[..p.m * p.k], &b[..p.k * p.n], &c[..p.m * p.n], 1.0, beta);
        (d, expected)
    }

    #[test]
    fn test_gemm_matches_naive_on_ragged_problem() {
        let op = scenarios::f32t_f32n_f32t_tensor_op_bf16_f32_128x128x32();
        let p = ProblemSize::new(132, 136, 100);
        let (d, expected) = launch(&op, GemmMode::Gemm, p, 1, 2.0);
        assert_eq!(d, expected);
    }

    #[test]
    fn test_split_k_matches_gemm() {
        let op = scenarios::f32n_f32n_f32t_tensor_op_fast_accurate_f32_64x64x32();
        let p = ProblemSize::new(68, 72, 284);
        let (d, expected) = launch(&op, GemmMode::GemmSplitKParallel, p, 3, 2.0);
        assert_eq!(d, expected);
    }

    #[test]
    fn test_batched_second_batch_is_independent() {
        let op = scenarios::f32n_f32n_f32t_tensor_op_f32_128x128x32();
        let p = ProblemSize::new(8, 8, 16);
        let (d, expected) = launch(&op, GemmMode::Batched, p, 2, 0.0);
        assert_eq!(&d[..64], &expected[..]);
        assert_eq!(d.len(), 128);
    }

    #[test]
    fn test_zero_k_is_beta_c() {
        let op = scenarios::f32n_f32n_f32t_tensor_op_f32_128x128x32();
        let p = ProblemSize::new(4, 4, 0);
        let (d, _) = launch(&op, GemmMode::Gemm, p, 1, 2.0);
        let c = ints(16, 3);
        let twice: Vec<f32> = c.iter().map(|v| v * 2.0).collect();
        assert_eq!(d, twice);
    }

    #[test]
    fn test_fast_bf16_rounds_operands() {
        let op = scenarios::f32t_f32n_f32t_tensor_op_bf16_f32_128x128x32();
        let backend = EmulatedBackend::default();
        let kernel = backend.compile(&op).unwrap();
        let p = ProblemSize::new(4, 4, 4);
        // 1 + 2^-10 is not a bf16 value; bf16 rounds it to 1.
        let a = vec![1.0 + 2f32.powi(-10); 16];
        let b = vec![1.0; 16];
        let c = vec![0.0; 16];
        let mut d = vec![0.0; 16];
        backend
            .launch(
                &kernel,
                GemmArguments {
                    mode: GemmMode::Gemm,
                    problem: p,
                    batch_count: 1,
                    alpha: 1.0,
                    beta: 0.0,
                    a: &a,
                    b: &b,
                    c: &c,
                    d: &mut d,
                    workspace: &mut [],
                },
            )
            .unwrap();
        assert!(d.iter().all(|&v| v == 4.0));
    }

    #[test]
    fn test_compile_rejections() {
        let backend = EmulatedBackend::default();
        let base = scenarios::f32n_f32n_f32t_tensor_op_f32_128x128x32();

        let mut bad_warps = base;
        bad_warps.tile_description.warp_count = GemmShape::new(3, 2, 1);
        assert!(matches!(backend.compile(&bad_warps), Err(TestbedError::Compile { .. })));

        let mut bad_element = base;
        bad_element.a.element = ElementKind::F16;
        assert!(matches!(backend.compile(&bad_element), Err(TestbedError::Compile { .. })));

        let mut bad_alignment = base;
        bad_alignment.b.alignment = 8;
        assert!(matches!(backend.compile(&bad_alignment), Err(TestbedError::Compile { .. })));

        let mut too_many_stages = base;
        too_many_stages.tile_description.stages = 6;
        assert!(matches!(backend.compile(&too_many_stages), Err(TestbedError::Compile { .. })));

        let mut future_arch = base;
        future_arch.arch = 90;
        assert!(matches!(backend.compile(&future_arch), Err(TestbedError::Compile { .. })));

        let old_device = EmulatedBackend::new(EmulatedDevice::new(75));
        let mut turing = base;
        turing.arch = 75;
        assert!(matches!(old_device.compile(&turing), Err(TestbedError::Compile { .. })));
    }

    #[test]
    fn test_misaligned_problem_is_not_implementable() {
        let op = scenarios::f32n_f32n_f32t_tensor_op_f32_128x128x32();
        let backend = EmulatedBackend::default();
        let kernel = backend.compile(&op).unwrap();
        let p = ProblemSize::new(6, 8, 8);
        let (a, b, c) = (vec![0.0; 48], vec![0.0; 64], vec![0.0; 48]);
        let mut d = vec![0.0; 48];
        let result = backend.launch(
            &kernel,
            GemmArguments {
                mode: GemmMode::Gemm,
                problem: p,
                batch_count: 1,
                alpha: 1.0,
                beta: 0.0,
                a: &a,
                b: &b,
                c: &c,
                d: &mut d,
                workspace: &mut [],
            },
        );
        assert!(matches!(result, Err(TestbedError::NotImplementable { .. })));
    }

    #[test]
    fn test_every_swizzle_matches_naive() {
        for swizzle in [
            SwizzlingFunctor::Identity1,
            SwizzlingFunctor::Identity2,
            SwizzlingFunctor::Identity4,
            SwizzlingFunctor::Identity8,
            SwizzlingFunctor::Horizontal,
        ] {
            let mut op = scenarios::f32n_f32n_f32t_tensor_op_fast_accurate_f32_64x64x32();
            op.swizzling_functor = swizzle;
            // 5 x 8 tiles with ragged last row and column.
            let p = ProblemSize::new(260, 452, 100);
            let (d, expected) = launch(&op, GemmMode::Gemm, p, 1, 2.0);
            assert_eq!(d, expected, "{:?}", swizzle);
            let (d, expected) = launch(&op, GemmMode::GemmSplitKParallel, p, 2, 2.0);
            assert_eq!(d, expected, "{:?} split-k", swizzle);
        }
    }

    #[test]
    fn test_split_k_extent() {
        assert_eq!(split_k_extent(284, 3, 4), 96);
        assert_eq!(split_k_extent(92, 1, 4), 92);
        assert_eq!(split_k_extent(8, 5, 4), 4);
    }
}
