use rayon::prelude::*;
use crate::core::operation::GemmOperationUniversal;
use crate::core::problem::ProblemSize;

/// Host GEMM in f64 over unconverted operands, finished with the
/// operation's own epilogue.
///
/// `a`, `b` and `c` are densely packed in the operation's layouts with
/// `batches` problems back to back; the result has C's layout.
pub fn reference_gemm(
    op: &GemmOperationUniversal,
    problem: ProblemSize,
    batches: usize,
    alpha: f32,
    beta: f32,
    a: &[f32],
    b: &[f32],
    c: &[f32],
) -> Vec<f32> {
    let ProblemSize { m, n, k } = problem;
    let mut d = vec![0.0f32; batches * m * n];
    if m == 0 || n == 0 {
        return d;
    }

    let lda = op.a.layout.leading_dim(m, k);
    let ldb = op.b.layout.leading_dim(k, n);
    let ldc = op.c.layout.leading_dim(m, n);

    for batch in 0..batches {
        let a = &a[batch * m * k..(batch + 1) * m * k];
        let b = &b[batch * k * n..(batch + 1) * k * n];
        let mut acc = vec![0.0f64; m * n];
        acc.par_chunks_mut(n).enumerate().for_each(|(i, row)| {
            for (j, out) in row.iter_mut().enumerate() {
                let mut sum = 0.0f64;
                for p in 0..k {
                    sum += a[op.a.layout.offset(i, p, lda)] as f64 * b[op.b.layout.offset(p, j, ldb)] as f64;
                }
                *out = sum;
            }
        });

        let base = batch * m * n;
        for i in 0..m {
            for j in 0..n {
                let idx = base + op.c.layout.offset(i, j, ldc);
                d[idx] = op.epilogue_functor.apply(alpha, acc[i * n + j] as f32, beta, c[idx]);
            }
        }
    }
    d
}
