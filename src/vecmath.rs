//! Vector kernels used by the dense network.
//!
//! Plain safe loops over slices; callers validate lengths at the API boundary.

/// `y[i] += a * x[i]` for all `i`.
#[inline]
pub(crate) fn add_scaled(y: &mut [f32], a: f32, x: &[f32]) {
    debug_assert_eq!(y.len(), x.len());

    for (yi, &xi) in y.iter_mut().zip(x) {
        *yi = a.mul_add(xi, *yi);
    }
}

#[inline]
pub(crate) fn dot(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    let mut acc = 0.0_f32;
    for (&av, &bv) in a.iter().zip(b) {
        acc = av.mul_add(bv, acc);
    }
    acc
}
