//! Integer workloads run by the demo tasks. They exist to burn CPU between
//! prints, so `fibonacci` stays naively recursive.

/// n-th Fibonacci number, `fibonacci(0) == 0`.
pub fn fibonacci(n: u32) -> u32 {
    match n {
        0 => 0,
        1 => 1,
        _ => fibonacci(n - 1).wrapping_add(fibonacci(n - 2)),
    }
}

/// One step of the Collatz map.
pub fn collatz_step(n: u32) -> u32 {
    if n % 2 == 0 {
        n / 2
    } else {
        n.wrapping_mul(3).wrapping_add(1)
    }
}

/// Integer square root by Newton iteration: the largest `r` with `r * r <= n`.
pub fn isqrt(n: u32) -> u32 {
    if n < 2 {
        return n;
    }
    let n = n as u64;
    let mut x = n;
    let mut y = (x + 1) / 2;
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x as u32
}

/// Prime factors of `n` in ascending order, with multiplicity, written to
/// `factors`. Returns how many were written; factors that do not fit are
/// dropped.
pub fn prime_factors(mut n: u32, factors: &mut [u32]) -> usize {
    let mut count = 0;
    let mut push = |f: u32, count: &mut usize| {
        if let Some(slot) = factors.get_mut(*count) {
            *slot = f;
            *count += 1;
        }
    };

    let mut i = 2;
    while i <= isqrt(n) {
        while n % i == 0 {
            push(i, &mut count);
            n /= i;
        }
        i += 1;
    }
    if n > 1 {
        push(n, &mut count);
    }
    count
}
