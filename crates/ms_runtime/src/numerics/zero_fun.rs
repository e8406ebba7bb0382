// crates/ms_runtime/src/numerics/zero_fun.rs

//! ZeroFun - 近零除数替换
//!
//! 对可能为零的除数（易捕生物量、方差、CV）做平滑的正值替换，
//! 使计算走一条有限但近似的路径，而不是产生 NaN/Inf。
//!
//! ```text
//! zero_fun(x) = x                      , x >= δ
//!             = δ / (2 - x / δ)        , x <  δ
//! ```
//!
//! 在 x = δ 处连续，x → -∞ 时趋于 0⁺，因此结果始终为正。

use crate::scalar::RuntimeScalar;

/// 默认替换阈值 δ
pub const ZERO_FUN_DELTA: f64 = 1e-11;

/// 使用默认阈值的 ZeroFun
#[inline]
pub fn zero_fun<S: RuntimeScalar>(x: S) -> S {
    zero_fun_with(x, S::from_config(ZERO_FUN_DELTA))
}

/// 自定义阈值的 ZeroFun
#[inline]
pub fn zero_fun_with<S: RuntimeScalar>(x: S, delta: S) -> S {
    if x >= delta {
        x
    } else {
        delta / (S::TWO - x / delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough_above_delta() {
        assert_eq!(zero_fun(2500.0f64), 2500.0);
        assert_eq!(zero_fun(ZERO_FUN_DELTA), ZERO_FUN_DELTA);
    }

    #[test]
    fn test_zero_maps_to_half_delta() {
        let z = zero_fun(0.0f64);
        assert!((z - ZERO_FUN_DELTA / 2.0).abs() < 1e-25);
        assert!(z > 0.0);
    }

    #[test]
    fn test_negative_stays_positive() {
        let z = zero_fun_with(-10.0f64, 1.0);
        assert!((z - 1.0 / 12.0).abs() < 1e-15);
    }
}
