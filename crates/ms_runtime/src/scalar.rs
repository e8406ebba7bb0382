// crates/ms_runtime/src/scalar.rs

//! RuntimeScalar - 标量类型抽象
//!
//! 种群动态核心的所有数值状态（丰度、选择性、死亡率、派生量）都通过此 trait
//! 表达，引擎层代码不出现硬编码的 `f64`。
//!
//! # 设计原则
//!
//! 1. **开放 Trait**: f32/f64 已实现；自动微分标量可以自行实现以接入估计器
//! 2. **零成本抽象**: `#[inline]` + 编译期单态化
//! 3. **从配置转换**: `from_config(f64)` 用于从配置层（全 f64）转换
//!
//! # 使用规范
//!
//! ```rust
//! use ms_runtime::RuntimeScalar;
//!
//! // Layer 3 引擎层使用泛型
//! fn survival<S: RuntimeScalar>(m: S, selectivity: S) -> S {
//!     (-(m * selectivity)).exp()
//! }
//!
//! assert!((survival(0.065f64, 1.0) - (-0.065f64).exp()).abs() < 1e-15);
//! ```

use std::fmt::{Debug, Display};
use std::iter::Sum;

use num_traits::{Float, FromPrimitive, NumAssign, ToPrimitive};

/// 运行时标量类型
///
/// 所有 Layer 3 引擎层组件使用此 trait 作为泛型边界。
///
/// # 架构约束
///
/// - **允许**: 在 Layer 3 引擎层作为泛型约束 `<S: RuntimeScalar>`
/// - **禁止**: 在 Layer 4/5 应用层使用任何泛型参数
/// - **禁止**: 作为 trait 对象使用 `&dyn RuntimeScalar`
pub trait RuntimeScalar:
    Float
    + FromPrimitive
    + ToPrimitive
    + NumAssign
    + Copy
    + Debug
    + Display
    + Send
    + Sync
    + Sum
    + Default
    + 'static
{
    /// 零值
    const ZERO: Self;
    /// 一
    const ONE: Self;
    /// 二
    const TWO: Self;
    /// 二分之一
    const HALF: Self;

    /// 从配置层的 f64 转换
    ///
    /// 超出目标类型可表示范围时返回 NaN，后续的有限性检查会拦截。
    #[inline]
    fn from_config(value: f64) -> Self {
        Self::from_f64(value).unwrap_or_else(Self::nan)
    }

    /// 从无符号整数（年龄、年份偏移）转换
    #[inline]
    fn from_count(value: u32) -> Self {
        Self::from_u32(value).unwrap_or_else(Self::nan)
    }

    /// 转换为 f64，用于日志与报告
    #[inline]
    fn to_report(self) -> f64 {
        self.to_f64().unwrap_or(f64::NAN)
    }

    /// 检查是否有限（非 NaN、非 Inf）
    #[inline]
    fn is_safe(self) -> bool {
        self.is_finite()
    }

    /// 限制在范围内
    #[inline]
    fn clamp_value(self, min: Self, max: Self) -> Self {
        if self < min {
            min
        } else if self > max {
            max
        } else {
            self
        }
    }
}

impl RuntimeScalar for f32 {
    const ZERO: f32 = 0.0;
    const ONE: f32 = 1.0;
    const TWO: f32 = 2.0;
    const HALF: f32 = 0.5;
}

impl RuntimeScalar for f64 {
    const ZERO: f64 = 0.0;
    const ONE: f64 = 1.0;
    const TWO: f64 = 2.0;
    const HALF: f64 = 0.5;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(f32::HALF, 0.5f32);
        assert_eq!(f64::TWO, 2.0f64);
    }

    #[test]
    fn test_from_config() {
        assert_eq!(f64::from_config(0.065), 0.065);
        assert_eq!(f32::from_config(0.5), 0.5f32);
        assert!(f32::from_config(1e300).is_infinite() || f32::from_config(1e300).is_nan());
    }

    #[test]
    fn test_clamp_value() {
        assert_eq!(1.5f64.clamp_value(0.0, 0.99), 0.99);
        assert_eq!((-0.2f64).clamp_value(0.0, 0.99), 0.0);
        assert_eq!(0.3f64.clamp_value(0.0, 0.99), 0.3);
    }
}
