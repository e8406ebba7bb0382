// crates/ms_runtime/src/numerics/age_total.rs

//! 年龄向量的补偿累加
//!
//! 丰度、生物量与易捕生物量都是 `Σ n_a · w_a` 形式的乘积和，`w_a` 由选择性、
//! 平均体重与存活率相乘得到。初始化阶段要运行数百年，f32 下的累加误差会
//! 进入 B0 缩放与收敛判断，因此这些求和统一经过 Kahan 补偿。

use crate::scalar::RuntimeScalar;

/// 年龄向量的补偿累加器
///
/// # 示例
///
/// ```rust
/// use ms_runtime::numerics::AgeTotal;
///
/// let numbers_at_age = [60000.0f64, 56223.4, 52781.2];
/// let mean_weight = [0.5f64, 1.0, 2.0];
///
/// let mut biomass = AgeTotal::new();
/// for (&n, &w) in numbers_at_age.iter().zip(&mean_weight) {
///     biomass.add_weighted(n, w);
/// }
/// assert!((biomass.total() - 191785.8).abs() < 1e-9);
/// assert!((AgeTotal::of(&numbers_at_age) - 169004.6).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct AgeTotal<S: RuntimeScalar> {
    sum: S,
    compensation: S,
}

impl<S: RuntimeScalar> AgeTotal<S> {
    /// 空累加器
    pub fn new() -> Self {
        Self {
            sum: S::ZERO,
            compensation: S::ZERO,
        }
    }

    /// 累加一个年龄组的数量
    #[inline]
    pub fn add(&mut self, value: S) {
        let y = value - self.compensation;
        let t = self.sum + y;
        self.compensation = (t - self.sum) - y;
        self.sum = t;
    }

    /// 累加 `numbers · weight`
    #[inline]
    pub fn add_weighted(&mut self, numbers: S, weight: S) {
        self.add(numbers * weight);
    }

    /// 当前总量
    #[inline]
    pub fn total(&self) -> S {
        self.sum
    }

    /// 一个年龄向量的总数量
    pub fn of(values: &[S]) -> S {
        values.iter().copied().collect::<Self>().total()
    }
}

impl<S: RuntimeScalar> Extend<S> for AgeTotal<S> {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for v in iter {
            self.add(v);
        }
    }
}

impl<S: RuntimeScalar> FromIterator<S> for AgeTotal<S> {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut total = Self::new();
        total.extend(iter);
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_many_small_age_classes_f32() {
        // 1000 个年龄组各 0.1 尾
        let data = vec![0.1f32; 1000];
        assert!((AgeTotal::of(&data) - 100.0).abs() < 1e-4);
    }

    #[test]
    fn test_large_plus_group_does_not_swallow_small_ages() {
        let mut total = AgeTotal::<f32>::new();
        total.add(1.0e8);
        for _ in 0..1000 {
            total.add(1.0);
        }
        // 逐项相加会全部丢失
        assert!((total.total() - 100_001_000.0).abs() <= 8.0);
    }

    #[test]
    fn test_weighted_matches_products() {
        let numbers = [100.0f64, 50.0, 25.0];
        let weights = [0.2f64, 0.4, 0.8];
        let mut biomass = AgeTotal::new();
        for (&n, &w) in numbers.iter().zip(&weights) {
            biomass.add_weighted(n, w);
        }
        assert_eq!(biomass.total(), 60.0);
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(AgeTotal::<f64>::of(&[]), 0.0);
        assert_eq!(AgeTotal::<f64>::default().total(), 0.0);
    }
}
