// crates/ms_population/src/processes/common.rs

//! 过程共用的参数处理工具

use ms_foundation::{MsError, MsResult};
use ms_runtime::RuntimeScalar;
use tracing::warn;

use crate::category::Category;

/// 单个值广播到 `count` 个位置，否则长度必须等于 `count`
pub fn broadcast<T: Clone>(values: Vec<T>, count: usize, name: &str) -> MsResult<Vec<T>> {
    match values.len() {
        1 if count != 1 => Ok(vec![values[0].clone(); count]),
        n if n == count => Ok(values),
        n => Err(MsError::size_mismatch(name, count, n)),
    }
}

/// 检查每个值都落在闭区间内
pub fn check_all_in_range(name: &str, values: &[f64], min: f64, max: f64) -> MsResult<()> {
    values
        .iter()
        .try_for_each(|&v| MsError::check_range(name, v, min, max))
}

/// 比例向量：省略时平均分配，不等于 1 时归一化并告警
pub fn normalise_proportions(label: &str, proportions: Option<&[f64]>, count: usize) -> MsResult<Vec<f64>> {
    let Some(values) = proportions else {
        return Ok(vec![1.0 / count.max(1) as f64; count]);
    };
    MsError::check_size(&format!("{label}.proportions"), count, values.len())?;
    check_all_in_range(&format!("{label}.proportions"), values, 0.0, f64::MAX)?;
    let total: f64 = values.iter().sum();
    if total <= 0.0 {
        return Err(MsError::invalid_config(
            format!("{label}.proportions"),
            total,
            "比例之和必须大于 0",
        ));
    }
    if (total - 1.0).abs() > 1e-9 {
        warn!("过程 '{}' 的比例之和为 {}，已归一化", label, total);
        return Ok(values.iter().map(|v| v / total).collect());
    }
    Ok(values.to_vec())
}

/// 年份表：年份不可重复，值与年份一一对应
pub fn year_table(label: &str, years: &[u32], values: &[f64]) -> MsResult<Vec<(u32, f64)>> {
    MsError::check_size(&format!("{label}.years"), years.len(), values.len())?;
    let mut table: Vec<(u32, f64)> = Vec::with_capacity(years.len());
    for (&year, &value) in years.iter().zip(values) {
        if table.iter().any(|(y, _)| *y == year) {
            return Err(MsError::duplicate("year", format!("{label}:{year}")));
        }
        table.push((year, value));
    }
    Ok(table)
}

/// 检查过程执行后类别中没有负值
pub fn ensure_non_negative<S: RuntimeScalar>(process: &str, category: &Category<S>) -> MsResult<()> {
    for (i, &value) in category.data().iter().enumerate() {
        if value < S::ZERO || !value.is_safe() {
            return Err(MsError::NegativePartition {
                process: process.to_string(),
                category: category.name().to_string(),
                age: category.min_age() + i as u32,
                value: value.to_report(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast() {
        assert_eq!(broadcast(vec![1], 3, "x").unwrap(), vec![1, 1, 1]);
        assert_eq!(broadcast(vec![1, 2], 2, "x").unwrap(), vec![1, 2]);
        assert!(broadcast(vec![1, 2], 3, "x").is_err());
    }

    #[test]
    fn test_normalise_keeps_ratios() {
        let p = normalise_proportions("recruitment", Some(&[3.0, 1.0]), 2).unwrap();
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!((p[0] / p[1] - 3.0).abs() < 1e-9);
        assert_eq!(normalise_proportions("recruitment", None, 4).unwrap(), vec![0.25; 4]);
    }

    #[test]
    fn test_year_table_rejects_duplicates() {
        assert!(year_table("fishing", &[1990, 1990], &[1.0, 2.0]).is_err());
        assert!(year_table("fishing", &[1990], &[1.0, 2.0]).is_err());
        assert_eq!(year_table("fishing", &[1991], &[5.0]).unwrap(), vec![(1991, 5.0)]);
    }
}
