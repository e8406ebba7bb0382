// crates/ms_population/src/category/record.rs

//! Category - 分区中的一个种群切片

use std::collections::{BTreeSet, HashMap};

use ms_runtime::{AgeTotal, RuntimeScalar};

use crate::age_length::AgeLength;
use crate::model::ModelInfo;

/// 种群切片：按年龄索引的数量向量
///
/// `data[i]` 对应年龄 `min_age + i`，长度恒为 `max_age - min_age + 1`。
#[derive(Debug, Clone)]
pub struct Category<S: RuntimeScalar> {
    name: String,
    min_age: u32,
    max_age: u32,
    years: BTreeSet<u32>,
    age_length: Option<String>,
    data: Vec<S>,
    /// (年份, 时间步) -> 各年龄平均体重
    mean_weights: HashMap<(u32, usize), Vec<S>>,
    /// (年份, 时间步) -> 各年龄平均体长
    mean_lengths: HashMap<(u32, usize), Vec<S>>,
}

impl<S: RuntimeScalar> Category<S> {
    /// 创建全零类别
    pub fn new(
        name: impl Into<String>,
        min_age: u32,
        max_age: u32,
        years: BTreeSet<u32>,
        age_length: Option<String>,
    ) -> Self {
        let spread = (max_age.saturating_sub(min_age) + 1) as usize;
        Self {
            name: name.into(),
            min_age,
            max_age,
            years,
            age_length,
            data: vec![S::ZERO; spread],
            mean_weights: HashMap::new(),
            mean_lengths: HashMap::new(),
        }
    }

    /// 名称
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 最小年龄
    #[inline]
    pub fn min_age(&self) -> u32 {
        self.min_age
    }

    /// 最大年龄
    #[inline]
    pub fn max_age(&self) -> u32 {
        self.max_age
    }

    /// 年龄跨度
    #[inline]
    pub fn age_spread(&self) -> usize {
        self.data.len()
    }

    /// 年龄对应的索引
    #[inline]
    pub fn age_index(&self, age: u32) -> Option<usize> {
        (age >= self.min_age && age <= self.max_age).then(|| (age - self.min_age) as usize)
    }

    /// 有效年份
    pub fn years(&self) -> &BTreeSet<u32> {
        &self.years
    }

    /// 该年份是否有效
    #[inline]
    pub fn is_valid_in(&self, year: u32) -> bool {
        self.years.contains(&year)
    }

    /// 年龄-体长模型标签
    pub fn age_length(&self) -> Option<&str> {
        self.age_length.as_deref()
    }

    /// 各年龄数量
    #[inline]
    pub fn data(&self) -> &[S] {
        &self.data
    }

    /// 各年龄数量（可变）
    #[inline]
    pub fn data_mut(&mut self) -> &mut [S] {
        &mut self.data
    }

    /// 总数量
    pub fn total(&self) -> S {
        AgeTotal::of(&self.data)
    }

    /// 清零
    pub fn reset(&mut self) {
        self.data.iter_mut().for_each(|v| *v = S::ZERO);
    }

    /// 某年某时间步、某年龄索引处的平均体重
    ///
    /// 没有年龄-体长模型的类别按数量计，体重为 1。
    #[inline]
    pub fn mean_weight(&self, year: u32, time_step: usize, index: usize) -> S {
        self.mean_weights
            .get(&(year, time_step))
            .and_then(|w| w.get(index).copied())
            .unwrap_or(S::ONE)
    }

    /// 某年某时间步、某年龄索引处的平均体长
    #[inline]
    pub fn mean_length(&self, year: u32, time_step: usize, index: usize) -> Option<S> {
        self.mean_lengths
            .get(&(year, time_step))
            .and_then(|l| l.get(index).copied())
    }

    /// 按年龄-体长模型重建 (年份, 时间步) 缓存
    ///
    /// 缓存覆盖所有模型年份；初始化阶段使用起始年的值。
    pub fn rebuild_cache(&mut self, info: &ModelInfo, age_length: Option<&dyn AgeLength<S>>) {
        self.mean_weights.clear();
        self.mean_lengths.clear();
        let Some(model) = age_length else {
            return;
        };
        for year in info.start_year..=info.final_year {
            for ts in 0..info.time_step_count().max(1) {
                let ages = self.min_age..=self.max_age;
                let lengths: Vec<S> = ages.clone().map(|a| model.mean_length(year, ts, a)).collect();
                let weights: Vec<S> = ages.map(|a| model.mean_weight(year, ts, a)).collect();
                self.mean_lengths.insert((year, ts), lengths);
                self.mean_weights.insert((year, ts), weights);
            }
        }
    }
}
