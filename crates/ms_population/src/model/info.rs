// crates/ms_population/src/model/info.rs

//! 模型全局信息与运行状态

use ms_config::ModelSection;

/// 模型运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModelState {
    /// 尚未开始
    #[default]
    Start,
    /// 参数验证
    Validate,
    /// 对象构建
    Build,
    /// 构建后校验
    Verify,
    /// 初始化阶段
    Initialise,
    /// 主年循环
    Execute,
    /// 一次完整迭代结束
    IterationComplete,
    /// 重置
    Reset,
    /// 结束
    Finalise,
}

impl ModelState {
    /// 状态名
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Validate => "validate",
            Self::Build => "build",
            Self::Verify => "verify",
            Self::Initialise => "initialise",
            Self::Execute => "execute",
            Self::IterationComplete => "iteration_complete",
            Self::Reset => "reset",
            Self::Finalise => "finalise",
        }
    }
}

/// 模型全局信息
///
/// 各过程、时间步与派生量通过只读引用读取当前年份、时间步与状态。
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// 起始年
    pub start_year: u32,
    /// 终止年（含）
    pub final_year: u32,
    /// 最小年龄
    pub min_age: u32,
    /// 最大年龄
    pub max_age: u32,
    /// 最大年龄是否为累积组
    pub age_plus: bool,
    /// 当前状态
    pub state: ModelState,
    /// 当前年份
    pub current_year: u32,
    /// 当前时间步索引
    pub current_time_step: usize,
    /// 当前初始化阶段索引
    pub current_initialisation_phase: usize,
    /// 年内时间步标签（有序）
    pub time_step_labels: Vec<String>,
    /// 初始化阶段标签（有序）
    pub initialisation_phase_labels: Vec<String>,
}

impl ModelInfo {
    /// 从模型配置段创建
    pub fn from_section(section: &ModelSection) -> Self {
        Self {
            start_year: section.start_year,
            final_year: section.final_year,
            min_age: section.min_age,
            max_age: section.max_age,
            age_plus: section.age_plus,
            state: ModelState::Start,
            current_year: section.start_year,
            current_time_step: 0,
            current_initialisation_phase: 0,
            time_step_labels: section.time_steps.clone(),
            initialisation_phase_labels: section.initialisation_phases.clone(),
        }
    }

    /// 年龄跨度
    #[inline]
    pub fn age_spread(&self) -> usize {
        (self.max_age - self.min_age + 1) as usize
    }

    /// 模型年数
    #[inline]
    pub fn year_count(&self) -> usize {
        (self.final_year - self.start_year + 1) as usize
    }

    /// 模型年份
    pub fn years(&self) -> Vec<u32> {
        (self.start_year..=self.final_year).collect()
    }

    /// 是否为模型年份
    #[inline]
    pub fn is_model_year(&self, year: u32) -> bool {
        year >= self.start_year && year <= self.final_year
    }

    /// 年份在模型年份中的索引
    #[inline]
    pub fn year_index(&self, year: u32) -> Option<usize> {
        self.is_model_year(year)
            .then(|| (year - self.start_year) as usize)
    }

    /// 时间步数量
    #[inline]
    pub fn time_step_count(&self) -> usize {
        self.time_step_labels.len()
    }

    /// 时间步标签对应的索引
    pub fn time_step_index(&self, label: &str) -> Option<usize> {
        self.time_step_labels.iter().position(|l| l == label)
    }

    /// 初始化阶段标签对应的索引
    pub fn initialisation_phase_index(&self, label: &str) -> Option<usize> {
        self.initialisation_phase_labels.iter().position(|l| l == label)
    }

    /// 是否处于初始化状态
    #[inline]
    pub fn is_initialising(&self) -> bool {
        self.state == ModelState::Initialise
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::test_info;

    #[test]
    fn test_year_helpers() {
        let info = test_info(1990, 1992, 1, 10);
        assert_eq!(info.age_spread(), 10);
        assert_eq!(info.year_count(), 3);
        assert_eq!(info.year_index(1991), Some(1));
        assert_eq!(info.year_index(1989), None);
        assert_eq!(info.time_step_index("step_one"), Some(0));
    }
}
