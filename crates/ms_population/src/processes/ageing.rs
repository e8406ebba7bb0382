// crates/ms_population/src/processes/ageing.rs

//! 年龄增长

use std::any::Any;

use ms_config::AgeingConfig;
use ms_foundation::{MsError, MsResult};
use ms_runtime::RuntimeScalar;

use super::traits::{BuildContext, Process, ProcessContext, ProcessType};
use crate::model::ModelInfo;
use crate::partition::CategoriesAccessor;

/// 年龄增长：每个类别的数量向高一岁平移
///
/// 有累积组时最高年龄保留并累积，否则最高年龄的数量被移出模型。
pub struct Ageing<S: RuntimeScalar> {
    label: String,
    category_labels: Vec<String>,
    accessor: CategoriesAccessor,
    age_plus: bool,
    _marker: std::marker::PhantomData<S>,
}

impl<S: RuntimeScalar> Ageing<S> {
    /// 从配置创建，类别标签已展开
    pub fn new(config: &AgeingConfig, categories: Vec<String>) -> Self {
        Self {
            label: config.label.clone(),
            category_labels: categories,
            accessor: CategoriesAccessor::default(),
            age_plus: true,
            _marker: std::marker::PhantomData,
        }
    }

    /// 目标类别
    pub fn categories(&self) -> &[String] {
        &self.category_labels
    }
}

/// 对一个数量向量做一次年龄平移
pub(crate) fn shift_ages<S: RuntimeScalar>(data: &mut [S], age_plus: bool) {
    let Some(&top) = data.last() else {
        return;
    };
    let n = data.len();
    if n == 1 {
        if !age_plus {
            data[0] = S::ZERO;
        }
        return;
    }
    data.copy_within(0..n - 1, 1);
    data[0] = S::ZERO;
    if age_plus {
        data[n - 1] += top;
    }
}

impl<S: RuntimeScalar> Process<S> for Ageing<S> {
    fn label(&self) -> &str {
        &self.label
    }

    fn type_name(&self) -> &'static str {
        "ageing"
    }

    fn process_type(&self) -> ProcessType {
        ProcessType::Ageing
    }

    fn validate(&mut self, info: &ModelInfo) -> MsResult<()> {
        if self.category_labels.is_empty() {
            return Err(MsError::invalid_config(
                format!("{}.categories", self.label),
                "[]",
                "至少需要一个类别",
            ));
        }
        self.age_plus = info.age_plus;
        Ok(())
    }

    fn build(&mut self, ctx: &BuildContext<'_, S>) -> MsResult<()> {
        self.accessor = CategoriesAccessor::new(ctx.partition, &self.category_labels)?;
        Ok(())
    }

    fn execute(&mut self, ctx: &mut ProcessContext<'_, S>) -> MsResult<()> {
        let year = ctx.year();
        let age_plus = self.age_plus;
        self.accessor.for_each_mut(ctx.partition, year, |_, category| {
            shift_ages(category.data_mut(), age_plus);
            Ok(())
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
