// crates/ms_population/src/processes/factory.rs

//! 过程工厂：按配置 `type` 构造过程并展开类别标签

use ms_config::ProcessConfig;
use ms_foundation::MsResult;
use ms_runtime::RuntimeScalar;

use super::ageing::Ageing;
use super::maturation::Maturation;
use super::mortality_constant_rate::MortalityConstantRate;
use super::mortality_event_biomass::MortalityEventBiomass;
use super::mortality_instantaneous::MortalityInstantaneous;
use super::nop::Nop;
use super::recruitment_beverton_holt::RecruitmentBevertonHolt;
use super::recruitment_constant::RecruitmentConstant;
use super::state_injection::StateInjection;
use super::traits::Process;
use super::transition_category::TransitionCategory;
use crate::category::CategoryDefinitions;

/// 创建过程
pub fn create_process<S: RuntimeScalar>(
    config: &ProcessConfig,
    definitions: &CategoryDefinitions,
) -> MsResult<Box<dyn Process<S>>> {
    let process: Box<dyn Process<S>> = match config {
        ProcessConfig::Ageing(c) => Box::new(Ageing::new(c, definitions.expand_labels(&c.categories)?)),
        ProcessConfig::RecruitmentConstant(c) => {
            Box::new(RecruitmentConstant::new(c, definitions.expand_labels(&c.categories)?))
        }
        ProcessConfig::RecruitmentBevertonHolt(c) => {
            Box::new(RecruitmentBevertonHolt::new(c, definitions.expand_labels(&c.categories)?))
        }
        ProcessConfig::MortalityConstantRate(c) => {
            Box::new(MortalityConstantRate::new(c, definitions.expand_labels(&c.categories)?))
        }
        ProcessConfig::MortalityEventBiomass(c) => {
            Box::new(MortalityEventBiomass::new(c, definitions.expand_labels(&c.categories)?))
        }
        ProcessConfig::MortalityInstantaneous(c) => {
            Box::new(MortalityInstantaneous::new(c, definitions.expand_labels(&c.categories)?))
        }
        ProcessConfig::TransitionCategory(c) => Box::new(TransitionCategory::new(
            c,
            definitions.expand_labels(&c.from)?,
            definitions.expand_labels(&c.to)?,
        )),
        ProcessConfig::Maturation(c) => Box::new(Maturation::new(
            c,
            definitions.expand_labels(&c.from)?,
            definitions.expand_labels(&c.to)?,
        )),
        ProcessConfig::StateInjection(c) => Box::new(StateInjection::new(c)),
        ProcessConfig::Nop(c) => Box::new(Nop::new(c)),
    };
    Ok(process)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processes::ProcessType;

    #[test]
    fn test_create_expands_wildcard() {
        let definitions = crate::test_support::test_definitions();
        let config: ProcessConfig = serde_yaml::from_str(
            "type: ageing\nlabel: ageing\ncategories: ['*']\n",
        )
        .unwrap();
        let process = create_process::<f64>(&config, &definitions).unwrap();
        assert_eq!(process.label(), "ageing");
        assert_eq!(process.process_type(), ProcessType::Ageing);
    }

    #[test]
    fn test_unknown_category_rejected() {
        let definitions = crate::test_support::test_definitions();
        let config: ProcessConfig = serde_yaml::from_str(
            "type: mortality_constant_rate\nlabel: m\ncategories: [mature.male]\nm: [0.1]\nselectivities: [one]\n",
        )
        .unwrap();
        let err = create_process::<f64>(&config, &definitions).err().unwrap();
        assert!(err.is_configuration());
    }
}
