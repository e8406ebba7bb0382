// crates/ms_population/src/category/definitions.rs

//! 类别定义注册表与标签简写展开
//!
//! 类别名称由格式串分块，例如格式 `sex.maturity` 下的 `male.immature`。
//! 过程与派生量的类别列表支持以下简写：
//!
//! | 写法 | 含义 |
//! |------|------|
//! | `*` | 全部类别（逐个） |
//! | `*+` | 全部类别合并为一组 |
//! | `sex=male,female` | 按某一分块取值匹配，末尾 `+` 合并 |
//! | `format=male.*` | 按完整格式匹配，`*` 通配，逗号为备选 |
//! | `a+b` | 组合类别 |

use std::collections::{BTreeSet, HashMap};

use ms_config::CategoriesConfig;
use ms_foundation::{MsError, MsResult};

use crate::model::ModelInfo;

/// 单个类别的定义
#[derive(Debug, Clone)]
pub struct CategoryDefinition {
    /// 名称
    pub name: String,
    /// 最小年龄
    pub min_age: u32,
    /// 最大年龄
    pub max_age: u32,
    /// 有效年份
    pub years: BTreeSet<u32>,
    /// 年龄-体长模型标签
    pub age_length: Option<String>,
}

/// 类别定义注册表
#[derive(Debug, Clone)]
pub struct CategoryDefinitions {
    format: Vec<String>,
    definitions: Vec<CategoryDefinition>,
    index: HashMap<String, usize>,
}

impl CategoryDefinitions {
    /// 从配置创建
    pub fn from_config(config: &CategoriesConfig, info: &ModelInfo) -> MsResult<Self> {
        let format: Vec<String> = config.format.split('.').map(str::to_string).collect();
        if format.iter().any(String::is_empty) {
            return Err(MsError::invalid_config(
                "categories.format",
                &config.format,
                "格式分块不能为空",
            ));
        }
        if !config.age_lengths.is_empty() {
            MsError::check_size(
                "categories.age_lengths",
                config.names.len(),
                config.age_lengths.len(),
            )?;
        }

        let all_years: BTreeSet<u32> = info.years().into_iter().collect();
        let mut definitions = Vec::with_capacity(config.names.len());
        let mut index = HashMap::new();
        for (i, name) in config.names.iter().enumerate() {
            if name.is_empty() {
                return Err(MsError::invalid_config("categories.names", i, "类别名称不能为空"));
            }
            let pieces = name.split('.').count();
            if pieces != format.len() {
                return Err(MsError::invalid_config(
                    "categories.names",
                    name,
                    format!("分块数 {pieces} 与格式 '{}' 不符", config.format),
                ));
            }
            if index.insert(name.clone(), i).is_some() {
                return Err(MsError::duplicate("category", name.clone()));
            }
            let age_length = config
                .age_lengths
                .get(i)
                .filter(|l| !l.is_empty())
                .cloned();
            definitions.push(CategoryDefinition {
                name: name.clone(),
                min_age: info.min_age,
                max_age: info.max_age,
                years: all_years.clone(),
                age_length,
            });
        }

        let mut defs = Self {
            format,
            definitions,
            index,
        };
        defs.apply_year_shorthand(&config.years, info)?;
        Ok(defs)
    }

    /// 全部定义
    pub fn definitions(&self) -> &[CategoryDefinition] {
        &self.definitions
    }

    /// 全部类别名称
    pub fn names(&self) -> Vec<&str> {
        self.definitions.iter().map(|d| d.name.as_str()).collect()
    }

    /// 类别数量
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// 是否存在该类别
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// 按名称查找定义
    pub fn get(&self, name: &str) -> Option<&CategoryDefinition> {
        self.index.get(name).map(|&i| &self.definitions[i])
    }

    /// 格式分块
    pub fn format(&self) -> &[String] {
        &self.format
    }

    // =========================================================================
    // 标签展开
    // =========================================================================

    /// 展开一组类别标签
    pub fn expand_labels(&self, labels: &[String]) -> MsResult<Vec<String>> {
        let mut expanded = Vec::with_capacity(labels.len());
        for label in labels {
            expanded.extend(self.expand_label(label)?);
        }
        Ok(expanded)
    }

    /// 展开单个类别标签
    pub fn expand_label(&self, label: &str) -> MsResult<Vec<String>> {
        let label = label.trim();
        if label == "*" {
            return Ok(self.definitions.iter().map(|d| d.name.clone()).collect());
        }
        if label == "*+" {
            return Ok(vec![self.join_all(self.definitions.iter().map(|d| d.name.as_str()))]);
        }

        if let Some((lhs, rhs)) = label.split_once('=') {
            let (rhs, combine) = match rhs.strip_suffix('+') {
                Some(stripped) => (stripped, true),
                None => (rhs, false),
            };
            let matched = if lhs == "format" {
                self.match_format(label, rhs)?
            } else {
                self.match_chunk(label, lhs, rhs)?
            };
            if matched.is_empty() {
                return Err(MsError::invalid_config("categories", label, "简写未匹配任何类别"));
            }
            return Ok(if combine {
                vec![self.join_all(matched.into_iter())]
            } else {
                matched.into_iter().map(str::to_string).collect()
            });
        }

        for piece in label.split('+') {
            if !self.contains(piece) {
                return Err(MsError::unknown_label("category", piece));
            }
        }
        Ok(vec![label.to_string()])
    }

    fn join_all<'a>(&self, names: impl Iterator<Item = &'a str>) -> String {
        names.collect::<Vec<_>>().join("+")
    }

    fn match_chunk<'a>(&'a self, label: &str, chunk: &str, values: &str) -> MsResult<Vec<&'a str>> {
        let Some(position) = self.format.iter().position(|c| c == chunk) else {
            return Err(MsError::invalid_config(
                "categories",
                label,
                format!("格式中不存在分块 '{chunk}'"),
            ));
        };
        let wanted: Vec<&str> = values.split(',').map(str::trim).collect();
        Ok(self
            .definitions
            .iter()
            .map(|d| d.name.as_str())
            .filter(|name| {
                name.split('.')
                    .nth(position)
                    .map(|v| wanted.contains(&v))
                    .unwrap_or(false)
            })
            .collect())
    }

    fn match_format<'a>(&'a self, label: &str, pattern: &str) -> MsResult<Vec<&'a str>> {
        let pattern: Vec<Vec<&str>> = pattern
            .split('.')
            .map(|p| p.split(',').map(str::trim).collect())
            .collect();
        if pattern.len() != self.format.len() {
            return Err(MsError::invalid_config(
                "categories",
                label,
                format!("分块数 {} 与格式分块数 {} 不符", pattern.len(), self.format.len()),
            ));
        }
        Ok(self
            .definitions
            .iter()
            .map(|d| d.name.as_str())
            .filter(|name| {
                name.split('.')
                    .zip(&pattern)
                    .all(|(value, alternatives)| {
                        alternatives.iter().any(|a| *a == "*" || *a == value)
                    })
            })
            .collect())
    }

    // =========================================================================
    // 有效年份简写
    // =========================================================================

    /// `label=1990,1991` 或 `chunk=value=1990,1991`
    fn apply_year_shorthand(&mut self, entries: &[String], info: &ModelInfo) -> MsResult<()> {
        for entry in entries {
            let parts: Vec<&str> = entry.split('=').collect();
            let (targets, years) = match parts.as_slice() {
                [name, years] => {
                    if !self.contains(name) {
                        return Err(MsError::unknown_label("category", *name));
                    }
                    (vec![name.to_string()], *years)
                }
                [chunk, value, years] => {
                    let matched = self.match_chunk(entry, chunk, value)?;
                    if matched.is_empty() {
                        return Err(MsError::invalid_config(
                            "categories.years",
                            entry,
                            "简写未匹配任何类别",
                        ));
                    }
                    (matched.into_iter().map(str::to_string).collect(), *years)
                }
                _ => {
                    return Err(MsError::invalid_config(
                        "categories.years",
                        entry,
                        "格式应为 'label=y1,y2' 或 'chunk=value=y1,y2'",
                    ))
                }
            };

            let mut parsed = BTreeSet::new();
            for raw in years.split(',').map(str::trim) {
                let year: u32 = raw.parse().map_err(|_| {
                    MsError::invalid_config("categories.years", raw, "年份不是整数")
                })?;
                if !info.is_model_year(year) {
                    return Err(MsError::out_of_range(
                        "categories.years",
                        f64::from(year),
                        f64::from(info.start_year),
                        f64::from(info.final_year),
                    ));
                }
                if !parsed.insert(year) {
                    return Err(MsError::duplicate("category year", raw));
                }
            }

            for name in targets {
                if let Some(&i) = self.index.get(&name) {
                    self.definitions[i].years = parsed.clone();
                }
            }
        }
        Ok(())
    }
}
