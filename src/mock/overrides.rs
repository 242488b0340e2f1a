use crate::params::WorkstepParams;
use crate::template::{Template, parse_template};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

const PREFIX: &str = "_";
const SUFFIX: &str = "_mock";

/// 字段覆盖：`_<dottedPath>_mock=<template>`
#[derive(Debug, Clone, PartialEq)]
pub struct FieldOverride {
    /// 去掉 oneOf 前缀后的点号路径
    pub path: String,
    /// `_1.card.number_mock` 中的 `1`
    pub one_of_index: Option<usize>,
    pub template: Template,
}

fn one_of_prefix() -> &'static Regex {
    static ONE_OF_PREFIX: OnceLock<Regex> = OnceLock::new();
    ONE_OF_PREFIX.get_or_init(|| Regex::new(r"^([0-9]+)\.").expect("static oneOf pattern"))
}

/// 解析单个参数键，不是覆盖键时返回 None
pub fn parse_override_key(key: &str) -> Option<(String, Option<usize>)> {
    let inner = key.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)?;

    let (path, index) = match one_of_prefix().captures(inner) {
        Some(caps) => {
            let prefix_len = caps[0].len();
            (&inner[prefix_len..], caps[1].parse::<usize>().ok())
        }
        None => (inner, None),
    };

    if path.is_empty() {
        return None;
    }
    Some((path.to_string(), index))
}

/// 按请求顺序收集所有覆盖
pub fn collect_overrides(params: &WorkstepParams) -> Vec<FieldOverride> {
    params
        .iter()
        .filter_map(|(key, value)| {
            let (path, one_of_index) = parse_override_key(key)?;
            Some(FieldOverride {
                path,
                one_of_index,
                template: parse_template(value),
            })
        })
        .collect()
}

/// 选择 oneOf 候选：恰好一个候选下标被覆盖引用时选它，否则选 0
pub fn select_one_of(overrides: &[FieldOverride], alternatives: usize) -> usize {
    let referenced: BTreeSet<usize> = overrides
        .iter()
        .filter_map(|o| o.one_of_index)
        .filter(|&index| index < alternatives)
        .collect();

    match referenced.len() {
        1 => referenced.into_iter().next().unwrap_or(0),
        _ => 0,
    }
}
