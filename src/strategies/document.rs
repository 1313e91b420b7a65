// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::strategies::traits::{ParseError, Strategy};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// 声明式策略文档
///
/// 运行时提交的策略源文本的结构化形式：名称、起始URL和一组
/// 按字段命名的CSS选择器提取规则。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyDoc {
    /// 策略名称
    pub name: String,
    /// 起始URL
    #[serde(default)]
    pub start_url: Option<String>,
    /// 提取规则声明
    pub parse: ParseSpec,
}

/// 提取规则集合
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseSpec {
    /// 字段名 → 提取规则，按字段名排序
    pub fields: BTreeMap<String, FieldRule>,
}

/// 单字段提取规则
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRule {
    /// CSS选择器
    pub selector: String,
    /// 提取的属性名，缺省时提取元素文本
    #[serde(default)]
    pub attr: Option<String>,
    /// 是否提取全部匹配（数组），缺省仅取第一个
    #[serde(default)]
    pub all: bool,
}

/// 策略文档编译错误
#[derive(Error, Debug)]
pub enum CompileError {
    /// 选择器无法解析
    #[error("Unresolvable selector '{selector}' for field '{field}'")]
    InvalidSelector { field: String, selector: String },
}

struct CompiledField {
    name: String,
    selector: Selector,
    attr: Option<String>,
    all: bool,
}

/// 脚本化策略
///
/// 由校验通过的策略文档编译而来，选择器在注册时一次性编译
pub struct ScriptedStrategy {
    doc: StrategyDoc,
    compiled: Vec<CompiledField>,
}

impl ScriptedStrategy {
    /// 编译策略文档
    ///
    /// # 参数
    ///
    /// * `doc` - 已通过校验的策略文档
    ///
    /// # 返回值
    ///
    /// * `Ok(ScriptedStrategy)` - 可执行的策略实例
    /// * `Err(CompileError)` - 存在无法解析的选择器
    pub fn compile(doc: StrategyDoc) -> Result<Self, CompileError> {
        let mut compiled = Vec::with_capacity(doc.parse.fields.len());
        for (field, rule) in &doc.parse.fields {
            let selector =
                Selector::parse(&rule.selector).map_err(|_| CompileError::InvalidSelector {
                    field: field.clone(),
                    selector: rule.selector.clone(),
                })?;
            compiled.push(CompiledField {
                name: field.clone(),
                selector,
                attr: rule.attr.clone(),
                all: rule.all,
            });
        }
        Ok(Self { doc, compiled })
    }

    fn extract(element: ElementRef, attr: &Option<String>) -> Option<String> {
        match attr {
            Some(attr) => element.value().attr(attr).map(|v| v.to_string()),
            None => {
                let text = element.text().collect::<String>().trim().to_string();
                if text.is_empty() {
                    None
                } else {
                    Some(text)
                }
            }
        }
    }
}

impl Strategy for ScriptedStrategy {
    fn name(&self) -> &str {
        &self.doc.name
    }

    fn label(&self) -> &str {
        "ScriptedStrategy"
    }

    fn start_url(&self) -> Option<&str> {
        self.doc.start_url.as_deref()
    }

    fn parse(
        &self,
        raw_content: &str,
        _url: &str,
        _headers: &HashMap<String, String>,
    ) -> Result<Value, ParseError> {
        let document = Html::parse_document(raw_content);
        let mut data = Map::new();

        for field in &self.compiled {
            if field.all {
                let values: Vec<Value> = document
                    .select(&field.selector)
                    .filter_map(|el| Self::extract(el, &field.attr))
                    .map(Value::String)
                    .collect();
                if !values.is_empty() {
                    data.insert(field.name.clone(), Value::Array(values));
                }
            } else if let Some(value) = document
                .select(&field.selector)
                .next()
                .and_then(|el| Self::extract(el, &field.attr))
            {
                data.insert(field.name.clone(), Value::String(value));
            }
            // 未命中的字段直接省略
        }

        Ok(Value::Object(data))
    }
}
