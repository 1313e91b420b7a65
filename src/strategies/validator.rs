// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use parking_lot::Mutex;
use scraper::Selector;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use uuid::Uuid;

/// 校验错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// 源文本无法解析
    SyntaxError,
    /// 依赖无法解析（选择器编译失败等）
    ImportError,
    /// 缺少必需的声明
    StructureError,
    /// 声明存在但取值非法
    FieldError,
}

/// 单条校验错误
#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    /// 错误分类
    #[serde(rename = "type")]
    pub kind: IssueKind,
    /// 错误信息
    pub message: String,
    /// 出错行号
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// 补充说明
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// 校验结果
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    /// 是否通过
    pub success: bool,
    /// 错误列表，按发现顺序排列
    pub errors: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// 创建空的通过结果
    pub fn ok() -> Self {
        Self {
            success: true,
            errors: Vec::new(),
        }
    }

    /// 追加一条校验错误
    pub fn add_error(
        &mut self,
        kind: IssueKind,
        message: impl Into<String>,
        line: Option<usize>,
        detail: Option<String>,
    ) {
        self.success = false;
        self.errors.push(ValidationIssue {
            kind,
            message: message.into(),
            line,
            detail,
        });
    }

    fn merge(&mut self, other: ValidationReport) {
        if !other.success {
            self.success = false;
        }
        self.errors.extend(other.errors);
    }
}

/// 策略源校验器
///
/// 对外部提交的策略源文本做三阶段门禁：语法、隔离装载、结构。
/// 语法失败时后续阶段全部跳过；结构阶段收集全部适用的错误。
pub struct StrategyValidator {
    /// 校验中的临时单元名，避免并发提交的命名冲突
    in_flight: Mutex<HashSet<String>>,
}

impl Default for StrategyValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl StrategyValidator {
    pub fn new() -> Self {
        Self {
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// 阶段一：语法校验
    ///
    /// 仅解析不装载；失败时报告唯一一条带行列号的syntax_error
    ///
    /// # 参数
    ///
    /// * `source` - 策略源文本
    pub fn validate_syntax(&self, source: &str) -> ValidationReport {
        let mut report = ValidationReport::ok();

        if let Err(e) = serde_json::from_str::<Value>(source) {
            report.add_error(
                IssueKind::SyntaxError,
                format!("Syntax error: {}", e),
                Some(e.line()),
                Some(format!("at line {}, column {}", e.line(), e.column())),
            );
        }

        report
    }

    /// 阶段二：隔离装载校验
    ///
    /// 将源文本落盘到唯一命名的临时单元并重新装载，定位唯一的
    /// 策略定义候选，再对候选执行结构校验。临时文件和在途单元名
    /// 在任何退出路径上都会被清理。
    pub fn validate_import(&self, source: &str) -> ValidationReport {
        let mut report = ValidationReport::ok();

        let temp_dir = match tempfile::Builder::new()
            .prefix("strategy_validation_")
            .tempdir()
        {
            Ok(dir) => dir,
            Err(e) => {
                report.add_error(
                    IssueKind::ImportError,
                    format!("Failed to materialize source: {}", e),
                    None,
                    None,
                );
                return report;
            }
        };

        let unit_name = self.reserve_unit_name();
        let unit_path = temp_dir.path().join(format!("{}.json", unit_name));

        self.load_isolated(&unit_path, source, &mut report);

        // 清理在任何退出路径上都执行：释放单元名，临时目录随drop删除
        self.in_flight.lock().remove(&unit_name);
        drop(temp_dir);

        report
    }

    /// 生成未被占用的临时单元名并登记为在途
    fn reserve_unit_name(&self) -> String {
        let mut in_flight = self.in_flight.lock();
        loop {
            let candidate = format!("_check_{}", &Uuid::new_v4().simple().to_string()[..8]);
            if in_flight.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    fn load_isolated(&self, unit_path: &Path, source: &str, report: &mut ValidationReport) {
        if let Err(e) = std::fs::write(unit_path, source) {
            report.add_error(
                IssueKind::ImportError,
                format!("Failed to write isolated unit: {}", e),
                None,
                None,
            );
            return;
        }

        let loaded = match std::fs::read_to_string(unit_path) {
            Ok(loaded) => loaded,
            Err(e) => {
                report.add_error(
                    IssueKind::ImportError,
                    format!("Failed to load isolated unit: {}", e),
                    None,
                    None,
                );
                return;
            }
        };

        // 语法阶段已经保证可解析，这里装载失败按import处理
        let value: Value = match serde_json::from_str(&loaded) {
            Ok(value) => value,
            Err(e) => {
                report.add_error(
                    IssueKind::ImportError,
                    format!("Failed to load module: {}", e),
                    None,
                    None,
                );
                return;
            }
        };

        // 定位唯一的策略定义候选：顶层必须是单个对象
        let candidate = match value.as_object() {
            Some(candidate) => candidate,
            None => {
                report.add_error(
                    IssueKind::StructureError,
                    "No valid strategy definition found in source",
                    None,
                    None,
                );
                return;
            }
        };

        // 提取规则中的选择器必须全部可解析，等价于依赖装载
        let mut import_failed = false;
        if let Some(fields) = candidate
            .get("parse")
            .and_then(|p| p.get("fields"))
            .and_then(|f| f.as_object())
        {
            for (field, rule) in fields {
                let Some(selector) = rule.get("selector").and_then(|s| s.as_str()) else {
                    report.add_error(
                        IssueKind::ImportError,
                        format!("Field '{}' is missing a selector", field),
                        None,
                        Some("Each parse rule must declare a CSS selector".to_string()),
                    );
                    import_failed = true;
                    continue;
                };
                if Selector::parse(selector).is_err() {
                    report.add_error(
                        IssueKind::ImportError,
                        format!("Unresolvable selector '{}' for field '{}'", selector, field),
                        None,
                        Some("Check the CSS selector syntax".to_string()),
                    );
                    import_failed = true;
                }
            }
        }

        // 装载失败时不再进入结构阶段
        if !import_failed {
            report.merge(self.validate_structure(candidate));
        }
    }

    /// 阶段三：结构校验
    ///
    /// 在候选定义上检查能力集：非空字符串`name`和`start_url`，
    /// 以及候选自身声明的`parse`节。声明缺失为structure_error，
    /// 声明存在但取值非法为field_error；所有适用错误全部收集。
    pub fn validate_structure(&self, candidate: &serde_json::Map<String, Value>) -> ValidationReport {
        let mut report = ValidationReport::ok();

        for field in ["name", "start_url"] {
            match candidate.get(field) {
                None => {
                    report.add_error(
                        IssueKind::StructureError,
                        format!("Strategy definition must declare '{}' field", field),
                        None,
                        None,
                    );
                }
                Some(Value::String(s)) if !s.trim().is_empty() => {}
                Some(Value::String(_)) => {
                    report.add_error(
                        IssueKind::FieldError,
                        format!("Strategy '{}' field cannot be empty", field),
                        None,
                        None,
                    );
                }
                Some(_) => {
                    report.add_error(
                        IssueKind::FieldError,
                        format!("Strategy '{}' field must be a non-empty string", field),
                        None,
                        None,
                    );
                }
            }
        }

        // parse必须由候选自身声明，继承默认行为不算实现
        match candidate.get("parse") {
            None => {
                report.add_error(
                    IssueKind::StructureError,
                    "Strategy definition must declare its own 'parse' section",
                    None,
                    None,
                );
            }
            Some(parse) => {
                let fields_ok = parse
                    .get("fields")
                    .map(|f| f.is_object())
                    .unwrap_or(false);
                if !parse.is_object() || !fields_ok {
                    report.add_error(
                        IssueKind::StructureError,
                        "'parse' must be a mapping declaring a 'fields' section",
                        None,
                        None,
                    );
                }
            }
        }

        report
    }

    /// 运行全部校验阶段
    ///
    /// 语法阶段失败时直接返回，后续阶段不执行
    ///
    /// # 参数
    ///
    /// * `source` - 策略源文本
    ///
    /// # 返回值
    ///
    /// 合并后的校验结果
    pub fn validate_all(&self, source: &str) -> ValidationReport {
        let syntax = self.validate_syntax(source);
        if !syntax.success {
            return syntax;
        }

        self.validate_import(source)
    }
}
