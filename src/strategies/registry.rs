// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::strategies::builtin::{DefaultStrategy, HackerNewsStrategy};
use crate::strategies::document::{ScriptedStrategy, StrategyDoc};
use crate::strategies::traits::Strategy;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// 保留的回退策略名称
pub const DEFAULT_STRATEGY: &str = "default";

/// 注册表错误类型
#[derive(Error, Debug)]
pub enum RegistryError {
    /// 名称已被注册，显式的reload/edit才能替换
    #[error("Strategy '{0}' is already registered")]
    DuplicateName(String),
}

/// 提取策略注册表
///
/// 维护名称到策略实例的映射。映射整体以copy-on-write方式发布，
/// reload和编辑永远构建全新映射后一次性替换，并发的get/list
/// 不会观察到半更新状态。
pub struct StrategyRegistry {
    strategies_dir: PathBuf,
    builtins: Vec<Arc<dyn Strategy>>,
    map: RwLock<Arc<BTreeMap<String, Arc<dyn Strategy>>>>,
}

impl StrategyRegistry {
    /// 创建带标准内置策略的注册表，并执行一次目录发现
    ///
    /// # 参数
    ///
    /// * `strategies_dir` - 策略源文件目录
    pub fn new(strategies_dir: impl Into<PathBuf>) -> Self {
        Self::with_builtins(
            strategies_dir,
            vec![Arc::new(DefaultStrategy), Arc::new(HackerNewsStrategy)],
        )
    }

    /// 创建带指定内置策略的注册表
    ///
    /// 内置策略在reload时保留，不会被目录发现清除
    pub fn with_builtins(
        strategies_dir: impl Into<PathBuf>,
        builtins: Vec<Arc<dyn Strategy>>,
    ) -> Self {
        let registry = Self {
            strategies_dir: strategies_dir.into(),
            builtins,
            map: RwLock::new(Arc::new(BTreeMap::new())),
        };
        registry.reload();
        registry
    }

    /// 注册策略
    ///
    /// # 参数
    ///
    /// * `strategy` - 策略实例
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 注册成功
    /// * `Err(RegistryError)` - 名称已存在
    pub fn register(&self, strategy: Arc<dyn Strategy>) -> Result<(), RegistryError> {
        let mut guard = self.map.write();
        let name = strategy.name().to_string();
        if guard.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }

        let mut next = (**guard).clone();
        next.insert(name, strategy);
        *guard = Arc::new(next);
        Ok(())
    }

    /// 按名称获取策略
    ///
    /// 未注册的名称回退到`default`策略并记录一次告警；
    /// 仅当`default`本身缺失时返回None
    pub fn get(&self, name: &str) -> Option<Arc<dyn Strategy>> {
        let snapshot = self.map.read().clone();
        if let Some(strategy) = snapshot.get(name) {
            return Some(strategy.clone());
        }

        warn!(
            "Strategy '{}' not found, falling back to '{}'",
            name, DEFAULT_STRATEGY
        );
        snapshot.get(DEFAULT_STRATEGY).cloned()
    }

    /// 检查策略是否已注册（不触发回退）
    pub fn exists(&self, name: &str) -> bool {
        self.map.read().contains_key(name)
    }

    /// 列出全部策略
    ///
    /// # 返回值
    ///
    /// 按名称排序的 名称 → 显示标签 映射
    pub fn list(&self) -> BTreeMap<String, String> {
        self.map
            .read()
            .iter()
            .map(|(name, strategy)| (name.clone(), strategy.label().to_string()))
            .collect()
    }

    /// 重新加载全部策略
    ///
    /// 保留内置策略，重新扫描策略源目录：跳过下划线开头的文件，
    /// 单个文件加载失败仅告警跳过，同名条目首次注册生效。
    /// 新映射构建完成后整体原子发布。
    ///
    /// # 返回值
    ///
    /// 发布后注册表中的策略数量
    pub fn reload(&self) -> usize {
        let mut next: BTreeMap<String, Arc<dyn Strategy>> = BTreeMap::new();

        for builtin in &self.builtins {
            next.entry(builtin.name().to_string())
                .or_insert_with(|| builtin.clone());
        }

        self.discover_into(&mut next);

        let count = next.len();
        *self.map.write() = Arc::new(next);
        count
    }

    /// 扫描策略源目录并装入映射
    fn discover_into(&self, map: &mut BTreeMap<String, Arc<dyn Strategy>>) {
        let entries = match std::fs::read_dir(&self.strategies_dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(
                    "Strategy directory {} not readable: {}",
                    self.strategies_dir.display(),
                    e
                );
                return;
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("json"))
            .collect();
        paths.sort();

        for path in paths {
            let stem = match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) => stem,
                None => continue,
            };
            if stem.starts_with('_') {
                continue;
            }

            match Self::load_source(&path) {
                Ok(strategy) => {
                    let name = strategy.name().to_string();
                    if map.contains_key(&name) {
                        // 重复发现是无操作，首次注册生效
                        debug!("Strategy '{}' already registered, skipping {}", name, stem);
                        continue;
                    }
                    debug!("Registered strategy: {}", name);
                    map.insert(name, strategy);
                }
                Err(e) => {
                    warn!("Failed to load strategy source {}: {}", path.display(), e);
                }
            }
        }
    }

    fn load_source(path: &Path) -> anyhow::Result<Arc<dyn Strategy>> {
        let source = std::fs::read_to_string(path)?;
        let doc: StrategyDoc = serde_json::from_str(&source)?;
        let strategy = ScriptedStrategy::compile(doc)?;
        Ok(Arc::new(strategy))
    }
}
