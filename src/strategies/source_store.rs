// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 策略名称（亦即文件名）的合法模式
static STRATEGY_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[a-z][a-z0-9_]*$").unwrap());

/// 源存储错误类型
#[derive(Error, Debug)]
pub enum SourceStoreError {
    /// 名称不符合命名模式
    #[error("Invalid strategy name: {0}")]
    InvalidName(String),
    /// 同名源已存在
    #[error("Strategy '{0}' already exists")]
    AlreadyExists(String),
    /// 源不存在
    #[error("Strategy '{0}' not found")]
    NotFound(String),
    /// 受保护的名称不可删除
    #[error("Strategy '{0}' is protected and cannot be deleted")]
    Protected(String),
    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 策略源文件存储
///
/// 管理策略目录下按名称寻址的文本源，名称必须匹配
/// `^[a-z][a-z0-9_]*$`；受保护名称拒绝删除。
pub struct StrategySourceStore {
    dir: PathBuf,
    protected: HashSet<String>,
}

impl StrategySourceStore {
    /// 创建源存储，保护内置演示策略的名称
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, SourceStoreError> {
        Self::with_protected(dir, ["default", "hackernews"])
    }

    /// 创建带指定保护名单的源存储
    pub fn with_protected<I, S>(dir: impl Into<PathBuf>, protected: I) -> Result<Self, SourceStoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            protected: protected.into_iter().map(Into::into).collect(),
        })
    }

    fn source_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    fn check_name(name: &str) -> Result<(), SourceStoreError> {
        if STRATEGY_NAME_RE.is_match(name) {
            Ok(())
        } else {
            Err(SourceStoreError::InvalidName(name.to_string()))
        }
    }

    /// 判断名称是否受保护
    pub fn is_protected(&self, name: &str) -> bool {
        self.protected.contains(name)
    }

    /// 判断源是否存在
    pub fn exists(&self, name: &str) -> bool {
        Self::check_name(name).is_ok() && self.source_path(name).exists()
    }

    /// 创建新的策略源
    pub fn create(&self, name: &str, source: &str) -> Result<(), SourceStoreError> {
        Self::check_name(name)?;
        let path = self.source_path(name);
        if path.exists() {
            return Err(SourceStoreError::AlreadyExists(name.to_string()));
        }
        std::fs::write(&path, source)?;
        Ok(())
    }

    /// 覆盖已有的策略源
    pub fn edit(&self, name: &str, source: &str) -> Result<(), SourceStoreError> {
        Self::check_name(name)?;
        let path = self.source_path(name);
        if !path.exists() {
            return Err(SourceStoreError::NotFound(name.to_string()));
        }
        std::fs::write(&path, source)?;
        Ok(())
    }

    /// 读取策略源文本
    pub fn read(&self, name: &str) -> Result<String, SourceStoreError> {
        Self::check_name(name)?;
        let path = self.source_path(name);
        if !path.exists() {
            return Err(SourceStoreError::NotFound(name.to_string()));
        }
        Ok(std::fs::read_to_string(&path)?)
    }

    /// 删除策略源，受保护名称拒绝删除
    pub fn delete(&self, name: &str) -> Result<(), SourceStoreError> {
        Self::check_name(name)?;
        if self.is_protected(name) {
            return Err(SourceStoreError::Protected(name.to_string()));
        }
        let path = self.source_path(name);
        if !path.exists() {
            return Err(SourceStoreError::NotFound(name.to_string()));
        }
        std::fs::remove_file(&path)?;
        Ok(())
    }

    /// 列出全部源名称，按名称排序
    pub fn list(&self) -> Result<Vec<String>, SourceStoreError> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// 源目录路径
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
