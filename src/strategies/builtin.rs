// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::strategies::traits::{ParseError, Strategy};
use scraper::{ElementRef, Html, Selector};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

/// 默认策略
///
/// 通用网页抓取，不做任何提取，原样返回响应内容
pub struct DefaultStrategy;

impl Strategy for DefaultStrategy {
    fn name(&self) -> &str {
        "default"
    }

    fn label(&self) -> &str {
        "DefaultStrategy"
    }

    fn parse(
        &self,
        raw_content: &str,
        _url: &str,
        _headers: &HashMap<String, String>,
    ) -> Result<Value, ParseError> {
        Ok(Value::String(raw_content.to_string()))
    }
}

/// Hacker News策略
///
/// 从Hacker News首页提取新闻条目：标题、链接、排名、分数、
/// 作者、发布时间、评论数和来源站点。
pub struct HackerNewsStrategy;

impl HackerNewsStrategy {
    fn element_text(element: ElementRef) -> String {
        element.text().collect::<String>().trim().to_string()
    }

    fn select_first_text(root: &Html, selector: &Selector) -> Option<String> {
        root.select(selector)
            .next()
            .map(Self::element_text)
            .filter(|s| !s.is_empty())
    }
}

impl Strategy for HackerNewsStrategy {
    fn name(&self) -> &str {
        "hackernews"
    }

    fn label(&self) -> &str {
        "HackerNewsStrategy"
    }

    fn start_url(&self) -> Option<&str> {
        Some("https://news.ycombinator.com")
    }

    fn parse(
        &self,
        raw_content: &str,
        _url: &str,
        _headers: &HashMap<String, String>,
    ) -> Result<Value, ParseError> {
        let document = Html::parse_document(raw_content);

        let story_sel = Selector::parse("tr.athing.submission").unwrap();
        let rank_sel = Selector::parse("span.rank").unwrap();
        let title_sel = Selector::parse("span.titleline > a").unwrap();
        let site_sel = Selector::parse("span.sitestr").unwrap();
        let score_sel = Selector::parse("span.score").unwrap();
        let author_sel = Selector::parse("a.hnuser").unwrap();
        let age_sel = Selector::parse("span.age").unwrap();
        let age_link_sel = Selector::parse("span.age > a").unwrap();
        let subtext_link_sel = Selector::parse("td.subtext a").unwrap();
        let me_sel = Selector::parse("a#me").unwrap();
        let karma_sel = Selector::parse("span#karma").unwrap();

        let mut data = Map::new();

        // 页眉中的登录用户信息
        let mut user_info = Map::new();
        if let Some(username) = Self::select_first_text(&document, &me_sel) {
            user_info.insert("username".to_string(), Value::String(username));
        }
        if let Some(karma) = Self::select_first_text(&document, &karma_sel)
            .and_then(|k| k.parse::<i64>().ok())
        {
            user_info.insert("karma".to_string(), json!(karma));
        }
        if !user_info.is_empty() {
            data.insert("user_info".to_string(), Value::Object(user_info));
        }

        let mut news_items = Vec::new();

        for story in document.select(&story_sel) {
            let mut item = Map::new();

            if let Some(id) = story.value().attr("id") {
                item.insert("id".to_string(), Value::String(id.to_string()));
            }

            if let Some(rank) = story
                .select(&rank_sel)
                .next()
                .map(Self::element_text)
                .and_then(|r| r.trim_end_matches('.').parse::<i64>().ok())
            {
                item.insert("rank".to_string(), json!(rank));
            }

            if let Some(title_elem) = story.select(&title_sel).next() {
                item.insert(
                    "title".to_string(),
                    Value::String(Self::element_text(title_elem)),
                );
                item.insert(
                    "url".to_string(),
                    Value::String(title_elem.value().attr("href").unwrap_or("").to_string()),
                );
            }

            if let Some(site) = story.select(&site_sel).next().map(Self::element_text) {
                item.insert("site".to_string(), Value::String(site));
            }

            // 元数据在下一个兄弟行（分数、作者、时间、评论数）
            if let Some(meta_row) = story.next_siblings().filter_map(ElementRef::wrap).next() {
                if let Some(points) = meta_row
                    .select(&score_sel)
                    .next()
                    .map(Self::element_text)
                    .and_then(|s| s.split_whitespace().next().and_then(|n| n.parse::<i64>().ok()))
                {
                    item.insert("points".to_string(), json!(points));
                }

                if let Some(author) = meta_row.select(&author_sel).next().map(Self::element_text) {
                    item.insert("author".to_string(), Value::String(author));
                }

                if let Some(posted) = meta_row
                    .select(&age_sel)
                    .next()
                    .and_then(|e| e.value().attr("title"))
                {
                    item.insert("posted_time".to_string(), Value::String(posted.to_string()));
                }

                if let Some(relative) =
                    meta_row.select(&age_link_sel).next().map(Self::element_text)
                {
                    item.insert("relative_time".to_string(), Value::String(relative));
                }

                if let Some(comments) = meta_row
                    .select(&subtext_link_sel)
                    .map(Self::element_text)
                    .find(|t| t.contains("comment"))
                    .and_then(|t| {
                        let normalized = t.replace('\u{a0}', " ");
                        normalized
                            .split_whitespace()
                            .next()
                            .and_then(|n| n.parse::<i64>().ok())
                    })
                {
                    item.insert("comments".to_string(), json!(comments));
                }
            }

            news_items.push(Value::Object(item));
        }

        data.insert("total_items".to_string(), json!(news_items.len()));
        data.insert("news_items".to_string(), Value::Array(news_items));

        Ok(Value::Object(data))
    }
}
