// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use chardetng::EncodingDetector;
use encoding_rs::Encoding;

/// 解码响应体
///
/// Content-Type头中的charset优先；缺失或无法识别时用chardetng
/// 嗅探字节流。无效字节序列按替换字符处理，不会失败。
///
/// # 参数
///
/// * `bytes` - 原始响应字节
/// * `content_type` - Content-Type响应头
///
/// # 返回值
///
/// (解码后的文本, 实际使用的编码名称)
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> (String, String) {
    if let Some(encoding) = content_type.and_then(charset_from_content_type) {
        let (text, _, _) = encoding.decode(bytes);
        return (text.into_owned(), encoding.name().to_lowercase());
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);
    let (text, _, _) = encoding.decode(bytes);
    (text.into_owned(), encoding.name().to_lowercase())
}

/// 从Content-Type头中提取charset对应的编码
fn charset_from_content_type(content_type: &str) -> Option<&'static Encoding> {
    content_type
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("charset="))
        .map(|label| label.trim_matches('"'))
        .and_then(|label| Encoding::for_label(label.as_bytes()))
}
