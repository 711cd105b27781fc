// Copyright 2026 The Matrix.org Foundation C.I.C.
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

//! Codecs between editor markup and a custom markup dialect.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Externally supplied codec for the `bbcode` format.
pub trait MarkupCodec {
    /// Markup dialect -> HTML.
    fn parse(&self, markup: &str) -> String;

    /// HTML -> markup dialect.
    fn build(&self, html: &str) -> String;
}

/// (bbcode tag, html tag written by `parse`, html tags read by `build`)
const INLINE_TAGS: [(&str, &str, &str); 4] = [
    ("b", "strong", "strong|b"),
    ("i", "em", "em|i"),
    ("u", "u", "u"),
    ("s", "s", "s|strike|del"),
];

struct InlineRule {
    bb_open: Regex,
    bb_close: Regex,
    html_open: Regex,
    html_close: Regex,
    bb: &'static str,
    html: &'static str,
}

static INLINE_RULES: Lazy<Vec<InlineRule>> = Lazy::new(|| {
    INLINE_TAGS
        .iter()
        .map(|&(bb, html, html_names)| InlineRule {
            bb_open: Regex::new(&format!(r"(?i)\[{bb}\]")).unwrap(),
            bb_close: Regex::new(&format!(r"(?i)\[/{bb}\]")).unwrap(),
            html_open: Regex::new(&format!(r"(?i)<({html_names})(\s[^>]*)?>"))
                .unwrap(),
            html_close: Regex::new(&format!(r"(?i)</({html_names})\s*>"))
                .unwrap(),
            bb,
            html,
        })
        .collect()
});

static BB_BARE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[url\]([^\[]*)\[/url\]").unwrap());
static BB_URL_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[url=([^\]]*)\]").unwrap());
static BB_URL_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[/url\]").unwrap());
static HTML_LINK_OPEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<a\s[^>]*href\s*=\s*"([^"]*)"[^>]*>"#).unwrap()
});
static HTML_LINK_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</a\s*>").unwrap());
static HTML_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static HTML_BLOCK_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(p|div)(\s[^>]*)?>").unwrap());
static HTML_BLOCK_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</(p|div)\s*>").unwrap());
static HTML_ANY_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// BBCode for the tags the editor renders inline: `[b] [i] [u] [s]`,
/// `[url]...[/url]` and `[url=...]...[/url]`. Lines map to paragraphs.
#[derive(Clone, Copy, Debug, Default)]
pub struct BbcodeCodec;

impl MarkupCodec for BbcodeCodec {
    fn parse(&self, markup: &str) -> String {
        let mut html = String::new();
        for line in markup.split('\n') {
            let line = convert_bbcode_line(line);
            if line.is_empty() {
                html.push_str("<p><br></p>");
            } else {
                html.push_str("<p>");
                html.push_str(&line);
                html.push_str("</p>");
            }
        }
        html
    }

    fn build(&self, html: &str) -> String {
        let mut text = HTML_BREAK.replace_all(html, "").into_owned();
        text = HTML_BLOCK_OPEN.replace_all(&text, "").into_owned();
        text = HTML_BLOCK_CLOSE.replace_all(&text, "\n").into_owned();
        text = HTML_LINK_OPEN
            .replace_all(&text, |caps: &Captures| format!("[url={}]", &caps[1]))
            .into_owned();
        text = HTML_LINK_CLOSE.replace_all(&text, "[/url]").into_owned();
        for rule in INLINE_RULES.iter() {
            let open = format!("[{}]", rule.bb);
            let close = format!("[/{}]", rule.bb);
            text = rule.html_open.replace_all(&text, open.as_str()).into_owned();
            text = rule.html_close.replace_all(&text, close.as_str()).into_owned();
        }
        text = HTML_ANY_TAG.replace_all(&text, "").into_owned();
        let text = html_escape::decode_html_entities(&text);
        text.strip_suffix('\n').unwrap_or(&*text).to_owned()
    }
}

fn convert_bbcode_line(line: &str) -> String {
    let mut html = html_escape::encode_text(line).into_owned();
    html = BB_BARE_URL
        .replace_all(&html, |caps: &Captures| {
            format!(r#"<a href="{}">{}</a>"#, attribute_url(&caps[1]), &caps[1])
        })
        .into_owned();
    html = BB_URL_OPEN
        .replace_all(&html, |caps: &Captures| {
            format!(r#"<a href="{}">"#, attribute_url(&caps[1]))
        })
        .into_owned();
    html = BB_URL_CLOSE.replace_all(&html, "</a>").into_owned();
    for rule in INLINE_RULES.iter() {
        let open = format!("<{}>", rule.html);
        let close = format!("</{}>", rule.html);
        html = rule.bb_open.replace_all(&html, open.as_str()).into_owned();
        html = rule.bb_close.replace_all(&html, close.as_str()).into_owned();
    }
    html
}

/// Re-escape a URL taken from already escaped text for use in a double
/// quoted attribute.
fn attribute_url(escaped: &str) -> String {
    let url = html_escape::decode_html_entities(escaped);
    html_escape::encode_double_quoted_attribute(&url).into_owned()
}

#[cfg(test)]
mod test {
    use super::{BbcodeCodec, MarkupCodec};

    #[test]
    fn inline_tags_become_html() {
        assert_eq!(
            BbcodeCodec.parse("[b]bold[/b] and [i]it[/i]"),
            "<p><strong>bold</strong> and <em>it</em></p>"
        );
    }

    #[test]
    fn lines_become_paragraphs() {
        assert_eq!(
            BbcodeCodec.parse("one\n\ntwo"),
            "<p>one</p><p><br></p><p>two</p>"
        );
    }

    #[test]
    fn text_is_escaped_when_parsing() {
        assert_eq!(BbcodeCodec.parse("a < b"), "<p>a &lt; b</p>");
    }

    #[test]
    fn urls_become_links() {
        assert_eq!(
            BbcodeCodec.parse("[url]https://matrix.org[/url]"),
            r#"<p><a href="https://matrix.org">https://matrix.org</a></p>"#
        );
        assert_eq!(
            BbcodeCodec.parse("[url=https://matrix.org]Matrix[/url]"),
            r#"<p><a href="https://matrix.org">Matrix</a></p>"#
        );
    }

    #[test]
    fn html_builds_back_to_bbcode() {
        assert_eq!(
            BbcodeCodec.build(
                r#"<p><strong>a</strong> <a href="https://x.org" target="_blank">b</a></p><p><br></p><p>c &amp; d</p>"#
            ),
            "[b]a[/b] [url=https://x.org]b[/url]\n\nc & d"
        );
    }

    #[test]
    fn build_does_not_confuse_similar_tags() {
        assert_eq!(
            BbcodeCodec.build("<p><span>x</span><ul><li>y</li></ul></p>"),
            "xy"
        );
    }

    #[test]
    fn url_ampersands_are_escaped_once() {
        assert_eq!(
            BbcodeCodec.parse("[url]https://x.org/?a=1&b=2[/url]"),
            r#"<p><a href="https://x.org/?a=1&amp;b=2">https://x.org/?a=1&amp;b=2</a></p>"#
        );
        assert_eq!(
            BbcodeCodec.parse("[url=https://x.org/?a=1&b=2]x[/url]"),
            r#"<p><a href="https://x.org/?a=1&amp;b=2">x</a></p>"#
        );
    }

    #[test]
    fn link_urls_are_decoded_once() {
        assert_eq!(
            BbcodeCodec.build(r#"<p><a href="https://x.org/?q=&amp;amp;">x</a></p>"#),
            "[url=https://x.org/?q=&amp;]x[/url]"
        );
    }

    #[test]
    fn links_with_query_strings_round_trip() {
        let markup = "[url=https://x.org/?a=1&b=2]x[/url] & more";
        assert_eq!(BbcodeCodec.build(&BbcodeCodec.parse(markup)), markup);
    }

    #[test]
    fn parse_then_build_restores_markup() {
        let markup = "[b]Hello[/b] [u]there[/u]\n[s]gone[/s]";
        assert_eq!(BbcodeCodec.build(&BbcodeCodec.parse(markup)), markup);
    }
}
