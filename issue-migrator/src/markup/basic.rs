//! Line-oriented converter for the common subset of tracker wiki markup.

use super::MarkupConverter;
use tracing::warn;

/// Delimited block kinds whose content is copied verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Code,
    NoFormat,
}

impl Block {
    fn tag(self) -> &'static str {
        match self {
            Self::Code => "{code}",
            Self::NoFormat => "{noformat}",
        }
    }

    /// Parses an opening tag, returning the block, its language and the text after the tag.
    fn open(line: &str) -> Option<(Self, String, &str)> {
        let (block, after) = if let Some(after) = line.strip_prefix("{code") {
            (Self::Code, after)
        } else if let Some(after) = line.strip_prefix("{noformat") {
            (Self::NoFormat, after)
        } else {
            return None;
        };

        let end = after.find('}')?;
        let params = after[..end].strip_prefix(':').unwrap_or("");
        let language = match block {
            Self::Code => code_language(params),
            Self::NoFormat => String::new(),
        };
        Some((block, language, &after[end + 1..]))
    }
}

/// Extracts the language from `{code:java}` or `{code:title=x|lang=java}` parameters.
fn code_language(params: &str) -> String {
    params
        .split('|')
        .find_map(|param| match param.split_once('=') {
            Some(("lang", value)) => Some(value.trim().to_string()),
            Some(_) => None,
            None => Some(param.trim().to_string()),
        })
        .unwrap_or_default()
}

/// Converts tracker wiki markup to GitHub-flavoured markdown.
///
/// Handles code and noformat blocks, `h1.` to `h6.` headings, `{{monospace}}`,
/// `[label|url]` and `[url]` links, and escapes `[~user]` and `@user`
/// mentions so they do not notify anyone on the target.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicMarkup;

impl BasicMarkup {
    fn convert_line(&self, line: &str) -> String {
        for level in 1..=6 {
            if let Some(title) = line.strip_prefix(&format!("h{level}. ")) {
                return format!("{} {}", "#".repeat(level), self.convert_inline(title));
            }
        }
        self.convert_inline(line)
    }

    fn convert_inline(&self, line: &str) -> String {
        let mut out = String::with_capacity(line.len());
        let mut rest = line;
        let mut previous: Option<char> = None;

        while let Some(c) = rest.chars().next() {
            if let Some(after) = rest.strip_prefix("{{") {
                if let Some(end) = after.find("}}") {
                    out.push('`');
                    out.push_str(&after[..end]);
                    out.push('`');
                    rest = &after[end + 2..];
                    previous = Some('`');
                    continue;
                }
            }

            if c == '[' {
                if let Some(end) = rest[1..].find(']') {
                    if let Some(replacement) = self.convert_bracket(&rest[1..=end]) {
                        out.push_str(&replacement);
                        rest = &rest[end + 2..];
                        previous = Some(']');
                        continue;
                    }
                }
            }

            if c == '@' && !previous.is_some_and(char::is_alphanumeric) {
                let token_len = rest[1..]
                    .find(|ch: char| !(ch.is_alphanumeric() || ch == '-' || ch == '_'))
                    .unwrap_or(rest.len() - 1);
                if token_len > 0 {
                    out.push('`');
                    out.push_str(&rest[..=token_len]);
                    out.push('`');
                    rest = &rest[token_len + 1..];
                    previous = Some('`');
                    continue;
                }
            }

            out.push(c);
            previous = Some(c);
            rest = &rest[c.len_utf8()..];
        }

        out
    }

    fn convert_bracket(&self, inner: &str) -> Option<String> {
        if let Some(user) = inner.strip_prefix('~') {
            return Some(format!("`@{user}`"));
        }
        if let Some((label, url)) = inner.split_once('|') {
            return is_url(url).then(|| self.link(label, url));
        }
        is_url(inner).then(|| format!("<{inner}>"))
    }
}

fn is_url(text: &str) -> bool {
    ["http://", "https://", "mailto:"]
        .iter()
        .any(|scheme| text.starts_with(scheme))
}

impl MarkupConverter for BasicMarkup {
    fn convert(&self, text: &str) -> String {
        let mut lines = Vec::new();
        let mut open: Option<(Block, usize)> = None;

        for (index, line) in text.lines().enumerate() {
            let trimmed = line.trim();

            if let Some((block, _)) = open {
                match trimmed.strip_suffix(block.tag()) {
                    Some(before) => {
                        if !before.trim().is_empty() {
                            lines.push(before.trim_end().to_string());
                        }
                        lines.push("```".to_string());
                        open = None;
                    }
                    None => lines.push(line.to_string()),
                }
                continue;
            }

            match Block::open(trimmed) {
                Some((block, language, after)) => {
                    lines.push(format!("```{language}"));
                    match after.strip_suffix(block.tag()) {
                        Some(content) => {
                            if !content.is_empty() {
                                lines.push(content.to_string());
                            }
                            lines.push("```".to_string());
                        }
                        None => {
                            if !after.is_empty() {
                                lines.push(after.to_string());
                            }
                            open = Some((block, index + 1));
                        }
                    }
                }
                None => lines.push(self.convert_line(line)),
            }
        }

        if let Some((block, line)) = open {
            warn!(tag = block.tag(), line, "Closing unterminated block at end of text");
            lines.push("```".to_string());
        }

        lines.join("\n")
    }

    fn link(&self, label: &str, url: &str) -> String {
        format!("[{}]({url})", label.replace(']', "\\]"))
    }
}
