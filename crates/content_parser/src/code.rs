use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

use crate::filename;

/// One fenced code region extracted from a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSegment {
    pub code: String,
    pub language: Option<String>,
    pub filename: Option<String>,
}

/// Byte span of a terminated fence plus its captured parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Fence {
    pub span: Range<usize>,
    pub language: Option<String>,
    pub body: Range<usize>,
}

fn fence_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        // A language tag only counts when a line break follows it.
        Regex::new(r"(?s)```(?:([A-Za-z0-9_+#.\-]+)[ \t]*\r?\n|[ \t]*\r?\n?)(.*?)```")
            .expect("fence regex must compile")
    })
}

pub(crate) fn find_fences(content: &str) -> Vec<Fence> {
    fence_regex()
        .captures_iter(content)
        .filter_map(|captures| {
            let span = captures.get(0)?.range();
            let body = captures.get(2)?.range();
            let language = captures.get(1).map(|tag| tag.as_str().to_string());
            Some(Fence {
                span,
                language,
                body,
            })
        })
        .collect()
}

pub(crate) fn strip_fences(content: &str, fences: &[Fence]) -> String {
    let mut prose = String::with_capacity(content.len());
    let mut cursor = 0;
    for fence in fences {
        prose.push_str(&content[cursor..fence.span.start]);
        cursor = fence.span.end;
    }
    prose.push_str(&content[cursor..]);
    prose.trim().to_string()
}

pub(crate) fn segments_from_fences(content: &str, fences: &[Fence]) -> Vec<CodeSegment> {
    let mut segments = Vec::with_capacity(fences.len());
    let mut previous_end = 0;

    for fence in fences {
        let code = content[fence.body.clone()].trim().to_string();
        let filename = filename::from_leading_comment(&code)
            .or_else(|| filename::from_preceding_text(&content[previous_end..fence.span.start]));
        segments.push(CodeSegment {
            code,
            language: fence.language.clone(),
            filename,
        });
        previous_end = fence.span.end;
    }

    segments
}
