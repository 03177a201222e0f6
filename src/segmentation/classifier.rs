//! Text line classification.
//!
//! Labels each incoming line as noise, section header, question start, or
//! continuation. The numbering formats are kept as a data-driven priority
//! list of templates (matcher plus number extractor) tried top to bottom, so
//! each template stays independently testable.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::domain::{LineClass, QuestionType};

/// Administrative boilerplate markers. A line containing any of these is
/// dropped entirely.
const NOISE_KEYWORDS: &[&str] = &[
    "答题前",
    "考生务必",
    "姓名",
    "考生号",
    "考场",
    "座位",
    "考试结束",
    "试卷和答题卡",
    "一并交回",
    "本试卷",
    "考试内容",
    "必修",
    "注意事项",
    "答题卡",
    "密封线",
];

/// Section titles: a chinese numeral, optional punctuation, then a section
/// keyword. Matched anywhere in the line.
static SECTION_PATTERNS: Lazy<Vec<(Regex, QuestionType)>> = Lazy::new(|| {
    let compile = |keywords: &str| {
        Regex::new(&format!(
            r"[一二三四五六七八九十]+\s*[.、．]?\s*(?:{keywords})"
        ))
        .expect("section pattern must compile")
    };
    vec![
        (compile("选择|单选|多选"), QuestionType::MultipleChoice),
        (compile("填空"), QuestionType::FillInBlank),
        (compile("解答|计算"), QuestionType::Solution),
        (compile("判断|是非"), QuestionType::TrueFalse),
        (compile("简答"), QuestionType::ShortAnswer),
        (compile("论述"), QuestionType::Essay),
        (compile("词汇"), QuestionType::Vocabulary),
        (compile("阅读"), QuestionType::ReadingComprehension),
        (compile("写作|作文"), QuestionType::Writing),
    ]
});

/// How a matched numbering template turns its capture into a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumberExtractor {
    /// Parse the capture as decimal digits.
    Arabic,
    /// Look the capture up in the chinese numeral table.
    Chinese,
}

/// One recognized question numbering format.
struct NumberTemplate {
    matcher: Regex,
    extractor: NumberExtractor,
}

impl NumberTemplate {
    fn new(pattern: &str, extractor: NumberExtractor) -> Self {
        Self {
            matcher: Regex::new(pattern).expect("number template must compile"),
            extractor,
        }
    }

    fn extract(&self, text: &str) -> Option<u32> {
        let captures = self.matcher.captures(text)?;
        let number = captures.get(1)?.as_str();
        match self.extractor {
            NumberExtractor::Arabic => number.parse().ok(),
            NumberExtractor::Chinese => chinese_numeral(number),
        }
    }
}

/// Question numbering templates in priority order; the first match wins.
static NUMBER_TEMPLATES: Lazy<Vec<NumberTemplate>> = Lazy::new(|| {
    use NumberExtractor::{Arabic, Chinese};
    vec![
        // Arabic number plus separator: "1." "2、" "3："
        NumberTemplate::new(r"^\s*(\d{1,2})\s*[.、．:：]", Arabic),
        // Arabic number running straight into a transition word: "1若" "2,设"
        NumberTemplate::new(r"^\s*(\d{1,2})\s*[,，]?\s*[若设已如当则求]", Arabic),
        // Wrapped numbers: "(1)" "（1）" "[1]" "{1}"
        NumberTemplate::new(r"^\s*[（(]\s*(\d{1,2})\s*[）)]", Arabic),
        NumberTemplate::new(r"^\s*\[\s*(\d{1,2})\s*\]", Arabic),
        NumberTemplate::new(r"^\s*\{\s*(\d{1,2})\s*\}", Arabic),
        // Chinese numerals: "十、" before "一、" so "十一" is not read as "一".
        NumberTemplate::new(r"^\s*(十[一二三四五六七八九]?)\s*[.、．:：]", Chinese),
        NumberTemplate::new(r"^\s*([一二三四五六七八九])\s*[.、．:：]", Chinese),
        // "第1题" / "第一题"
        NumberTemplate::new(r"^\s*第\s*(\d{1,2})\s*题", Arabic),
        NumberTemplate::new(r"^\s*第\s*([一二三四五六七八九十]+)\s*题", Chinese),
        // A line that is nothing but a number.
        NumberTemplate::new(r"^\s*(\d{1,2})\s*$", Arabic),
    ]
});

/// Type keywords checked in order against a question's text.
static TYPE_KEYWORDS: Lazy<Vec<(Regex, QuestionType)>> = Lazy::new(|| {
    let compile = |pattern: &str| Regex::new(pattern).expect("type keyword pattern must compile");
    vec![
        (
            compile(r"A\.|B\.|C\.|D\.|A．|B．|（\s*）|\(\s*\)|选项"),
            QuestionType::MultipleChoice,
        ),
        (compile(r"_+|—+|＿+|填入|填写"), QuestionType::FillInBlank),
        (
            compile(r"对错|正确|错误|√|×|对的打|错的打"),
            QuestionType::TrueFalse,
        ),
        (compile(r"求|证明|解答|计算|化简"), QuestionType::Solution),
        (compile(r"简述|说明|解释|分析"), QuestionType::ShortAnswer),
    ]
});

/// Chinese numerals 一 through 二十.
fn chinese_numeral(text: &str) -> Option<u32> {
    let value = match text {
        "一" => 1,
        "二" => 2,
        "三" => 3,
        "四" => 4,
        "五" => 5,
        "六" => 6,
        "七" => 7,
        "八" => 8,
        "九" => 9,
        "十" => 10,
        "十一" => 11,
        "十二" => 12,
        "十三" => 13,
        "十四" => 14,
        "十五" => 15,
        "十六" => 16,
        "十七" => 17,
        "十八" => 18,
        "十九" => 19,
        "二十" => 20,
        _ => return None,
    };
    Some(value)
}

/// Question numbers outside this range are treated as misreads.
const MIN_QUESTION_NUMBER: u32 = 1;
const MAX_QUESTION_NUMBER: u32 = 100;

/// Classifies text lines against the shared page context.
///
/// The classifier itself is stateless; the evolving context (section type,
/// question numbers already used on this page) is owned by the assembler and
/// passed in per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineClassifier;

impl LineClassifier {
    /// Creates a new classifier.
    pub fn new() -> Self {
        Self
    }

    /// Classifies a line of text.
    ///
    /// Checks run in order: noise, section header, question start,
    /// continuation. A numbering match whose number is out of range or
    /// already used on this page demotes to continuation.
    pub fn classify(&self, text: &str, used_numbers: &HashSet<u32>) -> LineClass {
        if NOISE_KEYWORDS.iter().any(|kw| text.contains(kw)) {
            return LineClass::Noise;
        }

        for (pattern, question_type) in SECTION_PATTERNS.iter() {
            if pattern.is_match(text) {
                return LineClass::SectionHeader(*question_type);
            }
        }

        if let Some(number) = extract_question_number(text) {
            let in_range = (MIN_QUESTION_NUMBER..=MAX_QUESTION_NUMBER).contains(&number);
            if in_range && !used_numbers.contains(&number) {
                return LineClass::QuestionStart {
                    number,
                    question_type: self.detect_type(text),
                };
            }
            // Out-of-range or duplicate numbers fold into the open question.
        }

        LineClass::Continuation
    }

    /// Detects a question type from type keywords in `text`.
    pub fn detect_type(&self, text: &str) -> Option<QuestionType> {
        TYPE_KEYWORDS
            .iter()
            .find(|(pattern, _)| pattern.is_match(text))
            .map(|(_, question_type)| *question_type)
    }
}

/// Tries the numbering templates in priority order and extracts the question
/// number from the first that matches.
pub(crate) fn extract_question_number(text: &str) -> Option<u32> {
    NUMBER_TEMPLATES
        .iter()
        .find_map(|template| template.extract(text))
}
