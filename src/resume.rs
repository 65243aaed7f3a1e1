//! 简历查询服务
//!
//! 对已抽取的简历纯文本做只读查询：analyze 提取头部事实（姓名 / 邮箱 / 电话 / 地点 / 学历），
//! section 按规范节名取窗口，search 做大小写不敏感的子串检索并附带上下文与置信度。
//! 查无结果一律返回哨兵值而非报错，让模型继续推进而不是中断。

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// 直接子串命中时每条匹配附带的上下文行数（前后各 2 行）
const CONTEXT_LINES: usize = 2;
/// 单次检索最多返回的匹配条数
const MAX_MATCHES: usize = 5;
/// 节内容窗口的最大字符数
const MAX_SECTION_CHARS: usize = 1500;

/// 置信度：标注取自简历的值与查询的直接程度
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// 宽松解析：大小写不敏感，无法识别时取 Medium（模型省略置信度时的默认值）
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "high" => Confidence::High,
            "low" => Confidence::Low,
            _ => Confidence::Medium,
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::High => write!(f, "High"),
            Confidence::Medium => write!(f, "Medium"),
            Confidence::Low => write!(f, "Low"),
        }
    }
}

/// analyze 的结果：头部事实，均可为空
#[derive(Clone, Debug, Default, Serialize)]
pub struct ResumeFacts {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub education: Option<String>,
}

/// 单条检索匹配
#[derive(Clone, Debug, Serialize)]
pub struct SearchMatch {
    pub text: String,
    pub confidence: Confidence,
}

/// search 的结果；matches 永不为空（查无结果时含一条 "No matches found" 哨兵）
#[derive(Clone, Debug, Serialize)]
pub struct SearchResult {
    pub query: String,
    pub matches: Vec<SearchMatch>,
}

/// section 的结果；未命中时 content 为哨兵文本
#[derive(Clone, Debug, Serialize)]
pub struct SectionResult {
    pub section: String,
    pub content: String,
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap())
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:\+?\d{1,2}[\s.-]?)?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}").unwrap()
    })
}

fn name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([A-Z][a-z]+ [A-Z][a-z]+)\b").unwrap())
}

fn location_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b([A-Z][A-Za-z]+(?:[ .][A-Z][A-Za-z]+)*,\s*[A-Z]{2})\b").unwrap()
    })
}

fn education_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?im)^.*\b(?:Bachelor|Master|Ph\.?D|Doctorate|Associate|MBA|B\.?S\.?|M\.?S\.?|B\.?A\.?)\b.*$",
        )
        .unwrap()
    })
}

/// 所有可识别的节标题行（用于定位节窗口边界）
fn heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?im)^\s*(?:education|academic|experience|work history|employment|skills|technical skills|technologies|projects|portfolio|contact|personal information)\b[^\n]*",
        )
        .unwrap()
    })
}

/// 规范节名 -> 标题别名（小写匹配）
fn section_aliases() -> &'static HashMap<&'static str, Vec<&'static str>> {
    static MAP: OnceLock<HashMap<&'static str, Vec<&'static str>>> = OnceLock::new();
    MAP.get_or_init(|| {
        HashMap::from([
            ("education", vec!["education", "academic"]),
            ("experience", vec!["experience", "work history", "employment"]),
            ("skills", vec!["skills", "technical skills", "technologies"]),
            ("projects", vec!["projects", "portfolio"]),
            ("contact", vec!["contact", "personal information"]),
        ])
    })
}

/// 检索同义词表：直接子串无命中时的降级查询
fn synonyms() -> &'static HashMap<&'static str, Vec<&'static str>> {
    static MAP: OnceLock<HashMap<&'static str, Vec<&'static str>>> = OnceLock::new();
    MAP.get_or_init(|| {
        HashMap::from([
            ("name", vec!["full name", "first name", "last name"]),
            ("email", vec!["e-mail", "mail", "contact"]),
            ("phone", vec!["telephone", "mobile", "cell"]),
            ("location", vec!["address", "city", "state"]),
            ("education", vec!["degree", "university", "college", "school"]),
            ("experience", vec!["work history", "employment", "position"]),
            ("skills", vec!["technologies", "proficiencies", "expertise"]),
        ])
    })
}

/// 简历查询服务：持有简历文本，所有查询无副作用；analyze 结果按会话缓存
pub struct ResumeQuery {
    text: String,
    facts: OnceLock<ResumeFacts>,
}

impl ResumeQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            facts: OnceLock::new(),
        }
    }

    /// 提取头部事实；首次调用计算并缓存
    pub fn analyze(&self) -> &ResumeFacts {
        self.facts.get_or_init(|| ResumeFacts {
            name: name_re()
                .find(&self.text)
                .map(|m| m.as_str().to_string()),
            email: email_re()
                .find(&self.text)
                .map(|m| m.as_str().to_string()),
            phone: phone_re()
                .find(&self.text)
                .map(|m| m.as_str().trim().to_string()),
            location: location_re()
                .find(&self.text)
                .map(|m| m.as_str().to_string()),
            education: education_re()
                .find(&self.text)
                .map(|m| m.as_str().trim().to_string()),
        })
    }

    /// 取规范节名对应的文本窗口：从标题行到下一个可识别标题或空行
    ///
    /// 未识别的节名或标题缺失时返回哨兵 content（"not found"），不报错。
    pub fn section(&self, name: &str) -> SectionResult {
        let canonical = name.trim().to_lowercase();
        let not_found = || SectionResult {
            section: canonical.clone(),
            content: format!("Section '{}' not found in resume", canonical),
        };

        let Some(aliases) = section_aliases().get(canonical.as_str()) else {
            return not_found();
        };

        // 在全部标题行中找到本节的标题
        let mut heading: Option<regex::Match<'_>> = None;
        for m in heading_re().find_iter(&self.text) {
            let line = m.as_str().trim().to_lowercase();
            if aliases.iter().any(|a| line.starts_with(a)) {
                heading = Some(m);
                break;
            }
        }
        let Some(heading) = heading else {
            return not_found();
        };

        // 标题行冒号后的内容也属于本节（如 "Education: Bachelor of Science"）
        let inline = heading
            .as_str()
            .split_once(':')
            .map(|(_, rest)| rest.trim())
            .unwrap_or("");

        let tail = &self.text[heading.end()..];
        let mut end = tail.len();
        if let Some(next) = heading_re().find(tail) {
            end = end.min(next.start());
        }
        if let Some(gap) = tail.find("\n\n") {
            end = end.min(gap);
        }
        let body = tail[..end].trim();

        let mut content = String::new();
        if !inline.is_empty() {
            content.push_str(inline);
        }
        if !body.is_empty() {
            if !content.is_empty() {
                content.push('\n');
            }
            content.push_str(body);
        }
        if content.is_empty() {
            return not_found();
        }
        if content.chars().count() > MAX_SECTION_CHARS {
            content = content.chars().take(MAX_SECTION_CHARS).collect();
        }

        SectionResult {
            section: canonical,
            content,
        }
    }

    /// 大小写不敏感的子串检索
    ///
    /// 直接命中：每条带前后 2 行上下文，Medium 置信；无直接命中则走同义词表（单行，Low）；
    /// 仍为空时返回一条 "No matches found"（Low）哨兵，调用方应视作「无可用信息」而非错误。
    pub fn search(&self, query: &str) -> SearchResult {
        let query = query.trim();
        let mut matches = self.direct_matches(query, Confidence::Medium, CONTEXT_LINES);

        if matches.is_empty() {
            if let Some(alts) = synonyms().get(query.to_lowercase().as_str()) {
                for alt in alts {
                    matches.extend(self.direct_matches(alt, Confidence::Low, 0));
                    if matches.len() >= MAX_MATCHES {
                        break;
                    }
                }
                matches.truncate(MAX_MATCHES);
            }
        }

        if matches.is_empty() {
            matches.push(SearchMatch {
                text: "No matches found".to_string(),
                confidence: Confidence::Low,
            });
        }

        SearchResult {
            query: query.to_string(),
            matches,
        }
    }

    fn direct_matches(&self, needle: &str, confidence: Confidence, context: usize) -> Vec<SearchMatch> {
        if needle.is_empty() {
            return Vec::new();
        }
        let needle_lower = needle.to_lowercase();
        let lines: Vec<&str> = self.text.lines().collect();
        let mut matches = Vec::new();

        for (i, line) in lines.iter().enumerate() {
            if !line.to_lowercase().contains(&needle_lower) {
                continue;
            }
            let start = i.saturating_sub(context);
            let end = (i + context + 1).min(lines.len());
            let window = lines[start..end]
                .iter()
                .map(|l| l.trim())
                .filter(|l| !l.is_empty())
                .collect::<Vec<_>>()
                .join("\n");
            matches.push(SearchMatch {
                text: window,
                confidence,
            });
            if matches.len() >= MAX_MATCHES {
                break;
            }
        }
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Jane Doe\njane.doe@example.com\n(555) 123-4567\nPortland, OR\n\nEducation\nBachelor of Science in Computer Science\nState University, 2019\n\nExperience\nSoftware Engineer at Acme Corp\nBuilt Rust services\n\nSkills\nRust, Python, SQL\n";

    #[test]
    fn test_analyze_extracts_headline_facts() {
        let resume = ResumeQuery::new(SAMPLE);
        let facts = resume.analyze();
        assert_eq!(facts.name.as_deref(), Some("Jane Doe"));
        assert_eq!(facts.email.as_deref(), Some("jane.doe@example.com"));
        assert_eq!(facts.phone.as_deref(), Some("(555) 123-4567"));
        assert_eq!(facts.location.as_deref(), Some("Portland, OR"));
        assert!(facts.education.as_deref().unwrap().contains("Bachelor of Science"));
    }

    #[test]
    fn test_analyze_empty_resume() {
        let resume = ResumeQuery::new("");
        let facts = resume.analyze();
        assert!(facts.name.is_none());
        assert!(facts.email.is_none());
    }

    #[test]
    fn test_section_window_bounded_by_next_heading() {
        let resume = ResumeQuery::new(SAMPLE);
        let result = resume.section("education");
        assert!(result.content.contains("Bachelor of Science"));
        assert!(!result.content.contains("Acme Corp"));
    }

    #[test]
    fn test_section_inline_heading() {
        let resume = ResumeQuery::new("Jane Doe\nEducation: Bachelor of Science\n");
        let result = resume.section("education");
        assert!(result.content.contains("Bachelor of Science"));
    }

    #[test]
    fn test_section_not_found_is_sentinel() {
        let resume = ResumeQuery::new("nothing here");
        let result = resume.section("projects");
        assert_eq!(result.content, "Section 'projects' not found in resume");
        // 非规范节名同样走哨兵
        let result = resume.section("hobbies");
        assert!(result.content.contains("not found"));
    }

    #[test]
    fn test_search_direct_match_has_context() {
        let resume = ResumeQuery::new(SAMPLE);
        let result = resume.search("acme");
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].confidence, Confidence::Medium);
        // 前后 2 行上下文
        assert!(result.matches[0].text.contains("Experience"));
        assert!(result.matches[0].text.contains("Built Rust services"));
    }

    #[test]
    fn test_search_synonym_fallback() {
        let resume = ResumeQuery::new("Jane Doe\nState University, 2019\n");
        let result = resume.search("education");
        assert!(!result.matches.is_empty());
        assert_eq!(result.matches[0].confidence, Confidence::Low);
        assert!(result.matches[0].text.contains("University"));
    }

    #[test]
    fn test_search_no_matches_sentinel() {
        let resume = ResumeQuery::new(SAMPLE);
        let result = resume.search("xylophone");
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].text, "No matches found");
        assert_eq!(result.matches[0].confidence, Confidence::Low);
    }

    #[test]
    fn test_confidence_lenient_parse() {
        assert_eq!(Confidence::parse_lenient("HIGH"), Confidence::High);
        assert_eq!(Confidence::parse_lenient(" low "), Confidence::Low);
        assert_eq!(Confidence::parse_lenient(""), Confidence::Medium);
        assert_eq!(Confidence::parse_lenient("whatever"), Confidence::Medium);
    }
}
