//! 判题结果解析
//!
//! 远程 Agent 被要求只回复 `{"answer": "<通过标记>", "feedback": "..."}`。
//! 解析对任意输入都是全函数：JSON 无法解析时给出固定的诊断反馈，从不向上抛错。

use serde_json::Value;

/// 回复中缺少 feedback 字段时使用
pub const NO_FEEDBACK: &str = "No feedback.";

/// 回复不是 JSON 对象时使用
pub const UNREADABLE_VERDICT: &str = "Sorry, I could not evaluate your answer.";

/// 判题结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub passed: bool,
    pub feedback: String,
}

impl Verdict {
    pub fn failed(feedback: impl Into<String>) -> Self {
        Self {
            passed: false,
            feedback: feedback.into(),
        }
    }

    pub fn unreadable() -> Self {
        Self::failed(UNREADABLE_VERDICT)
    }
}

/// 结构化判题解析器：持有通过标记（如 "CORRECT"）
#[derive(Debug, Clone)]
pub struct VerdictParser {
    pass_token: String,
}

impl VerdictParser {
    pub fn new(pass_token: impl Into<String>) -> Self {
        Self {
            pass_token: pass_token.into(),
        }
    }

    pub fn pass_token(&self) -> &str {
        &self.pass_token
    }

    /// answer 去除首尾空白后与通过标记完全相等才算通过
    pub fn parse(&self, raw: &str) -> Verdict {
        let value: Value = match serde_json::from_str(raw.trim()) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(error = %e, raw = %raw, "verdict is not JSON");
                return Verdict::unreadable();
            }
        };
        let Some(obj) = value.as_object() else {
            tracing::debug!(raw = %raw, "verdict is not a JSON object");
            return Verdict::unreadable();
        };

        let passed = obj
            .get("answer")
            .and_then(Value::as_str)
            .map(|a| a.trim() == self.pass_token)
            .unwrap_or(false);
        let feedback = obj
            .get("feedback")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| NO_FEEDBACK.to_string());

        Verdict { passed, feedback }
    }
}
