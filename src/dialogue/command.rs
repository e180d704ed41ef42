//! 插件命令解析
//!
//! 事件脚本中的命令按空白切分参数：
//!   foi_new_agent <agentName> "INITIAL_PROMPT"
//!   foi_new_agent <agentName> <faceImage> <faceIndex> "INITIAL_PROMPT"
//!   foi_query_agent <agentName> "PROMPT"
//!   foi_quiz_agent <agentName> <answerVar> <verdictVar>
//!   foi_delete_agent <agentName>
//!
//! 提示词中的 `\V[n]` 在分发时替换为变量 n 的文本。

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::core::CommandError;
use crate::host::{SlotId, VariableStore};

const NEW_USAGE: &str =
    r#"foi_new_agent <agentName> "INITIAL_PROMPT" OR foi_new_agent <agentName> <imageName> <imageNumber> "INITIAL_PROMPT""#;
const QUERY_USAGE: &str = r#"foi_query_agent <agentName> "PROMPT""#;
const QUIZ_USAGE: &str = "foi_quiz_agent <agentName> <answerVar> <verdictVar>";
const DELETE_USAGE: &str = "foi_delete_agent <agentName>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginCommand {
    /// 注册并在服务端创建 Agent；face 仅在第三个参数为数字时给出
    NewAgent {
        name: String,
        face: Option<(String, u32)>,
        prompt: String,
    },
    /// 提问并显示回复
    Query { name: String, prompt: String },
    /// 出题 -> 作答 -> 判题 -> 反馈
    Quiz {
        name: String,
        answer_slot: SlotId,
        verdict_slot: SlotId,
    },
    Delete { name: String },
}

impl PluginCommand {
    pub fn agent_name(&self) -> &str {
        match self {
            PluginCommand::NewAgent { name, .. }
            | PluginCommand::Query { name, .. }
            | PluginCommand::Quiz { name, .. }
            | PluginCommand::Delete { name } => name,
        }
    }
}

/// 解析一行命令；命令名不区分大小写
pub fn parse_command(line: &str) -> Result<PluginCommand, CommandError> {
    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or("").to_lowercase();
    let args: Vec<&str> = parts.collect();

    match command.as_str() {
        "foi_new_agent" => {
            if args.len() < 2 {
                return Err(CommandError::Usage(NEW_USAGE));
            }
            let (face, prompt_start) = match args.get(2).and_then(|n| n.parse::<u32>().ok()) {
                Some(index) => (Some((args[1].to_string(), index)), 3),
                None => (None, 1),
            };
            Ok(PluginCommand::NewAgent {
                name: args[0].to_string(),
                face,
                prompt: join_prompt(&args[prompt_start.min(args.len())..]),
            })
        }
        "foi_query_agent" => {
            if args.len() < 2 {
                return Err(CommandError::Usage(QUERY_USAGE));
            }
            Ok(PluginCommand::Query {
                name: args[0].to_string(),
                prompt: join_prompt(&args[1..]),
            })
        }
        "foi_quiz_agent" => {
            if args.len() < 3 {
                return Err(CommandError::Usage(QUIZ_USAGE));
            }
            let answer = args[1].parse::<u32>();
            let verdict = args[2].parse::<u32>();
            match (answer, verdict) {
                (Ok(a), Ok(v)) if a != v => Ok(PluginCommand::Quiz {
                    name: args[0].to_string(),
                    answer_slot: SlotId(a),
                    verdict_slot: SlotId(v),
                }),
                _ => Err(CommandError::Usage(QUIZ_USAGE)),
            }
        }
        "foi_delete_agent" => match args.first() {
            Some(name) => Ok(PluginCommand::Delete {
                name: name.to_string(),
            }),
            None => Err(CommandError::Usage(DELETE_USAGE)),
        },
        _ => Err(CommandError::UnknownCommand(command)),
    }
}

/// 以单空格拼接参数，并去掉包裹整段提示词的双引号
fn join_prompt(args: &[&str]) -> String {
    let joined = args.join(" ");
    match joined
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    {
        Some(inner) => inner.to_string(),
        None => joined,
    }
}

fn variable_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\\V\[(\d+)\]").expect("valid variable pattern"))
}

/// 将 `\V[n]` 替换为变量 n 的文本
pub fn substitute_variables<V: VariableStore + ?Sized>(prompt: &str, vars: &V) -> String {
    variable_pattern()
        .replace_all(prompt, |caps: &Captures| {
            caps[1]
                .parse::<u32>()
                .map(|n| vars.get(SlotId(n)).as_text())
                .unwrap_or_default()
        })
        .into_owned()
}
