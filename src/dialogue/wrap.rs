//! 消息窗口换行：按空格贪心累积单词
//!
//! 追加下一个单词会超出宽度时，先输出当前行（去除首尾空白）再以该单词开新行；结束时输出剩余部分。
//! 单个单词超过宽度时独占一行，不拆开。宽度按字符数计。

/// 默认行宽（与游戏消息窗口一致）
pub const DEFAULT_WRAP_WIDTH: usize = 40;

pub fn wrap_text(text: &str, max_line_length: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split(' ').filter(|w| !w.is_empty()) {
        let candidate = current.chars().count() + word.chars().count();
        if candidate > max_line_length && !current.is_empty() {
            lines.push(current.trim().to_string());
            current.clear();
        }
        current.push_str(word);
        current.push(' ');
    }

    let rest = current.trim();
    if !rest.is_empty() {
        lines.push(rest.to_string());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_single_line() {
        assert_eq!(wrap_text("4", DEFAULT_WRAP_WIDTH), vec!["4"]);
    }

    #[test]
    fn test_greedy_break() {
        let lines = wrap_text("the quick brown fox jumps", 10);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
    }

    #[test]
    fn test_exact_width_fits() {
        // "aaaa bbbbb" 恰好 10 个字符
        assert_eq!(wrap_text("aaaa bbbbb", 10), vec!["aaaa bbbbb"]);
    }

    #[test]
    fn test_long_word_own_line() {
        let lines = wrap_text("a supercalifragilistic b", 8);
        assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
    }

    #[test]
    fn test_empty_and_spaces() {
        assert!(wrap_text("", 40).is_empty());
        assert!(wrap_text("    ", 40).is_empty());
        assert_eq!(wrap_text("a   b", 40), vec!["a b"]);
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        let lines = wrap_text("čćžšđ čćžšđ", 11);
        assert_eq!(lines, vec!["čćžšđ čćžšđ"]);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn lines_fit_unless_single_word(
                text in "[a-zA-Z0-9.,?]{1,15}( {1,3}[a-zA-Z0-9.,?]{1,15}){0,25}",
                width in 1usize..60,
            ) {
                for line in wrap_text(&text, width) {
                    prop_assert!(line.chars().count() <= width || !line.contains(' '));
                    prop_assert!(!line.is_empty());
                }
            }

            #[test]
            fn rejoining_reproduces_text(
                text in "[a-z]{1,12}( {1,3}[a-z]{1,12}){0,25}",
                width in 1usize..60,
            ) {
                let joined = wrap_text(&text, width).join(" ");
                let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
                prop_assert_eq!(joined, collapsed);
            }
        }
    }
}
