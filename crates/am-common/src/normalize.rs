use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

// 単語文字・空白・カンマ・スラッシュ・ハイフン以外は空白に潰す
static KEEP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s,/\-]").unwrap());
static COMMA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*,\s*").unwrap());
static SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static NON_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());

/// 住所文字列の正規化（パース・比較の前段で必ず通す）
///
/// 適用順: NFKC 折り畳み → 小文字化 → ダイアクリティカルマーク除去 →
/// ダッシュ統一 → 句読点の空白化（カンマは ", " に揃えて温存）→ 空白圧縮。
/// カンマを残すのは抽出器がセグメント区切りとして使うため。
/// 純粋関数。空入力は空文字を返し、失敗しない。
pub fn normalize(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let folded = text.nfkc().collect::<String>().to_lowercase();
    let stripped: String = folded.nfd().filter(|c| !is_combining_mark(*c)).collect();
    let dashed = stripped.replace(['—', '–'], "-");

    let cleaned = KEEP_RE.replace_all(&dashed, " ");
    let cleaned = COMMA_RE.replace_all(&cleaned, ", ");
    SPACE_RE.replace_all(&cleaned, " ").trim().to_string()
}

/// 入力の情報量レベル
///
/// 0 = 空/記号のみ, 1 = 単一トークンかつ数字なし,
/// 2 = 2〜3トークンまたは数字あり, 3 = 詳細
/// 低レベル入力はファジーフォールバックの影響を弱めるために使う。
pub fn info_level(s: &str) -> u8 {
    let cleaned = NON_WORD_RE.replace_all(s, " ");
    let cleaned = SPACE_RE.replace_all(&cleaned, " ");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return 0;
    }

    let tokens = cleaned.split(' ').filter(|t| !t.is_empty()).count();
    let has_digit = cleaned.chars().any(|c| c.is_ascii_digit());

    if has_digit {
        2
    } else if tokens <= 1 {
        1
    } else if tokens <= 3 {
        2
    } else {
        3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_diacritics_and_lowercases() {
        assert_eq!(normalize("Dąbrowskiego 5, Warszawa"), "dabrowskiego 5, warszawa");
        assert_eq!(normalize("Crème Brûlée Ave"), "creme brulee ave");
        assert_eq!(normalize("São Paulo"), "sao paulo");
    }

    #[test]
    fn standardizes_punctuation_and_whitespace() {
        assert_eq!(
            normalize("10 Downing St.,   London ,SW1A 2AA"),
            "10 downing st, london, sw1a 2aa"
        );
        assert_eq!(normalize("Main—Street – 7"), "main-street - 7");
        assert_eq!(normalize("  a\t b  "), "a b");
    }

    #[test]
    fn empty_and_junk_inputs_yield_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn is_idempotent() {
        let once = normalize("10 Downing Street, London, SW1A 2AA, UK");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn info_levels_match_token_and_digit_rules() {
        assert_eq!(info_level(""), 0);
        assert_eq!(info_level(",,,"), 0);
        assert_eq!(info_level("france"), 1);
        assert_eq!(info_level("10 downing"), 2);
        assert_eq!(info_level("new york city"), 2);
        assert_eq!(info_level("ten downing street westminster london"), 3);
    }
}
