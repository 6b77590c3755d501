//! Traditional → simplified character conversion.
//!
//! A character-level map covering the high-frequency traditional forms
//! seen in subtitles. Characters without a mapping pass through, so the
//! conversion is always total.

/// High-frequency traditional/simplified pairs.
const TRAD_TO_SIMP: &[(char, char)] = &[
    ('學', '学'),
    ('國', '国'),
    ('語', '语'),
    ('說', '说'),
    ('話', '话'),
    ('請', '请'),
    ('謝', '谢'),
    ('對', '对'),
    ('時', '时'),
    ('間', '间'),
    ('問', '问'),
    ('題', '题'),
    ('電', '电'),
    ('視', '视'),
    ('機', '机'),
    ('會', '会'),
    ('開', '开'),
    ('關', '关'),
    ('門', '门'),
    ('東', '东'),
    ('車', '车'),
    ('馬', '马'),
    ('魚', '鱼'),
    ('鳥', '鸟'),
    ('龍', '龙'),
    ('點', '点'),
    ('樂', '乐'),
    ('醫', '医'),
    ('藥', '药'),
    ('經', '经'),
    ('給', '给'),
    ('錢', '钱'),
    ('銀', '银'),
    ('風', '风'),
    ('雲', '云'),
    ('飛', '飞'),
    ('書', '书'),
    ('讀', '读'),
    ('寫', '写'),
    ('聽', '听'),
    ('覺', '觉'),
    ('現', '现'),
    ('實', '实'),
    ('發', '发'),
    ('頭', '头'),
    ('臉', '脸'),
    ('體', '体'),
    ('氣', '气'),
    ('愛', '爱'),
    ('親', '亲'),
    ('戰', '战'),
    ('爭', '争'),
    ('勝', '胜'),
    ('負', '负'),
    ('這', '这'),
    ('裡', '里'),
    ('邊', '边'),
    ('過', '过'),
    ('還', '还'),
    ('沒', '没'),
    ('麼', '么'),
    ('樣', '样'),
    ('幾', '几'),
    ('個', '个'),
    ('們', '们'),
    ('來', '来'),
    ('後', '后'),
    ('長', '长'),
    ('難', '难'),
    ('歡', '欢'),
    ('喜', '喜'),
    ('買', '买'),
    ('賣', '卖'),
];

/// Convert traditional characters to simplified, leaving everything else
/// untouched.
pub fn to_simplified(text: &str) -> String {
    text.chars()
        .map(|c| {
            TRAD_TO_SIMP
                .iter()
                .find(|(t, _)| *t == c)
                .map(|(_, s)| *s)
                .unwrap_or(c)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_known_traditional_forms() {
        assert_eq!(to_simplified("學校"), "学校");
        assert_eq!(to_simplified("請問"), "请问");
    }

    #[test]
    fn passes_simplified_and_latin_through() {
        assert_eq!(to_simplified("学校 abc 123"), "学校 abc 123");
    }

    #[test]
    fn mixed_text_converts_only_mapped_chars() {
        assert_eq!(to_simplified("我們的學校"), "我们的学校");
    }
}
