//! Built-in classifier: streaming candidate elimination on `encoding_rs`.
//!
//! Every candidate encoding owns a streaming decoder. Bytes are decoded by all
//! surviving candidates; a malformed sequence eliminates a candidate, and each
//! decoded character adjusts the candidate's plausibility score. Decoders keep
//! partial sequences between calls, so the verdict does not depend on where
//! the input was split.
//!
//! Legacy CJK encodings share most of their byte ranges, so validity alone
//! rarely separates them. Scores come from how often the decoded text hits a
//! small table of frequent characters for the candidate's script: text read
//! with the right table lands on common characters, a misread lands on rare
//! ones.

use encoding_rs::{
    BIG5, Decoder, DecoderResult, EUC_JP, EUC_KR, Encoding, GB18030, ISO_2022_JP, SHIFT_JIS,
    UTF_8,
};

use super::Classifier;

/// Identifier reported for 7-bit input.
const ASCII: &str = "ASCII";

/// Identifier reported when no multi-byte candidate fits.
const FALLBACK: &str = "WINDOWS-1252";

/// Penalty for an ASCII letter directly next to a non-ASCII character, the
/// trace left when an accented Latin-1 letter takes the next ASCII letter as
/// its trail byte.
const MIXED_PENALTY: i64 = -4;

/// Writing system a candidate's text is expected in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Script {
    Japanese,
    SimplifiedChinese,
    TraditionalChinese,
    Korean,
}

/// Candidates in tie-break order. UTF-8 and ISO-2022-JP are decided by
/// validity alone; the rest compete on score.
fn candidates() -> Vec<Candidate> {
    vec![
        Candidate::new(UTF_8, "UTF-8", None),
        Candidate::new(SHIFT_JIS, "SHIFT_JIS", Some(Script::Japanese)),
        Candidate::new(EUC_JP, "EUC-JP", Some(Script::Japanese)),
        Candidate::new(GB18030, "GB18030", Some(Script::SimplifiedChinese)),
        Candidate::new(BIG5, "BIG5", Some(Script::TraditionalChinese)),
        Candidate::new(EUC_KR, "EUC-KR", Some(Script::Korean)),
        Candidate::new(ISO_2022_JP, "ISO-2022-JP", None),
    ]
}

const UTF8_INDEX: usize = 0;
const ISO_2022_JP_INDEX: usize = 6;

struct Candidate {
    encoding: &'static Encoding,
    name: &'static str,
    script: Option<Script>,
    /// `None` once a malformed sequence was seen.
    decoder: Option<Decoder>,
    score: i64,
    non_ascii_chars: u64,
    /// Last decoded character, carried across chunks.
    prev: Option<char>,
}

impl Candidate {
    fn new(encoding: &'static Encoding, name: &'static str, script: Option<Script>) -> Self {
        Self {
            encoding,
            name,
            script,
            decoder: Some(encoding.new_decoder_without_bom_handling()),
            score: 0,
            non_ascii_chars: 0,
            prev: None,
        }
    }

    fn reset(&mut self) {
        self.decoder = Some(self.encoding.new_decoder_without_bom_handling());
        self.score = 0;
        self.non_ascii_chars = 0;
        self.prev = None;
    }

    fn is_alive(&self) -> bool {
        self.decoder.is_some()
    }

    /// Decodes `chunk` into `scratch`, updating score and liveness.
    ///
    /// Returns `false` if `scratch` could not grow.
    fn feed(&mut self, mut chunk: &[u8], scratch: &mut String) -> bool {
        let Some(decoder) = self.decoder.as_mut() else {
            return true;
        };

        loop {
            scratch.clear();
            let needed = decoder
                .max_utf8_buffer_length_without_replacement(chunk.len())
                .unwrap_or(usize::MAX);
            if scratch.try_reserve(needed).is_err() {
                return false;
            }

            let (result, read) = decoder.decode_to_string_without_replacement(chunk, scratch, false);
            for c in scratch.chars() {
                if !c.is_ascii() {
                    self.non_ascii_chars += 1;
                }
                if let Some(script) = self.script {
                    self.score += plausibility(script, c);
                    if self.prev.is_some_and(|p| is_mixed(p, c)) {
                        self.score += MIXED_PENALTY;
                    }
                }
                self.prev = Some(c);
            }

            match result {
                DecoderResult::InputEmpty => return true,
                DecoderResult::OutputFull => chunk = &chunk[read..],
                DecoderResult::Malformed(_, _) => {
                    self.decoder = None;
                    return true;
                }
            }
        }
    }
}

/// `true` for an ASCII letter next to a non-ASCII character, in either order.
fn is_mixed(prev: char, c: char) -> bool {
    (prev.is_ascii_alphabetic() && !c.is_ascii()) || (!prev.is_ascii() && c.is_ascii_alphabetic())
}

/// Score of one decoded character as evidence for text in `script`.
fn plausibility(script: Script, c: char) -> i64 {
    match c as u32 {
        0x00..=0x7F => return 0,
        // C1 controls, private use
        0x80..=0x9F | 0xE000..=0xF8FF => return -4,
        // CJK punctuation, fullwidth ASCII
        0x3000..=0x303F | 0xFF01..=0xFF5E => return 1,
        _ => {}
    }

    match script {
        Script::Japanese => match c as u32 {
            // Hiragana, katakana
            0x3041..=0x30FF => 3,
            // Half-width katakana
            0xFF61..=0xFF9F => 1,
            _ if is_frequent(&KANJI, c) => 2,
            _ => 0,
        },
        Script::SimplifiedChinese => {
            frequent_score(is_frequent(&HANZI_SHARED, c) || is_frequent(&HANZI_SIMPLIFIED, c))
        }
        Script::TraditionalChinese => {
            frequent_score(is_frequent(&HANZI_SHARED, c) || is_frequent(&HANZI_TRADITIONAL, c))
        }
        Script::Korean => frequent_score(is_frequent(&HANGUL, c)),
    }
}

fn frequent_score(hit: bool) -> i64 {
    if hit { 3 } else { 0 }
}

fn is_frequent(table: &[char], c: char) -> bool {
    table.binary_search(&c).is_ok()
}

/// Frequent hanzi written the same in simplified and traditional Chinese.
const HANZI_SHARED: [char; 186] = [
    '一', '三', '上', '下', '不', '世', '中', '主', '之', '九', '也', '事',
    '二', '五', '些', '交', '京', '人', '什', '今', '他', '代', '以', '任',
    '但', '位', '住', '何', '作', '你', '便', '信', '做', '先', '光', '入',
    '全', '公', '共', '其', '内', '再', '出', '分', '利', '制', '前', '力',
    '加', '化', '北', '十', '南', '却', '原', '去', '又', '及', '反', '受',
    '只', '叫', '可', '台', '各', '合', '同', '名', '命', '和', '四', '回',
    '因', '在', '地', '外', '多', '大', '天', '太', '女', '好', '如', '子',
    '字', '安', '定', '小', '少', '就', '山', '工', '己', '已', '市', '常',
    '平', '年', '并', '度', '建', '很', '得', '心', '性', '情', '想', '意',
    '感', '我', '或', '所', '手', '才', '打', '把', '提', '放', '文', '新',
    '方', '日', '明', '是', '更', '最', '月', '有', '服', '期', '本', '林',
    '果', '次', '正', '此', '死', '比', '民', '水', '法', '活', '然', '物',
    '王', '理', '生', '用', '由', '界', '白', '的', '目', '直', '相', '看',
    '真', '眼', '着', '知', '神', '立', '笑', '第', '美', '老', '而', '能',
    '自', '至', '色', '行', '表', '被', '西', '要', '走', '路', '身', '通',
    '那', '部', '都', '重', '金', '高',
];

/// Frequent simplified-only hanzi.
const HANZI_SIMPLIFIED: [char; 60] = [
    '万', '与', '两', '个', '为', '么', '书', '产', '从', '们', '会', '体',
    '关', '军', '务', '动', '华', '发', '后', '国', '场', '学', '实', '对',
    '开', '张', '当', '数', '时', '来', '样', '检', '气', '没', '测', '点',
    '爱', '现', '码', '种', '简', '经', '编', '见', '让', '记', '试', '语',
    '说', '请', '车', '边', '过', '还', '这', '进', '长', '问', '题', '马',
];

/// Frequent traditional-only hanzi.
const HANZI_TRADITIONAL: [char; 61] = [
    '來', '個', '們', '兩', '動', '務', '問', '國', '場', '學', '實', '對',
    '張', '後', '從', '愛', '數', '於', '時', '書', '會', '樣', '檢', '氣',
    '沒', '測', '為', '現', '產', '當', '發', '碼', '種', '經', '編', '繁',
    '與', '華', '萬', '見', '記', '試', '語', '說', '請', '讓', '車', '軍',
    '這', '進', '過', '還', '邊', '長', '開', '關', '題', '馬', '體', '麼',
    '點',
];

/// Frequent kanji.
const KANJI: [char; 63] = [
    '上', '下', '中', '事', '京', '人', '今', '会', '何', '作', '使', '全',
    '内', '円', '出', '分', '前', '半', '合', '問', '国', '場', '外', '大',
    '子', '字', '学', '実', '家', '年', '後', '思', '手', '文', '新', '方',
    '日', '時', '書', '月', '本', '来', '東', '検', '気', '生', '用', '発',
    '社', '私', '自', '行', '表', '見', '角', '言', '話', '語', '車', '間',
    '際', '電', '題',
];

/// Frequent Hangul syllables.
const HANGUL: [char; 95] = [
    '가', '같', '개', '검', '것', '게', '경', '고', '과', '구', '국', '그',
    '기', '까', '나', '내', '년', '는', '니', '다', '대', '도', '동', '되',
    '들', '딩', '때', '라', '로', '를', '리', '만', '말', '면', '문', '미',
    '발', '방', '보', '부', '비', '사', '상', '생', '서', '성', '세', '소',
    '수', '스', '습', '시', '신', '아', '어', '없', '에', '여', '연', '오',
    '와', '요', '우', '원', '위', '으', '을', '의', '이', '인', '일', '입',
    '있', '자', '장', '저', '적', '전', '정', '제', '주', '중', '지', '출',
    '코', '테', '텍', '트', '하', '학', '한', '합', '해', '했', '후',
];

/// Classifier that eliminates candidate encodings by decoding validity and
/// ranks survivors by how plausible their decoded text is.
///
/// Reported identifiers: `ASCII`, `UTF-8`, `UTF-16LE`, `UTF-16BE`,
/// `SHIFT_JIS`, `EUC-JP`, `GB18030`, `BIG5`, `EUC-KR`, `ISO-2022-JP` and
/// `WINDOWS-1252`.
///
/// # Example
///
/// ```
/// use encsniff::{CandidateClassifier, Classifier};
///
/// let mut classifier = CandidateClassifier::new();
/// classifier.analyze("héllo".as_bytes());
/// assert_eq!(classifier.finish().as_deref(), Some("UTF-8"));
/// ```
pub struct CandidateClassifier {
    candidates: Vec<Candidate>,
    scratch: String,
    /// First bytes of the input, for byte-order marks.
    head: [u8; 3],
    head_len: usize,
    total: u64,
    non_ascii: bool,
    saw_nul: bool,
    saw_escape: bool,
}

impl CandidateClassifier {
    /// Creates a classifier with an empty state.
    pub fn new() -> Self {
        Self {
            candidates: candidates(),
            scratch: String::new(),
            head: [0; 3],
            head_len: 0,
            total: 0,
            non_ascii: false,
            saw_nul: false,
            saw_escape: false,
        }
    }

    /// Returns the number of bytes analyzed since the last reset.
    pub fn bytes_seen(&self) -> u64 {
        self.total
    }

    fn bom(&self) -> Option<&'static str> {
        let head = &self.head[..self.head_len];
        if head.starts_with(&[0xEF, 0xBB, 0xBF]) {
            Some("UTF-8")
        } else if head.starts_with(&[0xFF, 0xFE]) {
            Some("UTF-16LE")
        } else if head.starts_with(&[0xFE, 0xFF]) {
            Some("UTF-16BE")
        } else {
            None
        }
    }

    fn best_legacy(&self) -> Option<&'static str> {
        let mut best: Option<&Candidate> = None;
        for candidate in &self.candidates[UTF8_INDEX + 1..ISO_2022_JP_INDEX] {
            if !candidate.is_alive() || candidate.score <= 0 {
                continue;
            }
            if best.is_none_or(|b| candidate.score > b.score) {
                best = Some(candidate);
            }
        }
        best.map(|c| c.name)
    }
}

impl Default for CandidateClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CandidateClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let alive: Vec<_> = self
            .candidates
            .iter()
            .filter(|c| c.is_alive())
            .map(|c| (c.name, c.score))
            .collect();
        f.debug_struct("CandidateClassifier")
            .field("total", &self.total)
            .field("non_ascii", &self.non_ascii)
            .field("alive", &alive)
            .finish()
    }
}

impl Classifier for CandidateClassifier {
    fn reset(&mut self) {
        for candidate in &mut self.candidates {
            candidate.reset();
        }
        self.scratch.clear();
        self.head_len = 0;
        self.total = 0;
        self.non_ascii = false;
        self.saw_nul = false;
        self.saw_escape = false;
    }

    fn analyze(&mut self, chunk: &[u8]) -> bool {
        if chunk.is_empty() {
            return true;
        }

        let take = (self.head.len() - self.head_len).min(chunk.len());
        self.head[self.head_len..self.head_len + take].copy_from_slice(&chunk[..take]);
        self.head_len += take;

        self.total += chunk.len() as u64;
        self.non_ascii |= !chunk.is_ascii();
        self.saw_nul |= chunk.contains(&0);
        self.saw_escape |= chunk.contains(&0x1B);

        let scratch = &mut self.scratch;
        self.candidates
            .iter_mut()
            .all(|candidate| candidate.feed(chunk, scratch))
    }

    fn finish(&mut self) -> Option<String> {
        if self.total == 0 {
            return None;
        }
        if let Some(name) = self.bom() {
            return Some(name.to_string());
        }
        if self.saw_nul {
            return None;
        }

        let name = if !self.non_ascii {
            let iso = &self.candidates[ISO_2022_JP_INDEX];
            if self.saw_escape && iso.is_alive() && iso.non_ascii_chars > 0 {
                iso.name
            } else {
                ASCII
            }
        } else if self.candidates[UTF8_INDEX].is_alive() {
            self.candidates[UTF8_INDEX].name
        } else {
            self.best_legacy().unwrap_or(FALLBACK)
        };
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(data: &[u8]) -> Option<String> {
        let mut classifier = CandidateClassifier::new();
        assert!(classifier.analyze(data));
        classifier.finish()
    }

    fn encode(encoding: &'static Encoding, text: &str) -> Vec<u8> {
        let (bytes, _, had_errors) = encoding.encode(text);
        assert!(!had_errors);
        bytes.into_owned()
    }

    const JAPANESE: &str = "日本語のテキストです。これはエンコーディング検出のテストです。";

    #[test]
    fn test_empty_is_none() {
        assert_eq!(classify(b""), None);
    }

    #[test]
    fn test_ascii() {
        assert_eq!(classify(b"hello world").as_deref(), Some("ASCII"));
        assert_eq!(classify(b"\n\n\n").as_deref(), Some("ASCII"));
    }

    #[test]
    fn test_utf8() {
        assert_eq!(classify(JAPANESE.as_bytes()).as_deref(), Some("UTF-8"));
        assert_eq!(classify("naïve café".as_bytes()).as_deref(), Some("UTF-8"));
    }

    #[test]
    fn test_shift_jis() {
        let data = encode(SHIFT_JIS, JAPANESE);
        assert_eq!(classify(&data).as_deref(), Some("SHIFT_JIS"));
    }

    #[test]
    fn test_euc_jp() {
        let data = encode(EUC_JP, JAPANESE);
        assert_eq!(classify(&data).as_deref(), Some("EUC-JP"));
    }

    #[test]
    fn test_shift_jis_half_width_kana() {
        let data = encode(SHIFT_JIS, "ｱｲｳｴｵ半角カナ");
        assert_eq!(classify(&data).as_deref(), Some("SHIFT_JIS"));
    }

    #[test]
    fn test_gb18030() {
        let data = encode(GB18030, "中文文本，这是一个编码检测的测试。");
        assert_eq!(classify(&data).as_deref(), Some("GB18030"));

        let data = encode(GB18030, "我们的国家是一个有很多人的地方。今天天气很好，我们去公园。");
        assert_eq!(classify(&data).as_deref(), Some("GB18030"));
    }

    #[test]
    fn test_gb18030_short() {
        assert_eq!(classify(&encode(GB18030, "中文")).as_deref(), Some("GB18030"));
    }

    #[test]
    fn test_big5() {
        let data = encode(BIG5, "繁體中文文本，這是一個編碼檢測的測試。");
        assert_eq!(classify(&data).as_deref(), Some("BIG5"));

        let data = encode(BIG5, "我們的國家是一個有很多人的地方。今天天氣很好，我們去公園。");
        assert_eq!(classify(&data).as_deref(), Some("BIG5"));
    }

    #[test]
    fn test_euc_kr() {
        let data = encode(EUC_KR, "한국어 텍스트입니다. 이것은 인코딩 검출 테스트입니다.");
        assert_eq!(classify(&data).as_deref(), Some("EUC-KR"));

        let data = encode(EUC_KR, "안녕하세요. 저는 학생입니다. 오늘 날씨가 좋습니다.");
        assert_eq!(classify(&data).as_deref(), Some("EUC-KR"));
    }

    #[test]
    fn test_latin1_sentences_fall_back() {
        let samples: [&[u8]; 4] = [
            b"na\xEFve caf\xE9",
            b"\xC7a co\xFBte tr\xE8s cher, d\xE9j\xE0 vu \xE0 la fen\xEAtre.",
            b"Stra\xDFe, Gr\xFC\xDFe aus M\xFCnchen! Sch\xF6ne Gr\xF6\xDFe.",
            b"El ni\xF1o pidi\xF3 m\xE1s az\xFAcar y caf\xE9 en la ma\xF1ana.",
        ];
        for data in samples {
            assert_eq!(classify(data).as_deref(), Some("WINDOWS-1252"), "{:?}", data);
        }
    }

    #[test]
    fn test_mixed_penalty_carries_across_chunks() {
        let data = b"na\xEFve caf\xE9";
        let mut classifier = CandidateClassifier::new();
        for piece in data.chunks(3) {
            assert!(classifier.analyze(piece));
        }
        assert_eq!(classifier.finish(), classify(data));
    }

    #[test]
    fn test_frequency_tables_sorted() {
        let tables: [&[char]; 5] = [
            &HANZI_SHARED,
            &HANZI_SIMPLIFIED,
            &HANZI_TRADITIONAL,
            &KANJI,
            &HANGUL,
        ];
        for table in tables {
            assert!(table.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_iso_2022_jp() {
        let data = encode(ISO_2022_JP, JAPANESE);
        assert!(data.is_ascii());
        assert_eq!(classify(&data).as_deref(), Some("ISO-2022-JP"));
    }

    #[test]
    fn test_ansi_escape_stays_ascii() {
        assert_eq!(classify(b"\x1b[31mred\x1b[0m").as_deref(), Some("ASCII"));
    }

    #[test]
    fn test_bom() {
        assert_eq!(classify(b"\xEF\xBB\xBFabc").as_deref(), Some("UTF-8"));
        assert_eq!(classify(b"\xFF\xFEa\x00b\x00").as_deref(), Some("UTF-16LE"));
        assert_eq!(classify(b"\xFE\xFF\x00a\x00b").as_deref(), Some("UTF-16BE"));
    }

    #[test]
    fn test_bom_split_across_chunks() {
        let mut classifier = CandidateClassifier::new();
        classifier.analyze(b"\xFF");
        classifier.analyze(b"\xFE");
        classifier.analyze(b"a\x00");
        assert_eq!(classifier.finish().as_deref(), Some("UTF-16LE"));
    }

    #[test]
    fn test_binary_is_none() {
        assert_eq!(classify(b"\x00\x01\x02\x03binary"), None);
    }

    #[test]
    fn test_latin1_falls_back() {
        // "café" in ISO-8859-1: lone 0xE9 is invalid in every multi-byte candidate.
        assert_eq!(classify(b"caf\xE9 ").as_deref(), Some("WINDOWS-1252"));
    }

    #[test]
    fn test_byte_at_a_time_matches_whole() {
        let data = encode(SHIFT_JIS, JAPANESE);
        let mut classifier = CandidateClassifier::new();
        for byte in &data {
            assert!(classifier.analyze(std::slice::from_ref(byte)));
        }
        assert_eq!(classifier.finish(), classify(&data));
    }

    #[test]
    fn test_reset_forgets_previous_input() {
        let mut classifier = CandidateClassifier::new();
        classifier.analyze(&encode(SHIFT_JIS, JAPANESE));
        classifier.reset();
        classifier.analyze(b"plain");
        assert_eq!(classifier.finish().as_deref(), Some("ASCII"));
        assert_eq!(classifier.bytes_seen(), 5);
    }
}
