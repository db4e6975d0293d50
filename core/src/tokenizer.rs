use crate::config::{MAX_SHINGLE_LEN, MAX_WORD_LEN, MIN_WORD_LEN};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};

lazy_static! {
    static ref CLAUSE_RE: Regex = Regex::new(r"[.,?!;:]").expect("valid regex");
    static ref WORD_RE: Regex = Regex::new(r"\w+(?:[-_']+\w+)?").expect("valid regex");
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

pub fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Whether a word may take part in a shingle.
pub fn is_shingle_word(word: &str) -> bool {
    let len = word.chars().count();
    (MIN_WORD_LEN..=MAX_WORD_LEN).contains(&len) && !is_stopword(word)
}

/// Split normalized text into clauses at sentence and clause punctuation.
pub fn clauses(text: &str) -> impl Iterator<Item = &str> {
    CLAUSE_RE.split(text)
}

/// Words of one clause. Hyphens, underscores and apostrophes may join two runs,
/// so "well-known" and "don't" are single words.
pub fn words(clause: &str) -> Vec<&str> {
    WORD_RE.find_iter(clause).map(|m| m.as_str()).collect()
}

/// Number of words in a piece of text, counted the same way shingles are formed.
pub fn word_count(text: &str) -> usize {
    WORD_RE.find_iter(text).count()
}

/// Count every 1..=3 word shingle in normalized text.
///
/// A window is skipped when any of its words is too short, too long or a
/// stopword. Windows never cross a clause boundary.
pub fn shingles(text: &str) -> HashMap<String, u32> {
    let mut counts: HashMap<String, u32> = HashMap::new();
    for clause in clauses(text) {
        let words = words(clause);
        let accepted: Vec<bool> = words.iter().map(|w| is_shingle_word(w)).collect();
        for size in 1..=MAX_SHINGLE_LEN {
            if words.len() < size { break; }
            for start in 0..=words.len() - size {
                if !accepted[start..start + size].iter().all(|&ok| ok) { continue; }
                let shingle = words[start..start + size].join(" ");
                *counts.entry(shingle).or_insert(0) += 1;
            }
        }
    }
    counts
}
