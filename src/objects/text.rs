use std::collections::HashSet;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use super::ObjectSet;
use super::lexicon::{self, contains};

const WORD_PATTERN: &str = r"[\p{L}\p{N}]+(?:['’\-][\p{L}\p{N}]+)*|[^\s\p{L}\p{N}]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PosTag {
    Noun,
    PluralNoun,
    Adjective,
    Verb,
    VerbPresent,
    VerbGerund,
    VerbParticiple,
    Adverb,
    Determiner,
    Pronoun,
    Preposition,
    Conjunction,
    Modal,
    To,
    Number,
    Punctuation,
}

impl PosTag {
    /// Penn Treebank label.
    pub fn penn(self) -> &'static str {
        match self {
            Self::Noun => "NN",
            Self::PluralNoun => "NNS",
            Self::Adjective => "JJ",
            Self::Verb => "VB",
            Self::VerbPresent => "VBZ",
            Self::VerbGerund => "VBG",
            Self::VerbParticiple => "VBN",
            Self::Adverb => "RB",
            Self::Determiner => "DT",
            Self::Pronoun => "PRP",
            Self::Preposition => "IN",
            Self::Conjunction => "CC",
            Self::Modal => "MD",
            Self::To => "TO",
            Self::Number => "CD",
            Self::Punctuation => ".",
        }
    }

    pub fn is_noun(self) -> bool {
        self.penn().starts_with("NN")
    }
}

pub trait PosTagger: Send + Sync {
    /// One tag per token, same order.
    fn tag(&self, tokens: &[String]) -> Vec<PosTag>;
}

pub trait EntityRecognizer: Send + Sync {
    /// Surface forms of named entities found in the original-cased text.
    fn entities(&self, text: &str) -> Result<Vec<String>>;
}

pub trait Lemmatizer: Send + Sync {
    fn lemmatize(&self, phrase: &str) -> String;
}

/// Description-side object extraction: noun phrases plus named entities,
/// stop-word filtered and lemmatized.
pub struct TextObjectExtractor {
    word_pattern: Regex,
    tagger: Box<dyn PosTagger>,
    recognizer: Box<dyn EntityRecognizer>,
    lemmatizer: Box<dyn Lemmatizer>,
    stop_words: HashSet<&'static str>,
}

impl TextObjectExtractor {
    pub fn new(
        tagger: Box<dyn PosTagger>,
        recognizer: Box<dyn EntityRecognizer>,
        lemmatizer: Box<dyn Lemmatizer>,
    ) -> Result<Self> {
        Ok(Self {
            word_pattern: Regex::new(WORD_PATTERN).context("failed to compile word pattern")?,
            tagger,
            recognizer,
            lemmatizer,
            stop_words: lexicon::STOP_WORDS.iter().copied().collect(),
        })
    }

    pub fn standard() -> Result<Self> {
        Self::new(
            Box::new(LexiconTagger),
            Box::new(CapitalizedSpanRecognizer::new()?),
            Box::new(RuleLemmatizer),
        )
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.word_pattern
            .find_iter(text)
            .map(|found| found.as_str().to_string())
            .collect()
    }

    pub fn extract(&self, description: &str) -> Result<ObjectSet> {
        let tokens = self.tokenize(&description.to_lowercase());
        let tags = self.tagger.tag(&tokens);
        let phrases = group_noun_phrases(&tokens, &tags);

        let entities = self
            .recognizer
            .entities(description)?
            .into_iter()
            .map(|entity| entity.trim().to_lowercase())
            .collect::<Vec<String>>();

        let mut objects = ObjectSet::new();
        for candidate in entities.iter().chain(phrases.iter()) {
            if self.is_filtered(candidate) {
                continue;
            }
            let lemma = self.lemmatizer.lemmatize(candidate);
            if self.is_filtered(&lemma) {
                continue;
            }
            objects.insert(lemma);
        }

        debug!(?entities, ?phrases, ?objects, "extracted description objects");
        Ok(objects)
    }

    fn is_filtered(&self, candidate: &str) -> bool {
        candidate.chars().count() <= 1 || self.stop_words.contains(candidate)
    }
}

/// Greedy grouping: a run of noun tags becomes one phrase, anything else
/// flushes the current run.
pub fn group_noun_phrases(tokens: &[String], tags: &[PosTag]) -> Vec<String> {
    let mut phrases = Vec::<String>::new();
    let mut current = Vec::<&str>::new();

    for (token, tag) in tokens.iter().zip(tags.iter()) {
        if tag.is_noun() {
            current.push(token);
        } else if !current.is_empty() {
            phrases.push(current.join(" "));
            current.clear();
        }
    }
    if !current.is_empty() {
        phrases.push(current.join(" "));
    }

    phrases
}

/// Closed-class lexicon tagger with suffix heuristics and a small contextual
/// pass; open-class words default to nouns.
#[derive(Debug, Default, Clone, Copy)]
pub struct LexiconTagger;

impl PosTagger for LexiconTagger {
    fn tag(&self, tokens: &[String]) -> Vec<PosTag> {
        let lexical = tokens
            .iter()
            .map(|token| lexical_tag(token))
            .collect::<Vec<PosTag>>();
        let mut tags = lexical.clone();

        for index in 0..tokens.len() {
            let previous = index.checked_sub(1).map(|prev| tags[prev]);
            let next = lexical.get(index + 1).copied();
            let word = tokens[index].as_str();

            match tags[index] {
                PosTag::VerbGerund | PosTag::VerbParticiple | PosTag::Modal
                    if matches!(
                        previous,
                        Some(PosTag::Determiner | PosTag::Adjective | PosTag::Number)
                    ) =>
                {
                    tags[index] = if next.is_some_and(PosTag::is_noun) {
                        PosTag::Adjective
                    } else {
                        noun_tag(word)
                    };
                }
                PosTag::Noun | PosTag::PluralNoun if is_verb_form(word) => {
                    if matches!(previous, Some(PosTag::To | PosTag::Modal)) {
                        tags[index] = PosTag::Verb;
                    } else if matches!(
                        previous,
                        Some(PosTag::Noun | PosTag::PluralNoun | PosTag::Pronoun)
                    ) {
                        tags[index] = PosTag::VerbPresent;
                    }
                }
                _ => {}
            }
        }

        tags
    }
}

fn lexical_tag(word: &str) -> PosTag {
    let length = word.chars().count();

    if !word.chars().any(char::is_alphanumeric) {
        return PosTag::Punctuation;
    }
    if word.chars().any(|c| c.is_ascii_digit())
        && word.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',')
    {
        return PosTag::Number;
    }
    if word == "to" {
        return PosTag::To;
    }

    let closed_classes = [
        (lexicon::NUMBER_WORDS, PosTag::Number),
        (lexicon::DETERMINERS, PosTag::Determiner),
        (lexicon::PRONOUNS, PosTag::Pronoun),
        (lexicon::CONJUNCTIONS, PosTag::Conjunction),
        (lexicon::MODALS, PosTag::Modal),
        (lexicon::AUXILIARIES, PosTag::Verb),
        (lexicon::PREPOSITIONS, PosTag::Preposition),
        (lexicon::ADVERBS, PosTag::Adverb),
        (lexicon::ADJECTIVES, PosTag::Adjective),
    ];
    for (list, tag) in closed_classes {
        if contains(list, word) {
            return tag;
        }
    }

    if contains(lexicon::SUFFIX_NOUNS, word) {
        return noun_tag(word);
    }
    if length > 4 && word.ends_with("ing") {
        return PosTag::VerbGerund;
    }
    if length > 4 && word.ends_with("ed") {
        return PosTag::VerbParticiple;
    }
    if length > 4 && word.ends_with("ly") {
        return PosTag::Adverb;
    }
    let adjective_suffixes = ["ous", "ful", "ive", "able", "ible", "less", "ish", "ical"];
    if length > 5 && adjective_suffixes.iter().any(|suffix| word.ends_with(suffix)) {
        return PosTag::Adjective;
    }

    noun_tag(word)
}

fn noun_tag(word: &str) -> PosTag {
    if word.chars().count() > 3
        && word.ends_with('s')
        && !word.ends_with("ss")
        && !contains(lexicon::INVARIANT_NOUNS, word)
    {
        PosTag::PluralNoun
    } else {
        PosTag::Noun
    }
}

fn is_verb_form(word: &str) -> bool {
    if contains(lexicon::VERB_STEMS, word) {
        return true;
    }
    let candidates = [
        word.strip_suffix("ies").map(|stem| format!("{stem}y")),
        word.strip_suffix("es").map(str::to_string),
        word.strip_suffix('s').map(str::to_string),
    ];
    candidates
        .into_iter()
        .flatten()
        .any(|stem| contains(lexicon::VERB_STEMS, &stem))
}

/// Treats runs of capitalised words as entities. A lone capitalised word at
/// the start of a sentence is ignored unless it is an acronym, and a leading
/// function word is dropped from a run.
pub struct CapitalizedSpanRecognizer {
    token_pattern: Regex,
}

impl CapitalizedSpanRecognizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            token_pattern: Regex::new(WORD_PATTERN).context("failed to compile entity pattern")?,
        })
    }
}

impl EntityRecognizer for CapitalizedSpanRecognizer {
    fn entities(&self, text: &str) -> Result<Vec<String>> {
        let mut entities = Vec::<String>::new();
        let mut run = Vec::<&str>::new();
        let mut run_at_sentence_start = false;
        let mut sentence_start = true;

        for found in self.token_pattern.find_iter(text) {
            let token = found.as_str();
            let capitalised = token.chars().next().is_some_and(char::is_uppercase);

            if capitalised {
                if run.is_empty() {
                    run_at_sentence_start = sentence_start;
                }
                run.push(token);
            } else {
                flush_entity_run(&mut run, run_at_sentence_start, &mut entities);
            }

            sentence_start = matches!(token, "." | "!" | "?");
        }
        flush_entity_run(&mut run, run_at_sentence_start, &mut entities);

        Ok(entities)
    }
}

fn flush_entity_run(run: &mut Vec<&str>, at_sentence_start: bool, out: &mut Vec<String>) {
    if run.is_empty() {
        return;
    }

    let mut words = run.as_slice();
    if at_sentence_start {
        let leading = words[0].to_lowercase();
        let is_function_word = contains(lexicon::STOP_WORDS, &leading)
            || contains(lexicon::DETERMINERS, &leading)
            || contains(lexicon::PREPOSITIONS, &leading);
        let is_acronym = words[0].chars().count() > 1 && words[0].chars().all(char::is_uppercase);

        if words.len() == 1 && !is_acronym {
            words = &[];
        } else if words.len() > 1 && is_function_word {
            words = &words[1..];
        }
    }

    if !words.is_empty() {
        out.push(words.join(" ").to_lowercase());
    }
    run.clear();
}

/// Noun lemmatizer for the head (last) word of a phrase: irregular plurals,
/// invariant nouns, then suffix rules.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleLemmatizer;

impl Lemmatizer for RuleLemmatizer {
    fn lemmatize(&self, phrase: &str) -> String {
        match phrase.rsplit_once(' ') {
            Some((head, last)) => format!("{head} {}", lemmatize_noun(last)),
            None => lemmatize_noun(phrase),
        }
    }
}

fn lemmatize_noun(word: &str) -> String {
    let word = word
        .strip_suffix("'s")
        .or_else(|| word.strip_suffix("’s"))
        .unwrap_or(word);
    if word.chars().count() <= 3 {
        return word.to_string();
    }
    if let Some((_, singular)) = lexicon::IRREGULAR_PLURALS
        .iter()
        .find(|(plural, _)| *plural == word)
    {
        return (*singular).to_string();
    }
    if contains(lexicon::INVARIANT_NOUNS, word)
        || word.ends_with("ss")
        || word.ends_with("us")
        || word.ends_with("is")
    {
        return word.to_string();
    }
    if contains(lexicon::OES_PLURALS, word) {
        return word[..word.len() - 2].to_string();
    }
    if let Some(stem) = word.strip_suffix("ies") {
        if stem.chars().count() > 1 {
            return format!("{stem}y");
        }
    }
    for suffix in ["sses", "xes", "ches", "shes", "zzes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    match word.strip_suffix('s') {
        Some(stem) => stem.to_string(),
        None => word.to_string(),
    }
}
