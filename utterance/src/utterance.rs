use std::borrow::Cow;

/// Recognized text handed to the classifier.
///
/// Built from raw text or from a recognizer's word list; a word list is
/// joined without separators, so `["電気", "を", "つけ", "て"]` matches the
/// same as `"電気をつけて"`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Utterance<'a>(Cow<'a, str>);

impl<'a> Utterance<'a> {
    pub fn new(text: impl Into<Cow<'a, str>>) -> Self {
        Self(text.into())
    }

    /// Joins recognizer tokens without a separator.
    pub fn from_words<S: AsRef<str>>(words: &[S]) -> Utterance<'static> {
        Utterance(Cow::Owned(words.iter().map(|w| w.as_ref()).collect()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub(crate) fn contains_any(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|k| self.0.contains(k))
    }

    pub fn into_owned(self) -> Utterance<'static> {
        Utterance(Cow::Owned(self.0.into_owned()))
    }
}

impl<'a> From<&'a str> for Utterance<'a> {
    fn from(text: &'a str) -> Self {
        Self(Cow::Borrowed(text))
    }
}

impl<'a> From<&'a String> for Utterance<'a> {
    fn from(text: &'a String) -> Self {
        Self(Cow::Borrowed(text.as_str()))
    }
}

impl From<String> for Utterance<'static> {
    fn from(text: String) -> Self {
        Self(Cow::Owned(text))
    }
}

impl<'a, S: AsRef<str>> From<&'a [S]> for Utterance<'static> {
    fn from(words: &'a [S]) -> Self {
        Utterance::from_words(words)
    }
}

impl<'a, S: AsRef<str>> From<&'a Vec<S>> for Utterance<'static> {
    fn from(words: &'a Vec<S>) -> Self {
        Utterance::from_words(words)
    }
}

impl<S: AsRef<str>> From<Vec<S>> for Utterance<'static> {
    fn from(words: Vec<S>) -> Self {
        Utterance::from_words(&words)
    }
}

impl<'a, 'b> From<&'b Utterance<'a>> for Utterance<'b> {
    fn from(u: &'b Utterance<'a>) -> Self {
        Utterance(Cow::Borrowed(u.as_str()))
    }
}
