use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use winnow::combinator::separated;
use winnow::error::ContextError;
use winnow::token::take_till;
use winnow::Parser;

/// Ordered set of volume names.
///
/// The [`VolumeFilterSet`] determines which geometric volumes get an energy
/// deposit column in the output. Names keep the order in which they were first
/// inserted, and that order is the column order of every output record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VolumeFilterSet {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl VolumeFilterSet {
    /// Creates a new empty set.
    ///
    /// # Examples
    ///
    /// ```
    /// use edep::volumes::VolumeFilterSet;
    /// let volumes = VolumeFilterSet::new();
    /// assert!(volumes.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::default()
    }
    /// Adds a volume name to the set. Returns whether the name was newly
    /// inserted.
    ///
    /// # Examples
    ///
    /// ```
    /// use edep::volumes::VolumeFilterSet;
    ///
    /// let mut volumes = VolumeFilterSet::new();
    ///
    /// assert_eq!(volumes.insert("LArVol"), true);
    /// assert_eq!(volumes.insert("LArVol"), false);
    /// ```
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.positions.contains_key(&name) {
            return false;
        }
        self.positions.insert(name.clone(), self.names.len());
        self.names.push(name);

        true
    }
    /// Returns `true` if the set contains exactly this name.
    ///
    /// # Examples
    ///
    /// ```
    /// use edep::volumes::VolumeFilterSet;
    ///
    /// let volumes = VolumeFilterSet::from(["LArVol"]);
    /// assert_eq!(volumes.contains("LArVol"), true);
    /// assert_eq!(volumes.contains("LAr"), false);
    /// ```
    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }
    /// Returns the insertion position of a name, i.e. its output column
    /// among the per-volume columns.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }
    /// Number of volume names in the set.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
    /// Iterates over the names in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
    /// Reads a volume list file.
    ///
    /// A file that cannot be read is not an error: a warning is logged and an
    /// empty set is returned, so only primary and channel information gets
    /// extracted. Non-UTF-8 contents count as unreadable.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => text.parse(),
            Err(error) => {
                tracing::warn!(
                    path = %path.display(),
                    %error,
                    "cannot open volumes file, proceeding without volume filtering"
                );
                Ok(Self::new())
            }
        }
    }
}

impl<S> FromIterator<S> for VolumeFilterSet
where
    S: Into<String>,
{
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = S>,
    {
        let mut volumes = Self::new();
        for name in iter {
            volumes.insert(name);
        }

        volumes
    }
}

impl<S, const N: usize> From<[S; N]> for VolumeFilterSet
where
    S: Into<String>,
{
    /// Converts a `[S; N]` into a `VolumeFilterSet`.
    ///
    /// If the array contains any equal names, only the first one is kept.
    ///
    /// # Examples
    ///
    /// ```
    /// use edep::volumes::VolumeFilterSet;
    ///
    /// let volumes = VolumeFilterSet::from(["LArVol", "volCryostat", "LArVol"]);
    /// assert_eq!(volumes.iter().collect::<Vec<_>>(), ["LArVol", "volCryostat"]);
    /// ```
    fn from(arr: [S; N]) -> Self {
        Self::from_iter(arr)
    }
}

impl fmt::Display for VolumeFilterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names.join("\n"))
    }
}

const BLANK: [char; 4] = [' ', '\t', '\r', '\n'];

// Whatever is left of a line after trimming is the name, inner whitespace and
// `#` included. Only a `#` at the very start makes the line a comment.
fn line_name(line: &str) -> Option<&str> {
    let line = line.trim_matches(BLANK);
    if line.is_empty() || line.starts_with('#') {
        None
    } else {
        Some(line)
    }
}

/// The error type returned when parsing input text fails.
///
/// Renders the offending input with the failure location highlighted.
#[derive(Debug)]
pub struct ParseError {
    message: String,
    input: String,
    span: std::ops::Range<usize>,
}

impl ParseError {
    fn from_parse(error: winnow::error::ParseError<&str, ContextError>) -> Self {
        let input = error.input().to_string();
        let span = error.char_span();
        Self {
            message: String::from("invalid line starting here"),
            input,
            span,
        }
    }

    pub(crate) fn from_json(input: &str, error: &serde_json::Error) -> Self {
        let start = byte_offset(input, error.line(), error.column());
        let end = input[start..]
            .chars()
            .next()
            .map_or(start, |c| start + c.len_utf8());
        Self {
            message: error.to_string(),
            input: input.to_string(),
            span: start..end,
        }
    }
}

// `line` and `column` are 1-based, as reported by serde_json.
fn byte_offset(input: &str, line: usize, column: usize) -> usize {
    let line_start: usize = input
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    let mut offset = (line_start + column.saturating_sub(1)).min(input.len());
    while !input.is_char_boundary(offset) {
        offset -= 1;
    }

    offset
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = annotate_snippets::Level::Error.title(&self.message).snippet(
            annotate_snippets::Snippet::source(&self.input)
                .fold(true)
                .annotation(annotate_snippets::Level::Error.span(self.span.clone())),
        );
        let renderer = annotate_snippets::Renderer::plain();
        let rendered = renderer.render(message);
        rendered.fmt(f)
    }
}

impl std::error::Error for ParseError {}

impl std::str::FromStr for VolumeFilterSet {
    type Err = ParseError;

    /// Parse a [`VolumeFilterSet`] from the contents of a volume list file.
    ///
    /// One name per line, with spaces, tabs and carriage returns trimmed from
    /// both ends. Blank lines and lines starting with `#` are ignored. Any
    /// other line is a name, so every input text is a valid volume list.
    ///
    /// # Examples
    ///
    /// ```
    /// use edep::volumes::VolumeFilterSet;
    /// use std::str::FromStr;
    ///
    /// let volumes = VolumeFilterSet::from_str("LArVol\n# outer vessel\n  volCryostat \r\nvol#2\n")?;
    /// assert_eq!(volumes, VolumeFilterSet::from(["LArVol", "volCryostat", "vol#2"]));
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut names = Vec::new();

        let () = separated::<_, _, (), _, ContextError, _, _>(
            0..,
            take_till(0.., '\n').map(|line: &str| {
                if let Some(name) = line_name(line) {
                    names.push(name.to_string());
                }
            }),
            '\n',
        )
        .parse(input)
        .map_err(ParseError::from_parse)?;

        Ok(Self::from_iter(names))
    }
}
