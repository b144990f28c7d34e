//! Bound parameters and SQL fragments.
//!
//! Every caller-supplied value reaches the store as a [`BindValue`] lined up
//! with a `?` placeholder; nothing is spliced into SQL text.

/// Bind values for `sqlx` queries.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<String> for BindValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for BindValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for BindValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for BindValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for BindValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for BindValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// A piece of SQL together with the values for its placeholders.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fragment {
    sql: String,
    params: Vec<BindValue>,
}

impl Fragment {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn bind(mut self, value: impl Into<BindValue>) -> Self {
        self.params.push(value.into());
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[BindValue] {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.sql.trim().is_empty()
    }

    /// Placeholders in the SQL match the bound values.
    pub fn is_balanced(&self) -> bool {
        count_placeholders(&self.sql) == self.params.len()
    }
}

/// Count `?` placeholders that the database will see as parameters.
///
/// Skips quoted literals and identifiers, `-- ...` line comments and
/// `/* ... */` block comments. Inside `'...'` and `"..."` a backslash escapes
/// the next character, as in MySQL's default mode; write a literal backslash
/// as `'\\'`.
pub fn count_placeholders(sql: &str) -> usize {
    let mut count = 0;
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '?' => count += 1,
            '\'' | '"' => {
                while let Some(inner) = chars.next() {
                    if inner == '\\' {
                        chars.next();
                    } else if inner == c {
                        break;
                    }
                }
            }
            '`' => {
                for inner in chars.by_ref() {
                    if inner == '`' {
                        break;
                    }
                }
            }
            '-' if chars.peek() == Some(&'-') => {
                for inner in chars.by_ref() {
                    if inner == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for inner in chars.by_ref() {
                    if prev == '*' && inner == '/' {
                        break;
                    }
                    prev = inner;
                }
            }
            _ => {}
        }
    }
    count
}

pub(crate) fn push_fragment(sql: &mut String, params: &mut Vec<BindValue>, fragment: &Fragment) {
    sql.push_str(fragment.sql());
    params.extend(fragment.params().iter().cloned());
}

/// Escape `%`, `_` and the escape character itself for `LIKE ... ESCAPE '!'`.
pub fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '!') {
            out.push('!');
        }
        out.push(c);
    }
    out
}
