/// Width of a `wchar_t` code unit, used for `L` prefixed literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WcharWidth {
    Utf16,
    #[default]
    Utf32,
}

/// Classification settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Maximum depth of a body's expression tree. Each operator and each
    /// parenthesized group is one level.
    pub max_depth: usize,
    pub wchar_width: WcharWidth,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: 100,
            wchar_width: WcharWidth::default(),
        }
    }
}
