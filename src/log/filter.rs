//! Level / tag / keyword filtering
//!
//! Two checks gate every leveled line:
//!
//! 1. **Before formatting** ([`LogFilter::should_emit`]): the line's level is
//!    compared against the tag's own level (if one is set) or the global
//!    level, and, when a global filter tag is set, the tag must match it.
//! 2. **After formatting** ([`LogFilter::should_emit_after_format`]): when a
//!    global keyword is set, the rendered line must contain it.
//!
//! The global level itself is an atomic on the logger; everything else lives
//! here and is only touched under the logger's shared-state lock.

use core::fmt;

use hashbrown::HashMap;

use crate::config::{FILTER_KW_MAX_LEN, FILTER_TAG_MAX_LEN};
use crate::error::{DlogError, DlogResult};
use crate::log::level::LogLevel;

/// Fixed-capacity filter string (tag or keyword)
///
/// Input longer than `N - 1` bytes is cut at the last char boundary that
/// fits, so two tags that agree on their first `N - 1` bytes compare equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilterStr<const N: usize> {
    len: u8,
    bytes: [u8; N],
}

/// A filter tag, at most [`FILTER_TAG_MAX_LEN`] bytes
pub type FilterTag = FilterStr<{ FILTER_TAG_MAX_LEN + 1 }>;

/// A filter keyword, at most [`FILTER_KW_MAX_LEN`] bytes
pub type FilterKeyword = FilterStr<{ FILTER_KW_MAX_LEN + 1 }>;

impl<const N: usize> FilterStr<N> {
    pub fn new(s: &str) -> Self {
        let mut end = s.len().min(N - 1);
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        let mut bytes = [0; N];
        bytes[..end].copy_from_slice(&s.as_bytes()[..end]);
        Self {
            len: end as u8,
            bytes,
        }
    }

    pub fn as_str(&self) -> &str {
        // 构造时按字符边界截断
        unsafe { core::str::from_utf8_unchecked(self.as_bytes()) }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<const N: usize> fmt::Debug for FilterStr<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl<const N: usize> fmt::Display for FilterStr<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-tag levels plus the global tag and keyword filters
#[derive(Default)]
pub struct LogFilter {
    tag_levels: HashMap<FilterTag, LogLevel>,
    tag: Option<FilterTag>,
    keyword: Option<FilterKeyword>,
}

impl LogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// First check, run before any formatting work
    #[inline]
    pub fn should_emit(&self, level: LogLevel, tag: &str, global_level: LogLevel) -> bool {
        let key = FilterTag::new(tag);
        let threshold = self.tag_levels.get(&key).copied().unwrap_or(global_level);
        if level > threshold {
            return false;
        }

        match &self.tag {
            Some(only) => *only == key,
            None => true,
        }
    }

    /// Second check, run on the rendered line
    #[inline]
    pub fn should_emit_after_format(&self, line: &[u8]) -> bool {
        match &self.keyword {
            Some(keyword) => contains(line, keyword.as_bytes()),
            None => true,
        }
    }

    /// Sets or overwrites the level of `tag`
    pub fn set_tag_level(&mut self, tag: &str, level: LogLevel) -> DlogResult<()> {
        let key = non_empty(FilterTag::new(tag))?;
        if let Some(existing) = self.tag_levels.get_mut(&key) {
            *existing = level;
            return Ok(());
        }
        self.tag_levels
            .try_reserve(1)
            .map_err(|_| DlogError::NoMemory)?;
        self.tag_levels.insert(key, level);
        Ok(())
    }

    pub fn tag_level(&self, tag: &str) -> DlogResult<LogLevel> {
        self.tag_levels
            .get(&FilterTag::new(tag))
            .copied()
            .ok_or(DlogError::NotFound)
    }

    pub fn remove_tag_level(&mut self, tag: &str) -> DlogResult<()> {
        self.tag_levels
            .remove(&FilterTag::new(tag))
            .map(|_| ())
            .ok_or(DlogError::NotFound)
    }

    /// The most verbose level set on any tag
    pub fn max_tag_level(&self) -> Option<LogLevel> {
        self.tag_levels.values().copied().max()
    }

    pub fn tag_level_count(&self) -> usize {
        self.tag_levels.len()
    }

    pub fn set_tag(&mut self, tag: &str) -> DlogResult<()> {
        self.tag = Some(non_empty(FilterTag::new(tag))?);
        Ok(())
    }

    pub fn tag(&self) -> Option<FilterTag> {
        self.tag
    }

    pub fn clear_tag(&mut self) {
        self.tag = None;
    }

    pub fn set_keyword(&mut self, keyword: &str) -> DlogResult<()> {
        self.keyword = Some(non_empty(FilterKeyword::new(keyword))?);
        Ok(())
    }

    pub fn keyword(&self) -> Option<FilterKeyword> {
        self.keyword
    }

    pub fn clear_keyword(&mut self) {
        self.keyword = None;
    }
}

fn non_empty<const N: usize>(s: FilterStr<N>) -> DlogResult<FilterStr<N>> {
    if s.is_empty() {
        Err(DlogError::InvalidArgument)
    } else {
        Ok(s)
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle)
}
