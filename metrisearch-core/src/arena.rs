//! Bump storage for raw metric names.
//!
//! A generation keeps every indexed raw name so a [`Metric`] can be turned back
//! into text. Storing each name as its own `String` costs one allocation per
//! metric; the arena keeps all of them in one contiguous buffer instead and
//! hands out dense slot numbers.
//!
//! ```text
//! Buffer: [name0][name1][name2]...[free space]
//!         ^      ^      ^
//! Spans:  (0,9)  (9,14) (23,7) ...
//! ```
//!
//! Memory overhead is 6 bytes per name (u32 offset + u16 len), which caps a
//! single name at 65535 bytes.
//!
//! [`Metric`]: metrisearch_types::Metric

/// Location of one name in the arena - 6 bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct NameSpan {
    offset: u32,
    len: u16,
}

impl NameSpan {
    #[inline(always)]
    const fn range(self) -> core::ops::Range<usize> {
        let start = self.offset as usize;
        start..start + self.len as usize
    }
}

/// Append-only string storage addressed by slot number.
#[derive(Debug, Default, Clone)]
pub struct NameArena {
    buffer: String,
    spans: Vec<NameSpan>,
}

impl NameArena {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an arena sized for `names` names totalling `bytes` bytes.
    pub fn with_capacity(bytes: usize, names: usize) -> Self {
        Self {
            buffer: String::with_capacity(bytes),
            spans: Vec::with_capacity(names),
        }
    }

    /// Returns the number of stored names.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Returns true if no names are stored.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Appends a name and returns its slot.
    ///
    /// Returns `None` if the name is longer than 65535 bytes or the buffer
    /// would grow past 4 GiB.
    #[inline]
    pub fn push(&mut self, name: &str) -> Option<u32> {
        let len = u16::try_from(name.len()).ok()?;
        let offset = u32::try_from(self.buffer.len()).ok()?;
        offset.checked_add(len as u32)?;
        let slot = u32::try_from(self.spans.len()).ok()?;

        self.buffer.push_str(name);
        self.spans.push(NameSpan { offset, len });
        Some(slot)
    }

    /// Gets a name by slot.
    #[inline(always)]
    pub fn get(&self, slot: u32) -> Option<&str> {
        let span = self.spans.get(slot as usize)?;
        self.buffer.get(span.range())
    }
}
