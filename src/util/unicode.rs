use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Display width in terminal cells.
pub fn display_width(s: &str) -> usize {
    s.graphemes(true).map(grapheme_width).sum()
}

fn grapheme_width(g: &str) -> usize {
    if g == "\t" {
        4
    } else {
        UnicodeWidthStr::width(g)
    }
}

/// Cut `s` to at most `max_cells` cells, ending in `…` when shortened.
pub fn truncate_to_width(s: &str, max_cells: usize) -> String {
    if display_width(s) <= max_cells {
        return s.to_string();
    }
    if max_cells == 0 {
        return String::new();
    }
    let budget = max_cells - 1;
    let mut used = 0;
    let mut out = String::new();
    for g in s.graphemes(true) {
        let w = grapheme_width(g);
        if used + w > budget {
            break;
        }
        used += w;
        out.push_str(g);
    }
    out.push('\u{2026}');
    out
}

/// Byte offset of the grapheme after the one at `offset`, if any.
pub fn next_grapheme_boundary(s: &str, offset: usize) -> Option<usize> {
    let g = s.get(offset..)?.graphemes(true).next()?;
    Some(offset + g.len())
}

/// Byte offset of the grapheme before `offset`, if any.
pub fn prev_grapheme_boundary(s: &str, offset: usize) -> Option<usize> {
    let g = s.get(..offset)?.graphemes(true).next_back()?;
    Some(offset - g.len())
}

/// Display column of a byte offset.
pub fn byte_offset_to_display_col(s: &str, offset: usize) -> usize {
    display_width(&s[..offset.min(s.len())])
}

/// Byte offset at display column `col`, snapped to the start of the grapheme
/// covering it. Past the end gives `s.len()`.
pub fn display_col_to_byte_offset(s: &str, col: usize) -> usize {
    let mut used = 0;
    for (i, g) in s.grapheme_indices(true) {
        let w = grapheme_width(g);
        if used + w > col {
            return i;
        }
        used += w;
    }
    s.len()
}

// ---------------------------------------------------------------------------
// Multi-line buffers
// ---------------------------------------------------------------------------

/// (line index, byte offset of that line's start) for `offset`.
pub fn line_of_offset(s: &str, offset: usize) -> (usize, usize) {
    let before = &s[..offset.min(s.len())];
    let line = before.matches('\n').count();
    let start = before.rfind('\n').map_or(0, |i| i + 1);
    (line, start)
}

/// Offset on the previous (`up`) or next line at the same display column,
/// or None at the first/last line.
pub fn vertical_offset(s: &str, offset: usize, up: bool) -> Option<usize> {
    let (_, start) = line_of_offset(s, offset);
    let col = byte_offset_to_display_col(&s[start..], offset - start);

    let (target_start, target_end) = if up {
        if start == 0 {
            return None;
        }
        let prev_end = start - 1;
        let prev_start = s[..prev_end].rfind('\n').map_or(0, |i| i + 1);
        (prev_start, prev_end)
    } else {
        let end = s[offset..].find('\n').map(|i| offset + i)?;
        let next_start = end + 1;
        let next_end = s[next_start..]
            .find('\n')
            .map_or(s.len(), |i| next_start + i);
        (next_start, next_end)
    };
    let line = &s[target_start..target_end];
    Some(target_start + display_col_to_byte_offset(line, col))
}
