//! Buffer view: dot/mark/scroll over a buffer, motion primitives, region
//! operations, and the per-frame render pass.

use core_buffer::killring::KillRing;
use core_buffer::{Buffer, BufferId};
use core_render::CommandList;
use core_text::{Color, ColorAttr, Location, Property, Region, Span};

/// Weakly references one buffer by id: resolving through the arena on
/// every access tolerates the buffer being reloaded or relocated
/// underneath a long-lived view.
#[derive(Clone)]
pub struct BufferView {
    pub buffer_id: BufferId,
    pub dot: Location,
    pub mark: Location,
    pub mark_set: bool,
    /// (line, col) of the top-left visible cell.
    pub scroll: (usize, usize),
    pub show_modeline: bool,
    pub line_numbers: bool,
    pub fringe_width: u16,
    /// The region `paste` last inserted, so a following `paste-older` knows
    /// what to replace without the caller having to thread it through.
    pub last_paste: Option<Region>,
}

impl BufferView {
    pub fn new(buffer_id: BufferId) -> Self {
        Self {
            buffer_id,
            dot: Location::origin(),
            mark: Location::origin(),
            mark_set: false,
            scroll: (0, 0),
            show_modeline: true,
            line_numbers: false,
            fringe_width: 0,
            last_paste: None,
        }
    }

    pub fn region(&self) -> Option<Region> {
        self.mark_set.then(|| Region::new(self.mark, self.dot))
    }

    /// Point this window at a different buffer, resetting dot/mark/scroll
    /// but keeping the view's own display settings (modeline, gutter).
    /// Ground-truthed against `switch_buffer`/`find_file` setting a new
    /// buffer into the active window.
    pub fn set_buffer(&mut self, buffer_id: BufferId) {
        self.buffer_id = buffer_id;
        self.dot = Location::origin();
        self.mark = Location::origin();
        self.mark_set = false;
        self.scroll = (0, 0);
    }

    pub fn set_mark(&mut self) {
        self.mark = self.dot;
        self.mark_set = true;
    }

    pub fn clear_mark(&mut self) {
        self.mark_set = false;
    }

    /// Shared prelude for char-deleting commands: if a non-empty selection
    /// is active, delete it (consuming the mark) and return the new dot;
    /// otherwise the dot is unchanged.
    pub fn maybe_delete_region(&mut self, buffer: &mut Buffer, kill_ring: &mut KillRing) -> Location {
        if let Some(region) = self.region()
            && region.has_size()
        {
            let loc = buffer.delete(region);
            kill_ring.note_non_paste_action();
            self.mark_set = false;
            self.dot = loc;
        }
        self.dot
    }

    /// Insert `bytes` at dot: replace the selection first if one exists,
    /// then insert, leaving dot at the insertion end.
    pub fn add(&mut self, buffer: &mut Buffer, kill_ring: &mut KillRing, bytes: &[u8]) -> Location {
        let start = self.maybe_delete_region(buffer, kill_ring);
        let end = buffer.add(start, bytes);
        kill_ring.note_non_paste_action();
        self.dot = end;
        end
    }

    pub fn newline(&mut self, buffer: &mut Buffer, kill_ring: &mut KillRing) -> Location {
        self.add(buffer, kill_ring, b"\n")
    }

    pub fn indent(&mut self, buffer: &mut Buffer, kill_ring: &mut KillRing, tab_width: usize) -> Location {
        let start = self.maybe_delete_region(buffer, kill_ring);
        let end = buffer.indent(start, tab_width);
        kill_ring.note_non_paste_action();
        self.dot = end;
        end
    }

    /// Delete one character forward (or the selection, if any).
    pub fn delete_forward_char(&mut self, buffer: &mut Buffer, kill_ring: &mut KillRing) -> Location {
        if self.region().is_some_and(Region::has_size) {
            return self.maybe_delete_region(buffer, kill_ring);
        }
        let end = buffer.next_char(self.dot);
        if end == self.dot {
            return self.dot;
        }
        let loc = buffer.delete(Region::new(self.dot, end));
        kill_ring.note_non_paste_action();
        self.dot = loc;
        loc
    }

    /// Delete one character backward (or the selection, if any).
    pub fn delete_backward_char(&mut self, buffer: &mut Buffer, kill_ring: &mut KillRing) -> Location {
        if self.region().is_some_and(Region::has_size) {
            return self.maybe_delete_region(buffer, kill_ring);
        }
        let start = buffer.previous_char(self.dot);
        if start == self.dot {
            return self.dot;
        }
        let loc = buffer.delete(Region::new(start, self.dot));
        kill_ring.note_non_paste_action();
        self.dot = loc;
        loc
    }

    pub fn move_next_char(&mut self, buffer: &Buffer) {
        self.dot = buffer.next_char(self.dot);
    }

    pub fn move_previous_char(&mut self, buffer: &Buffer) {
        self.dot = buffer.previous_char(self.dot);
    }

    pub fn move_next_line(&mut self, buffer: &Buffer) {
        self.dot = buffer.next_line(self.dot);
    }

    pub fn move_previous_line(&mut self, buffer: &Buffer) {
        self.dot = buffer.previous_line(self.dot);
    }

    pub fn move_next_word(&mut self, buffer: &Buffer) {
        self.dot = buffer.next_word(self.dot);
    }

    pub fn move_previous_word(&mut self, buffer: &Buffer) {
        self.dot = buffer.previous_word(self.dot);
    }

    pub fn move_end(&mut self, buffer: &Buffer) {
        self.dot = buffer.end();
    }

    pub fn copy_region(&mut self, buffer: &Buffer, kill_ring: &mut KillRing) {
        if let Some(region) = self.region() {
            buffer.copy_region(region, kill_ring);
        }
    }

    pub fn cut_region(&mut self, buffer: &mut Buffer, kill_ring: &mut KillRing) -> Location {
        let Some(region) = self.region() else {
            return self.dot;
        };
        let loc = buffer.cut_region(region, kill_ring);
        self.mark_set = false;
        self.dot = loc;
        loc
    }

    /// Cut from dot through end-of-line (consuming the newline when
    /// already at end-of-line), via the kill ring.
    pub fn kill_line(&mut self, buffer: &mut Buffer, kill_ring: &mut KillRing) -> Location {
        let loc = buffer.kill_line(self.dot, kill_ring);
        self.dot = loc;
        loc
    }

    pub fn paste(&mut self, buffer: &mut Buffer, kill_ring: &mut KillRing) -> (Location, Location) {
        let before = self.dot;
        let after = buffer.paste(self.dot, kill_ring);
        self.dot = after;
        self.last_paste = Some(Region::new(before, after));
        (before, after)
    }

    /// Replace the region the most recent `paste` inserted with the prior
    /// kill-ring entry. A no-op if nothing has been pasted yet.
    pub fn paste_older(&mut self, buffer: &mut Buffer, kill_ring: &mut KillRing) {
        let Some(pasted) = self.last_paste else {
            return;
        };
        if let Some(loc) = buffer.paste_older(pasted, kill_ring) {
            self.last_paste = Some(Region::new(pasted.begin, loc));
            self.dot = loc;
        }
    }

    /// Sort the inclusive line range spanned by the selection.
    pub fn sort_lines(&mut self, buffer: &mut Buffer) {
        if let Some(region) = self.region() {
            buffer.sort_lines(region);
        }
    }

    pub fn undo(&mut self, buffer: &mut Buffer) {
        self.dot = buffer.undo(self.dot);
        self.mark_set = false;
    }

    /// Screen-relative cursor column: walk the dot's line up to `dot.col`
    /// converting width via the codec and expanding tabs to a single
    /// configured `tab_width` cells, then add the fringe and subtract
    /// horizontal scroll.
    pub fn screen_col(&self, buffer: &Buffer, tab_width: usize) -> u16 {
        let chunk = buffer.line(self.dot.line);
        let text = chunk.as_str();
        let mut col = 0usize;
        for (i, ch) in text.chars().enumerate() {
            if i >= self.dot.col {
                break;
            }
            if ch == '\t' {
                col += tab_width - (col % tab_width.max(1));
            } else {
                col += core_text::codec::char_width(ch) as usize;
            }
        }
        (self.fringe_width as usize + col).saturating_sub(self.scroll.1) as u16
    }

    pub fn screen_row(&self) -> u16 {
        self.dot.line.saturating_sub(self.scroll.0) as u16
    }

    /// Re-center scroll so dot sits mid-viewport when it has scrolled out
    /// of `[scroll, scroll + extent)` along one axis.
    fn recenter(scroll: usize, pos: usize, extent: usize) -> usize {
        if extent == 0 {
            return scroll;
        }
        if pos < scroll || pos >= scroll + extent {
            pos.saturating_sub(extent / 2)
        } else {
            scroll
        }
    }

    /// Gutter width for line numbers: `digits(max(1, n)) + 2`, computed
    /// directly rather than via a lookup table.
    fn line_number_width(num_lines: usize) -> u16 {
        let n = num_lines.max(1);
        let digits = (n as f64).log10().floor() as u32 + 1;
        digits as u16 + 2
    }

    /// The full per-frame update: buffer-level hook dispatch, dot
    /// clamping, modeline, scroll recentering, line numbers, selection
    /// highlight, and finally rendering buffer lines into a nested command
    /// list anchored at `(x, y)` within a `width x height` window.
    #[allow(clippy::too_many_arguments)]
    pub fn view_update(
        &mut self,
        buffer: &mut Buffer,
        origin: (u16, u16),
        width: u16,
        height: u16,
        tab_width: usize,
        show_whitespace: bool,
        frame_time_ms: f64,
    ) -> CommandList<'static> {
        // 1. buffer-level update: clear + regenerate persistent decoration.
        buffer.buffer_update();

        // 2. clamp dot inside buffer.
        self.dot = buffer.clamp(self.dot);

        let text_height = height.saturating_sub(if self.show_modeline { 1 } else { 0 });

        // 4. scroll recentering.
        self.scroll.0 = Self::recenter(self.scroll.0, self.dot.line, text_height as usize);
        let content_width = width.saturating_sub(self.fringe_width) as usize;
        self.scroll.1 = Self::recenter(self.scroll.1, self.dot.col, content_width.max(1));

        // 5. line numbers.
        if self.line_numbers {
            self.fringe_width = Self::line_number_width(buffer.num_lines());
        } else {
            self.fringe_width = 0;
        }

        // 6. selection highlight.
        if let Some(region) = self.region()
            && region.has_size()
        {
            buffer.store_mut().add_property(Span {
                region,
                property: Property::Colors(ColorAttr {
                    fg: None,
                    bg: Some(Color::Indexed(5)),
                }),
            });
        }

        let mut root = CommandList::new(origin);

        // 3. modeline, on the window's last row.
        if self.show_modeline {
            let modeline_row = height.saturating_sub(1);
            let text = self.render_modeline(buffer, width, frame_time_ms);
            root.push_format(core_render::style::indexed(8, true));
            root.draw_text_copy(0, modeline_row, text.as_bytes());
            root.clear_format();
        }

        // 5 (cont'd). render gutter.
        if self.line_numbers {
            self.render_line_numbers(buffer, &mut root, text_height);
        }

        // 7. render buffer lines into a nested list anchored past the
        // fringe; the caller's parent list embeds `root` via `draw_list`.
        let mut body = CommandList::new((self.fringe_width, 0));
        self.render_lines(buffer, &mut body, content_width, text_height, show_whitespace);
        root.draw_list(body);

        // 8. clear buffer text properties.
        buffer.store_mut().clear_properties();

        root
    }

    fn render_modeline(&self, buffer: &Buffer, width: u16, frame_time_ms: f64) -> Vec<u8> {
        let marker = if buffer.modified { "*" } else { "" };
        let name = format!("{}{marker}", buffer.name);
        let pos = format!("{}:{}", self.dot.line + 1, self.dot.col + 1);
        let lang = if buffer.language.name.is_empty() {
            "text".to_string()
        } else {
            buffer.language.name.clone()
        };
        let mut line = format!("  {name}   {pos}   {lang}   {frame_time_ms:.1}ms");
        if line.chars().count() > width as usize {
            line = line.chars().take(width as usize).collect();
        } else {
            let pad = width as usize - line.chars().count();
            line.push_str(&" ".repeat(pad));
        }
        line.into_bytes()
    }

    fn render_line_numbers(&self, buffer: &Buffer, root: &mut CommandList<'static>, text_height: u16) {
        let width = self.fringe_width.saturating_sub(1).max(1) as usize;
        for row in 0..text_height {
            let line_idx = self.scroll.0 + row as usize;
            if line_idx >= buffer.num_lines() {
                break;
            }
            let fg = if line_idx == self.dot.line { 15 } else { 7 };
            let text = format!("{:>width$} ", line_idx + 1, width = width);
            root.push_format(core_render::style::indexed(8, true));
            root.push_format(core_render::style::indexed(fg, false));
            root.draw_text_copy(0, row, text.as_bytes());
            root.clear_format();
        }
    }

    fn render_lines(
        &self,
        buffer: &Buffer,
        body: &mut CommandList<'static>,
        width: usize,
        height: u16,
        show_whitespace: bool,
    ) {
        body.set_show_whitespace(show_whitespace);
        for row in 0..height {
            let line_idx = self.scroll.0 + row as usize;
            if line_idx >= buffer.num_lines() {
                break;
            }
            let chunk = buffer.line(line_idx);
            let text = chunk.as_str();
            let visible: String = text.chars().skip(self.scroll.1).take(width.max(1)).collect();
            body.draw_text_copy(0, row, visible.as_bytes());
        }
    }
}
